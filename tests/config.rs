use cqlgraph::catalog::EntityKind;
use cqlgraph::catalog::keys::ColumnKey;
use cqlgraph::config::StoreConfig;
use cqlgraph::entry::EntryRow;
use cqlgraph::error::BackendErrorCode;
use cqlgraph::id::Id;
use cqlgraph::memory::MemorySession;
use cqlgraph::query::plan::Query;
use cqlgraph::table::{CqlTable, all_tables};
use std::io::Write;

#[test]
fn profile_loaded_from_file_reaches_every_table() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{ "keyspace": "graph_test", "max_query_statements": 2 }}"#
    )
    .expect("write config");
    let config = StoreConfig::from_json_file(file.path()).expect("load");
    assert_eq!(config.default_split_size, StoreConfig::default().default_split_size);

    let tables = all_tables(&config);
    assert_eq!(tables.len(), EntityKind::all().len());
    for table in &tables {
        assert_eq!(table.config(), &config);
    }

    let mut session = MemorySession::new(config.keyspace.clone());
    for table in &tables {
        table.init(&mut session).expect("init");
    }
    assert_eq!(session.cluster().table_names("graph_test").len(), tables.len());
}

#[test]
fn offset_is_ignored_by_the_development_profile() {
    let mut session = MemorySession::new("graph");
    let vertices = CqlTable::new(EntityKind::Vertex).with_config(StoreConfig::development());
    vertices.init(&mut session).expect("init");
    for id in ["1:marko", "1:josh"] {
        let row = EntryRow::with_id(EntityKind::Vertex, id)
            .column(ColumnKey::Id, id);
        vertices.insert(&mut session, &row).expect("insert");
    }
    session.commit().expect("seed");

    let entries = vertices
        .query(&mut session, &Query::new(EntityKind::Vertex).offset(10))
        .expect("offset degrades");
    assert_eq!(entries.len(), 2);
    assert_eq!(session.executed_selects().len(), 1);
}

#[test]
fn statement_cap_bounds_id_fan_out() {
    let mut session = MemorySession::new("graph");
    let edges = CqlTable::new(EntityKind::Edge)
        .with_config(StoreConfig::production("graph").with_max_query_statements(2));
    edges.init(&mut session).expect("init");
    let ids: Vec<Id> = (0..3)
        .map(|i| Id::splice([format!("1:v{i}"), "knows".into(), String::new(), "1:x".into()]))
        .collect();
    let err = edges
        .query(&mut session, &Query::new(EntityKind::Edge).ids(ids.clone()))
        .expect_err("cap");
    assert_eq!(err.code(), BackendErrorCode::InvalidArgument);

    edges
        .query(&mut session, &Query::new(EntityKind::Edge).ids(ids.into_iter().take(2)))
        .expect("within cap");
    assert_eq!(session.executed_selects().len(), 2);
}

#[test]
fn malformed_config_file_is_invalid_config() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "keyspace": "-bad" }}"#).expect("write");
    let err = StoreConfig::from_json_file(file.path()).expect_err("invalid keyspace");
    assert_eq!(err.code(), BackendErrorCode::InvalidConfig);

    let missing = StoreConfig::from_json_file(std::path::Path::new("/nonexistent/cqlgraph.json"))
        .expect_err("missing");
    assert_eq!(err.code(), missing.code());
}
