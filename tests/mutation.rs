use cqlgraph::catalog::EntityKind;
use cqlgraph::catalog::keys::ColumnKey;
use cqlgraph::catalog::types::Value;
use cqlgraph::cql::Statement;
use cqlgraph::entry::EntryRow;
use cqlgraph::error::BackendErrorCode;
use cqlgraph::memory::MemorySession;
use cqlgraph::query::plan::Query;
use cqlgraph::table::CqlTable;

fn seeded() -> (MemorySession, CqlTable) {
    let mut session = MemorySession::new("graph");
    let vertices = CqlTable::new(EntityKind::Vertex);
    vertices.init(&mut session).expect("init");
    let marko = EntryRow::with_id(EntityKind::Vertex, "1:marko")
        .column(ColumnKey::Id, "1:marko")
        .column(ColumnKey::Label, "person")
        .column(
            ColumnKey::Properties,
            Value::map([("name", "marko"), ("city", "Wuhan")]),
        );
    let lop = EntryRow::with_id(EntityKind::Vertex, "2:lop")
        .column(ColumnKey::Id, "2:lop")
        .column(ColumnKey::Label, "software")
        .column(ColumnKey::Properties, Value::map([("name", "lop")]));
    vertices.insert(&mut session, &marko).expect("insert marko");
    vertices.insert(&mut session, &lop).expect("insert lop");
    session.commit().expect("seed");
    (session, vertices)
}

fn properties(session: &mut MemorySession, vertices: &CqlTable, id: &str) -> Option<Value> {
    let entries = vertices
        .query(session, &Query::new(EntityKind::Vertex).id(id))
        .expect("query");
    entries.first().and_then(|e| e.get(ColumnKey::Properties).cloned())
}

#[test]
fn eliminate_removes_map_keys() {
    let (mut session, vertices) = seeded();
    let row = EntryRow::with_id(EntityKind::Vertex, "1:marko")
        .column(ColumnKey::Properties, Value::map([("city", "Wuhan")]));
    vertices.eliminate(&mut session, &row).expect("eliminate");

    let Statement::Update(update) = &session.staged()[0] else {
        panic!("eliminate must stage an update");
    };
    let cql = update.to_cql();
    assert_eq!(
        cql.text,
        "UPDATE vertices SET PROPERTIES = PROPERTIES - ? WHERE ID = ?;"
    );
    assert_eq!(cql.values, vec![Value::set(["city"]), Value::text("1:marko")]);

    session.commit().expect("commit");
    assert_eq!(
        properties(&mut session, &vertices, "1:marko"),
        Some(Value::map([("name", "marko")]))
    );
}

#[test]
fn append_merges_map_entries() {
    let (mut session, vertices) = seeded();
    let row = EntryRow::with_id(EntityKind::Vertex, "2:lop")
        .column(ColumnKey::Properties, Value::map([("lang", "java")]));
    vertices.append(&mut session, &row).expect("append");
    session.commit().expect("commit");
    assert_eq!(
        properties(&mut session, &vertices, "2:lop"),
        Some(Value::map([("lang", "java"), ("name", "lop")]))
    );
}

#[test]
fn mutations_without_payload_are_contract_violations() {
    let (mut session, vertices) = seeded();
    let empty = EntryRow::with_id(EntityKind::Vertex, "1:marko");
    let err = vertices.insert(&mut session, &empty).expect_err("insert");
    assert_eq!(err.code(), BackendErrorCode::ContractViolation);

    // The id column alone is a key, not something to append to.
    let only_key = EntryRow::with_id(EntityKind::Vertex, "1:marko").column(ColumnKey::Id, "1:marko");
    let err = vertices.append(&mut session, &only_key).expect_err("append");
    assert_eq!(err.code(), BackendErrorCode::ContractViolation);
    assert!(session.staged().is_empty());
}

#[test]
fn delete_by_id_and_columns_is_unsupported() {
    let (mut session, vertices) = seeded();
    let row = EntryRow::with_id(EntityKind::Vertex, "1:marko").column(ColumnKey::Label, "person");
    let err = vertices.delete(&mut session, &row).expect_err("both");
    assert_eq!(err.code(), BackendErrorCode::Unsupported);
}

#[test]
fn delete_by_id_removes_the_row() {
    let (mut session, vertices) = seeded();
    vertices
        .delete(&mut session, &EntryRow::with_id(EntityKind::Vertex, "2:lop"))
        .expect("delete");
    assert_eq!(
        session.staged()[0].to_cql().text,
        "DELETE FROM vertices WHERE ID = ?;"
    );
    session.commit().expect("commit");
    assert_eq!(session.cluster().row_count("graph", "vertices"), 1);
    assert_eq!(properties(&mut session, &vertices, "2:lop"), None);
}

#[test]
fn delete_by_columns_matches_every_column() {
    let (mut session, vertices) = seeded();
    let row = EntryRow::new(EntityKind::Vertex).column(ColumnKey::Id, "1:marko");
    vertices.delete(&mut session, &row).expect("delete");
    assert_eq!(
        session.staged()[0].to_cql().text,
        "DELETE FROM vertices WHERE ID = ?;"
    );
    session.commit().expect("commit");
    assert_eq!(session.cluster().row_count("graph", "vertices"), 1);
}

#[test]
fn rollback_discards_staged_mutations() {
    let (mut session, vertices) = seeded();
    vertices
        .delete(&mut session, &EntryRow::with_id(EntityKind::Vertex, "1:marko"))
        .expect("delete");
    session.rollback();
    assert!(session.staged().is_empty());
    assert_eq!(session.commit().expect("empty commit"), 0);
    assert_eq!(session.cluster().row_count("graph", "vertices"), 2);
}
