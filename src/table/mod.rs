pub mod edge;
pub mod index;
pub mod meta;
pub mod mutation;
pub mod vertex;

use crate::catalog::EntityKind;
use crate::catalog::keys::ColumnKey;
use crate::catalog::schema::TableDefinition;
use crate::catalog::types::{ColumnType, Value};
use crate::config::StoreConfig;
use crate::entry::{BackendEntry, EntryRow, row_to_entry};
use crate::error::BackendError;
use crate::id::{Id, IdParts};
use crate::query::plan::Query;
use crate::query::translator::translate;
use crate::session::Session;
use crate::shard::{Shard, split_token_ring};
use smallvec::smallvec;
use std::fmt;
use tracing::{debug, info};

/// Per-kind identifier layout and result reshaping.
pub trait TableShape: Send + Sync {
    /// Columns an identifier decodes into, in positional order.
    fn id_columns(&self) -> &[ColumnKey] {
        &[ColumnKey::Name]
    }

    /// Decodes an identifier into one value per id column.
    fn id_values(&self, id: &Id) -> Result<IdParts, BackendError> {
        Ok(smallvec![id.as_str().to_string()])
    }

    /// Reshapes the entries of one result set before they are returned.
    fn merge_entries(&self, entries: Vec<BackendEntry>) -> Result<Vec<BackendEntry>, BackendError> {
        Ok(entries)
    }
}

/// Shape of tables keyed by `NAME` with no merge step.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedShape;

impl TableShape for NamedShape {}

/// Metadata names answered by [`CqlTable::metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Splits,
}

impl MetadataKind {
    pub fn parse(name: &str) -> Option<MetadataKind> {
        match name {
            "splits" => Some(MetadataKind::Splits),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetadataKind::Splits => "splits",
        }
    }

    fn arity(self) -> usize {
        match self {
            MetadataKind::Splits => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    Splits(Vec<Shard>),
}

/// One backend table: its layout, its shape and the mutation rules of its
/// entity kind.
#[derive(Debug, Clone)]
pub struct CqlTable {
    kind: EntityKind,
    definition: TableDefinition,
    config: StoreConfig,
}

impl CqlTable {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            definition: layout(kind),
            config: StoreConfig::default(),
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn shape(&self) -> &'static dyn TableShape {
        match self.kind {
            EntityKind::Vertex => &vertex::VertexShape,
            EntityKind::Edge => &edge::EdgeShape,
            EntityKind::SecondaryIndex => &index::SecondaryIndexShape,
            EntityKind::SearchIndex => &index::SearchIndexShape,
            EntityKind::VertexLabel
            | EntityKind::EdgeLabel
            | EntityKind::PropertyKey
            | EntityKind::IndexLabel => &NamedShape,
        }
    }

    /// Decodes an identifier into one typed equality operand per id
    /// column, in positional order.
    pub(crate) fn id_key_values(&self, id: &Id) -> Result<Vec<(ColumnKey, Value)>, BackendError> {
        let shape = self.shape();
        let names = shape.id_columns();
        let parts = shape.id_values(id)?;
        let malformed = || BackendError::MalformedId {
            id: id.to_string(),
            expected: names.iter().map(|k| k.name().to_string()).collect(),
        };
        if parts.len() != names.len() {
            return Err(malformed());
        }
        names
            .iter()
            .zip(parts)
            .map(|(key, part)| {
                let value = match self.definition.column_type(*key) {
                    Some(ColumnType::Decimal) => {
                        part.trim().parse::<f64>().map(Value::Decimal).map_err(|_| malformed())?
                    }
                    _ => Value::from(part),
                };
                Ok((*key, value))
            })
            .collect()
    }

    /// Creates the table and its declared indexes.
    pub fn init<S: Session + ?Sized>(&self, session: &mut S) -> Result<(), BackendError> {
        let create = self.definition.create_table();
        info!(keyspace = %session.keyspace(), table = %self.name(), "create table");
        session
            .execute_schema(&create)
            .map_err(|e| BackendError::store(create.to_cql(), e))?;
        for index in self.definition.create_indexes() {
            info!(table = %self.name(), statement = %index.to_cql(), "create index");
            session
                .execute_schema(&index)
                .map_err(|e| BackendError::store(index.to_cql(), e))?;
        }
        Ok(())
    }

    /// Drops the table.
    pub fn clear<S: Session + ?Sized>(&self, session: &mut S) -> Result<(), BackendError> {
        let drop = self.definition.drop_table();
        info!(keyspace = %session.keyspace(), table = %self.name(), "drop table");
        session
            .execute_schema(&drop)
            .map_err(|e| BackendError::store(drop.to_cql(), e))
    }

    /// Runs a query and returns its entries, merged per result set.
    pub fn query<S: Session + ?Sized>(
        &self,
        session: &mut S,
        query: &Query,
    ) -> Result<Vec<BackendEntry>, BackendError> {
        let selects = translate(self, query)?;
        let shape = self.shape();
        let mut entries = Vec::new();
        for select in &selects {
            let rows = session
                .execute(select)
                .map_err(|e| BackendError::store(format!("failed to query [{query}]"), e))?;
            let converted = rows
                .iter()
                .map(|row| row_to_entry(query.result_type, self.name(), row))
                .collect::<Result<Vec<_>, _>>()?;
            entries.extend(shape.merge_entries(converted)?);
        }
        debug!(
            table = %self.name(),
            statements = selects.len(),
            entries = entries.len(),
            "query returned"
        );
        Ok(entries)
    }

    pub fn insert<S: Session + ?Sized>(&self, session: &mut S, row: &EntryRow) -> Result<(), BackendError> {
        if self.kind.is_index() {
            return Err(BackendError::invalid_index_mutation(
                self.name(),
                "insertion is not supported, use append",
            ));
        }
        mutation::insert(self, session, row)
    }

    pub fn append<S: Session + ?Sized>(&self, session: &mut S, row: &EntryRow) -> Result<(), BackendError> {
        if self.kind.is_index() {
            index::check_modifiable(self, row)?;
        }
        mutation::append(self, session, row)
    }

    pub fn eliminate<S: Session + ?Sized>(&self, session: &mut S, row: &EntryRow) -> Result<(), BackendError> {
        if self.kind.is_index() {
            index::check_modifiable(self, row)?;
        }
        mutation::eliminate(self, session, row)
    }

    pub fn delete<S: Session + ?Sized>(&self, session: &mut S, row: &EntryRow) -> Result<(), BackendError> {
        match self.kind {
            EntityKind::Edge => edge::delete(self, session, row),
            EntityKind::SecondaryIndex | EntityKind::SearchIndex => {
                index::delete_by_label(self, session, row)
            }
            _ => mutation::delete(self, session, row),
        }
    }

    /// Answers a named metadata request. `splits` takes the split size in
    /// bytes as its only argument.
    pub fn metadata<S: Session + ?Sized>(
        &self,
        session: &mut S,
        name: &str,
        args: &[Value],
    ) -> Result<Metadata, BackendError> {
        let kind = MetadataKind::parse(name)
            .ok_or_else(|| BackendError::InvalidMetadataName(name.to_string()))?;
        if args.len() != kind.arity() {
            return Err(BackendError::InvalidArgument(format!(
                "the args count of {} must be {}, got {}",
                kind.as_str(),
                kind.arity(),
                args.len()
            )));
        }
        match kind {
            MetadataKind::Splits => {
                let split_size = args[0]
                    .as_i64()
                    .and_then(|v| u64::try_from(v).ok())
                    .ok_or_else(|| {
                        BackendError::InvalidArgument(format!(
                            "split size must be a non-negative integer, got {}",
                            args[0].kind_name()
                        ))
                    })?;
                let estimate = session
                    .size_estimate(self.name())
                    .map_err(|e| BackendError::store(format!("size estimate of {}", self.name()), e))?;
                Ok(Metadata::Splits(split_token_ring(estimate, split_size)?))
            }
        }
    }

    /// Token splits sized by the configured default split size.
    pub fn splits<S: Session + ?Sized>(&self, session: &mut S) -> Result<Vec<Shard>, BackendError> {
        let size = i64::try_from(self.config.default_split_size).unwrap_or(i64::MAX);
        match self.metadata(session, MetadataKind::Splits.as_str(), &[Value::BigInt(size)])? {
            Metadata::Splits(shards) => Ok(shards),
        }
    }
}

impl fmt::Display for CqlTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.kind)
    }
}

/// Built-in layout of every entity kind.
pub fn layout(kind: EntityKind) -> TableDefinition {
    match kind {
        EntityKind::VertexLabel => meta::vertex_labels(),
        EntityKind::EdgeLabel => meta::edge_labels(),
        EntityKind::PropertyKey => meta::property_keys(),
        EntityKind::IndexLabel => meta::index_labels(),
        EntityKind::Vertex => vertex::definition(),
        EntityKind::Edge => edge::definition(),
        EntityKind::SecondaryIndex => index::secondary_definition(),
        EntityKind::SearchIndex => index::search_definition(),
    }
}

/// Every table of a store, schema tables first.
pub fn all_tables(config: &StoreConfig) -> Vec<CqlTable> {
    EntityKind::all()
        .iter()
        .map(|kind| CqlTable::new(*kind).with_config(config.clone()))
        .collect()
}
