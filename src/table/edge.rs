use crate::catalog::EntityKind;
use crate::catalog::keys::ColumnKey;
use crate::catalog::schema::TableDefinition;
use crate::catalog::types::{ColumnType, Row, Value};
use crate::cql::{Clause, Delete, Select, Statement};
use crate::entry::{BackendEntry, EntryRow};
use crate::error::{BackendError, StoreError};
use crate::id::{Direction, Id, IdParts};
use crate::session::Session;
use crate::table::{CqlTable, TableShape, mutation};
use std::collections::HashMap;
use tracing::warn;

pub const TABLE: &str = "edges";

const KEYS: [ColumnKey; 5] = [
    ColumnKey::OwnerVertex,
    ColumnKey::Direction,
    ColumnKey::Label,
    ColumnKey::SortValues,
    ColumnKey::OtherVertex,
];

pub fn definition() -> TableDefinition {
    TableDefinition::builder(TABLE)
        .partition_key(ColumnKey::OwnerVertex, ColumnType::Text)
        .clustering_key(ColumnKey::Direction, ColumnType::Text)
        .clustering_key(ColumnKey::Label, ColumnType::Text)
        .clustering_key(ColumnKey::SortValues, ColumnType::Text)
        .clustering_key(ColumnKey::OtherVertex, ColumnType::Text)
        .column(ColumnKey::Properties, ColumnType::TextMap)
        .index("edge_label_index", ColumnKey::Label)
        .assemble()
}

/// Decodes an edge id for the given direction.
///
/// A four-part id (owner, label, sort-values, other) carries no direction
/// and is read as outgoing: for `IN` the owner and other vertex swap, then
/// the direction is inserted at index 1. Any other part count passes
/// through, so a five-part id keeps its own direction.
pub fn id_values(id: &Id, dir: Direction) -> IdParts {
    let mut parts = id.split();
    if parts.len() == 4 {
        if dir == Direction::In {
            parts.swap(0, 3);
        }
        parts.insert(1, dir.name().to_string());
    }
    parts
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeShape;

impl TableShape for EdgeShape {
    fn id_columns(&self) -> &[ColumnKey] {
        &KEYS
    }

    fn id_values(&self, id: &Id) -> Result<IdParts, BackendError> {
        Ok(id_values(id, Direction::Out))
    }

    /// Folds edge rows into one vertex entry per owner vertex, in the order
    /// owners are first seen. Each edge row becomes a sub-row.
    fn merge_entries(&self, entries: Vec<BackendEntry>) -> Result<Vec<BackendEntry>, BackendError> {
        let mut vertices: Vec<BackendEntry> = Vec::new();
        let mut positions: HashMap<Id, usize> = HashMap::new();
        for entry in entries {
            let owner = entry
                .row()
                .get(ColumnKey::OwnerVertex)
                .cloned()
                .ok_or_else(|| {
                    BackendError::ContractViolation(format!(
                        "edge row without {} cannot be merged",
                        ColumnKey::OwnerVertex
                    ))
                })?;
            let owner_id = Id::new(owner.to_text());
            let at = *positions.entry(owner_id.clone()).or_insert_with(|| {
                let vertex = EntryRow::with_id(EntityKind::Vertex, owner_id.clone())
                    .column(ColumnKey::Id, owner)
                    .column(ColumnKey::Properties, Value::empty_map());
                vertices.push(BackendEntry::new(vertex));
                vertices.len() - 1
            });
            vertices[at].sub_row(entry.into_row());
        }
        Ok(vertices)
    }
}

/// Deletes one edge, or every edge of a label when the id is a bare label.
pub fn delete<S: Session + ?Sized>(table: &CqlTable, session: &mut S, row: &EntryRow) -> Result<(), BackendError> {
    let Some(id) = row.id() else {
        return mutation::delete(table, session, row);
    };
    let mut parts = EdgeShape.id_values(id)?;
    if parts.len() > 1 || row.has_columns() {
        return mutation::delete(table, session, row);
    }
    match parts.pop() {
        Some(label) => delete_by_label(table, session, &label),
        None => mutation::delete(table, session, row),
    }
}

/// Scans the label index and stages one delete per matching row, keyed by
/// its (owner vertex, direction, label) prefix. Not atomic: edges written
/// under the label after the scan survive.
fn delete_by_label<S: Session + ?Sized>(table: &CqlTable, session: &mut S, label: &str) -> Result<(), BackendError> {
    let select = Select::from(table.name())
        .where_(Clause::eq(ColumnKey::Label.name(), label))
        .allow_filtering();
    let rows = session.execute(&select).map_err(|e| {
        BackendError::store(
            format!("failed to query edges with label '{label}' for deleting"),
            e,
        )
    })?;

    warn!(
        table = %table.name(),
        label = %label,
        rows = rows.len(),
        "deleting edges by label with one statement per row"
    );
    for row in &rows {
        let owner = key_column(row, ColumnKey::OwnerVertex)?;
        let direction = key_column(row, ColumnKey::Direction)?;
        session.add(Statement::Delete(
            Delete::from(table.name())
                .where_(Clause::Eq(ColumnKey::OwnerVertex.name().to_string(), owner))
                .where_(Clause::Eq(ColumnKey::Direction.name().to_string(), direction))
                .where_(Clause::eq(ColumnKey::Label.name(), label)),
        ));
    }
    Ok(())
}

fn key_column(row: &Row, key: ColumnKey) -> Result<Value, BackendError> {
    row.get(key.name()).cloned().ok_or_else(|| {
        BackendError::store(
            format!("edge row returned without {key}"),
            StoreError::new("missing key column"),
        )
    })
}
