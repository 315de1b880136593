use crate::catalog::EntityKind;
use crate::catalog::keys::ColumnKey;
use crate::catalog::schema::TableDefinition;
use crate::catalog::types::{ColumnType, Value};
use crate::cql::{Clause, Delete, Select, Statement};
use crate::entry::EntryRow;
use crate::error::{BackendError, StoreError};
use crate::id::{Id, IdParts};
use crate::session::Session;
use crate::table::{CqlTable, TableShape};
use tracing::warn;

pub const SECONDARY_TABLE: &str = "secondary_indexes";
pub const SEARCH_TABLE: &str = "search_indexes";

/// The only column an index mutation may touch.
const MODIFIABLE: [ColumnKey; 1] = [ColumnKey::ElementIds];

pub fn secondary_definition() -> TableDefinition {
    TableDefinition::builder(SECONDARY_TABLE)
        .partition_key(ColumnKey::FieldValues, ColumnType::Text)
        .clustering_key(ColumnKey::IndexLabelName, ColumnType::Text)
        .column(ColumnKey::ElementIds, ColumnType::TextSet)
        .assemble()
}

pub fn search_definition() -> TableDefinition {
    TableDefinition::builder(SEARCH_TABLE)
        .partition_key(ColumnKey::IndexLabelName, ColumnType::Text)
        .clustering_key(ColumnKey::FieldValues, ColumnType::Decimal)
        .column(ColumnKey::ElementIds, ColumnType::TextSet)
        .assemble()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SecondaryIndexShape;

impl TableShape for SecondaryIndexShape {
    fn id_columns(&self) -> &[ColumnKey] {
        &[ColumnKey::FieldValues, ColumnKey::IndexLabelName]
    }

    fn id_values(&self, id: &Id) -> Result<IdParts, BackendError> {
        Ok(id.split())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchIndexShape;

impl TableShape for SearchIndexShape {
    fn id_columns(&self) -> &[ColumnKey] {
        &[ColumnKey::IndexLabelName, ColumnKey::FieldValues]
    }

    fn id_values(&self, id: &Id) -> Result<IdParts, BackendError> {
        Ok(id.split())
    }
}

/// Rejects index mutations that touch anything but the element-id set.
pub(crate) fn check_modifiable(table: &CqlTable, row: &EntryRow) -> Result<(), BackendError> {
    let id_columns = table.shape().id_columns();
    let illegal = row
        .columns()
        .keys()
        .find(|key| !id_columns.contains(*key) && !MODIFIABLE.contains(*key));
    match illegal {
        Some(key) => Err(BackendError::invalid_index_mutation(
            table.name(),
            format!("column {key} is not modifiable"),
        )),
        None => Ok(()),
    }
}

/// Deletes every index row of one index label.
///
/// The entry must carry `INDEX_LABEL_NAME` and no `FIELD_VALUES`. Matching
/// rows are read first, then one delete per row is staged.
pub(crate) fn delete_by_label<S: Session + ?Sized>(
    table: &CqlTable,
    session: &mut S,
    row: &EntryRow,
) -> Result<(), BackendError> {
    if let Some(field_values) = row.get(ColumnKey::FieldValues) {
        return Err(BackendError::invalid_index_mutation(
            table.name(),
            format!(
                "deletion should just have {}, but {} ({}) is provided",
                ColumnKey::IndexLabelName,
                ColumnKey::FieldValues,
                field_values.to_text()
            ),
        ));
    }
    let label = match row.get_text(ColumnKey::IndexLabelName) {
        Some(label) if !label.is_empty() => label,
        _ => {
            return Err(BackendError::invalid_index_mutation(
                table.name(),
                format!("deletion needs {}, but not provided", ColumnKey::IndexLabelName),
            ));
        }
    };

    let mut select =
        Select::from(table.name()).where_(Clause::eq(ColumnKey::IndexLabelName.name(), label));
    // On the search table the label is the partition key.
    if table.kind() == EntityKind::SecondaryIndex {
        select = select.allow_filtering();
    }
    let rows = session.execute(&select).map_err(|e| {
        BackendError::store(
            format!("failed to query {} with index label '{label}' for deleting", table.name()),
            e,
        )
    })?;

    warn!(
        table = %table.name(),
        index_label = %label,
        rows = rows.len(),
        "deleting index rows by label with one statement per row"
    );
    for found in &rows {
        let field_values: Value = found
            .get(ColumnKey::FieldValues.name())
            .cloned()
            .ok_or_else(|| {
                BackendError::store(
                    format!("{} row returned without {}", table.name(), ColumnKey::FieldValues),
                    StoreError::new("missing key column"),
                )
            })?;
        session.add(Statement::Delete(
            Delete::from(table.name())
                .where_(Clause::Eq(ColumnKey::FieldValues.name().to_string(), field_values))
                .where_(Clause::eq(ColumnKey::IndexLabelName.name(), label)),
        ));
    }
    Ok(())
}
