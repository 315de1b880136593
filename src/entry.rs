use crate::catalog::EntityKind;
use crate::catalog::keys::ColumnKey;
use crate::catalog::types::{Row, Value};
use crate::error::BackendError;
use crate::id::Id;
use std::collections::BTreeMap;

/// One logical row: an optional id plus columns keyed by semantic key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    kind: EntityKind,
    id: Option<Id>,
    columns: BTreeMap<ColumnKey, Value>,
}

impl EntryRow {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            id: None,
            columns: BTreeMap::new(),
        }
    }

    pub fn with_id(kind: EntityKind, id: impl Into<Id>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
            columns: BTreeMap::new(),
        }
    }

    pub fn column(mut self, key: ColumnKey, value: impl Into<Value>) -> Self {
        self.columns.insert(key, value.into());
        self
    }

    pub fn set_column(&mut self, key: ColumnKey, value: impl Into<Value>) {
        self.columns.insert(key, value.into());
    }

    pub fn set_id(&mut self, id: Id) {
        self.id = Some(id);
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    pub fn get(&self, key: ColumnKey) -> Option<&Value> {
        self.columns.get(&key)
    }

    pub fn get_text(&self, key: ColumnKey) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    pub fn columns(&self) -> &BTreeMap<ColumnKey, Value> {
        &self.columns
    }

    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }
}

/// A query result or mutation payload. A vertex with its incident edges is
/// one entry whose sub-rows are the physical edge rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEntry {
    row: EntryRow,
    sub_rows: Vec<EntryRow>,
}

impl BackendEntry {
    pub fn new(row: EntryRow) -> Self {
        Self {
            row,
            sub_rows: Vec::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.row.kind
    }

    pub fn id(&self) -> Option<&Id> {
        self.row.id()
    }

    pub fn set_id(&mut self, id: Id) {
        self.row.set_id(id);
    }

    pub fn row(&self) -> &EntryRow {
        &self.row
    }

    pub fn row_mut(&mut self) -> &mut EntryRow {
        &mut self.row
    }

    pub fn into_row(self) -> EntryRow {
        self.row
    }

    pub fn get(&self, key: ColumnKey) -> Option<&Value> {
        self.row.get(key)
    }

    pub fn sub_row(&mut self, row: EntryRow) {
        self.sub_rows.push(row);
    }

    pub fn sub_rows(&self) -> &[EntryRow] {
        &self.sub_rows
    }
}

/// Copies every column of a native row into an entry under its semantic key.
pub fn row_to_entry(kind: EntityKind, table: &str, row: &Row) -> Result<BackendEntry, BackendError> {
    let mut entry = EntryRow::new(kind);
    for (name, value) in &row.columns {
        let key = ColumnKey::parse(name).ok_or_else(|| BackendError::UnknownColumn {
            table: table.to_string(),
            column: name.clone(),
        })?;
        entry.set_column(key, value.clone());
    }
    Ok(BackendEntry::new(entry))
}

/// Native column/value pairs of an entry, in key order.
pub fn entry_to_assignments(row: &EntryRow) -> Vec<(String, Value)> {
    row.columns
        .iter()
        .map(|(key, value)| (key.name().to_string(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{EntryRow, entry_to_assignments, row_to_entry};
    use crate::catalog::EntityKind;
    use crate::catalog::keys::ColumnKey;
    use crate::catalog::types::{Row, Value};
    use crate::error::BackendErrorCode;

    #[test]
    fn native_names_fold_to_semantic_keys() {
        let row = Row::new()
            .with("id", Value::text("1:marko"))
            .with("label", Value::text("person"))
            .with("properties", Value::map([("name", "marko")]));
        let entry = row_to_entry(EntityKind::Vertex, "vertices", &row).expect("entry");
        assert_eq!(entry.row().get_text(ColumnKey::Id), Some("1:marko"));
        assert_eq!(entry.row().get_text(ColumnKey::Label), Some("person"));
        assert_eq!(entry.kind(), EntityKind::Vertex);
    }

    #[test]
    fn unknown_native_column_fails() {
        let row = Row::new().with("writetime", Value::BigInt(1));
        let err = row_to_entry(EntityKind::Vertex, "vertices", &row).expect_err("unknown");
        assert_eq!(err.code(), BackendErrorCode::UnknownColumn);
    }

    #[test]
    fn assignments_carry_every_column() {
        let row = EntryRow::new(EntityKind::Vertex)
            .column(ColumnKey::Label, "person")
            .column(ColumnKey::Id, "1:marko");
        assert_eq!(
            entry_to_assignments(&row),
            vec![
                ("ID".to_string(), Value::text("1:marko")),
                ("LABEL".to_string(), Value::text("person")),
            ]
        );
    }
}
