use crate::catalog::keys::ColumnKey;
use crate::catalog::schema::TableDefinition;
use crate::catalog::types::ColumnType;
use crate::entry::BackendEntry;
use crate::error::BackendError;
use crate::id::Id;
use crate::table::TableShape;

pub const TABLE: &str = "vertices";

pub fn definition() -> TableDefinition {
    TableDefinition::builder(TABLE)
        .partition_key(ColumnKey::Id, ColumnType::Text)
        .column(ColumnKey::Label, ColumnType::Text)
        .column(ColumnKey::Properties, ColumnType::TextMap)
        .index("vertex_label_index", ColumnKey::Label)
        .assemble()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VertexShape;

impl TableShape for VertexShape {
    fn id_columns(&self) -> &[ColumnKey] {
        &[ColumnKey::Id]
    }

    /// Every vertex entry takes its id from the `ID` column.
    fn merge_entries(&self, mut entries: Vec<BackendEntry>) -> Result<Vec<BackendEntry>, BackendError> {
        for entry in &mut entries {
            let id = entry.row().get_text(ColumnKey::Id).map(Id::from);
            if let Some(id) = id {
                entry.set_id(id);
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::VertexShape;
    use crate::catalog::EntityKind;
    use crate::catalog::keys::ColumnKey;
    use crate::entry::{BackendEntry, EntryRow};
    use crate::table::TableShape;

    #[test]
    fn merge_sets_ids_from_id_column() {
        let entries = vec![
            BackendEntry::new(EntryRow::new(EntityKind::Vertex).column(ColumnKey::Id, "1:marko")),
            BackendEntry::new(EntryRow::new(EntityKind::Vertex).column(ColumnKey::Id, "2:lop")),
        ];
        let merged = VertexShape.merge_entries(entries).expect("merge");
        let ids: Vec<&str> = merged
            .iter()
            .filter_map(|e| e.id().map(|id| id.as_str()))
            .collect();
        assert_eq!(ids, vec!["1:marko", "2:lop"]);
    }

    #[test]
    fn vertex_ids_are_single_part() {
        let parts = VertexShape
            .id_values(&crate::id::Id::splice(["1", "marko"]))
            .expect("decode");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0], "1:marko");
    }
}
