//! Schema-catalog tables. Every schema element is one row keyed by `NAME`;
//! its attributes are stored as serialized text.

use crate::catalog::keys::ColumnKey;
use crate::catalog::schema::TableDefinition;
use crate::catalog::types::ColumnType;

pub fn vertex_labels() -> TableDefinition {
    TableDefinition::builder("vertex_labels")
        .partition_key(ColumnKey::Name, ColumnType::Text)
        .column(ColumnKey::IdStrategy, ColumnType::Text)
        .column(ColumnKey::PrimaryKeys, ColumnType::Text)
        .column(ColumnKey::NullableKeys, ColumnType::Text)
        .column(ColumnKey::IndexNames, ColumnType::Text)
        .column(ColumnKey::Properties, ColumnType::Text)
        .assemble()
}

pub fn edge_labels() -> TableDefinition {
    TableDefinition::builder("edge_labels")
        .partition_key(ColumnKey::Name, ColumnType::Text)
        .column(ColumnKey::SourceLabel, ColumnType::Text)
        .column(ColumnKey::TargetLabel, ColumnType::Text)
        .column(ColumnKey::Frequency, ColumnType::Text)
        .column(ColumnKey::SortKeys, ColumnType::Text)
        .column(ColumnKey::NullableKeys, ColumnType::Text)
        .column(ColumnKey::IndexNames, ColumnType::Text)
        .column(ColumnKey::Properties, ColumnType::Text)
        .assemble()
}

pub fn property_keys() -> TableDefinition {
    TableDefinition::builder("property_keys")
        .partition_key(ColumnKey::Name, ColumnType::Text)
        .column(ColumnKey::DataType, ColumnType::Text)
        .column(ColumnKey::Cardinality, ColumnType::Text)
        .column(ColumnKey::Properties, ColumnType::Text)
        .assemble()
}

/// Index labels cluster under their name by the element they index.
pub fn index_labels() -> TableDefinition {
    TableDefinition::builder("index_labels")
        .partition_key(ColumnKey::Name, ColumnType::Text)
        .clustering_key(ColumnKey::BaseType, ColumnType::Text)
        .clustering_key(ColumnKey::BaseValue, ColumnType::Text)
        .column(ColumnKey::IndexType, ColumnType::Text)
        .column(ColumnKey::Fields, ColumnType::Text)
        .assemble()
}
