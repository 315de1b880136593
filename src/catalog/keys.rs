use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic column keys shared by every table.
///
/// The native column name is the upper-case variant name. The store folds
/// unquoted identifiers to lower case, so [`ColumnKey::parse`] accepts either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ColumnKey {
    Id,
    Name,
    Label,
    Properties,

    OwnerVertex,
    Direction,
    SortValues,
    OtherVertex,

    FieldValues,
    IndexLabelName,
    ElementIds,

    IdStrategy,
    PrimaryKeys,
    NullableKeys,
    IndexNames,
    SourceLabel,
    TargetLabel,
    Frequency,
    SortKeys,
    DataType,
    Cardinality,
    BaseType,
    BaseValue,
    IndexType,
    Fields,
}

const ALL_KEYS: [ColumnKey; 25] = [
    ColumnKey::Id,
    ColumnKey::Name,
    ColumnKey::Label,
    ColumnKey::Properties,
    ColumnKey::OwnerVertex,
    ColumnKey::Direction,
    ColumnKey::SortValues,
    ColumnKey::OtherVertex,
    ColumnKey::FieldValues,
    ColumnKey::IndexLabelName,
    ColumnKey::ElementIds,
    ColumnKey::IdStrategy,
    ColumnKey::PrimaryKeys,
    ColumnKey::NullableKeys,
    ColumnKey::IndexNames,
    ColumnKey::SourceLabel,
    ColumnKey::TargetLabel,
    ColumnKey::Frequency,
    ColumnKey::SortKeys,
    ColumnKey::DataType,
    ColumnKey::Cardinality,
    ColumnKey::BaseType,
    ColumnKey::BaseValue,
    ColumnKey::IndexType,
    ColumnKey::Fields,
];

impl ColumnKey {
    pub fn name(self) -> &'static str {
        match self {
            ColumnKey::Id => "ID",
            ColumnKey::Name => "NAME",
            ColumnKey::Label => "LABEL",
            ColumnKey::Properties => "PROPERTIES",
            ColumnKey::OwnerVertex => "OWNER_VERTEX",
            ColumnKey::Direction => "DIRECTION",
            ColumnKey::SortValues => "SORT_VALUES",
            ColumnKey::OtherVertex => "OTHER_VERTEX",
            ColumnKey::FieldValues => "FIELD_VALUES",
            ColumnKey::IndexLabelName => "INDEX_LABEL_NAME",
            ColumnKey::ElementIds => "ELEMENT_IDS",
            ColumnKey::IdStrategy => "ID_STRATEGY",
            ColumnKey::PrimaryKeys => "PRIMARY_KEYS",
            ColumnKey::NullableKeys => "NULLABLE_KEYS",
            ColumnKey::IndexNames => "INDEX_NAMES",
            ColumnKey::SourceLabel => "SOURCE_LABEL",
            ColumnKey::TargetLabel => "TARGET_LABEL",
            ColumnKey::Frequency => "FREQUENCY",
            ColumnKey::SortKeys => "SORT_KEYS",
            ColumnKey::DataType => "DATA_TYPE",
            ColumnKey::Cardinality => "CARDINALITY",
            ColumnKey::BaseType => "BASE_TYPE",
            ColumnKey::BaseValue => "BASE_VALUE",
            ColumnKey::IndexType => "INDEX_TYPE",
            ColumnKey::Fields => "FIELDS",
        }
    }

    pub fn parse(name: &str) -> Option<ColumnKey> {
        let upper = name.to_ascii_uppercase();
        ALL_KEYS.iter().copied().find(|k| k.name() == upper)
    }

    pub fn all() -> &'static [ColumnKey] {
        &ALL_KEYS
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnKey::parse(s).ok_or_else(|| format!("unknown column key '{s}'"))
    }
}
