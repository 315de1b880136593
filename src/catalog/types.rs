use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Column types a table definition may declare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    Decimal,
    TextSet,
    TextMap,
}

impl ColumnType {
    pub fn as_cql(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Decimal => "decimal",
            ColumnType::TextSet => "set<text>",
            ColumnType::TextMap => "map<text, text>",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Text(CompactString),
    BigInt(i64),
    Decimal(f64),
    Set(BTreeSet<CompactString>),
    Map(BTreeMap<CompactString, CompactString>),
    List(Vec<Value>),
}

impl Value {
    pub fn text(s: impl Into<CompactString>) -> Self {
        Value::Text(s.into())
    }

    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<CompactString>,
        V: Into<CompactString>,
    {
        Value::Map(
            items
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn empty_map() -> Self {
        Value::Map(BTreeMap::new())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::BigInt(v) => Some(*v),
            Value::Decimal(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::BigInt(_) => "bigint",
            Value::Decimal(_) => "decimal",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::List(_) => "list",
        }
    }

    /// Textual form used when a value has to be folded into a set of text,
    /// for example a scalar appended to a `set<text>` column.
    pub fn to_text(&self) -> CompactString {
        match self {
            Value::Null => CompactString::const_new("null"),
            Value::Text(s) => s.clone(),
            Value::BigInt(v) => v.to_string().into(),
            Value::Decimal(v) => v.to_string().into(),
            Value::Set(_) | Value::Map(_) | Value::List(_) => format!("{self:?}").into(),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::BigInt(_) => 1,
            Value::Decimal(_) => 2,
            Value::Text(_) => 3,
            Value::Set(_) => 4,
            Value::Map(_) => 5,
            Value::List(_) => 6,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::BigInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Decimal(value)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        // Numeric kinds compare by magnitude so a decimal clustering column
        // can be bound with either representation.
        match (self, other) {
            (Value::BigInt(a), Value::Decimal(b)) => return (*a as f64).total_cmp(b),
            (Value::Decimal(a), Value::BigInt(b)) => return a.total_cmp(&(*b as f64)),
            _ => {}
        }
        let rank_cmp = self.kind_rank().cmp(&other.kind_rank());
        if rank_cmp != Ordering::Equal {
            return rank_cmp;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::BigInt(a), Value::BigInt(b)) => a.cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.total_cmp(b),
            (Value::Set(a), Value::Set(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// A row as returned by the native store: column names in result order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.columns.push((name.into(), value));
        self
    }

    /// Looks a column up the way the store resolves unquoted identifiers.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(col, _)| col.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnType, Row, Value};

    #[test]
    fn cql_type_names() {
        assert_eq!(ColumnType::Text.as_cql(), "text");
        assert_eq!(ColumnType::Decimal.as_cql(), "decimal");
        assert_eq!(ColumnType::TextSet.as_cql(), "set<text>");
        assert_eq!(ColumnType::TextMap.as_cql(), "map<text, text>");
    }

    #[test]
    fn numeric_values_compare_across_representations() {
        assert_eq!(Value::BigInt(3), Value::Decimal(3.0));
        assert!(Value::Decimal(2.5) < Value::BigInt(3));
        assert!(Value::text("a") < Value::text("b"));
    }

    #[test]
    fn row_lookup_ignores_case() {
        let row = Row::new().with("owner_vertex", Value::text("1:marko"));
        assert_eq!(row.get_text("OWNER_VERTEX"), Some("1:marko"));
        assert!(row.get("LABEL").is_none());
    }
}
