use crate::catalog::keys::ColumnKey;
use crate::catalog::types::Value;
use crate::error::BackendError;
use crate::id::{Direction, Id};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum nesting depth for condition trees to prevent stack overflow
const MAX_CONDITION_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    ContainsKey,
    /// Token range scan; the relation key holds the start token and the
    /// value the end token.
    Scan,
}

impl RelationType {
    pub fn symbol(self) -> &'static str {
        match self {
            RelationType::Eq => "==",
            RelationType::Neq => "!=",
            RelationType::Gt => ">",
            RelationType::Gte => ">=",
            RelationType::Lt => "<",
            RelationType::Lte => "<=",
            RelationType::In => "in",
            RelationType::ContainsKey => "containsk",
            RelationType::Scan => "scan",
        }
    }
}

/// A relation operand before serialization into a native value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Value(Value),
    Id(Id),
    Direction(Direction),
    List(Vec<Operand>),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<Id> for Operand {
    fn from(value: Id) -> Self {
        Operand::Id(value)
    }
}

impl From<Direction> for Operand {
    fn from(value: Direction) -> Self {
        Operand::Direction(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Value(Value::from(value))
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Operand::Value(Value::from(value))
    }
}

impl<T: Into<Operand>> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Operand::List(values.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub key: String,
    pub relation: RelationType,
    pub value: Operand,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.key, self.relation.symbol(), self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Relation(Relation),
}

impl Condition {
    fn relation(key: ColumnKey, relation: RelationType, value: Operand) -> Condition {
        Condition::Relation(Relation {
            key: key.name().to_string(),
            relation,
            value,
        })
    }

    pub fn eq(key: ColumnKey, value: impl Into<Operand>) -> Condition {
        Self::relation(key, RelationType::Eq, value.into())
    }

    pub fn neq(key: ColumnKey, value: impl Into<Operand>) -> Condition {
        Self::relation(key, RelationType::Neq, value.into())
    }

    pub fn gt(key: ColumnKey, value: impl Into<Operand>) -> Condition {
        Self::relation(key, RelationType::Gt, value.into())
    }

    pub fn gte(key: ColumnKey, value: impl Into<Operand>) -> Condition {
        Self::relation(key, RelationType::Gte, value.into())
    }

    pub fn lt(key: ColumnKey, value: impl Into<Operand>) -> Condition {
        Self::relation(key, RelationType::Lt, value.into())
    }

    pub fn lte(key: ColumnKey, value: impl Into<Operand>) -> Condition {
        Self::relation(key, RelationType::Lte, value.into())
    }

    pub fn in_<T: Into<Operand>>(key: ColumnKey, values: Vec<T>) -> Condition {
        Self::relation(key, RelationType::In, Operand::from(values))
    }

    pub fn contains_key(key: ColumnKey, value: impl Into<Operand>) -> Condition {
        Self::relation(key, RelationType::ContainsKey, value.into())
    }

    /// Token range `[start, end)` over the partition key; both bounds are
    /// passed to the store verbatim.
    pub fn scan(start: impl Into<String>, end: impl Into<String>) -> Condition {
        let end: String = end.into();
        Condition::Relation(Relation {
            key: start.into(),
            relation: RelationType::Scan,
            value: Operand::Value(Value::from(end)),
        })
    }

    pub fn and(self, rhs: Condition) -> Condition {
        Condition::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: Condition) -> Condition {
        Condition::Or(Box::new(self), Box::new(rhs))
    }

    pub fn depth(&self) -> usize {
        match self {
            Condition::Relation(_) => 1,
            Condition::And(left, right) | Condition::Or(left, right) => {
                1 + left.depth().max(right.depth())
            }
        }
    }

    pub fn validate_depth(&self) -> Result<(), BackendError> {
        let depth = self.depth();
        if depth > MAX_CONDITION_DEPTH {
            return Err(BackendError::InvalidArgument(format!(
                "condition depth {depth} exceeds maximum allowed depth of {MAX_CONDITION_DEPTH}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Condition, Operand, RelationType};
    use crate::catalog::keys::ColumnKey;
    use crate::catalog::types::Value;

    #[test]
    fn scan_keeps_bounds_verbatim() {
        let Condition::Relation(rel) = Condition::scan("-100", "200") else {
            panic!("scan should be a relation");
        };
        assert_eq!(rel.relation, RelationType::Scan);
        assert_eq!(rel.key, "-100");
        assert_eq!(rel.value, Operand::Value(Value::text("200")));
    }

    #[test]
    fn deep_trees_are_rejected() {
        let mut cond = Condition::eq(ColumnKey::Label, "person");
        for _ in 0..40 {
            cond = cond.and(Condition::eq(ColumnKey::Label, "person"));
        }
        assert!(cond.validate_depth().is_err());
        assert!(
            Condition::eq(ColumnKey::Label, "a")
                .and(Condition::eq(ColumnKey::Id, "b"))
                .validate_depth()
                .is_ok()
        );
    }
}
