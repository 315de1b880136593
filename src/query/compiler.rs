use crate::catalog::types::Value;
use crate::cql::Clause;
use crate::error::BackendError;
use crate::query::condition::{Condition, Operand, Relation, RelationType};

/// A condition lowered to one conjunctive native predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCondition {
    pub clause: Clause,
    pub allow_filtering: bool,
}

/// Compiles a condition tree. `partition_columns` are the columns a token
/// range scan hashes over.
pub fn compile_condition(
    condition: &Condition,
    partition_columns: &[String],
) -> Result<CompiledCondition, BackendError> {
    condition.validate_depth()?;
    let clause = compile_clause(condition, partition_columns)?;
    let allow_filtering = clause.needs_allow_filtering();
    Ok(CompiledCondition {
        clause,
        allow_filtering,
    })
}

fn compile_clause(condition: &Condition, partition_columns: &[String]) -> Result<Clause, BackendError> {
    match condition {
        Condition::And(left, right) => {
            let left = compile_clause(left, partition_columns)?;
            let right = compile_clause(right, partition_columns)?;
            Ok(left.and(right))
        }
        Condition::Or(_, _) => Err(BackendError::Unsupported(
            "OR conditions are not supported by the column-family store".into(),
        )),
        Condition::Relation(relation) => compile_relation(relation, partition_columns),
    }
}

fn compile_relation(relation: &Relation, partition_columns: &[String]) -> Result<Clause, BackendError> {
    let key = relation.key.clone();
    match relation.relation {
        RelationType::Eq => Ok(Clause::Eq(key, serialize_operand(&relation.value))),
        RelationType::Gt => Ok(Clause::Gt(key, serialize_operand(&relation.value))),
        RelationType::Gte => Ok(Clause::Gte(key, serialize_operand(&relation.value))),
        RelationType::Lt => Ok(Clause::Lt(key, serialize_operand(&relation.value))),
        RelationType::Lte => Ok(Clause::Lte(key, serialize_operand(&relation.value))),
        RelationType::In => {
            let Operand::List(values) = &relation.value else {
                return Err(BackendError::ContractViolation(format!(
                    "relation '{relation}' expects a list operand"
                )));
            };
            Ok(Clause::In(key, values.iter().map(serialize_operand).collect()))
        }
        RelationType::ContainsKey => Ok(Clause::ContainsKey(key, serialize_operand(&relation.value))),
        RelationType::Scan => {
            let end = match serialize_operand(&relation.value) {
                Value::Text(end) => end.to_string(),
                Value::BigInt(end) => end.to_string(),
                other => {
                    return Err(BackendError::ContractViolation(format!(
                        "scan end token must be text or bigint, got {}",
                        other.kind_name()
                    )));
                }
            };
            Ok(Clause::TokenGte {
                columns: partition_columns.to_vec(),
                token: key,
            }
            .and(Clause::TokenLt {
                columns: partition_columns.to_vec(),
                token: end,
            }))
        }
        RelationType::Neq => Err(BackendError::ContractViolation(format!(
            "unsupported relation: {relation}"
        ))),
    }
}

/// Normalizes an operand into its native value: ids become their string
/// form and directions their name.
pub fn serialize_operand(operand: &Operand) -> Value {
    match operand {
        Operand::Value(value) => value.clone(),
        Operand::Id(id) => Value::text(id.as_str()),
        Operand::Direction(dir) => Value::text(dir.name()),
        Operand::List(items) => Value::List(items.iter().map(serialize_operand).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::{compile_condition, serialize_operand};
    use crate::catalog::keys::ColumnKey;
    use crate::catalog::types::Value;
    use crate::cql::Clause;
    use crate::error::BackendErrorCode;
    use crate::id::{Direction, Id};
    use crate::query::condition::{Condition, Operand};

    fn pk() -> Vec<String> {
        vec!["OWNER_VERTEX".to_string()]
    }

    #[test]
    fn conjunction_is_and_of_compiled_sides() {
        let left = Condition::eq(ColumnKey::Label, "knows");
        let right = Condition::gte(ColumnKey::SortValues, "2017");
        let combined = compile_condition(&left.clone().and(right.clone()), &pk()).expect("compile");
        let l = compile_condition(&left, &pk()).expect("left");
        let r = compile_condition(&right, &pk()).expect("right");
        assert_eq!(combined.clause, l.clause.and(r.clause));
        assert!(!combined.allow_filtering);
    }

    #[test]
    fn disjunction_is_unsupported_not_a_contract_violation() {
        let cond = Condition::eq(ColumnKey::Label, "a").or(Condition::eq(ColumnKey::Label, "b"));
        let err = compile_condition(&cond, &pk()).expect_err("or");
        assert_eq!(err.code(), BackendErrorCode::Unsupported);
    }

    #[test]
    fn not_equal_is_a_contract_violation() {
        let cond = Condition::eq(ColumnKey::Label, "a").and(Condition::neq(ColumnKey::Id, "b"));
        let err = compile_condition(&cond, &pk()).expect_err("neq");
        assert!(err.is_contract_violation());
    }

    #[test]
    fn in_serializes_each_element() {
        let cond = Condition::in_(
            ColumnKey::Direction,
            vec![Operand::from(Direction::Out), Operand::from(Direction::In)],
        );
        let compiled = compile_condition(&cond, &pk()).expect("compile");
        assert_eq!(
            compiled.clause,
            Clause::In(
                "DIRECTION".into(),
                vec![Value::text("OUT"), Value::text("IN")]
            )
        );
    }

    #[test]
    fn contains_key_requires_filtering() {
        let cond = Condition::eq(ColumnKey::Label, "person")
            .and(Condition::contains_key(ColumnKey::Properties, "age"));
        let compiled = compile_condition(&cond, &pk()).expect("compile");
        assert!(compiled.allow_filtering);
    }

    #[test]
    fn scan_becomes_half_open_token_range() {
        let compiled = compile_condition(&Condition::scan("-10", "10"), &pk()).expect("compile");
        assert_eq!(
            compiled.clause.leaves(),
            vec![
                &Clause::TokenGte {
                    columns: pk(),
                    token: "-10".into()
                },
                &Clause::TokenLt {
                    columns: pk(),
                    token: "10".into()
                },
            ]
        );
    }

    #[test]
    fn ids_serialize_to_their_string_form() {
        assert_eq!(
            serialize_operand(&Operand::Id(Id::from("1:marko"))),
            Value::text("1:marko")
        );
        assert_eq!(
            serialize_operand(&Operand::Value(Value::Decimal(1.5))),
            Value::Decimal(1.5)
        );
    }
}
