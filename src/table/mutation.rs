use crate::catalog::keys::ColumnKey;
use crate::catalog::types::Value;
use crate::cql::{Assignment, Clause, Delete, Insert, Statement, Update};
use crate::entry::{EntryRow, entry_to_assignments};
use crate::error::BackendError;
use crate::session::Session;
use crate::table::CqlTable;
use std::collections::BTreeSet;

/// Whole-row insert with every column of the entry.
pub fn insert<S: Session + ?Sized>(table: &CqlTable, session: &mut S, row: &EntryRow) -> Result<(), BackendError> {
    if !row.has_columns() {
        return Err(BackendError::ContractViolation(format!(
            "insert into '{}' needs at least one column",
            table.name()
        )));
    }
    session.add(Statement::Insert(Insert {
        table: table.name().to_string(),
        values: entry_to_assignments(row),
    }));
    Ok(())
}

/// Adds elements to the collection columns of the row addressed by the
/// entry's identifier.
pub fn append<S: Session + ?Sized>(table: &CqlTable, session: &mut S, row: &EntryRow) -> Result<(), BackendError> {
    let id_columns = table.shape().id_columns();
    let assignments: Vec<Assignment> = row
        .columns()
        .iter()
        .filter(|(key, _)| !id_columns.contains(*key))
        .map(|(key, value)| Assignment::Append {
            column: key.name().to_string(),
            value: as_collection(value),
        })
        .collect();
    update(table, session, row, assignments, "append")
}

/// Removes elements from the collection columns of the row addressed by
/// the entry's identifier. Map values remove their keys.
pub fn eliminate<S: Session + ?Sized>(
    table: &CqlTable,
    session: &mut S,
    row: &EntryRow,
) -> Result<(), BackendError> {
    let id_columns = table.shape().id_columns();
    let assignments: Vec<Assignment> = row
        .columns()
        .iter()
        .filter(|(key, _)| !id_columns.contains(*key))
        .map(|(key, value)| removal(key.name(), value))
        .collect();
    update(table, session, row, assignments, "eliminate")
}

/// Deletes by identifier when the entry has no columns, or by equality on
/// every column when it has no identifier.
pub fn delete<S: Session + ?Sized>(table: &CqlTable, session: &mut S, row: &EntryRow) -> Result<(), BackendError> {
    let clauses = if !row.has_columns() {
        key_clauses(table, row)?
    } else if row.id().is_none() {
        row.columns()
            .iter()
            .map(|(key, value)| Clause::Eq(key.name().to_string(), value.clone()))
            .collect()
    } else {
        return Err(BackendError::Unsupported(format!(
            "delete from '{}' by id together with columns",
            table.name()
        )));
    };
    session.add(Statement::Delete(Delete {
        table: table.name().to_string(),
        clauses,
    }));
    Ok(())
}

fn update<S: Session + ?Sized>(
    table: &CqlTable,
    session: &mut S,
    row: &EntryRow,
    assignments: Vec<Assignment>,
    op: &str,
) -> Result<(), BackendError> {
    if assignments.is_empty() {
        return Err(BackendError::ContractViolation(format!(
            "{op} on '{}' has no collection column to modify",
            table.name()
        )));
    }
    let clauses = key_clauses(table, row)?;
    session.add(Statement::Update(Update {
        table: table.name().to_string(),
        assignments,
        clauses,
    }));
    Ok(())
}

/// One equality per id column, from the entry's identifier or, when it has
/// none, from the id columns it carries.
pub(crate) fn key_clauses(table: &CqlTable, row: &EntryRow) -> Result<Vec<Clause>, BackendError> {
    let keyed: Vec<(ColumnKey, Value)> = match row.id() {
        Some(id) => table.id_key_values(id)?,
        None => table
            .shape()
            .id_columns()
            .iter()
            .map(|key| {
                row.get(*key)
                    .cloned()
                    .map(|value| (*key, value))
                    .ok_or_else(|| missing_key(table, *key))
            })
            .collect::<Result<_, _>>()?,
    };
    Ok(keyed
        .into_iter()
        .map(|(key, value)| Clause::Eq(key.name().to_string(), value))
        .collect())
}

fn missing_key(table: &CqlTable, key: ColumnKey) -> BackendError {
    BackendError::ContractViolation(format!(
        "mutation on '{}' needs an id or the {key} column",
        table.name()
    ))
}

fn as_collection(value: &Value) -> Value {
    match value {
        Value::Set(_) | Value::Map(_) => value.clone(),
        Value::List(items) => Value::Set(items.iter().map(Value::to_text).collect()),
        scalar => Value::Set(BTreeSet::from([scalar.to_text()])),
    }
}

fn removal(column: &str, value: &Value) -> Assignment {
    let column = column.to_string();
    match value {
        // Removing from a map takes its keys, not key/value pairs.
        Value::Map(map) => Assignment::RemoveAll {
            column,
            value: Value::Set(map.keys().cloned().collect()),
        },
        Value::Set(_) => Assignment::RemoveAll {
            column,
            value: value.clone(),
        },
        Value::List(items) => Assignment::RemoveAll {
            column,
            value: Value::Set(items.iter().map(Value::to_text).collect()),
        },
        scalar => Assignment::Remove {
            column,
            value: scalar.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{as_collection, removal};
    use crate::catalog::types::Value;
    use crate::cql::Assignment;

    #[test]
    fn eliminating_a_map_removes_its_keys() {
        let assignment = removal("PROPERTIES", &Value::map([("city", "Wuhan")]));
        assert_eq!(
            assignment,
            Assignment::RemoveAll {
                column: "PROPERTIES".into(),
                value: Value::set(["city"]),
            }
        );
    }

    #[test]
    fn lists_are_deduplicated_into_sets() {
        let list = Value::List(vec![Value::text("a"), Value::text("b"), Value::text("a")]);
        assert_eq!(
            removal("ELEMENT_IDS", &list),
            Assignment::RemoveAll {
                column: "ELEMENT_IDS".into(),
                value: Value::set(["a", "b"]),
            }
        );
        assert_eq!(as_collection(&list), Value::set(["a", "b"]));
    }

    #[test]
    fn scalars_are_single_elements() {
        assert_eq!(
            removal("ELEMENT_IDS", &Value::text("1:marko")),
            Assignment::Remove {
                column: "ELEMENT_IDS".into(),
                value: Value::text("1:marko"),
            }
        );
        assert_eq!(as_collection(&Value::text("1:marko")), Value::set(["1:marko"]));
    }
}
