use crate::cql::{Clause, Select, SelectBase};
use crate::error::BackendError;
use crate::query::compiler::compile_condition;
use crate::query::plan::Query;
use crate::table::CqlTable;
use tracing::{debug, warn};

/// Translates a backend query into the selects that answer it.
///
/// Statements come back in generation order. Callers concatenate their rows
/// without deduplication.
pub fn translate(table: &CqlTable, query: &Query) -> Result<Vec<Select>, BackendError> {
    if query.is_empty_by_limit() {
        debug!(table = %table.name(), "limit 0, no statements");
        return Ok(Vec::new());
    }

    let base = select_base(table, query)?;
    let seeds = id_selects(table, query, &base)?;

    let max = table.config().max_query_statements;
    if max != 0 && seeds.len() > max {
        return Err(BackendError::InvalidArgument(format!(
            "query against '{}' fans out into {} statements (max {max})",
            table.name(),
            seeds.len()
        )));
    }

    if query.conditions.is_empty() {
        debug!(table = %table.name(), statements = seeds.len(), "query by id(s)");
        return Ok(seeds);
    }

    let partition_columns = table.definition().partition_key_names();
    let mut compiled = Vec::with_capacity(query.conditions.len());
    for condition in &query.conditions {
        compiled.push(compile_condition(condition, &partition_columns)?);
    }

    let selects: Vec<Select> = seeds
        .into_iter()
        .map(|mut select| {
            for c in &compiled {
                select = select.where_(c.clause.clone());
                if c.allow_filtering {
                    select = select.allow_filtering();
                }
            }
            select
        })
        .collect();
    debug!(table = %table.name(), statements = selects.len(), "query by conditions");
    Ok(selects)
}

/// Largest row limit the store accepts; CQL `LIMIT` is a 32-bit int.
const MAX_LIMIT: u64 = i32::MAX as u64;

fn select_base(table: &CqlTable, query: &Query) -> Result<SelectBase, BackendError> {
    let mut base = SelectBase::new(table.name());
    if query.has_limit() {
        if query.limit > MAX_LIMIT {
            return Err(BackendError::InvalidArgument(format!(
                "query limit {} on table '{}' exceeds {MAX_LIMIT}",
                query.limit,
                table.name()
            )));
        }
        base = base.limit(query.limit);
    }
    if query.offset != 0 {
        warn!(
            table = %table.name(),
            offset = query.offset,
            "query offset is not supported by the store, it will be ignored"
        );
    }
    for (key, order) in &query.orders {
        base = base.order_by(key.name(), *order);
    }
    Ok(base)
}

fn id_selects(table: &CqlTable, query: &Query, base: &SelectBase) -> Result<Vec<Select>, BackendError> {
    if query.ids.is_empty() {
        return Ok(vec![base.statement()]);
    }

    let mut decoded = Vec::with_capacity(query.ids.len());
    for id in &query.ids {
        decoded.push(table.id_key_values(id)?);
    }

    if let [name] = table.shape().id_columns() {
        let values = decoded
            .into_iter()
            .filter_map(|mut keyed| keyed.pop())
            .map(|(_, value)| value)
            .collect();
        return Ok(vec![base.statement().where_(Clause::In(name.name().to_string(), values))]);
    }

    // Multi-column IN is illegal once the partition key is involved, so each
    // id gets its own select.
    Ok(decoded
        .into_iter()
        .map(|keyed| {
            keyed.into_iter().fold(base.statement(), |select, (key, value)| {
                select.where_(Clause::Eq(key.name().to_string(), value))
            })
        })
        .collect())
}
