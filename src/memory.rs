//! An in-process column-family store implementing [`Session`].
//!
//! Rows live in token order of their partition key, then clustering order,
//! as the real store keeps them. Sessions opened from one
//! [`MemoryCluster`] share data; each session has its own batch.

use crate::catalog::keys::ColumnKey;
use crate::catalog::schema::{SchemaStatement, TableDefinition};
use crate::catalog::types::{ColumnType, Row, Value};
use crate::cql::{Assignment, Clause, Delete, Insert, Select, Statement, Update};
use crate::error::StoreError;
use crate::query::plan::Order;
use crate::session::Session;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

const FILTERING_REQUIRED: &str = "Cannot execute this query as it might involve data filtering and \
     thus may have unpredictable performance. If you want to execute this query despite the \
     performance unpredictability, use ALLOW FILTERING";

/// Token of a partition: crc32c of its key values spread over the signed
/// 64-bit ring. Stays below `i64::MAX` so every token falls inside some
/// half-open `[start, end)` range.
pub fn partition_token(partition: &[Value]) -> i64 {
    let mut bytes = Vec::new();
    for value in partition {
        bytes.extend_from_slice(value.to_text().as_bytes());
        bytes.push(0);
    }
    let h = crc32c::crc32c(&bytes) as u64;
    let token = ((h << 32) | h) as i64;
    token.min(i64::MAX - 1)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RowKey {
    token: i64,
    partition: Vec<Value>,
    clustering: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
struct StoredRow {
    values: BTreeMap<String, Value>,
    /// Set by `INSERT`; rows created by `UPDATE` vanish with their last
    /// regular column.
    marker: bool,
}

#[derive(Debug, Clone)]
struct MemoryTable {
    definition: TableDefinition,
    indexes: BTreeMap<String, ColumnKey>,
    rows: BTreeMap<RowKey, StoredRow>,
}

impl MemoryTable {
    fn new(definition: TableDefinition) -> Self {
        Self {
            definition,
            indexes: BTreeMap::new(),
            rows: BTreeMap::new(),
        }
    }

    fn column(&self, name: &str) -> Result<(ColumnKey, ColumnType), StoreError> {
        ColumnKey::parse(name)
            .and_then(|key| self.definition.column_type(key).map(|ty| (key, ty)))
            .ok_or_else(|| {
                StoreError::new(format!(
                    "Undefined column name {name} in table {}",
                    self.definition.name()
                ))
            })
    }

    fn is_indexed(&self, key: ColumnKey) -> bool {
        self.indexes.values().any(|c| *c == key)
    }

    fn is_primary_key(&self, key: ColumnKey) -> bool {
        self.definition.is_partition_key(key) || self.definition.is_clustering_key(key)
    }

    fn row_key(&self, values: &BTreeMap<String, Value>) -> Result<RowKey, StoreError> {
        let lookup = |name: String| {
            values.get(&name).cloned().ok_or_else(|| {
                StoreError::new(format!("Missing mandatory PRIMARY KEY part {name}"))
            })
        };
        let partition = self
            .definition
            .partition_key_names()
            .into_iter()
            .map(lookup)
            .collect::<Result<Vec<_>, _>>()?;
        let clustering = self
            .definition
            .clustering_key_names()
            .into_iter()
            .map(lookup)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RowKey {
            token: partition_token(&partition),
            partition,
            clustering,
        })
    }

    fn bind(&self, column: &str, value: &Value) -> Result<(String, Value), StoreError> {
        let (key, ty) = self.column(column)?;
        Ok((key.name().to_string(), coerce(ty, value)?))
    }

    fn check_restrictions(&self, select: &Select) -> Result<(), StoreError> {
        for clause in &select.clauses {
            for leaf in clause.leaves() {
                match leaf {
                    Clause::TokenGte { columns, .. } | Clause::TokenLt { columns, .. } => {
                        if *columns != self.definition.partition_key_names() {
                            return Err(StoreError::new(format!(
                                "The token function arguments must be the partition key of {}",
                                self.definition.name()
                            )));
                        }
                    }
                    Clause::ContainsKey(column, _) => {
                        let (key, ty) = self.column(column)?;
                        if ty != ColumnType::TextMap {
                            return Err(StoreError::new(format!(
                                "Cannot use CONTAINS KEY on non-map column {column}"
                            )));
                        }
                        if !select.allow_filtering && !self.is_indexed(key) {
                            return Err(StoreError::new(FILTERING_REQUIRED));
                        }
                    }
                    Clause::Eq(column, _)
                    | Clause::Gt(column, _)
                    | Clause::Gte(column, _)
                    | Clause::Lt(column, _)
                    | Clause::Lte(column, _)
                    | Clause::In(column, _) => {
                        let (key, _) = self.column(column)?;
                        if !select.allow_filtering && !self.is_primary_key(key) && !self.is_indexed(key) {
                            return Err(StoreError::new(FILTERING_REQUIRED));
                        }
                    }
                    Clause::And(_, _) => {}
                }
            }
        }
        Ok(())
    }

    fn matches(&self, key: &RowKey, row: &StoredRow, clause: &Clause) -> Result<bool, StoreError> {
        let cell = |column: &str| -> Result<(Value, ColumnType), StoreError> {
            let (key, ty) = self.column(column)?;
            Ok((row.values.get(key.name()).cloned().unwrap_or(Value::Null), ty))
        };
        let compare = |column: &str, value: &Value, accept: fn(Ordering) -> bool| {
            let (current, ty) = cell(column)?;
            let expected = coerce(ty, value)?;
            Ok::<bool, StoreError>(!current.is_null() && accept(current.cmp(&expected)))
        };
        Ok(match clause {
            Clause::Eq(c, v) => compare(c, v, Ordering::is_eq)?,
            Clause::Gt(c, v) => compare(c, v, Ordering::is_gt)?,
            Clause::Gte(c, v) => compare(c, v, Ordering::is_ge)?,
            Clause::Lt(c, v) => compare(c, v, Ordering::is_lt)?,
            Clause::Lte(c, v) => compare(c, v, Ordering::is_le)?,
            Clause::In(c, list) => {
                let (current, ty) = cell(c)?;
                let mut found = false;
                for item in list {
                    if coerce(ty, item)? == current {
                        found = true;
                        break;
                    }
                }
                found
            }
            Clause::ContainsKey(c, v) => match cell(c)?.0 {
                Value::Map(map) => map.contains_key(v.to_text().as_str()),
                _ => false,
            },
            Clause::TokenGte { token, .. } => key.token >= parse_token(token)?,
            Clause::TokenLt { token, .. } => key.token < parse_token(token)?,
            Clause::And(left, right) => self.matches(key, row, left)? && self.matches(key, row, right)?,
        })
    }

    fn select(&self, select: &Select) -> Result<Vec<Row>, StoreError> {
        self.check_restrictions(select)?;
        let mut hits: Vec<&StoredRow> = Vec::new();
        for (key, row) in &self.rows {
            let mut keep = true;
            for clause in &select.clauses {
                if !self.matches(key, row, clause)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                hits.push(row);
            }
        }

        let mut orders = Vec::with_capacity(select.orders.len());
        for (column, order) in &select.orders {
            let (key, _) = self.column(column)?;
            if !self.definition.is_clustering_key(key) {
                return Err(StoreError::new(format!(
                    "Order by is currently only supported on the clustered columns, got {column}"
                )));
            }
            orders.push((key.name(), *order));
        }
        if !orders.is_empty() {
            hits.sort_by(|a, b| {
                for (name, order) in &orders {
                    let left = a.values.get(*name).unwrap_or(&Value::Null);
                    let right = b.values.get(*name).unwrap_or(&Value::Null);
                    let ord = match order {
                        Order::Asc => left.cmp(right),
                        Order::Desc => right.cmp(left),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }
        if let Some(limit) = select.limit {
            hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        let columns = self.definition.all_columns();
        Ok(hits
            .into_iter()
            .map(|row| {
                let mut out = Row::new();
                for def in &columns {
                    if let Some(value) = row.values.get(def.key.name()) {
                        out = out.with(def.key.name().to_ascii_lowercase(), value.clone());
                    }
                }
                out
            })
            .collect())
    }

    fn insert(&mut self, insert: &Insert) -> Result<(), StoreError> {
        let mut values = BTreeMap::new();
        for (column, value) in &insert.values {
            let (name, value) = self.bind(column, value)?;
            values.insert(name, value);
        }
        let key = self.row_key(&values)?;
        let row = self.rows.entry(key).or_default();
        row.marker = true;
        for (name, value) in values {
            if value.is_null() {
                row.values.remove(&name);
            } else {
                row.values.insert(name, value);
            }
        }
        Ok(())
    }

    fn update(&mut self, update: &Update) -> Result<(), StoreError> {
        let mut values = BTreeMap::new();
        for clause in &update.clauses {
            let Clause::Eq(column, value) = clause else {
                return Err(StoreError::new("UPDATE only accepts equality on primary key columns"));
            };
            let (name, value) = self.bind(column, value)?;
            values.insert(name, value);
        }
        let row_key = self.row_key(&values)?;

        let mut changes = Vec::with_capacity(update.assignments.len());
        for assignment in &update.assignments {
            let (key, ty) = self.column(assignment.column())?;
            if self.is_primary_key(key) {
                return Err(StoreError::new(format!(
                    "PRIMARY KEY part {key} found in SET part"
                )));
            }
            changes.push((key.name().to_string(), ty, assignment.clone()));
        }

        let definition = &self.definition;
        let row = self.rows.entry(row_key.clone()).or_insert_with(|| StoredRow {
            values,
            marker: false,
        });
        for (name, ty, assignment) in changes {
            let current = row.values.remove(&name);
            let next = apply_assignment(ty, current, &assignment)?;
            if let Some(next) = next {
                row.values.insert(name, next);
            }
        }
        let has_regular = row.values.keys().any(|name| {
            ColumnKey::parse(name).is_some_and(|key| {
                !definition.is_partition_key(key) && !definition.is_clustering_key(key)
            })
        });
        if !row.marker && !has_regular {
            self.rows.remove(&row_key);
        }
        Ok(())
    }

    fn delete(&mut self, delete: &Delete) -> Result<usize, StoreError> {
        let mut restrictions = HashMap::new();
        for clause in &delete.clauses {
            let Clause::Eq(column, value) = clause else {
                return Err(StoreError::new("DELETE only accepts equality restrictions"));
            };
            let (name, value) = self.bind(column, value)?;
            restrictions.insert(name, value);
        }
        if restrictions.is_empty() {
            return Err(StoreError::new("DELETE needs a WHERE clause"));
        }
        let doomed: Vec<RowKey> = self
            .rows
            .iter()
            .filter(|(_, row)| {
                restrictions
                    .iter()
                    .all(|(name, value)| row.values.get(name) == Some(value))
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.rows.remove(key);
        }
        Ok(doomed.len())
    }

    fn size_estimate(&self) -> u64 {
        self.rows
            .values()
            .flat_map(|row| row.values.iter())
            .map(|(name, value)| (name.len() + value_size(value)) as u64)
            .sum()
    }
}

fn parse_token(token: &str) -> Result<i64, StoreError> {
    token
        .trim()
        .parse::<i64>()
        .map_err(|_| StoreError::new(format!("Invalid token literal {token}")))
}

fn value_size(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::Text(s) => s.len(),
        Value::BigInt(_) | Value::Decimal(_) => 8,
        Value::Set(items) => items.iter().map(|s| s.len()).sum(),
        Value::Map(map) => map.iter().map(|(k, v)| k.len() + v.len()).sum(),
        Value::List(items) => items.iter().map(value_size).sum(),
    }
}

/// Binds a value to a column type the way the driver codecs would.
fn coerce(ty: ColumnType, value: &Value) -> Result<Value, StoreError> {
    let mismatch = || {
        StoreError::new(format!(
            "Invalid {} value for column of type {}",
            value.kind_name(),
            ty.as_cql()
        ))
    };
    match (ty, value) {
        (_, Value::Null) => Ok(Value::Null),
        (ColumnType::Text, Value::Text(_)) => Ok(value.clone()),
        (ColumnType::Decimal, Value::Decimal(_)) => Ok(value.clone()),
        (ColumnType::Decimal, Value::BigInt(v)) => Ok(Value::Decimal(*v as f64)),
        (ColumnType::TextSet, Value::Set(_)) => Ok(value.clone()),
        (ColumnType::TextSet, Value::List(items)) => {
            Ok(Value::Set(items.iter().map(Value::to_text).collect()))
        }
        (ColumnType::TextMap, Value::Map(_)) => Ok(value.clone()),
        // Element operands of collection removals and CONTAINS KEY.
        (ColumnType::TextSet | ColumnType::TextMap, Value::Text(_)) => Ok(value.clone()),
        _ => Err(mismatch()),
    }
}

fn apply_assignment(
    ty: ColumnType,
    current: Option<Value>,
    assignment: &Assignment,
) -> Result<Option<Value>, StoreError> {
    let collection = match (ty, current) {
        (ColumnType::TextSet, None) => Value::Set(BTreeSet::new()),
        (ColumnType::TextMap, None) => Value::empty_map(),
        (ColumnType::TextSet | ColumnType::TextMap, Some(current)) => current,
        (other, _) => {
            return Err(StoreError::new(format!(
                "Invalid operation for non-collection column of type {}",
                other.as_cql()
            )));
        }
    };
    let next = match (collection, assignment) {
        (Value::Set(mut set), Assignment::Append { value, .. }) => {
            match coerce(ty, value)? {
                Value::Set(items) => set.extend(items),
                other => {
                    set.insert(other.to_text());
                }
            }
            Value::Set(set)
        }
        (Value::Map(mut map), Assignment::Append { value: Value::Map(items), .. }) => {
            map.extend(items.iter().map(|(k, v)| (k.clone(), v.clone())));
            Value::Map(map)
        }
        (Value::Set(mut set), Assignment::RemoveAll { value, .. }) => {
            if let Value::Set(items) = coerce(ty, value)? {
                set.retain(|s| !items.contains(s));
            }
            Value::Set(set)
        }
        (Value::Map(mut map), Assignment::RemoveAll { value: Value::Set(keys), .. }) => {
            map.retain(|k, _| !keys.contains(k));
            Value::Map(map)
        }
        (Value::Set(mut set), Assignment::Remove { value, .. }) => {
            set.remove(value.to_text().as_str());
            Value::Set(set)
        }
        (Value::Map(mut map), Assignment::Remove { value, .. }) => {
            map.remove(value.to_text().as_str());
            Value::Map(map)
        }
        (_, assignment) => {
            return Err(StoreError::new(format!(
                "Invalid assignment for column {} of type {}",
                assignment.column(),
                ty.as_cql()
            )));
        }
    };
    // Empty collections are indistinguishable from null.
    Ok(match &next {
        Value::Set(set) if set.is_empty() => None,
        Value::Map(map) if map.is_empty() => None,
        _ => Some(next),
    })
}

#[derive(Debug, Default)]
struct ClusterState {
    keyspaces: BTreeMap<String, BTreeMap<String, MemoryTable>>,
}

/// Shared storage that in-memory sessions connect to.
#[derive(Debug, Clone, Default)]
pub struct MemoryCluster {
    state: Arc<RwLock<ClusterState>>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, keyspace: impl Into<String>) -> MemorySession {
        MemorySession {
            cluster: self.clone(),
            keyspace: keyspace.into(),
            batch: Vec::new(),
            executed: Vec::new(),
        }
    }

    pub fn table_names(&self, keyspace: &str) -> Vec<String> {
        self.state
            .read()
            .keyspaces
            .get(keyspace)
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self, keyspace: &str, table: &str) -> usize {
        self.state
            .read()
            .keyspaces
            .get(keyspace)
            .and_then(|tables| tables.get(table))
            .map_or(0, |t| t.rows.len())
    }
}

/// A session against a [`MemoryCluster`]. Mutations are buffered until
/// [`MemorySession::commit`].
#[derive(Debug)]
pub struct MemorySession {
    cluster: MemoryCluster,
    keyspace: String,
    batch: Vec<Statement>,
    executed: Vec<Select>,
}

impl MemorySession {
    /// A session on a fresh private cluster.
    pub fn new(keyspace: impl Into<String>) -> Self {
        MemoryCluster::new().connect(keyspace)
    }

    pub fn cluster(&self) -> &MemoryCluster {
        &self.cluster
    }

    /// Statements staged since the last commit.
    pub fn staged(&self) -> &[Statement] {
        &self.batch
    }

    /// Every select executed by this session, in order.
    pub fn executed_selects(&self) -> &[Select] {
        &self.executed
    }

    pub fn clear_history(&mut self) {
        self.executed.clear();
    }

    pub fn rollback(&mut self) {
        self.batch.clear();
    }

    /// Applies the staged batch. Either every statement applies or none
    /// does. Returns the number of statements applied.
    pub fn commit(&mut self) -> Result<usize, StoreError> {
        let batch = std::mem::take(&mut self.batch);
        let mut state = self.cluster.state.write();
        let tables = state.keyspaces.entry(self.keyspace.clone()).or_default();
        let mut working = tables.clone();
        for statement in &batch {
            let table = working.get_mut(statement.table()).ok_or_else(|| unconfigured(statement.table()))?;
            match statement {
                Statement::Insert(insert) => table.insert(insert)?,
                Statement::Update(update) => table.update(update)?,
                Statement::Delete(delete) => {
                    table.delete(delete)?;
                }
            }
        }
        *tables = working;
        debug!(keyspace = %self.keyspace, statements = batch.len(), "batch committed");
        Ok(batch.len())
    }
}

fn unconfigured(table: &str) -> StoreError {
    StoreError::new(format!("unconfigured table {table}"))
}

impl Session for MemorySession {
    fn keyspace(&self) -> &str {
        &self.keyspace
    }

    fn execute(&mut self, select: &Select) -> Result<Vec<Row>, StoreError> {
        self.executed.push(select.clone());
        let state = self.cluster.state.read();
        let table = state
            .keyspaces
            .get(&self.keyspace)
            .and_then(|tables| tables.get(&select.table))
            .ok_or_else(|| unconfigured(&select.table))?;
        table.select(select)
    }

    fn execute_schema(&mut self, statement: &SchemaStatement) -> Result<(), StoreError> {
        let mut state = self.cluster.state.write();
        let tables = state.keyspaces.entry(self.keyspace.clone()).or_default();
        match statement {
            SchemaStatement::CreateTable(def) => {
                tables
                    .entry(def.name().to_string())
                    .or_insert_with(|| MemoryTable::new(def.clone()));
            }
            SchemaStatement::DropTable { table } => {
                tables.remove(table);
            }
            SchemaStatement::CreateIndex {
                index_name,
                table,
                column,
            } => {
                let target = tables.get_mut(table).ok_or_else(|| unconfigured(table))?;
                target.column(column.name())?;
                target.indexes.entry(index_name.clone()).or_insert(*column);
            }
        }
        Ok(())
    }

    fn add(&mut self, statement: Statement) {
        self.batch.push(statement);
    }

    fn size_estimate(&mut self, table: &str) -> Result<u64, StoreError> {
        let state = self.cluster.state.read();
        state
            .keyspaces
            .get(&self.keyspace)
            .and_then(|tables| tables.get(table))
            .map(MemoryTable::size_estimate)
            .ok_or_else(|| unconfigured(table))
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryCluster, MemorySession, partition_token};
    use crate::catalog::keys::ColumnKey;
    use crate::catalog::schema::TableDefinition;
    use crate::catalog::types::{ColumnType, Value};
    use crate::cql::{Assignment, Clause, Insert, Select, Statement, Update};
    use crate::session::Session;

    fn vertices(session: &mut MemorySession) {
        let def = TableDefinition::builder("vertices")
            .partition_key(ColumnKey::Id, ColumnType::Text)
            .column(ColumnKey::Label, ColumnType::Text)
            .column(ColumnKey::Properties, ColumnType::TextMap)
            .build()
            .expect("definition");
        session.execute_schema(&def.create_table()).expect("create");
    }

    fn insert_vertex(session: &mut MemorySession, id: &str, label: &str) {
        session.add(Statement::Insert(Insert {
            table: "vertices".into(),
            values: vec![
                ("ID".into(), Value::text(id)),
                ("LABEL".into(), Value::text(label)),
            ],
        }));
    }

    #[test]
    fn staged_rows_are_invisible_until_commit() {
        let mut session = MemorySession::new("g");
        vertices(&mut session);
        insert_vertex(&mut session, "1", "person");
        let all = Select::from("vertices");
        assert!(session.execute(&all).expect("select").is_empty());
        assert_eq!(session.commit().expect("commit"), 1);
        let rows = session.execute(&all).expect("select");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_text("label"), Some("person"));
        assert_eq!(rows[0].columns[0].0, "id");
    }

    #[test]
    fn non_key_predicate_needs_filtering() {
        let mut session = MemorySession::new("g");
        vertices(&mut session);
        let select = Select::from("vertices").where_(Clause::eq("LABEL", "person"));
        assert!(session.execute(&select).is_err());
        assert!(session.execute(&select.allow_filtering()).is_ok());
    }

    #[test]
    fn failed_batch_applies_nothing() {
        let mut session = MemorySession::new("g");
        vertices(&mut session);
        insert_vertex(&mut session, "1", "person");
        session.add(Statement::Insert(Insert {
            table: "missing".into(),
            values: vec![("ID".into(), Value::text("2"))],
        }));
        assert!(session.commit().is_err());
        assert_eq!(session.cluster().row_count("g", "vertices"), 0);
        assert!(session.staged().is_empty());
    }

    #[test]
    fn sessions_of_one_cluster_share_rows() {
        let cluster = MemoryCluster::new();
        let mut writer = cluster.connect("g");
        vertices(&mut writer);
        insert_vertex(&mut writer, "1", "person");
        writer.commit().expect("commit");
        let mut reader = cluster.connect("g");
        assert_eq!(reader.execute(&Select::from("vertices")).expect("select").len(), 1);
        assert_eq!(cluster.table_names("g"), vec!["vertices".to_string()]);
    }

    #[test]
    fn update_created_row_disappears_with_last_element() {
        let mut session = MemorySession::new("g");
        let def = TableDefinition::builder("secondary_indexes")
            .partition_key(ColumnKey::FieldValues, ColumnType::Text)
            .clustering_key(ColumnKey::IndexLabelName, ColumnType::Text)
            .column(ColumnKey::ElementIds, ColumnType::TextSet)
            .build()
            .expect("definition");
        session.execute_schema(&def.create_table()).expect("create");
        let key = vec![
            Clause::eq("FIELD_VALUES", "marko"),
            Clause::eq("INDEX_LABEL_NAME", "byName"),
        ];
        session.add(Statement::Update(Update {
            table: "secondary_indexes".into(),
            assignments: vec![Assignment::Append {
                column: "ELEMENT_IDS".into(),
                value: Value::set(["1:marko"]),
            }],
            clauses: key.clone(),
        }));
        session.commit().expect("append");
        assert_eq!(session.cluster().row_count("g", "secondary_indexes"), 1);

        session.add(Statement::Update(Update {
            table: "secondary_indexes".into(),
            assignments: vec![Assignment::Remove {
                column: "ELEMENT_IDS".into(),
                value: Value::text("1:marko"),
            }],
            clauses: key,
        }));
        session.commit().expect("remove");
        assert_eq!(session.cluster().row_count("g", "secondary_indexes"), 0);
    }

    #[test]
    fn tokens_stay_below_ring_maximum() {
        for id in ["", "a", "1:marko", "zzzz"] {
            assert!(partition_token(&[Value::text(id)]) < i64::MAX);
        }
    }
}
