use crate::catalog::keys::ColumnKey;
use crate::catalog::types::ColumnType;
use crate::error::BackendError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDef {
    pub key: ColumnKey,
    pub col_type: ColumnType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexDef {
    pub index_name: String,
    pub column: ColumnKey,
}

/// Storage layout of one table kind. Built once, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDefinition {
    name: String,
    partition_keys: Vec<ColumnDef>,
    clustering_keys: Vec<ColumnDef>,
    columns: Vec<ColumnDef>,
    indexes: Vec<IndexDef>,
}

impl TableDefinition {
    pub fn builder(name: impl Into<String>) -> TableDefinitionBuilder {
        TableDefinitionBuilder {
            name: name.into(),
            partition_keys: Vec::new(),
            clustering_keys: Vec::new(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partition_keys(&self) -> &[ColumnDef] {
        &self.partition_keys
    }

    pub fn clustering_keys(&self) -> &[ColumnDef] {
        &self.clustering_keys
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn indexes(&self) -> &[IndexDef] {
        &self.indexes
    }

    pub fn partition_key_names(&self) -> Vec<String> {
        self.partition_keys
            .iter()
            .map(|c| c.key.name().to_string())
            .collect()
    }

    pub fn clustering_key_names(&self) -> Vec<String> {
        self.clustering_keys
            .iter()
            .map(|c| c.key.name().to_string())
            .collect()
    }

    /// Every column in the order the store reports them: partition keys,
    /// clustering keys, then regular columns sorted by name.
    pub fn all_columns(&self) -> Vec<ColumnDef> {
        let mut regular = self.columns.clone();
        regular.sort_by_key(|c| c.key.name());
        self.partition_keys
            .iter()
            .chain(self.clustering_keys.iter())
            .copied()
            .chain(regular)
            .collect()
    }

    pub fn column_type(&self, key: ColumnKey) -> Option<ColumnType> {
        self.partition_keys
            .iter()
            .chain(&self.clustering_keys)
            .chain(&self.columns)
            .find(|c| c.key == key)
            .map(|c| c.col_type)
    }

    pub fn is_partition_key(&self, key: ColumnKey) -> bool {
        self.partition_keys.iter().any(|c| c.key == key)
    }

    pub fn is_clustering_key(&self, key: ColumnKey) -> bool {
        self.clustering_keys.iter().any(|c| c.key == key)
    }

    pub fn is_indexed(&self, key: ColumnKey) -> bool {
        self.indexes.iter().any(|i| i.column == key)
    }

    pub fn create_table(&self) -> SchemaStatement {
        SchemaStatement::CreateTable(self.clone())
    }

    pub fn drop_table(&self) -> SchemaStatement {
        SchemaStatement::DropTable {
            table: self.name.clone(),
        }
    }

    pub fn create_indexes(&self) -> Vec<SchemaStatement> {
        self.indexes
            .iter()
            .map(|index| SchemaStatement::CreateIndex {
                index_name: index.index_name.clone(),
                table: self.name.clone(),
                column: index.column,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct TableDefinitionBuilder {
    name: String,
    partition_keys: Vec<ColumnDef>,
    clustering_keys: Vec<ColumnDef>,
    columns: Vec<ColumnDef>,
    indexes: Vec<IndexDef>,
}

impl TableDefinitionBuilder {
    pub fn partition_key(mut self, key: ColumnKey, col_type: ColumnType) -> Self {
        self.partition_keys.push(ColumnDef { key, col_type });
        self
    }

    pub fn clustering_key(mut self, key: ColumnKey, col_type: ColumnType) -> Self {
        self.clustering_keys.push(ColumnDef { key, col_type });
        self
    }

    pub fn column(mut self, key: ColumnKey, col_type: ColumnType) -> Self {
        self.columns.push(ColumnDef { key, col_type });
        self
    }

    pub fn index(mut self, index_name: impl Into<String>, column: ColumnKey) -> Self {
        self.indexes.push(IndexDef {
            index_name: index_name.into(),
            column,
        });
        self
    }

    pub fn build(self) -> Result<TableDefinition, BackendError> {
        if self.partition_keys.is_empty() {
            return Err(BackendError::ContractViolation(format!(
                "table '{}' must declare at least one partition key",
                self.name
            )));
        }
        let mut seen = Vec::new();
        for def in self
            .partition_keys
            .iter()
            .chain(&self.clustering_keys)
            .chain(&self.columns)
        {
            if seen.contains(&def.key) {
                return Err(BackendError::ContractViolation(format!(
                    "column {} declared twice in table '{}'",
                    def.key, self.name
                )));
            }
            seen.push(def.key);
        }
        for index in &self.indexes {
            if !seen.contains(&index.column) {
                return Err(BackendError::ContractViolation(format!(
                    "index '{}' references undeclared column {}",
                    index.index_name, index.column
                )));
            }
        }
        Ok(self.assemble())
    }

    /// Skips validation. Only for the fixed built-in layouts, which are
    /// checked against [`TableDefinitionBuilder::build`] in tests.
    pub(crate) fn assemble(self) -> TableDefinition {
        TableDefinition {
            name: self.name,
            partition_keys: self.partition_keys,
            clustering_keys: self.clustering_keys,
            columns: self.columns,
            indexes: self.indexes,
        }
    }
}

/// DDL issued once at startup, never on a hot path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatement {
    CreateTable(TableDefinition),
    DropTable {
        table: String,
    },
    CreateIndex {
        index_name: String,
        table: String,
        column: ColumnKey,
    },
}

impl SchemaStatement {
    pub fn to_cql(&self) -> String {
        match self {
            SchemaStatement::CreateTable(def) => create_table_cql(def),
            SchemaStatement::DropTable { table } => format!("DROP TABLE IF EXISTS {table};"),
            SchemaStatement::CreateIndex {
                index_name,
                table,
                column,
            } => format!("CREATE INDEX IF NOT EXISTS {index_name} ON {table}({column});"),
        }
    }
}

fn create_table_cql(def: &TableDefinition) -> String {
    let column_count = def.partition_keys.len() + def.clustering_keys.len() + def.columns.len();
    let mut sb = String::with_capacity(128 + column_count * 64);

    sb.push_str("CREATE TABLE IF NOT EXISTS ");
    sb.push_str(&def.name);
    sb.push_str(" (");

    for col in def
        .partition_keys
        .iter()
        .chain(&def.clustering_keys)
        .chain(&def.columns)
    {
        sb.push_str(col.key.name());
        sb.push(' ');
        sb.push_str(col.col_type.as_cql());
        sb.push_str(", ");
    }

    sb.push_str("PRIMARY KEY ((");
    sb.push_str(&def.partition_key_names().join(", "));
    sb.push(')');
    for ck in &def.clustering_keys {
        sb.push_str(", ");
        sb.push_str(ck.key.name());
    }
    sb.push_str("));");
    sb
}
