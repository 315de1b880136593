use crate::catalog::schema::SchemaStatement;
use crate::catalog::types::Row;
use crate::cql::{Select, Statement};
use crate::error::StoreError;

/// The native connection as seen by the tables: a single-threaded
/// sequencing context. Selects run immediately and return every row;
/// mutations are staged on a batch whose commit belongs to the caller.
///
/// Token scans use half-open ranges, so a session must keep every partition
/// token inside `[MIN_TOKEN, MAX_TOKEN)` of [`crate::shard`]. A partitioner
/// that can produce `i64::MAX` has to fold it below the bound.
pub trait Session {
    fn keyspace(&self) -> &str;

    fn execute(&mut self, select: &Select) -> Result<Vec<Row>, StoreError>;

    fn execute_schema(&mut self, statement: &SchemaStatement) -> Result<(), StoreError>;

    /// Stages a mutation on the current batch.
    fn add(&mut self, statement: Statement);

    /// Estimated on-disk size of a table in bytes, used to size token splits.
    fn size_estimate(&mut self, table: &str) -> Result<u64, StoreError>;
}
