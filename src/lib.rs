pub mod catalog;
pub mod config;
pub mod cql;
pub mod entry;
pub mod error;
pub mod id;
pub mod memory;
pub mod query;
pub mod session;
pub mod shard;
pub mod table;

pub use crate::catalog::EntityKind;
pub use crate::catalog::keys::ColumnKey;
pub use crate::catalog::schema::{SchemaStatement, TableDefinition};
pub use crate::catalog::types::{ColumnType, Row, Value};
pub use crate::config::StoreConfig;
pub use crate::entry::{BackendEntry, EntryRow};
pub use crate::error::{BackendError, BackendErrorCode, StoreError};
pub use crate::id::{Direction, Id};
pub use crate::memory::{MemoryCluster, MemorySession};
pub use crate::query::condition::Condition;
pub use crate::query::plan::{Order, Query};
pub use crate::session::Session;
pub use crate::shard::Shard;
pub use crate::table::{CqlTable, Metadata, MetadataKind, TableShape, all_tables};
