//! Schema synchronization for Rust.
//!
//! `oxide-sync` keeps a live relational schema converged with entity
//! metadata declared in code, across MySQL, PostgreSQL and H2:
//! - `CREATE TABLE` statements are generated per dialect
//! - The live catalog is introspected and diffed into typed [`Difference`]s
//! - Each difference carries the SQL that fixes it, applied in order,
//!   tolerating benign failures such as an index that already exists
//!
//! # Architecture
//!
//! - **Metadata** - Canonical table model built from entity descriptors
//! - **Dialect** - Database-specific quoting, DDL and catalog queries
//! - **DDL** - Statement generation
//! - **Introspect** - Live catalog facts
//! - **Compare** - Equivalence rules and the diff
//! - **Sync** - Sequential fix application under a per-table lease
//! - **Ledger** - Schema versions already synchronized
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_sync::prelude::*;
//!
//! #[derive(Entity)]
//! #[entity(table = "user", version = 2)]
//! struct User {
//!     #[field(auto_increment)]
//!     id: i64,
//!     #[field(length = 120, unique = "email")]
//!     email: String,
//!     nickname: Option<String>,
//! }
//!
//! let pool = sqlx::MySqlPool::connect("mysql://localhost/app").await?;
//! let synchronizer = Synchronizer::new(pool);
//! let table = TableMetadata::of::<User>()?;
//! let applied = synchronizer.synchronize(&table, synchronizer.dialect()).await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print CREATE TABLE statements
//! oxide-sync --schema schema.json --dialect postgres sql
//!
//! # Show differences with a live database
//! oxide-sync --schema schema.json --database-url mysql://localhost/app diff
//!
//! # Apply fixes
//! oxide-sync --schema schema.json --database-url mysql://localhost/app sync
//! ```

extern crate self as oxide_sync;

pub mod compare;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod introspect;
pub mod ledger;
pub mod metadata;
pub mod sync;
pub mod tolerance;

pub use compare::{Difference, DifferenceKind};
pub use error::{Result, SyncError};
pub use metadata::Entity;
pub use oxide_sync_derive::Entity;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::compare::{CompareOptions, Difference, DifferenceKind, StructureComparator};
    pub use crate::ddl::generate_create_table;
    pub use crate::dialect::{Dialect, DialectStrategy};
    pub use crate::error::{Result, SyncError};
    pub use crate::executor::{CatalogRow, QueryError, QueryExecutor};
    pub use crate::introspect::{Introspector, LiveColumnFact, LiveIndexFact};
    pub use crate::ledger::{LedgerEntry, VersionLedger};
    pub use crate::metadata::{
        ColumnMetadata, Entity, EntityDescriptor, FieldDescriptor, IndexDefinition, SqlType,
        TableMetadata,
    };
    pub use crate::sync::{SyncOptions, Synchronizer};
    pub use oxide_sync_derive::Entity;
}
