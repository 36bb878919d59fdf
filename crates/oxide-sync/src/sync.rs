//! Schema synchronizer.
//!
//! Runs one synchronization pass per table: compare the canonical metadata
//! with the live catalog, then apply each fix in discovery order. Benign
//! failures are logged and skipped; the first fatal failure stops the pass.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::compare::{CompareOptions, Difference, StructureComparator};
use crate::ddl::split_statements;
use crate::dialect::Dialect;
use crate::error::{Result, SyncError};
use crate::executor::QueryExecutor;
use crate::ledger::VersionLedger;
use crate::metadata::TableMetadata;
use crate::tolerance::{classify, Tolerance};

/// Options for a synchronizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Comparator options.
    pub compare: CompareOptions,
    /// Skip tables whose recorded version is current, record versions after
    /// each successful pass.
    pub track_versions: bool,
    /// Compute differences without executing any fix.
    pub dry_run: bool,
}

impl SyncOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the comparator options.
    #[must_use]
    pub const fn compare(mut self, compare: CompareOptions) -> Self {
        self.compare = compare;
        self
    }

    /// Enables version tracking.
    #[must_use]
    pub const fn track_versions(mut self, enabled: bool) -> Self {
        self.track_versions = enabled;
        self
    }

    /// Enables dry-run mode.
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }
}

/// State of a synchronization pass, as traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Introspecting and diffing.
    Comparing,
    /// Nothing to do.
    Idle,
    /// Executing fixes.
    Applying,
    /// Every fix applied or tolerated.
    Synced,
    /// A fix failed; the remaining fixes were not attempted.
    Failed,
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Converges live tables to their canonical metadata.
pub struct Synchronizer<E> {
    executor: E,
    options: SyncOptions,
    leases: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// A claim on a table's pass lock; unregisters the lock once unclaimed.
struct TableLease<'a> {
    registry: &'a Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    table: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for TableLease<'_> {
    fn drop(&mut self) {
        let mut leases = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the registry and this lease still hold the lock.
        if Arc::strong_count(&self.lock) == 2 {
            leases.remove(&self.table);
        }
    }
}

impl<E: QueryExecutor> Synchronizer<E> {
    /// Creates a synchronizer with default options.
    pub fn new(executor: E) -> Self {
        Self::with_options(executor, SyncOptions::default())
    }

    /// Creates a synchronizer with the given options.
    pub fn with_options(executor: E, options: SyncOptions) -> Self {
        Self {
            executor,
            options,
            leases: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the executor.
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the options.
    pub const fn options(&self) -> SyncOptions {
        self.options
    }

    /// Determines the dialect of the underlying connection.
    pub fn dialect(&self) -> Dialect {
        Dialect::detect(&self.executor)
    }

    /// Returns the version ledger for a dialect.
    pub const fn ledger(&self, dialect: Dialect) -> VersionLedger<'_, E> {
        VersionLedger::new(&self.executor, dialect)
    }

    fn comparator(&self, dialect: Dialect) -> StructureComparator<'_, E> {
        StructureComparator::new(&self.executor, dialect, self.options.compare)
    }

    fn lease(&self, table: &str) -> TableLease<'_> {
        let mut leases = self.leases.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(leases.entry(table.to_string()).or_default());
        TableLease {
            registry: &self.leases,
            table: table.to_string(),
            lock,
        }
    }

    /// Synchronizes a table, returning the differences found.
    ///
    /// A no-op when auto-sync is disabled on the table, or when versions are
    /// tracked and the recorded version is current.
    pub async fn synchronize(
        &self,
        table: &TableMetadata,
        dialect: Dialect,
    ) -> Result<Vec<Difference>> {
        if !table.auto_sync_enabled() {
            debug!(table = %table.table_name(), "Auto-sync disabled, skipping");
            return Ok(Vec::new());
        }

        if self.options.track_versions && !self.options.dry_run {
            let ledger = self.ledger(dialect);
            ledger.ensure_table().await?;
            if let Some(recorded) = ledger.recorded_version(table.table_name()).await? {
                if recorded >= table.schema_version() {
                    debug!(
                        table = %table.table_name(),
                        recorded,
                        "Schema version current, skipping"
                    );
                    return Ok(Vec::new());
                }
            }
        }

        self.run_pass(table, dialect).await
    }

    /// Synchronizes a table regardless of its auto-sync flag and recorded
    /// version.
    pub async fn force_synchronize(
        &self,
        table: &TableMetadata,
        dialect: Dialect,
    ) -> Result<Vec<Difference>> {
        if self.options.track_versions && !self.options.dry_run {
            self.ledger(dialect).ensure_table().await?;
        }
        self.run_pass(table, dialect).await
    }

    /// Returns whether a table differs from its metadata. Never mutates.
    pub async fn needs_synchronization(
        &self,
        table: &TableMetadata,
        dialect: Dialect,
    ) -> Result<bool> {
        self.comparator(dialect).needs_synchronization(table).await
    }

    /// Returns the differences a pass would fix, without executing anything.
    pub async fn plan(&self, table: &TableMetadata, dialect: Dialect) -> Result<Vec<Difference>> {
        let lease = self.lease(table.table_name());
        let _guard = lease.lock.lock().await;
        self.comparator(dialect).compare(table).await
    }

    /// Synchronizes several tables concurrently, one result per table.
    ///
    /// A failing table does not abort its siblings.
    pub async fn synchronize_all(
        &self,
        tables: &[TableMetadata],
        dialect: Dialect,
    ) -> Vec<Result<Vec<Difference>>> {
        join_all(tables.iter().map(|table| self.synchronize(table, dialect))).await
    }

    async fn run_pass(&self, table: &TableMetadata, dialect: Dialect) -> Result<Vec<Difference>> {
        let name = table.table_name();
        let lease = self.lease(name);
        let _guard = lease.lock.lock().await;

        info!(table = %name, dialect = %dialect, state = %PassState::Comparing, "Synchronizing table");
        let differences = self.comparator(dialect).compare(table).await?;

        if differences.is_empty() {
            info!(table = %name, state = %PassState::Idle, "Table up to date");
        } else if self.options.dry_run {
            info!(table = %name, count = differences.len(), "Dry run, no fixes applied");
            return Ok(differences);
        } else {
            info!(
                table = %name,
                count = differences.len(),
                state = %PassState::Applying,
                "Applying fixes"
            );
            if let Err(err) = self.apply(name, &differences).await {
                error!(table = %name, state = %PassState::Failed, error = %err, "Synchronization failed");
                return Err(err);
            }
            info!(table = %name, state = %PassState::Synced, "Table synchronized");
        }

        if self.options.track_versions {
            self.ledger(dialect)
                .record(name, table.schema_version())
                .await?;
        }
        Ok(differences)
    }

    async fn apply(&self, table: &str, differences: &[Difference]) -> Result<()> {
        for difference in differences {
            let Some(fix_sql) = &difference.fix_sql else {
                debug!(table = %table, kind = ?difference.kind, "No fix available, skipping");
                continue;
            };
            info!(table = %table, kind = ?difference.kind, "Applying fix");

            for sql in split_statements(fix_sql) {
                debug!(table = %table, sql = %sql, "Executing SQL");
                let Err(source) = self.executor.execute(&sql).await else {
                    continue;
                };
                match classify(source.message()) {
                    Tolerance::Benign(reason) => warn!(
                        table = %table,
                        sql = %sql,
                        reason,
                        error = %source,
                        "Tolerated database error"
                    ),
                    Tolerance::Fatal => {
                        return Err(SyncError::Apply {
                            table: table.to_string(),
                            sql,
                            source,
                        })
                    }
                }
            }
        }
        Ok(())
    }
}
