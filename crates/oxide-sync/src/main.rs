//! oxide-sync CLI
//!
//! Command-line tool for synchronizing database schemas with entity
//! descriptors.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_sync::ddl::{generate_create_table, join_statements};
use oxide_sync::prelude::*;

/// Keeps live database schemas in sync with declared entity metadata.
#[derive(Parser)]
#[command(name = "oxide-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (`mysql://...` or `postgres://...`).
    #[arg(short, long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JSON file holding the entity descriptors.
    #[arg(short, long, env = "OXIDE_SYNC_SCHEMA", default_value = "schema.json")]
    schema: PathBuf,

    /// Dialect for the offline `sql` command (mysql, postgres, h2). Live
    /// commands detect the dialect from the connection and reject a
    /// conflicting value.
    #[arg(long)]
    dialect: Option<Dialect>,

    /// Skip tables whose recorded schema version is current.
    #[arg(long)]
    track_versions: bool,

    /// Report auto-increment and primary key nullability drift.
    #[arg(long)]
    strict: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print CREATE TABLE statements (no connection needed).
    Sql,

    /// Show differences between the descriptors and the database.
    Diff {
        /// Print differences as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Exit with status 1 when any table needs synchronization.
    Check,

    /// Apply the fixes converging the database.
    Sync {
        /// Synchronize tables with auto-sync disabled too.
        #[arg(short, long)]
        force: bool,

        /// Show differences without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Show recorded schema versions.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let tables = EntityDescriptor::load_all(&cli.schema)?
        .iter()
        .map(TableMetadata::from_descriptor)
        .collect::<oxide_sync::Result<Vec<_>>>()?;
    info!(count = tables.len(), schema = %cli.schema.display(), "Loaded entity descriptors");

    let url_dialect = cli.database_url.as_deref().map(dialect_from_url).transpose()?;

    if matches!(cli.command, Commands::Sql) {
        let dialect = cli.dialect.or(url_dialect).unwrap_or(Dialect::MySql);
        print_create_tables(&tables, dialect)?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(url) = cli.database_url.as_deref() else {
        bail!("--database-url (or DATABASE_URL) is required for this command");
    };

    let dry_run = matches!(cli.command, Commands::Sync { dry_run: true, .. });
    let compare = if cli.strict {
        CompareOptions::new().strict()
    } else {
        CompareOptions::new()
    };
    let options = SyncOptions::new()
        .compare(compare)
        .track_versions(cli.track_versions)
        .dry_run(dry_run);

    match url_dialect {
        Some(Dialect::Postgres) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("connecting to PostgreSQL")?;
            run(Synchronizer::with_options(pool, options), cli.dialect, &tables, cli.command).await
        }
        Some(Dialect::MySql) => {
            let pool = MySqlPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("connecting to MySQL")?;
            run(Synchronizer::with_options(pool, options), cli.dialect, &tables, cli.command).await
        }
        _ => bail!("unsupported database URL: {}", url),
    }
}

/// Maps a connection URL scheme to a dialect.
fn dialect_from_url(url: &str) -> anyhow::Result<Dialect> {
    let scheme = url.split_once("://").map_or(url, |(scheme, _)| scheme);
    match scheme {
        "mysql" | "mariadb" => Ok(Dialect::MySql),
        "postgres" | "postgresql" => Ok(Dialect::Postgres),
        "h2" | "jdbc:h2" => bail!("H2 databases are only supported by the `sql` command"),
        other => bail!("unsupported database scheme: {}", other),
    }
}

/// Picks the dialect of a live connection, rejecting a conflicting override.
fn live_dialect(detected: Dialect, requested: Option<Dialect>) -> anyhow::Result<Dialect> {
    match requested {
        Some(requested) if requested != detected => bail!(
            "--dialect {} conflicts with the {} connection; it only applies to the `sql` command",
            requested,
            detected
        ),
        _ => Ok(detected),
    }
}

fn print_create_tables(tables: &[TableMetadata], dialect: Dialect) -> anyhow::Result<()> {
    for table in tables {
        let statements = generate_create_table(table, dialect)?;
        println!("{};\n", join_statements(&statements));
    }
    Ok(())
}

async fn run<E: QueryExecutor>(
    synchronizer: Synchronizer<E>,
    requested: Option<Dialect>,
    tables: &[TableMetadata],
    command: Commands,
) -> anyhow::Result<ExitCode> {
    let dialect = live_dialect(synchronizer.dialect(), requested)?;
    info!(dialect = %dialect, "Connected");

    match command {
        Commands::Sql => print_create_tables(tables, dialect)?,

        Commands::Diff { json } => {
            let mut all = Vec::new();
            for table in tables {
                all.extend(synchronizer.plan(table, dialect).await?);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                info!("All tables are up to date.");
            } else {
                for difference in &all {
                    println!("{}", difference);
                    if let Some(sql) = &difference.fix_sql {
                        println!("    {};", sql.replace('\n', "\n    "));
                    }
                }
            }
        }

        Commands::Check => {
            let mut pending = Vec::new();
            for table in tables {
                if synchronizer.needs_synchronization(table, dialect).await? {
                    pending.push(table.table_name());
                }
            }
            if !pending.is_empty() {
                println!("Tables needing synchronization: {}", pending.join(", "));
                return Ok(ExitCode::FAILURE);
            }
            info!("All tables are up to date.");
        }

        Commands::Sync { force, dry_run } => {
            if dry_run {
                info!("Dry run mode - differences will be printed but not fixed.");
            }
            let results = if force {
                let mut results = Vec::with_capacity(tables.len());
                for table in tables {
                    results.push(synchronizer.force_synchronize(table, dialect).await);
                }
                results
            } else {
                synchronizer.synchronize_all(tables, dialect).await
            };

            let mut failed = false;
            for (table, result) in tables.iter().zip(results) {
                match result {
                    Ok(differences) if differences.is_empty() => {
                        println!(" [ ] {}", table.table_name());
                    }
                    Ok(differences) => {
                        println!(" [X] {} ({} differences)", table.table_name(), differences.len());
                        for difference in &differences {
                            println!("     {}", difference);
                        }
                    }
                    Err(err) => {
                        error!(table = %table.table_name(), error = %err, "Synchronization failed");
                        failed = true;
                    }
                }
            }
            if failed {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Status => {
            let ledger = synchronizer.ledger(dialect);
            ledger.ensure_table().await?;
            let entries = ledger.entries().await?;

            println!("\nSchema versions:");
            println!("{:-<60}", "");
            for table in tables {
                let Some(entry) = entries.iter().find(|e| e.table_name == table.table_name()) else {
                    println!(
                        " [ ] {} v{} (never synchronized)",
                        table.table_name(),
                        table.schema_version()
                    );
                    continue;
                };
                let mark = if entry.schema_version >= table.schema_version() {
                    "X"
                } else {
                    " "
                };
                let synced_at = entry.synced_at.map_or_else(
                    || "unknown".to_string(),
                    |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
                );
                println!(
                    " [{}] {} v{} (recorded v{}, {})",
                    mark,
                    table.table_name(),
                    table.schema_version(),
                    entry.schema_version,
                    synced_at
                );
            }
            println!();
        }
    }

    Ok(ExitCode::SUCCESS)
}
