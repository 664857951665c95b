// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Database Update Command
//!
//! `thinkorbit update` applies pending event store migrations.
//!
//! ```bash
//! # Apply all pending migrations
//! thinkorbit update
//!
//! # List pending migrations without applying them
//! thinkorbit update --dry-run
//! ```
//!
//! The connection string comes from `spec.database.url` or
//! `THINKORBIT_DATABASE_URL`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashSet;
use std::path::PathBuf;

use thinkorbit_core::domain::orbit_config::OrbitConfigManifest;
use thinkorbit_core::infrastructure::db::MIGRATOR;

/// Postgres `undefined_table`
const UNDEFINED_TABLE: &str = "42P01";

#[derive(Args)]
pub struct UpdateCommand {
    /// Perform a dry run without applying changes
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(cmd: UpdateCommand, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "ThinkOrbit Update".bold().green());

    let config = OrbitConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    let database_url = config.spec.database.url.context(
        "No database configured. Set spec.database.url or THINKORBIT_DATABASE_URL to run updates.",
    )?;

    println!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let applied = applied_versions(
        sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations")
            .fetch_all(&pool)
            .await,
    )?;

    let pending: Vec<_> = MIGRATOR
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect();

    println!(
        "Migration status: {} applied, {} total available.",
        applied.len(),
        MIGRATOR.iter().count()
    );

    if pending.is_empty() {
        println!("{}", "✓ Database is up to date.".green());
        return Ok(());
    }

    if cmd.dry_run {
        println!("Pending migrations found (Dry Run):");
        for migration in &pending {
            println!(" - {} {}", migration.version, migration.description);
        }
        println!("Skipping application due to --dry-run");
        return Ok(());
    }

    println!("Applying pending migrations...");
    MIGRATOR.run(&pool).await.context("Failed to apply migrations")?;
    println!("{}", "✓ Database updated successfully.".green());

    Ok(())
}

/// Versions recorded in the migrations table. The table is missing until the
/// first migration runs, which counts as nothing applied.
fn applied_versions(result: Result<Vec<i64>, sqlx::Error>) -> Result<HashSet<i64>> {
    match result {
        Ok(versions) => Ok(versions.into_iter().collect()),
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNDEFINED_TABLE) => Ok(HashSet::new()),
        Err(e) => Err(e).context("Failed to read applied migrations"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;

    #[derive(Debug)]
    struct PgError(&'static str);

    impl std::fmt::Display for PgError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "database error {}", self.0)
        }
    }

    impl StdError for PgError {}

    impl DatabaseError for PgError {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[test]
    fn test_applied_versions_from_rows() {
        let applied = applied_versions(Ok(vec![20240101000000, 20240201000000])).unwrap();
        assert_eq!(applied.len(), 2);
        assert!(applied.contains(&20240201000000));
    }

    #[test]
    fn test_missing_migrations_table_means_none_applied() {
        let missing = sqlx::Error::Database(Box::new(PgError(UNDEFINED_TABLE)));
        assert!(applied_versions(Err(missing)).unwrap().is_empty());
    }

    #[test]
    fn test_other_database_errors_propagate() {
        // insufficient_privilege
        let denied = sqlx::Error::Database(Box::new(PgError("42501")));
        let err = applied_versions(Err(denied)).unwrap_err();
        assert!(err.to_string().contains("Failed to read applied migrations"));

        assert!(applied_versions(Err(sqlx::Error::PoolTimedOut)).is_err());
    }
}
