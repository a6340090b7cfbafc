// Schema migrations
//
// Migrations are `<version>_<name>.sql` files under the workspace `migrations/`
// directory. Each one runs in its own transaction and is recorded in
// `_sqlx_migrations` only after it commits.

use crate::config::DatabaseConfig;
use crate::db::DbPool;
use crate::errors::DatabaseError;
use sqlx::migrate::{MigrateError, Migrator};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Migrations embedded at compile time
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Where the ordered migration set comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationSet {
    Embedded,
    Directory(PathBuf),
}

impl MigrationSet {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        match &config.migrations_dir {
            Some(dir) => MigrationSet::Directory(dir.clone()),
            None => MigrationSet::Embedded,
        }
    }
}

/// Outcome of a successful [`migrate`] run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Versions applied by this run, ascending
    pub applied: Vec<i64>,
    /// Highest applied version after the run
    pub current_version: Option<i64>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Apply every pending migration in ascending version order
///
/// Already-applied versions are skipped, so re-running against an up-to-date
/// schema changes nothing. The first failing step stops the run.
///
/// # Errors
/// Returns `DatabaseError::MigrationFailed` naming the failing version when
/// one can be attributed
#[instrument(skip(pool))]
pub async fn migrate(pool: &DbPool, set: &MigrationSet) -> Result<MigrationReport, DatabaseError> {
    match set {
        MigrationSet::Embedded => run(pool, &MIGRATOR).await,
        MigrationSet::Directory(dir) => {
            let migrator = Migrator::new(dir.as_path()).await.map_err(classify)?;
            run(pool, &migrator).await
        }
    }
}

async fn run(pool: &DbPool, migrator: &Migrator) -> Result<MigrationReport, DatabaseError> {
    let already = applied_versions(pool).await.map_err(|e| DatabaseError::MigrationFailed {
        step: None,
        cause: format!("could not read applied versions: {}", e),
    })?;

    let pending: Vec<i64> = migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| m.version)
        .filter(|v| !already.contains(v))
        .collect();

    if pending.is_empty() {
        info!(applied = already.len(), "Schema is up to date");
    } else {
        info!(pending = ?pending, "Applying pending migrations");
    }

    migrator.run(pool.pool()).await.map_err(|e| {
        let err = classify(e);
        tracing::error!(error = %err, "Migration run aborted");
        err
    })?;

    let current_version = current_version(pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed {
            step: None,
            cause: format!("could not read schema version: {}", e),
        })?;

    info!(
        applied = pending.len(),
        current_version = ?current_version,
        "Database migrations completed"
    );

    Ok(MigrationReport {
        applied: pending,
        current_version,
    })
}

/// Versions recorded as successfully applied, ascending. Empty on a fresh database.
pub async fn applied_versions(pool: &DbPool) -> Result<Vec<i64>, DatabaseError> {
    if !tracking_table_exists(pool).await? {
        return Ok(Vec::new());
    }

    let versions = sqlx::query_scalar::<_, i64>(
        "SELECT version FROM _sqlx_migrations WHERE success ORDER BY version",
    )
    .fetch_all(pool.pool())
    .await?;

    Ok(versions)
}

/// The schema version marker: highest successfully applied version
pub async fn current_version(pool: &DbPool) -> Result<Option<i64>, DatabaseError> {
    if !tracking_table_exists(pool).await? {
        return Ok(None);
    }

    let version = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(version) FROM _sqlx_migrations WHERE success",
    )
    .fetch_one(pool.pool())
    .await?;

    Ok(version)
}

async fn tracking_table_exists(pool: &DbPool) -> Result<bool, DatabaseError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT to_regclass('_sqlx_migrations') IS NOT NULL",
    )
    .fetch_one(pool.pool())
    .await?;

    Ok(exists)
}

fn classify(err: MigrateError) -> DatabaseError {
    let (step, cause) = match err {
        MigrateError::ExecuteMigration(source, version) => (Some(version), source.to_string()),
        MigrateError::VersionMismatch(version) => (
            Some(version),
            "applied migration was modified after it ran".to_string(),
        ),
        MigrateError::VersionMissing(version) => (
            Some(version),
            "applied migration is missing from the migration source".to_string(),
        ),
        MigrateError::Dirty(version) => (
            Some(version),
            "migration was left partially applied by an earlier run".to_string(),
        ),
        other => (None, other.to_string()),
    };

    DatabaseError::MigrationFailed { step, cause }
}
