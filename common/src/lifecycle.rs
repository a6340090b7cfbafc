// Startup lifecycle: connect → migrate → ready, or degraded
//
// UNSTARTED → CONNECTING → MIGRATING → READY
//                 │            │
//                 └────────────┴──→ DEGRADED
//
// READY and DEGRADED are terminal. There is no retry loop: a process that
// comes up degraded stays degraded until it is restarted.

use crate::catalog::{CatalogStore, PgCatalogStore, Persistence};
use crate::config::{ConnectionSettings, DatabaseConfig};
use crate::db::{self, DbPool, MigrationReport, MigrationSet};
use crate::errors::{DatabaseError, LifecycleError};
use crate::telemetry;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleState {
    Unstarted,
    Connecting,
    Migrating,
    Ready,
    Degraded { reason: String },
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Unstarted => "unstarted",
            LifecycleState::Connecting => "connecting",
            LifecycleState::Migrating => "migrating",
            LifecycleState::Ready => "ready",
            LifecycleState::Degraded { .. } => "degraded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Ready | LifecycleState::Degraded { .. })
    }

    pub fn can_transition_to(&self, next: &LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Unstarted, Connecting)
                | (Connecting, Migrating)
                | (Connecting, Degraded { .. })
                | (Migrating, Ready)
                | (Migrating, Degraded { .. })
        )
    }
}

/// The two fallible startup steps, abstracted so the state machine can be
/// driven without a database
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StartupSteps: Send + Sync {
    /// One connection check-out/check-in
    async fn verify(&self) -> Result<(), DatabaseError>;

    async fn migrate(&self) -> Result<MigrationReport, DatabaseError>;

    /// Store handed to the catalog once startup reaches READY
    fn store(&self) -> Arc<dyn CatalogStore>;
}

/// Production startup steps against PostgreSQL
pub struct PgStartup {
    pool: DbPool,
    migrations: MigrationSet,
}

impl PgStartup {
    pub fn new(pool: DbPool, migrations: MigrationSet) -> Self {
        Self { pool, migrations }
    }
}

#[async_trait]
impl StartupSteps for PgStartup {
    async fn verify(&self) -> Result<(), DatabaseError> {
        self.pool.verify().await
    }

    async fn migrate(&self) -> Result<MigrationReport, DatabaseError> {
        db::migrate(&self.pool, &self.migrations).await
    }

    fn store(&self) -> Arc<dyn CatalogStore> {
        Arc::new(PgCatalogStore::new(self.pool.clone()))
    }
}

/// Result of a PostgreSQL-backed startup
#[derive(Debug)]
pub struct Startup {
    pub persistence: Persistence,
    /// Kept even when degraded so shutdown can close it
    pub pool: Option<DbPool>,
}

impl Startup {
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// Drives the one-shot startup state machine and publishes its state
#[derive(Debug)]
pub struct LifecycleCoordinator {
    state: watch::Sender<LifecycleState>,
}

impl Default for LifecycleCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleCoordinator {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::Unstarted);
        Self { state }
    }

    pub fn state(&self) -> LifecycleState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published state
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn transition(&self, next: LifecycleState) -> Result<(), LifecycleError> {
        let mut rejected_from = None;
        self.state.send_if_modified(|current| {
            if current.can_transition_to(&next) {
                *current = next.clone();
                true
            } else {
                rejected_from = Some(current.name());
                false
            }
        });

        if let Some(from) = rejected_from {
            tracing::warn!(from, to = next.name(), "Rejected lifecycle transition");
            return Err(LifecycleError::IllegalTransition {
                from,
                to: next.name(),
            });
        }

        telemetry::record_lifecycle_transition(next.name(), next == LifecycleState::Ready);
        info!(state = next.name(), "Lifecycle state changed");
        Ok(())
    }

    fn degrade(&self, err: DatabaseError) -> Result<Persistence, LifecycleError> {
        tracing::error!(
            error = %err,
            during = self.state().name(),
            "Database initialization failed, continuing without persistence"
        );
        let reason = err.to_string();
        self.transition(LifecycleState::Degraded {
            reason: reason.clone(),
        })?;
        Ok(Persistence::degraded(reason))
    }

    /// Run connect → migrate once
    ///
    /// Connection and migration failures are absorbed into the DEGRADED
    /// state. Only a second call (or any other illegal transition) errors.
    #[instrument(skip(self, steps))]
    pub async fn start(&self, steps: &dyn StartupSteps) -> Result<Persistence, LifecycleError> {
        self.transition(LifecycleState::Connecting)?;
        info!("Connecting to database");
        if let Err(err) = steps.verify().await {
            return self.degrade(err);
        }
        info!("Database connection established");

        self.transition(LifecycleState::Migrating)?;
        match steps.migrate().await {
            Ok(report) => {
                info!(
                    applied = report.applied.len(),
                    current_version = ?report.current_version,
                    "Database ready"
                );
                self.transition(LifecycleState::Ready)?;
                Ok(Persistence::Ready(steps.store()))
            }
            Err(err) => self.degrade(err),
        }
    }

    /// Open the pool from resolved settings and run [`start`](Self::start)
    #[instrument(skip_all, fields(db = %connection))]
    pub async fn start_postgres(
        &self,
        connection: &ConnectionSettings,
        config: &DatabaseConfig,
    ) -> Result<Startup, LifecycleError> {
        match DbPool::open(connection, config) {
            Ok(pool) => {
                let steps = PgStartup::new(pool.clone(), MigrationSet::from_config(config));
                let persistence = self.start(&steps).await?;
                Ok(Startup {
                    persistence,
                    pool: Some(pool),
                })
            }
            Err(err) => {
                self.transition(LifecycleState::Connecting)?;
                let persistence = self.degrade(err)?;
                Ok(Startup {
                    persistence,
                    pool: None,
                })
            }
        }
    }
}
