//! The top-level entry point: owns the pending model set and orchestrates one `migrate`/`drop`
//! call end to end.
//!
//! This replaces the versioned-migration-file runner this crate's structure is otherwise
//! grounded on: that mechanism exists to track which numbered migration has already run, which
//! has no place here since this engine keeps no history beyond the live schema itself. What
//! survives from it is the transaction-wrapping shape of its per-unit `migrate` loop.

use tokio_postgres::Client;

use crate::catalog::PostgresCatalog;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::meta_model::Model;
use crate::naming::{NameTransformer, SnakeCase};
use crate::planner::{Planner, PlannerConfig, PostgresPlanner};

/// Orchestrates reconciliation for a pending set of models against one Postgres connection.
pub struct MigrationDriver<N: NameTransformer = SnakeCase> {
    client: Client,
    naming: N,
    planner: PostgresPlanner,
    pending: Vec<Model>,
}

impl MigrationDriver<SnakeCase> {
    /// Build a driver with the default (acronym-aware snake_case) naming transformer.
    pub fn new(client: Client, config: PlannerConfig) -> Self {
        Self {
            client,
            naming: SnakeCase,
            planner: PostgresPlanner::new(config),
            pending: Vec::new(),
        }
    }

    /// Start building a driver whose transport, planner and naming are assembled piecemeal
    /// (e.g. from a config file) and validated together at `build()`.
    pub fn builder() -> MigrationDriverBuilder<SnakeCase> {
        MigrationDriverBuilder::default()
    }
}

impl<N: NameTransformer> MigrationDriver<N> {
    pub fn with_naming(client: Client, config: PlannerConfig, naming: N) -> Self {
        Self {
            client,
            naming,
            planner: PostgresPlanner::new(config),
            pending: Vec::new(),
        }
    }

    /// Register models for the next `migrate()` call, skipping any whose canonicalized name is
    /// already pending.
    pub fn register(&mut self, models: impl IntoIterator<Item = Model>) {
        for model in models {
            let canonical = self.naming.get(&model.name);
            let already_pending = self
                .pending
                .iter()
                .any(|m| self.naming.get(&m.name) == canonical);
            if !already_pending {
                self.pending.push(model);
            }
        }
    }

    /// Plan and execute the pending model set against the live catalog, without an enclosing
    /// transaction (every statement this planner emits is independently idempotent).
    pub async fn migrate(&mut self) -> Result<()> {
        let result = self.run_migrate().await;
        self.pending.clear();
        result
    }

    async fn run_migrate(&self) -> Result<()> {
        let catalog = PostgresCatalog::new(&self.client);
        let statements = self
            .planner
            .plan_migrate(&catalog, &self.naming, &self.pending)
            .await?;

        let executor = Executor::new(&self.client, self.planner.config.log);
        for sql in &statements {
            executor.execute(sql).await?;
        }

        Ok(())
    }

    /// Plan and execute the pending model set inside a single transaction, rolling back on any
    /// fatal error.
    pub async fn migrate_in_transaction(&mut self) -> Result<()> {
        let result = self.run_migrate_in_transaction().await;
        self.pending.clear();
        result
    }

    async fn run_migrate_in_transaction(&mut self) -> Result<()> {
        let catalog = PostgresCatalog::new(&self.client);
        let statements = self
            .planner
            .plan_migrate(&catalog, &self.naming, &self.pending)
            .await?;

        let tx = self.client.transaction().await?;
        let executor = Executor::new(&tx, self.planner.config.log);
        for sql in &statements {
            executor.execute(sql).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Drop each of the given models' tables with `DROP TABLE IF EXISTS`.
    ///
    /// Drop order and `CASCADE` for any dependent foreign keys are the caller's responsibility:
    /// this does not coordinate drop order across models.
    pub async fn drop(&mut self, models: impl IntoIterator<Item = Model>) -> Result<()> {
        let models: Vec<Model> = models.into_iter().collect();
        let statements = self.planner.plan_drop(&self.naming, &models);
        let executor = Executor::new(&self.client, self.planner.config.log);
        for sql in &statements {
            executor.execute(sql).await?;
        }
        Ok(())
    }
}

/// Assembles a [`MigrationDriver`] from optional parts, so a caller wiring the transport and
/// planner config up from, say, a config file can defer the "is everything here" check to one
/// place instead of unwrapping at every call site.
pub struct MigrationDriverBuilder<N: NameTransformer = SnakeCase> {
    client: Option<Client>,
    config: Option<PlannerConfig>,
    naming: Option<N>,
}

impl<N: NameTransformer> Default for MigrationDriverBuilder<N> {
    fn default() -> Self {
        Self {
            client: None,
            config: None,
            naming: None,
        }
    }
}

impl<N: NameTransformer> MigrationDriverBuilder<N> {
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn planner_config(mut self, config: PlannerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn naming(mut self, naming: N) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Validate that a transport, planner config and naming transformer were all supplied.
    pub fn build(self) -> Result<MigrationDriver<N>> {
        let client = self
            .client
            .ok_or_else(|| Error::Setup("no database connection configured".to_string()))?;
        let config = self
            .config
            .ok_or_else(|| Error::Setup("no planner configuration supplied".to_string()))?;
        let naming = self
            .naming
            .ok_or_else(|| Error::Setup("no naming transformer supplied".to_string()))?;

        Ok(MigrationDriver {
            client,
            naming,
            planner: PostgresPlanner::new(config),
            pending: Vec::new(),
        })
    }
}
