//! Dispatches planned DDL statements to the database and reports what happened.

use tracing::field::Empty;
use tracing::Instrument;

use crate::error::Result;

/// Anything that can run a bare, parameter-less statement: a plain client or a transaction
/// borrowed from one.
pub trait Runner {
    fn execute_dyn(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = std::result::Result<u64, tokio_postgres::Error>> + Send;
}

impl Runner for tokio_postgres::Client {
    async fn execute_dyn(&self, sql: &str) -> std::result::Result<u64, tokio_postgres::Error> {
        self.execute(sql, &[]).await
    }
}

impl Runner for tokio_postgres::Transaction<'_> {
    async fn execute_dyn(&self, sql: &str) -> std::result::Result<u64, tokio_postgres::Error> {
        self.execute(sql, &[]).await
    }
}

/// Executes DDL statements one at a time against a `tokio-postgres` client or transaction.
///
/// Each statement is wrapped in a `tracing` span carrying the rendered SQL and the rows it
/// affected, the same instrumentation shape the migration runner this crate is grounded on uses
/// around every statement it issues.
pub struct Executor<'a, R: Runner> {
    runner: &'a R,
    log: bool,
}

impl<'a, R: Runner> Executor<'a, R> {
    pub fn new(runner: &'a R, log: bool) -> Self {
        Self { runner, log }
    }

    /// Execute one DDL statement, recording its SQL and affected-row count on the active span.
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        if self.log {
            tracing::info!(sql, "executing statement");
        }

        let span = tracing::debug_span!("reconcile.execute", sql = %sql, affected = Empty);
        let affected = self
            .runner
            .execute_dyn(sql)
            .instrument(span.clone())
            .await?;
        span.record("affected", affected);
        Ok(affected)
    }
}
