//! Read-only introspection of the live database.
//!
//! Every query here targets `information_schema`/`pg_catalog` directly, the same way the
//! introspection this crate is grounded on builds a full schema snapshot — except the planner
//! needs point lookups (does this column exist? what's its type?) rather than one up-front
//! snapshot, since it reconciles one field at a time.

use tokio_postgres::Client;

use crate::error::{Error, Result};

/// Read-only façade over a live Postgres catalog.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool>;
    async fn column_exists(&self, schema: &str, table: &str, column: &str) -> Result<bool>;
    async fn sequence_exists(&self, name: &str) -> Result<bool>;
    async fn constraint_exists(&self, schema: &str, table: &str, name: &str) -> Result<bool>;
    async fn foreign_key_exists(&self, schema: &str, table: &str, name: &str) -> Result<bool>;
    async fn is_nullable(&self, schema: &str, table: &str, column: &str) -> Result<bool>;
    async fn column_type(&self, schema: &str, table: &str, column: &str) -> Result<Option<String>>;
    async fn column_names(&self, schema: &str, table: &str) -> Result<Vec<String>>;

    /// Find the single constraint on `table` whose name matches a SQL `LIKE` pattern. More than
    /// one match is an `Error::CatalogAmbiguous`; zero matches is `Ok(None)`.
    async fn match_constraint_name(
        &self,
        schema: &str,
        table: &str,
        pattern: &str,
    ) -> Result<Option<String>>;
}

/// The reference implementation, backed directly by a [`tokio_postgres::Client`].
pub struct PostgresCatalog<'a> {
    client: &'a Client,
}

impl<'a> PostgresCatalog<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl Catalog for PostgresCatalog<'_> {
    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.tables
                    WHERE table_schema = $1 AND table_name = $2 AND table_type = 'BASE TABLE'
                )",
                &[&schema, &table],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn column_exists(&self, schema: &str, table: &str, column: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.columns
                    WHERE table_schema = $1 AND table_name = $2 AND column_name = $3
                )",
                &[&schema, &table, &column],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn sequence_exists(&self, name: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (
                    SELECT 1 FROM pg_class WHERE relkind = 'S' AND relname = $1
                )",
                &[&name],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn constraint_exists(&self, schema: &str, table: &str, name: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.table_constraints
                    WHERE table_schema = $1 AND table_name = $2 AND constraint_name = $3
                )",
                &[&schema, &table, &name],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn foreign_key_exists(&self, schema: &str, table: &str, name: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.table_constraints
                    WHERE table_schema = $1 AND table_name = $2 AND constraint_name = $3
                      AND constraint_type = 'FOREIGN KEY'
                )",
                &[&schema, &table, &name],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn is_nullable(&self, schema: &str, table: &str, column: &str) -> Result<bool> {
        let row = self
            .client
            .query_opt(
                "SELECT is_nullable = 'YES' FROM information_schema.columns
                 WHERE table_schema = $1 AND table_name = $2 AND column_name = $3",
                &[&schema, &table, &column],
            )
            .await?;
        match row {
            Some(row) => Ok(row.get(0)),
            None => Err(Error::ModelShape {
                model: table.to_string(),
                reason: format!("column `{column}` does not exist"),
            }),
        }
    }

    async fn column_type(&self, schema: &str, table: &str, column: &str) -> Result<Option<String>> {
        let row = self
            .client
            .query_opt(
                "SELECT data_type FROM information_schema.columns
                 WHERE table_schema = $1 AND table_name = $2 AND column_name = $3",
                &[&schema, &table, &column],
            )
            .await?;
        Ok(row.map(|r| r.get(0)))
    }

    async fn column_names(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(
                "SELECT column_name FROM information_schema.columns
                 WHERE table_schema = $1 AND table_name = $2
                 ORDER BY ordinal_position",
                &[&schema, &table],
            )
            .await?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    async fn match_constraint_name(
        &self,
        schema: &str,
        table: &str,
        pattern: &str,
    ) -> Result<Option<String>> {
        let rows = self
            .client
            .query(
                "SELECT constraint_name FROM information_schema.table_constraints
                 WHERE table_schema = $1 AND table_name = $2 AND constraint_name LIKE $3",
                &[&schema, &table, &pattern],
            )
            .await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(Some(rows[0].get(0))),
            _ => Err(Error::CatalogAmbiguous {
                table: table.to_string(),
                pattern: pattern.to_string(),
                matches: rows.iter().map(|r| r.get(0)).collect(),
            }),
        }
    }
}
