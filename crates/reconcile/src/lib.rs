#![allow(clippy::result_large_err)]

//! Declarative schema reconciliation for Postgres, powered by facet reflection.
//!
//! This crate provides:
//! - A compact tag language for declaring a table's shape on its Rust struct fields
//! - Schema introspection via facet reflection (no `syn`, no codegen)
//! - A planner that diffs the declared shape against the live catalog and emits DDL
//!
//! # Naming convention
//!
//! Table and column names are derived from Rust identifiers via [`naming::SnakeCase`]: acronym
//! boundaries are detected (`APISnakeNAME` becomes `api_snake_name`), not just "insert `_` before
//! every uppercase letter".
//!
//! # Declaring a model
//!
//! ```ignore
//! #[derive(facet::Facet)]
//! struct User {
//!     #[facet(reconcile::tag = "type:bigint;id")]
//!     id: i64,
//!     #[facet(reconcile::tag = "type:text;notnull;unique")]
//!     email: String,
//! }
//! ```
//!
//! Implement [`Described`] once per model to turn that reflection into a [`Model`]:
//!
//! ```ignore
//! impl Described for User {
//!     fn describe() -> Model {
//!         meta_model::build_model::<User>().expect("User tags are well-formed")
//!     }
//! }
//! ```
//!
//! # Running a migration
//!
//! ```ignore
//! let mut driver = MigrationDriver::new(client, PlannerConfig::default());
//! driver.register([User::describe()]);
//! driver.migrate().await?;
//! ```

pub mod catalog;
mod driver;
mod error;
mod executor;
pub mod meta_model;
pub mod naming;
pub mod planner;
pub mod tag;

pub use catalog::{Catalog, PostgresCatalog};
pub use driver::{MigrationDriver, MigrationDriverBuilder};
pub use error::{Error, Result};
pub use executor::{Executor, Runner};
pub use meta_model::{build_model, Attribute, Described, FkRef, Model, SeqSpec};
pub use naming::{NameTransformer, SnakeCase};
pub use planner::{Planner, PlannerConfig, PostgresPlanner};
pub use tag::{RawAttribute, TagParser};

/// Quote a PostgreSQL identifier, doubling any embedded quotes.
///
/// Always quotes identifiers to avoid issues with reserved keywords like `user`, `order`,
/// `table`, `group`, etc.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
