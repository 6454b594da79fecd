use thiserror::Error;

/// Everything that can go wrong while building a [`crate::meta_model::Model`] or running a
/// migration.
#[derive(Debug, Error)]
pub enum Error {
    /// The driver was asked to `migrate`/`drop` before a transport, planner and naming
    /// transformer were all configured.
    #[error("reconciliation driver is not fully configured: {0}")]
    Setup(String),

    /// A descriptor could not be turned into a [`crate::meta_model::Model`]: not a record type,
    /// a field has an unsupported shape, the tag string itself doesn't parse, or an attribute
    /// key isn't recognized.
    #[error("model `{model}` is invalid: {reason}")]
    ModelShape { model: String, reason: String },

    /// A recognized attribute's value didn't have the shape it requires (`seq:` needs five
    /// comma-separated fields, `fk:` needs `Model.Column`).
    #[error("field `{model}.{field}` has a malformed `{attribute}` value: {reason}")]
    TagSemantic {
        model: String,
        field: String,
        attribute: &'static str,
        reason: String,
    },

    /// A `LIKE` pattern used to locate an existing constraint matched more than one name.
    #[error("constraint name pattern `{pattern}` on {table} is ambiguous: matched {matches:?}")]
    CatalogAmbiguous {
        table: String,
        pattern: String,
        matches: Vec<String>,
    },

    /// Any failure surfaced by the underlying transport.
    #[error("postgres error: {0}")]
    Transport(#[from] tokio_postgres::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
