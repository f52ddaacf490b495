//! Error types for mcpsync-meta

pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Structural problems found while parsing a server definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("server '{server}' must be a JSON object")]
    NotAnObject { server: String },

    #[error("server '{server}' has a non-string type field")]
    TypeNotString { server: String },

    #[error("unknown server type: {found}")]
    UnknownType { found: String },

    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("{message}")]
    Invalid { message: String },
}
