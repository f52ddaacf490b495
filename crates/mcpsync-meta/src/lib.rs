//! Server configuration schema for mcpsync
//!
//! This crate owns the vocabulary shared by validation, repair and sync:
//!
//! - [`schema`]: typed server definitions and the structural parser
//! - [`secrets`]: the placeholder predicate and secret-name heuristics
//! - [`servers`]: the top-level server map and its legacy alias

pub mod error;
pub mod schema;
pub mod secrets;
pub mod servers;

pub use error::{SchemaError, SchemaResult};
pub use schema::{EnvValue, McpServer, McpTransportConfig, ServerType, parse_server_config};
pub use secrets::{is_placeholder, is_secret_like, looks_like_credential, placeholder_for};
pub use servers::{LEGACY_SERVERS_KEY, SERVERS_KEY, ServerMap, normalize_servers_key, servers_of};
