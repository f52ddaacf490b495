//! Filesystem primitives for mcpsync
//!
//! Everything that touches disk goes through this crate: atomic whole-file
//! writes, timestamped backups, JSON document stores and content fingerprints.

pub mod backup;
pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod store;

pub use backup::backup_file;
pub use checksum::{compute_content_checksum, fingerprint};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use store::JsonStore;
