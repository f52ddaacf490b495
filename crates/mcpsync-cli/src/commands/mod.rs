//! Command implementations for mcpsync

pub mod health;
pub mod repair;
pub mod sync;
pub mod validate;

pub use health::run_health;
pub use repair::run_repair;
pub use sync::{run_pull, run_push};
pub use validate::run_validate;
