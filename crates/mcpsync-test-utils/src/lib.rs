//! Shared test utilities for the mcpsync workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not
//! each hand-roll their store files. It is a dev-dependency only.
//!
//! # Modules
//!
//! - [`fixtures`]: sample server configurations
//! - [`stores`]: [`TestStores`] with canonical, target and secrets files

pub mod fixtures;
pub mod stores;

pub use stores::TestStores;
