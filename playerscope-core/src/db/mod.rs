//! Database layer for playerscope
//!
//! SQLite storage with:
//! - Schema migrations
//! - Record inserts and analysis history
//! - Windowed aggregate queries backing the analyzers

mod aggregates;
pub mod repo;
pub mod schema;

pub use repo::{Database, StoredAnalysis};
