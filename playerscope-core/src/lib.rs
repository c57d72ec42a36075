//! # playerscope-core
//!
//! Core library for playerscope - player analytics and value scoring for a
//! gaming platform back office.
//!
//! This library provides:
//! - Domain types for players, logins, game sessions, rounds and transactions
//! - Database storage layer with SQLite
//! - Game preference, spending habit and value score analyzers
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use playerscope_core::analytics::{ValueScoreAnalyzer, ValueScoreRequest};
//! use playerscope_core::{Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Database::open(&config.resolved_database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let analyzer = ValueScoreAnalyzer::new(Arc::new(db), config.analytics.clone());
//! let analysis = analyzer
//!     .analyze(42, &ValueScoreRequest::default())
//!     .expect("analysis failed");
//! println!("{} ({})", analysis.overall_score, analysis.value_category);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{Database, StoredAnalysis};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
