//! Comics Catalog Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod config;
pub mod credits;
pub mod embeddings;
pub mod recommend;
pub mod server;
pub mod sqlite_persistence;
pub mod startup;

// Re-export commonly used types for convenience
pub use catalog::{Dataset, Issue, IssueCatalog, IssueStore};
pub use recommend::{RecommendationEngine, RecommendationError, Recommendations};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use startup::LoadedCatalog;
