//! Graph-backed recommendation engine.
//!
//! Maintains a property graph of users, items, tags and interaction edges
//! (ratings, likes, comments, additions, requests) and derives ranked
//! recommendations by traversing shared-tag neighborhoods. Persistence is
//! delegated to a Neo4j-compatible store behind the [`db::GraphStore`]
//! trait; transports and the catalog/document store are external
//! collaborators injected at construction.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use db::{GraphStore, MemoryStore, MergeOutcome, Neo4jStore};
pub use error::{AppError, AppResult};
pub use services::{CatalogProvider, CatalogSync, InteractionRecorder, Recommender};

/// Installs a global tracing subscriber honoring `RUST_LOG`.
///
/// Intended for the process bootstrap; calling it twice panics, so tests
/// and embedding applications that configure their own subscriber should
/// skip it.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
