//! Newsdesk - query enhancement and multi-location news search orchestration.
//!
//! This crate turns an imprecise, natural-language news request into a small
//! set of well-formed boolean queries, fans them out across candidate
//! locations against the Local News backend, and merges the returned articles
//! into a deduplicated, confidence-ranked cluster list.
//!
//! # Architecture
//!
//! - [`query::validate`] - boolean mini-language parser/validator
//! - [`query::enhance`] - deterministic topic-to-query template expansion
//! - [`location::resolve`] - "City, AdminUnit" / "AdminUnit" normalization
//! - [`SearchOrchestrator`] - per-location fan-out with bounded concurrency,
//!   retries and partial-failure diagnostics
//! - [`cluster::cluster_articles`] - near-duplicate story clustering
//!
//! The upstream backend is reached through the [`NewsBackend`] trait, so the
//! orchestrator can be exercised against [`backend::MockBackend`] in tests and
//! against [`localnews::LocalNewsClient`] in production.
//!
//! # Example
//!
//! ```ignore
//! use newsdesk::{query, SearchOrchestrator, SearchRequest, Settings};
//!
//! let enhanced = query::enhance("tech layoffs in the bay area", None);
//! let request = SearchRequest::new(enhanced.query, enhanced.suggested_locations)
//!     .with_theme(enhanced.suggested_theme)
//!     .with_page_size(20)?;
//!
//! let orchestrator = SearchOrchestrator::new(backend, Settings::default());
//! let outcome = orchestrator.search(&request, &cancel).await?;
//! for cluster in outcome.clusters {
//!     println!("{} ({} sources)", cluster.representative.title(), cluster.members.len());
//! }
//! ```

pub mod backend;
pub mod cluster;
pub mod config;
pub mod location;
pub mod query;

mod orchestrator;
mod types;

pub use backend::{BackendError, NewsBackend};
pub use config::Settings;
pub use localnews::domain::DetectionMethod;
pub use location::{
    resolve as resolve_locations, InvalidLocationFormat, LocationToken, ResolvedLocations,
};
pub use orchestrator::{CancelFlag, SearchError, SearchOrchestrator, SearchOutcome};
pub use query::{enhance as enhance_query, validate as validate_query, DomainContext};
pub use types::{
    Article, Cluster, DateExpr, Diagnostics, EnhancedRequest, HeadlinesRequest, InvalidDateExpr,
    RequestError, SearchRequest, Theme,
};
