//! Backend abstraction for the upstream news search service.
//!
//! The orchestrator only talks to [`NewsBackend`], so it can run against the
//! real [`localnews::LocalNewsClient`] in production and [`MockBackend`] in
//! tests.

mod localnews_backend;
mod mock;

use async_trait::async_trait;
use thiserror::Error;

use localnews::domain::ArticleRecord;

use crate::location::LocationToken;
use crate::types::{DateExpr, Theme};

pub use mock::MockBackend;

/// One backend call scoped to at most one location. The orchestrator issues
/// one of these per resolved location.
#[derive(Debug, Clone)]
pub struct SearchCall {
    pub query: String,
    pub location: Option<LocationToken>,
    pub theme: Option<Theme>,
    pub from: Option<DateExpr>,
    pub page_size: u32,
}

/// Latest-headlines variant of [`SearchCall`]: a `when` period instead of a
/// boolean query.
#[derive(Debug, Clone)]
pub struct HeadlinesCall {
    pub location: Option<LocationToken>,
    pub when: DateExpr,
    pub theme: Option<Theme>,
    pub page_size: u32,
}

/// Either backend operation; lets the orchestrator share one fan-out path.
#[derive(Debug, Clone)]
pub enum BackendCall {
    Search(SearchCall),
    Headlines(HeadlinesCall),
}

impl BackendCall {
    pub fn location(&self) -> Option<&LocationToken> {
        match self {
            BackendCall::Search(call) => call.location.as_ref(),
            BackendCall::Headlines(call) => call.location.as_ref(),
        }
    }
}

/// Failure categories surfaced by a backend, split so the orchestrator can
/// tell retryable conditions from permanent ones.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("request timed out")]
    Timeout,
    #[error("rate limited by upstream")]
    RateLimited,
    #[error("unauthorized")]
    Unauthorized,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    /// Whether a retry can plausibly succeed. Auth failures cannot.
    pub fn is_transient(&self) -> bool {
        !matches!(self, BackendError::Unauthorized)
    }
}

impl From<localnews::LocalNewsFetchError> for BackendError {
    fn from(e: localnews::LocalNewsFetchError) -> Self {
        use localnews::LocalNewsFetchError as Fetch;
        match e {
            Fetch::Timeout => BackendError::Timeout,
            Fetch::RateLimited => BackendError::RateLimited,
            Fetch::Unauthorized => BackendError::Unauthorized,
            Fetch::ResponseError(msg) => BackendError::Transport(msg),
            Fetch::ParsingError(msg) => BackendError::MalformedResponse(msg),
        }
    }
}

/// Upstream news search service.
#[async_trait]
pub trait NewsBackend: Send + Sync {
    async fn search(&self, call: &SearchCall) -> Result<Vec<ArticleRecord>, BackendError>;

    async fn latest_headlines(
        &self,
        call: &HeadlinesCall,
    ) -> Result<Vec<ArticleRecord>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_backend_object_safe(_: &dyn NewsBackend) {}

    #[test]
    fn transient_classification() {
        assert!(BackendError::Timeout.is_transient());
        assert!(BackendError::RateLimited.is_transient());
        assert!(BackendError::MalformedResponse("bad json".into()).is_transient());
        assert!(!BackendError::Unauthorized.is_transient());
    }

    #[test]
    fn fetch_errors_map_to_categories() {
        let err: BackendError = localnews::LocalNewsFetchError::RateLimited.into();
        assert_eq!(err, BackendError::RateLimited);

        let err: BackendError =
            localnews::LocalNewsFetchError::ParsingError("truncated".into()).into();
        assert_eq!(err, BackendError::MalformedResponse("truncated".into()));
    }
}
