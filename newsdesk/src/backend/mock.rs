//! Mock backend implementation for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use localnews::domain::ArticleRecord;

use super::{BackendError, HeadlinesCall, NewsBackend, SearchCall};

type ScriptedOutcome = Result<Vec<ArticleRecord>, BackendError>;

/// Mock backend with per-location scripted outcomes.
///
/// Each location key holds a queue of outcomes; every call pops the next one.
/// The final outcome is sticky, so a single `Err` means "always fails" while
/// `[Err, Err, Ok]` means "succeeds on the third attempt".
///
/// # Examples
///
/// ```
/// use newsdesk::backend::{BackendError, MockBackend};
///
/// let backend = MockBackend::new()
///     .with_outcome(Some("Austin, Texas"), Ok(vec![]))
///     .with_outcome(Some("Boston, Massachusetts"), Err(BackendError::Timeout));
/// ```
#[derive(Clone, Default)]
pub struct MockBackend {
    scripts: Arc<Mutex<HashMap<Option<String>, VecDeque<ScriptedOutcome>>>>,
    call_count: Arc<AtomicUsize>,
    page_sizes: Arc<Mutex<Vec<u32>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an outcome for calls scoped to `location` (`None` = unscoped).
    pub fn with_outcome(self, location: Option<&str>, outcome: ScriptedOutcome) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(location.map(str::to_string))
            .or_default()
            .push_back(outcome);
        self
    }

    /// Queues a successful response containing the given records.
    pub fn with_articles(self, location: Option<&str>, articles: Vec<ArticleRecord>) -> Self {
        self.with_outcome(location, Ok(articles))
    }

    /// Total number of backend calls issued, retries included.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Page sizes of every issued call, in call order.
    pub fn requested_page_sizes(&self) -> Vec<u32> {
        self.page_sizes.lock().unwrap().clone()
    }

    fn respond(&self, location: Option<&str>, page_size: u32) -> ScriptedOutcome {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.page_sizes.lock().unwrap().push(page_size);

        let mut scripts = self.scripts.lock().unwrap();
        let Some(queue) = scripts.get_mut(&location.map(str::to_string)) else {
            return Ok(vec![]);
        };

        if queue.len() > 1 {
            queue.pop_front().unwrap_or(Ok(vec![]))
        } else {
            queue.front().cloned().unwrap_or(Ok(vec![]))
        }
    }
}

#[async_trait]
impl NewsBackend for MockBackend {
    async fn search(&self, call: &SearchCall) -> Result<Vec<ArticleRecord>, BackendError> {
        self.respond(call.location.as_ref().map(|l| l.as_str()), call.page_size)
    }

    async fn latest_headlines(
        &self,
        call: &HeadlinesCall,
    ) -> Result<Vec<ArticleRecord>, BackendError> {
        self.respond(call.location.as_ref().map(|l| l.as_str()), call.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationToken;
    use crate::types::DateExpr;

    fn search_call(location: Option<&str>) -> SearchCall {
        SearchCall {
            query: "flooding".to_string(),
            location: location.map(|l| LocationToken::parse(l).unwrap()),
            theme: None,
            from: None,
            page_size: 5,
        }
    }

    #[tokio::test]
    async fn unscripted_locations_return_empty() {
        let backend = MockBackend::new();
        let articles = backend.search(&search_call(None)).await.unwrap();
        assert!(articles.is_empty());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn final_outcome_is_sticky() {
        let backend = MockBackend::new()
            .with_outcome(Some("Austin, Texas"), Err(BackendError::Timeout))
            .with_outcome(Some("Austin, Texas"), Ok(vec![]));

        let call = search_call(Some("Austin, Texas"));
        assert!(backend.search(&call).await.is_err());
        assert!(backend.search(&call).await.is_ok());
        // Sticky last outcome.
        assert!(backend.search(&call).await.is_ok());
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn headlines_share_the_same_scripts() {
        let backend =
            MockBackend::new().with_outcome(Some("Austin, Texas"), Err(BackendError::RateLimited));

        let call = HeadlinesCall {
            location: Some(LocationToken::parse("Austin, Texas").unwrap()),
            when: DateExpr::parse_period("7d").unwrap(),
            theme: None,
            page_size: 10,
        };
        assert_eq!(
            backend.latest_headlines(&call).await.unwrap_err(),
            BackendError::RateLimited
        );
        assert_eq!(backend.requested_page_sizes(), vec![10]);
    }
}
