//! Multi-location search orchestration.
//!
//! One logical request fans out as one backend call per resolved location.
//! Calls run concurrently (bounded by `max_concurrency`), each with its own
//! timeout and bounded fixed-backoff retries, so overall latency is the
//! maximum of the branch latencies, not their sum. Failed locations are
//! dropped and surfaced as diagnostics; only when every location fails does
//! the whole request fail. No state survives a call to `search()`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{stream, StreamExt};
use thiserror::Error;

use localnews::domain::ArticleRecord;

use crate::backend::{BackendCall, BackendError, HeadlinesCall, NewsBackend, SearchCall};
use crate::cluster::{cluster_articles, should_cluster, singleton_clusters};
use crate::config::Settings;
use crate::location::LocationToken;
use crate::query::{validate, SyntaxError};
use crate::types::{Article, Cluster, Diagnostics, HeadlinesRequest, SearchRequest};

/// Cooperative cancellation for one request. Cancelling stops new
/// per-location calls from being issued; in-flight calls run to completion
/// under their own timeout, so cancellation never blocks indefinitely.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    /// The query failed validation. Returned synchronously, never retried.
    #[error("query is not executable: {0}")]
    Query(#[from] SyntaxError),
    /// Every per-location call exhausted its retries.
    #[error("upstream unavailable: all {attempted} location call(s) failed")]
    UpstreamUnavailable { attempted: usize },
}

/// Result of one orchestrated request: ranked clusters plus the diagnostics
/// that make any reduction visible to the caller.
#[derive(Debug)]
pub struct SearchOutcome {
    pub clusters: Vec<Cluster>,
    pub diagnostics: Diagnostics,
}

/// Fans a single request out across locations and merges the results.
pub struct SearchOrchestrator<B: NewsBackend> {
    backend: B,
    settings: Settings,
}

impl<B: NewsBackend> SearchOrchestrator<B> {
    pub fn new(backend: B, settings: Settings) -> Self {
        Self { backend, settings }
    }

    pub fn with_defaults(backend: B) -> Self {
        Self::new(backend, Settings::default())
    }

    /// Executes a boolean-query search across the request's locations.
    ///
    /// Advisory warnings (e.g. ambiguous precedence) do not block execution;
    /// callers wanting them should run [`validate`] themselves.
    pub async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancelFlag,
    ) -> Result<SearchOutcome, SearchError> {
        let validation = validate(request.query());
        if let Some(error) = validation.errors.into_iter().next() {
            return Err(error.into());
        }
        for warning in &validation.warnings {
            tracing::debug!("query advisory: {:?}", warning);
        }

        let per_call_size = split_page_size(request.page_size(), request.locations().len());
        let calls: Vec<BackendCall> = if request.locations().is_empty() {
            vec![BackendCall::Search(SearchCall {
                query: request.query().to_string(),
                location: None,
                theme: request.theme(),
                from: request.date_from().cloned(),
                page_size: request.page_size(),
            })]
        } else {
            request
                .locations()
                .iter()
                .map(|location| {
                    BackendCall::Search(SearchCall {
                        query: request.query().to_string(),
                        location: Some(location.clone()),
                        theme: request.theme(),
                        from: request.date_from().cloned(),
                        page_size: per_call_size,
                    })
                })
                .collect()
        };

        let (articles, diagnostics) = self.fan_out(calls, cancel).await?;

        let collapse = request
            .clustering()
            .unwrap_or_else(|| should_cluster(request.query(), request.page_size()));
        let clusters = if collapse {
            cluster_articles(articles, &self.settings.cluster)
        } else {
            singleton_clusters(articles)
        };

        Ok(SearchOutcome {
            clusters,
            diagnostics,
        })
    }

    /// Latest headlines for a set of locations, same fan-out and
    /// partial-failure semantics as [`Self::search`].
    pub async fn latest_headlines(
        &self,
        request: &HeadlinesRequest,
        cancel: &CancelFlag,
    ) -> Result<SearchOutcome, SearchError> {
        let per_call_size = split_page_size(request.page_size(), request.locations().len());
        let calls: Vec<BackendCall> = if request.locations().is_empty() {
            vec![BackendCall::Headlines(HeadlinesCall {
                location: None,
                when: request.when().clone(),
                theme: request.theme(),
                page_size: request.page_size(),
            })]
        } else {
            request
                .locations()
                .iter()
                .map(|location| {
                    BackendCall::Headlines(HeadlinesCall {
                        location: Some(location.clone()),
                        when: request.when().clone(),
                        theme: request.theme(),
                        page_size: per_call_size,
                    })
                })
                .collect()
        };

        let (articles, diagnostics) = self.fan_out(calls, cancel).await?;

        // Headline feeds are duplicate-heavy across neighboring locations.
        let clusters = cluster_articles(articles, &self.settings.cluster);

        Ok(SearchOutcome {
            clusters,
            diagnostics,
        })
    }

    /// Issues all calls with bounded concurrency and merges their results,
    /// tolerating partial failure.
    async fn fan_out(
        &self,
        calls: Vec<BackendCall>,
        cancel: &CancelFlag,
    ) -> Result<(Vec<Article>, Diagnostics), SearchError> {
        let attempted = calls.len();

        let outcomes: Vec<CallOutcome> = stream::iter(calls)
            .map(|call| self.execute_call(call, cancel))
            .buffer_unordered(self.settings.orchestrator.max_concurrency)
            .collect()
            .await;

        let mut failed_locations = Vec::new();
        let mut succeeded = 0usize;
        let mut articles: Vec<Article> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();

        for outcome in outcomes {
            match outcome.records {
                Some(records) => {
                    succeeded += 1;
                    merge_records(&mut articles, &mut by_id, records, outcome.location);
                }
                None => {
                    if let Some(location) = outcome.location {
                        failed_locations.push(location);
                    }
                }
            }
        }

        if succeeded == 0 {
            tracing::error!("all {attempted} backend call(s) failed");
            return Err(SearchError::UpstreamUnavailable { attempted });
        }

        let degraded = !failed_locations.is_empty();
        Ok((
            articles,
            Diagnostics {
                failed_locations,
                degraded,
            },
        ))
    }

    /// One per-location call with timeout and bounded fixed-backoff retries.
    /// Returns `records: None` when the location's contribution is dropped.
    async fn execute_call(&self, call: BackendCall, cancel: &CancelFlag) -> CallOutcome {
        let location = call.location().cloned();
        let location_label = location
            .as_ref()
            .map(|l| l.as_str().to_string())
            .unwrap_or_else(|| "<any>".to_string());

        if cancel.is_cancelled() {
            tracing::debug!("request cancelled, skipping call for {location_label}");
            return CallOutcome {
                location,
                records: None,
            };
        }

        let max_attempts = self.settings.orchestrator.max_retries + 1;
        let timeout = self.settings.orchestrator.call_timeout();

        for attempt in 1..=max_attempts {
            let result = tokio::time::timeout(timeout, self.dispatch(&call)).await;

            let error = match result {
                Ok(Ok(records)) => {
                    return CallOutcome {
                        location,
                        records: Some(records),
                    }
                }
                Ok(Err(err)) => {
                    if !err.is_transient() {
                        tracing::error!("call for {location_label} failed permanently: {err}");
                        break;
                    }
                    err.to_string()
                }
                Err(_) => "call timed out".to_string(),
            };

            if attempt == max_attempts {
                tracing::error!(
                    "dropping {location_label} after {max_attempts} attempt(s): {error}"
                );
                break;
            }
            if cancel.is_cancelled() {
                tracing::debug!("request cancelled, abandoning retries for {location_label}");
                break;
            }

            tracing::warn!(
                "retrying call for {location_label} (attempt {}/{max_attempts}): {error}",
                attempt + 1,
            );
            tokio::time::sleep(self.settings.orchestrator.retry_backoff()).await;
        }

        CallOutcome {
            location,
            records: None,
        }
    }

    async fn dispatch(&self, call: &BackendCall) -> Result<Vec<ArticleRecord>, BackendError> {
        match call {
            BackendCall::Search(call) => self.backend.search(call).await,
            BackendCall::Headlines(call) => self.backend.latest_headlines(call).await,
        }
    }
}

struct CallOutcome {
    location: Option<LocationToken>,
    records: Option<Vec<ArticleRecord>>,
}

/// Splits the requested page size across N location calls (`ceil(size / N)`,
/// at least 1) so total volume stays proportionate to what was asked for.
fn split_page_size(page_size: u32, locations: usize) -> u32 {
    if locations <= 1 {
        return page_size;
    }
    page_size.div_ceil(locations as u32).max(1)
}

/// Merges one call's records into the running article list. A record already
/// seen under another location call gains an extra origin tag instead of a
/// duplicate entry.
fn merge_records(
    articles: &mut Vec<Article>,
    by_id: &mut HashMap<String, usize>,
    records: Vec<ArticleRecord>,
    origin: Option<LocationToken>,
) {
    for record in records {
        if let Some(&idx) = by_id.get(&record.id) {
            if let Some(origin) = origin.clone() {
                if !articles[idx].origins.contains(&origin) {
                    articles[idx].origins.push(origin);
                }
            }
            continue;
        }

        let detected_locations = record
            .location_mentions
            .iter()
            .filter_map(|mention| {
                LocationToken::parse(&mention.location)
                    .ok()
                    .map(|token| (token, mention.detection_method))
            })
            .collect();

        by_id.insert(record.id.clone(), articles.len());
        articles.push(Article {
            raw: record,
            detected_locations,
            origins: origin.clone().into_iter().collect(),
        });
    }
}
