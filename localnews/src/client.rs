use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::{domain::ArticleRecord, NewsUrl};

use super::Credentials;

/// Async client for the Local News API.
///
/// Both endpoints are JSON-over-POST and authenticate with an `x-api-token`
/// header. The client holds a single reqwest client; connection pooling is
/// managed there.
pub struct LocalNewsClient {
    credentials: Credentials,
    base_url: NewsUrl,
    http: reqwest::Client,
}

impl LocalNewsClient {
    /// Creates a client pointed at `LOCAL_NEWS_API_URL` (or the hosted API).
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials, NewsUrl::from_env())
    }

    pub(crate) fn with_base_url(credentials: Credentials, base_url: NewsUrl) -> Self {
        Self {
            credentials,
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Creates a client against an explicit base URL, e.g. a staging deployment.
    pub fn with_base(credentials: Credentials, base: impl Into<String>) -> Self {
        Self::with_base_url(credentials, NewsUrl::from_base(base))
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &impl Serialize,
    ) -> Result<T, LocalNewsFetchError> {
        let url = self.base_url.append_path(path);
        tracing::debug!("POST {}", url.as_ref());

        let resp = self
            .http
            .post(url.as_ref())
            .header("x-api-token", self.credentials.as_token_header())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LocalNewsFetchError::Timeout
                } else {
                    LocalNewsFetchError::ResponseError(e.to_string())
                }
            })?;

        let status = resp.status();
        if status == 401 || status == 403 {
            return Err(LocalNewsFetchError::Unauthorized);
        }
        if status == 429 {
            return Err(LocalNewsFetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(LocalNewsFetchError::ResponseError(format!(
                "unexpected status {status}"
            )));
        }

        let resp_data = resp.json::<T>().await.map_err(|e| {
            LocalNewsFetchError::ParsingError(format!("Failed to parse response as JSON: {}", e))
        })?;

        Ok(resp_data)
    }

    /// `POST /api/search`: boolean-query search, optionally scoped to one or
    /// more locations.
    pub async fn search(
        &self,
        payload: &SearchPayload,
    ) -> Result<SearchResponse, LocalNewsFetchError> {
        self.post("/api/search", payload).await
    }

    /// `POST /api/latest_headlines`: recent headlines for a time period,
    /// optionally scoped to one or more locations.
    pub async fn latest_headlines(
        &self,
        payload: &LatestHeadlinesPayload,
    ) -> Result<SearchResponse, LocalNewsFetchError> {
        self.post("/api/latest_headlines", payload).await
    }
}

#[derive(Error, Debug)]
pub enum LocalNewsFetchError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Rate limited")]
    RateLimited,
    #[error("Request timed out")]
    Timeout,
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("ParsingError: {0}")]
    ParsingError(String),
}

/// Request body for `/api/search`.
///
/// The upstream uses `from_` (trailing underscore) as the start-date key.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPayload {
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(rename = "from_", skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub page_size: u32,
}

/// Request body for `/api/latest_headlines`.
#[derive(Debug, Clone, Serialize)]
pub struct LatestHeadlinesPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
    pub when: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub page_size: u32,
}

/// Response envelope shared by both endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub articles: Vec<ArticleRecord>,
    #[serde(default)]
    pub total_hits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_payload_uses_upstream_keys() {
        let payload = SearchPayload {
            q: "wildfire".to_string(),
            locations: Some(vec!["Sacramento, California".to_string()]),
            theme: None,
            from: Some("7 days ago".to_string()),
            page_size: 10,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["from_"], "7 days ago");
        assert!(value.get("theme").is_none());
        assert_eq!(value["page_size"], 10);
    }

    #[test]
    fn response_envelope_defaults_to_empty() {
        let resp: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.articles.is_empty());
        assert_eq!(resp.total_hits, 0);
    }
}
