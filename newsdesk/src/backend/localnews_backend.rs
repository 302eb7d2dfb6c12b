//! [`NewsBackend`] implementation backed by the Local News API client.

use async_trait::async_trait;

use localnews::domain::ArticleRecord;
use localnews::{LatestHeadlinesPayload, LocalNewsClient, SearchPayload};

use super::{BackendError, HeadlinesCall, NewsBackend, SearchCall};

#[async_trait]
impl NewsBackend for LocalNewsClient {
    async fn search(&self, call: &SearchCall) -> Result<Vec<ArticleRecord>, BackendError> {
        let payload = SearchPayload {
            q: call.query.clone(),
            locations: call.location.as_ref().map(|l| vec![l.as_str().to_string()]),
            theme: call.theme.map(|t| t.to_string()),
            from: call.from.as_ref().map(|d| d.as_str().to_string()),
            page_size: call.page_size,
        };

        let response = LocalNewsClient::search(self, &payload).await?;
        Ok(response.articles)
    }

    async fn latest_headlines(
        &self,
        call: &HeadlinesCall,
    ) -> Result<Vec<ArticleRecord>, BackendError> {
        let payload = LatestHeadlinesPayload {
            locations: call.location.as_ref().map(|l| vec![l.as_str().to_string()]),
            when: call.when.as_str().to_string(),
            theme: call.theme.map(|t| t.to_string()),
            page_size: call.page_size,
        };

        let response = LocalNewsClient::latest_headlines(self, &payload).await?;
        Ok(response.articles)
    }
}
