use std::env;

const DEFAULT_BASE_URL: &str = "https://local-news.newscatcherapi.com";

#[derive(Debug, Clone)]
pub struct NewsUrl(String);

impl AsRef<str> for NewsUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl NewsUrl {
    /// Creates a new NewsUrl from the environment variable `LOCAL_NEWS_API_URL`,
    /// falling back to the hosted API when unset.
    pub fn from_env() -> Self {
        Self(env::var("LOCAL_NEWS_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()))
    }

    pub fn from_base(base: impl Into<String>) -> Self {
        Self(base.into())
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_path_normalizes_slashes() {
        let url = NewsUrl::from_base("https://example.com/");
        assert_eq!(
            url.append_path("/api/search").as_ref(),
            "https://example.com/api/search"
        );
    }
}
