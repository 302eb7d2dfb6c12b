use std::env;

use thiserror::Error;

/// API credentials for the Local News API.
///
/// The upstream authenticates every call with an `x-api-token` header.
#[derive(Debug, Clone)]
pub struct Credentials {
    api_token: String,
}

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("LOCAL_NEWS_API_TOKEN must be set in env")]
    MissingApiToken,
    #[error("API token is empty")]
    EmptyApiToken,
}

impl Credentials {
    pub fn new(api_token: impl Into<String>) -> Result<Self, CredentialsError> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(CredentialsError::EmptyApiToken);
        }

        Ok(Self { api_token })
    }

    /// Reads the API token from the `LOCAL_NEWS_API_TOKEN` environment variable.
    pub fn from_env() -> Result<Self, CredentialsError> {
        let api_token =
            env::var("LOCAL_NEWS_API_TOKEN").map_err(|_| CredentialsError::MissingApiToken)?;
        Self::new(api_token)
    }

    pub fn as_token_header(&self) -> &str {
        &self.api_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(
            Credentials::new("   "),
            Err(CredentialsError::EmptyApiToken)
        ));
    }

    #[test]
    fn token_is_exposed_as_header_value() {
        let credentials = Credentials::new("secret-token").unwrap();
        assert_eq!(credentials.as_token_header(), "secret-token");
    }
}
