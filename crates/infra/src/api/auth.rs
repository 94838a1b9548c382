//! Bearer token sources for the storage API

use async_trait::async_trait;

use super::errors::ApiError;

/// Trait for providing access tokens
///
/// Implementations may refresh tokens; the client asks for a token before
/// every request.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, ApiError>;
}

/// Provider that hands out one pre-issued token
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, ApiError> {
        if self.token.is_empty() {
            return Err(ApiError::Auth("no access token configured".into()));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_returns_its_token() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn empty_token_is_an_auth_error() {
        let err = StaticTokenProvider::new("").access_token().await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
    }

    #[test]
    fn debug_output_hides_the_token() {
        let rendered = format!("{:?}", StaticTokenProvider::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
