//! HTTP reachability probe with built-in retry logic.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use std::time::Duration;

use super::retry::{MAX_RETRIES, RETRY_DELAY_MS, classify_status, is_retryable_error};

/// Checks that a URL answers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Probe: Send + Sync {
    /// Returns the final status code once redirects are followed, or the
    /// reason the URL is unreachable.
    async fn check(&self, url: &str) -> Result<u16>;
}

/// HTTP client with built-in retry logic for reachability checks.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    github_token: Option<String>,
    retry_delay: Duration,
}

/// Whether requests to `url` should carry the GitHub token.
pub fn wants_github_token(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| host == "github.com" || host.ends_with(".github.com"))
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            github_token: None,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.github_token {
            Some(token) if wants_github_token(url) => request.bearer_auth(token),
            _ => request,
        }
    }

    /// Single probe attempt without retry.
    ///
    /// Uses `HEAD` and falls back to `GET` for servers that refuse it.
    async fn check_once(&self, url: &str) -> Result<u16> {
        let response = self
            .request(Method::HEAD, url)
            .send()
            .await
            .context("Failed to send request")?;

        let response = match response.status() {
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                debug!("HEAD not supported by {}, retrying with GET", url);
                self.request(Method::GET, url)
                    .send()
                    .await
                    .context("Failed to send request")?
            }
            _ => response,
        };

        let status = response.status();
        if status.is_success() {
            return Ok(status.as_u16());
        }

        let rate_limited = response
            .headers()
            .get("x-ratelimit-remaining")
            .is_some_and(|v| v.as_bytes() == b"0");
        classify_status(status, if rate_limited { "rate limit" } else { "" })?;

        bail!("server error (HTTP {})", status.as_u16())
    }

    /// Executes an async operation with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable_error(&e) {
                        debug!("{}: non-retryable error: {}", operation_name, e);
                        return Err(e);
                    }

                    if attempt < MAX_RETRIES {
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                            operation_name,
                            attempt,
                            MAX_RETRIES,
                            e,
                            self.retry_delay.as_millis()
                        );
                        tokio::time::sleep(self.retry_delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("{}: failed after {} attempts", operation_name, MAX_RETRIES)
        }))
    }
}

#[async_trait]
impl Probe for HttpClient {
    #[tracing::instrument(skip(self))]
    async fn check(&self, url: &str) -> Result<u16> {
        debug!("Probing {}...", url);
        self.with_retry("probe", || self.check_once(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::NonRetryableError;

    fn client() -> HttpClient {
        HttpClient::new(Client::new()).with_retry_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_check_head_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/app.dmg")
            .with_status(200)
            .create_async()
            .await;

        let status = client()
            .check(&format!("{}/app.dmg", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_check_falls_back_to_get() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/")
            .with_status(405)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let status = client().check(&server.url()).await.unwrap();

        head.assert_async().await;
        get.assert_async().await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_check_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/missing.dmg")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let err = client()
            .check(&format!("{}/missing.dmg", server.url()))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(
            err.downcast_ref::<NonRetryableError>(),
            Some(&NonRetryableError::NotFound(404))
        );
    }

    #[tokio::test]
    async fn test_check_server_error_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/flaky")
            .with_status(503)
            .expect(MAX_RETRIES)
            .create_async()
            .await;

        let err = client()
            .check(&format!("{}/flaky", server.url()))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn test_check_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", "/")
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .create_async()
            .await;

        let err = client().check(&server.url()).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<NonRetryableError>(),
            Some(&NonRetryableError::RateLimitExceeded)
        );
    }

    #[tokio::test]
    async fn test_token_not_sent_to_other_hosts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/")
            .match_header("Authorization", mockito::Matcher::Missing)
            .with_status(200)
            .create_async()
            .await;

        client()
            .with_github_token(Some("secret".to_string()))
            .check(&server.url())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[test]
    fn test_wants_github_token() {
        assert!(wants_github_token(
            "https://github.com/HayaKus/ClaudeCode-Cola/releases/download/v1.0.0/a.dmg"
        ));
        assert!(wants_github_token("https://api.github.com/repos/a/b"));
        assert!(!wants_github_token("https://notgithub.com/a"));
        assert!(!wants_github_token("https://objects.githubusercontent.com/a"));
        assert!(!wants_github_token("not a url"));
    }
}
