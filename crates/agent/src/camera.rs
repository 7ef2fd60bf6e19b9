//! Camera snapshot retrieval.
//!
//! [`DigestCamera`] fetches a still image from an HTTP endpoint protected
//! by digest authentication: the first request goes out without
//! credentials, and a `401` carrying a `Digest` challenge is answered once
//! with the computed `Authorization` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{StatusCode, Url};

use crate::config::CameraConfig;
use crate::error::TransportError;

/// Source of raw snapshot bytes.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch one encoded still image.
    async fn fetch(&self) -> Result<Vec<u8>, TransportError>;

    /// Human-readable location, for logging.
    fn describe(&self) -> String;
}

/// HTTP snapshot endpoint with digest authentication.
pub struct DigestCamera {
    client: reqwest::Client,
    config: CameraConfig,
}

impl DigestCamera {
    /// Build a camera client whose requests are bounded by `timeout`.
    pub fn new(config: CameraConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    /// Build a camera client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: CameraConfig) -> Self {
        Self { client, config }
    }

    /// Compute the `Authorization` header answering `challenge`.
    fn answer_challenge(&self, challenge: &str) -> Result<String, TransportError> {
        let mut prompt = digest_auth::parse(challenge).map_err(|e| self.digest_error(e))?;
        let context = digest_auth::AuthContext::new(
            self.config.username.as_str(),
            self.config.password.as_str(),
            request_uri(&self.config.url),
        );
        let answer = prompt.respond(&context).map_err(|e| self.digest_error(e))?;
        Ok(answer.to_header_string())
    }

    fn digest_error(&self, e: impl std::fmt::Display) -> TransportError {
        TransportError::DigestAuth {
            url: self.config.url.to_string(),
            reason: e.to_string(),
        }
    }

    /// Turn a non-2xx response into [`TransportError::Status`].
    async fn ensure_success(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::Status {
                url: self.config.url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl SnapshotSource for DigestCamera {
    async fn fetch(&self) -> Result<Vec<u8>, TransportError> {
        let url = self.config.url.as_str();

        let response = self
            .client
            .get(self.config.url.clone())
            .send()
            .await
            .map_err(|e| TransportError::request(url, e))?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            let challenge =
                digest_challenge(&response).ok_or_else(|| TransportError::DigestAuth {
                    url: url.to_string(),
                    reason: "401 response carried no Digest WWW-Authenticate challenge".into(),
                })?;
            let authorization = self.answer_challenge(&challenge)?;

            tracing::debug!(url, "Answering digest challenge");

            self.client
                .get(self.config.url.clone())
                .header(AUTHORIZATION, authorization)
                .send()
                .await
                .map_err(|e| TransportError::request(url, e))?
        } else {
            response
        };

        let response = self.ensure_success(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::request(url, e))?;

        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        self.config.url.to_string()
    }
}

/// First `WWW-Authenticate` header offering the Digest scheme.
fn digest_challenge(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.trim_start().to_ascii_lowercase().starts_with("digest"))
        .map(str::to_string)
}

/// Request-URI (path plus query) used in the digest response.
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
