//! Read-only view over a storage response

use bytes::Bytes;
use reqwest::{header::HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::{ClientError, Result};

/// Response from the storage service.
///
/// Non-success statuses are passed through untouched; use
/// [`Response::error_for_status`] to turn them into errors.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Get a header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn url(&self) -> &reqwest::Url {
        self.inner.url()
    }

    pub async fn bytes(self) -> Result<Bytes> {
        Ok(self.inner.bytes().await?)
    }

    pub async fn text(self) -> Result<String> {
        Ok(self.inner.text().await?)
    }

    /// Deserialize a JSON body (container and object listings with `format=json`)
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        Ok(self.inner.json().await?)
    }

    /// Fail with `ClientError::Status` unless the status is 2xx
    pub async fn error_for_status(self) -> Result<Self> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }
        let body = self.inner.text().await.unwrap_or_default();
        Err(ClientError::status(status, &body))
    }

    pub fn into_inner(self) -> reqwest::Response {
        self.inner
    }
}
