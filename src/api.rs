//! Outbound HTTP: one client, one base address, one timeout.
//!
//! Every network call in the crate goes through [`ApiClient`]. It carries a
//! default `Content-Type: application/json` header (multipart requests replace
//! it with their own boundary header) and a fixed request timeout. There is
//! no retry and no backoff: any failure is returned to the caller as an
//! [`ApiError`] and the caller decides what the user sees.

use crate::config::ClientConfig;
use crate::error::ApiError;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Shape of an error body as sent by the backend (`{"message": "..."}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client bound to the configured backend origin.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl ApiClient {
    /// Build the client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Network {
                endpoint: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Resolve `path` (e.g. `/users/signin`) against the base address.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| ApiError::InvalidUrl {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        debug!("POST {}", url);

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(path, e))?;
        let response = self.check_status(path, response).await?;

        response.json::<T>().await.map_err(|e| ApiError::Decode {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// POST a multipart form and return the raw response body.
    pub async fn post_multipart(
        &self,
        path: &str,
        query: &[(&str, &str)],
        form: Form,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path)?;
        debug!("POST {} (multipart) {:?}", url, query);

        let response = self
            .http
            .post(url)
            .query(query)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(path, e))?;
        let response = self.check_status(path, response).await?;

        let bytes = response.bytes().await.map_err(|e| self.transport_error(path, e))?;
        debug!("{} → {} bytes", path, bytes.len());
        Ok(bytes.to_vec())
    }

    fn transport_error(&self, path: &str, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                endpoint: path.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            ApiError::Network {
                endpoint: path.to_string(),
                reason: e.to_string(),
            }
        }
    }

    /// Turn a non-2xx response into [`ApiError::Status`], keeping the
    /// server's `message` field when the body is JSON.
    async fn check_status(&self, path: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
            .and_then(|b| b.message);
        warn!("{} answered {}", path, status);
        Err(ApiError::Status {
            endpoint: path.to_string(),
            status,
            message,
        })
    }
}
