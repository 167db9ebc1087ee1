//! API client for communicating with the Pizza Pro partner REST API.
//!
//! This module provides the `ApiClient` struct, a thin wrapper that resolves
//! request paths against the configured base URL, plus the two remote
//! operations the store-profile flow depends on.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{ManagedStore, StoreProfileUpdate};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path of the managed store resource
const MANAGED_STORE_PATH: &str = "/managed-restaurant";

/// Path of the update-profile call
const PROFILE_PATH: &str = "/profile";

/// Maximum number of retries for rate-limited (429) reads.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Remote operations backing the store-profile dialog.
///
/// `ApiClient` is the production implementation.
#[async_trait]
pub trait StoreProfileRemote: Send + Sync {
    /// Read the managed store (system of record).
    async fn fetch_managed_store(&self) -> Result<ManagedStore>;

    /// Write the editable profile fields of the managed store.
    async fn update_profile(&self, update: &StoreProfileUpdate) -> Result<()>;
}

/// API client for the partner API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL.
    ///
    /// An absolute path replaces the base URL's path, a relative one is
    /// joined to it.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid API path: {}", path))
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(
                        url = %url,
                        retry = retries,
                        backoff_ms = backoff_ms,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    /// Send a PUT once. Writes are not retried; the caller decides what a
    /// failure means.
    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path)?;

        let response = self
            .client
            .put(url.clone())
            .json(body)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send PUT request to {}", url))?;

        let response = Self::check_response(response).await?;
        debug!(url = %url, status = %response.status(), "PUT request succeeded");
        Ok(())
    }
}

#[async_trait]
impl StoreProfileRemote for ApiClient {
    async fn fetch_managed_store(&self) -> Result<ManagedStore> {
        let store: ManagedStore = self.get(MANAGED_STORE_PATH).await?;
        debug!(store_id = %store.id, "Managed store fetched");
        Ok(store)
    }

    async fn update_profile(&self, update: &StoreProfileUpdate) -> Result<()> {
        self.put(PROFILE_PATH, update)
            .await
            .context("Failed to update store profile")
    }
}
