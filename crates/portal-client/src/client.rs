//! HTTP client for the pricing portal's JSON API.
//!
//! Wraps `reqwest` with a cookie store so the session cookie issued by
//! `login` rides along on every later call, and maps non-2xx answers to
//! [`ClientError::Status`] carrying the server's error message.

use std::time::Duration;

use async_trait::async_trait;
use portal_core::{Product, ProductPatch};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::api::{NewProductForm, ProductApi, ProductList};
use crate::error::ClientError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for one portal deployment.
pub struct PortalClient {
    client: Client,
    base_url: Url,
}

impl PortalClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_base_url(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// # Errors
    ///
    /// Same as [`PortalClient::new`].
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .cookie_store(true)
            .user_agent("portal-client/0.1")
            .build()?;

        // Exactly one trailing slash, so joins append to the base path.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Exchange the shared credentials for a session cookie.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Status`] with 401 when the credentials are wrong, or
    ///   500 when the server has no credentials configured.
    /// - [`ClientError::Http`] on network failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let url = self.endpoint("api/auth/login")?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Http`] on network failure.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let url = self.endpoint("api/auth/logout")?;
        let response = self.client.post(url).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// Download the pricing spreadsheet as raw `.xlsx` bytes.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Status`] for any non-2xx answer.
    /// - [`ClientError::Http`] on network failure.
    pub async fn export(&self) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint("api/export")?;
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    fn product_url(&self, id: Uuid) -> Result<Url, ClientError> {
        self.endpoint(&format!("api/products/{id}"))
    }

    /// Pass 2xx responses through; turn anything else into
    /// [`ClientError::Status`].
    async fn ensure_success(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .or_else(|| v.get("message"))
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());

        tracing::debug!(status = status.as_u16(), %message, "portal request failed");
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[async_trait]
impl ProductApi for PortalClient {
    async fn list_products(&self) -> Result<ProductList, ClientError> {
        let url = self.endpoint("api/products")?;
        let response = self.client.get(url).send().await?;
        Self::decode(response, "GET /api/products").await
    }

    async fn create_product(&self, form: &NewProductForm) -> Result<Product, ClientError> {
        let url = self.endpoint("api/products")?;
        let response = self.client.post(url).json(form).send().await?;
        Self::decode(response, "POST /api/products").await
    }

    async fn update_product(
        &self,
        id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Product, ClientError> {
        let url = self.product_url(id)?;
        let response = self.client.patch(url).json(&patch.to_json()).send().await?;
        Self::decode(response, &format!("PATCH /api/products/{id}")).await
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), ClientError> {
        let url = self.product_url(id)?;
        let response = self.client.delete(url).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> PortalClient {
        PortalClient::with_base_url(base_url, 5).expect("client construction should not fail")
    }

    #[test]
    fn endpoint_joins_onto_base_path() {
        let client = test_client("https://pricing.example.com/portal");
        assert_eq!(
            client.endpoint("api/products").expect("url").as_str(),
            "https://pricing.example.com/portal/api/products"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = test_client("https://pricing.example.com/");
        assert_eq!(
            client.endpoint("api/export").expect("url").as_str(),
            "https://pricing.example.com/api/export"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            PortalClient::new("not a url"),
            Err(ClientError::InvalidBaseUrl { .. })
        ));
    }
}
