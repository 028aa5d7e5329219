use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use super::dto::ErrorBodyDto;
use crate::ports::{CredentialProvider, RepositoryError, RepositoryResult};

pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    pub fn new(base_url: String, credentials: Arc<dyn CredentialProvider>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("taskboard-cli/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// The token is read from the credential store on every call, so a login
    /// or logout takes effect on the next request.
    fn bearer(&self) -> RepositoryResult<String> {
        self.credentials.token().ok_or_else(|| {
            RepositoryError::Authentication("No API token configured; run `taskboard login`".to_string())
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> RepositoryResult<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        self.handle_response(response).await
    }

    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> RepositoryResult<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bearer()?)
            .json(body)
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        self.handle_response(response).await
    }

    pub async fn put<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> RepositoryResult<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .put(&url)
            .bearer_auth(self.bearer()?)
            .json(body)
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        self.handle_response(response).await
    }

    /// DELETE endpoints answer 204 with no body.
    pub async fn delete(&self, path: &str) -> RepositoryResult<()> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from(response).await)
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> RepositoryResult<T> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        tracing::debug!("API response: {}", response_text);

        serde_json::from_str(&response_text).map_err(|e| {
            RepositoryError::Serialization(format!(
                "Failed to parse response: {}. Response was: {}",
                e, response_text
            ))
        })
    }

    /// Non-2xx responses carry an `{"error": "..."}` body; fall back to the
    /// raw text when the server sends something else.
    async fn error_from(response: Response) -> RepositoryError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBodyDto>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });

        match status.as_u16() {
            401 => RepositoryError::Authentication(message),
            404 => RepositoryError::NotFound(message),
            _ => RepositoryError::Api(format!("HTTP {}: {}", status.as_u16(), message)),
        }
    }
}
