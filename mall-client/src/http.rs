//! HTTP transport for the commerce API
//!
//! JSON over reqwest with bearer auth. A 401 triggers exactly one token
//! refresh and one replay of the request; a second 401 ends the session.
//! The session also ends when the refresh endpoint rejects the refresh token,
//! but not when the refresh request fails in transport or with a 5xx.

use crate::error::{ClientError, ClientResult};
use crate::session::SessionContext;
use crate::ClientConfig;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::client::{RefreshRequest, RefreshResponse};
use std::sync::Arc;

const REFRESH_PATH: &str = "auth/token/refresh/";

/// REST client
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl RestClient {
    /// Create a client; the timeout is the only request deadline in the system
    pub fn new(config: &ClientConfig, session: Arc<SessionContext>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path);
        self.execute(|| Ok(self.client.get(&url))).await
    }

    /// Make a GET request with query parameters
    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(path);
        self.execute(|| Ok(self.client.get(&url).query(query))).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        self.execute(|| Ok(self.client.post(&url).json(body))).await
    }

    /// Make a POST request without body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path);
        self.execute(|| Ok(self.client.post(&url))).await
    }

    /// Make a multipart POST. The form is rebuilt for the replay after a refresh.
    pub async fn post_multipart<T, F>(&self, path: &str, form: F) -> ClientResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::multipart::Form,
    {
        let url = self.url(path);
        self.execute(|| Ok(self.client.post(&url).multipart(form()))).await
    }

    async fn execute<T, F>(&self, build: F) -> ClientResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> ClientResult<RequestBuilder>,
    {
        match self.send_once(build()?).await {
            Err(e) if e.is_unauthorized() => {
                if self.session.refresh_token().is_none() {
                    self.session.require_reauth();
                    return Err(ClientError::Unauthorized);
                }
                tracing::info!("Access token rejected, refreshing");
                if let Err(refresh_err) = self.refresh_access_token().await {
                    if refresh_err.is_auth_rejection() {
                        tracing::warn!(error = %refresh_err, "Refresh token rejected");
                        self.session.require_reauth();
                        return Err(ClientError::Unauthorized);
                    }
                    // Session and local state stay as they are; the caller retries later.
                    tracing::warn!(error = %refresh_err, "Token refresh failed");
                    return Err(refresh_err);
                }
                match self.send_once(build()?).await {
                    Err(e) if e.is_unauthorized() => {
                        tracing::warn!("Request still unauthorized after refresh");
                        self.session.require_reauth();
                        Err(ClientError::Unauthorized)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn send_once<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let request = match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    async fn refresh_access_token(&self) -> ClientResult<()> {
        let refresh = self
            .session
            .refresh_token()
            .ok_or(ClientError::Unauthorized)?;
        let response = self
            .client
            .post(self.url(REFRESH_PATH))
            .json(&RefreshRequest { refresh })
            .send()
            .await?;
        let tokens: RefreshResponse = Self::handle_response(response).await?;
        self.session.update_access(tokens.access, tokens.refresh)
    }

    /// Handle the HTTP response. Empty bodies decode as JSON `null`.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = %status, "API request rejected");
            return Err(ClientError::from_response(status, &text));
        }

        let body = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(body).map_err(|e| {
            tracing::warn!(status = %status, error = %e, "Unexpected response body");
            ClientError::InvalidResponse(e.to_string())
        })
    }
}
