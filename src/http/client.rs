use std::sync::Arc;

use bytes::Bytes;
use reqwest::{multipart::Form, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, debug_span, warn, Instrument};
use uuid::Uuid;

use super::navigator::{Navigator, LOGIN_PATH};
use crate::config::ClientConfig;
use crate::error::{extract_message, ApiError};
use crate::session::SessionContext;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// REST client bound to one backend and one session.
///
/// Every request carries the current bearer token (if any) and a fresh request id.
/// A 401 from any endpoint clears the session and sends the navigator to `/login`.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        session: SessionContext,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<F>(&self, method: Method, path: &str, build: F) -> Result<Response, ApiError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let request_id = Uuid::new_v4();
        let span = debug_span!("api_request", %method, path, %request_id);
        async move {
            let mut req = self
                .http
                .request(method, self.url(path))
                .header(REQUEST_ID_HEADER, request_id.to_string());
            if let Some(token) = self.session.token() {
                req = req.bearer_auth(token);
            }
            let resp = build(req).send().await?;
            debug!(status = resp.status().as_u16(), "response");
            self.check_status(resp).await
        }
        .instrument(span)
        .await
    }

    async fn check_status(&self, resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = extract_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized().await;
            return Err(ApiError::Unauthorized(message));
        }

        if status.is_server_error() {
            warn!(status = status.as_u16(), %message, "server error");
        } else {
            debug!(status = status.as_u16(), %message, "request rejected");
        }
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn handle_unauthorized(&self) {
        warn!("unauthorized response; dropping session");
        if let Err(e) = self.session.clear().await {
            warn!(error = %e, "failed to clear session after 401");
        }
        if self.navigator.current_path() != LOGIN_PATH {
            self.navigator.navigate(LOGIN_PATH);
        }
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    // --- verbs ---

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.execute(Method::GET, path, |r| r).await?;
        Self::decode(resp).await
    }

    pub async fn get_json_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let resp = self.execute(Method::GET, path, |r| r.query(query)).await?;
        Self::decode(resp).await
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Bytes, ApiError> {
        let resp = self.execute(Method::GET, path, |r| r).await?;
        Ok(resp.bytes().await?)
    }

    pub async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self.execute(method, path, |r| r.json(body)).await?;
        Self::decode(resp).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let resp = self.execute(method, path, |r| r.multipart(form)).await?;
        Self::decode(resp).await
    }

    pub async fn send_multipart_with<T, Q>(
        &self,
        method: Method,
        path: &str,
        form: Form,
        query: &Q,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let resp = self
            .execute(method, path, |r| r.query(query).multipart(form))
            .await?;
        Self::decode(resp).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, |r| r).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MemoryNavigator;
    use crate::session::MemorySessionStore;

    #[tokio::test]
    async fn url_joins_without_double_slash() {
        let cfg = ClientConfig::for_base_url("http://localhost:8082/");
        let session = SessionContext::load(Arc::new(MemorySessionStore::new()))
            .await
            .unwrap();
        let client = ApiClient::new(&cfg, session, Arc::new(MemoryNavigator::default())).unwrap();
        assert_eq!(client.url("/api/products"), "http://localhost:8082/api/products");
    }
}
