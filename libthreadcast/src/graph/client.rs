//! HTTP implementation of the remote publishing API

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::auth::AccessToken;
use crate::config::GraphConfig;
use crate::error::{ConfigError, RemoteError, RemoteResult, Result};
use crate::graph::{ContainerRequest, GraphApi};
use crate::types::{ContainerId, PostId, StatusReport};

#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    message: String,
}

impl GraphClient {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let base = base_url(&config.base_url, config.api_version.as_deref())?;

        if !config.reject_unauthorized {
            tracing::warn!("TLS certificate verification is disabled for Graph API calls");
        }

        let mut builder = Client::builder()
            .user_agent(Self::user_agent())
            .danger_accept_invalid_certs(!config.reject_unauthorized);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().map_err(|e| ConfigError::InvalidValue {
            field: "graph".to_string(),
            value: e.to_string(),
        })?;

        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("threadcast/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `path` with `params` and the access token as query string
    fn endpoint(
        &self,
        path: &str,
        params: &[(&str, String)],
        token: &AccessToken,
    ) -> RemoteResult<Url> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| RemoteError::Decode(format!("invalid endpoint {}: {}", path, e)))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("access_token", token.expose());
        }
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, url: Url) -> RemoteResult<T> {
        tracing::debug!(method = %method, path = url.path(), "Graph API request");

        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(classify_failure(status, &bytes));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| RemoteError::Decode(format!("failed to parse body: {}", e)))
    }
}

/// Graph base URL with the optional version segment, always ending in `/`
fn base_url(base: &str, version: Option<&str>) -> Result<Url> {
    let mut raw = base.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    if let Some(version) = version.map(|v| v.trim_matches('/')).filter(|v| !v.is_empty()) {
        raw.push_str(version);
        raw.push('/');
    }

    Url::parse(&raw).map_err(|e| {
        ConfigError::InvalidValue {
            field: "graph.base_url".to_string(),
            value: format!("{} ({})", raw, e),
        }
        .into()
    })
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    // Never include the URL: it carries the access token
    RemoteError::Network(e.without_url().to_string())
}

/// Turn a non-success response into an error, preferring the Graph error message
fn classify_failure(status: StatusCode, body: &[u8]) -> RemoteError {
    let message = serde_json::from_slice::<GraphErrorBody>(body)
        .map(|b| b.error.message)
        .ok()
        .or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimit(message),
        _ => RemoteError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn create_container(
        &self,
        request: &ContainerRequest,
        token: &AccessToken,
    ) -> RemoteResult<ContainerId> {
        let url = self.endpoint("me/threads", &request.query_pairs(), token)?;
        let body: IdResponse = self.call(Method::POST, url).await?;
        Ok(ContainerId::new(body.id))
    }

    async fn container_status(
        &self,
        id: &ContainerId,
        token: &AccessToken,
    ) -> RemoteResult<StatusReport> {
        let params = [("fields", "status,error_message".to_string())];
        let url = self.endpoint(id.as_str(), &params, token)?;
        self.call(Method::GET, url).await
    }

    async fn publish_container(
        &self,
        id: &ContainerId,
        token: &AccessToken,
    ) -> RemoteResult<PostId> {
        let params = [("creation_id", id.to_string())];
        let url = self.endpoint("me/threads_publish", &params, token)?;
        let body: IdResponse = self.call(Method::POST, url).await?;
        Ok(PostId::new(body.id))
    }

    async fn repost(&self, id: &PostId, token: &AccessToken) -> RemoteResult<PostId> {
        let url = self.endpoint(&format!("{}/repost", id), &[], token)?;
        let body: IdResponse = self.call(Method::POST, url).await?;
        Ok(PostId::new(body.id))
    }
}
