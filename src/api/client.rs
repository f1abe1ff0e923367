use crate::config::Config;
use crate::logging::{debug_payload_enabled, emit_debug_payload};
use crate::types::{ChatRequest, HealthResponse, WorkspaceFile, WorkspaceListing};
use crate::util::is_local_endpoint_url;
use anyhow::anyhow;
use anyhow::Result;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::fmt;
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

const HEALTH_PATH: &str = "/api/health";
const CHAT_PATH: &str = "/api/chat";
const WORKSPACE_FILES_PATH: &str = "/api/workspace/files";
const WORKSPACE_FILE_PATH: &str = "/api/workspace/file/";

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, message: &str) -> Result<ByteStream>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Unknown,
    Connected,
    ServerError(u16),
    Unreachable,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Unknown => write!(f, "checking"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::ServerError(code) => write!(f, "server error ({code})"),
            ConnectionStatus::Unreachable => write!(f, "connection failed"),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_base_url(config.base_url()))
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            #[cfg(test)]
            mock_stream_producer: None,
        }
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "http://localhost:5000".to_string(),
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.base_url)
    }

    /// Probes the health endpoint. Any 2xx answer counts as connected.
    pub async fn health(&self) -> ConnectionStatus {
        let request_url = self.url(HEALTH_PATH);
        let response = match self.http.get(&request_url).send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(error = %map_api_request_error(error, &request_url), "health check failed");
                return ConnectionStatus::Unreachable;
            }
        };

        let status = response.status();
        if !status.is_success() {
            return ConnectionStatus::ServerError(status.as_u16());
        }

        // The body is informational only.
        if let Ok(health) = response.json::<HealthResponse>().await {
            tracing::debug!(status = %health.status, message = %health.message, "health response");
        }
        ConnectionStatus::Connected
    }

    pub async fn workspace_files(&self) -> Result<WorkspaceListing> {
        self.get_json(&self.url(WORKSPACE_FILES_PATH)).await
    }

    pub async fn workspace_file(&self, path: &str) -> Result<WorkspaceFile> {
        // One path segment: separators are encoded too.
        let request_url = format!(
            "{}{}",
            self.url(WORKSPACE_FILE_PATH),
            urlencoding::encode(path)
        );
        self.get_json(&request_url).await
    }

    /// Posts a chat message and returns the raw event-stream body.
    pub async fn chat_stream(&self, message: &str) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(message);
            }
        }

        let request_url = self.url(CHAT_PATH);
        let payload = ChatRequest { message };

        if debug_payload_enabled() {
            emit_debug_payload(&request_url, &serde_json::to_value(&payload)?);
        }

        let response = self
            .http
            .post(&request_url)
            .header("accept", "text/event-stream")
            .json(&payload)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, &request_url))?;

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }

    async fn get_json<T: DeserializeOwned>(&self, request_url: &str) -> Result<T> {
        let response = self
            .http
            .get(request_url)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, request_url))?;

        // Workspace endpoints report failures in the JSON body alongside 4xx/5xx.
        response
            .json::<T>()
            .await
            .map_err(|error| map_api_request_error(error, request_url))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local agent server '{}': {}. Start the server or update CODEAGENT_SERVER_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach agent server '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!("agent server '{}' returned HTTP {}", request_url, status);
    }
    if error.is_decode() {
        return anyhow!("unexpected response from '{}': {}", request_url, error);
    }
    anyhow!("request to '{}' failed: {}", request_url, error)
}
