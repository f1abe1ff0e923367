use anyhow::{bail, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::{is_local_endpoint_url, parse_bool_flag};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server_url: String,
    pub show_tool_steps: bool,
    pub log_filter: String,
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            show_tool_steps: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let server_url = non_empty_env("CODEAGENT_SERVER_URL")
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let show_tool_steps = std::env::var("CODEAGENT_SHOW_TOOL_STEPS")
            .ok()
            .and_then(parse_bool_flag)
            .unwrap_or(true);
        let log_filter =
            non_empty_env("CODEAGENT_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let log_path = non_empty_env("CODEAGENT_LOG_PATH").map(PathBuf::from);

        Ok(Self {
            server_url,
            show_tool_steps,
            log_filter,
            log_path,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let url = match Url::parse(self.server_url.trim()) {
            Ok(url) => url,
            Err(error) => bail!(
                "Invalid CODEAGENT_SERVER_URL '{}': {}",
                self.server_url,
                error
            ),
        };

        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "Invalid CODEAGENT_SERVER_URL '{}': expected http:// or https:// URL",
                self.server_url
            );
        }

        if url.scheme() == "http" && !self.is_local_server() {
            tracing::warn!(
                url = %self.server_url,
                "chat traffic to a remote server is not encrypted"
            );
        }

        Ok(())
    }

    pub fn is_local_server(&self) -> bool {
        is_local_endpoint_url(&self.server_url)
    }

    /// Base URL without a trailing slash, ready for path joins.
    pub fn base_url(&self) -> &str {
        self.server_url.trim().trim_end_matches('/')
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
