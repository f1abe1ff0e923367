use crate::config::Config;
use crate::util::parse_bool_flag;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILE_NAME: &str = "codeagent-client.log";
const DEBUG_PAYLOAD_ENV: &str = "CODEAGENT_DEBUG_PAYLOAD";

/// Installs the global `tracing` subscriber.
///
/// Logs go to `config.log_path` when set. Otherwise an interactive stderr gets
/// a file in the temp dir so log lines don't tear through the REPL.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("invalid log filter '{}'", config.log_filter))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match resolve_log_path(config.log_path.clone()) {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    // A subscriber installed earlier (tests, embedding apps) wins.
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

fn resolve_log_path(configured: Option<PathBuf>) -> Option<PathBuf> {
    configured.or_else(|| {
        if std::io::stderr().is_terminal() {
            Some(std::env::temp_dir().join(DEFAULT_LOG_FILE_NAME))
        } else {
            None
        }
    })
}

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .and_then(parse_bool_flag)
        .unwrap_or(false)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    tracing::debug!(url = request_url, payload = %formatted_payload, "chat request payload");
}

pub fn emit_sse_parse_error(payload: &str, parse_error: &serde_json::Error) {
    tracing::warn!(error = %parse_error, data = payload, "skipping undecodable stream event");
}
