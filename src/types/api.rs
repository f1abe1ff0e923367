use serde::{Deserialize, Serialize};

/// One decoded `data:` payload from the chat stream.
///
/// Heartbeats and error records are sent without a `type`, so the tag is
/// optional. Tags this client doesn't know decode as [`EventKind::Unknown`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type", default)]
    pub kind: Option<EventKind>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub heartbeat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ThinkingStart,
    ThinkingStream,
    ThinkingComplete,
    Response,
    ToolCall,
    ToolResult,
    FinalAnswer,
    Done,
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    pub fn of(kind: EventKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn with_content(kind: EventKind, content: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceListing {
    pub success: bool,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl WorkspaceListing {
    /// Backend-supplied reason for an unsuccessful listing.
    pub fn failure_reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceFile {
    pub success: bool,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl WorkspaceFile {
    pub fn is_html(&self) -> bool {
        let extension = self
            .filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        self.filename.contains('.') && matches!(extension.as_str(), "html" | "htm")
    }
}
