pub mod api;

pub use api::{
    ChatRequest, EventKind, HealthResponse, StreamEvent, WorkspaceFile, WorkspaceListing,
};
