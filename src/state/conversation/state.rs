use super::super::effect::{ContainerId, ToolStepKind, TurnId, TurnMode};
use crate::api::{ApiClient, ConnectionStatus};
use thiserror::Error;

pub struct ConversationManager {
    pub(super) client: ApiClient,
    pub(super) state: ConversationState,
    pub(super) status: ConnectionStatus,
}

/// Conversation-scoped state that outlives a single request.
#[derive(Debug, Default)]
pub struct ConversationState {
    pub(super) tool_log: ToolStepLog,
    pub(super) next_turn_id: u64,
}

/// One in-progress assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantTurn {
    pub id: TurnId,
    pub content: String,
    pub mode: TurnMode,
    /// Set while the UI still shows this turn with thinking styling.
    pub thinking_marker: bool,
}

impl AssistantTurn {
    pub(super) fn new(id: TurnId, mode: TurnMode) -> Self {
        Self {
            id,
            content: String::new(),
            mode,
            thinking_marker: mode == TurnMode::Thinking,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TurnState {
    #[default]
    Idle,
    Open(AssistantTurn),
}

impl TurnState {
    pub fn current(&self) -> Option<&AssistantTurn> {
        match self {
            TurnState::Open(turn) => Some(turn),
            TurnState::Idle => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStep {
    pub kind: ToolStepKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContainer {
    pub id: ContainerId,
    pub steps: Vec<ToolStep>,
    pub sealed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolContainerState {
    NoContainer,
    ContainerOpen(ContainerId),
    ContainerSealed(ContainerId),
}

/// Append-only record of tool activity, grouped into containers.
#[derive(Debug, Default)]
pub struct ToolStepLog {
    containers: Vec<ToolContainer>,
    next_container_id: u64,
}

impl ToolStepLog {
    pub fn containers(&self) -> &[ToolContainer] {
        &self.containers
    }

    pub fn state(&self) -> ToolContainerState {
        match self.containers.last() {
            None => ToolContainerState::NoContainer,
            Some(container) if container.sealed => ToolContainerState::ContainerSealed(container.id),
            Some(container) => ToolContainerState::ContainerOpen(container.id),
        }
    }

    /// Appends a step to the open container, starting a new one when the
    /// last container is sealed or none exists.
    pub(super) fn record(&mut self, kind: ToolStepKind, text: String) -> ContainerId {
        let step = ToolStep { kind, text };
        if let Some(container) = self.containers.last_mut().filter(|c| !c.sealed) {
            container.steps.push(step);
            return container.id;
        }

        let id = ContainerId(self.next_container_id);
        self.next_container_id += 1;
        self.containers.push(ToolContainer {
            id,
            steps: vec![step],
            sealed: false,
        });
        id
    }

    /// Seals the last container if it is still open.
    pub(super) fn seal_current(&mut self) -> Option<ContainerId> {
        let container = self.containers.last_mut().filter(|c| !c.sealed)?;
        container.sealed = true;
        Some(container.id)
    }
}

/// How the processing of one chat request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    FinalAnswer,
    Done,
    /// `data: [DONE]` sentinel.
    Sentinel,
    ServerError(String),
    TransportFailed(String),
    /// The chat request itself could not be made.
    SendFailed(String),
    /// Transport closed without a terminal event.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    #[error("message is empty")]
    EmptyMessage,
    #[error("not connected to the agent server")]
    NotConnected,
}
