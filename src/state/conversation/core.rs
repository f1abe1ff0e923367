use super::super::effect::{Role, ToolStepKind, TurnId, TurnMode, UiEffect, UiSink};
use super::streaming::drive_stream;
use super::{
    AssistantTurn, ConversationManager, ConversationState, SendRejected, StreamEnd, ToolStepLog,
    TurnState,
};
use crate::api::{ApiClient, ByteStream, ConnectionStatus};
use crate::types::{EventKind, StreamEvent};
use anyhow::Result;
use bytes::Bytes;
use futures::Stream;

pub const DEFAULT_TOOL_CALL_TEXT: &str = "Calling tool...";
pub const DEFAULT_TOOL_RESULT_TEXT: &str = "Tool finished";
pub const DEFAULT_FINAL_ANSWER_TEXT: &str = "Task complete";
pub const ERROR_MESSAGE_PREFIX: &str = "Error: ";
pub const SEND_FAILED_MESSAGE: &str =
    "Sorry, the message could not be sent. Please try again later.";
pub const RECEIVE_FAILED_MESSAGE: &str = "Sorry, something went wrong while receiving the response.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop(StreamEnd),
}

/// Applies the events of one chat request to the conversation.
///
/// The assistant turn lives only as long as the request; the tool log belongs
/// to the conversation. Input is released at most once per request, either by
/// a terminal event or by [`TurnDispatcher::finish`].
pub struct TurnDispatcher<'a> {
    state: &'a mut ConversationState,
    turn: TurnState,
    turn_opened: bool,
    input_released: bool,
}

impl<'a> TurnDispatcher<'a> {
    pub(super) fn new(state: &'a mut ConversationState) -> Self {
        Self {
            state,
            turn: TurnState::Idle,
            turn_opened: false,
            input_released: false,
        }
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    /// Whether any assistant turn was opened during this request.
    pub fn turn_opened(&self) -> bool {
        self.turn_opened
    }

    pub fn dispatch(&mut self, event: StreamEvent, sink: &mut dyn UiSink) -> Flow {
        if event.heartbeat {
            tracing::trace!("heartbeat");
            return Flow::Continue;
        }

        if let Some(error) = event.error {
            tracing::warn!(%error, "agent reported an error");
            sink.apply(UiEffect::EmitMessage {
                role: Role::Assistant,
                text: format!("{ERROR_MESSAGE_PREFIX}{error}"),
            });
            self.turn = TurnState::Idle;
            return Flow::Stop(StreamEnd::ServerError(error));
        }

        let Some(kind) = event.kind else {
            tracing::debug!("ignoring event without a type");
            return Flow::Continue;
        };
        let content = event.content;

        match kind {
            EventKind::ThinkingStart => {
                let turn = self.take_or_open_turn(TurnMode::Thinking, sink);
                self.turn = TurnState::Open(turn);
            }
            EventKind::ThinkingStream => {
                let mut turn = self.take_or_open_turn(TurnMode::Thinking, sink);
                turn.content.push_str(content.as_deref().unwrap_or_default());
                sink.apply(UiEffect::RenderTurn {
                    turn: turn.id,
                    text: turn.content.clone(),
                    streaming: true,
                });
                self.turn = TurnState::Open(turn);
            }
            EventKind::ThinkingComplete => {
                if let TurnState::Open(turn) = &mut self.turn {
                    sink.apply(UiEffect::RenderTurn {
                        turn: turn.id,
                        text: turn.content.clone(),
                        streaming: false,
                    });
                    turn.thinking_marker = false;
                    sink.apply(UiEffect::ClearThinkingMarker { turn: turn.id });
                }
            }
            EventKind::Response => {
                let mut turn = self.take_or_open_turn(TurnMode::Final, sink);
                turn.mode = TurnMode::Final;
                if turn.thinking_marker {
                    turn.thinking_marker = false;
                    sink.apply(UiEffect::ClearThinkingMarker { turn: turn.id });
                }
                turn.content.push_str(content.as_deref().unwrap_or_default());
                sink.apply(UiEffect::RenderTurn {
                    turn: turn.id,
                    text: turn.content.clone(),
                    streaming: false,
                });
                self.turn = TurnState::Open(turn);
            }
            EventKind::ToolCall => {
                let text = non_empty_or(content, DEFAULT_TOOL_CALL_TEXT);
                self.log_tool_step(ToolStepKind::Call, text, sink);
            }
            EventKind::ToolResult => {
                let text = non_empty_or(content, DEFAULT_TOOL_RESULT_TEXT);
                self.log_tool_step(ToolStepKind::Result, text, sink);
            }
            EventKind::FinalAnswer => {
                sink.apply(UiEffect::EmitMessage {
                    role: Role::Assistant,
                    text: non_empty_or(content, DEFAULT_FINAL_ANSWER_TEXT),
                });
                self.seal_tool_container(sink);
                self.release_input(sink);
                self.turn = TurnState::Idle;
                return Flow::Stop(StreamEnd::FinalAnswer);
            }
            EventKind::Done => {
                self.release_input(sink);
                self.seal_tool_container(sink);
                self.turn = TurnState::Idle;
                return Flow::Stop(StreamEnd::Done);
            }
            EventKind::Unknown => {
                tracing::debug!("ignoring event with unrecognized type");
            }
        }

        Flow::Continue
    }

    /// Reports a transport failure. Content already shown is left in place.
    pub fn transport_failed(&mut self, sink: &mut dyn UiSink) {
        if !self.turn_opened {
            sink.apply(UiEffect::EmitMessage {
                role: Role::Assistant,
                text: RECEIVE_FAILED_MESSAGE.to_string(),
            });
        }
    }

    /// Closes the request: seals a tool container still open and re-enables
    /// input if no terminal event did.
    pub fn finish(mut self, sink: &mut dyn UiSink) {
        self.seal_tool_container(sink);
        self.release_input(sink);
        self.turn = TurnState::Idle;
    }

    /// Takes the open turn out of the state, opening a new one if idle.
    /// Callers put it back with `TurnState::Open`.
    fn take_or_open_turn(&mut self, mode: TurnMode, sink: &mut dyn UiSink) -> AssistantTurn {
        match std::mem::take(&mut self.turn) {
            TurnState::Open(turn) => turn,
            TurnState::Idle => {
                let id = self.state.allocate_turn_id();
                tracing::debug!(turn = %id, ?mode, "opening assistant turn");
                sink.apply(UiEffect::OpenTurn { turn: id, mode });
                self.turn_opened = true;
                AssistantTurn::new(id, mode)
            }
        }
    }

    fn log_tool_step(&mut self, kind: ToolStepKind, text: String, sink: &mut dyn UiSink) {
        let container = self.state.tool_log.record(kind, text.clone());
        sink.apply(UiEffect::LogToolStep {
            container,
            kind,
            text,
        });
    }

    fn seal_tool_container(&mut self, sink: &mut dyn UiSink) {
        if let Some(container) = self.state.tool_log.seal_current() {
            sink.apply(UiEffect::SealToolContainer { container });
        }
    }

    fn release_input(&mut self, sink: &mut dyn UiSink) {
        if !self.input_released {
            self.input_released = true;
            sink.apply(UiEffect::SetInputEnabled(true));
        }
    }
}

fn non_empty_or(content: Option<String>, default: &str) -> String {
    content
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool_log(&self) -> &ToolStepLog {
        &self.tool_log
    }

    pub fn begin_request(&mut self) -> TurnDispatcher<'_> {
        TurnDispatcher::new(self)
    }

    /// Drives one chat response stream to completion.
    pub async fn process_stream<S>(&mut self, stream: S, sink: &mut dyn UiSink) -> StreamEnd
    where
        S: Stream<Item = Result<Bytes>> + Unpin,
    {
        let mut dispatcher = self.begin_request();
        let end = drive_stream(stream, &mut dispatcher, sink).await;
        dispatcher.finish(sink);
        tracing::debug!(?end, "chat stream finished");
        end
    }

    pub(super) fn allocate_turn_id(&mut self) -> TurnId {
        let id = TurnId(self.next_turn_id);
        self.next_turn_id += 1;
        id
    }
}

impl ConversationManager {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: ConversationState::new(),
            status: ConnectionStatus::Unknown,
        }
    }

    #[cfg(test)]
    pub fn new_mock(client: ApiClient) -> Self {
        Self {
            client,
            state: ConversationState::new(),
            status: ConnectionStatus::Connected,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn tool_log(&self) -> &ToolStepLog {
        self.state.tool_log()
    }

    pub async fn refresh_status(&mut self) -> &ConnectionStatus {
        self.status = self.client.health().await;
        tracing::info!(status = %self.status, "server status checked");
        &self.status
    }

    /// Sends one user message and renders the streamed reply into `sink`.
    ///
    /// Rejections happen before any effect is issued. Once the request starts,
    /// input is always re-enabled before this returns.
    pub async fn send_message(
        &mut self,
        content: &str,
        sink: &mut dyn UiSink,
    ) -> Result<StreamEnd, SendRejected> {
        let message = content.trim();
        if message.is_empty() {
            return Err(SendRejected::EmptyMessage);
        }
        if !self.status.is_connected() {
            return Err(SendRejected::NotConnected);
        }

        sink.apply(UiEffect::SetInputEnabled(false));
        sink.apply(UiEffect::EmitMessage {
            role: Role::User,
            text: message.to_string(),
        });

        let stream: ByteStream = match self.client.chat_stream(message).await {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(error = %error, "chat request failed");
                sink.apply(UiEffect::EmitMessage {
                    role: Role::Assistant,
                    text: SEND_FAILED_MESSAGE.to_string(),
                });
                sink.apply(UiEffect::SetInputEnabled(true));
                return Ok(StreamEnd::SendFailed(error.to_string()));
            }
        };

        Ok(self.state.process_stream(stream, sink).await)
    }
}
