mod core;
mod state;
mod streaming;


pub use self::core::{
    Flow, TurnDispatcher, DEFAULT_FINAL_ANSWER_TEXT, DEFAULT_TOOL_CALL_TEXT,
    DEFAULT_TOOL_RESULT_TEXT, ERROR_MESSAGE_PREFIX, RECEIVE_FAILED_MESSAGE, SEND_FAILED_MESSAGE,
};
pub use state::{
    AssistantTurn, ConversationManager, ConversationState, SendRejected, StreamEnd, ToolContainer,
    ToolContainerState, ToolStep, ToolStepLog, TurnState,
};
