pub mod conversation;
pub mod effect;
pub mod workspace;

pub use conversation::{
    AssistantTurn, ConversationManager, ConversationState, Flow, SendRejected, StreamEnd,
    ToolContainer, ToolContainerState, ToolStep, ToolStepLog, TurnDispatcher, TurnState,
};
pub use effect::{ContainerId, Role, ToolStepKind, TurnId, TurnMode, UiEffect, UiSink};
pub use workspace::{FileTree, FileTreeNode, TreeLine};
