use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn_{}", self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tools_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnMode {
    /// Intermediate reasoning, shown with a thinking marker.
    Thinking,
    /// Answer text.
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStepKind {
    Call,
    Result,
}

/// Everything the dispatcher is allowed to do to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    OpenTurn {
        turn: TurnId,
        mode: TurnMode,
    },
    /// Full accumulated text of the turn; `streaming` shows a typing cursor.
    RenderTurn {
        turn: TurnId,
        text: String,
        streaming: bool,
    },
    ClearThinkingMarker {
        turn: TurnId,
    },
    EmitMessage {
        role: Role,
        text: String,
    },
    LogToolStep {
        container: ContainerId,
        kind: ToolStepKind,
        text: String,
    },
    SealToolContainer {
        container: ContainerId,
    },
    SetInputEnabled(bool),
}

pub trait UiSink {
    fn apply(&mut self, effect: UiEffect);
}

impl UiSink for Vec<UiEffect> {
    fn apply(&mut self, effect: UiEffect) {
        self.push(effect);
    }
}

impl UiSink for mpsc::UnboundedSender<UiEffect> {
    fn apply(&mut self, effect: UiEffect) {
        // A closed receiver means the front end is gone; nothing left to render.
        let _ = self.send(effect);
    }
}

impl<S: UiSink + ?Sized> UiSink for &mut S {
    fn apply(&mut self, effect: UiEffect) {
        (**self).apply(effect);
    }
}
