//! Streaming chat client for a code-agent server.
//!
//! Bytes from `POST /api/chat` flow through [`api::stream::StreamParser`]
//! into a [`state::TurnDispatcher`], which turns them into [`state::UiEffect`]s
//! for whatever front end implements [`state::UiSink`].

pub mod api;
pub mod config;
pub mod logging;
pub mod state;
pub mod types;
pub mod util;

#[cfg(test)]
mod test_support;
