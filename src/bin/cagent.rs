use anyhow::Result;
use codeagent::api::ApiClient;
use codeagent::config::Config;
use codeagent::logging::init_tracing;
use codeagent::state::{
    ConversationManager, FileTree, Role, SendRejected, ToolStepKind, TurnId, TurnMode, UiEffect,
    UiSink,
};
use crossterm::style::Stylize;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP_TEXT: &str = "\
/files          show the workspace file tree
/open <path>    print a workspace file
/status         re-check the server connection
/help           show this help
/quit           exit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Empty,
    Message(String),
    Files,
    Open(String),
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }
        let Some(command) = trimmed.strip_prefix('/') else {
            return Command::Message(trimmed.to_string());
        };

        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (command, ""),
        };
        match name {
            "files" | "ls" => Command::Files,
            "open" if !argument.is_empty() => Command::Open(argument.to_string()),
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(trimmed.to_string()),
        }
    }
}

/// Renders dispatcher effects as a scrolling transcript.
///
/// Turn renders carry the full accumulated text; only the suffix not yet on
/// screen is written.
struct TerminalSink {
    out: io::Stdout,
    show_tool_steps: bool,
    turn: Option<TurnId>,
    thinking: bool,
    printed: usize,
    line_open: bool,
}

impl TerminalSink {
    fn new(show_tool_steps: bool) -> Self {
        Self {
            out: io::stdout(),
            show_tool_steps,
            turn: None,
            thinking: false,
            printed: 0,
            line_open: false,
        }
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str, dim: bool) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if dim {
            write!(self.out, "{}", text.dark_grey())?;
        } else {
            write!(self.out, "{text}")?;
        }
        self.line_open = !text.ends_with('\n');
        Ok(())
    }

    fn render(&mut self, effect: UiEffect) -> io::Result<()> {
        match effect {
            UiEffect::OpenTurn { turn, mode } => {
                self.end_line()?;
                self.turn = Some(turn);
                self.printed = 0;
                self.thinking = mode == TurnMode::Thinking;
                let label = if self.thinking {
                    "assistant (thinking)".dark_grey()
                } else {
                    "assistant".green()
                };
                writeln!(self.out, "{label}")?;
            }
            UiEffect::RenderTurn { turn, text, .. } => {
                if self.turn != Some(turn) {
                    return Ok(());
                }
                // Turn text only grows; anything else is a stale render.
                if let Some(suffix) = text.get(self.printed..) {
                    let dim = self.thinking;
                    self.write_text(suffix, dim)?;
                    self.printed = text.len();
                }
            }
            UiEffect::ClearThinkingMarker { turn } => {
                if self.turn == Some(turn) {
                    self.end_line()?;
                    self.thinking = false;
                }
            }
            UiEffect::EmitMessage { role, text } => {
                self.end_line()?;
                match role {
                    // Already visible at the prompt.
                    Role::User => {}
                    Role::Assistant => writeln!(self.out, "{} {text}", "assistant:".green())?,
                    Role::System => writeln!(self.out, "{} {text}", "system:".yellow())?,
                }
            }
            UiEffect::LogToolStep { kind, text, .. } => {
                if !self.show_tool_steps {
                    return Ok(());
                }
                self.end_line()?;
                let marker = match kind {
                    ToolStepKind::Call => "  ▶".yellow(),
                    ToolStepKind::Result => "  ✔".green(),
                };
                let mut lines = text.lines();
                writeln!(self.out, "{marker} {}", lines.next().unwrap_or_default())?;
                for line in lines {
                    writeln!(self.out, "    {}", line.dark_grey())?;
                }
            }
            UiEffect::SealToolContainer { .. } => {
                if self.show_tool_steps {
                    self.end_line()?;
                    writeln!(self.out, "{}", "  └ tool run finished".dark_grey())?;
                }
            }
            UiEffect::SetInputEnabled(true) => {
                self.end_line()?;
                self.turn = None;
            }
            UiEffect::SetInputEnabled(false) => {}
        }
        self.out.flush()
    }
}

impl UiSink for TerminalSink {
    fn apply(&mut self, effect: UiEffect) {
        if let Err(error) = self.render(effect) {
            tracing::warn!(%error, "terminal write failed");
        }
    }
}

async fn show_files(client: &ApiClient) {
    let listing = match client.workspace_files().await {
        Ok(listing) => listing,
        Err(error) => {
            println!("{} {error:#}", "failed to load workspace:".red());
            return;
        }
    };
    if !listing.success {
        let reason = listing.failure_reason().unwrap_or("unknown error");
        println!("{} {reason}", "failed to load workspace:".red());
        return;
    }

    let tree = FileTree::build(&listing.files);
    if tree.is_empty() {
        println!("{}", "workspace is empty".dark_grey());
        return;
    }
    for line in tree.lines() {
        let indent = "  ".repeat(line.depth);
        if line.node.is_file {
            println!("{indent}{}", line.node.name);
        } else {
            println!("{indent}{}", format!("{}/", line.node.name).blue());
        }
    }
}

async fn open_file(client: &ApiClient, path: &str) {
    let file = match client.workspace_file(path).await {
        Ok(file) => file,
        Err(error) => {
            println!("{} {error:#}", "failed to open file:".red());
            return;
        }
    };
    if !file.success {
        let reason = file.error.as_deref().unwrap_or("unknown error");
        println!("{} {reason}", "failed to open file:".red());
        return;
    }

    let kind = if file.is_html() { " (html source)" } else { "" };
    println!("{}", format!("── {}{kind} ──", file.filename).cyan());
    println!("{}", file.content);
}

fn print_status(conversation: &ConversationManager) {
    let status = conversation.status();
    let label = status.to_string();
    if status.is_connected() {
        println!("{} {}", "●".green(), label);
    } else {
        println!("{} {}", "●".red(), label);
    }
}

fn prompt() -> io::Result<()> {
    let mut out = io::stdout();
    write!(out, "{} ", ">".cyan().bold())?;
    out.flush()
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;
    config.validate()?;

    let client = ApiClient::new(&config)?;
    let mut conversation = ConversationManager::new(client);
    let mut sink = TerminalSink::new(config.show_tool_steps);

    println!(
        "{} {}  (/help for commands)",
        "code agent".bold(),
        config.base_url().dark_grey()
    );
    conversation.refresh_status().await;
    print_status(&conversation);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{HELP_TEXT}"),
            Command::Status => {
                conversation.refresh_status().await;
                print_status(&conversation);
            }
            Command::Files => show_files(conversation.client()).await,
            Command::Open(path) => open_file(conversation.client(), &path).await,
            Command::Unknown(command) => {
                println!("{} {command}", "unknown command:".yellow());
            }
            Command::Message(message) => {
                match conversation.send_message(&message, &mut sink).await {
                    Ok(end) => tracing::debug!(?end, "turn finished"),
                    Err(SendRejected::NotConnected) => println!(
                        "{}",
                        "not connected to the agent server; try /status".red()
                    ),
                    Err(SendRejected::EmptyMessage) => {}
                }
            }
        }
    }

    Ok(())
}
