//! REPL input parsing.

use std::path::PathBuf;

/// Slash commands offered for completion.
pub const COMMANDS: [&str; 11] = [
    "/new", "/list", "/select", "/delete", "/attach", "/detach", "/upload", "/history",
    "/sidebar", "/refresh", "/help",
];

/// A session named on the command line, by list position or by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRef {
    /// 1-based position in `/list`.
    Index(usize),
    Id(String),
}

impl SessionRef {
    fn parse(arg: &str) -> Self {
        match arg.parse::<usize>() {
            Ok(index) if index > 0 => SessionRef::Index(index),
            _ => SessionRef::Id(arg.to_string()),
        }
    }

    /// Resolves against the ids in list order.
    pub fn resolve<'a>(&'a self, ids: &'a [String]) -> Option<&'a str> {
        match self {
            SessionRef::Index(index) => ids.get(index - 1).map(String::as_str),
            SessionRef::Id(id) => Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: a question for the active session.
    Ask(String),
    New,
    List,
    Select(SessionRef),
    Delete(SessionRef),
    Attach(PathBuf),
    Detach,
    Upload,
    History,
    Sidebar,
    Refresh,
    Help,
    Quit,
    /// A slash command that is unknown or missing its argument.
    Invalid(String),
}

impl Command {
    /// Parses one trimmed, non-empty input line.
    pub fn parse(line: &str) -> Self {
        if line == "quit" || line == "exit" {
            return Command::Quit;
        }
        if !line.starts_with('/') {
            return Command::Ask(line.to_string());
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        match (name, arg) {
            ("/new", _) => Command::New,
            ("/list", _) => Command::List,
            ("/select", "") => Command::Invalid("usage: /select <n|id>".to_string()),
            ("/select", arg) => Command::Select(SessionRef::parse(arg)),
            ("/delete", "") => Command::Invalid("usage: /delete <n|id>".to_string()),
            ("/delete", arg) => Command::Delete(SessionRef::parse(arg)),
            ("/attach", "") => Command::Invalid("usage: /attach <path>".to_string()),
            ("/attach", arg) => Command::Attach(PathBuf::from(arg)),
            ("/detach", _) => Command::Detach,
            ("/upload", _) => Command::Upload,
            ("/history", _) => Command::History,
            ("/sidebar", _) => Command::Sidebar,
            ("/refresh", _) => Command::Refresh,
            ("/help", _) => Command::Help,
            (name, _) => Command::Invalid(format!("unknown command: {name}")),
        }
    }
}

pub const HELP: &str = "\
Type a question to ask about the active session's document.

  /new              start a new session
  /list             show sessions
  /select <n|id>    switch to a session
  /delete <n|id>    delete a session
  /attach <path>    choose a document to upload
  /detach           forget the chosen document
  /upload           upload the chosen document to the active session
  /history          show the active session's messages
  /sidebar          toggle the session list after each change
  /refresh          reload sessions from the backend
  /help             show this help
  quit | exit       leave";
