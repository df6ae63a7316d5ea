use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc;

use docchat_application::{ChatFlow, FlowOutcome, SessionStore, UploadFlow};
use docchat_core::session::AttachedFile;

use crate::commands::{COMMANDS, Command, HELP, SessionRef};
use crate::render;

/// Rustyline helper: slash-command completion, highlighting and hints.
#[derive(Clone)]
struct ReplHelper {
    commands: Vec<String>,
}

impl ReplHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|cmd| cmd.to_string()).collect(),
        }
    }
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ReplHelper {}

/// Runs the interactive loop until `quit`, `exit` or Ctrl-D.
///
/// Questions and uploads run as spawned tasks so the prompt stays usable
/// while the backend works; their outcomes come back over a channel to a
/// printer task. Everything else runs inline.
pub async fn run(store: Arc<SessionStore>) -> Result<()> {
    let chat = Arc::new(ChatFlow::new(store.clone()));
    let upload = Arc::new(UploadFlow::new(store.clone()));

    let (outcome_tx, mut outcome_rx) = mpsc::channel::<FlowOutcome>(32);

    let printer_store = store.clone();
    let printer = tokio::spawn(async move {
        while let Some(outcome) = outcome_rx.recv().await {
            render::outcome(&printer_store, &outcome);
            if printer_store.snapshot().sidebar_open {
                render::sessions(&printer_store);
            }
        }
    });

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ReplHelper::new()));

    println!("{}", "=== docchat ===".bright_magenta().bold());
    println!(
        "{}",
        "Ask a question, '/help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();
    render::history(&store);

    loop {
        let readline = rl.readline(">> ");

        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                render::error(&format!("Error: {err:?}"));
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        match Command::parse(trimmed) {
            Command::Quit => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Command::Ask(text) => {
                let flow = Arc::clone(&chat);
                let tx = outcome_tx.clone();
                tokio::spawn(async move {
                    let outcome = flow.send_text(text).await;
                    let _ = tx.send(outcome).await;
                });
            }
            Command::Upload => {
                let flow = Arc::clone(&upload);
                let tx = outcome_tx.clone();
                if let Some(file) = store.snapshot().attached_file {
                    render::info(&format!("Uploading {}...", file.display_name));
                }
                tokio::spawn(async move {
                    let outcome = flow.upload().await;
                    let _ = tx.send(outcome).await;
                });
            }
            Command::New => {
                let session_id = store.create_new();
                render::info(&format!("Started session {session_id}"));
            }
            Command::List => render::sessions(&store),
            Command::Select(target) => {
                let Some(session_id) = resolve(&store, &target) else {
                    continue;
                };
                match store.select_session(&session_id) {
                    Ok(()) => render::history(&store),
                    Err(err) => render::error(&err.to_string()),
                }
            }
            Command::Delete(target) => {
                let Some(session_id) = resolve(&store, &target) else {
                    continue;
                };
                match store.delete_session(&session_id).await {
                    Ok(()) => {
                        render::info(&format!("Deleted session {session_id}"));
                        if store.snapshot().sidebar_open {
                            render::sessions(&store);
                        }
                    }
                    Err(err) => render::error(&err.user_message("Could not delete the session.")),
                }
            }
            Command::Attach(path) => attach(&store, &path),
            Command::Detach => {
                store.detach_file();
                render::info("No document attached.");
            }
            Command::History => render::history(&store),
            Command::Sidebar => {
                if store.toggle_sidebar() {
                    render::sessions(&store);
                } else {
                    render::info("Session list hidden.");
                }
            }
            Command::Refresh => match store.refresh().await {
                Ok(_) => render::sessions(&store),
                Err(err) => render::error(&format!("Refresh failed: {err}")),
            },
            Command::Help => println!("{HELP}"),
            Command::Invalid(message) => render::error(&message),
        }
    }

    drop(outcome_tx);
    if store.pending().is_idle() {
        let _ = printer.await;
    } else {
        tracing::info!("[Repl] Exiting with an operation still in flight");
        printer.abort();
    }

    Ok(())
}

fn resolve(store: &SessionStore, target: &SessionRef) -> Option<String> {
    let ids: Vec<String> = store
        .list()
        .into_iter()
        .map(|session| session.session_id)
        .collect();
    match target.resolve(&ids) {
        Some(id) => Some(id.to_string()),
        None => {
            render::error(&format!("No session at that position ({} listed)", ids.len()));
            None
        }
    }
}

fn attach(store: &SessionStore, path: &Path) {
    if !path.is_file() {
        render::error(&format!("Not a file: {}", path.display()));
        return;
    }
    let file = AttachedFile::from_path(path);
    render::info(&format!(
        "Attached {}. Use /upload to send it.",
        file.display_name
    ));
    store.attach_file(file);
}
