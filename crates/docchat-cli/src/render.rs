//! Terminal rendering of store state.

use colored::Colorize;
use docchat_application::{FlowOutcome, SessionStore};
use docchat_core::session::{Message, MessageStatus, Sender};

const TITLE_CHARS: usize = 40;

pub fn message(message: &Message) {
    match (message.sender, message.status) {
        (_, MessageStatus::Notice) => {
            for line in message.text.lines() {
                println!("{}", line.bright_yellow());
            }
        }
        (Sender::User, _) => println!("{}", format!("> {}", message.text).green()),
        (Sender::Assistant, _) => {
            for line in message.text.lines() {
                println!("{}", line.bright_blue());
            }
            if !message.sources.is_empty() {
                println!(
                    "{}",
                    format!("  sources: {}", message.sources.join(", ")).bright_black()
                );
            }
        }
    }
}

/// Prints the active session's messages and any history entries that could
/// not be decoded.
pub fn history(store: &SessionStore) {
    let view = store.snapshot();
    match &view.active_session_id {
        Some(id) => println!("{}", format!("=== {id} ===").bright_magenta()),
        None => println!("{}", "No active session".bright_black()),
    }
    if view.messages.is_empty() {
        println!("{}", "(no messages yet)".bright_black());
    }
    for entry in &view.messages {
        message(entry);
    }
    if !view.anomalies.is_empty() {
        println!(
            "{}",
            format!(
                "{} history entries had no known speaker marker and are shown as-is",
                view.anomalies.len()
            )
            .yellow()
        );
    }
    if let Some(file) = &view.attached_file {
        println!("{}", format!("attached: {}", file.display_name).bright_black());
    }
}

/// Prints the session list, marking the active session.
pub fn sessions(store: &SessionStore) {
    let sessions = store.list();
    let active = store.active_session_id();
    let marker = store.codec().human_marker().to_string();

    let synced = match store.last_synced_at() {
        Some(at) => at
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
            .to_string(),
        None => "never".to_string(),
    };
    println!(
        "{}",
        format!("Sessions (synced {synced})").bright_magenta().bold()
    );

    if sessions.is_empty() {
        println!("{}", "  (none on the backend)".bright_black());
    }
    for (index, session) in sessions.iter().enumerate() {
        let title = session.display_title(&marker, TITLE_CHARS);
        let line = format!("{:>3}. {}  {}", index + 1, title, session.session_id);
        if active.as_deref() == Some(session.session_id.as_str()) {
            println!("{}", format!("* {line}").bright_green());
        } else {
            println!("  {line}");
        }
    }
    if let Some(id) = active
        && !sessions.iter().any(|session| session.session_id == id)
    {
        println!("{}", format!("*      (new) {id}").bright_green());
    }
}

/// Prints what a finished flow did. `Completed` shows the newest message.
pub fn outcome(store: &SessionStore, outcome: &FlowOutcome) {
    match outcome {
        FlowOutcome::Completed => {
            if let Some(last) = store.snapshot().messages.last() {
                message(last);
            }
        }
        FlowOutcome::Failed { notice } => println!("{}", notice.red()),
        FlowOutcome::Rejected(rejection) => {
            println!("{}", format!("Not sent: {rejection}").yellow())
        }
        FlowOutcome::Discarded { session_id } => println!(
            "{}",
            format!("A reply for session {session_id} arrived after you switched away.")
                .bright_black()
        ),
    }
}

pub fn info(text: &str) {
    println!("{}", text.bright_black());
}

pub fn error(text: &str) {
    eprintln!("{}", text.red());
}
