//! Interactive terminal surface over the intent pipeline.
//!
//! A rustyline read loop: one utterance per turn, print the handler's
//! response. The handlers registered here are deliberately thin; the real
//! script-running and file-management utilities live outside the core, so
//! these confirm what was understood and hand the structured intent over
//! as a JSON payload.

use intent_core::{
    ConversationContext, DispatchTable, EntityKind, HandlerError, HandlerResponse, Intent,
    IntentHandler, IntentLabel, Outcome, Session, TurnKind,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde_json::json;
use tracing_subscriber::EnvFilter;

struct RunHandler;

impl IntentHandler for RunHandler {
    fn handle(
        &self,
        intent: &Intent,
        _ctx: &ConversationContext,
    ) -> Result<HandlerResponse, HandlerError> {
        let Some(target) = intent.entity(EntityKind::Target) else {
            return Ok(HandlerResponse::partial(
                "Which script would you like to run?",
            ));
        };
        let mut text = format!("Running {}", target);
        if let Some(dir) = intent.entity(EntityKind::Directory) {
            text.push_str(&format!(" in {}", dir));
        }
        if let Some(ty) = intent.entity(EntityKind::FileType) {
            text.push_str(&format!(" ({} files", ty));
            if let Some(scope) = intent.entity(EntityKind::Scope) {
                text.push_str(&format!(", scope: {}", scope));
            }
            text.push(')');
        }
        Ok(HandlerResponse::success(text)
            .with_payload(json!({ "entities": intent.entities, "confidence": intent.confidence })))
    }
}

/// Listing, searching, summarizing, organizing: same shape, different verb.
struct ReportHandler {
    verb: &'static str,
    missing: Option<&'static str>,
}

impl IntentHandler for ReportHandler {
    fn handle(
        &self,
        intent: &Intent,
        _ctx: &ConversationContext,
    ) -> Result<HandlerResponse, HandlerError> {
        let target = intent.entity(EntityKind::Target);
        if target.is_none() {
            if let Some(prompt) = self.missing {
                return Ok(HandlerResponse::partial(prompt));
            }
        }
        let mut text = self.verb.to_string();
        if let Some(target) = target {
            text.push_str(&format!(" {}", target));
        }
        if let Some(ty) = intent.entity(EntityKind::FileType) {
            text.push_str(&format!(" [{} files]", ty));
        }
        if let Some(dir) = intent.entity(EntityKind::Directory) {
            text.push_str(&format!(" in {}", dir));
        }
        if let Some(scope) = intent.entity(EntityKind::Scope) {
            text.push_str(&format!(" ({})", scope));
        }
        Ok(HandlerResponse::success(text)
            .with_payload(json!({ "entities": intent.entities })))
    }
}

struct HelpHandler;

impl IntentHandler for HelpHandler {
    fn handle(
        &self,
        intent: &Intent,
        _ctx: &ConversationContext,
    ) -> Result<HandlerResponse, HandlerError> {
        let topic = intent
            .entity(EntityKind::Target)
            .map(|t| t.to_lowercase());
        let text = match topic.as_deref() {
            Some("run") => "run <script> - execute a script, e.g. \"run the backup script\"",
            Some("list") => "list [directory] - list files, e.g. \"list all python files\"",
            Some("search") => "search <query> - find files or content, e.g. \"find the password utilities\"",
            Some("summarize") => "summarize <file> - condense a file, e.g. \"summarize the latest README\"",
            Some("organize") => "organize - sort files into their directories",
            _ => {
                "I understand natural language commands:\n\
                 - \"run the security scan on all python files\"\n\
                 - \"list everything in shell_scripts\"\n\
                 - \"search for password utilities\"\n\
                 - \"summarize the latest README\"\n\
                 - \"organize my workspace\"\n\
                 Say \"help <topic>\" for details, or \"exit\" to leave."
            }
        };
        Ok(HandlerResponse::success(text))
    }
}

struct ChatHandler;

impl IntentHandler for ChatHandler {
    fn handle(
        &self,
        intent: &Intent,
        _ctx: &ConversationContext,
    ) -> Result<HandlerResponse, HandlerError> {
        let text = if intent.label == IntentLabel::AiChat {
            "Hello! Tell me what to do with your scripts and files, or ask for help.".to_string()
        } else {
            format!(
                "I didn't recognize a command in {:?}. Type 'help' to see what I can do.",
                intent.utterance
            )
        };
        Ok(HandlerResponse::partial(text))
    }
}

struct ExitHandler;

impl IntentHandler for ExitHandler {
    fn handle(
        &self,
        _intent: &Intent,
        _ctx: &ConversationContext,
    ) -> Result<HandlerResponse, HandlerError> {
        Ok(HandlerResponse::success("Goodbye!"))
    }
}

fn build_table() -> DispatchTable {
    DispatchTable::builder()
        .register(IntentLabel::RunScript, RunHandler)
        .register(
            IntentLabel::ListFiles,
            ReportHandler {
                verb: "Listing files",
                missing: None,
            },
        )
        .register(
            IntentLabel::Search,
            ReportHandler {
                verb: "Searching for",
                missing: Some("What would you like to search for?"),
            },
        )
        .register(
            IntentLabel::ShowFile,
            ReportHandler {
                verb: "Showing",
                missing: Some("Which file would you like to see?"),
            },
        )
        .register(
            IntentLabel::CreateFile,
            ReportHandler {
                verb: "Creating",
                missing: Some("What file should I create?"),
            },
        )
        .register(
            IntentLabel::DeleteFile,
            ReportHandler {
                verb: "Deleting",
                missing: Some("What should I delete?"),
            },
        )
        .register(
            IntentLabel::Rename,
            ReportHandler {
                verb: "Renaming",
                missing: Some("What should I rename?"),
            },
        )
        .register(
            IntentLabel::MoveFile,
            ReportHandler {
                verb: "Moving",
                missing: Some("What should I move?"),
            },
        )
        .register(
            IntentLabel::Organize,
            ReportHandler {
                verb: "Organizing the workspace",
                missing: None,
            },
        )
        .register(
            IntentLabel::Summarize,
            ReportHandler {
                verb: "Summarizing",
                missing: Some("What would you like summarized?"),
            },
        )
        .register(IntentLabel::ShowHelp, HelpHandler)
        .register(IntentLabel::AiChat, ChatHandler)
        .register(IntentLabel::Exit, ExitHandler)
        .fallback(ChatHandler)
        .build()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut session = Session::standard(build_table());
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("failed to initialize terminal input: {}", e);
            std::process::exit(1);
        }
    };

    println!("Intent terminal - natural language script management");
    println!("Type 'help' for assistance or 'exit' to quit.\n");

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                let response = session.turn(line);
                println!("{}\n", response.text);
                if let TurnKind::Dispatched { intent, outcome } = &response.kind {
                    if intent.label == IntentLabel::Exit && *outcome == Outcome::Success {
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("input error: {}", e);
                break;
            }
        }
    }
}
