//! Line-oriented terminal front end for the chat core.

use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;
use tracing_subscriber::EnvFilter;

use lawbuddy_lib::plugins::chat::{
    Author, ChatController, EventOutcome, Message, SendOutcome,
};
use lawbuddy_lib::plugins::formatter::{render_document, render_plain};
use lawbuddy_lib::services::ai::OpenAiCollaborator;
use lawbuddy_lib::services::config::{ChatConfig, load_ai_config};
use lawbuddy_lib::services::retry::RetryConfig;

type Controller = ChatController<OpenAiCollaborator>;

const HELP: &str = "\
Commands:
  /new              start a new chat
  /list             list chats
  /select <n|id>    switch to a chat
  /delete <n|id>    delete a chat
  /stats            show totals across chats
  /config           show the model configuration
  /reload           reload credentials from the environment
  /help             show this help
  /quit             exit";

fn print_assistant(message: &Message) {
    if message.author != Author::Assistant || message.streaming {
        return;
    }
    println!("\n{}\n", render_plain(&render_document(&message.text)));
    if let Some(metadata) = &message.metadata {
        if !metadata.legal_sources.is_empty() {
            println!("Sources: {}\n", metadata.legal_sources.join(", "));
        }
    }
}

fn print_all(controller: &Controller) {
    for message in controller.messages() {
        print_assistant(message);
    }
}

fn print_outcome(controller: &Controller, outcome: EventOutcome) {
    match outcome {
        EventOutcome::Stale => {}
        EventOutcome::Progress { percent, .. } => {
            let received = controller
                .streaming()
                .map(|s| s.fragments_received)
                .unwrap_or(0);
            if percent > 0 {
                print!("\r… {}%", percent);
            } else {
                print!("\r… {} fragments", received);
            }
            let _ = std::io::stdout().flush();
        }
        EventOutcome::Completed { message_id } | EventOutcome::Failed { message_id } => {
            print!("\r");
            if let Some(message) = controller.messages().iter().find(|m| m.id == message_id) {
                print_assistant(message);
            }
        }
    }
}

fn list_sessions(controller: &Controller) {
    let current = controller.current_session_id();
    for (i, session) in controller.sessions().iter().enumerate() {
        let marker = if Some(session.id.as_str()) == current { '*' } else { ' ' };
        let categories = session
            .legal_categories
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{} {:>2}. {} ({} messages) {}",
            marker,
            i + 1,
            session.title,
            session.message_count,
            categories
        );
    }
}

/// Returns `false` when the driver should exit.
fn handle_line(controller: &mut Controller, line: &str) -> bool {
    let line = line.trim();
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();

    match command {
        "/quit" | "/exit" => return false,
        "/help" => println!("{}", HELP),
        "/new" => {
            controller.new_chat();
            print_all(controller);
        }
        "/list" => list_sessions(controller),
        "/select" | "/delete" => {
            let result = controller.resolve_session(arg).and_then(|id| {
                if command == "/select" {
                    controller.select_chat(&id)
                } else {
                    controller.delete_chat(&id)
                }
            });
            match result {
                Ok(()) => print_all(controller),
                Err(err) => println!("{}", err),
            }
        }
        "/stats" => {
            let stats = controller.analytics();
            println!(
                "{} chats, {} messages, {:.2} per chat",
                stats.total_chats, stats.total_messages, stats.avg_messages_per_chat
            );
            for entry in &stats.top_legal_categories {
                println!("  {} ({})", entry.category.as_str(), entry.count);
            }
        }
        "/config" => {
            let config = controller.collaborator().public_config();
            println!(
                "provider={:?} base_url={} model={} api_key={}",
                config.provider,
                config.base_url,
                config.model,
                if config.has_api_key { "set" } else { "missing" }
            );
        }
        "/reload" => {
            controller.collaborator().reload_config(load_ai_config());
            println!("Configuration reloaded.");
        }
        _ if command.starts_with('/') => println!("Unknown command. {}", HELP),
        _ => match controller.send_message(line) {
            SendOutcome::Ignored => {
                if controller.is_streaming() {
                    println!("Please wait for the current answer.");
                }
            }
            SendOutcome::NotConfigured => {
                if let Some(message) = controller.messages().last() {
                    print_assistant(message);
                }
            }
            SendOutcome::Started { generation } => {
                log::debug!("sent generation {}", generation);
            }
            SendOutcome::Failed { .. } => {
                if let Some(message) = controller.messages().last() {
                    print_assistant(message);
                }
            }
        },
    }
    true
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let chat_config = ChatConfig::from_env();
    let collaborator =
        OpenAiCollaborator::new(load_ai_config(), &chat_config, RetryConfig::from_env());
    let (tx, mut rx) = unbounded_channel();
    let mut controller = ChatController::new(collaborator, chat_config, tx);

    print_all(&controller);
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stall_check = tokio::time::interval(Duration::from_secs(1));
    stall_check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !handle_line(&mut controller, &line) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    log::warn!("stdin read failed: {}", err);
                    break;
                }
            },
            Some(event) = rx.recv() => {
                let outcome = controller.handle_event(event);
                print_outcome(&controller, outcome);
            }
            now = stall_check.tick() => {
                if let Some(outcome) = controller.check_stall(now) {
                    print_outcome(&controller, outcome);
                }
            }
        }
    }
}
