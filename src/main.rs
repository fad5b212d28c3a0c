//! EkoAssist - conversational client for a Lagos housing assistant
//!
//! Terminal front end over a single conversation session. Each line typed is
//! sent to the assistant service; property results in replies are paged.

mod config;
mod runtime;
mod session;
mod state_machine;
mod transport;

use config::ClientConfig;
use runtime::{SessionHandle, SubmitOutcome, TracingObserver};
use session::{Author, Session, Turn, TurnId};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::{build_transport, HttpTransport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the conversation.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ekoassist=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(
        api = %config.api_base_url,
        timeout_secs = config.request_timeout.as_secs(),
        page_size = config.page_size.get(),
        max_retries = config.retry.max_retries,
        "Configuration loaded"
    );

    // Startup probe only; an unhealthy service still gets a chance per message.
    let probe = HttpTransport::new(&config.api_base_url, config.request_timeout)?;
    match probe.health_check().await {
        Ok(health) if health.status == "healthy" => {
            tracing::info!(status = %health.status, "Assistant service reachable");
        }
        Ok(health) => {
            tracing::warn!(status = %health.status, error = ?health.error, "Assistant service degraded");
        }
        Err(e) => tracing::warn!(error = %e, "Assistant service health check failed"),
    }

    let transport = build_transport(&config)?;
    let session = match &config.welcome_message {
        Some(text) => Session::with_welcome(config.page_size, text.clone()),
        None => Session::new(config.page_size),
    };
    let (handle, runtime_task) = SessionHandle::spawn(session, transport, Arc::new(TracingObserver));
    let typing = tokio::spawn(show_typing(handle.subscribe()));

    let initial = handle.snapshot();
    for turn in initial.turns() {
        print_turn(&initial, turn);
    }
    println!("(commands: :next, :prev, :page N, :quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Quit => break,
            Input::Page(target) => {
                let session = handle.snapshot();
                let Some(turn_id) = session.latest_turn_with_properties().map(|t| t.id) else {
                    println!("No property results to page through yet.");
                    continue;
                };
                if turn_page(&handle, turn_id, target).await? {
                    print_properties(&handle.snapshot(), turn_id);
                }
            }
            Input::Message(text) => match handle.submit(text).await? {
                SubmitOutcome::Delivered { reply_turn } | SubmitOutcome::Failed { reply_turn } => {
                    let session = handle.snapshot();
                    if let Some(turn) = session.turn(reply_turn) {
                        print_turn(&session, turn);
                    }
                    if let Some(notice) = session.notice() {
                        println!("! {notice}");
                    }
                }
                SubmitOutcome::Ignored(reason) => {
                    tracing::debug!(%reason, "Input ignored");
                }
            },
        }
    }

    drop(handle);
    typing.abort();
    runtime_task.await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageCommand {
    Next,
    Previous,
    To(usize),
}

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Page(PageCommand),
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    match trimmed {
        ":quit" | ":q" => Input::Quit,
        ":next" | ":n" => Input::Page(PageCommand::Next),
        ":prev" | ":p" => Input::Page(PageCommand::Previous),
        _ => match trimmed.strip_prefix(":page ").map(|n| n.trim().parse()) {
            Some(Ok(page)) => Input::Page(PageCommand::To(page)),
            // Anything else, including malformed commands, is sent as a message.
            _ => Input::Message(line),
        },
    }
}

async fn turn_page(
    handle: &SessionHandle,
    turn_id: TurnId,
    target: PageCommand,
) -> Result<bool, runtime::SessionClosed> {
    match target {
        PageCommand::Next => handle.next_page(turn_id).await,
        PageCommand::Previous => handle.previous_page(turn_id).await,
        PageCommand::To(page) => handle.set_page(turn_id, page).await,
    }
}

async fn show_typing(mut updates: watch::Receiver<Session>) {
    while updates.changed().await.is_ok() {
        if updates.borrow_and_update().has_pending_turn() {
            println!("EkoAssist is typing...");
        }
    }
}

fn print_turn(session: &Session, turn: &Turn) {
    let speaker = match turn.author {
        Author::User => "You",
        Author::Assistant => "EkoAssist",
    };
    println!("{speaker}: {}", turn.text);
    if !turn.properties.is_empty() {
        print_properties(session, turn.id);
    }
}

fn print_properties(session: &Session, turn_id: TurnId) {
    for property in session.visible_properties(turn_id) {
        let title = property.attribute_str("title").unwrap_or("(untitled)");
        println!("  [{}] {title}", property.id);
    }
    println!(
        "  page {} of {}",
        session.current_page(turn_id),
        session.total_pages(turn_id)
    );
}
