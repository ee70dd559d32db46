//! Terminal front end for the rental assistant.
//!
//! Commands: `/restart`, `/yes`, `/no`, `/cancel`, `/quit`. `#<n>` picks the
//! n-th option or result item; any other line is sent as text. In the
//! feedback step, plain text is submitted as feedback.

use std::error::Error;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use rental_assistant::adapters::dialogue::{HttpDialogueTransport, HttpTransportConfig};
use rental_assistant::adapters::pacing;
use rental_assistant::application::{AssistantEngine, EngineError, EngineSnapshot, TurnOutcome};
use rental_assistant::config::AppConfig;
use rental_assistant::domain::conversation::InteractionMode;
use rental_assistant::domain::satisfaction::SatisfactionState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    rental_assistant::logging::init(&config.logging)?;

    let transport = HttpDialogueTransport::new(HttpTransportConfig::from(&config.dialogue))?;
    let engine = AssistantEngine::new(Arc::new(transport), pacing::from_config(&config.pacing))
        .with_user_agent(config.dialogue.user_agent.clone());

    tracing::info!(base_url = %config.dialogue.base_url, "starting assistant");
    let mut updates = engine.subscribe();
    tokio::spawn(async move {
        let mut typing = false;
        while updates.changed().await.is_ok() {
            let is_typing = updates.borrow_and_update().is_typing;
            if is_typing && !typing {
                println!("  assistant is typing...");
            }
            typing = is_typing;
        }
    });

    let mut rendered = 0;
    report(engine.start(None).await, &mut rendered);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let snapshot = engine.snapshot();
        let outcome = match line {
            "/quit" => break,
            "/restart" => engine.restart().await,
            "/yes" => engine.choose_satisfied().await,
            "/no" => engine.choose_unsatisfied(),
            "/cancel" => engine.cancel_feedback(),
            _ if snapshot.satisfaction_state() == Some(SatisfactionState::AwaitingFeedback) => {
                engine.submit_feedback(line).await
            }
            _ => match line.strip_prefix('#').and_then(|n| n.parse::<usize>().ok()) {
                Some(n) => pick(&engine, &snapshot.mode, n).await,
                None if snapshot.session.is_none() => engine.start(None).await,
                None => engine.respond(line).await,
            },
        };
        report(outcome, &mut rendered);
    }

    Ok(())
}

async fn pick(
    engine: &AssistantEngine,
    mode: &InteractionMode,
    n: usize,
) -> Result<TurnOutcome, EngineError> {
    let index = n.saturating_sub(1);
    let option = match mode {
        InteractionMode::Results { items, options } => match items.get(index) {
            Some(item) => return engine.select_item(item.id()).await,
            None => options.get(index - items.len()),
        },
        _ => mode.options().get(index),
    };
    match option {
        Some(option) => engine.respond(option).await,
        None => engine.respond(&format!("#{}", n)).await,
    }
}

fn report(outcome: Result<TurnOutcome, EngineError>, rendered: &mut usize) {
    match outcome {
        Ok(TurnOutcome::Applied(snapshot)) => render(&snapshot, rendered),
        Ok(TurnOutcome::Ignored(reason)) => println!("  ({})", reason),
        Err(e) if e.is_retryable() => println!("  ! {} (try again)", e),
        Err(e) => println!("  ! {}", e),
    }
}

fn render(snapshot: &EngineSnapshot, rendered: &mut usize) {
    for turn in snapshot.turns.iter().skip(*rendered) {
        let who = if turn.is_bot() { "assistant" } else { "you" };
        if let Some(content) = turn.content() {
            println!("{:>9}: {}", who, content);
        }
    }
    *rendered = snapshot.turns.len();

    match &snapshot.mode {
        InteractionMode::Choice { options } => list(options, 0),
        InteractionMode::Results { items, options } => {
            for (i, item) in items.iter().enumerate() {
                let title = item.attribute_str("title").unwrap_or(item.id());
                println!("  #{} {}", i + 1, title);
            }
            list(options, items.len());
        }
        InteractionMode::FreeText { hint: Some(hint) } => println!("  (expecting {})", hint),
        InteractionMode::Informational { .. } => println!("  (/restart to begin again)"),
        InteractionMode::Terminal => match snapshot.satisfaction_state() {
            Some(SatisfactionState::AwaitingChoice) => println!("  Were you satisfied? /yes or /no"),
            Some(SatisfactionState::AwaitingFeedback) => {
                println!("  Tell us what went wrong (/cancel to go back)")
            }
            _ => println!("  (/restart to begin again)"),
        },
        InteractionMode::FreeText { hint: None } | InteractionMode::Blocked => {}
    }
}

fn list(options: &[String], offset: usize) {
    for (i, option) in options.iter().enumerate() {
        println!("  #{} {}", offset + i + 1, option);
    }
}
