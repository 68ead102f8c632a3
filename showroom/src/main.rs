//! Terminal showroom
//!
//! Talk to the showroom agent from a terminal. Every reply is classified into a
//! navigation intent and applied to the showroom view, which is printed after
//! each turn.
//!
//! ## Usage
//!
//! ```bash
//! export ANTHROPIC_API_KEY="your-key-here"
//! cargo run --bin showroom
//! ```
//!
//! Commands: `/state`, `/reset`, `quit`.

use anyhow::Context;
use showroom::agent::{AnthropicClassifier, format_eur};
use showroom::catalog::ApartmentLocation;
use showroom::config::ShowroomConfig;
use showroom::intent::Intent;
use showroom::session::{SessionSettings, ShowroomSession};
use showroom::{Catalog, RoomType, ShowroomState};
use showroom_anthropic::AnthropicClient;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_CATALOG: &str = include_str!("../data/demo_catalog.json");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = ShowroomConfig::from_env().context("invalid showroom configuration")?;
    init_tracing(&config.observability.log_level);

    let catalog = match &config.project.catalog_path {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => Catalog::from_json_str(DEMO_CATALOG).context("bundled demo catalog is invalid")?,
    };
    info!(
        environment = %config.environment,
        apartments = catalog.apartments().len(),
        "Starting showroom"
    );

    let client = AnthropicClient::from_env().context("ANTHROPIC_API_KEY is not set")?;
    let classifier = AnthropicClassifier::new(client)
        .with_model(config.llm.model.clone())
        .with_max_tokens(config.llm.max_tokens);

    let session = ShowroomSession::new(
        Arc::new(catalog),
        classifier,
        SessionSettings::from(&config),
    );
    session.start().await?;
    print_latest_reply(&session).await;

    let stdin = io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            "quit" | "exit" => break,
            "/state" => print_state(&session.showroom().state(ShowroomState::clone).await),
            "/reset" => {
                session.reset().await?;
                print_latest_reply(&session).await;
            },
            text => match session.handle_user_message(text).await {
                Ok(outcome) => {
                    if !outcome.reply.is_empty() {
                        println!("\nGuide: {}", outcome.reply);
                    }
                    if let Ok(Intent::ListAvailable { filter }) = &outcome.intent {
                        for location in session.catalog().available() {
                            if filter.matches(location.apartment) {
                                println!("  {}", listing_line(&location));
                            }
                        }
                    }
                    if let Some(action) = &outcome.dispatched {
                        println!("  -> {action:?}");
                    }
                    print_state(&session.showroom().state(ShowroomState::clone).await);
                },
                Err(showroom::SessionError::EmptyMessage) => {},
                Err(e) => eprintln!("\nError: {e}"),
            },
        }
        prompt()?;
    }

    session.shutdown(Duration::from_secs(2)).await?;
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn prompt() -> io::Result<()> {
    print!("\nYou: ");
    io::stdout().flush()
}

async fn print_latest_reply<C: showroom::agent::Classifier>(session: &ShowroomSession<C>) {
    let welcome = session
        .conversation()
        .state(|c| c.latest_assistant().map(|m| m.content.clone()))
        .await;
    if let Some(text) = welcome {
        println!("Guide: {text}");
    }
}

fn listing_line(location: &ApartmentLocation<'_>) -> String {
    let apartment = location.apartment;
    format!(
        "{} | {} | {} m² | €{} | {}",
        apartment.code,
        apartment.type_label,
        apartment.area_m2,
        format_eur(apartment.price_eur),
        location.floor.name
    )
}

fn print_state(state: &ShowroomState) {
    println!(
        "  [view: {} | facade: {} | apartment: {} | room: {}{}]",
        state.current_view,
        state.current_facade,
        state.selected_apartment_id.as_deref().unwrap_or("-"),
        state.selected_room.map_or("-", RoomType::as_str),
        if state.is_transitioning() { " | moving" } else { "" },
    );
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;

    #[test]
    fn test_listing_groups_price_like_the_prompt() {
        let catalog = Catalog::from_json_str(DEMO_CATALOG).unwrap();
        let location = catalog.locate("A12").unwrap();

        assert_eq!(
            listing_line(&location),
            "A12 | Two-bedroom | 68.5 m² | €171.935 | Floor 1"
        );
    }
}
