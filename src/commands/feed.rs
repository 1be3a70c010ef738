use anyhow::Result;
use owo_colors::OwoColorize;
use staybook_core::Marketplace;

use super::create_spinner;
use crate::render::{Render, pluralize};

pub async fn run(market: &Marketplace, url: &str) -> Result<()> {
    let spinner = create_spinner(format!("Fetching {url}"));
    let result = market.preview_feed(url).await;
    spinner.finish_and_clear();

    let events = result?;
    let blocking = events.iter().filter(|e| e.blocks()).count();
    println!(
        "{} {} ({} blocking)",
        events.len().bold(),
        pluralize("event", events.len()),
        blocking
    );
    for event in &events {
        println!("{}", event.render());
    }

    Ok(())
}
