use anyhow::Result;
use owo_colors::OwoColorize;
use staybook_core::Marketplace;

use crate::render::{Render, pluralize};

pub async fn run(market: &Marketplace) -> Result<()> {
    let properties = market.properties(true).await?;

    if properties.is_empty() {
        println!("No properties yet. Create one through the API: POST /properties");
        return Ok(());
    }

    for property in &properties {
        println!("{}", property.render());

        let nights = property.available_dates.len();
        let refreshed = property
            .last_refreshed_at
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "   {} {} bookable, {} {}, refreshed {}",
            nights,
            pluralize("night", nights),
            property.ical_urls.len(),
            pluralize("feed", property.ical_urls.len()),
            refreshed.dimmed()
        );
    }

    Ok(())
}
