use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use staybook_core::Marketplace;

use crate::render::{Render, compact_dates, pluralize};

pub async fn run(
    market: &Marketplace,
    property_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    let property = market.property(property_id).await?;
    let dates = market.available_dates(property_id, from, to).await?;

    println!("{}", property.render());
    if dates.is_empty() {
        println!("   {}", "No bookable nights in range".yellow());
        return Ok(());
    }

    println!(
        "   {} bookable {}",
        dates.len(),
        pluralize("night", dates.len())
    );
    println!("   {}", compact_dates(&dates));

    Ok(())
}
