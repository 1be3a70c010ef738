use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use staybook_core::Marketplace;

use crate::render::pluralize;

pub async fn run(market: &Marketplace) -> Result<()> {
    let expired = market.expire_pending_bookings(Utc::now()).await?;

    if expired.is_empty() {
        println!("No expired holds");
        return Ok(());
    }

    println!(
        "Cancelled {} expired {}",
        expired.len(),
        pluralize("hold", expired.len())
    );
    for id in &expired {
        println!("   {} {}", "-".red(), id.dimmed());
    }

    Ok(())
}
