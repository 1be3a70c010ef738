use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use staybook_core::Marketplace;

pub async fn run(market: &Marketplace, property_id: &str, output: Option<&Path>) -> Result<()> {
    let ics = market.export_calendar(property_id).await?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &ics)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
        None => print!("{ics}"),
    }

    Ok(())
}
