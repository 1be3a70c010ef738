use anyhow::Result;
use owo_colors::OwoColorize;
use staybook_core::Marketplace;

use super::create_spinner;
use crate::render::Render;

pub async fn run(market: &Marketplace, only: Option<&str>) -> Result<()> {
    let properties = match only {
        Some(id) => vec![market.property(id).await?],
        None => market.properties(true).await?,
    };

    for (i, property) in properties.iter().enumerate() {
        let spinner = create_spinner(property.render());
        let result = market.refresh_property(&property.id).await;
        spinner.finish_and_clear();

        println!("{}", property.render());
        match result {
            Ok(report) => println!("{}", report.render()),
            Err(e) => println!("   {}", e.to_string().red()),
        }

        // Add spacing between properties (but not after the last one)
        if i + 1 < properties.len() {
            println!();
        }
    }

    Ok(())
}
