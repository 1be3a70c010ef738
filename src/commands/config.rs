use anyhow::Result;
use owo_colors::OwoColorize;
use staybook_core::StaybookConfig;

pub fn run(config: &StaybookConfig) -> Result<()> {
    let config_path = StaybookConfig::config_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:  {}", config_path.display());
    println!("  Data:    {}", config.data_path().display());

    println!("\n{}", "Server".bold());
    println!("  Bind:           {}", config.server.bind);
    println!("  Admin token:    {}", set_or_unset(config.server.admin_token.is_some()));
    println!("  Webhook secret: {}", set_or_unset(config.server.webhook_secret.is_some()));

    println!("\n{}", "Bookings".bold());
    println!("  Hold TTL:      {}", humantime::format_duration(config.booking.hold_ttl));
    println!("  Currency:      {}", config.booking.currency);
    println!("  Feed refresh:  every {}", humantime::format_duration(config.availability.refresh_interval));

    Ok(())
}

fn set_or_unset(set: bool) -> String {
    if set {
        "set".green().to_string()
    } else {
        "not set".yellow().to_string()
    }
}
