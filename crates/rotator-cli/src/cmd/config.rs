use crate::app::Settings;
use crate::output::{print_json, print_table};
use anyhow::{Context, Result};
use clap::Subcommand;
use rotator_core::Config;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective config with the cookie masked
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the config file path
    Path,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(settings: &Settings, subcommand: ConfigSubcommand) -> Result<()> {
    let store = settings.store()?;
    match subcommand {
        ConfigSubcommand::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
        ConfigSubcommand::Show { json } => {
            let config = store
                .load()
                .with_context(|| format!("could not read {}", store.path().display()))?;
            show(&config, json)
        }
    }
}

fn show(config: &Config, json: bool) -> Result<()> {
    if json {
        return print_json(&serde_json::json!({
            "cookie": config.masked_cookie(),
            "outfits": config.outfits,
            "interval": config.interval,
            "ready": config.is_ready(),
        }));
    }

    let cookie = if config.cookie.is_empty() {
        "(not set)".to_string()
    } else {
        config.masked_cookie()
    };
    println!("cookie:    {cookie}");
    println!("interval:  {}s", config.interval);
    println!("ready:     {}", if config.is_ready() { "yes" } else { "no" });
    println!();
    if config.outfits.is_empty() {
        println!("No outfits selected.");
        return Ok(());
    }
    let rows = config
        .outfits
        .iter()
        .enumerate()
        .map(|(i, o)| vec![(i + 1).to_string(), o.id.to_string(), o.name.clone()])
        .collect();
    print_table(&["#", "ID", "NAME"], rows);
    Ok(())
}
