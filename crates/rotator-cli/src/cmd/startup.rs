use crate::app::Settings;
use anyhow::{Context, Result};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum StartupSubcommand {
    /// Launch avatar-rotator at login
    Enable,
    /// Stop launching at login
    Disable,
    /// Show whether launch at login is on
    Status,
}

pub fn run(settings: &Settings, subcommand: StartupSubcommand) -> Result<()> {
    let entry = settings.autostart()?;
    match subcommand {
        StartupSubcommand::Enable => {
            entry
                .set_enabled(true)
                .context("could not add auto-start entry")?;
            println!("Launch at login enabled ({})", entry.location());
        }
        StartupSubcommand::Disable => {
            entry
                .set_enabled(false)
                .context("could not remove auto-start entry")?;
            println!("Launch at login disabled");
        }
        StartupSubcommand::Status => {
            let state = if entry.is_enabled() { "enabled" } else { "disabled" };
            println!("{state} ({})", entry.location());
        }
    }
    Ok(())
}
