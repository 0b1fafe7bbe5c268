mod app;
mod cmd;
mod logging;
mod notify;
mod output;
#[cfg(target_os = "linux")]
mod tray;

use app::Settings;
use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, startup::StartupSubcommand};
use rotator_core::paths::DEFAULT_PORT;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "avatar-rotator",
    about = "Rotate your avatar through saved outfits on a timer",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: <config dir>/avatar-rotator/config.json)
    #[arg(long, global = true, env = "AVATAR_ROTATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log file, truncated at launch (default: <data dir>/avatar-rotator/rotator.log)
    #[arg(long, global = true, env = "AVATAR_ROTATOR_LOG")]
    log_file: Option<PathBuf>,

    /// Port for the local settings page
    #[arg(long, global = true, env = "AVATAR_ROTATOR_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory for the auto-start desktop entry instead of the platform location
    #[arg(long, global = true, env = "AVATAR_ROTATOR_AUTOSTART_DIR", hide = true)]
    autostart_dir: Option<PathBuf>,

    /// Base URL serving both the users and avatar APIs
    #[arg(long, global = true, env = "AVATAR_ROTATOR_API_BASE", hide = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run with a tray icon (the default)
    Run,

    /// Run without a tray: rotation plus the settings page
    Serve {
        /// Open the settings page in the browser
        #[arg(long)]
        open: bool,
        /// Do not start rotating even if the config is ready
        #[arg(long)]
        no_rotate: bool,
    },

    /// List the avatar outfits a cookie can see
    Outfits {
        /// Session cookie (default: the saved one)
        #[arg(long, env = "AVATAR_ROTATOR_COOKIE", hide_env_values = true)]
        cookie: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect the saved configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Manage launch at login
    Startup {
        #[command(subcommand)]
        subcommand: StartupSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();
    let settings = Settings {
        config: cli.config,
        log_file: cli.log_file,
        port: cli.port,
        autostart_dir: cli.autostart_dir,
        api_base: cli.api_base,
    };
    let command = cli.command.unwrap_or(Commands::Run);

    match &command {
        Commands::Run | Commands::Serve { .. } => {
            logging::init(tracing::Level::INFO, settings.log_path().as_deref(), false)
        }
        _ => logging::init(tracing::Level::WARN, None, true),
    }

    let result = match command {
        Commands::Run => cmd::run::run(settings),
        Commands::Serve { open, no_rotate } => cmd::serve::run(settings, open, no_rotate),
        Commands::Outfits { cookie, json } => cmd::outfits::run(&settings, cookie, json),
        Commands::Config { subcommand } => cmd::config::run(&settings, subcommand),
        Commands::Startup { subcommand } => cmd::startup::run(&settings, subcommand),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
