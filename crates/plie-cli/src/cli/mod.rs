//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use plie_app::App;
use plie_core::config::{self, Config};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "plie")]
#[command(version)]
#[command(about = "Browse dance events from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log filter (trace, debug, info, warn, error); defaults to RUST_LOG, then warn
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password; prefer PLIE_PASSWORD, since the stdin prompt used
        /// when it is omitted echoes the input
        #[arg(long, env = "PLIE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out and remove the stored token
    Logout {
        /// Reset the local session even if the token file cannot be removed
        #[arg(long)]
        force: bool,
    },

    /// Show the current session status
    Status,

    /// Fetch and list events
    Events {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref());

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

/// Logs go to stderr so stdout stays clean for command output.
fn init_tracing(log_level: Option<&str>) {
    let mut rejected = None;
    let filter = log_level
        .and_then(|level| {
            EnvFilter::try_new(level)
                .inspect_err(|err| rejected = Some((level, err.to_string())))
                .ok()
        })
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Some((level, error)) = rejected {
        tracing::warn!(filter = level, %error, "invalid --log-level; using RUST_LOG or warn");
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    // default to the home screen
    let Some(command) = cli.command else {
        return commands::events::home(&load_app()?).await;
    };

    match command {
        Commands::Login { email, password } => {
            commands::auth::login(&load_app()?, &email, password).await
        }
        Commands::Logout { force } => commands::auth::logout(&load_app()?, force).await,
        Commands::Status => commands::auth::status(&load_app()?).await,
        Commands::Events { json } => commands::events::list(&load_app()?, json).await,

        // Config commands work without a valid config file.
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}

fn load_app() -> Result<App> {
    let config_path = config::paths::config_path();
    let config = Config::load_from(&config_path).context("load config")?;
    tracing::debug!(path = %config_path.display(), base_url = %config.api.base_url, "config loaded");
    App::new(&config).context("initialize client")
}
