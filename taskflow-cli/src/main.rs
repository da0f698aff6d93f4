//! Main entry point for the TaskFlow CLI.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use client::{SessionManager, TaskApi};
use dotenv::dotenv;
use shared::config::ClientConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod commands;

use commands::tasks::TaskCommand;

/// TaskFlow CLI
#[derive(Parser, Debug)]
#[command(name = "taskflow")]
#[command(about = "Command-line client for the TaskFlow task manager", long_about = None)]
struct Cli {
    /// Path to the configuration file (YAML or JSON)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the configuration file and environment
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the TaskFlow CLI
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and store the session tokens
    Login {
        /// Account email; prompted for when omitted
        #[arg(long, short)]
        email: Option<String>,

        /// Read the password from the first line of stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },
    /// Forget the stored session
    Logout,
    /// Show whether a session is stored and where
    Status,
    /// Create a new account
    Register {
        /// Account email; prompted for when omitted
        #[arg(long, short)]
        email: Option<String>,
    },
    /// Work with tasks of the signed-in user
    Tasks {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell to generate the completion script for
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
    /// Generate a configuration file with default values
    Config {
        /// Format of the configuration file to generate (yaml or json)
        #[arg(long, short, default_value = "yaml")]
        format: String,

        /// Where to write the file; defaults to config.<format> in the current directory
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Completion { shell } => {
            commands::completion::generate_completion(shell);
            return Ok(());
        }
        Commands::Config { format, output } => {
            return commands::config::generate_config(&format, output.as_deref());
        }
        command => command,
    };

    let config = ClientConfig::load_config(cli.config.as_deref(), cli.api_url)
        .context("failed to load configuration")?;
    init_tracing(&config.log_level);

    let session = Arc::new(SessionManager::from_config(&config)?);
    session.initialize().with_context(|| {
        format!(
            "failed to read session from {}",
            config.session_path.display()
        )
    })?;

    let outcome = match command {
        Commands::Login {
            email,
            password_stdin,
        } => commands::session::login(&session, &config, email, password_stdin).await,
        Commands::Logout => {
            commands::session::logout(&session, &config);
            Ok(())
        }
        Commands::Status => {
            commands::session::status(&session, &config);
            Ok(())
        }
        Commands::Register { email } => commands::session::register(&session, email).await,
        Commands::Tasks { command } => {
            commands::tasks::run(&TaskApi::new(Arc::clone(&session)), command).await
        }
        Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
    };

    session.teardown();
    outcome
}

/// Logs go to stderr so command output stays pipeable. `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
