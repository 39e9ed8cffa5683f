// CLI module - Operator-facing command-line interface

pub mod commands;
pub mod editor;
pub mod output;

use crate::config::Config;
use crate::error::{Result, WardenError};
use crate::logging;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Warden - Keeps a single web server process alive and on the right version
#[derive(Parser)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project directory holding the supervised application
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Commands {
    /// Start the supervisor (default)
    Start,

    /// Check whether the server is up
    Status,

    /// Print the current version
    Version,

    /// Request a version change
    Patch {
        /// New version in x.y.z format
        version: Option<String>,
    },

    /// Create a default env file
    Env,

    /// Open the interactive settings editor
    Edit,

    /// List the API endpoints
    Api,
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    /// Execute the parsed command
    async fn execute(&self) -> Result<()> {
        let project_dir = match &self.project_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let config = Config::load(&project_dir)?;
        let command = self.command.clone().unwrap_or(Commands::Start);

        let _guard = if command == Commands::Start {
            Some(logging::init_supervisor(&config.log_dir())?)
        } else {
            logging::init_cli();
            None
        };

        // Operator input is rejected before the workspace is touched
        if let Commands::Patch { version } = &command {
            commands::parse_requested_version(version.as_deref())?;
        }

        config.prepare_workspace()?;

        match command {
            Commands::Start => {
                output::print_info("Starting supervisor...");
                commands::start_supervisor(&config).await
            }
            Commands::Status => {
                if commands::check_status(&config).await? {
                    Ok(())
                } else {
                    Err(WardenError::Other("Server is not healthy".to_string()))
                }
            }
            Commands::Version => {
                println!("Current version: {}", commands::current_version(&config));
                Ok(())
            }
            Commands::Patch { version } => commands::patch_version(&config, version.as_deref()),
            Commands::Env => commands::create_env_file(&config).map(|_| ()),
            Commands::Edit => {
                let stdin = std::io::stdin();
                let mut editor =
                    editor::SettingsEditor::new(&config, stdin.lock(), std::io::stdout())?;
                editor.main_menu().await
            }
            Commands::Api => commands::show_endpoints(&config),
        }
    }
}
