mod load;
mod serve;

pub use load::LoadCommand;
pub use serve::ServeCommand;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use atlas_core::config::{AtlasConfig, LoggingConfig};

/// Atlas - load world countries into PostgreSQL and explore them.
#[derive(Parser)]
#[command(name = "atlas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch all countries and replace the countries table.
    Load(LoadCommand),

    /// Run the countries dashboard.
    Serve(ServeCommand),
}

impl Commands {
    fn config_path(&self) -> &str {
        match self {
            Commands::Load(cmd) => &cmd.config,
            Commands::Serve(cmd) => &cmd.config,
        }
    }
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        dotenvy::dotenv().ok();

        let loaded = load_config(self.command.config_path());
        let logging = loaded
            .as_ref()
            .map(|c| c.logging.clone())
            .unwrap_or_default();
        init_logging(&logging, self.verbose);
        let config = match loaded {
            Ok(config) => config,
            Err(e) => {
                if matches!(self.command, Commands::Load(_)) {
                    error!("Error in pipeline: {}", e);
                }
                return Err(e);
            }
        };

        match self.command {
            Commands::Load(cmd) => cmd.execute(config).await,
            Commands::Serve(cmd) => cmd.execute(config).await,
        }
    }
}

/// Read the config file, or fall back to the environment when it is absent.
pub fn load_config(path: &str) -> Result<AtlasConfig> {
    if Path::new(path).exists() {
        return Ok(AtlasConfig::from_file(path)?);
    }
    Ok(AtlasConfig::from_env()?)
}

fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
