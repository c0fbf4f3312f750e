use anyhow::Result;
use clap::Parser;
use console::style;
use tracing::{error, info};

use atlas_core::config::AtlasConfig;
use atlas_runtime::{CountryLoader, CountryStore, Database};

/// Fetch all countries and replace the countries table.
#[derive(Parser)]
pub struct LoadCommand {
    /// Configuration file path. Environment variables are used when it is missing.
    #[arg(short, long, default_value = "atlas.toml")]
    pub config: String,

    /// Fetch and normalize only; leave the database untouched.
    #[arg(long)]
    pub dry_run: bool,
}

impl LoadCommand {
    /// Execute the load command.
    pub async fn execute(self, config: AtlasConfig) -> Result<()> {
        if let Err(e) = self.run(config).await {
            error!("Error in pipeline: {}", e);
            return Err(e);
        }
        Ok(())
    }

    async fn run(&self, config: AtlasConfig) -> Result<()> {
        let loader = CountryLoader::new(config.source.clone())?;

        if self.dry_run {
            let report = loader.dry_run().await?;
            info!(fetched = report.fetched, "Dry run complete");
            println!(
                "  {} Fetched {} countries (dry run, nothing written)",
                style("✓").green(),
                report.fetched
            );
            return Ok(());
        }

        let db = Database::from_config(&config.database).await?;
        let store = CountryStore::new(db.clone());
        let result = loader.run(&store).await;
        db.close().await;
        let report = result?;

        info!(
            fetched = report.fetched,
            written = ?report.written,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Load complete"
        );
        println!(
            "Successfully loaded {} countries to database!",
            report.written.unwrap_or_default()
        );

        Ok(())
    }
}
