use anyhow::Result;
use clap::Parser;
use console::style;
use tracing::info;

use atlas_core::config::AtlasConfig;
use atlas_core::view::Snapshot;
use atlas_runtime::{CountryStore, DashboardServer, DashboardState, Database};

/// Run the countries dashboard.
#[derive(Parser)]
pub struct ServeCommand {
    /// Configuration file path. Environment variables are used when it is missing.
    #[arg(short, long, default_value = "atlas.toml")]
    pub config: String,

    /// Port to listen on (overrides config).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    pub host: Option<String>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(self, mut config: AtlasConfig) -> Result<()> {
        if let Some(port) = self.port {
            config.dashboard.port = port;
        }
        if let Some(host) = self.host {
            config.dashboard.host = host;
        }

        let db = Database::from_config(&config.database).await?;
        db.health_check().await?;
        info!("Connected to {}", db.target());
        let store = CountryStore::new(db.clone());

        // The table is read once; reload by restarting the server.
        let countries = store.fetch_all().await?;
        let snapshot = Snapshot::new(countries);
        info!(
            rows = snapshot.len(),
            regions = snapshot.regions().len(),
            "Loaded countries snapshot"
        );

        println!();
        println!(
            "  {} v{}",
            style(&config.dashboard.title).bold().cyan(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "  {} Listening on {}",
            style("→").dim(),
            style(format!(
                "http://{}:{}",
                config.dashboard.host, config.dashboard.port
            ))
            .cyan()
        );
        println!();

        let state = DashboardState::new(snapshot, store, config.dashboard.clone());
        let result = DashboardServer::new(config.dashboard, state).run().await;
        db.close().await;
        result?;

        Ok(())
    }
}
