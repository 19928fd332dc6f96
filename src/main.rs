use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sales_loader::{
    config::Config,
    database::Database,
    ingestor::RefreshService,
    models::RefreshTrigger,
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "sales-loader")]
#[command(version)]
#[command(about = "Loads a sales CSV into SQLite and serves revenue aggregates")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Sales CSV file (overrides config file)
    #[arg(short, long, value_name = "FILE")]
    source: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Run a single refresh and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("sales_loader={},tower_http=trace", cli.log_level)
    } else {
        format!("sales_loader={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sales Loader v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config.display());

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }
    if let Some(source) = cli.source {
        config.source.csv_path = source;
    }

    info!("Using database: {}", config.database.url);
    info!("Using source: {}", config.source.csv_path.display());

    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database connection established and migrations applied");

    let refresh = RefreshService::new(database.clone(), &config)?;

    if cli.once {
        let summary = refresh.refresh(RefreshTrigger::Manual).await?;
        info!(
            "Refresh complete: {} rows, {} loaded, {} skipped",
            summary.rows, summary.loaded, summary.skipped
        );
        return Ok(());
    }

    if config.ingestion.refresh_on_startup {
        refresh.refresh(RefreshTrigger::Startup).await?;
    }

    let web_server = WebServer::new(config, database, refresh)?;

    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}
