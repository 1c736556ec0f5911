use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use powerwall2chords::chords::ChordsSender;
use powerwall2chords::config;
use powerwall2chords::driver::Driver;
use powerwall2chords::powerwall::{PowerwallClient, TelemetrySource};

#[derive(Parser)]
#[command(name = "powerwall2chords")]
#[command(about = "Forward averaged Powerwall telemetry to a CHORDS portal")]
#[command(version)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, env = "POWERWALL2CHORDS_CONFIG")]
    config: std::path::PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

/// Initialize the tracing subscriber. RUST_LOG wins when set; otherwise
/// `info`, or `debug` with --debug.
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(true))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    info!(config = %cli.config.display(), "starting powerwall2chords");
    let cfg = config::load_config_from_path(&cli.config)?;

    let tz: chrono_tz::Tz = cfg
        .tesla
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid timezone '{}': {}", cfg.tesla.timezone, e))?;

    // Credential files must be present and readable before the loop starts.
    let creds = config::load_credentials(&cfg.tesla.credentials_path, &cfg.tesla.owner_email)?;

    let client = PowerwallClient::new(&creds.site_host, creds.access_token)
        .context("failed to build powerwall client")?;

    let site = client
        .site_info()
        .await
        .context("powerwall unreachable at startup")?;
    info!(
        site_name = %site.site_name,
        version = %site.version,
        din = %site.din,
        uptime = %site.uptime,
        "connected to powerwall"
    );

    let sender = ChordsSender::new().context("failed to build chords sender")?;
    let _delivery = sender.start();

    let mut driver = Driver::new(client, &cfg, tz);
    driver.run(&sender).await;

    Ok(())
}
