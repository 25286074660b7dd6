//! Main entry point for the order tracker service.
//!
//! Loads the configuration, opens the durable log and the order store on
//! top of it, and serves the HTTP API until interrupted.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracker_config::Config;
use tracker_core::StoreBuilder;
use tracker_service::{start_server, AppState};

/// Command-line arguments for the order tracker service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started order tracker");

	let config = Config::from_file(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let factories: std::collections::HashMap<_, _> = tracker_storage::get_all_implementations()
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect();

	let store = StoreBuilder::new(config.clone())
		.build(&factories)
		.await
		.inspect_err(|e| tracing::error!(error = %e, "Failed to open order store"))?;

	let state = AppState {
		store: Arc::new(store),
		service_id: config.service.id.clone(),
	};
	start_server(config.api, state).await?;

	tracing::info!("Stopped order tracker");
	Ok(())
}
