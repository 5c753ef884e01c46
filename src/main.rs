use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use urlrank::config::ConfigLoader;
use urlrank::downloader::{BatchScheduler, HttpFetcher, WorkerPool};
use urlrank::metrics::MetricsCollector;
use urlrank::server::{self, AppState};
use urlrank::store::RankingStore;

#[derive(Parser)]
#[command(name = "urlrank")]
#[command(version = "0.1.0")]
#[command(about = "URL liveness tracking daemon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon from a config file
    Run {
        /// Path to the configuration file (JSON/YAML/TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config } => {
            log::info!("Loading config from {:?}", config);
            let config = ConfigLoader::load(&config)?;
            let addr: SocketAddr = config.listen_addr.parse()?;

            let store = RankingStore::spawn();
            let metrics = MetricsCollector::new();
            let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(
                config.fetch_timeout_secs,
            ))?);
            let pool = WorkerPool::spawn(
                config.pool_size,
                config.queue_capacity,
                fetcher,
                store.clone(),
                metrics,
            );
            let scheduler =
                BatchScheduler::new(store.clone(), pool.clone(), &config.batch)?.spawn();

            let state = AppState {
                store: store.clone(),
                pool: pool.clone(),
            };
            server::serve(state, addr, shutdown_signal()).await?;

            // Shutdown order matters: no new submissions (server already
            // stopped), stop scheduling rounds, drain the pool so every
            // accepted outcome reaches the store, then stop the store.
            log::info!("Shutting down...");
            scheduler.abort();
            pool.shutdown().await;
            store.shutdown().await;
        }
        Commands::Check { config } => match ConfigLoader::load(&config) {
            Ok(cfg) => {
                println!("Config is valid:");
                println!("   Pool size: {}", cfg.pool_size);
                println!("   Queue capacity: {}", cfg.queue_capacity);
                println!("   Listen addr: {}", cfg.listen_addr);
                println!(
                    "   Batch: every {}s, top {} by {}",
                    cfg.batch.interval_secs, cfg.batch.top_n, cfg.batch.order
                );
            }
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", e);
    }
}
