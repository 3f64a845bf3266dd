use clap::Parser;
use sporeworld::{
    Hub, config,
    db::{
        Db,
        repo::{MemoryRepository, PlayerRepository, UserRepository},
    },
    net::http,
    services::AccountService,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "sporeworld", about = "Real-time multiplayer spore game server")]
struct Args {
    /// Env file read before PORT and DATA_PATH are resolved
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// TOML config file; replaces the environment based configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep accounts in memory instead of the SQLite store
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => config::Config::load(path)?,
        None => config::Config::from_env(&args.env_file)?,
    };
    tracing::info!(port = cfg.port, data_path = %cfg.data_path.display(), "configuration loaded");

    let accounts = if args.ephemeral {
        tracing::warn!("running with an in-memory account store, nothing will be persisted");
        let repo = Arc::new(MemoryRepository::new());
        AccountService::new(repo.clone(), repo)
    } else {
        let db = Arc::new(Db::open(&cfg.data_path).await?);
        db.init().await?;
        AccountService::new(
            Arc::new(UserRepository::new(db.clone())),
            Arc::new(PlayerRepository::new(db)),
        )
    };

    let shutdown = CancellationToken::new();
    let (hub, hub_loop) = Hub::new(Arc::new(accounts), cfg.world.clone());
    let hub_jh = tokio::spawn(hub_loop.run(shutdown.clone()));

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            return;
        }
        tracing::info!("shutdown requested");
        signal_token.cancel();
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let served = http::serve(addr, hub, shutdown.clone()).await;
    shutdown.cancel();

    if let Err(e) = hub_jh.await {
        tracing::error!(error = %e, "hub task failed");
    }

    served?;
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().map_err(|e| anyhow::anyhow!("cannot install error hooks: {e}"))?;

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;

    Ok(())
}
