//! Init container binary

use clap::Parser;
use galera_init::cluster::KubeClusterClient;
use galera_init::common::{InitConfig, PodEnvironment, ProcessEnv};
use galera_init::galera::FileManager;
use galera_init::init::{install_signal_handlers, InitContext, InitStep, Initializer, Shutdown};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "galera-init")]
#[command(about = "Init container for Galera that co-operates with mariadb-operator")]
#[command(version)]
struct Args {
    /// The directory that contains MariaDB configuration files
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// The directory that contains MariaDB state files
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match InitConfig::load(args.config.as_deref())
        .and_then(|c| c.with_overrides(args.config_dir, args.state_dir, args.log_level))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: InitConfig) -> anyhow::Result<()> {
    tracing::info!(
        config_dir = %config.config_dir.display(),
        state_dir = %config.state_dir.display(),
        "Starting galera-init {}",
        galera_init::VERSION
    );

    let env = PodEnvironment::resolve(&ProcessEnv).map_err(|e| e.in_step(InitStep::ResolveEnv))?;

    let shutdown = Shutdown::new();
    let _signals = install_signal_handlers(shutdown.clone())?;

    let files = Arc::new(FileManager::new(&config.config_dir, &config.state_dir));
    let client = KubeClusterClient::try_default()
        .await
        .map_err(|e| e.in_step(InitStep::ConnectCluster))?;

    let ctx = InitContext::new(env, files, Arc::new(client)).with_shutdown(shutdown);
    let outcome = Initializer::new(ctx).run().await?;
    tracing::debug!(?outcome, "Init finished");

    Ok(())
}
