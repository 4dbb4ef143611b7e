//! corepoold — the core-pool governor daemon.
//!
//! Single binary that assembles the subsystems:
//! - sysfs CPU hotplug driver + loadavg observer
//! - load accumulator
//! - decision engine (the periodic governor tick)
//! - lifecycle & power-state coordinator
//! - REST settings/stats API
//!
//! # Usage
//!
//! ```text
//! corepoold run --port 8660 --config /etc/corepool.toml
//! ```

mod sys;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::{Mutex, watch};
use tracing::info;

use corepool_api::{ApiState, build_router};
use corepool_governor::{
    Coordinator, Governor, GovernorState, LoadAccumulator, PowerEventBus, UnitDriver,
};
use corepool_state::{CorepoolConfig, Pool, shared_params};

use crate::sys::{DEFAULT_CPU_ROOT, DEFAULT_LOADAVG_PATH, SysfsUnitDriver};

#[derive(Parser)]
#[command(name = "corepoold", about = "Adaptive CPU-core pool governor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the governor and its API server.
    Run {
        /// Port the API listens on.
        #[arg(long, default_value = "8660")]
        port: u16,

        /// Optional corepool.toml path.
        #[arg(long)]
        config: Option<PathBuf>,

        /// sysfs CPU device root.
        #[arg(long, default_value = DEFAULT_CPU_ROOT)]
        cpu_root: PathBuf,

        /// Load-average file fed into the sampler.
        #[arg(long, default_value = DEFAULT_LOADAVG_PATH)]
        loadavg: PathBuf,

        /// Override the detected unit count.
        #[arg(long)]
        units: Option<u32>,

        /// Delay before the first tick after enable, in milliseconds.
        #[arg(long, default_value = "20000")]
        start_delay_ms: u64,

        /// Start with the governor disabled (enable later via the API).
        #[arg(long)]
        start_disabled: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,corepoold=debug,corepool=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            port,
            config,
            cpu_root,
            loadavg,
            units,
            start_delay_ms,
            start_disabled,
        } => {
            run(
                port,
                config,
                cpu_root,
                loadavg,
                units,
                start_delay_ms,
                start_disabled,
            )
            .await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run(
    port: u16,
    config_path: Option<PathBuf>,
    cpu_root: PathBuf,
    loadavg: PathBuf,
    units: Option<u32>,
    start_delay_ms: u64,
    start_disabled: bool,
) -> anyhow::Result<()> {
    info!("corepool governor starting");

    let config = match &config_path {
        Some(path) => CorepoolConfig::from_file(path)?,
        None => CorepoolConfig::default(),
    };

    // ── Initialize subsystems ──────────────────────────────────

    let driver = Arc::new(SysfsUnitDriver::new(&cpu_root));
    let capacity = units
        .or_else(|| config.pool.as_ref().and_then(|p| p.units))
        .map_or_else(|| driver.detect_units(), Ok)?;
    info!(capacity, root = %cpu_root.display(), "unit driver initialized");

    let params = shared_params(config.params_for(capacity));
    let accumulator = Arc::new(LoadAccumulator::new());
    let state = Arc::new(Mutex::new(GovernorState::new(Pool::new(capacity))));

    let governor = Arc::new(Governor::new(
        params.clone(),
        state.clone(),
        accumulator.clone(),
        driver.clone() as Arc<dyn UnitDriver>,
    ));
    let coordinator = Arc::new(
        Coordinator::new(governor, params.clone(), driver)
            .with_start_delay(Duration::from_millis(start_delay_ms)),
    );
    info!("governor initialized");

    let power = PowerEventBus::new();
    let power_subscription = coordinator.attach_power_events(&power);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Background tasks ───────────────────────────────────────

    let feeder_interval = Duration::from_millis(params.read().await.poll_interval_ms);
    let feeder_handle = tokio::spawn(sys::run_loadavg_feeder(
        loadavg,
        accumulator,
        feeder_interval,
        shutdown_rx,
    ));

    if !start_disabled {
        coordinator.enable().await;
    }

    // ── API server ─────────────────────────────────────────────

    let router = build_router(ApiState {
        params,
        governor: state,
        coordinator: coordinator.clone(),
        power,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // ── Teardown ───────────────────────────────────────────────

    power_subscription.detach().await;
    coordinator.shutdown().await;
    let _ = feeder_handle.await;

    info!("corepool governor stopped");
    Ok(())
}
