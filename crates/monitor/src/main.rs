use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use swarmwatch_core::{
    load_config, load_config_from_env, validate_config, Config, CycleError, CycleRunner,
    CycleSettings, JsonStateStore, QBittorrentClient, StateStore, TorrentClient,
};
use swarmwatch_monitor::{
    api::create_router,
    metrics::{LAST_CYCLE_SUCCESS, LAST_CYCLE_TIMESTAMP},
    state::AppState,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file used when `SWARMWATCH_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();
    info!("swarmwatch {} starting", VERSION);

    let config = load_configuration()?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("qBittorrent URL: {}", config.qbittorrent.url);
    info!("State file: {:?}", config.state.path);
    info!(
        "Thresholds: critical<={}, rare<={}, low<={}",
        config.thresholds.critical_seeders,
        config.thresholds.rare_seeders,
        config.thresholds.low_seeders
    );
    info!(
        "Check interval: {} days, run interval: {} hours",
        config.schedule.check_interval_days, config.schedule.run_interval_hours
    );

    let run_interval = Duration::try_from_secs_f64(config.schedule.run_interval_hours * 3600.0)
        .context("run_interval_hours is out of range")?;

    // Shutdown is observed two ways: the runner polls the flag between
    // torrents, everything that sleeps waits on the watch channel.
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    {
        let flag = Arc::clone(&shutdown_flag);
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            flag.store(true, Ordering::SeqCst);
            let _ = shutdown_tx.send(true);
        });
    }

    let store: Arc<dyn StateStore> = Arc::new(JsonStateStore::new(config.state.path.clone()));

    info!("Initializing qBittorrent client at {}", config.qbittorrent.url);
    let client: Arc<dyn TorrentClient> = Arc::new(
        QBittorrentClient::new(config.qbittorrent.clone())
            .context("Failed to create qBittorrent client")?,
    );

    let app_state = Arc::new(AppState::new(config.clone(), Arc::clone(&store)));

    // Bind before the startup delay so a port clash fails fast.
    let server = if config.http.enabled {
        let addr = SocketAddr::new(config.http.host, config.http.port);
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        info!("Starting status server on {}", addr);
        Some(tokio::spawn(serve(
            listener,
            Arc::clone(&app_state),
            shutdown_rx.clone(),
        )))
    } else {
        info!("Status server disabled in config");
        None
    };

    let runner = CycleRunner::new(client, store, CycleSettings::from_config(&config))
        .with_shutdown_flag(Arc::clone(&shutdown_flag));

    let startup_delay = Duration::from_secs(config.schedule.startup_delay_secs);
    if !startup_delay.is_zero() {
        info!(
            "Waiting {}s for the torrent client to come up",
            startup_delay.as_secs()
        );
    }

    if sleep_or_shutdown(startup_delay, &mut shutdown_rx).await {
        run_cycles(&runner, &app_state, &config, run_interval, &mut shutdown_rx).await;
    }

    info!("Monitor shutting down...");

    if let Some(server) = server {
        server.await.context("Status server task failed")??;
        info!("Status server stopped");
    }

    Ok(())
}

/// Run cycles until shutdown is requested.
async fn run_cycles(
    runner: &CycleRunner,
    app_state: &AppState,
    config: &Config,
    run_interval: Duration,
    shutdown: &mut watch::Receiver<bool>,
) {
    loop {
        match runner.run_cycle(Utc::now()).await {
            Ok(report) => {
                LAST_CYCLE_SUCCESS.set(1);
                LAST_CYCLE_TIMESTAMP.set(report.finished_at.timestamp());
                let interrupted = report.interrupted;
                app_state.set_last_report(report).await;
                if interrupted {
                    return;
                }
            }
            Err(CycleError::ClientUnavailable(e)) => {
                LAST_CYCLE_SUCCESS.set(0);
                warn!("qBittorrent unavailable, skipping this cycle: {}", e);
            }
            Err(CycleError::ListFailed(e)) => {
                LAST_CYCLE_SUCCESS.set(0);
                warn!("qBittorrent returned an unusable torrent list: {}", e);
            }
            Err(e) => {
                LAST_CYCLE_SUCCESS.set(0);
                error!("Check cycle failed: {}", e);
            }
        }

        info!(
            "Next cycle in {} hours",
            config.schedule.run_interval_hours
        );
        if !sleep_or_shutdown(run_interval, shutdown).await {
            return;
        }
    }
}

/// Sleep for `duration`. Returns `false` if shutdown was requested first.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = shutdown.wait_for(|&stop| stop) => false,
    }
}

async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let app = create_router(state);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|&stop| stop).await;
        })
        .await
        .context("Server error")
}

/// Pick the config source: an explicit `SWARMWATCH_CONFIG` file must exist,
/// the default `config.toml` is optional.
fn load_configuration() -> Result<Config> {
    match std::env::var_os("SWARMWATCH_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if path.exists() {
                info!("Loading configuration from {:?}", path);
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))
            } else {
                info!("No {} found, using defaults and environment", DEFAULT_CONFIG_PATH);
                load_config_from_env().context("Failed to load config from environment")
            }
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into());
    let json = std::env::var("SWARMWATCH_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
