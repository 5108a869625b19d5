use kodi_daemon::core::{DaemonCommand, DaemonCore, PollEvent};
use kodi_daemon::http::{self, HttpState};
use kodi_daemon::log_layer::EventLogLayer;
use kodi_daemon::notify::Notifier;
use kodi_proto::config::Config;
use kodi_proto::songs::PlaybackLog;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Event channel first so logging can feed it
    let (event_tx, _) = broadcast::channel::<PollEvent>(100);

    let log_path = kodi_proto::platform::daemon_log_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(EventLogLayer::new(event_tx.clone()))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,kodi_daemon=debug,kodi_proto=debug")
            }),
        )
        .init();

    info!("Log file: {:?}", log_path);

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());
    if config.kodi.autostart {
        info!("Autostart is enabled; the login entry is managed by the desktop integration");
    }
    if !config.kodi.notifications_enabled() {
        info!("Notifications disabled (show_notification = 0)");
    }

    let cancel = CancellationToken::new();
    let (command_tx, command_rx) = mpsc::channel::<DaemonCommand>(32);
    let (show_tx, show_rx) = mpsc::channel::<usize>(8);

    let daemon_core = DaemonCore::from_config(&config, event_tx.clone())?;
    let snapshot_rx = daemon_core.subscribe_snapshot();

    let notifier = Notifier::from_config(&config, snapshot_rx.clone())?;
    let notifier_handle = tokio::spawn(notifier.run(event_tx.subscribe(), show_rx, cancel.clone()));

    if config.http.enabled {
        let _http_handle = http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            HttpState {
                snapshot: snapshot_rx,
                log: PlaybackLog::new(config.paths.log_file.clone()),
                commands: command_tx.clone(),
                show: show_tx,
            },
        );
    }

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt signal, stopping");
            signal_cancel.cancel();
        }
    });

    info!("Daemon initialised, running poll loop");
    daemon_core.run(command_rx, cancel.clone()).await?;

    cancel.cancel();
    let _ = notifier_handle.await;
    Ok(())
}
