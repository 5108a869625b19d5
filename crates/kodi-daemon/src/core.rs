/// DaemonCore — single-owner poll loop.
///
/// Owns the connection state, the now-playing tracker, the playback log and
/// the saved playlist position. Nothing else mutates them: UI-side code reads
/// `PlayerSnapshot`s from a `watch` channel and sends `DaemonCommand`s, which
/// are executed here between cycles.
///
/// One cycle is strictly sequential:
///
/// ```text
///   probe host ──no──▶ (first failure after being connected) ConnectionLost
///      │yes
///   active player id ──< 0──▶ done
///      │
///   tracker.poll ──accepted──▶ append to log, save playlist position, SongAccepted
/// ```
///
/// Between cycles the loop waits `wait`, waking early for commands and
/// cancellation. A remote call in flight is never interrupted.
use std::time::Duration;

use kodi_proto::client::KodiClient;
use kodi_proto::config::Config;
use kodi_proto::probe::Prober;
use kodi_proto::songs::{LogRecord, PlaybackLog};
use kodi_proto::state::{PlayerSnapshot, Transition};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::tracker::NowPlayingTracker;
use crate::transport::Transport;

// ── events & commands ─────────────────────────────────────────────────────────

/// Outbound signals for UI collaborators.
#[derive(Debug, Clone)]
pub enum PollEvent {
    ConnectionChanged { connected: bool },
    /// Sent once when a connected host stops answering.
    ConnectionLost { address: String },
    PlayerChanged { player_id: i64 },
    /// A new song was appended to the playback log.
    SongAccepted(LogRecord),
    /// A WARN/ERROR log line, forwarded by the tracing layer.
    Log(String),
}

/// Requests from the UI context, executed by the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonCommand {
    PlayPause,
    Stop,
    Shutdown,
    Reboot,
    Quit,
}

// ── DaemonCore ────────────────────────────────────────────────────────────────

pub struct DaemonCore {
    client: KodiClient,
    prober: Prober,
    transport: Transport,
    tracker: NowPlayingTracker,
    log: PlaybackLog,
    wait: Duration,
    snapshot: PlayerSnapshot,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    events: broadcast::Sender<PollEvent>,
}

impl DaemonCore {
    pub fn new(
        client: KodiClient,
        prober: Prober,
        log: PlaybackLog,
        skip_patterns: Vec<String>,
        wait: Duration,
        events: broadcast::Sender<PollEvent>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(PlayerSnapshot::default());
        Self {
            transport: Transport::new(client.clone()),
            client,
            prober,
            tracker: NowPlayingTracker::new(skip_patterns),
            log,
            wait,
            snapshot: PlayerSnapshot::default(),
            snapshot_tx,
            events,
        }
    }

    pub fn from_config(config: &Config, events: broadcast::Sender<PollEvent>) -> anyhow::Result<Self> {
        Ok(Self::new(
            KodiClient::from_config(&config.kodi)?,
            Prober::from_config(&config.kodi)?,
            PlaybackLog::new(config.paths.log_file.clone()),
            config.kodi.skip_patterns(),
            config.kodi.wait_interval(),
            events,
        ))
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> &PlayerSnapshot {
        &self.snapshot
    }

    /// Run until `cancel` fires. The playback log is truncated first.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<DaemonCommand>,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        self.log.reset().await?;
        info!(
            "[poll] Polling {}:{} every {:?}",
            self.client.host(),
            self.client.port(),
            self.wait
        );

        while !cancel.is_cancelled() {
            self.cycle().await;

            let wait = tokio::time::sleep(self.wait);
            tokio::pin!(wait);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = &mut wait => break,
                    Some(cmd) = commands.recv() => self.handle_command(cmd, &cancel).await,
                }
            }
        }

        info!("[poll] Stopped");
        Ok(())
    }

    /// One probe → player → tracker pass.
    pub async fn cycle(&mut self) {
        let reachable = self.prober.is_connected().await;
        if let Some(t) = self.snapshot.connection.observe_probe(reachable) {
            self.announce(t);
        }
        if !reachable {
            self.publish();
            return;
        }

        let player_id = self.client.active_player_id().await;
        if let Some(t) = self.snapshot.connection.observe_player(player_id) {
            self.announce(t);
        }
        if player_id < 0 {
            self.publish();
            return;
        }

        let outcome = self.tracker.poll(&self.client, player_id, &self.log).await;
        if let Some(item) = outcome.item {
            self.snapshot.media_path = item.media_path;
            self.snapshot.item_type = item.item_type;
        }
        if outcome.accepted.is_some() {
            self.snapshot.saved_position = match self.client.playlist_position(player_id).await {
                Ok(position) => Some(position),
                Err(e) => {
                    debug!("[poll] No playlist position: {}", e);
                    None
                }
            };
        }
        // SongAccepted listeners read the snapshot; publish it first.
        self.publish();
        if let Some(record) = outcome.accepted {
            let _ = self.events.send(PollEvent::SongAccepted(record));
        }
    }

    async fn handle_command(&mut self, cmd: DaemonCommand, cancel: &CancellationToken) {
        debug!("[poll] Command {:?}", cmd);
        let player_id = self.snapshot.connection.player_id;
        let result = match cmd {
            DaemonCommand::PlayPause => self
                .transport
                .toggle_play_pause(&mut self.snapshot)
                .await
                .map(|action| debug!("[poll] Toggle: {:?}", action)),
            DaemonCommand::Stop => self.transport.stop(player_id).await.map(|_| ()),
            DaemonCommand::Shutdown => self.transport.shutdown().await,
            DaemonCommand::Reboot => self.transport.reboot().await,
            DaemonCommand::Quit => {
                info!("[poll] Quit requested");
                cancel.cancel();
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!("[poll] {:?} failed: {}", cmd, e);
        }
        self.publish();
    }

    fn announce(&self, transition: Transition) {
        match transition {
            Transition::Connected => {
                info!("[poll] Connected to {}:{}", self.client.host(), self.client.port());
                let _ = self.events.send(PollEvent::ConnectionChanged { connected: true });
            }
            Transition::Disconnected => {
                let address = format!("{}:{}", self.client.host(), self.client.port());
                warn!("[poll] Lost connection to {}", address);
                let _ = self.events.send(PollEvent::ConnectionChanged { connected: false });
                let _ = self.events.send(PollEvent::ConnectionLost { address });
            }
            Transition::PlayerChanged(player_id) => {
                info!("[poll] Active player: {}", player_id);
                let _ = self.events.send(PollEvent::PlayerChanged { player_id });
            }
        }
    }

    fn publish(&self) {
        let current = self.snapshot.clone();
        self.snapshot_tx.send_if_modified(|snap| {
            if *snap == current {
                false
            } else {
                *snap = current;
                true
            }
        });
    }
}
