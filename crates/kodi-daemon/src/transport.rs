//! Play/pause, stop and power commands.
use kodi_proto::client::{KodiClient, RpcError};
use kodi_proto::state::PlayerSnapshot;
use tracing::{debug, info};

/// What a play/pause toggle ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// Plugin stream was playing; streams cannot pause, so it was stopped.
    StoppedStream,
    /// Plugin stream was stopped and has been queued again.
    RequeuedStream,
    /// No player, but a remembered playlist position was reopened.
    Resumed(i64),
    PlayPause,
    /// No player and nothing to resume.
    Nothing,
}

#[derive(Debug, Clone)]
pub struct Transport {
    client: KodiClient,
}

impl Transport {
    pub fn new(client: KodiClient) -> Self {
        Self { client }
    }

    /// Toggle playback. Consumes `snapshot.saved_position` when resuming.
    pub async fn toggle_play_pause(
        &self,
        snapshot: &mut PlayerSnapshot,
    ) -> Result<ToggleAction, RpcError> {
        let player_id = snapshot.connection.player_id;

        if snapshot.is_plugin_stream() {
            if self.client.is_playing(player_id).await {
                self.client.stop(player_id).await?;
                info!("[transport] Stopped stream {}", snapshot.media_path);
                return Ok(ToggleAction::StoppedStream);
            }
            self.client.play_file(&snapshot.media_path).await?;
            info!("[transport] Requeued stream {}", snapshot.media_path);
            return Ok(ToggleAction::RequeuedStream);
        }

        if player_id < 0 {
            return match snapshot.saved_position.take() {
                Some(position) if position >= 0 => {
                    self.client.open_position(position).await?;
                    info!("[transport] Resumed playlist at position {}", position);
                    Ok(ToggleAction::Resumed(position))
                }
                _ => {
                    debug!("[transport] Nothing to resume");
                    Ok(ToggleAction::Nothing)
                }
            };
        }

        self.client.play_pause(player_id).await?;
        Ok(ToggleAction::PlayPause)
    }

    /// Returns false without calling out when there is no player.
    pub async fn stop(&self, player_id: i64) -> Result<bool, RpcError> {
        if player_id < 0 {
            return Ok(false);
        }
        self.client.stop(player_id).await?;
        Ok(true)
    }

    pub async fn shutdown(&self) -> Result<(), RpcError> {
        info!("[transport] Shutting down {}", self.client.host());
        self.client.shutdown().await
    }

    pub async fn reboot(&self) -> Result<(), RpcError> {
        info!("[transport] Rebooting {}", self.client.host());
        self.client.reboot().await
    }
}
