use serde::Serialize;

/// Reachability of the host and identity of the active player session.
/// `player_id < 0` means no session, even when the host is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub connected: bool,
    pub player_id: i64,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            connected: false,
            player_id: -1,
        }
    }
}

/// A change worth telling the UI about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Connected,
    /// Fired once per connected→disconnected edge, never on repeated failures.
    Disconnected,
    PlayerChanged(i64),
}

impl ConnectionState {
    pub fn has_player(&self) -> bool {
        self.connected && self.player_id >= 0
    }

    /// Fold one probe result into the state.
    pub fn observe_probe(&mut self, reachable: bool) -> Option<Transition> {
        match (self.connected, reachable) {
            (true, false) => {
                self.connected = false;
                self.player_id = -1;
                Some(Transition::Disconnected)
            }
            (false, true) => {
                self.connected = true;
                Some(Transition::Connected)
            }
            _ => None,
        }
    }

    pub fn observe_player(&mut self, player_id: i64) -> Option<Transition> {
        let player_id = player_id.max(-1);
        if player_id == self.player_id {
            return None;
        }
        self.player_id = player_id;
        Some(Transition::PlayerChanged(player_id))
    }
}

/// Read-only view of worker state handed to UI-side readers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub connection: ConnectionState,
    /// Host-internal path of the current item; `plugin://` marks a stream
    /// that cannot be paused.
    pub media_path: String,
    /// Kodi item type (`song`, `episode`, `movie`, ...).
    pub item_type: String,
    /// Playlist position remembered at the last accepted song, for resuming
    /// after a stop.
    pub saved_position: Option<i64>,
}

impl PlayerSnapshot {
    pub fn is_plugin_stream(&self) -> bool {
        self.media_path.contains("plugin://")
    }
}
