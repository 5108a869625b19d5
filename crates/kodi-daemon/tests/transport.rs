mod common;

use common::fake_kodi::FakeKodi;
use kodi_daemon::transport::{ToggleAction, Transport};
use kodi_proto::state::{ConnectionState, PlayerSnapshot};

const STREAM: &str = "plugin://plugin.audio.radio_de/station/42";

fn snapshot(player_id: i64, media_path: &str) -> PlayerSnapshot {
    PlayerSnapshot {
        connection: ConnectionState {
            connected: true,
            player_id,
        },
        media_path: media_path.into(),
        item_type: String::new(),
        saved_position: None,
    }
}

#[tokio::test]
async fn test_playing_stream_is_stopped() {
    let kodi = FakeKodi::start().await;
    kodi.set_speed(1);
    let transport = Transport::new(kodi.client());
    let mut snap = snapshot(0, STREAM);

    let action = transport.toggle_play_pause(&mut snap).await.expect("toggle");

    assert_eq!(action, ToggleAction::StoppedStream);
    assert_eq!(kodi.calls_to("Player.Stop").len(), 1);
    assert!(kodi.calls_to("Player.PlayPause").is_empty());
}

#[tokio::test]
async fn test_stopped_stream_is_requeued() {
    let kodi = FakeKodi::start().await;
    let transport = Transport::new(kodi.client());
    let mut snap = snapshot(-1, STREAM);

    let action = transport.toggle_play_pause(&mut snap).await.expect("toggle");

    assert_eq!(action, ToggleAction::RequeuedStream);
    assert_eq!(
        kodi.methods(),
        vec!["Playlist.Clear", "Playlist.Add", "Player.Open"]
    );
    let add = &kodi.calls_to("Playlist.Add")[0];
    assert_eq!(add["params"]["item"]["file"], STREAM);
    assert_eq!(add["params"]["playlistid"], 0);
    let open = &kodi.calls_to("Player.Open")[0];
    assert_eq!(open["params"]["item"]["position"], 0);
}

#[tokio::test]
async fn test_saved_position_resumes_once() {
    let kodi = FakeKodi::start().await;
    let transport = Transport::new(kodi.client());
    let mut snap = snapshot(-1, "/music/track.flac");
    snap.saved_position = Some(3);

    let first = transport.toggle_play_pause(&mut snap).await.expect("toggle");
    assert_eq!(first, ToggleAction::Resumed(3));
    assert_eq!(snap.saved_position, None);
    let open = &kodi.calls_to("Player.Open")[0];
    assert_eq!(open["params"]["item"]["playlistid"], 0);
    assert_eq!(open["params"]["item"]["position"], 3);

    let second = transport.toggle_play_pause(&mut snap).await.expect("toggle");
    assert_eq!(second, ToggleAction::Nothing);
    assert_eq!(kodi.calls_to("Player.Open").len(), 1);
}

#[tokio::test]
async fn test_nothing_to_do_without_player_or_position() {
    let kodi = FakeKodi::start().await;
    let transport = Transport::new(kodi.client());
    let mut snap = snapshot(-1, "");

    let action = transport.toggle_play_pause(&mut snap).await.expect("toggle");

    assert_eq!(action, ToggleAction::Nothing);
    assert!(kodi.methods().is_empty());
}

#[tokio::test]
async fn test_regular_player_toggles() {
    let kodi = FakeKodi::start().await;
    let transport = Transport::new(kodi.client());
    let mut snap = snapshot(0, "/music/track.flac");
    snap.saved_position = Some(7);

    let action = transport.toggle_play_pause(&mut snap).await.expect("toggle");

    assert_eq!(action, ToggleAction::PlayPause);
    assert_eq!(kodi.calls_to("Player.PlayPause")[0]["params"]["playerid"], 0);
    // Position is only consumed when there is no player.
    assert_eq!(snap.saved_position, Some(7));
}

#[tokio::test]
async fn test_stop_without_player_is_a_no_op() {
    let kodi = FakeKodi::start().await;
    let transport = Transport::new(kodi.client());

    assert!(!transport.stop(-1).await.expect("stop"));
    assert!(kodi.methods().is_empty());

    assert!(transport.stop(1).await.expect("stop"));
    assert_eq!(kodi.calls_to("Player.Stop")[0]["params"]["playerid"], 1);
}

#[tokio::test]
async fn test_power_commands() {
    let kodi = FakeKodi::start().await;
    let transport = Transport::new(kodi.client());

    transport.shutdown().await.expect("shutdown");
    transport.reboot().await.expect("reboot");

    assert_eq!(kodi.methods(), vec!["System.Shutdown", "System.Reboot"]);
}
