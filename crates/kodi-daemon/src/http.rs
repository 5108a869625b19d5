//! Local control API, the daemon's equivalent of the tray menu.
//!
//! Handlers never touch poll-loop state: they read snapshots, re-read the
//! playback log, or enqueue commands.
use crate::core::DaemonCommand;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use kodi_proto::songs::{LogRecord, PlaybackLog};
use kodi_proto::state::PlayerSnapshot;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

/// Largest history page served at once, and the oldest song that can be shown.
const MAX_HISTORY: usize = 100;

#[derive(Clone)]
pub struct HttpState {
    pub snapshot: watch::Receiver<PlayerSnapshot>,
    pub log: PlaybackLog,
    pub commands: mpsc::Sender<DaemonCommand>,
    pub show: mpsc::Sender<usize>,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/history/:count", get(get_history))
        .route("/api/show/:index", post(show_song))
        .route("/api/playpause", post(play_pause))
        .route("/api/stop", post(stop))
        .route("/api/shutdown", post(shutdown))
        .route("/api/reboot", post(reboot))
        .route("/api/quit", post(quit))
        .with_state(state)
}

pub fn start_server(
    bind_address: String,
    port: u16,
    state: HttpState,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(state);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("[http] Failed to bind {}: {}", addr, e);
                return;
            }
        };

        info!("[http] Control API listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("[http] Server error: {}", e);
        }
    })
}

async fn get_state(State(state): State<HttpState>) -> Json<PlayerSnapshot> {
    Json(state.snapshot.borrow().clone())
}

async fn get_history(
    State(state): State<HttpState>,
    Path(count): Path<usize>,
) -> Json<Vec<LogRecord>> {
    Json(state.log.read_recent(count.min(MAX_HISTORY)))
}

async fn show_song(State(state): State<HttpState>, Path(index): Path<usize>) -> StatusCode {
    if index == 0 || index > MAX_HISTORY || state.log.song_at(index).is_none() {
        return StatusCode::NOT_FOUND;
    }
    match state.show.send(index).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn enqueue(state: &HttpState, cmd: DaemonCommand) -> StatusCode {
    match state.commands.send(cmd).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn play_pause(State(state): State<HttpState>) -> StatusCode {
    enqueue(&state, DaemonCommand::PlayPause).await
}

async fn stop(State(state): State<HttpState>) -> StatusCode {
    enqueue(&state, DaemonCommand::Stop).await
}

async fn shutdown(State(state): State<HttpState>) -> StatusCode {
    enqueue(&state, DaemonCommand::Shutdown).await
}

async fn reboot(State(state): State<HttpState>) -> StatusCode {
    enqueue(&state, DaemonCommand::Reboot).await
}

async fn quit(State(state): State<HttpState>) -> StatusCode {
    enqueue(&state, DaemonCommand::Quit).await
}
