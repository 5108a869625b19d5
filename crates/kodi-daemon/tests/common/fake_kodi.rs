//! In-process stand-in for a Kodi host: `GET /` for the probe,
//! `POST /jsonrpc` for single and batched calls and `GET /vfs/*` for
//! thumbnails handed out by `Files.PrepareDownload`.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use kodi_proto::client::KodiClient;
use kodi_proto::probe::Prober;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

#[derive(Debug, Default)]
pub struct FakeState {
    pub online: bool,
    pub players: Vec<i64>,
    /// Served by `Player.GetItem`; once drained, the last item repeats.
    pub items: VecDeque<Value>,
    pub current: Option<Value>,
    pub prepare_download_fails: bool,
    pub speed: i64,
    pub position: Option<i64>,
    /// `(hours, minutes, seconds)` and percentage for `Player.GetProperties`.
    pub totaltime: Option<(u64, u64, u64)>,
    pub percentage: f64,
    /// Every request object received, in order.
    pub calls: Vec<Value>,
    /// Paths requested under `/vfs/`.
    pub downloads: Vec<String>,
}

impl FakeState {
    fn handle(&mut self, req: &Value) -> Value {
        self.calls.push(req.clone());
        let id = req["id"].clone();
        let method = req["method"].as_str().unwrap_or_default();
        let params = &req["params"];

        let result = match method {
            "Player.GetActivePlayers" => Value::Array(
                self.players
                    .iter()
                    .map(|id| json!({ "playerid": id, "type": "audio" }))
                    .collect(),
            ),
            "Player.GetItem" => {
                if let Some(next) = self.items.pop_front() {
                    self.current = Some(next);
                }
                match &self.current {
                    Some(item) => json!({ "item": item }),
                    None => return error(id, -32100, "Failed to execute method."),
                }
            }
            "Files.PrepareDownload" => {
                if self.prepare_download_fails {
                    return error(id, -32602, "Invalid params.");
                }
                let path = params["path"].as_str().unwrap_or_default();
                json!({
                    "details": { "path": format!("vfs/{}", path) },
                    "mode": "redirect",
                    "protocol": "http",
                })
            }
            "Player.GetProperties" => {
                let mut props = Map::new();
                let wanted = params["properties"].as_array().cloned().unwrap_or_default();
                for prop in wanted.iter().filter_map(Value::as_str) {
                    match prop {
                        "speed" => {
                            props.insert(prop.into(), json!(self.speed));
                        }
                        "position" => {
                            if let Some(position) = self.position {
                                props.insert(prop.into(), json!(position));
                            }
                        }
                        "percentage" => {
                            props.insert(prop.into(), json!(self.percentage));
                        }
                        "totaltime" => {
                            if let Some((hours, minutes, seconds)) = self.totaltime {
                                props.insert(
                                    prop.into(),
                                    json!({
                                        "hours": hours,
                                        "minutes": minutes,
                                        "seconds": seconds,
                                        "milliseconds": 0,
                                    }),
                                );
                            }
                        }
                        _ => {}
                    }
                }
                Value::Object(props)
            }
            "Player.PlayPause" => {
                self.speed = if self.speed > 0 { 0 } else { 1 };
                json!({ "speed": self.speed })
            }
            "Player.Stop" => {
                self.speed = 0;
                json!("OK")
            }
            "Player.Open" | "Playlist.Clear" | "Playlist.Add" | "System.Shutdown"
            | "System.Reboot" => json!("OK"),
            _ => return error(id, -32601, "Method not found."),
        };

        json!({ "id": id, "jsonrpc": "2.0", "result": result })
    }
}

fn error(id: Value, code: i64, message: &str) -> Value {
    json!({
        "id": id,
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message },
    })
}

type Shared = Arc<Mutex<FakeState>>;

async fn vfs(State(state): State<Shared>, Path(path): Path<String>) -> Vec<u8> {
    let body = format!("image:{}", path).into_bytes();
    state.lock().unwrap().downloads.push(path);
    body
}

async fn root(State(state): State<Shared>) -> (StatusCode, &'static str) {
    if state.lock().unwrap().online {
        (StatusCode::OK, "Kodi")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "")
    }
}

async fn jsonrpc(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    match body {
        Value::Array(requests) => Json(Value::Array(
            requests.iter().map(|r| state.handle(r)).collect(),
        )),
        request => Json(state.handle(&request)),
    }
}

#[derive(Clone)]
pub struct FakeKodi {
    pub state: Shared,
    pub port: u16,
}

impl FakeKodi {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            online: true,
            ..Default::default()
        }));
        let app = Router::new()
            .route("/", get(root))
            .route("/jsonrpc", post(jsonrpc))
            .route("/vfs/*path", get(vfs))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake kodi");
        let port = listener.local_addr().expect("local addr").port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake kodi server");
        });

        Self { state, port }
    }

    pub fn client(&self) -> KodiClient {
        KodiClient::new("127.0.0.1", self.port, Some(Duration::from_secs(5)))
            .expect("build client")
    }

    pub fn prober(&self) -> Prober {
        Prober::new("127.0.0.1", self.port).expect("build prober")
    }

    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    pub fn set_online(&self, online: bool) {
        self.state.lock().unwrap().online = online;
    }

    pub fn set_players(&self, ids: &[i64]) {
        self.state.lock().unwrap().players = ids.to_vec();
    }

    pub fn push_item(&self, item: Value) {
        self.state.lock().unwrap().items.push_back(item);
    }

    pub fn set_prepare_download_fails(&self, fails: bool) {
        self.state.lock().unwrap().prepare_download_fails = fails;
    }

    pub fn set_speed(&self, speed: i64) {
        self.state.lock().unwrap().speed = speed;
    }

    pub fn set_position(&self, position: Option<i64>) {
        self.state.lock().unwrap().position = position;
    }

    pub fn set_progress(&self, totaltime: (u64, u64, u64), percentage: f64) {
        let mut state = self.state.lock().unwrap();
        state.totaltime = Some(totaltime);
        state.percentage = percentage;
    }

    /// Method names of every request received so far.
    pub fn methods(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|c| c["method"].as_str().map(String::from))
            .collect()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c["method"] == method)
            .cloned()
            .collect()
    }

    /// URL the host would hand out for `name` via `Files.PrepareDownload`.
    pub fn vfs_url(&self, name: &str) -> String {
        format!("http://{}/vfs/{}", self.address(), name)
    }

    pub fn downloads(&self) -> Vec<String> {
        self.state.lock().unwrap().downloads.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

pub fn song(title: &str, artist: &[&str], album: &str, duration: i64) -> Value {
    json!({
        "title": title,
        "artist": artist,
        "album": album,
        "duration": duration,
        "thumbnail": "",
        "mediapath": "",
        "type": "song",
    })
}
