//! Shared pieces of kodi-playing: configuration, the Kodi JSON-RPC client,
//! connection state and the playback log.

pub mod client;
pub mod config;
pub mod platform;
pub mod probe;
pub mod protocol;
pub mod songs;
pub mod state;
