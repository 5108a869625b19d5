//! kodi-playing daemon: poll loop, now-playing tracker, transport controls,
//! notifications, the local control API and the tracing bridge onto the
//! event channel.

pub mod core;
pub mod http;
pub mod log_layer;
pub mod notify;
pub mod tracker;
pub mod transport;
