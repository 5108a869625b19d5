//! Tracing layer that mirrors warnings and errors onto the event channel as
//! `PollEvent::Log`, formatted `HH:MM:SS [LEVEL] message key=value`.
use std::fmt::Write;

use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::core::PollEvent;

pub struct EventLogLayer {
    sender: broadcast::Sender<PollEvent>,
    /// Most verbose level still forwarded.
    max_level: Level,
}

impl EventLogLayer {
    pub fn new(sender: broadcast::Sender<PollEvent>) -> Self {
        Self {
            sender,
            max_level: Level::WARN,
        }
    }

    pub fn with_max_level(mut self, level: Level) -> Self {
        self.max_level = level;
        self
    }
}

impl<S: Subscriber> Layer<S> for EventLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > self.max_level {
            return;
        }

        let mut line = format!("{} [{}] ", chrono::Local::now().format("%H:%M:%S"), level);
        event.record(&mut FieldWriter(&mut line));

        // No subscribers is fine
        let _ = self.sender.send(PollEvent::Log(line));
    }
}

struct FieldWriter<'a>(&'a mut String);

impl Visit for FieldWriter<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        } else {
            let _ = write!(self.0, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{:?}", value);
        } else {
            let _ = write!(self.0, " {}={:?}", field.name(), value);
        }
    }
}
