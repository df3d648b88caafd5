//! Event capture for unit tests.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Metadata, Subscriber};

/// A subscriber that records the message and field names of every event.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    events: Arc<Mutex<Vec<Vec<String>>>>,
}

struct Names<'a>(&'a mut Vec<String>);

impl Visit for Names<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push(format!("{value:?}"));
        } else {
            self.0.push(field.name().to_string());
        }
    }
}

impl Recorder {
    /// Runs `f` with this recorder as the thread's default subscriber.
    pub(crate) fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        tracing::subscriber::with_default(self.clone(), f)
    }

    /// Whether some event carried every one of `names`.
    pub(crate) fn saw(&self, names: &[&str]) -> bool {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events
            .iter()
            .any(|event| names.iter().all(|n| event.iter().any(|f| f == n)))
    }
}

impl Subscriber for Recorder {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _: &Id, _: &Record<'_>) {}

    fn record_follows_from(&self, _: &Id, _: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut names = Vec::new();
        event.record(&mut Names(&mut names));
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(names);
    }

    fn enter(&self, _: &Id) {}

    fn exit(&self, _: &Id) {}
}
