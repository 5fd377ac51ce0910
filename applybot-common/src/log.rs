//! Log sink that fans engine events out to any number of subscribers.
//!
//! The engine emits a [`LogEvent`] for everything an operator should see
//! (skips, submissions, failures and their classification). Each event is
//! also forwarded to `tracing`, so the file sink set up by
//! [`crate::observability::init_logging`] records it too.
//!
//! Delivery is synchronous and best effort. Subscribers see events in
//! emission order; no order is promised across subscribers.
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One operator-facing event, serialized as `{ level, timestamp, message }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// Receives events from a [`LogSink`].
///
/// Return `false` to be dropped from the sink (e.g. the client went away).
pub trait LogSubscriber: Send + Sync {
    fn on_event(&self, event: &LogEvent) -> bool;
}

/// Handle returned by [`LogSink::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Forwards events into an unbounded channel; used for log streams.
struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<LogEvent>,
}

impl LogSubscriber for ChannelSubscriber {
    fn on_event(&self, event: &LogEvent) -> bool {
        self.tx.send(event.clone()).is_ok()
    }
}

#[derive(Default)]
struct SinkInner {
    next_id: AtomicU64,
    subscribers: DashMap<SubscriptionId, Arc<dyn LogSubscriber>>,
}

/// Shared, cloneable broadcast target for [`LogEvent`]s.
#[derive(Clone, Default)]
pub struct LogSink {
    inner: Arc<SinkInner>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn LogSubscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.subscribers.insert(id, subscriber);
        id
    }

    /// Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.remove(&id).is_some()
    }

    /// Subscribe a channel and hand back its receiving end.
    ///
    /// Dropping the receiver unsubscribes on the next event.
    ///
    /// ```
    /// use applybot_common::{LogEvent, LogLevel, LogSink};
    ///
    /// let sink = LogSink::new();
    /// let (_id, mut rx) = sink.stream();
    /// sink.notify(&LogEvent::new(LogLevel::Info, "hello"));
    /// assert_eq!(rx.try_recv().unwrap().message, "hello");
    /// ```
    pub fn stream(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<LogEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(Arc::new(ChannelSubscriber { tx }));
        (id, rx)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Deliver `event` to every current subscriber.
    pub fn notify(&self, event: &LogEvent) {
        // Snapshot first so a subscriber may (un)subscribe from its callback.
        let targets: Vec<(SubscriptionId, Arc<dyn LogSubscriber>)> = self
            .inner
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (id, subscriber) in targets {
            if !subscriber.on_event(event) {
                self.inner.subscribers.remove(&id);
            }
        }
    }

    /// Trace the message and notify subscribers.
    pub fn emit(&self, level: LogLevel, message: impl Into<String>) {
        let event = LogEvent::new(level, message);
        match level {
            LogLevel::Info => tracing::info!(target: "applybot.events", "{}", event.message),
            LogLevel::Warn => tracing::warn!(target: "applybot.events", "{}", event.message),
            LogLevel::Error => tracing::error!(target: "applybot.events", "{}", event.message),
        }
        self.notify(&event);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message);
    }
}
