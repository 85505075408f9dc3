//! Topic Router
//!
//! Dispatches inbound telemetry messages to every registered subscription
//! whose patterns cover the message topic.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::routing::topic::{is_valid_pattern, topic_matches};

/// An inbound message as received from the transport.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Bytes,
}

/// A subscriber to inbound telemetry.
#[async_trait]
pub trait TopicHandler: Send + Sync {
    /// Patterns this handler wants, in priority order.
    fn topics(&self) -> Vec<String>;

    /// Processes one message whose topic matched one of [`topics`](Self::topics).
    async fn handle(&self, message: RawMessage) -> anyhow::Result<()>;
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Handlers whose patterns matched the topic
    pub matched: usize,
    /// Matched handlers that returned an error or panicked
    pub failed: usize,
}

// == Topic Router ==
/// Ordered list of handlers, matched against every inbound topic.
#[derive(Clone, Default)]
pub struct TopicRouter {
    handlers: Vec<Arc<dyn TopicHandler>>,
}

impl TopicRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler. Registering the same handler twice dispatches to it twice.
    pub fn register(&mut self, handler: Arc<dyn TopicHandler>) {
        for pattern in handler.topics() {
            if !is_valid_pattern(&pattern) {
                warn!(pattern = %pattern, "Pattern uses '#' or '+' inside a level and will only match literally");
            }
        }
        self.handlers.push(handler);
    }

    /// Every pattern of every handler, for subscribing at the transport.
    pub fn all_topics(&self) -> Vec<String> {
        self.handlers.iter().flat_map(|handler| handler.topics()).collect()
    }

    /// Handlers with at least one pattern matching `topic`, in registration order.
    pub fn handlers_for(&self, topic: &str) -> Vec<Arc<dyn TopicHandler>> {
        self.handlers
            .iter()
            .filter(|handler| {
                handler
                    .topics()
                    .iter()
                    .any(|pattern| topic_matches(pattern, topic))
            })
            .cloned()
            .collect()
    }

    // == Dispatch ==
    /// Runs every matching handler on `payload` and waits for all of them.
    ///
    /// Each handler runs in its own task, so an error or panic in one is
    /// logged and counted without affecting the others. The tasks are
    /// detached: dropping the returned future stops waiting for the report
    /// but every handler still runs to completion. A topic nobody listens to
    /// is logged and dropped.
    pub async fn dispatch(&self, topic: &str, payload: Bytes) -> DispatchReport {
        let handlers = self.handlers_for(topic);

        if handlers.is_empty() {
            warn!(topic, "No handler found for topic");
            return DispatchReport::default();
        }

        let message = RawMessage {
            topic: topic.to_string(),
            payload,
        };

        let tasks: Vec<_> = handlers
            .iter()
            .map(|handler| {
                let handler = Arc::clone(handler);
                let message = message.clone();
                tokio::spawn(async move { handler.handle(message).await })
            })
            .collect();

        let mut report = DispatchReport {
            matched: handlers.len(),
            failed: 0,
        };

        for task in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    report.failed += 1;
                    error!(topic, error = %err, "Topic handler failed");
                }
                Err(join_err) if join_err.is_panic() => {
                    report.failed += 1;
                    error!(topic, "Topic handler panicked");
                }
                Err(join_err) => {
                    report.failed += 1;
                    error!(topic, error = %join_err, "Topic handler task was cancelled");
                }
            }
        }

        debug!(topic, matched = report.matched, failed = report.failed, "Dispatched message");
        report
    }
}
