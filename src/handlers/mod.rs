//! Ordered dispatch of canonical events to external consumers.

pub mod logging;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::error;

use crate::error::{ChainEventsError, Result};
use crate::events::CWEvent;

pub use logging::LoggingHandler;
pub use webhook::WebhookHandler;

/// A consumer of canonical events.
///
/// `previous` is whatever the handler before this one returned, so a notifier can
/// reuse the row a storage handler just wrote.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, event: &CWEvent, previous: Option<Value>) -> Result<Option<Value>>;
}

#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn push(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the handlers in order, threading each result into the next.
    /// Stops at the first failure; the remaining handlers never see the event.
    pub async fn dispatch(&self, mut event: CWEvent) -> Result<Option<Value>> {
        if event.received.is_none() {
            event.received = Some(Utc::now());
        }

        let mut previous = None;
        for handler in &self.handlers {
            match handler.handle(&event, previous.take()).await {
                Ok(result) => previous = result,
                Err(e) => {
                    error!(
                        handler = handler.name(),
                        block = event.block_number,
                        kind = event.kind().as_str(),
                        "event handler failed: {e}"
                    );
                    return Err(ChainEventsError::Handler {
                        handler: handler.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(previous)
    }

    /// Dispatches events one after another. Returns how many made it through every handler.
    pub async fn dispatch_all(&self, events: Vec<CWEvent>) -> usize {
        let mut delivered = 0;
        for event in events {
            if self.dispatch(event).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records every event it sees; fails on the blocks it is told to.
    pub struct RecordingHandler {
        name: String,
        fail_on: Vec<u64>,
        pub seen: Mutex<Vec<(u64, Option<Value>)>>,
    }

    impl RecordingHandler {
        pub fn new(name: &str) -> Arc<Self> {
            Self::failing(name, vec![])
        }

        pub fn failing(name: &str, fail_on: Vec<u64>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                fail_on,
                seen: Mutex::new(vec![]),
            })
        }

        pub fn blocks(&self) -> Vec<u64> {
            self.seen.lock().unwrap().iter().map(|(b, _)| *b).collect()
        }
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        fn name(&self) -> &str {
            &self.name
        }

        async fn handle(&self, event: &CWEvent, previous: Option<Value>) -> Result<Option<Value>> {
            self.seen
                .lock()
                .unwrap()
                .push((event.block_number, previous));
            if self.fail_on.contains(&event.block_number) {
                return Err(ChainEventsError::Rpc(format!("{} refused", self.name)));
            }
            Ok(Some(Value::String(self.name.clone())))
        }
    }
}
