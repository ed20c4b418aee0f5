use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::events::{CWEvent, ChainEventKind, DisconnectedRange};
use crate::handlers::EventHandler;
use crate::pipeline::DiscoverReconnectRange;

#[derive(Debug, Clone)]
pub struct ChainProgress {
    pub last_block: u64,
    pub last_seen: Instant,
    pub events: u64,
}

/// In-process record of what each chain has delivered so far.
///
/// Sits at the end of the handler chain; a listener re-created in the same process
/// resumes from the block after the last one seen.
#[derive(Debug, Default)]
pub struct ChainState {
    progress: Mutex<HashMap<String, ChainProgress>>,
    kind_counts: Mutex<HashMap<ChainEventKind, u64>>,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: &CWEvent) {
        let chain = event
            .chain
            .clone()
            .unwrap_or_else(|| event.network.to_string());

        if let Ok(mut progress) = self.progress.lock() {
            let entry = progress.entry(chain).or_insert(ChainProgress {
                last_block: event.block_number,
                last_seen: Instant::now(),
                events: 0,
            });
            entry.last_block = entry.last_block.max(event.block_number);
            entry.last_seen = Instant::now();
            entry.events += 1;
        }

        if let Ok(mut counts) = self.kind_counts.lock() {
            *counts.entry(event.kind()).or_insert(0) += 1;
        }
    }

    pub fn last_block(&self, chain: &str) -> Option<u64> {
        self.progress
            .lock()
            .ok()?
            .get(chain)
            .map(|p| p.last_block)
    }

    pub fn progress(&self, chain: &str) -> Option<ChainProgress> {
        self.progress.lock().ok()?.get(chain).cloned()
    }

    pub fn count(&self, kind: ChainEventKind) -> u64 {
        self.kind_counts
            .lock()
            .ok()
            .and_then(|c| c.get(&kind).copied())
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventHandler for ChainState {
    fn name(&self) -> &str {
        "chain-state"
    }

    async fn handle(&self, event: &CWEvent, previous: Option<Value>) -> Result<Option<Value>> {
        self.record(event);
        Ok(previous)
    }
}

#[async_trait]
impl DiscoverReconnectRange for ChainState {
    async fn discover(&self, chain: &str) -> Result<Option<DisconnectedRange>> {
        Ok(self
            .last_block(chain)
            .map(|last| DisconnectedRange::from_block(last + 1)))
    }
}
