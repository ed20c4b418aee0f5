//! The capabilities a listener is composed from: subscriber, processor,
//! storage fetcher and catch-up. Every network provides its own implementations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{ChainEventsError, Result};
use crate::events::{CWEvent, DisconnectedRange, EntityKind};
use crate::handlers::HandlerChain;

/// Raw chain items that know which block they came from.
pub trait BlockNumbered {
    fn block_number(&self) -> Option<u64>;
}

impl BlockNumbered for alloy::rpc::types::Log {
    fn block_number(&self) -> Option<u64> {
        self.block_number
    }
}

/// Turns one raw block or log into zero or more canonical events.
///
/// Never fails as a whole: a raw item whose enrichment fails is logged and dropped.
#[async_trait]
pub trait Processor: Send + Sync {
    type Raw: Send + 'static;

    async fn process(&self, raw: Self::Raw) -> Vec<CWEvent>;
}

/// Delivers raw items, in arrival order, into `sink` until unsubscribed.
#[async_trait]
pub trait Subscriber: Send + Sync {
    type Raw: Send + 'static;

    async fn subscribe(&mut self, sink: mpsc::Sender<Self::Raw>) -> Result<()>;

    /// Safe to call at any time, including before `subscribe`.
    fn unsubscribe(&mut self);
}

/// Synthesizes events from current chain storage instead of historical logs.
#[async_trait]
pub trait StorageFetcher: Send + Sync {
    async fn fetch(
        &self,
        range: Option<DisconnectedRange>,
        fetch_all_completed: bool,
    ) -> Result<Vec<CWEvent>>;

    async fn fetch_one(&self, id: &str, kind: Option<EntityKind>) -> Result<Vec<CWEvent>>;
}

/// Outcome of a catch-up replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backfill {
    pub dispatched: usize,
    /// Highest block the replay covered. May lie past the requested end when the
    /// replay follows the head.
    pub last_block: u64,
}

/// Replays a block range through the handler chain before live subscription starts.
#[async_trait]
pub trait CatchUp: Send + Sync {
    async fn head(&self) -> Result<u64>;

    /// Covers at least `from..=to`.
    async fn backfill(&self, from: u64, to: u64, handlers: &HandlerChain) -> Result<Backfill>;
}

/// Supplied by the embedding application: where did this chain's listener leave off?
#[async_trait]
pub trait DiscoverReconnectRange: Send + Sync {
    async fn discover(&self, chain: &str) -> Result<Option<DisconnectedRange>>;
}

/// Current chain height.
#[async_trait]
pub trait HeadSource: Send + Sync {
    async fn head(&self) -> Result<u64>;
}

/// Catch-up for networks whose storage fetcher can replay a range.
pub struct StorageCatchUp<H> {
    fetcher: Arc<dyn StorageFetcher>,
    head: H,
}

impl<H> StorageCatchUp<H> {
    pub fn new(fetcher: Arc<dyn StorageFetcher>, head: H) -> Self {
        Self { fetcher, head }
    }
}

#[async_trait]
impl<H: HeadSource> CatchUp for StorageCatchUp<H> {
    async fn head(&self) -> Result<u64> {
        self.head.head().await
    }

    async fn backfill(&self, from: u64, to: u64, handlers: &HandlerChain) -> Result<Backfill> {
        let range = DisconnectedRange {
            start_block: from,
            end_block: Some(to),
            max_results: None,
        };
        let mut events = self.fetcher.fetch(Some(range), false).await?;
        events.sort_by_key(|e| e.block_number);
        info!(from, to, count = events.len(), "replaying fetched events");
        Ok(Backfill {
            dispatched: handlers.dispatch_all(events).await,
            last_block: to,
        })
    }
}

/// Runs `op` up to `attempts` times with a fixed pause, surfacing the last error.
pub async fn with_retries<T, F, Fut>(
    target: &str,
    attempts: u32,
    interval: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut reason = String::new();
    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt, attempts, "connecting to {target} failed: {e}");
                reason = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
    Err(ChainEventsError::ConnectionFailed {
        url: target.to_string(),
        attempts,
        reason,
    })
}
