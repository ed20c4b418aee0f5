//! Fetches historical blocks by number, for catch-up and batch archival.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use tracing::{debug, info, warn};

use super::api::SubstrateApi;
use super::block::SubstrateBlock;
use super::processor::SubstrateProcessor;
use crate::error::Result;
use crate::events::DisconnectedRange;
use crate::handlers::HandlerChain;
use crate::pipeline::{Backfill, CatchUp, HeadSource};

#[derive(Clone)]
pub struct Poller {
    api: Arc<dyn SubstrateApi>,
}

impl Poller {
    pub fn new(api: Arc<dyn SubstrateApi>) -> Self {
        Self { api }
    }

    /// Blocks `start..end` (end exclusive, up to the head when open), at most the last
    /// `max_range` of them. Pruned blocks are skipped.
    pub async fn poll(&self, range: DisconnectedRange, max_range: u64) -> Result<Vec<SubstrateBlock>> {
        let end = match range.end_block {
            Some(end) => end,
            None => self.api.head().await?,
        };
        let start = range.start_block.max(end.saturating_sub(max_range));
        if start >= end {
            return Ok(vec![]);
        }

        // hashes one by one: a pruned node may not answer for every height
        let mut hashes = Vec::with_capacity((end - start) as usize);
        for number in start..end {
            match self.api.block_hash(number).await? {
                Some(hash) if !hash.is_zero() => hashes.push(hash),
                _ => debug!(block = number, "no hash for block, skipping"),
            }
        }

        let api = self.api.as_ref();
        let blocks = try_join_all(hashes.into_iter().map(|hash| api.block(hash))).await?;
        debug!(from = start, to = end, count = blocks.len(), "polled blocks");
        Ok(blocks)
    }

    /// Runs `start..=end` through `processor` and `handlers` in batches of `batch_size`,
    /// strictly in order. An open range follows the head until it is reached.
    pub async fn archive(
        &self,
        range: DisconnectedRange,
        batch_size: u64,
        processor: &SubstrateProcessor,
        handlers: &HandlerChain,
    ) -> Result<Backfill> {
        let batch_size = batch_size.max(1);
        let sync_to_head = range.end_block.is_none();
        // exclusive bound
        let mut end = match range.end_block {
            Some(end) => end + 1,
            None => self.api.head().await? + 1,
        };

        let mut dispatched = 0;
        let mut from = range.start_block;
        while from < end {
            let to = (from + batch_size).min(end);
            let blocks = self
                .poll(
                    DisconnectedRange {
                        start_block: from,
                        end_block: Some(to),
                        max_results: None,
                    },
                    batch_size,
                )
                .await?;
            dispatched += replay(&blocks, processor, handlers).await;
            info!(from, to, blocks = blocks.len(), "archived batch");

            from = to;
            if sync_to_head {
                end = self.api.head().await? + 1;
            }
        }
        Ok(Backfill {
            dispatched,
            last_block: end.saturating_sub(1),
        })
    }
}

async fn replay(
    blocks: &[SubstrateBlock],
    processor: &SubstrateProcessor,
    handlers: &HandlerChain,
) -> usize {
    let mut dispatched = 0;
    for block in blocks {
        let events = processor.process_block(block).await;
        dispatched += handlers.dispatch_all(events).await;
    }
    dispatched
}

/// How a [`PollerCatchUp`] covers the range it is asked to backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// One poll of at most the last `max_range` blocks of the gap.
    Window { max_range: u64 },
    /// Every block, in batches. With `follow_head` the replay keeps going until it
    /// reaches the head, however far it moved meanwhile.
    Archive { batch_size: u64, follow_head: bool },
}

/// Catch-up that replays blocks.
pub struct PollerCatchUp {
    poller: Poller,
    processor: Arc<SubstrateProcessor>,
    mode: ReplayMode,
}

impl PollerCatchUp {
    pub fn new(poller: Poller, processor: Arc<SubstrateProcessor>, mode: ReplayMode) -> Self {
        Self {
            poller,
            processor,
            mode,
        }
    }
}

#[async_trait]
impl HeadSource for Poller {
    async fn head(&self) -> Result<u64> {
        self.api.head().await
    }
}

#[async_trait]
impl CatchUp for PollerCatchUp {
    async fn head(&self) -> Result<u64> {
        self.poller.api.head().await
    }

    async fn backfill(&self, from: u64, to: u64, handlers: &HandlerChain) -> Result<Backfill> {
        match self.mode {
            ReplayMode::Window { max_range } => {
                let end = to.saturating_add(1);
                if end.saturating_sub(from) > max_range {
                    warn!(
                        from,
                        to,
                        max_range,
                        "gap exceeds max range, replaying only the most recent blocks"
                    );
                }
                let range = DisconnectedRange {
                    start_block: from,
                    end_block: Some(end),
                    max_results: None,
                };
                let blocks = self.poller.poll(range, max_range).await?;
                Ok(Backfill {
                    dispatched: replay(&blocks, &self.processor, handlers).await,
                    last_block: to,
                })
            }
            ReplayMode::Archive {
                batch_size,
                follow_head,
            } => {
                let range = DisconnectedRange {
                    start_block: from,
                    end_block: (!follow_head).then_some(to),
                    max_results: None,
                };
                self.poller
                    .archive(range, batch_size, &self.processor, handlers)
                    .await
            }
        }
    }
}
