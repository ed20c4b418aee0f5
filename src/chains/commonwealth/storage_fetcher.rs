//! Rebuilds project lifecycles from the factory's project list and each project's state.
//! Backing and curation history is not recoverable from storage.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use tracing::{debug, error, info};

use super::contracts::CommonwealthApi;
use super::enricher::project_created;
use super::EventData;
use crate::chains::evm::{fmt_address, LogSource};
use crate::error::{ChainEventsError, Result};
use crate::events::{CWEvent, DisconnectedRange, EntityKind};
use crate::pipeline::StorageFetcher;

pub struct CommonwealthStorageFetcher {
    api: Arc<dyn CommonwealthApi>,
    source: Arc<dyn LogSource>,
    chain: Option<String>,
}

impl CommonwealthStorageFetcher {
    pub fn new(api: Arc<dyn CommonwealthApi>, source: Arc<dyn LogSource>, chain: Option<String>) -> Self {
        Self { api, source, chain }
    }

    async fn head(&self) -> Result<(u64, u64)> {
        let block = self.source.block_number().await?;
        let time = self
            .source
            .block_timestamp(block)
            .await?
            .ok_or_else(|| ChainEventsError::missing(format!("block {block} not found")))?;
        Ok((block, time))
    }

    /// Creation plus the outcome, if the project has one. The bool is true when it does.
    async fn project_events(
        &self,
        head: (u64, u64),
        index: u64,
        project: Address,
    ) -> Result<(Vec<CWEvent>, bool)> {
        let (block, now) = head;
        let info = self.api.project(project).await?;
        let id = fmt_address(&project);
        let (funded, deadline, amount) = (info.funded, info.deadline, info.total_funding);

        let mut events = vec![project_created(block, index, project, info)];
        let completed = if funded {
            events.push(CWEvent::new(
                block,
                EventData::ProjectSucceeded {
                    id,
                    timestamp: deadline.min(now),
                    amount: amount.to_string(),
                },
            ));
            true
        } else if deadline <= now {
            events.push(CWEvent::new(block, EventData::ProjectFailed { id }));
            true
        } else {
            false
        };

        let events = match &self.chain {
            Some(chain) => events.into_iter().map(|e| e.with_chain(chain)).collect(),
            None => events,
        };
        Ok((events, completed))
    }
}

#[async_trait]
impl StorageFetcher for CommonwealthStorageFetcher {
    async fn fetch(
        &self,
        range: Option<DisconnectedRange>,
        fetch_all_completed: bool,
    ) -> Result<Vec<CWEvent>> {
        let head = self.head().await?;
        let range = range.unwrap_or_default();
        if range.start_block > head.0 {
            error!(start = range.start_block, head = head.0, "start block is past the current block");
            return Ok(vec![]);
        }

        let count = self.api.project_count().await?;
        info!(count, "fetching commonwealth projects");
        let mut results = Vec::new();
        let mut fetched = 0usize;
        for index in (0..count).rev() {
            let project = self.api.project_address(index).await?;
            let (events, completed) = self.project_events(head, index, project).await?;
            results.extend(events);
            fetched += 1;

            if completed && !fetch_all_completed {
                debug!(index, "project already completed, halting fetch");
                break;
            }
            if range.max_results.is_some_and(|max| fetched >= max) {
                break;
            }
        }
        Ok(results)
    }

    async fn fetch_one(&self, id: &str, _kind: Option<EntityKind>) -> Result<Vec<CWEvent>> {
        let target: Address = id
            .parse()
            .map_err(|_| ChainEventsError::decode(format!("invalid project address '{id}'")))?;
        let head = self.head().await?;
        let count = self.api.project_count().await?;
        for index in 0..count {
            if self.api.project_address(index).await? == target {
                return Ok(self.project_events(head, index, target).await?.0);
            }
        }
        error!(id, "project not found in factory");
        Ok(vec![])
    }
}
