//! Rebuilds proposal history from the DAO's proposal queue.
//!
//! Only the proposal lifecycle is recoverable from storage: votes, ragequits and delegate
//! key changes leave no trace there.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::contracts::{MolochApi, MolochConstants, MolochProposal};
use super::EventData;
use crate::chains::evm::{block_at_or_after, fmt_address, LogSource};
use crate::error::{ChainEventsError, Result};
use crate::events::{CWEvent, DisconnectedRange, EntityKind};
use crate::pipeline::StorageFetcher;

struct Snapshot {
    constants: MolochConstants,
    block: u64,
    timestamp: u64,
}

pub struct MolochStorageFetcher {
    api: Arc<dyn MolochApi>,
    source: Arc<dyn LogSource>,
    version: u8,
    chain: Option<String>,
}

impl MolochStorageFetcher {
    pub fn new(
        api: Arc<dyn MolochApi>,
        source: Arc<dyn LogSource>,
        version: u8,
        chain: Option<String>,
    ) -> Self {
        Self {
            api,
            source,
            version,
            chain,
        }
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let constants = self.api.constants().await?;
        let block = self.source.block_number().await?;
        let timestamp = self
            .source
            .block_timestamp(block)
            .await?
            .ok_or_else(|| ChainEventsError::missing(format!("block {block} not found")))?;
        info!(block, timestamp, "fetched current block");
        Ok(Snapshot {
            constants,
            block,
            timestamp,
        })
    }

    /// Block at which voting on the proposal opened, with its start time.
    async fn start_of(
        &self,
        snapshot: &Snapshot,
        proposal: &MolochProposal,
    ) -> Result<Option<(u64, u64)>> {
        let start_time = snapshot.constants.start_time(proposal.starting_period)?;
        let block = block_at_or_after(self.source.as_ref(), start_time).await?;
        Ok(block.map(|b| (b, start_time)))
    }

    async fn dated_or(&self, timestamp: u64, fallback: u64) -> u64 {
        match block_at_or_after(self.source.as_ref(), timestamp).await {
            Ok(Some(block)) => block,
            Ok(None) => {
                warn!(timestamp, fallback, "no block at timestamp yet, using fallback");
                fallback
            }
            Err(e) => {
                error!(timestamp, fallback, "unable to date block: {e}");
                fallback
            }
        }
    }

    async fn events_from_proposal(
        &self,
        snapshot: &Snapshot,
        index: u64,
        proposal: MolochProposal,
        start_time: u64,
        start_block: u64,
    ) -> Result<Vec<CWEvent>> {
        let c = &snapshot.constants;
        let proposer = fmt_address(&proposal.proposer);
        let applicant = fmt_address(&proposal.applicant);
        let mut events = vec![CWEvent::new(
            start_block,
            EventData::SubmitProposal {
                proposal_index: index,
                delegate_key: None,
                member: proposer.clone(),
                applicant: applicant.clone(),
                token_tribute: proposal.token_tribute.to_string(),
                shares_requested: proposal.shares_requested.to_string(),
                details: proposal.details,
                start_time,
            },
        )];

        if proposal.aborted {
            let abort_time = snapshot.timestamp.min(c.abort_deadline(start_time)?);
            let block = if abort_time == snapshot.timestamp {
                debug!(index, "still inside abort window, using current block");
                snapshot.block
            } else {
                self.dated_or(abort_time, start_block.saturating_add(1)).await
            };
            events.push(CWEvent::new(
                block,
                EventData::Abort {
                    proposal_index: index,
                    applicant,
                },
            ));
        } else if proposal.processed {
            let process_time = c.process_time(start_time)?;
            let block = self.dated_or(process_time, start_block.saturating_add(2)).await;
            events.push(CWEvent::new(
                block,
                EventData::ProcessProposal {
                    proposal_index: index,
                    applicant,
                    member: proposer,
                    token_tribute: proposal.token_tribute.to_string(),
                    shares_requested: proposal.shares_requested.to_string(),
                    did_pass: proposal.did_pass,
                    yes_votes: proposal.yes_votes.to_string(),
                    no_votes: proposal.no_votes.to_string(),
                },
            ));
        }

        Ok(match &self.chain {
            Some(chain) => events.into_iter().map(|e| e.with_chain(chain)).collect(),
            None => events,
        })
    }
}

#[async_trait]
impl StorageFetcher for MolochStorageFetcher {
    async fn fetch(
        &self,
        range: Option<DisconnectedRange>,
        fetch_all_completed: bool,
    ) -> Result<Vec<CWEvent>> {
        if self.version != 1 {
            warn!(version = self.version, "proposal fetch only supported for v1 contracts");
            return Ok(vec![]);
        }
        let snapshot = self.snapshot().await?;

        let range = range.unwrap_or_default();
        let end = range.end_block.unwrap_or(snapshot.block);
        if range.start_block > snapshot.block {
            error!(
                start = range.start_block,
                head = snapshot.block,
                "start block is past the current block"
            );
            return Ok(vec![]);
        }
        if range.start_block > end {
            error!(start = range.start_block, end, "invalid fetch range");
            return Ok(vec![]);
        }
        info!(start = range.start_block, end, "fetching moloch proposals");

        let length = self.api.proposal_queue_length().await?;
        let mut results = Vec::new();
        let mut fetched = 0usize;

        for index in (0..length).rev() {
            let proposal = self.api.proposal(index).await?;
            let Some((start_block, start_time)) = self.start_of(&snapshot, &proposal).await?
            else {
                error!(index, "no block for proposal start time, skipping");
                continue;
            };

            if start_block < range.start_block {
                debug!(index, start_block, "proposal starts before range, ending fetch");
                break;
            }
            if start_block > end {
                continue;
            }

            let completed = proposal.processed && !proposal.aborted;
            let events = self
                .events_from_proposal(&snapshot, index, proposal, start_time, start_block)
                .await?;
            results.extend(events);
            fetched += 1;

            if !fetch_all_completed && completed {
                debug!(index, "proposal already processed, halting fetch");
                break;
            }
            if range.max_results.is_some_and(|max| fetched >= max) {
                debug!(fetched, "reached max results, halting fetch");
                break;
            }
        }
        Ok(results)
    }

    async fn fetch_one(&self, id: &str, _kind: Option<EntityKind>) -> Result<Vec<CWEvent>> {
        if self.version != 1 {
            return Ok(vec![]);
        }
        let index: u64 = id
            .parse()
            .map_err(|_| ChainEventsError::decode(format!("invalid proposal index '{id}'")))?;
        let snapshot = self.snapshot().await?;
        let proposal = match self.api.proposal(index).await {
            Ok(proposal) => proposal,
            Err(e) => {
                error!(index, "moloch proposal not found: {e}");
                return Ok(vec![]);
            }
        };
        let Some((start_block, start_time)) = self.start_of(&snapshot, &proposal).await? else {
            error!(index, "no block for proposal start time");
            return Ok(vec![]);
        };
        self.events_from_proposal(&snapshot, index, proposal, start_time, start_block)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::evm::test_support::linear_chain;
    use crate::chains::moloch::contracts::MockMolochApi;
    use crate::chains::moloch::enricher::fixtures::{constants, proposal};
    use crate::chains::moloch::EventKind;
    use crate::events::ChainEventKind;

    fn api() -> MockMolochApi {
        let mut api = MockMolochApi::new();
        api.expect_constants().returning(|| Ok(constants()));
        api.expect_proposal_queue_length().returning(|| Ok(2));
        api.expect_proposal().returning(|index| {
            Ok(match index {
                0 => MolochProposal {
                    aborted: true,
                    ..proposal(1)
                },
                _ => MolochProposal {
                    processed: true,
                    did_pass: true,
                    ..proposal(10)
                },
            })
        });
        api
    }

    fn fetcher(version: u8) -> MolochStorageFetcher {
        fetcher_over(api(), version)
    }

    fn fetcher_over(api: MockMolochApi, version: u8) -> MolochStorageFetcher {
        MolochStorageFetcher::new(
            Arc::new(api),
            Arc::new(linear_chain(100)),
            version,
            Some("moloch".into()),
        )
    }

    /// Queue with `proposals[i]` at index `i`.
    fn queue(constants: MolochConstants, proposals: Vec<MolochProposal>) -> MockMolochApi {
        let mut api = MockMolochApi::new();
        let length = proposals.len() as u64;
        api.expect_constants().returning(move || Ok(constants));
        api.expect_proposal_queue_length().returning(move || Ok(length));
        api.expect_proposal()
            .returning(move |index| Ok(proposals[index as usize].clone()));
        api
    }

    fn summary(events: &[CWEvent]) -> Vec<(u64, ChainEventKind)> {
        events.iter().map(|e| (e.block_number, e.kind())).collect()
    }

    #[tokio::test]
    async fn stops_at_first_processed_proposal() {
        let events = fetcher(1).fetch(None, false).await.unwrap();
        assert_eq!(
            summary(&events),
            vec![
                (12, ChainEventKind::Moloch(EventKind::SubmitProposal)),
                (14, ChainEventKind::Moloch(EventKind::ProcessProposal)),
            ]
        );
        assert!(events.iter().all(|e| e.chain.as_deref() == Some("moloch")));
    }

    #[tokio::test]
    async fn fetch_all_completed_walks_whole_queue() {
        let events = fetcher(1).fetch(None, true).await.unwrap();
        assert_eq!(
            summary(&events),
            vec![
                (12, ChainEventKind::Moloch(EventKind::SubmitProposal)),
                (14, ChainEventKind::Moloch(EventKind::ProcessProposal)),
                (3, ChainEventKind::Moloch(EventKind::SubmitProposal)),
                (5, ChainEventKind::Moloch(EventKind::Abort)),
            ]
        );
        match &events[2].data {
            crate::events::ChainEventData::Moloch(EventData::SubmitProposal {
                start_time, ..
            }) => assert_eq!(*start_time, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn aborted_proposal_does_not_end_the_walk() {
        let api = queue(
            constants(),
            vec![
                proposal(1),
                MolochProposal {
                    aborted: true,
                    processed: true,
                    ..proposal(10)
                },
            ],
        );
        let events = fetcher_over(api, 1).fetch(None, false).await.unwrap();
        assert_eq!(
            summary(&events),
            vec![
                (12, ChainEventKind::Moloch(EventKind::SubmitProposal)),
                (14, ChainEventKind::Moloch(EventKind::Abort)),
                (3, ChainEventKind::Moloch(EventKind::SubmitProposal)),
            ]
        );
    }

    #[tokio::test]
    async fn overflowing_constants_are_decode_errors() {
        let huge = MolochConstants {
            period_duration: u64::MAX / 2,
            ..constants()
        };
        let api = queue(huge, vec![proposal(3)]);
        assert!(matches!(
            fetcher_over(api, 1).fetch(None, true).await,
            Err(ChainEventsError::Decode(_))
        ));

        let slow = MolochConstants {
            summoning_time: 0,
            period_duration: 1,
            voting_period: u64::MAX,
            grace_period: 1,
            abort_window: 2,
        };
        assert_eq!(slow.start_time(5).unwrap(), 5);
        assert!(matches!(slow.process_time(5), Err(ChainEventsError::Decode(_))));
        assert_eq!(slow.abort_deadline(5).unwrap(), 7);
    }

    #[tokio::test]
    async fn range_bounds_the_walk() {
        let range = DisconnectedRange {
            start_block: 10,
            end_block: None,
            max_results: None,
        };
        let events = fetcher(1).fetch(Some(range), true).await.unwrap();
        assert_eq!(events.len(), 2);

        let capped = DisconnectedRange {
            start_block: 0,
            end_block: Some(50),
            max_results: Some(1),
        };
        let events = fetcher(1).fetch(Some(capped), true).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].block_number, 12);
    }

    #[tokio::test]
    async fn start_past_head_is_empty() {
        let events = fetcher(1)
            .fetch(Some(DisconnectedRange::from_block(101)), false)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn v2_contracts_fetch_nothing() {
        assert!(fetcher(2).fetch(None, true).await.unwrap().is_empty());
        assert!(fetcher(2).fetch_one("0", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_one_rebuilds_a_single_proposal() {
        let events = fetcher(1).fetch_one("0", None).await.unwrap();
        assert_eq!(
            summary(&events),
            vec![
                (3, ChainEventKind::Moloch(EventKind::SubmitProposal)),
                (5, ChainEventKind::Moloch(EventKind::Abort)),
            ]
        );
        assert!(fetcher(1).fetch_one("abc", None).await.is_err());
    }
}
