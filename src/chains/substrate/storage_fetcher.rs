//! Synthesizes events for everything currently open in governance storage.
//!
//! Events carry the head height at fetch time unless storage records a better one
//! (preimages know when they were noted).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::api::SubstrateApi;
use super::queries::{self, BountyStatus};
use super::versions::RuntimePaths;
use super::{CollectiveName, EventData};
use crate::error::{ChainEventsError, Result};
use crate::events::{CWEvent, DisconnectedRange, EntityKind};
use crate::pipeline::StorageFetcher;

pub struct SubstrateStorageFetcher {
    api: Arc<dyn SubstrateApi>,
    chain: Option<String>,
}

fn at(block: u64, data: Vec<EventData>) -> Vec<CWEvent> {
    data.into_iter().map(|d| CWEvent::new(block, d)).collect()
}

impl SubstrateStorageFetcher {
    pub fn new(api: Arc<dyn SubstrateApi>, chain: Option<String>) -> Self {
        Self { api, chain }
    }

    fn api(&self) -> &dyn SubstrateApi {
        self.api.as_ref()
    }

    fn paths(&self) -> RuntimePaths {
        let api = self.api();
        RuntimePaths::resolve(
            &api.runtime(),
            |p| api.has_pallet(p),
            |p, e| api.has_storage(p, e),
        )
    }

    fn label(&self, events: Vec<CWEvent>) -> Vec<CWEvent> {
        match &self.chain {
            Some(chain) => events.into_iter().map(|e| e.with_chain(chain)).collect(),
            None => events,
        }
    }

    pub async fn fetch_identities(&self, addresses: &[String]) -> Result<Vec<CWEvent>> {
        let api = self.api();
        if !api.has_pallet("Identity") {
            info!("identity pallet not found");
            return Ok(vec![]);
        }
        let block = api.head().await?;
        let registrars = queries::registrars(api).await?;

        let mut events = Vec::new();
        for who in addresses {
            let Some(identity) = queries::identity(api, who).await? else {
                continue;
            };
            if identity.display_name.is_empty() {
                continue;
            }
            // judgements from removed registrars are dropped
            let judgements = identity
                .judgements
                .into_iter()
                .filter_map(|(index, judgement)| {
                    let registrar = registrars.get(index as usize).cloned().flatten()?;
                    Some((registrar, judgement))
                })
                .collect();
            events.push(CWEvent::new(
                block,
                EventData::IdentitySet {
                    who: who.clone(),
                    display_name: identity.display_name,
                    judgements,
                },
            ));
        }
        Ok(self.label(events))
    }

    pub async fn fetch_democracy_proposals(&self, block: u64, id: Option<u64>) -> Result<Vec<CWEvent>> {
        let api = self.api();
        if !api.has_pallet("Democracy") {
            return Ok(vec![]);
        }
        info!("fetching democracy proposals");
        let mut data = Vec::new();
        for prop in queries::public_props(api).await? {
            if id.is_some_and(|id| id != prop.index) {
                continue;
            }
            let Some(deposit) = queries::proposal_deposit(api, prop.index).await? else {
                continue;
            };
            data.push(EventData::DemocracyProposed {
                proposal_index: prop.index,
                proposal_hash: prop.hash,
                deposit,
                proposer: prop.proposer,
            });
        }
        info!(count = data.len(), "found democracy proposals");
        Ok(at(block, data))
    }

    pub async fn fetch_democracy_referenda(&self, block: u64, id: Option<u64>) -> Result<Vec<CWEvent>> {
        let api = self.api();
        if !api.has_pallet("Democracy") {
            return Ok(vec![]);
        }
        info!("fetching democracy referenda");
        let mut data: Vec<EventData> = queries::ongoing_referenda(api)
            .await?
            .into_iter()
            .map(|r| EventData::DemocracyStarted {
                referendum_index: r.index,
                proposal_hash: r.hash,
                vote_threshold: r.threshold,
                end_block: r.end,
            })
            .collect();
        // threshold and end are gone once a referendum is queued
        for (dispatch_at, hash, index) in queries::dispatch_queue(api).await? {
            data.push(EventData::DemocracyStarted {
                referendum_index: index,
                proposal_hash: hash,
                vote_threshold: String::new(),
                end_block: 0,
            });
            data.push(EventData::DemocracyPassed {
                referendum_index: index,
                dispatch_block: Some(dispatch_at),
            });
        }
        if let Some(id) = id {
            data.retain(|d| match d {
                EventData::DemocracyStarted {
                    referendum_index, ..
                }
                | EventData::DemocracyPassed {
                    referendum_index, ..
                } => *referendum_index == id,
                _ => false,
            });
        }
        info!(count = data.len(), "found democracy referendum events");
        Ok(at(block, data))
    }

    pub async fn fetch_democracy_preimages(&self, block: u64, hashes: &[String]) -> Result<Vec<CWEvent>> {
        let api = self.api();
        if !api.has_pallet("Democracy") {
            return Ok(vec![]);
        }
        let mut events = Vec::new();
        for hash in hashes {
            let Some(preimage) = queries::preimage(api, hash).await? else {
                continue;
            };
            let Some(call) = preimage.call else {
                continue;
            };
            events.push(CWEvent::new(
                preimage.since.unwrap_or(block),
                EventData::PreimageNoted {
                    proposal_hash: hash.clone(),
                    noter: preimage.provider,
                    preimage: Some(call),
                },
            ));
        }
        info!(count = events.len(), "found preimages");
        Ok(events)
    }

    pub async fn fetch_treasury_proposals(&self, block: u64, id: Option<u64>) -> Result<Vec<CWEvent>> {
        let api = self.api();
        if !api.has_pallet("Treasury") {
            info!("treasury pallet not found");
            return Ok(vec![]);
        }
        let proposals = match id {
            Some(index) => queries::treasury_proposal(api, index)
                .await?
                .map(|p| vec![(index, p)])
                .unwrap_or_default(),
            None => queries::open_treasury_proposals(api).await?,
        };
        let data: Vec<EventData> = proposals
            .into_iter()
            .map(|(index, p)| EventData::TreasuryProposed {
                proposal_index: index,
                proposer: p.proposer,
                value: p.value,
                beneficiary: p.beneficiary,
                bond: p.bond,
            })
            .collect();
        info!(count = data.len(), "found treasury proposals");
        Ok(at(block, data))
    }

    pub async fn fetch_bounties(
        &self,
        block: u64,
        paths: &RuntimePaths,
        id: Option<u64>,
    ) -> Result<Vec<CWEvent>> {
        let api = self.api();
        let pallet = paths.bounties.as_str();
        let mut data = Vec::new();
        for (index, bounty) in queries::bounties(api, pallet).await? {
            if id.is_some_and(|id| id != index) {
                continue;
            }
            let description = queries::bounty_description(api, pallet, index).await?;
            data.push(EventData::TreasuryBountyProposed {
                bounty_index: index,
                proposer: bounty.proposer,
                value: bounty.value.clone(),
                fee: bounty.fee,
                curator_deposit: bounty.curator_deposit,
                bond: bounty.bond,
                description,
            });
            match bounty.status {
                BountyStatus::Active {
                    curator,
                    update_due,
                } => data.push(EventData::TreasuryBountyBecameActive {
                    bounty_index: index,
                    curator: Some(curator),
                    update_due: Some(update_due),
                }),
                BountyStatus::PendingPayout {
                    curator,
                    beneficiary,
                    unlock_at,
                } => {
                    data.push(EventData::TreasuryBountyBecameActive {
                        bounty_index: index,
                        curator: Some(curator.clone()),
                        update_due: Some(block),
                    });
                    data.push(EventData::TreasuryBountyAwarded {
                        bounty_index: index,
                        beneficiary,
                        value: Some(bounty.value),
                        curator: Some(curator),
                        unlock_at: Some(unlock_at),
                    });
                }
                _ => {}
            }
        }
        info!(count = data.len(), "found bounty events");
        Ok(at(block, data))
    }

    pub async fn fetch_collective_proposals(
        &self,
        block: u64,
        collective: CollectiveName,
        id: Option<&str>,
    ) -> Result<Vec<CWEvent>> {
        let api = self.api();
        let pallet = collective.pallet();
        let mut data = Vec::new();
        for hash in queries::collective_proposals(api, pallet).await? {
            if id.is_some_and(|id| id != hash) {
                continue;
            }
            let call = match queries::collective_call(api, pallet, &hash).await {
                Ok(Some(call)) => call,
                Ok(None) => continue,
                Err(e) => {
                    error!(pallet, hash = %hash, "failed to fetch motion: {e}");
                    continue;
                }
            };
            let Some(votes) = queries::collective_votes(api, pallet, &hash).await? else {
                continue;
            };
            data.push(EventData::CollectiveProposed {
                collective_name: Some(collective),
                // not kept in storage
                proposer: String::new(),
                proposal_index: votes.index,
                proposal_hash: hash.clone(),
                threshold: votes.threshold,
                call,
            });
            let ballots = votes
                .ayes
                .into_iter()
                .map(|who| (who, true))
                .chain(votes.nays.into_iter().map(|who| (who, false)));
            for (voter, vote) in ballots {
                data.push(EventData::CollectiveVoted {
                    collective_name: Some(collective),
                    proposal_hash: hash.clone(),
                    voter,
                    vote,
                });
            }
        }
        info!(pallet, count = data.len(), "found collective events");
        Ok(at(block, data))
    }

    pub async fn fetch_signaling_proposals(&self, block: u64, id: Option<&str>) -> Result<Vec<CWEvent>> {
        let api = self.api();
        if !api.has_pallet("Signaling") || !api.has_pallet("Voting") {
            info!("signaling pallet not found");
            return Ok(vec![]);
        }
        let mut new_proposals = Vec::new();
        let mut commit_started = Vec::new();
        let mut voting_started = Vec::new();
        let mut completed = Vec::new();

        for hash in queries::signaling_hashes(api).await? {
            if id.is_some_and(|id| id != hash) {
                continue;
            }
            let Some(proposal) = queries::signaling_proposal(api, &hash).await? else {
                continue;
            };
            let Some(record) = queries::vote_record(api, &proposal.vote_id).await? else {
                continue;
            };
            new_proposals.push(EventData::SignalingNewProposal {
                proposer: proposal.author,
                proposal_hash: hash.clone(),
                vote_id: proposal.vote_id.clone(),
                title: proposal.title,
                description: proposal.contents,
                tally_type: record.tally_type,
                vote_type: record.vote_type,
                choices: record.outcomes,
            });
            match proposal.stage.as_str() {
                "Commit" => commit_started.push(EventData::SignalingCommitStarted {
                    proposal_hash: hash,
                    vote_id: proposal.vote_id,
                    end_block: proposal.transition_time,
                }),
                // voting and completed proposals are assumed to have skipped the commit stage
                "Voting" | "Completed" => {
                    voting_started.push(EventData::SignalingVotingStarted {
                        proposal_hash: hash.clone(),
                        vote_id: proposal.vote_id.clone(),
                        end_block: proposal.transition_time,
                    });
                    if proposal.stage == "Completed" {
                        completed.push(EventData::SignalingVotingCompleted {
                            proposal_hash: hash,
                            vote_id: proposal.vote_id,
                        });
                    }
                }
                _ => {}
            }
        }
        info!(count = new_proposals.len(), "found signaling proposals");
        let data = new_proposals
            .into_iter()
            .chain(commit_started)
            .chain(voting_started)
            .chain(completed)
            .collect();
        Ok(at(block, data))
    }

    pub async fn fetch_tips(&self, block: u64, paths: &RuntimePaths, id: Option<&str>) -> Result<Vec<CWEvent>> {
        let api = self.api();
        let mut data = Vec::new();
        for (hash, tip) in queries::tips(api, &paths.tips).await? {
            if id.is_some_and(|id| id != hash) {
                continue;
            }
            data.push(EventData::NewTip {
                proposal_hash: hash.clone(),
                reason: tip.reason,
                who: tip.who,
                finder: tip.finder,
                deposit: tip.deposit,
                finders_fee: tip.finders_fee,
            });
            for (who, value) in tip.tips {
                data.push(EventData::TipVoted {
                    proposal_hash: hash.clone(),
                    who,
                    value,
                });
            }
            if let Some(closing) = tip.closes {
                data.push(EventData::TipClosing {
                    proposal_hash: hash,
                    closing,
                });
            }
        }
        info!(count = data.len(), "found tip events");
        Ok(at(block, data))
    }
}

fn proposal_hashes(events: &[CWEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match &e.data {
            crate::events::ChainEventData::Substrate(
                EventData::DemocracyProposed { proposal_hash, .. }
                | EventData::DemocracyStarted { proposal_hash, .. },
            ) => Some(proposal_hash.clone()),
            _ => None,
        })
        .collect()
}

fn parse_index(id: &str) -> Result<u64> {
    id.parse()
        .map_err(|_| ChainEventsError::decode(format!("invalid index '{id}'")))
}

#[async_trait]
impl StorageFetcher for SubstrateStorageFetcher {
    /// Storage has no history, so the range is ignored.
    async fn fetch(
        &self,
        _range: Option<DisconnectedRange>,
        _fetch_all_completed: bool,
    ) -> Result<Vec<CWEvent>> {
        let block = self.api().head().await?;
        let paths = self.paths();
        info!(block, "fetching open governance state");

        let proposals = self.fetch_democracy_proposals(block, None).await?;
        let referenda = self.fetch_democracy_referenda(block, None).await?;
        let mut hashes = proposal_hashes(&proposals);
        hashes.extend(proposal_hashes(&referenda));
        hashes.dedup();
        let preimages = self.fetch_democracy_preimages(block, &hashes).await?;

        let mut events = proposals;
        events.extend(referenda);
        events.extend(preimages);
        events.extend(self.fetch_treasury_proposals(block, None).await?);
        events.extend(self.fetch_bounties(block, &paths, None).await?);
        for collective in [CollectiveName::TechnicalCommittee, CollectiveName::Council] {
            events.extend(self.fetch_collective_proposals(block, collective, None).await?);
        }
        events.extend(self.fetch_signaling_proposals(block, None).await?);
        events.extend(self.fetch_tips(block, &paths, None).await?);

        info!(count = events.len(), "fetch complete");
        Ok(self.label(events))
    }

    async fn fetch_one(&self, id: &str, kind: Option<EntityKind>) -> Result<Vec<CWEvent>> {
        let Some(kind) = kind else {
            warn!(id, "entity kind required to fetch a substrate entity");
            return Ok(vec![]);
        };
        let block = self.api().head().await?;
        let events = match kind {
            EntityKind::SubstrateDemocracyProposal => {
                self.fetch_democracy_proposals(block, Some(parse_index(id)?)).await?
            }
            EntityKind::SubstrateDemocracyReferendum => {
                self.fetch_democracy_referenda(block, Some(parse_index(id)?)).await?
            }
            EntityKind::SubstrateDemocracyPreimage => {
                self.fetch_democracy_preimages(block, &[id.to_string()]).await?
            }
            EntityKind::SubstrateTreasuryProposal => {
                self.fetch_treasury_proposals(block, Some(parse_index(id)?)).await?
            }
            EntityKind::SubstrateTreasuryBounty => {
                self.fetch_bounties(block, &self.paths(), Some(parse_index(id)?)).await?
            }
            EntityKind::SubstrateCollectiveProposal => {
                let mut events = Vec::new();
                for collective in [CollectiveName::TechnicalCommittee, CollectiveName::Council] {
                    events.extend(self.fetch_collective_proposals(block, collective, Some(id)).await?);
                }
                events
            }
            EntityKind::SubstrateSignalingProposal => {
                self.fetch_signaling_proposals(block, Some(id)).await?
            }
            EntityKind::SubstrateTipProposal => self.fetch_tips(block, &self.paths(), Some(id)).await?,
            other => {
                error!(id, kind = ?other, "not a substrate entity");
                return Ok(vec![]);
            }
        };
        if events.is_empty() {
            warn!(id, kind = ?kind, "entity not found in storage");
        }
        Ok(self.label(events))
    }
}
