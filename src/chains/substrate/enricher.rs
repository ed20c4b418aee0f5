use std::collections::BTreeMap;
use std::sync::Arc;

use alloy::primitives::U256;
use futures_util::future::try_join_all;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::api::{KeyArg, SubstrateApi};
use super::block::{
    amount, amount_u128, boolean, dispatch_ok, field, get, int, is_none, list, text, utf8, variant,
    RawEvent, RawExtrinsic, SubstrateBlock,
};
use super::queries::{self, BountyStatus};
use super::versions::{ExposureStorage, RuntimePaths};
use super::{ActiveExposure, CollectiveName, EventData, EventKind, Nominator, ValidatorInfo};
use crate::chains::meets_transfer_threshold;
use crate::config::EnricherConfig;
use crate::error::{ChainEventsError, Result};
use crate::events::CWEvent;

#[derive(Clone)]
pub struct SubstrateEnricher {
    api: Arc<dyn SubstrateApi>,
    threshold_permill: Option<u64>,
}

fn call_only(kind: EventKind) -> ChainEventsError {
    ChainEventsError::decode(format!("{kind:?} is only produced from calls"))
}

fn required<T>(value: Option<T>, what: impl FnOnce() -> String) -> Result<T> {
    value.ok_or_else(|| ChainEventsError::missing(what()))
}

fn account(data: &[JsonValue], index: usize, name: &str) -> Result<String> {
    text(field(data, index, name)?)
}

/// An offline validator is `(id, exposure)` on most runtimes, a bare id on a few.
fn validator_id(value: &JsonValue) -> Result<String> {
    match value {
        JsonValue::Array(pair) => text(field(pair, 0, "validator")?),
        other => text(other),
    }
}

fn exposure_from(value: &JsonValue) -> Result<ActiveExposure> {
    let others = list(get(value, "others")?)?
        .iter()
        .map(|n| {
            Ok(Nominator {
                who: text(get(n, "who")?)?,
                value: amount(get(n, "value")?)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ActiveExposure {
        own: amount(get(value, "own")?)?,
        total: amount(get(value, "total")?)?,
        others,
    })
}

/// `Staked`, `Stash`, `Controller` or the account of `{"Account": ..}`.
fn reward_destination(value: &JsonValue) -> Result<String> {
    match variant(value)? {
        ("Account", account) => text(account),
        (name, _) => Ok(name.to_string()),
    }
}

impl SubstrateEnricher {
    pub fn new(api: Arc<dyn SubstrateApi>, config: &EnricherConfig) -> Self {
        Self {
            api,
            threshold_permill: config.balance_transfer_threshold_permill,
        }
    }

    fn api(&self) -> &dyn SubstrateApi {
        self.api.as_ref()
    }

    /// Builds the event for a runtime event. `Ok(None)` means the event was suppressed.
    pub async fn enrich_event(
        &self,
        block: &SubstrateBlock,
        paths: &RuntimePaths,
        event: &RawEvent,
        kind: EventKind,
    ) -> Result<Option<CWEvent>> {
        use EventKind as K;

        let n = block.number;
        let d = event.data.as_slice();
        let api = self.api();
        let collective_name = CollectiveName::from_pallet(&event.section);

        let event = match kind {
            K::BalanceTransfer => return self.balance_transfer(n, d).await,

            // staking
            K::Slash => {
                let validator = account(d, 0, "validator")?;
                CWEvent::new(
                    n,
                    EventData::Slash {
                        validator: validator.clone(),
                        amount: amount(field(d, 1, "amount")?)?,
                    },
                )
                .include(vec![validator])
            }
            K::Reward => {
                if d.len() < 2 {
                    CWEvent::new(
                        n,
                        EventData::Reward {
                            validator: None,
                            amount: amount(field(d, 0, "amount")?)?,
                        },
                    )
                } else {
                    let validator = account(d, 0, "validator")?;
                    CWEvent::new(
                        n,
                        EventData::Reward {
                            validator: Some(validator.clone()),
                            amount: amount(field(d, 1, "amount")?)?,
                        },
                    )
                    .include(vec![validator])
                }
            }
            K::Bonded | K::Unbonded => {
                let stash = account(d, 0, "stash")?;
                let amount = amount(field(d, 1, "amount")?)?;
                let controller = required(
                    queries::controller(api, Some(block.hash), &stash).await?,
                    || format!("no controller for bonded stash {stash}"),
                )?;
                let data = if kind == K::Bonded {
                    EventData::Bonded {
                        stash: stash.clone(),
                        amount,
                        controller,
                    }
                } else {
                    EventData::Unbonded {
                        stash: stash.clone(),
                        amount,
                        controller,
                    }
                };
                CWEvent::new(n, data).include(vec![stash])
            }
            K::StakingElection => CWEvent::new(
                n,
                EventData::StakingElection {
                    era: queries::active_era(api).await?,
                    validators: queries::session_validators(api).await?,
                },
            ),

            // democracy
            K::VoteDelegated => {
                let target = account(d, 1, "target")?;
                CWEvent::new(
                    n,
                    EventData::VoteDelegated {
                        who: account(d, 0, "who")?,
                        target: target.clone(),
                    },
                )
                .include(vec![target])
            }
            K::DemocracyProposed => {
                let proposal_index = int(field(d, 0, "proposal index")?)?;
                let proposal = required(
                    queries::public_props(api)
                        .await?
                        .into_iter()
                        .find(|p| p.index == proposal_index),
                    || format!("democracy proposal {proposal_index} not found"),
                )?;
                CWEvent::new(
                    n,
                    EventData::DemocracyProposed {
                        proposal_index,
                        proposal_hash: proposal.hash,
                        deposit: amount(field(d, 1, "deposit")?)?,
                        proposer: proposal.proposer.clone(),
                    },
                )
                .exclude(vec![proposal.proposer])
            }
            K::DemocracyTabled => CWEvent::new(
                n,
                EventData::DemocracyTabled {
                    proposal_index: int(field(d, 0, "proposal index")?)?,
                },
            ),
            K::DemocracyStarted => {
                let referendum_index = int(field(d, 0, "referendum index")?)?;
                let referendum = required(
                    queries::referendum(api, referendum_index).await?,
                    || format!("referendum {referendum_index} not found"),
                )?;
                let (threshold, _) = variant(field(d, 1, "threshold")?)?;
                CWEvent::new(
                    n,
                    EventData::DemocracyStarted {
                        referendum_index,
                        proposal_hash: referendum.hash,
                        vote_threshold: threshold.to_string(),
                        end_block: referendum.end,
                    },
                )
            }
            K::DemocracyPassed => {
                let referendum_index = int(field(d, 0, "referendum index")?)?;
                let dispatch_block = queries::dispatch_queue(api)
                    .await?
                    .into_iter()
                    .find(|(_, _, index)| *index == referendum_index)
                    .map(|(at, _, _)| at);
                CWEvent::new(
                    n,
                    EventData::DemocracyPassed {
                        referendum_index,
                        dispatch_block,
                    },
                )
            }
            K::DemocracyNotPassed => CWEvent::new(
                n,
                EventData::DemocracyNotPassed {
                    referendum_index: int(field(d, 0, "referendum index")?)?,
                },
            ),
            K::DemocracyCancelled => CWEvent::new(
                n,
                EventData::DemocracyCancelled {
                    referendum_index: int(field(d, 0, "referendum index")?)?,
                },
            ),
            K::DemocracyExecuted => CWEvent::new(
                n,
                EventData::DemocracyExecuted {
                    referendum_index: int(field(d, 0, "referendum index")?)?,
                    execution_ok: dispatch_ok(field(d, 1, "result")?)?,
                },
            ),
            K::PreimageNoted => {
                let proposal_hash = text(field(d, 0, "proposal hash")?)?;
                let noter = account(d, 1, "noter")?;
                let preimage = queries::preimage(api, &proposal_hash)
                    .await?
                    .and_then(|p| p.call);
                CWEvent::new(
                    n,
                    EventData::PreimageNoted {
                        proposal_hash,
                        noter: noter.clone(),
                        preimage,
                    },
                )
                .exclude(vec![noter])
            }
            K::PreimageUsed => CWEvent::new(
                n,
                EventData::PreimageUsed {
                    proposal_hash: text(field(d, 0, "proposal hash")?)?,
                    noter: account(d, 1, "noter")?,
                },
            ),
            K::PreimageInvalid => CWEvent::new(
                n,
                EventData::PreimageInvalid {
                    proposal_hash: text(field(d, 0, "proposal hash")?)?,
                    referendum_index: int(field(d, 1, "referendum index")?)?,
                },
            ),
            K::PreimageMissing => CWEvent::new(
                n,
                EventData::PreimageMissing {
                    proposal_hash: text(field(d, 0, "proposal hash")?)?,
                    referendum_index: int(field(d, 1, "referendum index")?)?,
                },
            ),
            K::PreimageReaped => {
                let reaper = account(d, 3, "reaper")?;
                CWEvent::new(
                    n,
                    EventData::PreimageReaped {
                        proposal_hash: text(field(d, 0, "proposal hash")?)?,
                        noter: account(d, 1, "noter")?,
                        reaper: reaper.clone(),
                    },
                )
                .exclude(vec![reaper])
            }

            // treasury
            K::TreasuryProposed => {
                let proposal_index = int(field(d, 0, "proposal index")?)?;
                let proposal = required(
                    queries::treasury_proposal(api, proposal_index).await?,
                    || format!("treasury proposal {proposal_index} not found"),
                )?;
                CWEvent::new(
                    n,
                    EventData::TreasuryProposed {
                        proposal_index,
                        proposer: proposal.proposer.clone(),
                        value: proposal.value,
                        beneficiary: proposal.beneficiary,
                        bond: proposal.bond,
                    },
                )
                .exclude(vec![proposal.proposer])
            }
            K::TreasuryAwarded => CWEvent::new(
                n,
                EventData::TreasuryAwarded {
                    proposal_index: int(field(d, 0, "proposal index")?)?,
                    value: amount(field(d, 1, "award")?)?,
                    beneficiary: account(d, 2, "beneficiary")?,
                },
            ),
            K::TreasuryRejected => CWEvent::new(
                n,
                EventData::TreasuryRejected {
                    proposal_index: int(field(d, 0, "proposal index")?)?,
                },
            ),

            // bounties
            K::TreasuryBountyProposed => {
                let bounty_index = int(field(d, 0, "bounty index")?)?;
                let bounty = required(
                    queries::bounty(api, &paths.bounties, bounty_index).await?,
                    || format!("bounty {bounty_index} not found"),
                )?;
                let description =
                    queries::bounty_description(api, &paths.bounties, bounty_index).await?;
                CWEvent::new(
                    n,
                    EventData::TreasuryBountyProposed {
                        bounty_index,
                        proposer: bounty.proposer.clone(),
                        value: bounty.value,
                        fee: bounty.fee,
                        curator_deposit: bounty.curator_deposit,
                        bond: bounty.bond,
                        description,
                    },
                )
                .exclude(vec![bounty.proposer])
            }
            K::TreasuryBountyAwarded => {
                let bounty_index = int(field(d, 0, "bounty index")?)?;
                let bounty = queries::bounty(api, &paths.bounties, bounty_index).await?;
                let (curator, unlock_at) = match bounty.as_ref().map(|b| &b.status) {
                    Some(BountyStatus::PendingPayout {
                        curator, unlock_at, ..
                    }) => (Some(curator.clone()), Some(*unlock_at)),
                    _ => (None, None),
                };
                CWEvent::new(
                    n,
                    EventData::TreasuryBountyAwarded {
                        bounty_index,
                        beneficiary: account(d, 1, "beneficiary")?,
                        value: bounty.map(|b| b.value),
                        curator,
                        unlock_at,
                    },
                )
            }
            K::TreasuryBountyRejected => CWEvent::new(
                n,
                EventData::TreasuryBountyRejected {
                    bounty_index: int(field(d, 0, "bounty index")?)?,
                    bond: amount(field(d, 1, "bond")?)?,
                },
            ),
            K::TreasuryBountyBecameActive => {
                let bounty_index = int(field(d, 0, "bounty index")?)?;
                let status = queries::bounty(api, &paths.bounties, bounty_index)
                    .await?
                    .map(|b| b.status);
                let (curator, update_due) = match status {
                    Some(BountyStatus::Active {
                        curator,
                        update_due,
                    }) => (Some(curator), Some(update_due)),
                    _ => (None, None),
                };
                CWEvent::new(
                    n,
                    EventData::TreasuryBountyBecameActive {
                        bounty_index,
                        curator,
                        update_due,
                    },
                )
            }
            K::TreasuryBountyClaimed => CWEvent::new(
                n,
                EventData::TreasuryBountyClaimed {
                    bounty_index: int(field(d, 0, "bounty index")?)?,
                    payout: amount(field(d, 1, "payout")?)?,
                    beneficiary: account(d, 2, "beneficiary")?,
                },
            ),
            K::TreasuryBountyCanceled => CWEvent::new(
                n,
                EventData::TreasuryBountyCanceled {
                    bounty_index: int(field(d, 0, "bounty index")?)?,
                },
            ),

            // tips
            K::NewTip => {
                let proposal_hash = text(field(d, 0, "tip hash")?)?;
                let tip = required(
                    queries::tip(api, &paths.tips, &proposal_hash).await?,
                    || format!("tip {proposal_hash} not found"),
                )?;
                CWEvent::new(
                    n,
                    EventData::NewTip {
                        proposal_hash,
                        reason: tip.reason,
                        who: tip.who,
                        finder: tip.finder.clone(),
                        deposit: tip.deposit,
                        finders_fee: tip.finders_fee,
                    },
                )
                .exclude(vec![tip.finder])
            }
            K::TipClosing => {
                let proposal_hash = text(field(d, 0, "tip hash")?)?;
                let tip = required(
                    queries::tip(api, &paths.tips, &proposal_hash).await?,
                    || format!("tip {proposal_hash} not found"),
                )?;
                let closing = required(tip.closes, || {
                    format!("tip {proposal_hash} has no closing block")
                })?;
                CWEvent::new(
                    n,
                    EventData::TipClosing {
                        proposal_hash,
                        closing,
                    },
                )
            }
            K::TipClosed => CWEvent::new(
                n,
                EventData::TipClosed {
                    proposal_hash: text(field(d, 0, "tip hash")?)?,
                    who: account(d, 1, "who")?,
                    payout: amount(field(d, 2, "payout")?)?,
                },
            ),
            K::TipRetracted => CWEvent::new(
                n,
                EventData::TipRetracted {
                    proposal_hash: text(field(d, 0, "tip hash")?)?,
                },
            ),
            K::TipSlashed => CWEvent::new(
                n,
                EventData::TipSlashed {
                    proposal_hash: text(field(d, 0, "tip hash")?)?,
                    finder: account(d, 1, "finder")?,
                    deposit: amount(field(d, 2, "deposit")?)?,
                },
            ),

            // elections
            K::ElectionNewTerm => {
                let new_members = list(field(d, 0, "new members")?)?
                    .iter()
                    .map(validator_id)
                    .collect::<Result<Vec<_>>>()?;
                let pallet = event.section.as_str();
                CWEvent::new(
                    n,
                    EventData::ElectionNewTerm {
                        round: queries::election_round(api, pallet).await?,
                        new_members,
                        all_members: queries::election_members(api, pallet).await?,
                    },
                )
            }
            K::ElectionEmptyTerm => {
                let pallet = event.section.as_str();
                CWEvent::new(
                    n,
                    EventData::ElectionEmptyTerm {
                        round: queries::election_round(api, pallet).await?,
                        members: queries::election_members(api, pallet).await?,
                    },
                )
            }
            K::ElectionMemberKicked => CWEvent::new(
                n,
                EventData::ElectionMemberKicked {
                    who: account(d, 0, "member")?,
                },
            ),
            K::ElectionMemberRenounced => CWEvent::new(
                n,
                EventData::ElectionMemberRenounced {
                    who: account(d, 0, "candidate")?,
                },
            ),

            // collectives
            K::CollectiveProposed => {
                let proposer = account(d, 0, "proposer")?;
                let proposal_hash = text(field(d, 2, "proposal hash")?)?;
                let call = required(
                    queries::collective_call(api, &event.section, &proposal_hash).await?,
                    || format!("{} proposal {proposal_hash} not found", event.section),
                )?;
                CWEvent::new(
                    n,
                    EventData::CollectiveProposed {
                        collective_name,
                        proposer: proposer.clone(),
                        proposal_index: int(field(d, 1, "proposal index")?)?,
                        proposal_hash,
                        threshold: int(field(d, 3, "threshold")?)?,
                        call,
                    },
                )
                .exclude(vec![proposer])
            }
            K::CollectiveVoted => {
                let voter = account(d, 0, "voter")?;
                CWEvent::new(
                    n,
                    EventData::CollectiveVoted {
                        collective_name,
                        proposal_hash: text(field(d, 1, "proposal hash")?)?,
                        voter: voter.clone(),
                        vote: boolean(field(d, 2, "vote")?)?,
                    },
                )
                .exclude(vec![voter])
            }
            K::CollectiveApproved => CWEvent::new(
                n,
                EventData::CollectiveApproved {
                    collective_name,
                    proposal_hash: text(field(d, 0, "proposal hash")?)?,
                },
            ),
            K::CollectiveDisapproved => CWEvent::new(
                n,
                EventData::CollectiveDisapproved {
                    collective_name,
                    proposal_hash: text(field(d, 0, "proposal hash")?)?,
                },
            ),
            K::CollectiveExecuted => CWEvent::new(
                n,
                EventData::CollectiveExecuted {
                    collective_name,
                    proposal_hash: text(field(d, 0, "proposal hash")?)?,
                    execution_ok: dispatch_ok(field(d, 1, "result")?)?,
                },
            ),
            K::CollectiveMemberExecuted => CWEvent::new(
                n,
                EventData::CollectiveMemberExecuted {
                    collective_name,
                    proposal_hash: text(field(d, 0, "proposal hash")?)?,
                    execution_ok: dispatch_ok(field(d, 1, "result")?)?,
                },
            ),

            // signaling
            K::SignalingNewProposal => {
                let proposer = account(d, 0, "proposer")?;
                let proposal_hash = text(field(d, 1, "proposal hash")?)?;
                let proposal = required(
                    queries::signaling_proposal(api, &proposal_hash).await?,
                    || format!("signaling proposal {proposal_hash} not found"),
                )?;
                let record = required(
                    queries::vote_record(api, &proposal.vote_id).await?,
                    || format!("vote record {} not found", proposal.vote_id),
                )?;
                CWEvent::new(
                    n,
                    EventData::SignalingNewProposal {
                        proposer: proposer.clone(),
                        proposal_hash,
                        vote_id: proposal.vote_id,
                        title: proposal.title,
                        description: proposal.contents,
                        tally_type: record.tally_type,
                        vote_type: record.vote_type,
                        choices: record.outcomes,
                    },
                )
                .exclude(vec![proposer])
            }
            K::SignalingCommitStarted => CWEvent::new(
                n,
                EventData::SignalingCommitStarted {
                    proposal_hash: text(field(d, 0, "proposal hash")?)?,
                    vote_id: text(field(d, 1, "vote id")?)?,
                    end_block: int(field(d, 2, "end block")?)?,
                },
            ),
            K::SignalingVotingStarted => CWEvent::new(
                n,
                EventData::SignalingVotingStarted {
                    proposal_hash: text(field(d, 0, "proposal hash")?)?,
                    vote_id: text(field(d, 1, "vote id")?)?,
                    end_block: int(field(d, 2, "end block")?)?,
                },
            ),
            K::SignalingVotingCompleted => CWEvent::new(
                n,
                EventData::SignalingVotingCompleted {
                    proposal_hash: text(field(d, 0, "proposal hash")?)?,
                    vote_id: text(field(d, 1, "vote id")?)?,
                },
            ),

            // treasury reward
            K::TreasuryRewardMinting => CWEvent::new(
                n,
                EventData::TreasuryRewardMinting {
                    pot: amount(field(d, 0, "pot")?)?,
                    reward: amount(field(d, 1, "reward")?)?,
                },
            ),
            K::TreasuryRewardMintingV2 => CWEvent::new(
                n,
                EventData::TreasuryRewardMintingV2 {
                    pot: amount(field(d, 0, "pot")?)?,
                    pot_address: account(d, 2, "pot address")?,
                },
            ),

            // identity
            K::IdentitySet => {
                let who = account(d, 0, "who")?;
                let identity = required(queries::identity(api, &who).await?, || {
                    format!("no identity for {who}")
                })?;
                let registrars = queries::registrars(api).await?;
                let judgements = identity
                    .judgements
                    .into_iter()
                    .map(|(index, judgement)| {
                        let registrar = registrars
                            .get(index as usize)
                            .cloned()
                            .flatten()
                            .unwrap_or_else(|| index.to_string());
                        (registrar, judgement)
                    })
                    .collect();
                CWEvent::new(
                    n,
                    EventData::IdentitySet {
                        who: who.clone(),
                        display_name: identity.display_name,
                        judgements,
                    },
                )
                .exclude(vec![who])
            }
            K::JudgementGiven => {
                let who = account(d, 0, "target")?;
                let registrar_index = int(field(d, 1, "registrar index")?)?;
                let registrar = required(
                    queries::registrars(api)
                        .await?
                        .get(registrar_index as usize)
                        .cloned()
                        .flatten(),
                    || format!("registrar {registrar_index} not found"),
                )?;
                let identity = required(queries::identity(api, &who).await?, || {
                    format!("no identity for {who}")
                })?;
                let judgement = required(
                    identity
                        .judgements
                        .into_iter()
                        .find(|(index, _)| *index == registrar_index)
                        .map(|(_, j)| j),
                    || format!("no judgement from registrar {registrar_index} for {who}"),
                )?;
                CWEvent::new(
                    n,
                    EventData::JudgementGiven {
                        who: who.clone(),
                        registrar,
                        judgement,
                    },
                )
                .include(vec![who])
            }
            K::IdentityCleared => {
                let who = account(d, 0, "who")?;
                CWEvent::new(n, EventData::IdentityCleared { who: who.clone() }).exclude(vec![who])
            }
            K::IdentityKilled => {
                let who = account(d, 0, "who")?;
                CWEvent::new(n, EventData::IdentityKilled { who: who.clone() }).exclude(vec![who])
            }

            // session, im-online, offences
            K::NewSession => self.new_session(n, paths, d).await?,
            K::AllGood => CWEvent::new(
                n,
                EventData::AllGood {
                    session_index: queries::session_index(api).await?.saturating_sub(1),
                    validators: queries::session_validators(api).await?,
                },
            ),
            K::SomeOffline => {
                let validators = list(field(d, 0, "offline")?)?
                    .iter()
                    .map(validator_id)
                    .collect::<Result<Vec<_>>>()?;
                CWEvent::new(
                    n,
                    EventData::SomeOffline {
                        session_index: queries::session_index(api).await?.saturating_sub(1),
                        validators,
                    },
                )
            }
            K::HeartbeatReceived => CWEvent::new(
                n,
                EventData::HeartbeatReceived {
                    authority_id: text(field(d, 0, "authority id")?)?,
                },
            ),
            K::Offence => self.offence(n, d).await?,

            K::DemocracySeconded
            | K::DemocracyVoted
            | K::TipVoted
            | K::ElectionCandidacySubmitted
            | K::TreasuryBountyExtended => return Err(call_only(kind)),
        };
        Ok(Some(event))
    }

    /// Builds the event for a successful call.
    pub async fn enrich_extrinsic(
        &self,
        block: &SubstrateBlock,
        paths: &RuntimePaths,
        extrinsic: &RawExtrinsic,
        kind: EventKind,
    ) -> Result<Option<CWEvent>> {
        use EventKind as K;

        let n = block.number;
        let args = extrinsic.args.as_slice();
        let signer = || {
            required(extrinsic.signer.clone(), || {
                format!("{}.{} has no signer", extrinsic.section, extrinsic.method)
            })
        };

        let event = match kind {
            K::DemocracySeconded => {
                let who = signer()?;
                CWEvent::new(
                    n,
                    EventData::DemocracySeconded {
                        proposal_index: int(field(args, 0, "proposal")?)?,
                        who: who.clone(),
                    },
                )
                .exclude(vec![who])
            }
            K::DemocracyVoted => {
                let who = signer()?;
                let (vote, balance) = match variant(field(args, 1, "vote")?)? {
                    ("Standard", fields) => (int(get(fields, "vote")?)?, amount(get(fields, "balance")?)?),
                    (other, _) => {
                        return Err(ChainEventsError::decode(format!(
                            "unsupported {other} vote"
                        )))
                    }
                };
                CWEvent::new(
                    n,
                    EventData::DemocracyVoted {
                        referendum_index: int(field(args, 0, "referendum index")?)?,
                        who: who.clone(),
                        is_aye: vote & 0x80 != 0,
                        conviction: (vote & 0x7f) as u8,
                        balance,
                    },
                )
                .exclude(vec![who])
            }
            K::TipVoted => CWEvent::new(
                n,
                EventData::TipVoted {
                    proposal_hash: text(field(args, 0, "tip hash")?)?,
                    who: signer()?,
                    value: amount(field(args, 1, "tip value")?)?,
                },
            ),
            K::ElectionCandidacySubmitted => {
                let candidate = signer()?;
                CWEvent::new(
                    n,
                    EventData::ElectionCandidacySubmitted {
                        round: queries::election_round(self.api(), &extrinsic.section).await?,
                        candidate: candidate.clone(),
                    },
                )
                .exclude(vec![candidate])
            }
            K::TreasuryBountyExtended => CWEvent::new(
                n,
                EventData::TreasuryBountyExtended {
                    bounty_index: int(field(args, 0, "bounty index")?)?,
                    remark: utf8(field(args, 1, "remark")?)?,
                },
            ),
            other => {
                debug!(block = n, paths = ?paths.spec, kind = ?other, "not a call kind");
                return Err(ChainEventsError::decode(format!(
                    "{other:?} is not produced from calls"
                )));
            }
        };
        Ok(Some(event))
    }

    async fn balance_transfer(&self, n: u64, d: &[JsonValue]) -> Result<Option<CWEvent>> {
        let sender = account(d, 0, "from")?;
        let dest = account(d, 1, "to")?;
        let value = amount_u128(field(d, 2, "amount")?)?;

        if let Some(permill) = self.threshold_permill {
            let issuance = required(
                self.api()
                    .storage(None, "Balances", "TotalIssuance", vec![])
                    .await?,
                || "no total issuance".to_string(),
            )?;
            let total = amount_u128(&issuance)?;
            if !meets_transfer_threshold(U256::from(value), U256::from(total), permill) {
                debug!(block = n, value, "transfer below threshold, skipping");
                return Ok(None);
            }
        }

        Ok(Some(
            CWEvent::new(
                n,
                EventData::BalanceTransfer {
                    sender: sender.clone(),
                    dest: dest.clone(),
                    value: value.to_string(),
                },
            )
            .exclude(vec![sender, dest]),
        ))
    }

    async fn offence(&self, n: u64, d: &[JsonValue]) -> Result<CWEvent> {
        let api = self.api();
        let offence_kind = text(field(d, 0, "kind")?)?;
        let opaque_time_slot = text(field(d, 1, "time slot")?)?;
        // only old runtimes report whether the offence was applied
        let applied = match d.get(2) {
            Some(applied) => boolean(applied)?,
            None => true,
        };

        let report_ids = match api
            .storage(
                None,
                "Offences",
                "ConcurrentReportsIndex",
                vec![KeyArg::hash(&offence_kind)?, KeyArg::hash(&opaque_time_slot)?],
            )
            .await?
        {
            Some(ids) => super::block::texts(&ids)?,
            None => vec![],
        };
        let mut offenders = Vec::new();
        for id in report_ids {
            if let Some(report) = api
                .storage(None, "Offences", "Reports", vec![KeyArg::hash(&id)?])
                .await?
            {
                offenders.push(validator_id(get(&report, "offender")?)?);
            }
        }

        Ok(CWEvent::new(
            n,
            EventData::Offence {
                offence_kind,
                opaque_time_slot,
                applied,
                offenders,
            },
        ))
    }

    async fn new_session(&self, n: u64, paths: &RuntimePaths, d: &[JsonValue]) -> Result<CWEvent> {
        let api = self.api();
        let session_index = int(field(d, 0, "session index")?)?;
        let active = queries::session_validators(api).await?;
        let current_era = match api.storage(None, "Staking", "CurrentEra", vec![]).await? {
            Some(era) if !is_none(&era) => Some(int(&era)?),
            _ => None,
        };

        let waiting = api
            .storage_entries(None, "Staking", "Validators", vec![])
            .await?
            .into_iter()
            .filter_map(|(keys, _)| keys.first().and_then(|k| text(k).ok()))
            .filter(|v| !active.contains(v))
            .collect();

        let era = match paths.exposures {
            ExposureStorage::ErasStakers => current_era,
            ExposureStorage::Stakers => None,
        };
        let points = match era {
            Some(era) => self.era_points(era).await?,
            None => BTreeMap::new(),
        };

        let details =
            try_join_all(active.iter().map(|v| self.validator_details(era, v))).await?;

        let mut active_exposures = BTreeMap::new();
        let mut validator_info = BTreeMap::new();
        for (validator, (exposure, mut info)) in active.iter().zip(details) {
            if let Some(exposure) = exposure {
                active_exposures.insert(validator.clone(), exposure);
            }
            info.era_points = points.get(validator).copied().unwrap_or_default();
            validator_info.insert(validator.clone(), info);
        }

        Ok(CWEvent::new(
            n,
            EventData::NewSession {
                active_exposures,
                active,
                waiting,
                session_index,
                current_era,
                validator_info,
            },
        ))
    }

    async fn era_points(&self, era: u64) -> Result<BTreeMap<String, u64>> {
        let Some(points) = self
            .api()
            .storage(None, "Staking", "ErasRewardPoints", vec![KeyArg::Int(era.into())])
            .await?
        else {
            return Ok(BTreeMap::new());
        };
        list(get(&points, "individual")?)?
            .iter()
            .map(|entry| {
                let pair = list(entry)?;
                Ok((text(field(pair, 0, "validator")?)?, int(field(pair, 1, "points")?)?))
            })
            .collect()
    }

    /// Exposure and info for one active validator. `era` selects the per-era storage.
    async fn validator_details(
        &self,
        era: Option<u64>,
        validator: &str,
    ) -> Result<(Option<ActiveExposure>, ValidatorInfo)> {
        let api = self.api();
        let who = KeyArg::Account(validator.to_string());

        let (exposure, prefs) = match era {
            Some(era) => (
                api.storage(None, "Staking", "ErasStakers", vec![KeyArg::Int(era.into()), who.clone()])
                    .await?,
                api.storage(
                    None,
                    "Staking",
                    "ErasValidatorPrefs",
                    vec![KeyArg::Int(era.into()), who.clone()],
                )
                .await?,
            ),
            None => (
                api.storage(None, "Staking", "Stakers", vec![who.clone()]).await?,
                api.storage(None, "Staking", "Validators", vec![who.clone()]).await?,
            ),
        };

        let controller = queries::controller(api, None, validator)
            .await?
            .unwrap_or_else(|| validator.to_string());
        let reward_destination = match api
            .storage(None, "Staking", "Payee", vec![who.clone()])
            .await?
        {
            Some(payee) if !is_none(&payee) => reward_destination(&payee)?,
            _ => String::new(),
        };
        let next_session_ids = match api.storage(None, "Session", "NextKeys", vec![who]).await? {
            Some(JsonValue::Object(keys)) => keys.values().map(text).collect::<Result<Vec<_>>>()?,
            Some(other) if !is_none(&other) => super::block::texts(&other)?,
            _ => vec![],
        };

        let info = ValidatorInfo {
            commission_perbill: match prefs {
                Some(prefs) => int(get(&prefs, "commission")?)?,
                None => 0,
            },
            controller_id: controller,
            reward_destination,
            next_session_ids,
            era_points: 0,
        };
        Ok((exposure.as_ref().map(exposure_from).transpose()?, info))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::chains::substrate::api::MockSubstrateApi;
    use crate::chains::substrate::block::test_support::{block, event};
    use crate::chains::substrate::block::RuntimeSpec;
    use serde_json::json;

    pub const ALICE: &str = "alice";
    pub const BOB: &str = "bob";
    pub const CHARLIE: &str = "charlie";
    pub const HASH: &str = "0x1234";
    pub const REASON: &str = "0x5678";

    pub fn hex_text(s: &str) -> String {
        format!("0x{}", hex::encode(s))
    }

    fn exposure() -> JsonValue {
        json!({ "total": "300", "own": "100", "others": [{ "who": CHARLIE, "value": "200" }] })
    }

    pub fn bounty() -> JsonValue {
        json!({
            "proposer": ALICE, "value": "1000", "fee": "10", "curator_deposit": "5", "bond": "20",
            "status": { "Active": { "curator": BOB, "update_due": 300 } }
        })
    }

    pub fn tip() -> JsonValue {
        json!({
            "reason": REASON, "who": BOB, "finder": ALICE, "deposit": "3", "closes": 400,
            "tips": [[CHARLIE, "7"]], "finders_fee": true
        })
    }

    pub fn ongoing() -> JsonValue {
        json!({ "Ongoing": {
            "end": 200, "proposal_hash": HASH, "threshold": "SuperMajorityApprove", "delay": 10,
            "tally": { "ayes": 0, "nays": 0, "turnout": 0 }
        }})
    }

    /// Storage of a small edgeware-like chain.
    pub fn chain_state(pallet: &str, entry: &str) -> Option<JsonValue> {
        let value = match (pallet, entry) {
            ("Balances", "TotalIssuance") => json!("1000000"),
            ("Staking", "Bonded") => json!("controller"),
            ("Staking", "ActiveEra") => json!({ "index": 7, "start": null }),
            ("Staking", "CurrentEra") => json!(7),
            ("Staking", "ErasStakers") => exposure(),
            ("Staking", "ErasValidatorPrefs") => json!({ "commission": 50_000_000, "blocked": false }),
            ("Staking", "Payee") => json!("Staked"),
            ("Staking", "ErasRewardPoints") => {
                json!({ "total": 30, "individual": [[ALICE, 20], [BOB, 10]] })
            }
            ("Session", "Validators") => json!([ALICE, BOB]),
            ("Session", "CurrentIndex") => json!(12),
            ("Session", "NextKeys") => json!({ "babe": "0x01", "grandpa": "0x02" }),
            ("Democracy", "PublicProps") => json!([[3, HASH, ALICE]]),
            ("Democracy", "DepositOf") => json!([[BOB], "100"]),
            ("Democracy", "ReferendumInfoOf") => ongoing(),
            ("Democracy", "DispatchQueue") => json!([[250, HASH, 4]]),
            ("Democracy", "Preimages") => json!({ "Available": {
                "data": "0x0500", "provider": ALICE, "deposit": "10", "since": 90, "expiry": null
            }}),
            ("Treasury", "Proposals") => {
                json!({ "proposer": ALICE, "value": "500", "beneficiary": BOB, "bond": "25" })
            }
            ("Treasury", "ProposalCount") => json!(2),
            ("Treasury", "Approvals") => json!([1]),
            ("Bounties", "Bounties") => bounty(),
            ("Bounties", "BountyDescriptions") => json!(hex_text("fix the bridge")),
            ("Tips", "Tips") => tip(),
            ("Tips", "Reasons") => json!(hex_text("great work")),
            ("ElectionsPhragmen", "Members") => json!([
                { "who": ALICE, "stake": "1", "deposit": "1" },
                { "who": BOB, "stake": "1", "deposit": "1" }
            ]),
            ("ElectionsPhragmen", "ElectionRounds") => json!(5),
            ("Council", "ProposalOf") => json!({ "Treasury": { "approve_proposal": { "proposal_id": 1 } } }),
            ("Council", "Voting") => {
                json!({ "index": 2, "threshold": 3, "ayes": [ALICE], "nays": [BOB], "end": 500 })
            }
            ("Council", "Proposals") => json!([HASH]),
            ("TechnicalCommittee", "Proposals") => json!([]),
            ("Signaling", "ProposalOf") => json!({
                "author": ALICE, "stage": "Voting", "transition_time": 600,
                "title": hex_text("title"), "contents": hex_text("contents"), "vote_id": 9
            }),
            ("Signaling", "ActiveProposals") => json!([[HASH, 600]]),
            ("Signaling", "InactiveProposals" | "CompletedProposals") => json!([]),
            ("Voting", "VoteRecords") => json!({
                "id": 9, "commitments": [], "reveals": [],
                "data": {
                    "initiator": ALICE, "stage": "Voting", "vote_type": "Binary",
                    "tally_type": "OnePerson", "is_commit_reveal": false
                },
                "outcomes": ["0x01", "0x02"]
            }),
            ("Identity", "IdentityOf") => json!({
                "judgements": [[0, "Reasonable"]], "deposit": "1",
                "info": { "display": { "Raw5": hex_text("Alice") } }
            }),
            ("Identity", "Registrars") => json!([{ "account": CHARLIE, "fee": "0", "fields": 0 }]),
            ("Offences", "ConcurrentReportsIndex") => json!(["0xdead"]),
            ("Offences", "Reports") => json!({ "offender": [BOB, exposure()], "reporters": [] }),
            _ => return None,
        };
        Some(value)
    }

    pub fn chain_entries(pallet: &str, entry: &str) -> Vec<(Vec<JsonValue>, JsonValue)> {
        let prefs = json!({ "commission": 0, "blocked": false });
        match (pallet, entry) {
            ("Staking", "Validators") => vec![
                (vec![json!(ALICE)], prefs.clone()),
                (vec![json!(CHARLIE)], prefs),
            ],
            ("Democracy", "ReferendumInfoOf") => vec![
                (vec![json!(4)], ongoing()),
                (vec![json!(1)], json!({ "Finished": { "approved": true, "end": 50 } })),
            ],
            ("Bounties", "Bounties") => vec![(vec![json!(0)], bounty())],
            ("Tips", "Tips") => vec![(vec![json!(HASH)], tip())],
            _ => vec![],
        }
    }

    /// Chain state without the metadata probes, for tests that count them.
    pub fn api_without_probes() -> MockSubstrateApi {
        let mut api = MockSubstrateApi::new();
        api.expect_runtime()
            .returning(|| RuntimeSpec::new("edgeware", 40));
        api.expect_storage()
            .returning(|_, pallet, entry, _| Ok(chain_state(pallet, entry)));
        api.expect_storage_entries()
            .returning(|_, pallet, entry, _| Ok(chain_entries(pallet, entry)));
        api.expect_decode_call()
            .returning(|_| Ok(json!({ "Balances": { "transfer": { "dest": BOB, "value": 5 } } })));
        api
    }

    pub fn api() -> MockSubstrateApi {
        let mut api = api_without_probes();
        api.expect_has_pallet().returning(|_| true);
        api.expect_has_storage().returning(|_, _| true);
        api
    }

    pub fn paths() -> RuntimePaths {
        RuntimePaths::resolve(&RuntimeSpec::new("edgeware", 40), |_| true, |_, _| true)
    }

    pub fn extrinsic(section: &str, method: &str, signer: &str, args: Vec<JsonValue>) -> RawExtrinsic {
        RawExtrinsic {
            index: 1,
            section: section.into(),
            method: method.into(),
            signer: Some(signer.into()),
            args,
        }
    }

    pub fn every_event_kind() -> Vec<(EventKind, RawEvent)> {
        use EventKind as K;
        let exposure = exposure();
        vec![
            (K::BalanceTransfer, event("Balances", "Transfer", vec![json!(ALICE), json!(BOB), json!("1000")])),
            (K::Slash, event("Staking", "Slashed", vec![json!(ALICE), json!("10")])),
            (K::Reward, event("Staking", "Rewarded", vec![json!(ALICE), json!("10")])),
            (K::Bonded, event("Staking", "Bonded", vec![json!(ALICE), json!("10")])),
            (K::Unbonded, event("Staking", "Unbonded", vec![json!(ALICE), json!("10")])),
            (K::StakingElection, event("Staking", "StakersElected", vec![])),
            (K::VoteDelegated, event("Democracy", "Delegated", vec![json!(ALICE), json!(BOB)])),
            (K::DemocracyProposed, event("Democracy", "Proposed", vec![json!(3), json!("100")])),
            (K::DemocracyTabled, event("Democracy", "Tabled", vec![json!(3), json!("100"), json!([ALICE])])),
            (K::DemocracyStarted, event("Democracy", "Started", vec![json!(4), json!("SuperMajorityApprove")])),
            (K::DemocracyPassed, event("Democracy", "Passed", vec![json!(4)])),
            (K::DemocracyNotPassed, event("Democracy", "NotPassed", vec![json!(4)])),
            (K::DemocracyCancelled, event("Democracy", "Cancelled", vec![json!(4)])),
            (K::DemocracyExecuted, event("Democracy", "Executed", vec![json!(4), json!({ "Ok": [] })])),
            (K::PreimageNoted, event("Democracy", "PreimageNoted", vec![json!(HASH), json!(ALICE), json!("10")])),
            (K::PreimageUsed, event("Democracy", "PreimageUsed", vec![json!(HASH), json!(ALICE), json!("10")])),
            (K::PreimageInvalid, event("Democracy", "PreimageInvalid", vec![json!(HASH), json!(4)])),
            (K::PreimageMissing, event("Democracy", "PreimageMissing", vec![json!(HASH), json!(4)])),
            (
                K::PreimageReaped,
                event("Democracy", "PreimageReaped", vec![json!(HASH), json!(ALICE), json!("10"), json!(BOB)]),
            ),
            (K::TreasuryProposed, event("Treasury", "Proposed", vec![json!(0)])),
            (K::TreasuryAwarded, event("Treasury", "Awarded", vec![json!(0), json!("500"), json!(BOB)])),
            (K::TreasuryRejected, event("Treasury", "Rejected", vec![json!(0), json!("25")])),
            (K::TreasuryBountyProposed, event("Bounties", "BountyProposed", vec![json!(0)])),
            (K::TreasuryBountyAwarded, event("Bounties", "BountyAwarded", vec![json!(0), json!(BOB)])),
            (K::TreasuryBountyRejected, event("Bounties", "BountyRejected", vec![json!(0), json!("20")])),
            (K::TreasuryBountyBecameActive, event("Bounties", "BountyBecameActive", vec![json!(0)])),
            (
                K::TreasuryBountyClaimed,
                event("Bounties", "BountyClaimed", vec![json!(0), json!("990"), json!(BOB)]),
            ),
            (K::TreasuryBountyCanceled, event("Bounties", "BountyCanceled", vec![json!(0)])),
            (K::NewTip, event("Tips", "NewTip", vec![json!(HASH)])),
            (K::TipClosing, event("Tips", "TipClosing", vec![json!(HASH)])),
            (K::TipClosed, event("Tips", "TipClosed", vec![json!(HASH), json!(BOB), json!("7")])),
            (K::TipRetracted, event("Tips", "TipRetracted", vec![json!(HASH)])),
            (K::TipSlashed, event("Tips", "TipSlashed", vec![json!(HASH), json!(ALICE), json!("3")])),
            (
                K::ElectionNewTerm,
                event("ElectionsPhragmen", "NewTerm", vec![json!([[ALICE, "1"], [BOB, "1"]])]),
            ),
            (K::ElectionEmptyTerm, event("ElectionsPhragmen", "EmptyTerm", vec![])),
            (K::ElectionMemberKicked, event("ElectionsPhragmen", "MemberKicked", vec![json!(ALICE)])),
            (K::ElectionMemberRenounced, event("ElectionsPhragmen", "Renounced", vec![json!(ALICE)])),
            (
                K::CollectiveProposed,
                event("Council", "Proposed", vec![json!(ALICE), json!(2), json!(HASH), json!(3)]),
            ),
            (
                K::CollectiveVoted,
                event("Council", "Voted", vec![json!(BOB), json!(HASH), json!(true), json!(1), json!(0)]),
            ),
            (K::CollectiveApproved, event("Council", "Approved", vec![json!(HASH)])),
            (K::CollectiveDisapproved, event("Council", "Disapproved", vec![json!(HASH)])),
            (K::CollectiveExecuted, event("Council", "Executed", vec![json!(HASH), json!({ "Ok": [] })])),
            (
                K::CollectiveMemberExecuted,
                event("Council", "MemberExecuted", vec![json!(HASH), json!({ "Err": "BadOrigin" })]),
            ),
            (K::SignalingNewProposal, event("Signaling", "NewProposal", vec![json!(ALICE), json!(HASH)])),
            (
                K::SignalingCommitStarted,
                event("Signaling", "CommitStarted", vec![json!(HASH), json!(9), json!(700)]),
            ),
            (
                K::SignalingVotingStarted,
                event("Signaling", "VotingStarted", vec![json!(HASH), json!(9), json!(700)]),
            ),
            (K::SignalingVotingCompleted, event("Signaling", "VotingCompleted", vec![json!(HASH), json!(9)])),
            (
                K::TreasuryRewardMinting,
                event("TreasuryReward", "TreasuryMinting", vec![json!("5000"), json!("100"), json!(ALICE)]),
            ),
            (
                K::TreasuryRewardMintingV2,
                event("TreasuryReward", "TreasuryMinting", vec![json!("5000"), json!("100"), json!(ALICE)]),
            ),
            (K::IdentitySet, event("Identity", "IdentitySet", vec![json!(ALICE)])),
            (K::JudgementGiven, event("Identity", "JudgementGiven", vec![json!(ALICE), json!(0)])),
            (K::IdentityCleared, event("Identity", "IdentityCleared", vec![json!(ALICE), json!("1")])),
            (K::IdentityKilled, event("Identity", "IdentityKilled", vec![json!(ALICE), json!("1")])),
            (K::NewSession, event("Session", "NewSession", vec![json!(12)])),
            (K::AllGood, event("ImOnline", "AllGood", vec![])),
            (K::HeartbeatReceived, event("ImOnline", "HeartbeatReceived", vec![json!("0xbeef")])),
            (K::SomeOffline, event("ImOnline", "SomeOffline", vec![json!([[BOB, exposure]])])),
            (K::Offence, event("Offences", "Offence", vec![json!("0x696d2d6f6e6c696e65"), json!("0x0100")])),
        ]
    }

    pub fn every_call_kind() -> Vec<(EventKind, RawExtrinsic)> {
        use EventKind as K;
        vec![
            (K::DemocracySeconded, extrinsic("Democracy", "second", BOB, vec![json!(3), json!(10)])),
            (
                K::DemocracyVoted,
                extrinsic(
                    "Democracy",
                    "vote",
                    BOB,
                    vec![json!(4), json!({ "Standard": { "vote": 129, "balance": "50" } })],
                ),
            ),
            (K::TipVoted, extrinsic("Tips", "tip", CHARLIE, vec![json!(HASH), json!("7")])),
            (
                K::ElectionCandidacySubmitted,
                extrinsic("ElectionsPhragmen", "submit_candidacy", CHARLIE, vec![json!(3)]),
            ),
            (
                K::TreasuryBountyExtended,
                extrinsic("Bounties", "extend_bounty_expiry", BOB, vec![json!(0), json!(hex_text("more time"))]),
            ),
        ]
    }

    pub fn test_block() -> SubstrateBlock {
        block(10, vec![], vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::chains::substrate::api::MockSubstrateApi;
    use crate::chains::substrate::IdentityJudgement;
    use crate::events::{ChainEventData, ChainEventKind};
    use serde_json::json;
    use strum::IntoEnumIterator;

    fn enricher(api: MockSubstrateApi, permill: Option<u64>) -> SubstrateEnricher {
        SubstrateEnricher::new(
            Arc::new(api),
            &EnricherConfig {
                balance_transfer_threshold_permill: permill,
            },
        )
    }

    async fn enrich(kind: EventKind) -> CWEvent {
        let (_, raw) = every_event_kind()
            .into_iter()
            .find(|(k, _)| *k == kind)
            .unwrap();
        enricher(api(), None)
            .enrich_event(&test_block(), &paths(), &raw, kind)
            .await
            .unwrap()
            .unwrap()
    }

    fn data(event: &CWEvent) -> &EventData {
        match &event.data {
            ChainEventData::Substrate(data) => data,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_kind_enriches_to_itself() {
        let events = every_event_kind();
        let calls = every_call_kind();
        let enricher = enricher(api(), None);
        let block = test_block();

        for kind in EventKind::iter() {
            let result = if let Some((_, raw)) = events.iter().find(|(k, _)| *k == kind) {
                enricher.enrich_event(&block, &paths(), raw, kind).await
            } else if let Some((_, raw)) = calls.iter().find(|(k, _)| *k == kind) {
                enricher.enrich_extrinsic(&block, &paths(), raw, kind).await
            } else {
                panic!("no fixture for {kind:?}");
            };
            let event = result
                .unwrap_or_else(|e| panic!("{kind:?} failed: {e}"))
                .unwrap_or_else(|| panic!("{kind:?} was suppressed"));
            assert_eq!(event.kind(), ChainEventKind::Substrate(kind));
            assert_eq!(event.block_number, 10);
        }
    }

    #[tokio::test]
    async fn enrichment_is_repeatable() {
        let first = enrich(EventKind::NewSession).await;
        let second = enrich(EventKind::NewSession).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn transfer_threshold_suppresses_small_transfers() {
        let (_, raw) = every_event_kind().remove(0);
        // 1000 of 1_000_000 issued is exactly 0.1%
        for (permill, emitted) in [(None, true), (Some(1000), true), (Some(1001), false)] {
            let result = enricher(api(), permill)
                .enrich_event(&test_block(), &paths(), &raw, EventKind::BalanceTransfer)
                .await
                .unwrap();
            assert_eq!(result.is_some(), emitted, "permill {permill:?}");
        }

        let event = enrich(EventKind::BalanceTransfer).await;
        assert_eq!(
            event.exclude_addresses,
            Some(vec![ALICE.to_string(), BOB.to_string()])
        );
        assert_eq!(
            serde_json::to_value(&event).unwrap()["data"]["value"],
            json!("1000")
        );
    }

    #[tokio::test]
    async fn bonding_needs_a_controller() {
        let mut api = MockSubstrateApi::new();
        api.expect_storage().returning(|_, _, _, _| Ok(None));
        let (_, raw) = every_event_kind()
            .into_iter()
            .find(|(k, _)| *k == EventKind::Bonded)
            .unwrap();
        let result = enricher(api, None)
            .enrich_event(&test_block(), &paths(), &raw, EventKind::Bonded)
            .await;
        assert!(matches!(result, Err(ChainEventsError::MissingData(_))));

        let event = enrich(EventKind::Bonded).await;
        assert_eq!(
            data(&event),
            &EventData::Bonded {
                stash: ALICE.into(),
                amount: "10".into(),
                controller: "controller".into()
            }
        );
        assert_eq!(event.include_addresses, Some(vec![ALICE.to_string()]));
    }

    #[tokio::test]
    async fn democracy_lookups() {
        let proposed = enrich(EventKind::DemocracyProposed).await;
        assert_eq!(
            data(&proposed),
            &EventData::DemocracyProposed {
                proposal_index: 3,
                proposal_hash: HASH.into(),
                deposit: "100".into(),
                proposer: ALICE.into()
            }
        );
        assert_eq!(proposed.exclude_addresses, Some(vec![ALICE.to_string()]));

        let started = enrich(EventKind::DemocracyStarted).await;
        assert_eq!(
            data(&started),
            &EventData::DemocracyStarted {
                referendum_index: 4,
                proposal_hash: HASH.into(),
                vote_threshold: "SuperMajorityApprove".into(),
                end_block: 200
            }
        );

        let passed = enrich(EventKind::DemocracyPassed).await;
        assert_eq!(
            data(&passed),
            &EventData::DemocracyPassed {
                referendum_index: 4,
                dispatch_block: Some(250)
            }
        );

        match data(&enrich(EventKind::PreimageNoted).await) {
            EventData::PreimageNoted { preimage, .. } => {
                let call = preimage.as_ref().unwrap();
                assert_eq!((call.section.as_str(), call.method.as_str()), ("Balances", "transfer"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn votes_decode_aye_and_conviction() {
        let (_, raw) = every_call_kind()
            .into_iter()
            .find(|(k, _)| *k == EventKind::DemocracyVoted)
            .unwrap();
        let enricher = enricher(api(), None);
        let event = enricher
            .enrich_extrinsic(&test_block(), &paths(), &raw, EventKind::DemocracyVoted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            data(&event),
            &EventData::DemocracyVoted {
                referendum_index: 4,
                who: BOB.into(),
                is_aye: true,
                conviction: 1,
                balance: "50".into()
            }
        );

        let mut split = raw.clone();
        split.args[1] = json!({ "Split": { "aye": "1", "nay": "1" } });
        assert!(enricher
            .enrich_extrinsic(&test_block(), &paths(), &split, EventKind::DemocracyVoted)
            .await
            .is_err());

        let mut unsigned = raw;
        unsigned.signer = None;
        assert!(enricher
            .enrich_extrinsic(&test_block(), &paths(), &unsigned, EventKind::DemocracyVoted)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn call_kinds_are_rejected_for_events() {
        let raw = every_event_kind().remove(0).1;
        let result = enricher(api(), None)
            .enrich_event(&test_block(), &paths(), &raw, EventKind::TipVoted)
            .await;
        assert!(matches!(result, Err(ChainEventsError::Decode(_))));
    }

    #[tokio::test]
    async fn identity_judgements_name_their_registrar() {
        let event = enrich(EventKind::IdentitySet).await;
        assert_eq!(
            data(&event),
            &EventData::IdentitySet {
                who: ALICE.into(),
                display_name: "Alice".into(),
                judgements: vec![(CHARLIE.into(), IdentityJudgement::Reasonable)]
            }
        );

        let given = enrich(EventKind::JudgementGiven).await;
        assert_eq!(
            data(&given),
            &EventData::JudgementGiven {
                who: ALICE.into(),
                registrar: CHARLIE.into(),
                judgement: IdentityJudgement::Reasonable
            }
        );
        assert_eq!(given.include_addresses, Some(vec![ALICE.to_string()]));
    }

    #[tokio::test]
    async fn tips_and_bounties() {
        match data(&enrich(EventKind::NewTip).await) {
            EventData::NewTip {
                reason, finder, finders_fee, ..
            } => {
                assert_eq!(reason, "great work");
                assert_eq!(finder, ALICE);
                assert!(*finders_fee);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            data(&enrich(EventKind::TipClosing).await),
            &EventData::TipClosing {
                proposal_hash: HASH.into(),
                closing: 400
            }
        );
        match data(&enrich(EventKind::TreasuryBountyProposed).await) {
            EventData::TreasuryBountyProposed { description, .. } => {
                assert_eq!(description.as_deref(), Some("fix the bridge"))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            data(&enrich(EventKind::TreasuryBountyBecameActive).await),
            &EventData::TreasuryBountyBecameActive {
                bounty_index: 0,
                curator: Some(BOB.into()),
                update_due: Some(300)
            }
        );
    }

    #[tokio::test]
    async fn new_session_collects_validator_state() {
        match data(&enrich(EventKind::NewSession).await) {
            EventData::NewSession {
                active_exposures,
                active,
                waiting,
                session_index,
                current_era,
                validator_info,
            } => {
                assert_eq!(active, &vec![ALICE.to_string(), BOB.to_string()]);
                assert_eq!(waiting, &vec![CHARLIE.to_string()]);
                assert_eq!(*session_index, 12);
                assert_eq!(*current_era, Some(7));
                assert_eq!(active_exposures[ALICE].others[0].who, CHARLIE);
                let alice = &validator_info[ALICE];
                assert_eq!(alice.commission_perbill, 50_000_000);
                assert_eq!(alice.era_points, 20);
                assert_eq!(alice.reward_destination, "Staked");
                assert_eq!(alice.next_session_ids, vec!["0x01", "0x02"]);
                assert_eq!(validator_info[BOB].era_points, 10);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn offline_and_offences() {
        assert_eq!(
            data(&enrich(EventKind::SomeOffline).await),
            &EventData::SomeOffline {
                session_index: 11,
                validators: vec![BOB.into()]
            }
        );
        match data(&enrich(EventKind::Offence).await) {
            EventData::Offence {
                offenders, applied, ..
            } => {
                assert_eq!(offenders, &vec![BOB.to_string()]);
                assert!(*applied);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn collectives_are_named_by_pallet() {
        let event = enrich(EventKind::CollectiveProposed).await;
        match data(&event) {
            EventData::CollectiveProposed {
                collective_name,
                call,
                threshold,
                ..
            } => {
                assert_eq!(*collective_name, Some(CollectiveName::Council));
                assert_eq!(call.method, "approve_proposal");
                assert_eq!(*threshold, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(event.exclude_addresses, Some(vec![ALICE.to_string()]));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"]["collectiveName"], "council");
    }
}
