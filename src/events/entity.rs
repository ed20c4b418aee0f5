//! Higher-level entity lifecycle (proposals, referenda, tips...) derived from single events.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

use super::{CWEvent, ChainEventKind, SupportedNetwork};
use crate::chains::{aave, commonwealth, compound, moloch, substrate};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EntityKind {
    SubstrateDemocracyProposal,
    SubstrateDemocracyReferendum,
    SubstrateDemocracyPreimage,
    SubstrateTreasuryProposal,
    SubstrateTreasuryBounty,
    SubstrateCollectiveProposal,
    SubstrateSignalingProposal,
    SubstrateTipProposal,
    MolochProposal,
    CompoundProposal,
    AaveProposal,
    CommonwealthProject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityEventKind {
    Create,
    Update,
    Vote,
    Complete,
}

/// Maps an event kind onto the entity it belongs to and the role it plays there.
pub fn event_to_entity(kind: ChainEventKind) -> Option<(EntityKind, EntityEventKind)> {
    use EntityEventKind::*;

    match kind {
        ChainEventKind::Moloch(kind) => {
            let role = match kind {
                moloch::EventKind::SubmitProposal => Create,
                moloch::EventKind::SubmitVote => Vote,
                moloch::EventKind::ProcessProposal | moloch::EventKind::Abort => Complete,
                _ => return None,
            };
            Some((EntityKind::MolochProposal, role))
        }
        ChainEventKind::Compound(kind) => {
            let role = match kind {
                compound::EventKind::ProposalCreated => Create,
                compound::EventKind::VoteCast => Vote,
                compound::EventKind::ProposalQueued => Update,
                compound::EventKind::ProposalCanceled | compound::EventKind::ProposalExecuted => {
                    Complete
                }
            };
            Some((EntityKind::CompoundProposal, role))
        }
        ChainEventKind::Aave(kind) => {
            let role = match kind {
                aave::EventKind::ProposalCreated => Create,
                aave::EventKind::VoteEmitted => Vote,
                aave::EventKind::ProposalQueued => Update,
                aave::EventKind::ProposalCanceled | aave::EventKind::ProposalExecuted => Complete,
                _ => return None,
            };
            Some((EntityKind::AaveProposal, role))
        }
        ChainEventKind::Commonwealth(kind) => {
            let role = match kind {
                commonwealth::EventKind::ProjectCreated => Create,
                commonwealth::EventKind::ProjectBacked
                | commonwealth::EventKind::ProjectCurated
                | commonwealth::EventKind::ProjectWithdraw => Vote,
                commonwealth::EventKind::ProjectSucceeded
                | commonwealth::EventKind::ProjectFailed => Update,
            };
            Some((EntityKind::CommonwealthProject, role))
        }
        ChainEventKind::Substrate(kind) => substrate_entity(kind),
        ChainEventKind::Erc20(_) | ChainEventKind::Erc721(_) => None,
    }
}

fn substrate_entity(kind: substrate::EventKind) -> Option<(EntityKind, EntityEventKind)> {
    use substrate::EventKind as K;
    use EntityEventKind::*;
    use EntityKind::*;

    let pair = match kind {
        K::DemocracyProposed => (SubstrateDemocracyProposal, Create),
        K::DemocracySeconded => (SubstrateDemocracyProposal, Vote),
        K::DemocracyTabled => (SubstrateDemocracyProposal, Complete),

        K::DemocracyStarted => (SubstrateDemocracyReferendum, Create),
        K::DemocracyVoted => (SubstrateDemocracyReferendum, Vote),
        K::DemocracyPassed => (SubstrateDemocracyReferendum, Update),
        K::DemocracyNotPassed | K::DemocracyCancelled | K::DemocracyExecuted => {
            (SubstrateDemocracyReferendum, Complete)
        }

        K::PreimageNoted => (SubstrateDemocracyPreimage, Create),
        K::PreimageUsed | K::PreimageInvalid | K::PreimageReaped => {
            (SubstrateDemocracyPreimage, Complete)
        }

        K::NewTip => (SubstrateTipProposal, Create),
        K::TipVoted | K::TipClosing => (SubstrateTipProposal, Update),
        K::TipClosed | K::TipRetracted | K::TipSlashed => (SubstrateTipProposal, Complete),

        K::TreasuryProposed => (SubstrateTreasuryProposal, Create),
        K::TreasuryRejected | K::TreasuryAwarded => (SubstrateTreasuryProposal, Complete),

        K::TreasuryBountyProposed => (SubstrateTreasuryBounty, Create),
        K::TreasuryBountyAwarded | K::TreasuryBountyBecameActive | K::TreasuryBountyExtended => {
            (SubstrateTreasuryBounty, Update)
        }
        K::TreasuryBountyCanceled | K::TreasuryBountyClaimed | K::TreasuryBountyRejected => {
            (SubstrateTreasuryBounty, Complete)
        }

        K::CollectiveProposed => (SubstrateCollectiveProposal, Create),
        K::CollectiveVoted => (SubstrateCollectiveProposal, Vote),
        K::CollectiveApproved => (SubstrateCollectiveProposal, Update),
        K::CollectiveDisapproved | K::CollectiveExecuted => (SubstrateCollectiveProposal, Complete),

        K::SignalingNewProposal => (SubstrateSignalingProposal, Create),
        K::SignalingCommitStarted | K::SignalingVotingStarted => (SubstrateSignalingProposal, Update),
        K::SignalingVotingCompleted => (SubstrateSignalingProposal, Complete),

        _ => return None,
    };
    Some(pair)
}

/// Name of the data field that identifies the entity an event belongs to.
pub fn entity_to_field_name(network: SupportedNetwork, entity: EntityKind) -> Option<&'static str> {
    match network {
        SupportedNetwork::Compound | SupportedNetwork::Aave | SupportedNetwork::Commonwealth => {
            Some("id")
        }
        SupportedNetwork::Moloch => Some("proposalIndex"),
        SupportedNetwork::Substrate => match entity {
            EntityKind::SubstrateDemocracyProposal | EntityKind::SubstrateTreasuryProposal => {
                Some("proposalIndex")
            }
            EntityKind::SubstrateDemocracyReferendum => Some("referendumIndex"),
            EntityKind::SubstrateDemocracyPreimage
            | EntityKind::SubstrateCollectiveProposal
            | EntityKind::SubstrateSignalingProposal
            | EntityKind::SubstrateTipProposal => Some("proposalHash"),
            EntityKind::SubstrateTreasuryBounty => Some("bountyIndex"),
            _ => None,
        },
        SupportedNetwork::Erc20 | SupportedNetwork::Erc721 => None,
    }
}

/// True once any of the entity's events is a completing one.
pub fn is_entity_completed(events: &[CWEvent]) -> bool {
    events.iter().any(|event| {
        matches!(
            event_to_entity(event.kind()),
            Some((_, EntityEventKind::Complete))
        )
    })
}
