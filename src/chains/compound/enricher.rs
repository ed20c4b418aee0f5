use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

use super::contracts::{
    self, hex_id, AlphaVoteCast, BravoVoteCast, ProposalCanceled, ProposalCreated,
    ProposalExecuted, ProposalQueued,
};
use super::{parse, EventData, EventKind};
use crate::chains::evm::{fmt_address, hex_bytes, to_u64, LogEnricher};
use crate::error::Result;
use crate::events::CWEvent;

fn vote(block: u64, log: &Log) -> Result<CWEvent> {
    let (id, voter, support, votes, reason) =
        if log.topics().first() == Some(&BravoVoteCast::SIGNATURE_HASH) {
            let e = BravoVoteCast::decode_log(&log.inner, true)?;
            let reason = (!e.reason.is_empty()).then(|| e.reason.clone());
            (e.proposalId, e.voter, e.support, e.votes, reason)
        } else {
            let e = AlphaVoteCast::decode_log(&log.inner, true)?;
            (e.proposalId, e.voter, u8::from(e.support), e.votes, None)
        };

    let voter = fmt_address(&voter);
    Ok(CWEvent::new(
        block,
        EventData::VoteCast {
            id: hex_id(id),
            voter: voter.clone(),
            support,
            votes: votes.to_string(),
            reason,
        },
    )
    .exclude(vec![voter]))
}

pub fn enrich(block: u64, kind: EventKind, log: &Log) -> Result<CWEvent> {
    let event = match kind {
        EventKind::ProposalCreated => {
            let e = ProposalCreated::decode_log(&log.inner, true)?;
            let proposer = fmt_address(&e.proposer);
            CWEvent::new(
                block,
                EventData::ProposalCreated {
                    id: hex_id(e.id),
                    proposer: proposer.clone(),
                    targets: e.targets.iter().map(fmt_address).collect(),
                    values: e.values.iter().map(|v| v.to_string()).collect(),
                    signatures: e.signatures.clone(),
                    calldatas: e.calldatas.iter().map(|c| hex_bytes(c)).collect(),
                    start_block: to_u64(e.startBlock, "startBlock")?,
                    end_block: to_u64(e.endBlock, "endBlock")?,
                    description: e.description.clone(),
                },
            )
            .exclude(vec![proposer])
        }
        EventKind::VoteCast => vote(block, log)?,
        EventKind::ProposalCanceled => {
            let e = ProposalCanceled::decode_log(&log.inner, true)?;
            CWEvent::new(block, EventData::ProposalCanceled { id: hex_id(e.id) })
        }
        EventKind::ProposalQueued => {
            let e = ProposalQueued::decode_log(&log.inner, true)?;
            CWEvent::new(
                block,
                EventData::ProposalQueued {
                    id: hex_id(e.id),
                    eta: to_u64(e.eta, "eta")?,
                },
            )
        }
        EventKind::ProposalExecuted => {
            let e = ProposalExecuted::decode_log(&log.inner, true)?;
            CWEvent::new(block, EventData::ProposalExecuted { id: hex_id(e.id) })
        }
    };
    Ok(event)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CompoundEnricher;

#[async_trait]
impl LogEnricher for CompoundEnricher {
    type Kind = EventKind;

    fn event_name(&self, log: &Log) -> Option<&'static str> {
        contracts::event_name(log.topics().first()?)
    }

    fn parse_type(&self, name: &str) -> Option<EventKind> {
        parse::parse_type(name)
    }

    async fn enrich(&self, block: u64, kind: EventKind, log: &Log) -> Result<Option<CWEvent>> {
        enrich(block, kind, log).map(Some)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::chains::evm::test_support::log;
    use alloy::primitives::{address, Address, U256};

    pub const GOVERNOR: Address = address!("00000000000000000000000000000000000000c1");
    pub const PROPOSER: Address = address!("0000000000000000000000000000000000000aaa");

    pub fn every_kind(block: u64) -> Vec<(EventKind, Log)> {
        vec![
            (
                EventKind::ProposalCreated,
                log(
                    GOVERNOR,
                    block,
                    &ProposalCreated {
                        id: U256::from(2),
                        proposer: PROPOSER,
                        targets: vec![address!("3d9819210a31b4961b30ef54be2aed79b9c9cd3b")],
                        values: vec![U256::ZERO],
                        signatures: vec!["_setCollateralFactor(address,uint256)".into()],
                        calldatas: vec![vec![0x01, 0x02].into()],
                        startBlock: U256::from(11),
                        endBlock: U256::from(30),
                        description: "raise collateral factor".into(),
                    },
                ),
            ),
            (
                EventKind::VoteCast,
                log(
                    GOVERNOR,
                    block,
                    &BravoVoteCast {
                        voter: PROPOSER,
                        proposalId: U256::from(2),
                        support: 2,
                        votes: U256::from(500),
                        reason: "abstaining".into(),
                    },
                ),
            ),
            (
                EventKind::ProposalCanceled,
                log(GOVERNOR, block, &ProposalCanceled { id: U256::from(2) }),
            ),
            (
                EventKind::ProposalQueued,
                log(
                    GOVERNOR,
                    block,
                    &ProposalQueued {
                        id: U256::from(2),
                        eta: U256::from(1_000),
                    },
                ),
            ),
            (
                EventKind::ProposalExecuted,
                log(GOVERNOR, block, &ProposalExecuted { id: U256::from(2) }),
            ),
        ]
    }
}
