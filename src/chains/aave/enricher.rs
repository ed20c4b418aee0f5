use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

use super::contracts::{
    self, Approval, DelegateChanged, DelegatedPowerChanged, ProposalCanceled, ProposalCreated,
    ProposalExecuted, ProposalQueued, Transfer, VoteEmitted,
};
use super::{parse, EventData, EventKind};
use crate::chains::evm::{fmt_address, hex_bytes, to_u64, LogEnricher};
use crate::error::Result;
use crate::events::CWEvent;

pub fn enrich(block: u64, kind: EventKind, log: &Log) -> Result<CWEvent> {
    let token_address = fmt_address(&log.address());

    let event = match kind {
        EventKind::ProposalCreated => {
            let e = ProposalCreated::decode_log(&log.inner, true)?;
            let proposer = fmt_address(&e.creator);
            CWEvent::new(
                block,
                EventData::ProposalCreated {
                    id: to_u64(e.id, "id")?,
                    proposer: proposer.clone(),
                    executor: fmt_address(&e.executor),
                    targets: e.targets.iter().map(fmt_address).collect(),
                    values: e.values.iter().map(|v| v.to_string()).collect(),
                    signatures: e.signatures.clone(),
                    calldatas: e.calldatas.iter().map(|c| hex_bytes(c)).collect(),
                    start_block: to_u64(e.startBlock, "startBlock")?,
                    end_block: to_u64(e.endBlock, "endBlock")?,
                    strategy: fmt_address(&e.strategy),
                    ipfs_hash: e.ipfsHash.to_string(),
                },
            )
            .exclude(vec![proposer])
        }
        EventKind::ProposalCanceled => {
            let e = ProposalCanceled::decode_log(&log.inner, true)?;
            CWEvent::new(
                block,
                EventData::ProposalCanceled {
                    id: to_u64(e.id, "id")?,
                },
            )
        }
        EventKind::ProposalQueued => {
            let e = ProposalQueued::decode_log(&log.inner, true)?;
            CWEvent::new(
                block,
                EventData::ProposalQueued {
                    id: to_u64(e.id, "id")?,
                    execution_time: to_u64(e.executionTime, "executionTime")?,
                },
            )
        }
        EventKind::ProposalExecuted => {
            let e = ProposalExecuted::decode_log(&log.inner, true)?;
            CWEvent::new(
                block,
                EventData::ProposalExecuted {
                    id: to_u64(e.id, "id")?,
                },
            )
        }
        EventKind::VoteEmitted => {
            let e = VoteEmitted::decode_log(&log.inner, true)?;
            let voter = fmt_address(&e.voter);
            CWEvent::new(
                block,
                EventData::VoteEmitted {
                    id: to_u64(e.id, "id")?,
                    voter: voter.clone(),
                    support: e.support,
                    voting_power: e.votingPower.to_string(),
                },
            )
            .exclude(vec![voter])
        }
        EventKind::DelegateChanged => {
            let e = DelegateChanged::decode_log(&log.inner, true)?;
            let delegator = fmt_address(&e.delegator);
            let delegatee = fmt_address(&e.delegatee);
            let event = CWEvent::new(
                block,
                EventData::DelegateChanged {
                    token_address,
                    delegator: delegator.clone(),
                    delegatee: delegatee.clone(),
                    delegation_type: e.delegationType,
                },
            )
            .exclude(vec![delegator.clone()]);
            if delegatee != delegator {
                event.include(vec![delegatee])
            } else {
                event
            }
        }
        EventKind::DelegatedPowerChanged => {
            let e = DelegatedPowerChanged::decode_log(&log.inner, true)?;
            let who = fmt_address(&e.user);
            CWEvent::new(
                block,
                EventData::DelegatedPowerChanged {
                    token_address,
                    who: who.clone(),
                    amount: e.amount.to_string(),
                    delegation_type: e.delegationType,
                },
            )
            .include(vec![who])
        }
        EventKind::Transfer => {
            let e = Transfer::decode_log(&log.inner, true)?;
            let from = fmt_address(&e.from);
            CWEvent::new(
                block,
                EventData::Transfer {
                    token_address,
                    from: from.clone(),
                    to: fmt_address(&e.to),
                    amount: e.value.to_string(),
                },
            )
            .exclude(vec![from])
        }
        EventKind::Approval => {
            let e = Approval::decode_log(&log.inner, true)?;
            let owner = fmt_address(&e.owner);
            CWEvent::new(
                block,
                EventData::Approval {
                    token_address,
                    owner: owner.clone(),
                    spender: fmt_address(&e.spender),
                    amount: e.value.to_string(),
                },
            )
            .exclude(vec![owner])
        }
    };
    Ok(event)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AaveEnricher;

#[async_trait]
impl LogEnricher for AaveEnricher {
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
    use alloy::primitives::{address, Address, Bytes, B256, U256};

    pub const GOVERNANCE: Address = address!("00000000000000000000000000000000000000f0");
    pub const TOKEN: Address = address!("00000000000000000000000000000000000000f1");
    pub const CREATOR: Address = address!("0000000000000000000000000000000000000aaa");
    pub const VOTER: Address = address!("0000000000000000000000000000000000000bbb");

    pub fn proposal_created(id: u64, block: u64) -> Log {
        log(
            GOVERNANCE,
            block,
            &ProposalCreated {
                id: U256::from(id),
                creator: CREATOR,
                executor: address!("00000000000000000000000000000000000000e0"),
                targets: vec![address!("00000000000000000000000000000000000000e1")],
                values: vec![U256::ZERO],
                signatures: vec!["transfer(address,uint256)".into()],
                calldatas: vec![Bytes::from(vec![0xde, 0xad])],
                withDelegatecalls: vec![false],
                startBlock: U256::from(100),
                endBlock: U256::from(200),
                strategy: address!("00000000000000000000000000000000000000e2"),
                ipfsHash: B256::repeat_byte(0x11),
            },
        )
    }

    /// One raw log per event kind.
    pub fn every_kind(block: u64) -> Vec<(EventKind, Log)> {
        vec![
            (EventKind::ProposalCreated, proposal_created(5, block)),
            (
                EventKind::ProposalCanceled,
                log(GOVERNANCE, block, &ProposalCanceled { id: U256::from(5) }),
            ),
            (
                EventKind::ProposalQueued,
                log(
                    GOVERNANCE,
                    block,
                    &ProposalQueued {
                        id: U256::from(5),
                        executionTime: U256::from(1_700_000_000u64),
                        initiatorQueueing: VOTER,
                    },
                ),
            ),
            (
                EventKind::ProposalExecuted,
                log(
                    GOVERNANCE,
                    block,
                    &ProposalExecuted {
                        id: U256::from(5),
                        initiatorExecution: VOTER,
                    },
                ),
            ),
            (
                EventKind::VoteEmitted,
                log(
                    GOVERNANCE,
                    block,
                    &VoteEmitted {
                        id: U256::from(5),
                        voter: VOTER,
                        support: true,
                        votingPower: U256::from(1000),
                    },
                ),
            ),
            (
                EventKind::DelegateChanged,
                log(
                    TOKEN,
                    block,
                    &DelegateChanged {
                        delegator: VOTER,
                        delegatee: CREATOR,
                        delegationType: 0,
                    },
                ),
            ),
            (
                EventKind::DelegatedPowerChanged,
                log(
                    TOKEN,
                    block,
                    &DelegatedPowerChanged {
                        user: CREATOR,
                        amount: U256::from(77),
                        delegationType: 1,
                    },
                ),
            ),
            (
                EventKind::Transfer,
                log(
                    TOKEN,
                    block,
                    &Transfer {
                        from: Address::ZERO,
                        to: VOTER,
                        value: U256::from(10),
                    },
                ),
            ),
            (
                EventKind::Approval,
                log(
                    TOKEN,
                    block,
                    &Approval {
                        owner: VOTER,
                        spender: CREATOR,
                        value: U256::from(10),
                    },
                ),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::events::ChainEventKind;
    use strum::IntoEnumIterator;

    #[test]
    fn proposal_created_end_to_end() {
        let event = enrich(150, EventKind::ProposalCreated, &proposal_created(5, 150)).unwrap();
        let creator = CREATOR.to_string();

        match &event.data {
            crate::events::ChainEventData::Aave(EventData::ProposalCreated {
                id,
                proposer,
                start_block,
                end_block,
                values,
                calldatas,
                ..
            }) => {
                assert_eq!(*id, 5);
                assert_eq!(proposer, &creator);
                assert_eq!(*start_block, 100);
                assert_eq!(*end_block, 200);
                assert_eq!(values, &vec!["0".to_string()]);
                assert_eq!(calldatas, &vec!["0xdead".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(event.exclude_addresses, Some(vec![creator]));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"]["kind"], "proposal-created");
        assert_eq!(json["data"]["startBlock"], 100);
    }

    #[test]
    fn every_kind_enriches_to_itself() {
        let fixtures = every_kind(42);
        assert_eq!(fixtures.len(), EventKind::iter().count());
        for (kind, raw) in fixtures {
            let event = enrich(42, kind, &raw).unwrap();
            assert_eq!(event.kind(), ChainEventKind::Aave(kind));
            assert_eq!(event.block_number, 42);
        }
    }

    #[test]
    fn enrichment_is_deterministic() {
        let raw = proposal_created(9, 10);
        assert_eq!(
            enrich(10, EventKind::ProposalCreated, &raw).unwrap(),
            enrich(10, EventKind::ProposalCreated, &raw).unwrap()
        );
    }

    #[test]
    fn delegation_includes_new_delegate() {
        let (_, raw) = every_kind(1)
            .into_iter()
            .find(|(k, _)| *k == EventKind::DelegateChanged)
            .unwrap();
        let event = enrich(1, EventKind::DelegateChanged, &raw).unwrap();
        assert_eq!(event.include_addresses, Some(vec![CREATOR.to_string()]));
        assert_eq!(event.exclude_addresses, Some(vec![VOTER.to_string()]));
        match event.data {
            crate::events::ChainEventData::Aave(EventData::DelegateChanged {
                token_address, ..
            }) => assert_eq!(token_address, TOKEN.to_string()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mismatched_kind_fails_to_decode() {
        assert!(enrich(1, EventKind::VoteEmitted, &proposal_created(1, 1)).is_err());
    }
}
