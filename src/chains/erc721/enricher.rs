use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

use super::contracts::{self, Approval, ApprovalForAll, Transfer};
use super::{parse, EventData, EventKind};
use crate::chains::evm::{fmt_address, LogEnricher};
use crate::error::Result;
use crate::events::CWEvent;

pub fn enrich(block: u64, kind: EventKind, log: &Log) -> Result<CWEvent> {
    let contract_address = fmt_address(&log.address());
    let event = match kind {
        EventKind::Transfer => {
            let e = Transfer::decode_log(&log.inner, true)?;
            let from = fmt_address(&e.from);
            CWEvent::new(
                block,
                EventData::Transfer {
                    from: from.clone(),
                    to: fmt_address(&e.to),
                    token_id: e.tokenId.to_string(),
                    contract_address,
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
                    owner: owner.clone(),
                    approved: fmt_address(&e.approved),
                    token_id: e.tokenId.to_string(),
                    contract_address,
                },
            )
            .exclude(vec![owner])
        }
        EventKind::ApprovalForAll => {
            let e = ApprovalForAll::decode_log(&log.inner, true)?;
            let owner = fmt_address(&e.owner);
            CWEvent::new(
                block,
                EventData::ApprovalForAll {
                    owner: owner.clone(),
                    operator: fmt_address(&e.operator),
                    approved: e.approved,
                    contract_address,
                },
            )
            .exclude(vec![owner])
        }
    };
    Ok(event)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Erc721Enricher;

#[async_trait]
impl LogEnricher for Erc721Enricher {
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

    pub const PUNKS: Address = address!("b47e3cd837ddf8e4c57f05d70ab865de6e193bbb");
    pub const ALICE: Address = address!("0000000000000000000000000000000000000aaa");
    pub const BOB: Address = address!("0000000000000000000000000000000000000bbb");

    pub fn every_kind(block: u64) -> Vec<(EventKind, Log)> {
        vec![
            (
                EventKind::Transfer,
                log(
                    PUNKS,
                    block,
                    &Transfer {
                        from: ALICE,
                        to: BOB,
                        tokenId: U256::from(42),
                    },
                ),
            ),
            (
                EventKind::Approval,
                log(
                    PUNKS,
                    block,
                    &Approval {
                        owner: ALICE,
                        approved: BOB,
                        tokenId: U256::from(42),
                    },
                ),
            ),
            (
                EventKind::ApprovalForAll,
                log(
                    PUNKS,
                    block,
                    &ApprovalForAll {
                        owner: ALICE,
                        operator: BOB,
                        approved: true,
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
    use crate::events::{ChainEventData, ChainEventKind};
    use strum::IntoEnumIterator;

    #[test]
    fn every_kind_enriches_to_itself() {
        let fixtures = every_kind(2);
        assert_eq!(fixtures.len(), EventKind::iter().count());
        for (kind, raw) in fixtures {
            let event = enrich(2, kind, &raw).unwrap();
            assert_eq!(event.kind(), ChainEventKind::Erc721(kind));
        }
    }

    #[test]
    fn indexed_token_id_is_decoded() {
        let (_, raw) = every_kind(2).remove(0);
        let event = enrich(2, EventKind::Transfer, &raw).unwrap();
        match event.data {
            ChainEventData::Erc721(EventData::Transfer {
                token_id,
                contract_address,
                ..
            }) => {
                assert_eq!(token_id, "42");
                assert_eq!(contract_address, PUNKS.to_string());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn erc20_shaped_transfer_does_not_decode() {
        use crate::chains::erc20::enricher::fixtures::transfer;
        assert!(enrich(2, EventKind::Transfer, &transfer(2, 5)).is_err());
    }
}
