use std::sync::Arc;

use alloy::primitives::Address;
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

use super::contracts::{
    self, bytes32_string, Back, CommonwealthApi, Curate, Failed, ProjectCreated, ProjectInfo,
    Succeeded, Withdraw,
};
use super::{parse, EventData, EventKind};
use crate::chains::evm::{fmt_address, to_u64, LogEnricher};
use crate::error::Result;
use crate::events::CWEvent;

pub(crate) fn project_created(block: u64, index: u64, project: Address, info: ProjectInfo) -> CWEvent {
    let creator = fmt_address(&info.creator);
    CWEvent::new(
        block,
        EventData::ProjectCreated {
            id: fmt_address(&project),
            index,
            name: info.name,
            ipfs_hash: info.ipfs_hash,
            cw_url: info.cw_url,
            creator: creator.clone(),
            beneficiary: fmt_address(&info.beneficiary),
            accepted_token: fmt_address(&info.accepted_token),
            curator_fee: info.curator_fee.to_string(),
            threshold: info.threshold.to_string(),
            deadline: info.deadline,
            funding_amount: info.total_funding.to_string(),
        },
    )
    .exclude(vec![creator])
}

#[derive(Clone)]
pub struct CommonwealthEnricher {
    api: Arc<dyn CommonwealthApi>,
}

impl CommonwealthEnricher {
    pub fn new(api: Arc<dyn CommonwealthApi>) -> Self {
        Self { api }
    }

    pub async fn enrich(&self, block: u64, kind: EventKind, log: &Log) -> Result<CWEvent> {
        let id = fmt_address(&log.address());
        let event = match kind {
            EventKind::ProjectCreated => {
                let e = ProjectCreated::decode_log(&log.inner, true)?;
                let info = self.api.project(e.project).await?;
                project_created(block, to_u64(e.index, "index")?, e.project, info)
            }
            EventKind::ProjectBacked => {
                let e = Back::decode_log(&log.inner, true)?;
                let sender = fmt_address(&e.sender);
                CWEvent::new(
                    block,
                    EventData::ProjectBacked {
                        id,
                        sender: sender.clone(),
                        token: fmt_address(&e.token),
                        amount: e.amount.to_string(),
                    },
                )
                .exclude(vec![sender])
            }
            EventKind::ProjectCurated => {
                let e = Curate::decode_log(&log.inner, true)?;
                let sender = fmt_address(&e.sender);
                CWEvent::new(
                    block,
                    EventData::ProjectCurated {
                        id,
                        sender: sender.clone(),
                        token: fmt_address(&e.token),
                        amount: e.amount.to_string(),
                    },
                )
                .exclude(vec![sender])
            }
            EventKind::ProjectSucceeded => {
                let e = Succeeded::decode_log(&log.inner, true)?;
                CWEvent::new(
                    block,
                    EventData::ProjectSucceeded {
                        id,
                        timestamp: to_u64(e.timestamp, "timestamp")?,
                        amount: e.amount.to_string(),
                    },
                )
            }
            EventKind::ProjectFailed => {
                Failed::decode_log(&log.inner, true)?;
                CWEvent::new(block, EventData::ProjectFailed { id })
            }
            EventKind::ProjectWithdraw => {
                let e = Withdraw::decode_log(&log.inner, true)?;
                let sender = fmt_address(&e.sender);
                CWEvent::new(
                    block,
                    EventData::ProjectWithdraw {
                        id,
                        sender: sender.clone(),
                        token: fmt_address(&e.token),
                        amount: e.amount.to_string(),
                        withdrawal_type: bytes32_string(&e.withdrawalType),
                    },
                )
                .exclude(vec![sender])
            }
        };
        Ok(event)
    }
}

#[async_trait]
impl LogEnricher for CommonwealthEnricher {
    type Kind = EventKind;

    fn event_name(&self, log: &Log) -> Option<&'static str> {
        contracts::event_name(log.topics().first()?)
    }

    fn parse_type(&self, name: &str) -> Option<EventKind> {
        parse::parse_type(name)
    }

    async fn enrich(&self, block: u64, kind: EventKind, log: &Log) -> Result<Option<CWEvent>> {
        CommonwealthEnricher::enrich(self, block, kind, log).await.map(Some)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::chains::commonwealth::contracts::MockCommonwealthApi;
    use crate::chains::evm::test_support::log;
    use alloy::primitives::{address, B256, U256};

    pub const FACTORY: Address = address!("00000000000000000000000000000000000000fa");
    pub const PROJECT: Address = address!("00000000000000000000000000000000000000b1");
    pub const CREATOR: Address = address!("0000000000000000000000000000000000000aaa");
    pub const BACKER: Address = address!("0000000000000000000000000000000000000bbb");
    pub const TOKEN: Address = address!("00000000000000000000000000000000000000c0");

    pub fn info(deadline: u64, funded: bool) -> ProjectInfo {
        ProjectInfo {
            name: "garden".into(),
            ipfs_hash: "Qm123".into(),
            cw_url: "https://commonwealth.im".into(),
            creator: CREATOR,
            beneficiary: CREATOR,
            accepted_token: TOKEN,
            curator_fee: U256::from(10),
            threshold: U256::from(1_000),
            deadline,
            total_funding: U256::from(if funded { 1_500 } else { 200 }),
            funded,
        }
    }

    pub fn api() -> MockCommonwealthApi {
        let mut api = MockCommonwealthApi::new();
        api.expect_project().returning(|_| Ok(info(90, false)));
        api
    }

    fn withdrawal_type() -> B256 {
        let mut raw = [0u8; 32];
        raw[..6].copy_from_slice(b"refund");
        B256::from(raw)
    }

    pub fn every_kind(block: u64) -> Vec<(EventKind, Log)> {
        vec![
            (
                EventKind::ProjectCreated,
                log(
                    FACTORY,
                    block,
                    &ProjectCreated {
                        index: U256::from(3),
                        project: PROJECT,
                    },
                ),
            ),
            (
                EventKind::ProjectBacked,
                log(
                    PROJECT,
                    block,
                    &Back {
                        sender: BACKER,
                        token: TOKEN,
                        amount: U256::from(50),
                    },
                ),
            ),
            (
                EventKind::ProjectCurated,
                log(
                    PROJECT,
                    block,
                    &Curate {
                        sender: BACKER,
                        token: TOKEN,
                        amount: U256::from(5),
                    },
                ),
            ),
            (
                EventKind::ProjectSucceeded,
                log(
                    PROJECT,
                    block,
                    &Succeeded {
                        timestamp: U256::from(80),
                        amount: U256::from(1_500),
                    },
                ),
            ),
            (EventKind::ProjectFailed, log(PROJECT, block, &Failed {})),
            (
                EventKind::ProjectWithdraw,
                log(
                    PROJECT,
                    block,
                    &Withdraw {
                        sender: BACKER,
                        token: TOKEN,
                        amount: U256::from(50),
                        withdrawalType: withdrawal_type(),
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

    #[tokio::test]
    async fn every_kind_enriches_to_itself() {
        let enricher = CommonwealthEnricher::new(Arc::new(api()));
        let fixtures = every_kind(40);
        assert_eq!(fixtures.len(), EventKind::iter().count());
        for (kind, raw) in fixtures {
            let event = enricher.enrich(40, kind, &raw).await.unwrap();
            assert_eq!(event.kind(), ChainEventKind::Commonwealth(kind));
        }
    }

    #[tokio::test]
    async fn created_project_reads_metadata() {
        let enricher = CommonwealthEnricher::new(Arc::new(api()));
        let (_, raw) = every_kind(40).remove(0);
        let event = enricher
            .enrich(40, EventKind::ProjectCreated, &raw)
            .await
            .unwrap();
        match &event.data {
            ChainEventData::Commonwealth(EventData::ProjectCreated {
                id,
                index,
                name,
                funding_amount,
                ..
            }) => {
                assert_eq!(id, &PROJECT.to_string());
                assert_eq!(*index, 3);
                assert_eq!(name, "garden");
                assert_eq!(funding_amount, "200");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(event.data.entity_id(), Some(PROJECT.to_string()));
    }

    #[tokio::test]
    async fn withdrawal_type_is_text() {
        let enricher = CommonwealthEnricher::new(Arc::new(api()));
        let (_, raw) = every_kind(40).remove(5);
        let event = enricher
            .enrich(40, EventKind::ProjectWithdraw, &raw)
            .await
            .unwrap();
        match event.data {
            ChainEventData::Commonwealth(EventData::ProjectWithdraw {
                withdrawal_type, ..
            }) => assert_eq!(withdrawal_type, "refund"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
