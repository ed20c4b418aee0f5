use std::sync::Arc;

use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

use super::contracts::{
    self, Abort, MolochApi, ProcessProposal, Ragequit, SubmitProposal, SubmitVote,
    SummonComplete, UpdateDelegateKey,
};
use super::{parse, EventData, EventKind};
use crate::chains::evm::{fmt_address, to_u64, LogEnricher};
use crate::error::Result;
use crate::events::CWEvent;

#[derive(Clone)]
pub struct MolochEnricher {
    api: Arc<dyn MolochApi>,
}

impl MolochEnricher {
    pub fn new(api: Arc<dyn MolochApi>) -> Self {
        Self { api }
    }

    pub async fn enrich(&self, block: u64, kind: EventKind, log: &Log) -> Result<CWEvent> {
        let event = match kind {
            EventKind::SummonComplete => {
                let e = SummonComplete::decode_log(&log.inner, true)?;
                CWEvent::new(
                    block,
                    EventData::SummonComplete {
                        summoner: fmt_address(&e.summoner),
                        shares: e.shares.to_string(),
                    },
                )
            }
            EventKind::SubmitProposal => {
                let e = SubmitProposal::decode_log(&log.inner, true)?;
                let index = to_u64(e.proposalIndex, "proposalIndex")?;
                let (proposal, constants) =
                    tokio::try_join!(self.api.proposal(index), self.api.constants())?;
                let member = fmt_address(&e.memberAddress);
                CWEvent::new(
                    block,
                    EventData::SubmitProposal {
                        proposal_index: index,
                        delegate_key: Some(fmt_address(&e.delegateKey)),
                        member: member.clone(),
                        applicant: fmt_address(&e.applicant),
                        token_tribute: e.tokenTribute.to_string(),
                        shares_requested: e.sharesRequested.to_string(),
                        details: proposal.details,
                        start_time: constants.start_time(proposal.starting_period)?,
                    },
                )
                .exclude(vec![member])
            }
            EventKind::SubmitVote => {
                let e = SubmitVote::decode_log(&log.inner, true)?;
                let member = self.api.member(e.memberAddress).await?;
                let address = fmt_address(&e.memberAddress);
                CWEvent::new(
                    block,
                    EventData::SubmitVote {
                        proposal_index: to_u64(e.proposalIndex, "proposalIndex")?,
                        delegate_key: fmt_address(&e.delegateKey),
                        member: address.clone(),
                        vote: e.uintVote,
                        shares: member.shares.to_string(),
                        highest_index_yes_vote: member.highest_index_yes_vote,
                    },
                )
                .exclude(vec![address])
            }
            EventKind::ProcessProposal => {
                let e = ProcessProposal::decode_log(&log.inner, true)?;
                let index = to_u64(e.proposalIndex, "proposalIndex")?;
                let proposal = self.api.proposal(index).await?;
                CWEvent::new(
                    block,
                    EventData::ProcessProposal {
                        proposal_index: index,
                        applicant: fmt_address(&e.applicant),
                        member: fmt_address(&e.memberAddress),
                        token_tribute: e.tokenTribute.to_string(),
                        shares_requested: e.sharesRequested.to_string(),
                        did_pass: e.didPass,
                        yes_votes: proposal.yes_votes.to_string(),
                        no_votes: proposal.no_votes.to_string(),
                    },
                )
            }
            EventKind::Ragequit => {
                let e = Ragequit::decode_log(&log.inner, true)?;
                let member = fmt_address(&e.memberAddress);
                CWEvent::new(
                    block,
                    EventData::Ragequit {
                        member: member.clone(),
                        shares_to_burn: e.sharesToBurn.to_string(),
                    },
                )
                .exclude(vec![member])
            }
            EventKind::Abort => {
                let e = Abort::decode_log(&log.inner, true)?;
                let applicant = fmt_address(&e.applicantAddress);
                CWEvent::new(
                    block,
                    EventData::Abort {
                        proposal_index: to_u64(e.proposalIndex, "proposalIndex")?,
                        applicant: applicant.clone(),
                    },
                )
                .exclude(vec![applicant])
            }
            EventKind::UpdateDelegateKey => {
                let e = UpdateDelegateKey::decode_log(&log.inner, true)?;
                let member = fmt_address(&e.memberAddress);
                let delegate = fmt_address(&e.newDelegateKey);
                CWEvent::new(
                    block,
                    EventData::UpdateDelegateKey {
                        member: member.clone(),
                        new_delegate_key: delegate.clone(),
                    },
                )
                .exclude(vec![member])
                .include(vec![delegate])
            }
        };
        Ok(event)
    }
}

#[async_trait]
impl LogEnricher for MolochEnricher {
    type Kind = EventKind;

    fn event_name(&self, log: &Log) -> Option<&'static str> {
        contracts::event_name(log.topics().first()?)
    }

    fn parse_type(&self, name: &str) -> Option<EventKind> {
        parse::parse_type(name)
    }

    async fn enrich(&self, block: u64, kind: EventKind, log: &Log) -> Result<Option<CWEvent>> {
        MolochEnricher::enrich(self, block, kind, log).await.map(Some)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::chains::evm::test_support::log;
    use crate::chains::moloch::contracts::{
        MockMolochApi, MolochConstants, MolochMember, MolochProposal,
    };
    use alloy::primitives::{address, Address, U256};

    pub const DAO: Address = address!("00000000000000000000000000000000000000d0");
    pub const MEMBER: Address = address!("0000000000000000000000000000000000000aaa");
    pub const APPLICANT: Address = address!("0000000000000000000000000000000000000bbb");

    pub fn constants() -> MolochConstants {
        MolochConstants {
            period_duration: 1,
            summoning_time: 2,
            voting_period: 1,
            grace_period: 1,
            abort_window: 2,
        }
    }

    pub fn proposal(starting_period: u64) -> MolochProposal {
        MolochProposal {
            proposer: MEMBER,
            applicant: APPLICANT,
            shares_requested: U256::from(5),
            starting_period,
            yes_votes: U256::from(3),
            no_votes: U256::from(1),
            processed: false,
            did_pass: false,
            aborted: false,
            token_tribute: U256::from(100),
            details: "hello".into(),
        }
    }

    pub fn api() -> MockMolochApi {
        let mut api = MockMolochApi::new();
        api.expect_constants().returning(|| Ok(constants()));
        api.expect_proposal().returning(|_| Ok(proposal(1)));
        api.expect_member().returning(|_| {
            Ok(MolochMember {
                delegate_key: MEMBER,
                shares: U256::from(8),
                exists: true,
                highest_index_yes_vote: 4,
            })
        });
        api
    }

    pub fn every_kind(block: u64) -> Vec<(EventKind, Log)> {
        vec![
            (
                EventKind::SummonComplete,
                log(
                    DAO,
                    block,
                    &SummonComplete {
                        summoner: MEMBER,
                        shares: U256::from(1),
                    },
                ),
            ),
            (
                EventKind::SubmitProposal,
                log(
                    DAO,
                    block,
                    &SubmitProposal {
                        proposalIndex: U256::ZERO,
                        delegateKey: MEMBER,
                        memberAddress: MEMBER,
                        applicant: APPLICANT,
                        tokenTribute: U256::from(100),
                        sharesRequested: U256::from(5),
                    },
                ),
            ),
            (
                EventKind::SubmitVote,
                log(
                    DAO,
                    block,
                    &SubmitVote {
                        proposalIndex: U256::ZERO,
                        delegateKey: MEMBER,
                        memberAddress: MEMBER,
                        uintVote: 1,
                    },
                ),
            ),
            (
                EventKind::ProcessProposal,
                log(
                    DAO,
                    block,
                    &ProcessProposal {
                        proposalIndex: U256::ZERO,
                        applicant: APPLICANT,
                        memberAddress: MEMBER,
                        tokenTribute: U256::from(100),
                        sharesRequested: U256::from(5),
                        didPass: true,
                    },
                ),
            ),
            (
                EventKind::Ragequit,
                log(
                    DAO,
                    block,
                    &Ragequit {
                        memberAddress: MEMBER,
                        sharesToBurn: U256::from(2),
                    },
                ),
            ),
            (
                EventKind::Abort,
                log(
                    DAO,
                    block,
                    &Abort {
                        proposalIndex: U256::ZERO,
                        applicantAddress: APPLICANT,
                    },
                ),
            ),
            (
                EventKind::UpdateDelegateKey,
                log(
                    DAO,
                    block,
                    &UpdateDelegateKey {
                        memberAddress: MEMBER,
                        newDelegateKey: APPLICANT,
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
    use crate::error::ChainEventsError;
    use crate::chains::moloch::contracts::MockMolochApi;
    use crate::events::{ChainEventData, ChainEventKind};
    use strum::IntoEnumIterator;

    #[tokio::test]
    async fn every_kind_enriches_to_itself() {
        let enricher = MolochEnricher::new(Arc::new(api()));
        let fixtures = every_kind(20);
        assert_eq!(fixtures.len(), EventKind::iter().count());
        for (kind, raw) in fixtures {
            let event = enricher.enrich(20, kind, &raw).await.unwrap();
            assert_eq!(event.kind(), ChainEventKind::Moloch(kind));
        }
    }

    #[tokio::test]
    async fn submitted_proposal_gets_start_time_and_details() {
        let enricher = MolochEnricher::new(Arc::new(api()));
        let (_, raw) = every_kind(20).remove(1);
        let event = enricher
            .enrich(20, EventKind::SubmitProposal, &raw)
            .await
            .unwrap();

        match &event.data {
            ChainEventData::Moloch(EventData::SubmitProposal {
                start_time,
                details,
                token_tribute,
                ..
            }) => {
                assert_eq!(*start_time, 3);
                assert_eq!(details, "hello");
                assert_eq!(token_tribute, "100");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(event.exclude_addresses, Some(vec![MEMBER.to_string()]));
    }

    #[tokio::test]
    async fn vote_reads_member_record() {
        let enricher = MolochEnricher::new(Arc::new(api()));
        let (_, raw) = every_kind(20).remove(2);
        let event = enricher.enrich(20, EventKind::SubmitVote, &raw).await.unwrap();
        match event.data {
            ChainEventData::Moloch(EventData::SubmitVote {
                shares,
                highest_index_yes_vote,
                vote,
                ..
            }) => {
                assert_eq!(shares, "8");
                assert_eq!(highest_index_yes_vote, 4);
                assert_eq!(vote, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_contract_read_fails_the_event() {
        let mut api = MockMolochApi::new();
        api.expect_proposal()
            .returning(|i| Err(ChainEventsError::missing(format!("proposal {i}"))));
        api.expect_constants().returning(|| Ok(constants()));
        let enricher = MolochEnricher::new(Arc::new(api));
        let (_, raw) = every_kind(20).remove(3);
        assert!(enricher
            .enrich(20, EventKind::ProcessProposal, &raw)
            .await
            .is_err());
    }
}
