use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::chains::evm::{to_u64, WsProvider};
use crate::error::{ChainEventsError, Result};

sol! {
    #[sol(rpc)]
    interface IMoloch1 {
        event SummonComplete(address indexed summoner, uint256 shares);
        event SubmitProposal(
            uint256 proposalIndex,
            address indexed delegateKey,
            address indexed memberAddress,
            address indexed applicant,
            uint256 tokenTribute,
            uint256 sharesRequested
        );
        event SubmitVote(
            uint256 indexed proposalIndex,
            address indexed delegateKey,
            address indexed memberAddress,
            uint8 uintVote
        );
        event ProcessProposal(
            uint256 indexed proposalIndex,
            address indexed applicant,
            address indexed memberAddress,
            uint256 tokenTribute,
            uint256 sharesRequested,
            bool didPass
        );
        event Ragequit(address indexed memberAddress, uint256 sharesToBurn);
        event Abort(uint256 indexed proposalIndex, address applicantAddress);
        event UpdateDelegateKey(address indexed memberAddress, address newDelegateKey);

        function periodDuration() external view returns (uint256);
        function votingPeriodLength() external view returns (uint256);
        function gracePeriodLength() external view returns (uint256);
        function abortWindow() external view returns (uint256);
        function summoningTime() external view returns (uint256);
        function getProposalQueueLength() external view returns (uint256);
        function proposalQueue(uint256 index) external view returns (
            address proposer,
            address applicant,
            uint256 sharesRequested,
            uint256 startingPeriod,
            uint256 yesVotes,
            uint256 noVotes,
            bool processed,
            bool didPass,
            bool aborted,
            uint256 tokenTribute,
            string details,
            uint256 maxTotalSharesAtYesVote
        );
        function members(address member) external view returns (
            address delegateKey,
            uint256 shares,
            bool exists,
            uint256 highestIndexYesVote
        );
    }
}

pub use IMoloch1::{
    Abort, ProcessProposal, Ragequit, SubmitProposal, SubmitVote, SummonComplete,
    UpdateDelegateKey,
};

pub fn event_name(topic0: &B256) -> Option<&'static str> {
    let name = match *topic0 {
        t if t == SummonComplete::SIGNATURE_HASH => "SummonComplete",
        t if t == SubmitProposal::SIGNATURE_HASH => "SubmitProposal",
        t if t == SubmitVote::SIGNATURE_HASH => "SubmitVote",
        t if t == ProcessProposal::SIGNATURE_HASH => "ProcessProposal",
        t if t == Ragequit::SIGNATURE_HASH => "Ragequit",
        t if t == Abort::SIGNATURE_HASH => "Abort",
        t if t == UpdateDelegateKey::SIGNATURE_HASH => "UpdateDelegateKey",
        _ => return None,
    };
    Some(name)
}

/// Contract-wide timing parameters, in seconds and periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MolochConstants {
    pub period_duration: u64,
    pub summoning_time: u64,
    pub voting_period: u64,
    pub grace_period: u64,
    pub abort_window: u64,
}

impl MolochConstants {
    pub fn start_time(&self, starting_period: u64) -> Result<u64> {
        starting_period
            .checked_mul(self.period_duration)
            .and_then(|t| t.checked_add(self.summoning_time))
            .ok_or_else(|| overflow("start time", starting_period))
    }

    /// Last moment a proposal started at `start_time` can be aborted.
    pub fn abort_deadline(&self, start_time: u64) -> Result<u64> {
        self.after_periods(start_time, Some(self.abort_window), "abort deadline")
    }

    /// Earliest moment a proposal started at `start_time` can be processed.
    pub fn process_time(&self, start_time: u64) -> Result<u64> {
        let periods = self.voting_period.checked_add(self.grace_period);
        self.after_periods(start_time, periods, "process time")
    }

    fn after_periods(&self, start_time: u64, periods: Option<u64>, what: &str) -> Result<u64> {
        periods
            .and_then(|p| p.checked_mul(self.period_duration))
            .and_then(|d| d.checked_add(start_time))
            .ok_or_else(|| overflow(what, start_time))
    }
}

fn overflow(what: &str, from: u64) -> ChainEventsError {
    ChainEventsError::decode(format!("{what} overflows from {from}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MolochProposal {
    pub proposer: Address,
    pub applicant: Address,
    pub shares_requested: U256,
    pub starting_period: u64,
    pub yes_votes: U256,
    pub no_votes: U256,
    pub processed: bool,
    pub did_pass: bool,
    pub aborted: bool,
    pub token_tribute: U256,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MolochMember {
    pub delegate_key: Address,
    pub shares: U256,
    pub exists: bool,
    pub highest_index_yes_vote: u64,
}

/// Contract reads the Moloch enricher and storage fetcher depend on.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MolochApi: Send + Sync {
    async fn constants(&self) -> Result<MolochConstants>;

    async fn proposal_queue_length(&self) -> Result<u64>;

    async fn proposal(&self, index: u64) -> Result<MolochProposal>;

    async fn member(&self, address: Address) -> Result<MolochMember>;
}

pub struct MolochContract {
    address: Address,
    provider: Arc<WsProvider>,
}

impl MolochContract {
    pub fn new(address: Address, provider: Arc<WsProvider>) -> Self {
        Self { address, provider }
    }
}

#[async_trait]
impl MolochApi for MolochContract {
    async fn constants(&self) -> Result<MolochConstants> {
        let moloch = IMoloch1::new(self.address, self.provider.clone());
        let period_duration = moloch.periodDuration().call().await?._0;
        let summoning_time = moloch.summoningTime().call().await?._0;
        let voting_period = moloch.votingPeriodLength().call().await?._0;
        let grace_period = moloch.gracePeriodLength().call().await?._0;
        let abort_window = moloch.abortWindow().call().await?._0;
        Ok(MolochConstants {
            period_duration: to_u64(period_duration, "periodDuration")?,
            summoning_time: to_u64(summoning_time, "summoningTime")?,
            voting_period: to_u64(voting_period, "votingPeriodLength")?,
            grace_period: to_u64(grace_period, "gracePeriodLength")?,
            abort_window: to_u64(abort_window, "abortWindow")?,
        })
    }

    async fn proposal_queue_length(&self) -> Result<u64> {
        let moloch = IMoloch1::new(self.address, self.provider.clone());
        let length = moloch.getProposalQueueLength().call().await?._0;
        to_u64(length, "proposalQueueLength")
    }

    async fn proposal(&self, index: u64) -> Result<MolochProposal> {
        let moloch = IMoloch1::new(self.address, self.provider.clone());
        let p = moloch.proposalQueue(U256::from(index)).call().await?;
        Ok(MolochProposal {
            proposer: p.proposer,
            applicant: p.applicant,
            shares_requested: p.sharesRequested,
            starting_period: to_u64(p.startingPeriod, "startingPeriod")?,
            yes_votes: p.yesVotes,
            no_votes: p.noVotes,
            processed: p.processed,
            did_pass: p.didPass,
            aborted: p.aborted,
            token_tribute: p.tokenTribute,
            details: p.details,
        })
    }

    async fn member(&self, address: Address) -> Result<MolochMember> {
        let moloch = IMoloch1::new(self.address, self.provider.clone());
        let m = moloch.members(address).call().await?;
        Ok(MolochMember {
            delegate_key: m.delegateKey,
            shares: m.shares,
            exists: m.exists,
            highest_index_yes_vote: to_u64(m.highestIndexYesVote, "highestIndexYesVote")?,
        })
    }
}
