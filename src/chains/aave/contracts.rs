use alloy::primitives::B256;
use alloy::sol;
use alloy::sol_types::SolEvent;

sol! {
    interface IAaveGovernanceV2 {
        event ProposalCreated(
            uint256 id,
            address indexed creator,
            address indexed executor,
            address[] targets,
            uint256[] values,
            string[] signatures,
            bytes[] calldatas,
            bool[] withDelegatecalls,
            uint256 startBlock,
            uint256 endBlock,
            address strategy,
            bytes32 ipfsHash
        );
        event ProposalCanceled(uint256 id);
        event ProposalQueued(uint256 id, uint256 executionTime, address indexed initiatorQueueing);
        event ProposalExecuted(uint256 id, address indexed initiatorExecution);
        event VoteEmitted(uint256 id, address indexed voter, bool support, uint256 votingPower);
    }

    interface IGovernancePowerDelegationToken {
        event DelegateChanged(address indexed delegator, address indexed delegatee, uint8 delegationType);
        event DelegatedPowerChanged(address indexed user, uint256 amount, uint8 delegationType);
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
}

pub use IAaveGovernanceV2::{
    ProposalCanceled, ProposalCreated, ProposalExecuted, ProposalQueued, VoteEmitted,
};
pub use IGovernancePowerDelegationToken::{
    Approval, DelegateChanged, DelegatedPowerChanged, Transfer,
};

pub fn event_name(topic0: &B256) -> Option<&'static str> {
    let name = match *topic0 {
        t if t == ProposalCreated::SIGNATURE_HASH => "ProposalCreated",
        t if t == ProposalCanceled::SIGNATURE_HASH => "ProposalCanceled",
        t if t == ProposalQueued::SIGNATURE_HASH => "ProposalQueued",
        t if t == ProposalExecuted::SIGNATURE_HASH => "ProposalExecuted",
        t if t == VoteEmitted::SIGNATURE_HASH => "VoteEmitted",
        t if t == DelegateChanged::SIGNATURE_HASH => "DelegateChanged",
        t if t == DelegatedPowerChanged::SIGNATURE_HASH => "DelegatedPowerChanged",
        t if t == Transfer::SIGNATURE_HASH => "Transfer",
        t if t == Approval::SIGNATURE_HASH => "Approval",
        _ => return None,
    };
    Some(name)
}
