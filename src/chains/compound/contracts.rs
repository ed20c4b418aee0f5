use alloy::primitives::{B256, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;

sol! {
    interface GovernorAlpha {
        event ProposalCreated(
            uint256 id,
            address proposer,
            address[] targets,
            uint256[] values,
            string[] signatures,
            bytes[] calldatas,
            uint256 startBlock,
            uint256 endBlock,
            string description
        );
        event VoteCast(address voter, uint256 proposalId, bool support, uint256 votes);
        event ProposalCanceled(uint256 id);
        event ProposalQueued(uint256 id, uint256 eta);
        event ProposalExecuted(uint256 id);
    }

    interface GovernorBravo {
        event VoteCast(address indexed voter, uint256 proposalId, uint8 support, uint256 votes, string reason);
    }
}

pub use GovernorAlpha::{
    ProposalCanceled, ProposalCreated, ProposalExecuted, ProposalQueued, VoteCast_0 as AlphaVoteCast,
};
pub use GovernorBravo::VoteCast_1 as BravoVoteCast;

/// Both governor generations report a vote as `VoteCast`; the signatures differ.
pub fn event_name(topic0: &B256) -> Option<&'static str> {
    let name = match *topic0 {
        t if t == ProposalCreated::SIGNATURE_HASH => "ProposalCreated",
        t if t == AlphaVoteCast::SIGNATURE_HASH => "VoteCast",
        t if t == BravoVoteCast::SIGNATURE_HASH => "VoteCast",
        t if t == ProposalCanceled::SIGNATURE_HASH => "ProposalCanceled",
        t if t == ProposalQueued::SIGNATURE_HASH => "ProposalQueued",
        t if t == ProposalExecuted::SIGNATURE_HASH => "ProposalExecuted",
        _ => return None,
    };
    Some(name)
}

pub fn hex_id(id: U256) -> String {
    let digits = format!("{id:x}");
    if digits.len() % 2 == 1 {
        format!("0x0{digits}")
    } else {
        format!("0x{digits}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_even_length_hex() {
        assert_eq!(hex_id(U256::from(2)), "0x02");
        assert_eq!(hex_id(U256::from(0x1ab)), "0x01ab");
        assert_eq!(hex_id(U256::from(0xff)), "0xff");
    }

    #[test]
    fn vote_signatures_differ_between_generations() {
        assert_ne!(AlphaVoteCast::SIGNATURE_HASH, BravoVoteCast::SIGNATURE_HASH);
        assert_eq!(event_name(&BravoVoteCast::SIGNATURE_HASH), Some("VoteCast"));
    }
}
