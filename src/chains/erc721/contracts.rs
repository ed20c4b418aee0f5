use alloy::primitives::B256;
use alloy::sol;
use alloy::sol_types::SolEvent;

sol! {
    interface IERC721 {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
        event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId);
        event ApprovalForAll(address indexed owner, address indexed operator, bool approved);
    }
}

pub use IERC721::{Approval, ApprovalForAll, Transfer};

pub fn event_name(topic0: &B256) -> Option<&'static str> {
    let name = match *topic0 {
        t if t == Transfer::SIGNATURE_HASH => "Transfer",
        t if t == Approval::SIGNATURE_HASH => "Approval",
        t if t == ApprovalForAll::SIGNATURE_HASH => "ApprovalForAll",
        _ => return None,
    };
    Some(name)
}
