use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
#[strum_discriminants(
    name(EventKind),
    derive(Hash, EnumIter, EnumString, IntoStaticStr, Serialize, Deserialize),
    strum(serialize_all = "kebab-case"),
    serde(rename_all = "kebab-case")
)]
pub enum EventData {
    ProposalCreated {
        id: u64,
        proposer: String,
        executor: String,
        targets: Vec<String>,
        values: Vec<String>,
        signatures: Vec<String>,
        calldatas: Vec<String>,
        start_block: u64,
        end_block: u64,
        strategy: String,
        ipfs_hash: String,
    },
    ProposalCanceled {
        id: u64,
    },
    ProposalQueued {
        id: u64,
        execution_time: u64,
    },
    ProposalExecuted {
        id: u64,
    },
    VoteEmitted {
        id: u64,
        voter: String,
        support: bool,
        voting_power: String,
    },
    DelegateChanged {
        token_address: String,
        delegator: String,
        delegatee: String,
        #[serde(rename = "type")]
        delegation_type: u8,
    },
    DelegatedPowerChanged {
        token_address: String,
        who: String,
        amount: String,
        #[serde(rename = "type")]
        delegation_type: u8,
    },
    Transfer {
        token_address: String,
        from: String,
        to: String,
        amount: String,
    },
    Approval {
        token_address: String,
        owner: String,
        spender: String,
        amount: String,
    },
}
