use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIter, EnumString, IntoStaticStr};

/// `id` is always the project contract's address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
#[strum_discriminants(
    name(EventKind),
    derive(Hash, EnumIter, EnumString, IntoStaticStr, Serialize, Deserialize),
    strum(serialize_all = "kebab-case"),
    serde(rename_all = "kebab-case")
)]
pub enum EventData {
    ProjectCreated {
        id: String,
        index: u64,
        name: String,
        ipfs_hash: String,
        cw_url: String,
        creator: String,
        beneficiary: String,
        accepted_token: String,
        curator_fee: String,
        threshold: String,
        deadline: u64,
        funding_amount: String,
    },
    ProjectBacked {
        id: String,
        sender: String,
        token: String,
        amount: String,
    },
    ProjectCurated {
        id: String,
        sender: String,
        token: String,
        amount: String,
    },
    ProjectSucceeded {
        id: String,
        timestamp: u64,
        amount: String,
    },
    ProjectFailed {
        id: String,
    },
    ProjectWithdraw {
        id: String,
        sender: String,
        token: String,
        amount: String,
        withdrawal_type: String,
    },
}
