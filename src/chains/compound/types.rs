use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIter, EnumString, IntoStaticStr};

/// Proposal ids are kept as even-length hex strings (`0x02`).
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
        id: String,
        proposer: String,
        targets: Vec<String>,
        values: Vec<String>,
        signatures: Vec<String>,
        calldatas: Vec<String>,
        start_block: u64,
        end_block: u64,
        description: String,
    },
    ProposalCanceled {
        id: String,
    },
    ProposalQueued {
        id: String,
        eta: u64,
    },
    ProposalExecuted {
        id: String,
    },
    /// `support` is 0 (against), 1 (for) or 2 (abstain). GovernorAlpha only emits 0 or 1
    /// and never a reason.
    VoteCast {
        id: String,
        voter: String,
        support: u8,
        votes: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}
