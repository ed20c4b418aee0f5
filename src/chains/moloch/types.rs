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
    SummonComplete {
        summoner: String,
        shares: String,
    },
    /// `start_time` is the unix time voting opens.
    SubmitProposal {
        proposal_index: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delegate_key: Option<String>,
        member: String,
        applicant: String,
        token_tribute: String,
        shares_requested: String,
        details: String,
        start_time: u64,
    },
    SubmitVote {
        proposal_index: u64,
        delegate_key: String,
        member: String,
        vote: u8,
        shares: String,
        highest_index_yes_vote: u64,
    },
    ProcessProposal {
        proposal_index: u64,
        applicant: String,
        member: String,
        token_tribute: String,
        shares_requested: String,
        did_pass: bool,
        yes_votes: String,
        no_votes: String,
    },
    Ragequit {
        member: String,
        shares_to_burn: String,
    },
    Abort {
        proposal_index: u64,
        applicant: String,
    },
    UpdateDelegateKey {
        member: String,
        new_delegate_key: String,
    },
}
