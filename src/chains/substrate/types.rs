use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectiveName {
    Council,
    TechnicalCommittee,
}

impl CollectiveName {
    /// Collective pallets are only named when they are one of the two well-known instances.
    pub fn from_pallet(pallet: &str) -> Option<Self> {
        match pallet {
            "Council" => Some(CollectiveName::Council),
            "TechnicalCommittee" => Some(CollectiveName::TechnicalCommittee),
            _ => None,
        }
    }

    pub fn pallet(&self) -> &'static str {
        match self {
            CollectiveName::Council => "Council",
            CollectiveName::TechnicalCommittee => "TechnicalCommittee",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityJudgement {
    Unknown,
    FeePaid,
    Reasonable,
    KnownGood,
    OutOfDate,
    LowQuality,
    Erroneous,
}

impl IdentityJudgement {
    /// Reads a judgement from its runtime variant name.
    pub fn from_variant(name: &str) -> Self {
        match name {
            "FeePaid" => IdentityJudgement::FeePaid,
            "Reasonable" => IdentityJudgement::Reasonable,
            "KnownGood" => IdentityJudgement::KnownGood,
            "OutOfDate" => IdentityJudgement::OutOfDate,
            "LowQuality" => IdentityJudgement::LowQuality,
            "Erroneous" => IdentityJudgement::Erroneous,
            _ => IdentityJudgement::Unknown,
        }
    }
}

/// A dispatchable call, as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    pub section: String,
    pub method: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nominator {
    pub who: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveExposure {
    pub own: String,
    pub total: String,
    pub others: Vec<Nominator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorInfo {
    /// Parts per billion.
    pub commission_perbill: u64,
    pub controller_id: String,
    pub reward_destination: String,
    pub next_session_ids: Vec<String>,
    pub era_points: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
#[strum_discriminants(
    name(EventKind),
    derive(Hash, EnumIter, EnumString, IntoStaticStr, Serialize, Deserialize),
    strum(serialize_all = "kebab-case"),
    serde(rename_all = "kebab-case")
)]
pub enum EventData {
    // staking
    Slash {
        validator: String,
        amount: String,
    },
    Reward {
        validator: Option<String>,
        amount: String,
    },
    Bonded {
        stash: String,
        amount: String,
        controller: String,
    },
    Unbonded {
        stash: String,
        amount: String,
        controller: String,
    },
    StakingElection {
        era: u64,
        validators: Vec<String>,
    },

    // balances
    BalanceTransfer {
        sender: String,
        dest: String,
        value: String,
    },

    // democracy
    VoteDelegated {
        who: String,
        target: String,
    },
    DemocracyProposed {
        proposal_index: u64,
        proposal_hash: String,
        deposit: String,
        proposer: String,
    },
    DemocracySeconded {
        proposal_index: u64,
        who: String,
    },
    DemocracyTabled {
        proposal_index: u64,
    },
    DemocracyStarted {
        referendum_index: u64,
        proposal_hash: String,
        vote_threshold: String,
        end_block: u64,
    },
    DemocracyVoted {
        referendum_index: u64,
        who: String,
        is_aye: bool,
        conviction: u8,
        balance: String,
    },
    DemocracyPassed {
        referendum_index: u64,
        dispatch_block: Option<u64>,
    },
    DemocracyNotPassed {
        referendum_index: u64,
    },
    DemocracyCancelled {
        referendum_index: u64,
    },
    DemocracyExecuted {
        referendum_index: u64,
        execution_ok: bool,
    },
    PreimageNoted {
        proposal_hash: String,
        noter: String,
        preimage: Option<CallInfo>,
    },
    PreimageUsed {
        proposal_hash: String,
        noter: String,
    },
    PreimageInvalid {
        proposal_hash: String,
        referendum_index: u64,
    },
    PreimageMissing {
        proposal_hash: String,
        referendum_index: u64,
    },
    PreimageReaped {
        proposal_hash: String,
        noter: String,
        reaper: String,
    },

    // treasury
    TreasuryProposed {
        proposal_index: u64,
        proposer: String,
        value: String,
        beneficiary: String,
        bond: String,
    },
    TreasuryAwarded {
        proposal_index: u64,
        value: String,
        beneficiary: String,
    },
    TreasuryRejected {
        proposal_index: u64,
    },

    // bounties
    TreasuryBountyProposed {
        bounty_index: u64,
        proposer: String,
        value: String,
        fee: String,
        curator_deposit: String,
        bond: String,
        description: Option<String>,
    },
    TreasuryBountyAwarded {
        bounty_index: u64,
        beneficiary: String,
        value: Option<String>,
        curator: Option<String>,
        unlock_at: Option<u64>,
    },
    TreasuryBountyRejected {
        bounty_index: u64,
        bond: String,
    },
    TreasuryBountyBecameActive {
        bounty_index: u64,
        curator: Option<String>,
        update_due: Option<u64>,
    },
    TreasuryBountyClaimed {
        bounty_index: u64,
        payout: String,
        beneficiary: String,
    },
    TreasuryBountyCanceled {
        bounty_index: u64,
    },
    TreasuryBountyExtended {
        bounty_index: u64,
        remark: String,
    },

    // tips
    NewTip {
        proposal_hash: String,
        reason: String,
        who: String,
        finder: String,
        deposit: String,
        finders_fee: bool,
    },
    TipVoted {
        proposal_hash: String,
        who: String,
        value: String,
    },
    TipClosing {
        proposal_hash: String,
        closing: u64,
    },
    TipClosed {
        proposal_hash: String,
        who: String,
        payout: String,
    },
    TipRetracted {
        proposal_hash: String,
    },
    TipSlashed {
        proposal_hash: String,
        finder: String,
        deposit: String,
    },

    // elections
    ElectionNewTerm {
        round: u64,
        new_members: Vec<String>,
        all_members: Vec<String>,
    },
    ElectionEmptyTerm {
        round: u64,
        members: Vec<String>,
    },
    ElectionCandidacySubmitted {
        round: u64,
        candidate: String,
    },
    ElectionMemberKicked {
        who: String,
    },
    ElectionMemberRenounced {
        who: String,
    },

    // collectives
    CollectiveProposed {
        collective_name: Option<CollectiveName>,
        proposer: String,
        proposal_index: u64,
        proposal_hash: String,
        threshold: u64,
        call: CallInfo,
    },
    CollectiveVoted {
        collective_name: Option<CollectiveName>,
        proposal_hash: String,
        voter: String,
        vote: bool,
    },
    CollectiveApproved {
        collective_name: Option<CollectiveName>,
        proposal_hash: String,
    },
    CollectiveDisapproved {
        collective_name: Option<CollectiveName>,
        proposal_hash: String,
    },
    CollectiveExecuted {
        collective_name: Option<CollectiveName>,
        proposal_hash: String,
        execution_ok: bool,
    },
    CollectiveMemberExecuted {
        collective_name: Option<CollectiveName>,
        proposal_hash: String,
        execution_ok: bool,
    },

    // signaling
    SignalingNewProposal {
        proposer: String,
        proposal_hash: String,
        vote_id: String,
        title: String,
        description: String,
        tally_type: String,
        vote_type: String,
        choices: Vec<String>,
    },
    SignalingCommitStarted {
        proposal_hash: String,
        vote_id: String,
        end_block: u64,
    },
    SignalingVotingStarted {
        proposal_hash: String,
        vote_id: String,
        end_block: u64,
    },
    SignalingVotingCompleted {
        proposal_hash: String,
        vote_id: String,
    },

    // treasury reward
    TreasuryRewardMinting {
        pot: String,
        reward: String,
    },
    TreasuryRewardMintingV2 {
        pot: String,
        pot_address: String,
    },

    // identity
    IdentitySet {
        who: String,
        display_name: String,
        judgements: Vec<(String, IdentityJudgement)>,
    },
    #[serde(rename = "identity-judgement-given")]
    #[strum_discriminants(strum(serialize = "identity-judgement-given"))]
    #[strum_discriminants(serde(rename = "identity-judgement-given"))]
    JudgementGiven {
        who: String,
        registrar: String,
        judgement: IdentityJudgement,
    },
    IdentityCleared {
        who: String,
    },
    IdentityKilled {
        who: String,
    },

    // session
    NewSession {
        active_exposures: BTreeMap<String, ActiveExposure>,
        active: Vec<String>,
        waiting: Vec<String>,
        session_index: u64,
        current_era: Option<u64>,
        validator_info: BTreeMap<String, ValidatorInfo>,
    },

    // im-online
    AllGood {
        session_index: u64,
        validators: Vec<String>,
    },
    HeartbeatReceived {
        authority_id: String,
    },
    SomeOffline {
        session_index: u64,
        validators: Vec<String>,
    },

    // offences
    #[serde(rename = "offences-offence")]
    #[strum_discriminants(strum(serialize = "offences-offence"))]
    #[strum_discriminants(serde(rename = "offences-offence"))]
    Offence {
        offence_kind: String,
        opaque_time_slot: String,
        applied: bool,
        offenders: Vec<String>,
    },
}
