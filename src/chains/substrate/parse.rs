use super::versions::RuntimePaths;
use super::EventKind;

/// Maps a runtime event `(pallet, variant)` onto a kind. Module names that moved between
/// runtime versions are resolved through `paths`.
pub fn parse_type(paths: &RuntimePaths, section: &str, method: &str) -> Option<EventKind> {
    use EventKind as K;

    let kind = match (section, method) {
        ("Balances", "Transfer") => K::BalanceTransfer,

        ("Staking", "Slash" | "Slashed") => K::Slash,
        ("Staking", "Reward" | "Rewarded") => K::Reward,
        ("Staking", "Bonded") => K::Bonded,
        ("Staking", "Unbonded") => K::Unbonded,
        ("Staking", "StakingElection" | "StakersElected") => K::StakingElection,

        ("Democracy", "Delegated") => K::VoteDelegated,
        ("Democracy", "Proposed") => K::DemocracyProposed,
        ("Democracy", "Tabled") => K::DemocracyTabled,
        ("Democracy", "Started") => K::DemocracyStarted,
        ("Democracy", "Passed") => K::DemocracyPassed,
        ("Democracy", "NotPassed") => K::DemocracyNotPassed,
        ("Democracy", "Cancelled") => K::DemocracyCancelled,
        ("Democracy", "Executed") => K::DemocracyExecuted,
        ("Democracy", "PreimageNoted") => K::PreimageNoted,
        ("Democracy", "PreimageUsed") => K::PreimageUsed,
        ("Democracy", "PreimageInvalid") => K::PreimageInvalid,
        ("Democracy", "PreimageMissing") => K::PreimageMissing,
        ("Democracy", "PreimageReaped") => K::PreimageReaped,

        ("Treasury", "Proposed") => K::TreasuryProposed,
        ("Treasury", "Awarded") => K::TreasuryAwarded,
        ("Treasury", "Rejected") => K::TreasuryRejected,

        ("Council" | "TechnicalCommittee", m) => match m {
            "Proposed" => K::CollectiveProposed,
            "Voted" => K::CollectiveVoted,
            "Approved" => K::CollectiveApproved,
            "Disapproved" => K::CollectiveDisapproved,
            "Executed" => K::CollectiveExecuted,
            "MemberExecuted" => K::CollectiveMemberExecuted,
            _ => return None,
        },

        ("Signaling", "NewProposal") => K::SignalingNewProposal,
        ("Signaling", "CommitStarted") => K::SignalingCommitStarted,
        ("Signaling", "VotingStarted") => K::SignalingVotingStarted,
        ("Signaling", "VotingCompleted") => K::SignalingVotingCompleted,

        ("TreasuryReward", "TreasuryMinting") if paths.treasury_minting_v2 => {
            K::TreasuryRewardMintingV2
        }
        ("TreasuryReward", "TreasuryMinting") => K::TreasuryRewardMinting,

        ("Identity", "IdentitySet") => K::IdentitySet,
        ("Identity", "JudgementGiven") => K::JudgementGiven,
        ("Identity", "IdentityCleared") => K::IdentityCleared,
        ("Identity", "IdentityKilled") => K::IdentityKilled,

        ("Session", "NewSession") => K::NewSession,

        ("ImOnline", "AllGood") => K::AllGood,
        ("ImOnline", "HeartbeatReceived") => K::HeartbeatReceived,
        ("ImOnline", "SomeOffline") => K::SomeOffline,

        ("Offences", "Offence") => K::Offence,

        _ => return moved(paths, section, method),
    };
    Some(kind)
}

/// Pallets whose name depends on the runtime. Old runtimes keep tips and bounties
/// inside `Treasury`, so every candidate is tried.
fn moved(paths: &RuntimePaths, section: &str, method: &str) -> Option<EventKind> {
    use EventKind as K;

    let bounty = || match method {
        "BountyProposed" => Some(K::TreasuryBountyProposed),
        "BountyAwarded" => Some(K::TreasuryBountyAwarded),
        "BountyRejected" => Some(K::TreasuryBountyRejected),
        "BountyBecameActive" => Some(K::TreasuryBountyBecameActive),
        "BountyClaimed" => Some(K::TreasuryBountyClaimed),
        "BountyCanceled" => Some(K::TreasuryBountyCanceled),
        _ => None,
    };
    let tip = || match method {
        "NewTip" => Some(K::NewTip),
        "TipClosing" => Some(K::TipClosing),
        "TipClosed" => Some(K::TipClosed),
        "TipRetracted" => Some(K::TipRetracted),
        "TipSlashed" => Some(K::TipSlashed),
        _ => None,
    };
    let election = || match method {
        "NewTerm" => Some(K::ElectionNewTerm),
        "EmptyTerm" => Some(K::ElectionEmptyTerm),
        "MemberKicked" => Some(K::ElectionMemberKicked),
        "MemberRenounced" | "Renounced" => Some(K::ElectionMemberRenounced),
        _ => None,
    };

    paths
        .is_bounties(section)
        .then(bounty)
        .flatten()
        .or_else(|| paths.is_tips(section).then(tip).flatten())
        .or_else(|| paths.is_elections(section).then(election).flatten())
}

/// Kinds that are only visible as calls, never as events.
pub fn parse_extrinsic(paths: &RuntimePaths, section: &str, method: &str) -> Option<EventKind> {
    match (section, method) {
        ("Democracy", "second") => Some(EventKind::DemocracySeconded),
        ("Democracy", "vote") => Some(EventKind::DemocracyVoted),
        (s, "tip") if paths.is_tips(s) => Some(EventKind::TipVoted),
        (s, "submit_candidacy") if paths.is_elections(s) => {
            Some(EventKind::ElectionCandidacySubmitted)
        }
        (s, "extend_bounty_expiry") if paths.is_bounties(s) => {
            Some(EventKind::TreasuryBountyExtended)
        }
        _ => None,
    }
}
