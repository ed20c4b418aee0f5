use super::{CollectiveName, EventData, EventKind};
use crate::chains::{fmt_addr, LabelerFilter, TitlerFilter};

pub fn title(kind: EventKind) -> TitlerFilter {
    use EventKind as K;
    let (title, description) = match kind {
        K::Slash => ("Validator Slashed", "One of your validators was slashed."),
        K::Reward => ("Validator Rewarded", "A validator was rewarded for its work."),
        K::Bonded => ("Bonded", "Funds were bonded by a controller account."),
        K::Unbonded => ("Unbonded", "Funds were unbonded by a controller account."),
        K::StakingElection => ("Staking Election", "A new validator set was elected."),
        K::BalanceTransfer => ("Balance Transferred", "A balance transfer was performed."),
        K::VoteDelegated => ("Vote Delegated", "An account delegated its voting power."),
        K::DemocracyProposed => (
            "Democracy Proposal Created",
            "A new democracy proposal was introduced.",
        ),
        K::DemocracySeconded => (
            "Democracy Proposal Seconded",
            "A democracy proposal was seconded.",
        ),
        K::DemocracyTabled => (
            "Democracy Proposal Tabled",
            "A democracy proposal was tabled as a referendum.",
        ),
        K::DemocracyStarted => ("Referendum Started", "A new democracy referendum started voting."),
        K::DemocracyVoted => ("Vote Received on Referendum", "A vote was cast on a referendum."),
        K::DemocracyPassed => ("Referendum Passed", "A democracy referendum finished voting and passed."),
        K::DemocracyNotPassed => ("Referendum Failed", "A democracy referendum finished voting and failed."),
        K::DemocracyCancelled => ("Referendum Cancelled", "A democracy referendum was cancelled."),
        K::DemocracyExecuted => ("Referendum Executed", "A passed referendum was executed on chain."),
        K::PreimageNoted => ("Preimage Noted", "A preimage was noted for a democracy proposal."),
        K::PreimageUsed => ("Preimage Used", "A democracy proposal's preimage was used."),
        K::PreimageInvalid => ("Preimage Invalid", "A democracy proposal's preimage was invalid."),
        K::PreimageMissing => ("Preimage Missing", "A democracy proposal's preimage was not found."),
        K::PreimageReaped => ("Preimage Reaped", "A democracy proposal's preimage was reaped."),
        K::TreasuryProposed => ("Treasury Proposal Created", "A treasury spend proposal was created."),
        K::TreasuryAwarded => ("Treasury Proposal Awarded", "A treasury spend proposal was awarded."),
        K::TreasuryRejected => ("Treasury Proposal Rejected", "A treasury spend proposal was rejected."),
        K::TreasuryBountyProposed => ("Treasury Bounty Proposed", "A treasury bounty was proposed."),
        K::TreasuryBountyAwarded => ("Treasury Bounty Awarded", "A treasury bounty was awarded."),
        K::TreasuryBountyRejected => ("Treasury Bounty Rejected", "A treasury bounty was rejected."),
        K::TreasuryBountyBecameActive => (
            "Treasury Bounty Became Active",
            "A treasury bounty became active.",
        ),
        K::TreasuryBountyClaimed => ("Treasury Bounty Claimed", "A treasury bounty was claimed."),
        K::TreasuryBountyCanceled => ("Treasury Bounty Canceled", "A treasury bounty was canceled."),
        K::TreasuryBountyExtended => (
            "Treasury Bounty Expiry Extended",
            "A treasury bounty's expiry was extended.",
        ),
        K::NewTip => ("New Tip", "A new tip was suggested."),
        K::TipVoted => ("Tip Voted", "A tip was voted on."),
        K::TipClosing => ("Tip Closing", "A tip is about to close."),
        K::TipClosed => ("Tip Closed", "A tip was closed and paid out."),
        K::TipRetracted => ("Tip Retracted", "A tip was retracted by its finder."),
        K::TipSlashed => ("Tip Slashed", "A tip was slashed."),
        K::ElectionNewTerm => ("New Election Term", "A new election term started."),
        K::ElectionEmptyTerm => ("Empty Election Term", "A new election term started with no new members."),
        K::ElectionCandidacySubmitted => ("Candidacy Submitted", "Someone submitted a council candidacy."),
        K::ElectionMemberKicked => ("Council Member Kicked", "A council member was kicked at the end of a term."),
        K::ElectionMemberRenounced => ("Council Member Renounced", "A council member renounced their seat."),
        K::CollectiveProposed => ("New Collective Proposal", "A new collective proposal was introduced."),
        K::CollectiveVoted => ("Collective Proposal Voted", "A member voted on a collective proposal."),
        K::CollectiveApproved => ("Collective Proposal Approved", "A collective proposal was approved."),
        K::CollectiveDisapproved => (
            "Collective Proposal Disapproved",
            "A collective proposal was disapproved.",
        ),
        K::CollectiveExecuted => ("Collective Proposal Executed", "A collective proposal was executed."),
        K::CollectiveMemberExecuted => (
            "Collective Member Execution",
            "A collective member directly executed a proposal.",
        ),
        K::SignalingNewProposal => ("New Signaling Proposal", "A new signaling proposal was created."),
        K::SignalingCommitStarted => (
            "Signaling Proposal Commit Started",
            "A signaling proposal's commit phase started.",
        ),
        K::SignalingVotingStarted => (
            "Signaling Proposal Voting Started",
            "A signaling proposal's voting phase started.",
        ),
        K::SignalingVotingCompleted => (
            "Signaling Proposal Voting Completed",
            "A signaling proposal's voting phase completed.",
        ),
        K::TreasuryRewardMinting => ("Treasury Reward Minted", "A reward was added to the treasury pot."),
        K::TreasuryRewardMintingV2 => ("Treasury Reward Minted", "A reward was added to the treasury pot."),
        K::IdentitySet => ("Identity Set", "A user set an identity."),
        K::JudgementGiven => ("Identity Judgement Given", "A registrar judged an identity."),
        K::IdentityCleared => ("Identity Cleared", "A user cleared their identity."),
        K::IdentityKilled => ("Identity Killed", "A user's identity was rejected."),
        K::NewSession => ("New Session", "A new session started."),
        K::AllGood => ("All Good", "No validators were offline during the session."),
        K::HeartbeatReceived => ("Heartbeat Received", "A validator sent a heartbeat."),
        K::SomeOffline => ("Some Offline", "Validators went offline during the session."),
        K::Offence => ("Offence", "An offence was reported."),
    };
    TitlerFilter::new(title, description)
}

fn link(chain: &str, path: impl std::fmt::Display) -> Option<String> {
    Some(format!("/{chain}/{path}"))
}

fn democracy_link(chain: &str, index: u64) -> Option<String> {
    link(chain, format_args!("proposal/democracyproposal/{index}"))
}

fn referendum_link(chain: &str, index: u64) -> Option<String> {
    link(chain, format_args!("proposal/referendum/{index}"))
}

fn treasury_link(chain: &str, index: u64) -> Option<String> {
    link(chain, format_args!("proposal/treasuryproposal/{index}"))
}

fn bounty_link(chain: &str, index: u64) -> Option<String> {
    link(chain, format_args!("proposal/treasurybounty/{index}"))
}

fn motion_link(chain: &str, hash: &str) -> Option<String> {
    link(chain, format_args!("proposal/councilmotion/{hash}"))
}

fn signaling_link(chain: &str, vote_id: &str) -> Option<String> {
    link(chain, format_args!("proposal/signalingproposal/{vote_id}"))
}

fn tip_link(chain: &str, hash: &str) -> Option<String> {
    link(chain, format_args!("proposal/tip/{hash}"))
}

fn account_link(chain: &str, who: &str) -> Option<String> {
    link(chain, format_args!("account/{who}"))
}

fn collective(name: &Option<CollectiveName>) -> &'static str {
    match name {
        Some(CollectiveName::TechnicalCommittee) => "Technical Committee",
        _ => "Council",
    }
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "successfully"
    } else {
        "unsuccessfully"
    }
}

fn filter(heading: impl Into<String>, label: String, link_url: Option<String>) -> LabelerFilter {
    LabelerFilter {
        heading: heading.into(),
        label,
        link_url,
    }
}

pub fn label(chain: &str, data: &EventData) -> LabelerFilter {
    use EventData as D;
    match data {
        D::Slash { validator, amount } => filter(
            "Validator Slashed",
            format!("Validator {} was slashed by amount {amount}.", fmt_addr(validator)),
            None,
        ),
        D::Reward { validator, amount } => filter(
            "Validator Rewarded",
            match validator {
                Some(v) => format!("Validator {} was rewarded by amount {amount}.", fmt_addr(v)),
                None => format!("All online validators were rewarded by amount {amount}."),
            },
            None,
        ),
        D::Bonded {
            stash,
            amount,
            controller,
        } => filter(
            "Bonded",
            format!("{amount} was bonded by controller {} on stash {}.", fmt_addr(controller), fmt_addr(stash)),
            account_link(chain, stash),
        ),
        D::Unbonded {
            stash,
            amount,
            controller,
        } => filter(
            "Unbonded",
            format!("{amount} was unbonded by controller {} on stash {}.", fmt_addr(controller), fmt_addr(stash)),
            account_link(chain, stash),
        ),
        D::StakingElection { era, .. } => filter(
            "Staking Election",
            format!("A new validator set was elected for era {era}."),
            link(chain, "validators"),
        ),
        D::BalanceTransfer { sender, dest, value } => filter(
            "Balance Transferred",
            format!("{} transferred {value} to {}.", fmt_addr(sender), fmt_addr(dest)),
            None,
        ),
        D::VoteDelegated { who, target } => filter(
            "Vote Delegated",
            format!("{} received a voting delegation from {}.", fmt_addr(target), fmt_addr(who)),
            account_link(chain, who),
        ),
        D::DemocracyProposed {
            proposal_index,
            deposit,
            ..
        } => filter(
            "Democracy Proposal Created",
            format!("Democracy proposal {proposal_index} was introduced with a deposit of {deposit}."),
            democracy_link(chain, *proposal_index),
        ),
        D::DemocracySeconded { proposal_index, who } => filter(
            "Democracy Proposal Seconded",
            format!("Democracy proposal {proposal_index} was seconded by {}.", fmt_addr(who)),
            democracy_link(chain, *proposal_index),
        ),
        D::DemocracyTabled { proposal_index } => filter(
            "Democracy Proposal Tabled",
            format!("Democracy proposal {proposal_index} was tabled as a referendum."),
            democracy_link(chain, *proposal_index),
        ),
        D::DemocracyStarted {
            referendum_index,
            end_block,
            ..
        } => filter(
            "Democracy Referendum Started",
            if *end_block > 0 {
                format!("Referendum {referendum_index} started voting, and will finish voting at block {end_block}.")
            } else {
                format!("Referendum {referendum_index} started voting.")
            },
            referendum_link(chain, *referendum_index),
        ),
        D::DemocracyVoted {
            referendum_index,
            who,
            is_aye,
            conviction,
            balance,
        } => filter(
            "Vote Received on Democracy Referendum",
            format!(
                "Voter {} voted {} referendum {referendum_index} with conviction {conviction} and balance {balance}.",
                fmt_addr(who),
                if *is_aye { "Yes on" } else { "No on" }
            ),
            referendum_link(chain, *referendum_index),
        ),
        D::DemocracyPassed {
            referendum_index,
            dispatch_block,
        } => filter(
            "Democracy Referendum Passed",
            match dispatch_block {
                Some(at) => format!("Referendum {referendum_index} passed and will be dispatched on block {at}."),
                None => format!("Referendum {referendum_index} passed."),
            },
            referendum_link(chain, *referendum_index),
        ),
        D::DemocracyNotPassed { referendum_index } => filter(
            "Democracy Referendum Failed",
            format!("Referendum {referendum_index} failed."),
            referendum_link(chain, *referendum_index),
        ),
        D::DemocracyCancelled { referendum_index } => filter(
            "Democracy Referendum Cancelled",
            format!("Referendum {referendum_index} was cancelled."),
            referendum_link(chain, *referendum_index),
        ),
        D::DemocracyExecuted {
            referendum_index,
            execution_ok,
        } => filter(
            "Democracy Referendum Executed",
            format!("Referendum {referendum_index} was executed {}.", outcome(*execution_ok)),
            referendum_link(chain, *referendum_index),
        ),
        D::PreimageNoted { noter, .. } => filter(
            "Preimage Noted",
            format!("A new preimage was provided by {}.", fmt_addr(noter)),
            None,
        ),
        D::PreimageUsed { noter, .. } => filter(
            "Preimage Used",
            format!("A preimage provided by {} was used.", fmt_addr(noter)),
            None,
        ),
        D::PreimageInvalid {
            referendum_index, ..
        } => filter(
            "Preimage Invalid",
            format!("A preimage for referendum {referendum_index} was found to be invalid."),
            referendum_link(chain, *referendum_index),
        ),
        D::PreimageMissing {
            referendum_index, ..
        } => filter(
            "Preimage Missing",
            format!("A preimage for referendum {referendum_index} was not found."),
            referendum_link(chain, *referendum_index),
        ),
        D::PreimageReaped { noter, reaper, .. } => filter(
            "Preimage Reaped",
            format!("A preimage noted by {} was reaped by {}.", fmt_addr(noter), fmt_addr(reaper)),
            None,
        ),
        D::TreasuryProposed {
            proposal_index,
            proposer,
            value,
            ..
        } => filter(
            "Treasury Proposal Created",
            format!("Treasury proposal {proposal_index} was introduced by {} for {value}.", fmt_addr(proposer)),
            treasury_link(chain, *proposal_index),
        ),
        D::TreasuryAwarded {
            proposal_index,
            value,
            beneficiary,
        } => filter(
            "Treasury Proposal Awarded",
            format!("Treasury proposal {proposal_index} was awarded to {} for {value}.", fmt_addr(beneficiary)),
            treasury_link(chain, *proposal_index),
        ),
        D::TreasuryRejected { proposal_index } => filter(
            "Treasury Proposal Rejected",
            format!("Treasury proposal {proposal_index} was rejected."),
            treasury_link(chain, *proposal_index),
        ),
        D::TreasuryBountyProposed { bounty_index, .. } => filter(
            "Treasury Bounty Proposed",
            format!("Treasury bounty {bounty_index} was proposed."),
            bounty_link(chain, *bounty_index),
        ),
        D::TreasuryBountyAwarded {
            bounty_index,
            beneficiary,
            ..
        } => filter(
            "Treasury Bounty Awarded",
            format!("Treasury bounty {bounty_index} was awarded to {}.", fmt_addr(beneficiary)),
            bounty_link(chain, *bounty_index),
        ),
        D::TreasuryBountyRejected { bounty_index, bond } => filter(
            "Treasury Bounty Rejected",
            format!("Treasury bounty {bounty_index} with bond {bond} was rejected."),
            bounty_link(chain, *bounty_index),
        ),
        D::TreasuryBountyBecameActive { bounty_index, .. } => filter(
            "Treasury Bounty Became Active",
            format!("Treasury bounty {bounty_index} became active."),
            bounty_link(chain, *bounty_index),
        ),
        D::TreasuryBountyClaimed {
            bounty_index,
            payout,
            beneficiary,
        } => filter(
            "Treasury Bounty Claimed",
            format!("{} claimed treasury bounty {bounty_index}, worth {payout}.", fmt_addr(beneficiary)),
            bounty_link(chain, *bounty_index),
        ),
        D::TreasuryBountyCanceled { bounty_index } => filter(
            "Treasury Bounty Canceled",
            format!("Treasury bounty {bounty_index} was canceled."),
            bounty_link(chain, *bounty_index),
        ),
        D::TreasuryBountyExtended { bounty_index, .. } => filter(
            "Treasury Bounty Expiry Extended",
            format!("Treasury bounty {bounty_index} expiry was extended."),
            bounty_link(chain, *bounty_index),
        ),
        D::NewTip {
            proposal_hash,
            reason,
            who,
            ..
        } => filter(
            "New Tip Suggested",
            format!("A new tip for {} was suggested with reason \"{reason}\".", fmt_addr(who)),
            tip_link(chain, proposal_hash),
        ),
        D::TipVoted {
            proposal_hash,
            who,
            value,
        } => filter(
            "Tip Voted",
            format!("A tip was voted on by {} for {value}.", fmt_addr(who)),
            tip_link(chain, proposal_hash),
        ),
        D::TipClosing {
            proposal_hash,
            closing,
        } => filter(
            "Tip Closing",
            format!("A tip is now closing on block {closing}."),
            tip_link(chain, proposal_hash),
        ),
        D::TipClosed {
            proposal_hash,
            who,
            payout,
        } => filter(
            "Tip Closed",
            format!("A tip to {} was closed with payout {payout}.", fmt_addr(who)),
            tip_link(chain, proposal_hash),
        ),
        D::TipRetracted { proposal_hash } => filter(
            "Tip Retracted",
            "A tip was retracted.".into(),
            tip_link(chain, proposal_hash),
        ),
        D::TipSlashed {
            proposal_hash,
            finder,
            deposit,
        } => filter(
            "Tip Slashed",
            format!("A tip submitted by {} was slashed, losing a deposit of {deposit}.", fmt_addr(finder)),
            tip_link(chain, proposal_hash),
        ),
        D::ElectionNewTerm { new_members, .. } => filter(
            "New Election Term Started",
            format!("A new election term started with {} new members.", new_members.len()),
            link(chain, "council"),
        ),
        D::ElectionEmptyTerm { .. } => filter(
            "New Election Term Started",
            "A new election term started with no new members.".into(),
            link(chain, "council"),
        ),
        D::ElectionCandidacySubmitted { candidate, .. } => filter(
            "Council Candidate Submitted",
            format!("{} submitted a candidacy for council.", fmt_addr(candidate)),
            link(chain, "council"),
        ),
        D::ElectionMemberKicked { who } => filter(
            "Council Member Kicked",
            format!("{} left the council.", fmt_addr(who)),
            link(chain, "council"),
        ),
        D::ElectionMemberRenounced { who } => filter(
            "Council Member Renounced",
            format!("{} renounced their council candidacy.", fmt_addr(who)),
            link(chain, "council"),
        ),
        D::CollectiveProposed {
            collective_name,
            proposer,
            proposal_hash,
            threshold,
            ..
        } => filter(
            format!("New {} Proposal", collective(collective_name)),
            format!(
                "{} introduced a new {} proposal, requiring {threshold} approvals to pass.",
                fmt_addr(proposer),
                collective(collective_name)
            ),
            motion_link(chain, proposal_hash),
        ),
        D::CollectiveVoted {
            collective_name,
            proposal_hash,
            voter,
            vote,
        } => filter(
            format!("Member Voted on {} Proposal", collective(collective_name)),
            format!(
                "{} voted {} on a {} proposal.",
                fmt_addr(voter),
                if *vote { "yes" } else { "no" },
                collective(collective_name)
            ),
            motion_link(chain, proposal_hash),
        ),
        D::CollectiveApproved {
            collective_name,
            proposal_hash,
        } => filter(
            format!("{} Proposal Approved", collective(collective_name)),
            format!("A {} proposal was approved.", collective(collective_name)),
            motion_link(chain, proposal_hash),
        ),
        D::CollectiveDisapproved {
            collective_name,
            proposal_hash,
        } => filter(
            format!("{} Proposal Disapproved", collective(collective_name)),
            format!("A {} proposal was disapproved.", collective(collective_name)),
            motion_link(chain, proposal_hash),
        ),
        D::CollectiveExecuted {
            collective_name,
            proposal_hash,
            execution_ok,
        } => filter(
            format!("{} Proposal Executed", collective(collective_name)),
            format!(
                "Approved {} proposal was executed {}.",
                collective(collective_name),
                outcome(*execution_ok)
            ),
            motion_link(chain, proposal_hash),
        ),
        D::CollectiveMemberExecuted {
            collective_name,
            proposal_hash,
            execution_ok,
        } => filter(
            format!("{} Proposal Executed", collective(collective_name)),
            format!(
                "A member-executed {} proposal was executed {}.",
                collective(collective_name),
                outcome(*execution_ok)
            ),
            motion_link(chain, proposal_hash),
        ),
        D::SignalingNewProposal {
            proposer, vote_id, ..
        } => filter(
            "New Signaling Proposal",
            format!("A new signaling proposal was created by {}.", fmt_addr(proposer)),
            signaling_link(chain, vote_id),
        ),
        D::SignalingCommitStarted {
            vote_id, end_block, ..
        } => filter(
            "Signaling Proposal Commit Started",
            format!("A signaling proposal's commit phase started, and will last until block {end_block}."),
            signaling_link(chain, vote_id),
        ),
        D::SignalingVotingStarted {
            vote_id, end_block, ..
        } => filter(
            "Signaling Proposal Voting Started",
            format!("A signaling proposal's voting phase started, and will last until block {end_block}."),
            signaling_link(chain, vote_id),
        ),
        D::SignalingVotingCompleted { vote_id, .. } => filter(
            "Signaling Proposal Completed",
            "A signaling proposal's voting phase completed.".into(),
            signaling_link(chain, vote_id),
        ),
        D::TreasuryRewardMinting { pot, reward } => filter(
            "Treasury Reward Minted",
            format!("A treasury reward of {reward} was minted. The treasury now has a balance of {pot}."),
            None,
        ),
        D::TreasuryRewardMintingV2 { pot, .. } => filter(
            "Treasury Reward Minted",
            format!("A treasury reward was minted. The treasury now has a balance of {pot}."),
            None,
        ),
        D::IdentitySet { who, display_name, .. } => filter(
            "Identity Set",
            format!("{} set their identity with display name \"{display_name}\".", fmt_addr(who)),
            account_link(chain, who),
        ),
        D::JudgementGiven {
            who,
            registrar,
            judgement,
        } => filter(
            "Identity Judgement Given",
            format!(
                "Registrar {} passed judgement \"{}\" on {}.",
                fmt_addr(registrar),
                serde_json::to_value(judgement)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_owned))
                    .unwrap_or_default(),
                fmt_addr(who)
            ),
            account_link(chain, who),
        ),
        D::IdentityCleared { who } => filter(
            "Identity Cleared",
            format!("{} cleared their identity.", fmt_addr(who)),
            account_link(chain, who),
        ),
        D::IdentityKilled { who } => filter(
            "Identity Killed",
            format!("{}'s identity was removed.", fmt_addr(who)),
            account_link(chain, who),
        ),
        D::NewSession { session_index, .. } => filter(
            "New Session",
            format!("Session {session_index} started."),
            None,
        ),
        D::AllGood { session_index, .. } => filter(
            "All Good",
            format!("No validators committed offences during session {session_index}."),
            None,
        ),
        D::HeartbeatReceived { authority_id } => filter(
            "Heartbeat Received",
            format!("A new heartbeat was received from {}.", fmt_addr(authority_id)),
            None,
        ),
        D::SomeOffline { session_index, .. } => filter(
            "Some Offline",
            format!("At least one validator went offline during session {session_index}."),
            None,
        ),
        D::Offence {
            offence_kind,
            applied,
            ..
        } => filter(
            "Offence",
            format!(
                "An offence of type {offence_kind} was reported and {}.",
                if *applied { "penalties were applied" } else { "penalties were not applied" }
            ),
            link(chain, "validators"),
        ),
    }
}
