use super::{EventData, EventKind};
use crate::chains::{fmt_addr, LabelerFilter, TitlerFilter};

pub fn title(kind: EventKind) -> TitlerFilter {
    let (title, description) = match kind {
        EventKind::SummonComplete => ("Summon Complete", "A new Moloch DAO was summoned."),
        EventKind::SubmitProposal => ("Proposal Submitted", "A new proposal was submitted."),
        EventKind::SubmitVote => ("Vote Submitted", "A member voted on a proposal."),
        EventKind::ProcessProposal => ("Proposal Processed", "A proposal was processed."),
        EventKind::Ragequit => ("Member Ragequit", "A member burned their shares and left."),
        EventKind::Abort => ("Proposal Aborted", "An applicant aborted their proposal."),
        EventKind::UpdateDelegateKey => (
            "Delegate Key Updated",
            "A member changed the key that votes on their behalf.",
        ),
    };
    TitlerFilter::new(title, description)
}

fn proposal_link(chain: &str, index: u64) -> Option<String> {
    Some(format!("/{chain}/proposal/molochproposal/{index}"))
}

pub fn label(chain: &str, data: &EventData) -> LabelerFilter {
    match data {
        EventData::SummonComplete { summoner, shares } => LabelerFilter {
            heading: "Summon Complete".into(),
            label: format!(
                "User {} summoned a new DAO with {shares} shares.",
                fmt_addr(summoner)
            ),
            link_url: None,
        },
        EventData::SubmitProposal {
            proposal_index,
            member,
            applicant,
            ..
        } => LabelerFilter {
            heading: "Proposal Submitted".into(),
            label: format!(
                "Member {} submitted proposal {proposal_index} for applicant {}.",
                fmt_addr(member),
                fmt_addr(applicant)
            ),
            link_url: proposal_link(chain, *proposal_index),
        },
        EventData::SubmitVote {
            proposal_index,
            member,
            vote,
            ..
        } => LabelerFilter {
            heading: "Vote Submitted".into(),
            label: format!(
                "Member {} voted {} proposal {proposal_index}.",
                fmt_addr(member),
                if *vote == 1 { "yes on" } else { "no on" }
            ),
            link_url: proposal_link(chain, *proposal_index),
        },
        EventData::ProcessProposal {
            proposal_index,
            did_pass,
            ..
        } => LabelerFilter {
            heading: "Proposal Processed".into(),
            label: format!(
                "Proposal {proposal_index} was processed and {}.",
                if *did_pass { "passed" } else { "failed" }
            ),
            link_url: proposal_link(chain, *proposal_index),
        },
        EventData::Ragequit {
            member,
            shares_to_burn,
        } => LabelerFilter {
            heading: "Member Ragequit".into(),
            label: format!(
                "Member {} ragequit, burning {shares_to_burn} shares.",
                fmt_addr(member)
            ),
            link_url: None,
        },
        EventData::Abort {
            proposal_index,
            applicant,
        } => LabelerFilter {
            heading: "Proposal Aborted".into(),
            label: format!(
                "Applicant {} aborted proposal {proposal_index}.",
                fmt_addr(applicant)
            ),
            link_url: proposal_link(chain, *proposal_index),
        },
        EventData::UpdateDelegateKey {
            member,
            new_delegate_key,
        } => LabelerFilter {
            heading: "Delegate Key Updated".into(),
            label: format!(
                "Member {} updated their delegate key to {}.",
                fmt_addr(member),
                fmt_addr(new_delegate_key)
            ),
            link_url: None,
        },
    }
}
