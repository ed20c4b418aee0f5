use super::{EventData, EventKind};
use crate::chains::{fmt_addr, LabelerFilter, TitlerFilter};

pub fn title(kind: EventKind) -> TitlerFilter {
    let (title, description) = match kind {
        EventKind::ProposalCreated => ("Proposal Created", "A proposal was created."),
        EventKind::ProposalCanceled => ("Proposal Canceled", "A proposal was canceled."),
        EventKind::ProposalQueued => ("Proposal Queued", "A proposal was queued for execution."),
        EventKind::ProposalExecuted => ("Proposal Executed", "A proposal was executed."),
        EventKind::VoteEmitted => ("Vote Emitted", "A vote was cast on a proposal."),
        EventKind::DelegateChanged => (
            "Delegate Changed",
            "A user delegated voting or proposition power.",
        ),
        EventKind::DelegatedPowerChanged => (
            "Delegated Power Changed",
            "A user's voting or proposition power changed.",
        ),
        EventKind::Transfer => ("Token Transfer", "A governance token was transferred."),
        EventKind::Approval => ("Token Approval", "A governance token spend was approved."),
    };
    TitlerFilter::new(title, description)
}

fn proposal_link(chain: &str, id: u64) -> Option<String> {
    Some(format!("/{chain}/proposal/onchainproposal/{id}"))
}

pub fn label(chain: &str, data: &EventData) -> LabelerFilter {
    match data {
        EventData::ProposalCreated { id, proposer, .. } => LabelerFilter {
            heading: "Proposal Created".into(),
            label: format!("Proposal {id} was created by {}.", fmt_addr(proposer)),
            link_url: proposal_link(chain, *id),
        },
        EventData::ProposalCanceled { id } => LabelerFilter {
            heading: "Proposal Canceled".into(),
            label: format!("Proposal {id} was canceled."),
            link_url: proposal_link(chain, *id),
        },
        EventData::ProposalQueued { id, execution_time } => LabelerFilter {
            heading: "Proposal Queued".into(),
            label: format!("Proposal {id} was queued, executable after {execution_time}."),
            link_url: proposal_link(chain, *id),
        },
        EventData::ProposalExecuted { id } => LabelerFilter {
            heading: "Proposal Executed".into(),
            label: format!("Proposal {id} was executed."),
            link_url: proposal_link(chain, *id),
        },
        EventData::VoteEmitted {
            id,
            voter,
            support,
            voting_power,
        } => LabelerFilter {
            heading: "Vote Emitted".into(),
            label: format!(
                "Voter {} voted {} proposal {id} with power {voting_power}.",
                fmt_addr(voter),
                if *support { "for" } else { "against" }
            ),
            link_url: proposal_link(chain, *id),
        },
        EventData::DelegateChanged {
            delegator,
            delegatee,
            ..
        } => LabelerFilter {
            heading: "Delegate Changed".into(),
            label: format!(
                "User {} delegated to {}.",
                fmt_addr(delegator),
                fmt_addr(delegatee)
            ),
            link_url: None,
        },
        EventData::DelegatedPowerChanged { who, amount, .. } => LabelerFilter {
            heading: "Delegated Power Changed".into(),
            label: format!("User {} now has {amount} delegated power.", fmt_addr(who)),
            link_url: None,
        },
        EventData::Transfer {
            from, to, amount, ..
        } => LabelerFilter {
            heading: "Token Transfer".into(),
            label: format!(
                "User {} transferred {amount} tokens to {}.",
                fmt_addr(from),
                fmt_addr(to)
            ),
            link_url: None,
        },
        EventData::Approval {
            owner,
            spender,
            amount,
            ..
        } => LabelerFilter {
            heading: "Token Approval".into(),
            label: format!(
                "User {} approved {} to spend {amount} tokens.",
                fmt_addr(owner),
                fmt_addr(spender)
            ),
            link_url: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::aave::enricher::{enrich, fixtures::every_kind};
    use crate::events::ChainEventData;
    use strum::IntoEnumIterator;

    #[test]
    fn every_kind_has_a_title() {
        for kind in EventKind::iter() {
            let t = title(kind);
            assert!(!t.title.is_empty(), "{kind:?}");
            assert!(!t.description.is_empty(), "{kind:?}");
        }
    }

    #[test]
    fn every_kind_has_a_label() {
        for (kind, raw) in every_kind(3) {
            let event = enrich(3, kind, &raw).unwrap();
            let ChainEventData::Aave(data) = &event.data else {
                panic!("wrong network");
            };
            let l = label("aave", data);
            assert!(!l.heading.is_empty(), "{kind:?}");
            assert!(!l.label.is_empty(), "{kind:?}");
        }
    }

    #[test]
    fn proposal_events_link_to_the_proposal() {
        let l = label("aave", &EventData::ProposalExecuted { id: 12 });
        assert_eq!(l.link_url.as_deref(), Some("/aave/proposal/onchainproposal/12"));
    }
}
