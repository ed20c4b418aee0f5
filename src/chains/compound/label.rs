use super::{EventData, EventKind};
use crate::chains::{fmt_addr, LabelerFilter, TitlerFilter};

pub fn title(kind: EventKind) -> TitlerFilter {
    match kind {
        EventKind::ProposalCreated => {
            TitlerFilter::new("Proposal Created", "A proposal was created.")
        }
        EventKind::VoteCast => TitlerFilter::new("Vote Cast", "A vote was cast on a proposal."),
        EventKind::ProposalCanceled => {
            TitlerFilter::new("Proposal Canceled", "A proposal was canceled.")
        }
        EventKind::ProposalQueued => TitlerFilter::new(
            "Proposal Queued",
            "A proposal was queued in the timelock.",
        ),
        EventKind::ProposalExecuted => {
            TitlerFilter::new("Proposal Executed", "A proposal was executed.")
        }
    }
}

pub fn label(chain: &str, data: &EventData) -> LabelerFilter {
    let link = |id: &str| Some(format!("/{chain}/proposal/compoundproposal/{id}"));
    match data {
        EventData::ProposalCreated { id, proposer, .. } => LabelerFilter {
            heading: "Proposal Created".into(),
            label: format!("Proposal {id} was created by {}.", fmt_addr(proposer)),
            link_url: link(id),
        },
        EventData::VoteCast {
            id,
            voter,
            support,
            votes,
            ..
        } => {
            let position = match support {
                0 => "against",
                1 => "for",
                _ => "to abstain on",
            };
            LabelerFilter {
                heading: "Vote Cast".into(),
                label: format!(
                    "Voter {} voted {position} proposal {id} with {votes} votes.",
                    fmt_addr(voter)
                ),
                link_url: link(id),
            }
        }
        EventData::ProposalCanceled { id } => LabelerFilter {
            heading: "Proposal Canceled".into(),
            label: format!("Proposal {id} was canceled."),
            link_url: link(id),
        },
        EventData::ProposalQueued { id, eta } => LabelerFilter {
            heading: "Proposal Queued".into(),
            label: format!("Proposal {id} was queued, executable after {eta}."),
            link_url: link(id),
        },
        EventData::ProposalExecuted { id } => LabelerFilter {
            heading: "Proposal Executed".into(),
            label: format!("Proposal {id} was executed."),
            link_url: link(id),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::compound::enricher::{enrich, fixtures::every_kind};
    use crate::events::ChainEventData;
    use strum::IntoEnumIterator;

    #[test]
    fn every_kind_has_title_and_label() {
        for kind in EventKind::iter() {
            assert!(!title(kind).title.is_empty());
        }
        for (kind, raw) in every_kind(2) {
            let event = enrich(2, kind, &raw).unwrap();
            let ChainEventData::Compound(data) = &event.data else {
                panic!("wrong network");
            };
            let l = label("compound", data);
            assert!(l.label.contains("0x02"), "{kind:?}: {}", l.label);
            assert_eq!(
                l.link_url.as_deref(),
                Some("/compound/proposal/compoundproposal/0x02")
            );
        }
    }
}
