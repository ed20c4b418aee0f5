use super::EventKind;

pub fn parse_type(name: &str) -> Option<EventKind> {
    match name {
        "ProposalCreated" => Some(EventKind::ProposalCreated),
        "VoteCast" => Some(EventKind::VoteCast),
        "ProposalCanceled" => Some(EventKind::ProposalCanceled),
        "ProposalQueued" => Some(EventKind::ProposalQueued),
        "ProposalExecuted" => Some(EventKind::ProposalExecuted),
        _ => None,
    }
}
