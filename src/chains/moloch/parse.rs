use super::EventKind;

/// Only v1 contracts are decoded; v2 event names are not recognized.
pub fn parse_type(name: &str) -> Option<EventKind> {
    match name {
        "SummonComplete" => Some(EventKind::SummonComplete),
        "SubmitProposal" => Some(EventKind::SubmitProposal),
        "SubmitVote" => Some(EventKind::SubmitVote),
        "ProcessProposal" => Some(EventKind::ProcessProposal),
        "Ragequit" => Some(EventKind::Ragequit),
        "Abort" => Some(EventKind::Abort),
        "UpdateDelegateKey" => Some(EventKind::UpdateDelegateKey),
        _ => None,
    }
}
