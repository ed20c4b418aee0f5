use super::EventKind;

pub fn parse_type(name: &str) -> Option<EventKind> {
    let kind = match name {
        "ProposalCreated" => EventKind::ProposalCreated,
        "ProposalCanceled" => EventKind::ProposalCanceled,
        "ProposalQueued" => EventKind::ProposalQueued,
        "ProposalExecuted" => EventKind::ProposalExecuted,
        "VoteEmitted" => EventKind::VoteEmitted,
        "DelegateChanged" => EventKind::DelegateChanged,
        "DelegatedPowerChanged" => EventKind::DelegatedPowerChanged,
        "Transfer" => EventKind::Transfer,
        "Approval" => EventKind::Approval,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_names() {
        assert_eq!(parse_type("VoteEmitted"), Some(EventKind::VoteEmitted));
        assert_eq!(parse_type("Transfer"), Some(EventKind::Transfer));
        assert_eq!(parse_type("ProposalStateChanged"), None);
        assert_eq!(parse_type(""), None);
    }
}
