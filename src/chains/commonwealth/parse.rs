use super::EventKind;

/// Project contract events drop the `Project` prefix on chain.
pub fn parse_type(name: &str) -> Option<EventKind> {
    match name {
        "ProjectCreated" => Some(EventKind::ProjectCreated),
        "Back" => Some(EventKind::ProjectBacked),
        "Curate" => Some(EventKind::ProjectCurated),
        "Succeeded" => Some(EventKind::ProjectSucceeded),
        "Failed" => Some(EventKind::ProjectFailed),
        "Withdraw" => Some(EventKind::ProjectWithdraw),
        _ => None,
    }
}
