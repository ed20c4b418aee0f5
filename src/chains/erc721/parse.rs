use super::EventKind;

pub fn parse_type(name: &str) -> Option<EventKind> {
    match name {
        "Transfer" => Some(EventKind::Transfer),
        "Approval" => Some(EventKind::Approval),
        "ApprovalForAll" => Some(EventKind::ApprovalForAll),
        _ => None,
    }
}
