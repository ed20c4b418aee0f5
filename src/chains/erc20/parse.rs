use super::EventKind;

pub fn parse_type(name: &str) -> Option<EventKind> {
    match name {
        "Transfer" => Some(EventKind::Transfer),
        "Approval" => Some(EventKind::Approval),
        _ => None,
    }
}
