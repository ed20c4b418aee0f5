use super::{EventData, EventKind};
use crate::chains::{fmt_addr, LabelerFilter, TitlerFilter};

pub fn title(kind: EventKind) -> TitlerFilter {
    match kind {
        EventKind::Transfer => TitlerFilter::new("Token Transfer", "A token was transferred."),
        EventKind::Approval => {
            TitlerFilter::new("Token Approval", "A token spend was approved.")
        }
    }
}

/// `chain` is the token's configured name.
pub fn label(chain: &str, data: &EventData) -> LabelerFilter {
    match data {
        EventData::Transfer {
            from, to, value, ..
        } => LabelerFilter {
            heading: "Token Transfer".into(),
            label: format!(
                "User {} transferred {value} {chain} to {}.",
                fmt_addr(from),
                fmt_addr(to)
            ),
            link_url: None,
        },
        EventData::Approval {
            owner,
            spender,
            value,
            ..
        } => LabelerFilter {
            heading: "Token Approval".into(),
            label: format!(
                "User {} approved {} to spend {value} {chain}.",
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
    use strum::IntoEnumIterator;

    #[test]
    fn labels_name_the_token() {
        for kind in EventKind::iter() {
            assert!(!title(kind).title.is_empty());
        }
        let l = label(
            "dai",
            &EventData::Transfer {
                from: "0x0000000000000000000000000000000000000aaa".into(),
                to: "0x0000000000000000000000000000000000000bbb".into(),
                value: "10".into(),
                contract_address: "0x6b17".into(),
            },
        );
        assert_eq!(l.label, "User 0x000...aaa transferred 10 dai to 0x000...bbb.");
        assert!(l.link_url.is_none());
    }
}
