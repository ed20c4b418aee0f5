use super::{EventData, EventKind};
use crate::chains::{fmt_addr, LabelerFilter, TitlerFilter};

pub fn title(kind: EventKind) -> TitlerFilter {
    let (title, description) = match kind {
        EventKind::Transfer => ("NFT Transfer", "A non-fungible token was transferred."),
        EventKind::Approval => ("NFT Approval", "A non-fungible token transfer was approved."),
        EventKind::ApprovalForAll => (
            "NFT Approval For All",
            "An operator was allowed or denied control of all of an owner's tokens.",
        ),
    };
    TitlerFilter::new(title, description)
}

pub fn label(chain: &str, data: &EventData) -> LabelerFilter {
    match data {
        EventData::Transfer {
            from, to, token_id, ..
        } => LabelerFilter {
            heading: "NFT Transfer".into(),
            label: format!(
                "User {} transferred {chain} #{token_id} to {}.",
                fmt_addr(from),
                fmt_addr(to)
            ),
            link_url: None,
        },
        EventData::Approval {
            owner,
            approved,
            token_id,
            ..
        } => LabelerFilter {
            heading: "NFT Approval".into(),
            label: format!(
                "User {} approved {} to transfer {chain} #{token_id}.",
                fmt_addr(owner),
                fmt_addr(approved)
            ),
            link_url: None,
        },
        EventData::ApprovalForAll {
            owner,
            operator,
            approved,
            ..
        } => LabelerFilter {
            heading: "NFT Approval For All".into(),
            label: format!(
                "User {} {} {} to manage all their {chain} tokens.",
                fmt_addr(owner),
                if *approved { "allowed" } else { "disallowed" },
                fmt_addr(operator)
            ),
            link_url: None,
        },
    }
}
