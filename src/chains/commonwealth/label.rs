use super::{EventData, EventKind};
use crate::chains::{fmt_addr, LabelerFilter, TitlerFilter};

pub fn title(kind: EventKind) -> TitlerFilter {
    let (title, description) = match kind {
        EventKind::ProjectCreated => ("Project Created", "A new crowdfunding project was created."),
        EventKind::ProjectBacked => ("Project Backed", "A project received backing."),
        EventKind::ProjectCurated => ("Project Curated", "A project received curation."),
        EventKind::ProjectSucceeded => ("Project Succeeded", "A project reached its funding goal."),
        EventKind::ProjectFailed => ("Project Failed", "A project missed its funding deadline."),
        EventKind::ProjectWithdraw => ("Project Withdrawal", "Funds were withdrawn from a project."),
    };
    TitlerFilter::new(title, description)
}

fn project_link(chain: &str, id: &str) -> Option<String> {
    Some(format!("/{chain}/project/{id}"))
}

pub fn label(chain: &str, data: &EventData) -> LabelerFilter {
    match data {
        EventData::ProjectCreated { id, name, creator, .. } => LabelerFilter {
            heading: "Project Created".into(),
            label: format!("Project '{name}' was created by {}.", fmt_addr(creator)),
            link_url: project_link(chain, id),
        },
        EventData::ProjectBacked { id, sender, amount, .. } => LabelerFilter {
            heading: "Project Backed".into(),
            label: format!("User {} backed project {} with {amount}.", fmt_addr(sender), fmt_addr(id)),
            link_url: project_link(chain, id),
        },
        EventData::ProjectCurated { id, sender, amount, .. } => LabelerFilter {
            heading: "Project Curated".into(),
            label: format!("User {} curated project {} with {amount}.", fmt_addr(sender), fmt_addr(id)),
            link_url: project_link(chain, id),
        },
        EventData::ProjectSucceeded { id, amount, .. } => LabelerFilter {
            heading: "Project Succeeded".into(),
            label: format!("Project {} succeeded, raising {amount}.", fmt_addr(id)),
            link_url: project_link(chain, id),
        },
        EventData::ProjectFailed { id } => LabelerFilter {
            heading: "Project Failed".into(),
            label: format!("Project {} failed to reach its goal.", fmt_addr(id)),
            link_url: project_link(chain, id),
        },
        EventData::ProjectWithdraw {
            id,
            sender,
            amount,
            withdrawal_type,
            ..
        } => LabelerFilter {
            heading: "Project Withdrawal".into(),
            label: format!(
                "User {} withdrew {amount} from project {} ({withdrawal_type}).",
                fmt_addr(sender),
                fmt_addr(id)
            ),
            link_url: project_link(chain, id),
        },
    }
}
