use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
#[strum_discriminants(
    name(EventKind),
    derive(Hash, EnumIter, EnumString, IntoStaticStr, Serialize, Deserialize),
    strum(serialize_all = "kebab-case"),
    serde(rename_all = "kebab-case")
)]
pub enum EventData {
    Transfer {
        from: String,
        to: String,
        value: String,
        contract_address: String,
    },
    Approval {
        owner: String,
        spender: String,
        value: String,
        contract_address: String,
    },
}
