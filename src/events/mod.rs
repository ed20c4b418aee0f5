//! The canonical event envelope shared by every network.

pub mod entity;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::chains::{aave, commonwealth, compound, erc20, erc721, moloch, substrate};

pub use entity::{
    entity_to_field_name, event_to_entity, is_entity_completed, EntityEventKind, EntityKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedNetwork {
    Substrate,
    Aave,
    Compound,
    Moloch,
    Erc20,
    Erc721,
    Commonwealth,
}

impl SupportedNetwork {
    pub const ALL: [SupportedNetwork; 7] = [
        SupportedNetwork::Substrate,
        SupportedNetwork::Aave,
        SupportedNetwork::Compound,
        SupportedNetwork::Moloch,
        SupportedNetwork::Erc20,
        SupportedNetwork::Erc721,
        SupportedNetwork::Commonwealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedNetwork::Substrate => "substrate",
            SupportedNetwork::Aave => "aave",
            SupportedNetwork::Compound => "compound",
            SupportedNetwork::Moloch => "moloch",
            SupportedNetwork::Erc20 => "erc20",
            SupportedNetwork::Erc721 => "erc721",
            SupportedNetwork::Commonwealth => "commonwealth",
        }
    }

    /// Every event kind this network can produce.
    pub fn kinds(&self) -> Vec<ChainEventKind> {
        match self {
            SupportedNetwork::Substrate => substrate::EventKind::iter().map(Into::into).collect(),
            SupportedNetwork::Aave => aave::EventKind::iter().map(Into::into).collect(),
            SupportedNetwork::Compound => compound::EventKind::iter().map(Into::into).collect(),
            SupportedNetwork::Moloch => moloch::EventKind::iter().map(Into::into).collect(),
            SupportedNetwork::Erc20 => erc20::EventKind::iter().map(Into::into).collect(),
            SupportedNetwork::Erc721 => erc721::EventKind::iter().map(Into::into).collect(),
            SupportedNetwork::Commonwealth => {
                commonwealth::EventKind::iter().map(Into::into).collect()
            }
        }
    }
}

impl fmt::Display for SupportedNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportedNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SupportedNetwork::ALL
            .into_iter()
            .find(|n| n.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported network: {s}"))
    }
}

/// Network-specific payload. Each inner enum is tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChainEventData {
    Substrate(substrate::EventData),
    Aave(aave::EventData),
    Compound(compound::EventData),
    Moloch(moloch::EventData),
    Erc20(erc20::EventData),
    Erc721(erc721::EventData),
    Commonwealth(commonwealth::EventData),
}

impl ChainEventData {
    pub fn network(&self) -> SupportedNetwork {
        match self {
            ChainEventData::Substrate(_) => SupportedNetwork::Substrate,
            ChainEventData::Aave(_) => SupportedNetwork::Aave,
            ChainEventData::Compound(_) => SupportedNetwork::Compound,
            ChainEventData::Moloch(_) => SupportedNetwork::Moloch,
            ChainEventData::Erc20(_) => SupportedNetwork::Erc20,
            ChainEventData::Erc721(_) => SupportedNetwork::Erc721,
            ChainEventData::Commonwealth(_) => SupportedNetwork::Commonwealth,
        }
    }

    pub fn kind(&self) -> ChainEventKind {
        match self {
            ChainEventData::Substrate(d) => ChainEventKind::Substrate(d.into()),
            ChainEventData::Aave(d) => ChainEventKind::Aave(d.into()),
            ChainEventData::Compound(d) => ChainEventKind::Compound(d.into()),
            ChainEventData::Moloch(d) => ChainEventKind::Moloch(d.into()),
            ChainEventData::Erc20(d) => ChainEventKind::Erc20(d.into()),
            ChainEventData::Erc721(d) => ChainEventKind::Erc721(d.into()),
            ChainEventData::Commonwealth(d) => ChainEventKind::Commonwealth(d.into()),
        }
    }

    /// The value of the kind-specific identifying field, when the event has one.
    pub fn entity_id(&self) -> Option<String> {
        let (entity, _) = event_to_entity(self.kind())?;
        let field = entity_to_field_name(self.network(), entity)?;
        let value = serde_json::to_value(self).ok()?;
        match value.get(field)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

macro_rules! impl_from_network_data {
    ($($variant:ident => $module:ident),* $(,)?) => {
        $(
            impl From<$module::EventData> for ChainEventData {
                fn from(data: $module::EventData) -> Self {
                    ChainEventData::$variant(data)
                }
            }

            impl From<$module::EventKind> for ChainEventKind {
                fn from(kind: $module::EventKind) -> Self {
                    ChainEventKind::$variant(kind)
                }
            }
        )*
    };
}

impl_from_network_data!(
    Substrate => substrate,
    Aave => aave,
    Compound => compound,
    Moloch => moloch,
    Erc20 => erc20,
    Erc721 => erc721,
    Commonwealth => commonwealth,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainEventKind {
    Substrate(substrate::EventKind),
    Aave(aave::EventKind),
    Compound(compound::EventKind),
    Moloch(moloch::EventKind),
    Erc20(erc20::EventKind),
    Erc721(erc721::EventKind),
    Commonwealth(commonwealth::EventKind),
}

impl ChainEventKind {
    pub fn network(&self) -> SupportedNetwork {
        match self {
            ChainEventKind::Substrate(_) => SupportedNetwork::Substrate,
            ChainEventKind::Aave(_) => SupportedNetwork::Aave,
            ChainEventKind::Compound(_) => SupportedNetwork::Compound,
            ChainEventKind::Moloch(_) => SupportedNetwork::Moloch,
            ChainEventKind::Erc20(_) => SupportedNetwork::Erc20,
            ChainEventKind::Erc721(_) => SupportedNetwork::Erc721,
            ChainEventKind::Commonwealth(_) => SupportedNetwork::Commonwealth,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainEventKind::Substrate(k) => (*k).into(),
            ChainEventKind::Aave(k) => (*k).into(),
            ChainEventKind::Compound(k) => (*k).into(),
            ChainEventKind::Moloch(k) => (*k).into(),
            ChainEventKind::Erc20(k) => (*k).into(),
            ChainEventKind::Erc721(k) => (*k).into(),
            ChainEventKind::Commonwealth(k) => (*k).into(),
        }
    }

    /// Resolves a wire kind name within a network.
    pub fn parse(network: SupportedNetwork, kind: &str) -> Option<Self> {
        let parsed = match network {
            SupportedNetwork::Substrate => substrate::EventKind::from_str(kind).ok()?.into(),
            SupportedNetwork::Aave => aave::EventKind::from_str(kind).ok()?.into(),
            SupportedNetwork::Compound => compound::EventKind::from_str(kind).ok()?.into(),
            SupportedNetwork::Moloch => moloch::EventKind::from_str(kind).ok()?.into(),
            SupportedNetwork::Erc20 => erc20::EventKind::from_str(kind).ok()?.into(),
            SupportedNetwork::Erc721 => erc721::EventKind::from_str(kind).ok()?.into(),
            SupportedNetwork::Commonwealth => commonwealth::EventKind::from_str(kind).ok()?.into(),
        };
        Some(parsed)
    }
}

impl fmt::Display for ChainEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.network(), self.as_str())
    }
}

/// The canonical event handed to the handler chain.
///
/// Events built from current storage (rather than from a log or block) carry the head
/// height at fetch time in `block_number`, not the height the state change happened at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CWEvent {
    pub block_number: u64,
    pub network: SupportedNetwork,
    pub data: ChainEventData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_addresses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_addresses: Option<Vec<String>>,
}

impl CWEvent {
    pub fn new(block_number: u64, data: impl Into<ChainEventData>) -> Self {
        let data = data.into();
        Self {
            block_number,
            network: data.network(),
            data,
            chain: None,
            received: None,
            exclude_addresses: None,
            include_addresses: None,
        }
    }

    pub fn exclude(mut self, addresses: Vec<String>) -> Self {
        self.exclude_addresses = Some(addresses);
        self
    }

    pub fn include(mut self, addresses: Vec<String>) -> Self {
        self.include_addresses = Some(addresses);
        self
    }

    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }

    pub fn kind(&self) -> ChainEventKind {
        self.data.kind()
    }

    /// `(block, network, kind, entity id)`: enough to drop a redelivered event.
    pub fn idempotency_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.block_number,
            self.network,
            self.kind().as_str(),
            self.data.entity_id().unwrap_or_default()
        )
    }
}

/// A gap of blocks to backfill. `end_block: None` means up to the current head.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectedRange {
    pub start_block: u64,
    #[serde(default)]
    pub end_block: Option<u64>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl DisconnectedRange {
    pub fn from_block(start_block: u64) -> Self {
        Self {
            start_block,
            ..Default::default()
        }
    }

    pub fn contains(&self, block: u64) -> bool {
        block >= self.start_block && self.end_block.map_or(true, |end| block <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::aave::EventData as AaveData;

    fn queued(id: u64) -> AaveData {
        AaveData::ProposalQueued {
            id,
            execution_time: 1_700_000_000,
        }
    }

    #[test]
    fn network_is_derived_from_data() {
        let event = CWEvent::new(10, queued(3));
        assert_eq!(event.network, SupportedNetwork::Aave);
        assert_eq!(
            event.kind(),
            ChainEventKind::Aave(aave::EventKind::ProposalQueued)
        );
    }

    #[test]
    fn serializes_with_kind_tag_and_camel_case() {
        let event = CWEvent::new(10, queued(3)).exclude(vec!["0xabc".into()]);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["blockNumber"], 10);
        assert_eq!(json["network"], "aave");
        assert_eq!(json["data"]["kind"], "proposal-queued");
        assert_eq!(json["data"]["executionTime"], 1_700_000_000u64);
        assert_eq!(json["excludeAddresses"][0], "0xabc");
        assert!(json.get("includeAddresses").is_none());
    }

    #[test]
    fn idempotency_key_uses_entity_field() {
        let event = CWEvent::new(10, queued(3));
        assert_eq!(event.idempotency_key(), "10:aave:proposal-queued:3");
    }

    #[test]
    fn kind_names_round_trip_per_network() {
        for network in SupportedNetwork::ALL {
            let kinds = network.kinds();
            assert!(!kinds.is_empty(), "{network} has no kinds");
            for kind in kinds {
                assert_eq!(kind.network(), network);
                assert_eq!(ChainEventKind::parse(network, kind.as_str()), Some(kind));
            }
        }
        assert_eq!(
            ChainEventKind::parse(SupportedNetwork::Aave, "not-a-kind"),
            None
        );
    }

    #[test]
    fn network_parses_case_insensitively() {
        assert_eq!(
            "ERC20".parse::<SupportedNetwork>(),
            Ok(SupportedNetwork::Erc20)
        );
        assert!("cosmos".parse::<SupportedNetwork>().is_err());
    }

    #[test]
    fn range_contains_is_inclusive() {
        let open = DisconnectedRange::from_block(500);
        assert!(open.contains(500));
        assert!(open.contains(10_000));
        assert!(!open.contains(499));

        let closed = DisconnectedRange {
            start_block: 5,
            end_block: Some(7),
            max_results: None,
        };
        assert!(closed.contains(7));
        assert!(!closed.contains(8));
    }
}
