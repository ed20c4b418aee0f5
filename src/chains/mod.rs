//! Supported networks, and the dispatch that turns a network name into a running listener.

pub mod aave;
pub mod commonwealth;
pub mod compound;
pub mod erc20;
pub mod erc721;
pub mod evm;
pub mod moloch;
pub mod substrate;

use std::sync::Arc;

use alloy::primitives::U256;
use serde::Serialize;

use crate::config::ListenerConfig;
use crate::error::{ChainEventsError, Result};
use crate::events::{CWEvent, ChainEventData, ChainEventKind, DisconnectedRange, SupportedNetwork};
use crate::handlers::HandlerChain;
use crate::listener::{AnyListener, Connector, Listener, ListenerOptions};
use crate::pipeline::DiscoverReconnectRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitlerFilter {
    pub title: String,
    pub description: String,
}

impl TitlerFilter {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelerFilter {
    pub heading: String,
    pub label: String,
    pub link_url: Option<String>,
}

/// Shortens long addresses to `12345...789`.
pub fn fmt_addr(addr: &str) -> String {
    if addr.chars().count() < 16 {
        return addr.to_string();
    }
    let head: String = addr.chars().take(5).collect();
    let tail: String = addr.chars().skip(addr.chars().count() - 3).collect();
    format!("{head}...{tail}")
}

/// True when `value` is at least `permill / 1_000_000` of `total`. Zero disables the check.
pub fn meets_transfer_threshold(value: U256, total: U256, permill: u64) -> bool {
    if permill == 0 {
        return true;
    }
    value.saturating_mul(U256::from(1_000_000u64)) / U256::from(permill) >= total
}

pub fn title(kind: ChainEventKind) -> TitlerFilter {
    match kind {
        ChainEventKind::Substrate(k) => substrate::title(k),
        ChainEventKind::Aave(k) => aave::title(k),
        ChainEventKind::Compound(k) => compound::title(k),
        ChainEventKind::Moloch(k) => moloch::title(k),
        ChainEventKind::Erc20(k) => erc20::title(k),
        ChainEventKind::Erc721(k) => erc721::title(k),
        ChainEventKind::Commonwealth(k) => commonwealth::title(k),
    }
}

/// Title for a kind known only by its wire name.
pub fn title_for(network: SupportedNetwork, kind: &str) -> Result<TitlerFilter> {
    ChainEventKind::parse(network, kind)
        .map(title)
        .ok_or_else(|| ChainEventsError::UnknownKind {
            network,
            kind: kind.to_string(),
        })
}

pub fn label(chain: &str, event: &CWEvent) -> LabelerFilter {
    match &event.data {
        ChainEventData::Substrate(data) => substrate::label(chain, data),
        ChainEventData::Aave(data) => aave::label(chain, data),
        ChainEventData::Compound(data) => compound::label(chain, data),
        ChainEventData::Moloch(data) => moloch::label(chain, data),
        ChainEventData::Erc20(data) => erc20::label(chain, data),
        ChainEventData::Erc721(data) => erc721::label(chain, data),
        ChainEventData::Commonwealth(data) => commonwealth::label(chain, data),
    }
}

fn options(config: &ListenerConfig) -> ListenerOptions {
    ListenerOptions {
        skip_catchup: config.skip_catchup,
        archival: config.archival.as_ref().map(|a| DisconnectedRange {
            start_block: a.start_block,
            end_block: a.end_block,
            max_results: None,
        }),
    }
}

fn boxed<C: Connector>(
    config: &ListenerConfig,
    connector: C,
    handlers: HandlerChain,
    discover: Option<Arc<dyn DiscoverReconnectRange>>,
) -> Box<dyn AnyListener> {
    let listener = Listener::new(config.chain.clone(), connector, options(config), handlers);
    match discover {
        Some(discover) => Box::new(listener.with_discovery(discover)),
        None => Box::new(listener),
    }
}

/// Builds an uninitialized listener for the configured network.
pub fn create_listener(
    config: &ListenerConfig,
    handlers: HandlerChain,
    discover: Option<Arc<dyn DiscoverReconnectRange>>,
) -> Result<Box<dyn AnyListener>> {
    let listener = match config.network {
        SupportedNetwork::Substrate => boxed(
            config,
            substrate::SubstrateConnector::new(config)?,
            handlers,
            discover,
        ),
        SupportedNetwork::Aave => boxed(config, aave::AaveConnector::new(config)?, handlers, discover),
        SupportedNetwork::Compound => boxed(
            config,
            compound::CompoundConnector::new(config)?,
            handlers,
            discover,
        ),
        SupportedNetwork::Moloch => boxed(
            config,
            moloch::MolochConnector::new(config)?,
            handlers,
            discover,
        ),
        SupportedNetwork::Erc20 => boxed(config, erc20::Erc20Connector::new(config)?, handlers, discover),
        SupportedNetwork::Erc721 => boxed(
            config,
            erc721::Erc721Connector::new(config)?,
            handlers,
            discover,
        ),
        SupportedNetwork::Commonwealth => boxed(
            config,
            commonwealth::CommonwealthConnector::new(config)?,
            handlers,
            discover,
        ),
    };
    Ok(listener)
}
