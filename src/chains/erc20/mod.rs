//! Fungible token transfers and approvals across any number of tracked tokens.

pub mod contracts;
pub mod enricher;
pub mod label;
pub mod parse;
mod types;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::chains::evm::{self, token_listener_parts, LogSource, TokenLog, TokenSubscriber};
use crate::config::{ListenerConfig, TokenConfig};
use crate::error::{ChainEventsError, Result};
use crate::events::SupportedNetwork;
use crate::listener::{Connector, ListenerParts};

use contracts::{Erc20Api, Erc20Contracts};

pub use enricher::Erc20Enricher;
pub use label::{label, title};
pub use parse::parse_type;
pub use types::{EventData, EventKind};

pub struct Erc20Connector {
    url: String,
    tokens: Vec<TokenConfig>,
    threshold_permill: Option<u64>,
    attempts: u32,
    retry_interval: Duration,
    subscriber: Mutex<Option<TokenSubscriber>>,
}

impl Erc20Connector {
    pub fn new(config: &ListenerConfig) -> Result<Self> {
        if config.tokens.is_empty() {
            return Err(ChainEventsError::Config(format!(
                "{}: erc20 needs at least one token",
                config.chain
            )));
        }
        Ok(Self {
            url: config.url.clone(),
            tokens: config.tokens.clone(),
            threshold_permill: config.enricher.balance_transfer_threshold_permill,
            attempts: config.connect_attempts,
            retry_interval: config.retry_interval(),
            subscriber: Mutex::new(None),
        })
    }

    /// Handle onto the live token subscriptions, once connected.
    pub fn token_subscriber(&self) -> Option<TokenSubscriber> {
        self.subscriber.lock().ok().and_then(|s| s.clone())
    }

    pub fn parts(&self, source: Arc<dyn LogSource>, api: Arc<dyn Erc20Api>) -> ListenerParts<TokenLog> {
        let enricher = Erc20Enricher::new(api, self.threshold_permill);
        let (parts, subscriber) =
            token_listener_parts(source, self.tokens.clone(), self.retry_interval, enricher);
        if let Ok(mut slot) = self.subscriber.lock() {
            *slot = Some(subscriber);
        }
        parts
    }
}

#[async_trait]
impl Connector for Erc20Connector {
    type Raw = TokenLog;

    fn network(&self) -> SupportedNetwork {
        SupportedNetwork::Erc20
    }

    async fn connect(&self) -> Result<ListenerParts<TokenLog>> {
        let client = evm::connect(&self.url, self.attempts, self.retry_interval).await?;
        let api = Arc::new(Erc20Contracts::new(client.provider()));
        Ok(self.parts(Arc::new(client), api))
    }
}
