//! Non-fungible token transfers and approvals across any number of tracked collections.

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

pub use enricher::Erc721Enricher;
pub use label::{label, title};
pub use parse::parse_type;
pub use types::{EventData, EventKind};

pub struct Erc721Connector {
    url: String,
    tokens: Vec<TokenConfig>,
    attempts: u32,
    retry_interval: Duration,
    subscriber: Mutex<Option<TokenSubscriber>>,
}

impl Erc721Connector {
    pub fn new(config: &ListenerConfig) -> Result<Self> {
        if config.tokens.is_empty() {
            return Err(ChainEventsError::Config(format!(
                "{}: erc721 needs at least one token",
                config.chain
            )));
        }
        Ok(Self {
            url: config.url.clone(),
            tokens: config.tokens.clone(),
            attempts: config.connect_attempts,
            retry_interval: config.retry_interval(),
            subscriber: Mutex::new(None),
        })
    }

    pub fn token_subscriber(&self) -> Option<TokenSubscriber> {
        self.subscriber.lock().ok().and_then(|s| s.clone())
    }

    pub fn parts(&self, source: Arc<dyn LogSource>) -> ListenerParts<TokenLog> {
        let (parts, subscriber) =
            token_listener_parts(source, self.tokens.clone(), self.retry_interval, Erc721Enricher);
        if let Ok(mut slot) = self.subscriber.lock() {
            *slot = Some(subscriber);
        }
        parts
    }
}

#[async_trait]
impl Connector for Erc721Connector {
    type Raw = TokenLog;

    fn network(&self) -> SupportedNetwork {
        SupportedNetwork::Erc721
    }

    async fn connect(&self) -> Result<ListenerParts<TokenLog>> {
        let client = evm::connect(&self.url, self.attempts, self.retry_interval).await?;
        Ok(self.parts(Arc::new(client)))
    }
}
