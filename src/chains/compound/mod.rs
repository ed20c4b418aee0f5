//! Compound GovernorAlpha / GovernorBravo.

pub mod contracts;
pub mod enricher;
pub mod label;
pub mod parse;
mod types;

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::rpc::types::Log;
use async_trait::async_trait;

use crate::chains::evm::{self, log_listener_parts, LogSource};
use crate::config::ListenerConfig;
use crate::error::{ChainEventsError, Result};
use crate::events::SupportedNetwork;
use crate::listener::{Connector, ListenerParts};

pub use enricher::CompoundEnricher;
pub use label::{label, title};
pub use parse::parse_type;
pub use types::{EventData, EventKind};

pub struct CompoundConnector {
    chain: String,
    url: String,
    governor: Address,
    attempts: u32,
    retry_interval: Duration,
}

impl CompoundConnector {
    pub fn new(config: &ListenerConfig) -> Result<Self> {
        let governor = config.address.ok_or_else(|| {
            ChainEventsError::Config(format!("{}: compound needs a governor address", config.chain))
        })?;
        Ok(Self {
            chain: config.chain.clone(),
            url: config.url.clone(),
            governor,
            attempts: config.connect_attempts,
            retry_interval: config.retry_interval(),
        })
    }

    pub fn parts(&self, source: Arc<dyn LogSource>) -> ListenerParts<Log> {
        log_listener_parts(source, &self.chain, vec![self.governor], CompoundEnricher)
    }
}

#[async_trait]
impl Connector for CompoundConnector {
    type Raw = Log;

    fn network(&self) -> SupportedNetwork {
        SupportedNetwork::Compound
    }

    async fn connect(&self) -> Result<ListenerParts<Log>> {
        let client = evm::connect(&self.url, self.attempts, self.retry_interval).await?;
        Ok(self.parts(Arc::new(client)))
    }
}
