//! Moloch DAO (v1 contracts).

pub mod contracts;
pub mod enricher;
pub mod label;
pub mod parse;
pub mod storage_fetcher;
mod types;

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::rpc::types::Log;
use async_trait::async_trait;

use crate::chains::evm::{self, EvmSubscriber, LogProcessor, LogSource};
use crate::config::ListenerConfig;
use crate::error::{ChainEventsError, Result};
use crate::events::SupportedNetwork;
use crate::listener::{Connector, ListenerParts};
use crate::pipeline::{StorageCatchUp, StorageFetcher};

use contracts::{MolochApi, MolochContract};

pub use enricher::MolochEnricher;
pub use label::{label, title};
pub use parse::parse_type;
pub use storage_fetcher::MolochStorageFetcher;
pub use types::{EventData, EventKind};

pub struct MolochConnector {
    chain: String,
    url: String,
    dao: Address,
    version: u8,
    attempts: u32,
    retry_interval: Duration,
}

impl MolochConnector {
    pub fn new(config: &ListenerConfig) -> Result<Self> {
        let dao = config.address.ok_or_else(|| {
            ChainEventsError::Config(format!("{}: moloch needs a DAO address", config.chain))
        })?;
        if !matches!(config.contract_version, 1 | 2) {
            return Err(ChainEventsError::Config(format!(
                "{}: unsupported moloch contract version {}",
                config.chain, config.contract_version
            )));
        }
        Ok(Self {
            chain: config.chain.clone(),
            url: config.url.clone(),
            dao,
            version: config.contract_version,
            attempts: config.connect_attempts,
            retry_interval: config.retry_interval(),
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn parts(&self, source: Arc<dyn LogSource>, api: Arc<dyn MolochApi>) -> ListenerParts<Log> {
        let chain = Some(self.chain.clone());
        let fetcher: Arc<dyn StorageFetcher> = Arc::new(MolochStorageFetcher::new(
            api.clone(),
            source.clone(),
            self.version,
            chain.clone(),
        ));
        ListenerParts {
            processor: Arc::new(LogProcessor::new(MolochEnricher::new(api), chain)),
            subscriber: Box::new(EvmSubscriber::new(source.clone(), vec![self.dao])),
            catch_up: Some(Arc::new(StorageCatchUp::new(fetcher.clone(), source))),
            storage_fetcher: Some(fetcher),
        }
    }
}

#[async_trait]
impl Connector for MolochConnector {
    type Raw = Log;

    fn network(&self) -> SupportedNetwork {
        SupportedNetwork::Moloch
    }

    async fn connect(&self) -> Result<ListenerParts<Log>> {
        let client = evm::connect(&self.url, self.attempts, self.retry_interval).await?;
        let api = Arc::new(MolochContract::new(self.dao, client.provider()));
        Ok(self.parts(Arc::new(client), api))
    }
}
