//! Commonwealth crowdfunding: a project factory and the curated projects it deploys.

pub mod contracts;
pub mod enricher;
pub mod label;
pub mod parse;
pub mod storage_fetcher;
pub mod subscriber;
mod types;

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::rpc::types::Log;
use async_trait::async_trait;

use crate::chains::evm::{self, LogProcessor, LogSource};
use crate::config::ListenerConfig;
use crate::error::{ChainEventsError, Result};
use crate::events::SupportedNetwork;
use crate::listener::{Connector, ListenerParts};
use crate::pipeline::{StorageCatchUp, StorageFetcher};

use contracts::{CommonwealthApi, CommonwealthContracts};

pub use enricher::CommonwealthEnricher;
pub use label::{label, title};
pub use parse::parse_type;
pub use storage_fetcher::CommonwealthStorageFetcher;
pub use subscriber::ProjectSubscriber;
pub use types::{EventData, EventKind};

pub struct CommonwealthConnector {
    chain: String,
    url: String,
    factory: Address,
    attempts: u32,
    retry_interval: Duration,
}

impl CommonwealthConnector {
    pub fn new(config: &ListenerConfig) -> Result<Self> {
        let factory = config.address.ok_or_else(|| {
            ChainEventsError::Config(format!(
                "{}: commonwealth needs a project factory address",
                config.chain
            ))
        })?;
        Ok(Self {
            chain: config.chain.clone(),
            url: config.url.clone(),
            factory,
            attempts: config.connect_attempts,
            retry_interval: config.retry_interval(),
        })
    }

    pub fn parts(&self, source: Arc<dyn LogSource>, api: Arc<dyn CommonwealthApi>) -> ListenerParts<Log> {
        let chain = Some(self.chain.clone());
        let fetcher: Arc<dyn StorageFetcher> = Arc::new(CommonwealthStorageFetcher::new(
            api.clone(),
            source.clone(),
            chain.clone(),
        ));
        ListenerParts {
            processor: Arc::new(LogProcessor::new(CommonwealthEnricher::new(api.clone()), chain)),
            subscriber: Box::new(ProjectSubscriber::new(
                source.clone(),
                api,
                self.factory,
                &self.chain,
                self.retry_interval,
            )),
            catch_up: Some(Arc::new(StorageCatchUp::new(fetcher.clone(), source))),
            storage_fetcher: Some(fetcher),
        }
    }
}

#[async_trait]
impl Connector for CommonwealthConnector {
    type Raw = Log;

    fn network(&self) -> SupportedNetwork {
        SupportedNetwork::Commonwealth
    }

    async fn connect(&self) -> Result<ListenerParts<Log>> {
        let client = evm::connect(&self.url, self.attempts, self.retry_interval).await?;
        let api = Arc::new(CommonwealthContracts::new(self.factory, client.provider()));
        Ok(self.parts(Arc::new(client), api))
    }
}
