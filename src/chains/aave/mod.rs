//! Aave governance v2 and its governance tokens.

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

pub use enricher::AaveEnricher;
pub use label::{label, title};
pub use parse::parse_type;
pub use types::{EventData, EventKind};

pub struct AaveConnector {
    chain: String,
    url: String,
    governance: Address,
    tokens: Vec<Address>,
    attempts: u32,
    retry_interval: Duration,
}

impl AaveConnector {
    pub fn new(config: &ListenerConfig) -> Result<Self> {
        let governance = config.address.ok_or_else(|| {
            ChainEventsError::Config(format!("{}: aave needs a governance address", config.chain))
        })?;
        Ok(Self {
            chain: config.chain.clone(),
            url: config.url.clone(),
            governance,
            tokens: config.token_addresses.clone(),
            attempts: config.connect_attempts,
            retry_interval: config.retry_interval(),
        })
    }

    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses = vec![self.governance];
        addresses.extend(self.tokens.iter().copied());
        addresses
    }

    pub fn parts(&self, source: Arc<dyn LogSource>) -> ListenerParts<Log> {
        log_listener_parts(source, &self.chain, self.addresses(), AaveEnricher)
    }
}

#[async_trait]
impl Connector for AaveConnector {
    type Raw = Log;

    fn network(&self) -> SupportedNetwork {
        SupportedNetwork::Aave
    }

    async fn connect(&self) -> Result<ListenerParts<Log>> {
        let client = evm::connect(&self.url, self.attempts, self.retry_interval).await?;
        Ok(self.parts(Arc::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use super::enricher::fixtures::*;
    use super::*;
    use crate::chains::evm::MockLogSource;
    use crate::config::{EnricherConfig, PollerConfig};
    use crate::events::ChainEventKind;

    fn config() -> ListenerConfig {
        ListenerConfig {
            chain: "aave".into(),
            network: SupportedNetwork::Aave,
            url: "ws://localhost:8545".into(),
            address: Some(GOVERNANCE),
            token_addresses: vec![TOKEN],
            tokens: vec![],
            contract_version: 1,
            skip_catchup: false,
            verbose: false,
            retry_interval_ms: 10,
            connect_attempts: 1,
            enricher: EnricherConfig::default(),
            poller: PollerConfig::default(),
            archival: None,
        }
    }

    #[test]
    fn governance_address_is_required() {
        let mut cfg = config();
        cfg.address = None;
        assert!(matches!(
            AaveConnector::new(&cfg),
            Err(ChainEventsError::Config(_))
        ));
        assert_eq!(
            AaveConnector::new(&config()).unwrap().addresses(),
            vec![GOVERNANCE, TOKEN]
        );
    }

    #[tokio::test]
    async fn storage_fetcher_replays_a_single_proposal() {
        let mut source = MockLogSource::new();
        source.expect_block_number().returning(|| Ok(500));
        source.expect_logs().returning(|_| {
            let mut logs: Vec<Log> = every_kind(300).into_iter().map(|(_, l)| l).collect();
            logs.push(proposal_created(6, 200));
            Ok(logs)
        });

        let connector = AaveConnector::new(&config()).unwrap();
        let parts = connector.parts(Arc::new(source));
        let fetcher = parts.storage_fetcher.unwrap();

        let all = fetcher.fetch(None, false).await.unwrap();
        assert_eq!(all.len(), 10);
        assert_eq!(all[0].block_number, 200);
        assert!(all.iter().all(|e| e.chain.as_deref() == Some("aave")));

        let five = fetcher.fetch_one("5", None).await.unwrap();
        let kinds: Vec<ChainEventKind> = five.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ChainEventKind::Aave(EventKind::ProposalCreated),
                ChainEventKind::Aave(EventKind::ProposalCanceled),
                ChainEventKind::Aave(EventKind::ProposalQueued),
                ChainEventKind::Aave(EventKind::ProposalExecuted),
                ChainEventKind::Aave(EventKind::VoteEmitted),
            ]
        );
    }
}
