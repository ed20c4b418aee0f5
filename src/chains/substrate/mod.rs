//! Substrate runtimes: finalized blocks expanded into governance, staking and identity events.

pub mod api;
pub mod block;
pub mod client;
pub mod enricher;
pub mod label;
pub mod parse;
pub mod poller;
pub mod processor;
pub mod queries;
pub mod storage_fetcher;
pub mod subscriber;
mod types;
pub mod versions;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{EnricherConfig, ListenerConfig};
use crate::error::Result;
use crate::events::SupportedNetwork;
use crate::listener::{Connector, ListenerParts};
use crate::pipeline::StorageFetcher;

use api::SubstrateApi;
use block::SubstrateBlock;

pub use enricher::SubstrateEnricher;
pub use label::{label, title};
pub use parse::{parse_extrinsic, parse_type};
pub use poller::{Poller, PollerCatchUp, ReplayMode};
pub use processor::SubstrateProcessor;
pub use storage_fetcher::SubstrateStorageFetcher;
pub use subscriber::SubstrateSubscriber;
pub use types::{
    ActiveExposure, CallInfo, CollectiveName, EventData, EventKind, IdentityJudgement, Nominator,
    ValidatorInfo,
};

pub struct SubstrateConnector {
    chain: String,
    url: String,
    attempts: u32,
    retry_interval: Duration,
    enricher: EnricherConfig,
    max_range: u64,
    batch_size: u64,
    archival: bool,
    follow_head: bool,
}

impl SubstrateConnector {
    pub fn new(config: &ListenerConfig) -> Result<Self> {
        Ok(Self {
            chain: config.chain.clone(),
            url: config.url.clone(),
            attempts: config.connect_attempts,
            retry_interval: config.retry_interval(),
            enricher: config.enricher.clone(),
            max_range: config.poller.max_range,
            batch_size: config.poller.batch_size,
            archival: config.archival.is_some(),
            // an archival run without an end keeps replaying until it meets the head
            follow_head: config
                .archival
                .as_ref()
                .is_some_and(|a| a.end_block.is_none()),
        })
    }

    /// Archival runs replay every block; a reconnect replays the most recent window.
    pub fn replay_mode(&self) -> ReplayMode {
        if self.archival {
            ReplayMode::Archive {
                batch_size: self.batch_size,
                follow_head: self.follow_head,
            }
        } else {
            ReplayMode::Window {
                max_range: self.max_range,
            }
        }
    }

    pub fn parts(&self, api: Arc<dyn SubstrateApi>) -> ListenerParts<SubstrateBlock> {
        let chain = Some(self.chain.clone());
        let enricher = SubstrateEnricher::new(api.clone(), &self.enricher);
        let processor = Arc::new(SubstrateProcessor::new(api.clone(), enricher, chain.clone()));
        let fetcher: Arc<dyn StorageFetcher> =
            Arc::new(SubstrateStorageFetcher::new(api.clone(), chain));
        ListenerParts {
            processor: processor.clone(),
            subscriber: Box::new(SubstrateSubscriber::new(api.clone())),
            catch_up: Some(Arc::new(PollerCatchUp::new(
                Poller::new(api),
                processor,
                self.replay_mode(),
            ))),
            storage_fetcher: Some(fetcher),
        }
    }
}

#[async_trait]
impl Connector for SubstrateConnector {
    type Raw = SubstrateBlock;

    fn network(&self) -> SupportedNetwork {
        SupportedNetwork::Substrate
    }

    async fn connect(&self) -> Result<ListenerParts<SubstrateBlock>> {
        let client = client::connect(&self.url, self.attempts, self.retry_interval).await?;
        Ok(self.parts(Arc::new(client)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::substrate::api::MockSubstrateApi;
    use crate::chains::substrate::block::test_support::{block, event, hash};
    use crate::chains::substrate::enricher::fixtures::{api, ALICE, BOB};
    use crate::config::{ArchivalConfig, PollerConfig};
    use crate::events::ChainEventKind;
    use crate::handlers::test_support::RecordingHandler;
    use crate::handlers::HandlerChain;
    use crate::pipeline::{CatchUp, Processor};
    use serde_json::json;

    fn config(archival: Option<ArchivalConfig>) -> ListenerConfig {
        with_max_range(archival, 100)
    }

    fn with_max_range(archival: Option<ArchivalConfig>, max_range: u64) -> ListenerConfig {
        ListenerConfig {
            chain: "edgeware".into(),
            network: SupportedNetwork::Substrate,
            url: "ws://localhost:9944".into(),
            address: None,
            token_addresses: vec![],
            tokens: vec![],
            contract_version: 1,
            skip_catchup: false,
            verbose: false,
            retry_interval_ms: 10,
            connect_attempts: 1,
            enricher: EnricherConfig::default(),
            poller: PollerConfig {
                max_range,
                batch_size: 5,
            },
            archival,
        }
    }

    #[test]
    fn archival_without_an_end_follows_the_head() {
        assert!(!SubstrateConnector::new(&config(None)).unwrap().follow_head);
        let bounded = ArchivalConfig {
            start_block: 1,
            end_block: Some(10),
        };
        assert!(!SubstrateConnector::new(&config(Some(bounded))).unwrap().follow_head);
        let open = ArchivalConfig {
            start_block: 1,
            end_block: None,
        };
        assert!(SubstrateConnector::new(&config(Some(open))).unwrap().follow_head);
    }

    #[test]
    fn replay_mode_follows_the_poller_config() {
        assert_eq!(
            SubstrateConnector::new(&config(None)).unwrap().replay_mode(),
            ReplayMode::Window { max_range: 100 }
        );
        let bounded = ArchivalConfig {
            start_block: 1,
            end_block: Some(10),
        };
        assert_eq!(
            SubstrateConnector::new(&config(Some(bounded))).unwrap().replay_mode(),
            ReplayMode::Archive {
                batch_size: 5,
                follow_head: false,
            }
        );
    }

    #[tokio::test]
    async fn processor_labels_events_with_chain() {
        let connector = SubstrateConnector::new(&config(None)).unwrap();
        let parts = connector.parts(Arc::new(api()));
        let raw = block(
            10,
            vec![event(
                "Balances",
                "Transfer",
                vec![json!(ALICE), json!(BOB), json!("1000")],
            )],
            vec![],
        );

        let events = parts.processor.process(raw).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chain.as_deref(), Some("edgeware"));
        assert_eq!(
            events[0].kind(),
            ChainEventKind::Substrate(EventKind::BalanceTransfer)
        );
        assert!(parts.catch_up.is_some());
        assert!(parts.storage_fetcher.is_some());
    }

    fn numbered_chain() -> MockSubstrateApi {
        let mut mock = MockSubstrateApi::new();
        mock.expect_head().returning(|| Ok(3));
        mock.expect_block_hash()
            .returning(|n| Ok(Some(hash(n))));
        mock.expect_block().returning(|h| {
            let number = u64::from_be_bytes(h.as_bytes()[24..].try_into().unwrap());
            Ok(block(number, vec![event("Democracy", "Tabled", vec![json!(number)])], vec![]))
        });
        mock.expect_has_pallet().returning(|_| true);
        mock.expect_has_storage().returning(|_, _| true);
        mock
    }

    #[tokio::test]
    async fn catch_up_replays_blocks() {
        let connector = SubstrateConnector::new(&config(None)).unwrap();
        let parts = connector.parts(Arc::new(numbered_chain()));
        let recorder = RecordingHandler::new("catch-up");
        let handlers = HandlerChain::new().with(recorder.clone());

        let catch_up = parts.catch_up.unwrap();
        assert_eq!(catch_up.head().await.unwrap(), 3);
        let done = catch_up.backfill(1, 3, &handlers).await.unwrap();
        assert_eq!(done.dispatched, 3);
        assert_eq!(done.last_block, 3);
        assert_eq!(recorder.blocks(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn configured_max_range_limits_the_catch_up_window() {
        let connector = SubstrateConnector::new(&with_max_range(None, 2)).unwrap();
        let parts = connector.parts(Arc::new(numbered_chain()));
        let recorder = RecordingHandler::new("catch-up");
        let handlers = HandlerChain::new().with(recorder.clone());

        let done = parts.catch_up.unwrap().backfill(1, 3, &handlers).await.unwrap();
        assert_eq!(recorder.blocks(), vec![2, 3]);
        assert_eq!(done.last_block, 3);
    }
}
