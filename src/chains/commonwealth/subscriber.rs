use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, Instrument};

use super::contracts::{CommonwealthApi, ProjectCreated};
use crate::chains::evm::{LogSource, TokenLog, TokenSubscriber};
use crate::config::TokenConfig;
use crate::error::Result;
use crate::pipeline::Subscriber;

/// Follows the factory and every project it has created, adding projects as the factory
/// announces them.
pub struct ProjectSubscriber {
    source: Arc<dyn LogSource>,
    api: Arc<dyn CommonwealthApi>,
    factory: Address,
    chain: String,
    retry_interval: Duration,
    inner: Option<TokenSubscriber>,
    task: Option<JoinHandle<()>>,
}

impl ProjectSubscriber {
    pub fn new(
        source: Arc<dyn LogSource>,
        api: Arc<dyn CommonwealthApi>,
        factory: Address,
        chain: &str,
        retry_interval: Duration,
    ) -> Self {
        Self {
            source,
            api,
            factory,
            chain: chain.to_string(),
            retry_interval,
            inner: None,
            task: None,
        }
    }

    /// Every contract currently followed, factory included.
    pub fn tracked(&self) -> Vec<Address> {
        self.inner.as_ref().map(|s| s.tracked()).unwrap_or_default()
    }

    fn contract(&self, address: Address) -> TokenConfig {
        TokenConfig {
            name: self.chain.clone(),
            address,
        }
    }
}

#[async_trait]
impl Subscriber for ProjectSubscriber {
    type Raw = Log;

    async fn subscribe(&mut self, sink: mpsc::Sender<Log>) -> Result<()> {
        let mut contracts = vec![self.contract(self.factory)];
        for index in 0..self.api.project_count().await? {
            let project = self.api.project_address(index).await?;
            contracts.push(self.contract(project));
        }

        let mut inner = TokenSubscriber::new(self.source.clone(), contracts, self.retry_interval);
        let (tx, mut rx) = mpsc::channel::<TokenLog>(64);
        inner.subscribe(tx).await?;

        let handle = inner.clone();
        let factory = self.factory;
        let chain = self.chain.clone();
        self.task = Some(tokio::spawn(
            async move {
                while let Some(TokenLog { log, .. }) = rx.recv().await {
                    let created = log.address() == factory
                        && log.topics().first() == Some(&ProjectCreated::SIGNATURE_HASH);
                    if created {
                        match ProjectCreated::decode_log(&log.inner, true) {
                            Ok(e) => {
                                let handle = handle.clone();
                                let project = TokenConfig {
                                    name: chain.clone(),
                                    address: e.project,
                                };
                                tokio::spawn(
                                    async move {
                                        if let Err(e) = handle.add_token(project).await {
                                            error!("could not follow new project: {e}");
                                        }
                                    }
                                    .in_current_span(),
                                );
                            }
                            Err(e) => error!("undecodable project creation: {e}"),
                        }
                    }
                    if sink.send(log).await.is_err() {
                        debug!("project sink closed, stopping forwarder");
                        break;
                    }
                }
            }
            .in_current_span(),
        ));
        info!(projects = inner.tracked().len().saturating_sub(1), "subscribed to projects");
        self.inner = Some(inner);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            inner.unsubscribe();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::commonwealth::contracts::MockCommonwealthApi;
    use crate::chains::commonwealth::enricher::fixtures::{every_kind, FACTORY, PROJECT};
    use crate::chains::evm::MockLogSource;
    use alloy::primitives::address;
    use futures_util::{stream, StreamExt};

    const OLD: Address = address!("00000000000000000000000000000000000000b0");

    #[tokio::test]
    async fn follows_projects_as_they_are_created() {
        let mut api = MockCommonwealthApi::new();
        api.expect_project_count().returning(|| Ok(1));
        api.expect_project_address().returning(|_| Ok(OLD));

        let mut source = MockLogSource::new();
        source.expect_subscribe_logs().returning(|filter| {
            let json = serde_json::to_string(&filter).unwrap().to_lowercase();
            if json.contains("00000000000000000000000000000000000000fa") {
                let (_, created) = every_kind(5).remove(0);
                Ok(stream::iter(vec![created]).chain(stream::pending()).boxed())
            } else {
                Ok(stream::pending().boxed())
            }
        });

        let mut subscriber = ProjectSubscriber::new(
            Arc::new(source),
            Arc::new(api),
            FACTORY,
            "cmn",
            Duration::from_millis(1),
        );
        let (tx, mut rx) = mpsc::channel(8);
        subscriber.subscribe(tx).await.unwrap();

        let log = rx.recv().await.unwrap();
        assert_eq!(log.address(), FACTORY);

        for _ in 0..100 {
            if subscriber.tracked().contains(&PROJECT) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let mut tracked = subscriber.tracked();
        tracked.sort();
        let mut expected = vec![FACTORY, OLD, PROJECT];
        expected.sort();
        assert_eq!(tracked, expected);

        subscriber.unsubscribe();
        assert!(subscriber.tracked().is_empty());
    }
}
