use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use super::api::SubstrateApi;
use super::block::SubstrateBlock;
use crate::error::Result;
use crate::pipeline::Subscriber;

/// Follows finalized blocks.
pub struct SubstrateSubscriber {
    api: Arc<dyn SubstrateApi>,
    task: Option<JoinHandle<()>>,
}

impl SubstrateSubscriber {
    pub fn new(api: Arc<dyn SubstrateApi>) -> Self {
        Self { api, task: None }
    }
}

#[async_trait]
impl Subscriber for SubstrateSubscriber {
    type Raw = SubstrateBlock;

    async fn subscribe(&mut self, sink: mpsc::Sender<SubstrateBlock>) -> Result<()> {
        let mut blocks = self.api.subscribe_blocks().await?;
        self.unsubscribe();
        self.task = Some(tokio::spawn(
            async move {
                while let Some(block) = blocks.next().await {
                    let block = match block {
                        Ok(block) => block,
                        Err(e) => {
                            warn!("could not fetch finalized block: {e}");
                            continue;
                        }
                    };
                    debug!(block = block.number, "new finalized block");
                    if sink.send(block).await.is_err() {
                        debug!("block sink closed, stopping forwarder");
                        break;
                    }
                }
            }
            .in_current_span(),
        ));
        info!("subscribed to finalized blocks");
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::substrate::api::MockSubstrateApi;
    use crate::chains::substrate::block::test_support::block;
    use crate::error::ChainEventsError;
    use futures_util::stream;

    #[tokio::test]
    async fn forwards_blocks_in_order_and_skips_errors() {
        let mut api = MockSubstrateApi::new();
        api.expect_subscribe_blocks().returning(|| {
            Ok(stream::iter(vec![
                Ok(block(1, vec![], vec![])),
                Err(ChainEventsError::Rpc("dropped".into())),
                Ok(block(2, vec![], vec![])),
            ])
            .boxed())
        });

        let mut subscriber = SubstrateSubscriber::new(Arc::new(api));
        let (tx, mut rx) = mpsc::channel(10);
        subscriber.subscribe(tx).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().number, 1);
        assert_eq!(rx.recv().await.unwrap().number, 2);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn unsubscribe_stops_forwarding() {
        let mut api = MockSubstrateApi::new();
        api.expect_subscribe_blocks()
            .returning(|| Ok(stream::pending().boxed()));

        let mut subscriber = SubstrateSubscriber::new(Arc::new(api));
        subscriber.unsubscribe();
        let (tx, mut rx) = mpsc::channel(10);
        subscriber.subscribe(tx).await.unwrap();
        subscriber.unsubscribe();

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn subscription_errors_surface() {
        let mut api = MockSubstrateApi::new();
        api.expect_subscribe_blocks()
            .returning(|| Err(ChainEventsError::Rpc("refused".into())));

        let mut subscriber = SubstrateSubscriber::new(Arc::new(api));
        let (tx, _rx) = mpsc::channel(10);
        assert!(subscriber.subscribe(tx).await.is_err());
    }
}
