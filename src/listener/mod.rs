//! Per-chain orchestration: connect, catch up on what was missed, then follow the chain.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use crate::error::{ChainEventsError, Result};
use crate::events::{DisconnectedRange, SupportedNetwork};
use crate::handlers::HandlerChain;
use crate::pipeline::{
    BlockNumbered, CatchUp, DiscoverReconnectRange, Processor, StorageFetcher, Subscriber,
};

const LIVE_CHANNEL_SIZE: usize = 100;

/// What a network hands back once its API connection is open.
pub struct ListenerParts<R> {
    pub processor: Arc<dyn Processor<Raw = R>>,
    pub subscriber: Box<dyn Subscriber<Raw = R>>,
    pub catch_up: Option<Arc<dyn CatchUp>>,
    pub storage_fetcher: Option<Arc<dyn StorageFetcher>>,
}

/// Opens a network's API connection and builds its pipeline parts.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Raw: BlockNumbered + Send + 'static;

    fn network(&self) -> SupportedNetwork;

    async fn connect(&self) -> Result<ListenerParts<Self::Raw>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Uninitialized,
    Initializing,
    Ready,
    Subscribed,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListenerState::Uninitialized => "uninitialized",
            ListenerState::Initializing => "initializing",
            ListenerState::Ready => "ready",
            ListenerState::Subscribed => "subscribed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListenerOptions {
    pub skip_catchup: bool,
    /// Replay this range instead of asking where the listener left off.
    pub archival: Option<DisconnectedRange>,
}

pub struct Listener<C: Connector> {
    chain: String,
    connector: C,
    options: ListenerOptions,
    handlers: HandlerChain,
    discover: Option<Arc<dyn DiscoverReconnectRange>>,
    state: ListenerState,
    parts: Option<ListenerParts<C::Raw>>,
    live: Option<JoinHandle<()>>,
    span: Span,
}

impl<C: Connector> Listener<C> {
    pub fn new(
        chain: impl Into<String>,
        connector: C,
        options: ListenerOptions,
        handlers: HandlerChain,
    ) -> Self {
        Self {
            chain: chain.into(),
            connector,
            options,
            handlers,
            discover: None,
            state: ListenerState::Uninitialized,
            parts: None,
            live: None,
            span: Span::none(),
        }
    }

    pub fn with_discovery(mut self, discover: Arc<dyn DiscoverReconnectRange>) -> Self {
        self.discover = Some(discover);
        self
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn options(&self) -> &ListenerOptions {
        &self.options
    }

    pub fn storage_fetcher(&self) -> Option<Arc<dyn StorageFetcher>> {
        self.parts.as_ref()?.storage_fetcher.clone()
    }

    /// Opens the connection and builds the pipeline. Errors are fatal: the listener
    /// stays uninitialized and the caller decides what to do.
    pub async fn init(&mut self) -> Result<()> {
        if self.state == ListenerState::Subscribed {
            return Err(self.invalid_state("ready or uninitialized"));
        }

        self.span = info_span!(
            "listener",
            network = %self.connector.network(),
            chain = %self.chain
        );
        self.state = ListenerState::Initializing;

        match self.connector.connect().instrument(self.span.clone()).await {
            Ok(parts) => {
                self.parts = Some(parts);
                self.state = ListenerState::Ready;
                self.span.in_scope(|| info!("listener initialized"));
                Ok(())
            }
            Err(e) => {
                self.parts = None;
                self.state = ListenerState::Uninitialized;
                self.span
                    .in_scope(|| error!("failed to initialize listener: {e}"));
                Err(e)
            }
        }
    }

    /// Backfills what was missed (unless skipped) and then starts following the chain.
    pub async fn subscribe(&mut self) -> Result<()> {
        match self.state {
            ListenerState::Ready => {}
            ListenerState::Subscribed => {
                self.span.in_scope(|| warn!("listener already subscribed"));
                return Ok(());
            }
            _ => return Err(self.invalid_state("ready")),
        }

        let resume_after = if self.options.skip_catchup {
            self.span.in_scope(|| info!("skipping catch-up"));
            None
        } else {
            self.catch_up().instrument(self.span.clone()).await
        };

        let parts = self.parts.as_mut().ok_or(ChainEventsError::InvalidState {
            chain: self.chain.clone(),
            state: "ready without parts".into(),
            expected: "ready".into(),
        })?;

        let (tx, rx) = mpsc::channel(LIVE_CHANNEL_SIZE);
        parts
            .subscriber
            .subscribe(tx)
            .instrument(self.span.clone())
            .await?;

        let processor = parts.processor.clone();
        let handlers = self.handlers.clone();
        self.live = Some(tokio::spawn(
            run_live(rx, processor, handlers, resume_after).instrument(self.span.clone()),
        ));
        self.state = ListenerState::Subscribed;
        self.span.in_scope(|| info!("listener subscribed"));
        Ok(())
    }

    pub fn unsubscribe(&mut self) {
        if let Some(parts) = self.parts.as_mut() {
            parts.subscriber.unsubscribe();
        }
        if let Some(live) = self.live.take() {
            live.abort();
        }
        if self.state == ListenerState::Subscribed {
            self.state = ListenerState::Ready;
            self.span.in_scope(|| info!("listener unsubscribed"));
        }
    }

    /// Swaps in a new connection setup (new contract address, runtime spec...).
    /// Re-subscribes only if the listener was subscribed before.
    pub async fn update(&mut self, connector: C) -> Result<()> {
        let was_subscribed = self.state == ListenerState::Subscribed;
        self.unsubscribe();
        self.parts = None;
        self.state = ListenerState::Uninitialized;
        self.connector = connector;

        self.init().await?;
        if was_subscribed {
            self.subscribe().await?;
        }
        Ok(())
    }

    /// Returns the last height covered, so the live loop can skip it.
    async fn catch_up(&self) -> Option<u64> {
        let catch_up = match self.parts.as_ref().and_then(|p| p.catch_up.clone()) {
            Some(c) => c,
            None => {
                warn!("no catch-up source for this network, skipping");
                return None;
            }
        };

        let range = match self.options.archival {
            Some(range) => range,
            None => self.discover_range().await?,
        };

        let head = match catch_up.head().await {
            Ok(head) => head,
            Err(e) => {
                error!("could not fetch chain head, skipping catch-up: {e}");
                return None;
            }
        };

        let to = range.end_block.map_or(head, |end| end.min(head));
        if range.start_block > to {
            info!(
                start = range.start_block,
                head, "nothing to catch up on"
            );
            return None;
        }

        info!(from = range.start_block, to, "catching up on missed blocks");
        match catch_up
            .backfill(range.start_block, to, &self.handlers)
            .await
        {
            Ok(done) => {
                info!(
                    count = done.dispatched,
                    last_block = done.last_block,
                    "catch-up complete"
                );
                Some(done.last_block)
            }
            Err(e) => {
                error!("catch-up failed: {e}");
                None
            }
        }
    }

    async fn discover_range(&self) -> Option<DisconnectedRange> {
        let discover = match &self.discover {
            Some(d) => d,
            None => {
                warn!("no reconnect range discovery configured, skipping catch-up");
                return None;
            }
        };
        match discover.discover(&self.chain).await {
            Ok(Some(range)) => Some(range),
            Ok(None) => {
                warn!("no offline range found, skipping catch-up");
                None
            }
            Err(e) => {
                warn!("could not discover offline range, skipping catch-up: {e}");
                None
            }
        }
    }

    fn invalid_state(&self, expected: &str) -> ChainEventsError {
        ChainEventsError::InvalidState {
            chain: self.chain.clone(),
            state: self.state.to_string(),
            expected: expected.to_string(),
        }
    }
}

impl<C: Connector> Drop for Listener<C> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

async fn run_live<R: BlockNumbered + Send + 'static>(
    mut rx: mpsc::Receiver<R>,
    processor: Arc<dyn Processor<Raw = R>>,
    handlers: HandlerChain,
    resume_after: Option<u64>,
) {
    let mut first_live = true;
    while let Some(raw) = rx.recv().await {
        if let (Some(last), Some(block)) = (resume_after, raw.block_number()) {
            if block <= last {
                debug!(block, "already covered by catch-up");
                continue;
            }
            if first_live && block > last + 1 {
                warn!(
                    from = last + 1,
                    to = block - 1,
                    "blocks finalized before the subscription opened were missed"
                );
            }
            first_live = false;
        }
        for event in processor.process(raw).await {
            // failures are logged by the chain
            let _ = handlers.dispatch(event).await;
        }
    }
    warn!("subscription closed");
}

/// Object-safe view of a listener, whatever its network.
#[async_trait]
pub trait AnyListener: Send {
    fn chain(&self) -> &str;
    fn network(&self) -> SupportedNetwork;
    fn state(&self) -> ListenerState;
    fn storage_fetcher(&self) -> Option<Arc<dyn StorageFetcher>>;
    async fn init(&mut self) -> Result<()>;
    async fn subscribe(&mut self) -> Result<()>;
    fn unsubscribe(&mut self);
}

#[async_trait]
impl<C: Connector> AnyListener for Listener<C> {
    fn chain(&self) -> &str {
        Listener::chain(self)
    }

    fn network(&self) -> SupportedNetwork {
        self.connector.network()
    }

    fn state(&self) -> ListenerState {
        Listener::state(self)
    }

    fn storage_fetcher(&self) -> Option<Arc<dyn StorageFetcher>> {
        Listener::storage_fetcher(self)
    }

    async fn init(&mut self) -> Result<()> {
        Listener::init(self).await
    }

    async fn subscribe(&mut self) -> Result<()> {
        Listener::subscribe(self).await
    }

    fn unsubscribe(&mut self) {
        Listener::unsubscribe(self)
    }
}
