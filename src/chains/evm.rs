//! Plumbing shared by the Ethereum contract families: the websocket provider, log
//! subscriptions, a log-driven processor and storage fetcher, and block-by-timestamp lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider, WsConnect};
use alloy::pubsub::PubSubFrontend;
use alloy::rpc::types::{BlockNumberOrTag, Filter, Log};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};
use url::Url;

#[cfg(test)]
use mockall::automock;

use crate::config::TokenConfig;
use crate::error::{ChainEventsError, Result};
use crate::events::{CWEvent, DisconnectedRange, EntityKind};
use crate::listener::ListenerParts;
use crate::pipeline::{
    with_retries, BlockNumbered, HeadSource, Processor, StorageCatchUp, StorageFetcher, Subscriber,
};

pub type WsProvider = RootProvider<PubSubFrontend>;

const TOKEN_CONNECT_ATTEMPTS: u32 = 5;

/// Read access to an Ethereum node, as much of it as the pipeline needs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn block_number(&self) -> Result<u64>;

    async fn block_timestamp(&self, number: u64) -> Result<Option<u64>>;

    async fn logs(&self, filter: Filter) -> Result<Vec<Log>>;

    async fn subscribe_logs(&self, filter: Filter) -> Result<BoxStream<'static, Log>>;
}

#[derive(Clone)]
pub struct EvmClient {
    provider: Arc<WsProvider>,
}

impl EvmClient {
    pub fn new(provider: Arc<WsProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> Arc<WsProvider> {
        self.provider.clone()
    }
}

/// Opens the websocket provider, retrying a bounded number of times.
pub async fn connect(rpc_url: &str, attempts: u32, interval: Duration) -> Result<EvmClient> {
    let url = Url::parse(rpc_url)?;
    let provider = with_retries(rpc_url, attempts, interval, || {
        let ws = WsConnect::new(url.clone());
        async move { Ok(ProviderBuilder::new().on_ws(ws).await?) }
    })
    .await?;
    info!("connected to {}", url.host_str().unwrap_or("node"));
    Ok(EvmClient::new(Arc::new(provider)))
}

#[async_trait]
impl LogSource for EvmClient {
    async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn block_timestamp(&self, number: u64) -> Result<Option<u64>> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number), false)
            .await?;
        Ok(block.map(|b| b.header.timestamp))
    }

    async fn logs(&self, filter: Filter) -> Result<Vec<Log>> {
        Ok(self.provider.get_logs(&filter).await?)
    }

    async fn subscribe_logs(&self, filter: Filter) -> Result<BoxStream<'static, Log>> {
        let sub = self.provider.subscribe_logs(&filter).await?;
        Ok(sub.into_stream().boxed())
    }
}

#[async_trait]
impl HeadSource for Arc<dyn LogSource> {
    async fn head(&self) -> Result<u64> {
        self.block_number().await
    }
}

pub fn fmt_address(address: &Address) -> String {
    address.to_string()
}

pub fn hex_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn to_u64(value: U256, field: &str) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(ChainEventsError::decode(format!("{field} does not fit in u64: {value}")));
    }
    Ok(value.as_limbs()[0])
}

fn forward<T, F>(mut stream: BoxStream<'static, Log>, sink: mpsc::Sender<T>, wrap: F) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(Log) -> T + Send + 'static,
{
    tokio::spawn(
        async move {
            while let Some(log) = stream.next().await {
                if sink.send(wrap(log)).await.is_err() {
                    debug!("log sink closed, stopping forwarder");
                    break;
                }
            }
        }
        .in_current_span(),
    )
}

/// Follows every log emitted by a fixed set of contracts.
pub struct EvmSubscriber {
    source: Arc<dyn LogSource>,
    filter: Filter,
    task: Option<JoinHandle<()>>,
}

impl EvmSubscriber {
    pub fn new(source: Arc<dyn LogSource>, addresses: Vec<Address>) -> Self {
        Self {
            source,
            filter: Filter::new()
                .address(addresses)
                .from_block(BlockNumberOrTag::Latest),
            task: None,
        }
    }
}

#[async_trait]
impl Subscriber for EvmSubscriber {
    type Raw = Log;

    async fn subscribe(&mut self, sink: mpsc::Sender<Log>) -> Result<()> {
        let stream = self.source.subscribe_logs(self.filter.clone()).await?;
        self.task = Some(forward(stream, sink, |log| log));
        info!("subscribed to contract logs");
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// A log tagged with the tracked token it came from.
#[derive(Debug, Clone)]
pub struct TokenLog {
    pub name: String,
    pub log: Log,
}

impl BlockNumbered for TokenLog {
    fn block_number(&self) -> Option<u64> {
        self.log.block_number
    }
}

struct TokenTasks {
    sink: Mutex<Option<mpsc::Sender<TokenLog>>>,
    tasks: Mutex<HashMap<Address, JoinHandle<()>>>,
}

/// One subscriber fanned out over many token contracts. Clones share the same set of
/// subscriptions, so a handle kept by the embedding code can add tokens at runtime.
#[derive(Clone)]
pub struct TokenSubscriber {
    source: Arc<dyn LogSource>,
    tokens: Vec<TokenConfig>,
    retry_interval: Duration,
    inner: Arc<TokenTasks>,
}

impl TokenSubscriber {
    pub fn new(source: Arc<dyn LogSource>, tokens: Vec<TokenConfig>, retry_interval: Duration) -> Self {
        Self {
            source,
            tokens,
            retry_interval,
            inner: Arc::new(TokenTasks {
                sink: Mutex::new(None),
                tasks: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn tracked(&self) -> Vec<Address> {
        self.inner
            .tasks
            .lock()
            .map(|t| t.keys().copied().collect())
            .unwrap_or_default()
    }

    async fn open(&self, token: &TokenConfig, attempts: u32) -> Result<()> {
        let sink = self
            .inner
            .sink
            .lock()
            .ok()
            .and_then(|s| s.clone())
            .ok_or_else(|| ChainEventsError::InvalidState {
                chain: token.name.clone(),
                state: "unsubscribed".into(),
                expected: "subscribed".into(),
            })?;

        let filter = Filter::new()
            .address(token.address)
            .from_block(BlockNumberOrTag::Latest);
        let source = self.source.clone();
        let stream = with_retries(&token.name, attempts, self.retry_interval, || {
            let source = source.clone();
            let filter = filter.clone();
            async move { source.subscribe_logs(filter).await }
        })
        .await?;

        let name = token.name.clone();
        let task = forward(stream, sink, move |log| TokenLog {
            name: name.clone(),
            log,
        });
        if let Ok(mut tasks) = self.inner.tasks.lock() {
            if let Some(old) = tasks.insert(token.address, task) {
                old.abort();
            }
        }
        Ok(())
    }

    /// Starts following a new token without touching the existing subscriptions.
    pub async fn add_token(&self, token: TokenConfig) -> Result<()> {
        if self.tracked().contains(&token.address) {
            warn!(token = %token.name, "token already tracked");
            return Ok(());
        }
        self.open(&token, TOKEN_CONNECT_ATTEMPTS).await?;
        info!(token = %token.name, "added token subscription");
        Ok(())
    }

    pub fn remove_token(&self, address: &Address) -> bool {
        let removed = self
            .inner
            .tasks
            .lock()
            .ok()
            .and_then(|mut t| t.remove(address));
        match removed {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Subscriber for TokenSubscriber {
    type Raw = TokenLog;

    async fn subscribe(&mut self, sink: mpsc::Sender<TokenLog>) -> Result<()> {
        if let Ok(mut slot) = self.inner.sink.lock() {
            *slot = Some(sink);
        }
        for token in self.tokens.clone() {
            if let Err(e) = self.open(&token, 1).await {
                error!(token = %token.name, "could not subscribe to token: {e}");
            }
        }
        info!(count = self.tracked().len(), "subscribed to token logs");
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if let Ok(mut tasks) = self.inner.tasks.lock() {
            for (_, task) in tasks.drain() {
                task.abort();
            }
        }
        if let Ok(mut slot) = self.inner.sink.lock() {
            *slot = None;
        }
    }
}

/// Per-family half of the log pipeline: name resolution, kind parsing and enrichment.
#[async_trait]
pub trait LogEnricher: Send + Sync + 'static {
    type Kind: Copy + fmt::Debug + Send + Sync;

    /// Contract event name for the log's topic0, if it is one of ours.
    fn event_name(&self, log: &Log) -> Option<&'static str>;

    fn parse_type(&self, name: &str) -> Option<Self::Kind>;

    /// `Ok(None)` means the event was deliberately suppressed.
    async fn enrich(&self, block: u64, kind: Self::Kind, log: &Log) -> Result<Option<CWEvent>>;
}

pub struct LogProcessor<E> {
    enricher: E,
    chain: Option<String>,
}

impl<E: LogEnricher> LogProcessor<E> {
    pub fn new(enricher: E, chain: Option<String>) -> Self {
        Self { enricher, chain }
    }

    pub fn enricher(&self) -> &E {
        &self.enricher
    }

    pub async fn process_log(&self, log: &Log, chain: Option<&str>) -> Option<CWEvent> {
        let block = log.block_number?;
        let name = match self.enricher.event_name(log) {
            Some(name) => name,
            None => {
                debug!(block, "skipping log with unknown signature");
                return None;
            }
        };
        let kind = match self.enricher.parse_type(name) {
            Some(kind) => kind,
            None => {
                warn!(block, name, "unrecognized event, skipping");
                return None;
            }
        };

        match self.enricher.enrich(block, kind, log).await {
            Ok(Some(event)) => {
                let chain = chain.or(self.chain.as_deref());
                Some(match chain {
                    Some(chain) => event.with_chain(chain),
                    None => event,
                })
            }
            Ok(None) => None,
            Err(e) => {
                error!(block, name, kind = ?kind, "failed to enrich event: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl<E: LogEnricher> Processor for LogProcessor<E> {
    type Raw = Log;

    async fn process(&self, log: Log) -> Vec<CWEvent> {
        self.process_log(&log, None).await.into_iter().collect()
    }
}

/// Token logs are labelled with the token's own name as their chain.
pub struct TokenProcessor<E> {
    inner: LogProcessor<E>,
}

impl<E: LogEnricher> TokenProcessor<E> {
    pub fn new(enricher: E) -> Self {
        Self {
            inner: LogProcessor::new(enricher, None),
        }
    }
}

#[async_trait]
impl<E: LogEnricher> Processor for TokenProcessor<E> {
    type Raw = TokenLog;

    async fn process(&self, raw: TokenLog) -> Vec<CWEvent> {
        self.inner
            .process_log(&raw.log, Some(&raw.name))
            .await
            .into_iter()
            .collect()
    }
}

/// Replays historical contract logs through a processor.
pub struct LogStorageFetcher<E> {
    source: Arc<dyn LogSource>,
    addresses: Vec<Address>,
    processor: LogProcessor<E>,
}

impl<E: LogEnricher> LogStorageFetcher<E> {
    pub fn new(source: Arc<dyn LogSource>, addresses: Vec<Address>, processor: LogProcessor<E>) -> Self {
        Self {
            source,
            addresses,
            processor,
        }
    }
}

#[async_trait]
impl<E: LogEnricher> StorageFetcher for LogStorageFetcher<E> {
    async fn fetch(
        &self,
        range: Option<DisconnectedRange>,
        _fetch_all_completed: bool,
    ) -> Result<Vec<CWEvent>> {
        let head = self.source.block_number().await?;
        let range = range.unwrap_or_default();
        let to = range.end_block.map_or(head, |end| end.min(head));
        if range.start_block > to {
            warn!(start = range.start_block, head, "fetch range starts past head");
            return Ok(vec![]);
        }

        let filter = Filter::new()
            .address(self.addresses.clone())
            .from_block(range.start_block)
            .to_block(to);
        let logs = self.source.logs(filter).await?;
        info!(from = range.start_block, to, logs = logs.len(), "fetched historical logs");

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            if let Some(event) = self.processor.process_log(log, None).await {
                events.push(event);
            }
        }
        events.sort_by_key(|e| e.block_number);

        if let Some(max) = range.max_results {
            let skip = events.len().saturating_sub(max);
            events.drain(..skip);
        }
        Ok(events)
    }

    async fn fetch_one(&self, id: &str, _kind: Option<EntityKind>) -> Result<Vec<CWEvent>> {
        let events = self.fetch(None, true).await?;
        Ok(events
            .into_iter()
            .filter(|e| e.data.entity_id().as_deref() == Some(id))
            .collect())
    }
}

/// Pipeline for a governance-style contract family whose history can be replayed from logs.
pub fn log_listener_parts<E: LogEnricher + Clone>(
    source: Arc<dyn LogSource>,
    chain: &str,
    addresses: Vec<Address>,
    enricher: E,
) -> ListenerParts<Log> {
    let fetcher: Arc<dyn StorageFetcher> = Arc::new(LogStorageFetcher::new(
        source.clone(),
        addresses.clone(),
        LogProcessor::new(enricher.clone(), Some(chain.to_string())),
    ));
    ListenerParts {
        processor: Arc::new(LogProcessor::new(enricher, Some(chain.to_string()))),
        subscriber: Box::new(EvmSubscriber::new(source.clone(), addresses)),
        catch_up: Some(Arc::new(StorageCatchUp::new(fetcher.clone(), source))),
        storage_fetcher: Some(fetcher),
    }
}

/// Pipeline for a multi-token family. Token history is not replayed, so there is no
/// storage fetcher or catch-up. The returned handle adds and removes tokens at runtime.
pub fn token_listener_parts<E: LogEnricher>(
    source: Arc<dyn LogSource>,
    tokens: Vec<TokenConfig>,
    retry_interval: Duration,
    enricher: E,
) -> (ListenerParts<TokenLog>, TokenSubscriber) {
    let subscriber = TokenSubscriber::new(source, tokens, retry_interval);
    let parts = ListenerParts {
        processor: Arc::new(TokenProcessor::new(enricher)),
        subscriber: Box::new(subscriber.clone()),
        catch_up: None,
        storage_fetcher: None,
    };
    (parts, subscriber)
}

/// First block whose timestamp is at or after `timestamp`; `None` if the chain has not
/// reached it yet.
pub async fn block_at_or_after(source: &dyn LogSource, timestamp: u64) -> Result<Option<u64>> {
    let head = source.block_number().await?;
    let head_time = source
        .block_timestamp(head)
        .await?
        .ok_or_else(|| ChainEventsError::missing(format!("block {head} not found")))?;
    if timestamp > head_time {
        return Ok(None);
    }

    let (mut lo, mut hi) = (0u64, head);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let time = source
            .block_timestamp(mid)
            .await?
            .ok_or_else(|| ChainEventsError::missing(format!("block {mid} not found")))?;
        if time >= timestamp {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Ok(Some(lo))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use alloy::sol_types::SolEvent;

    pub fn log<E: SolEvent>(address: Address, block: u64, event: &E) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address,
                data: event.encode_log_data(),
            },
            block_number: Some(block),
            ..Default::default()
        }
    }

    /// A node whose block `n` has timestamp `n`.
    pub fn linear_chain(head: u64) -> MockLogSource {
        let mut source = MockLogSource::new();
        source.expect_block_number().returning(move || Ok(head));
        source
            .expect_block_timestamp()
            .returning(move |n| Ok((n <= head).then_some(n)));
        source
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use alloy::primitives::address;
    use alloy::sol;
    use futures_util::stream;

    sol! {
        event Ping(uint256 value);
    }

    #[derive(Debug, Clone, Copy)]
    struct PingKind;

    struct PingEnricher;

    #[async_trait]
    impl LogEnricher for PingEnricher {
        type Kind = PingKind;

        fn event_name(&self, log: &Log) -> Option<&'static str> {
            use alloy::sol_types::SolEvent;
            (log.topics().first() == Some(&Ping::SIGNATURE_HASH)).then_some("Ping")
        }

        fn parse_type(&self, name: &str) -> Option<PingKind> {
            (name == "Ping").then_some(PingKind)
        }

        async fn enrich(&self, block: u64, _: PingKind, log: &Log) -> Result<Option<CWEvent>> {
            use alloy::sol_types::SolEvent;
            let ping = Ping::decode_log(&log.inner, true)?;
            if ping.value == U256::ZERO {
                return Err(ChainEventsError::missing("zero ping"));
            }
            Ok(Some(CWEvent::new(
                block,
                crate::chains::erc20::EventData::Transfer {
                    from: "0x1".into(),
                    to: "0x2".into(),
                    value: ping.value.to_string(),
                    contract_address: fmt_address(&log.address()),
                },
            )))
        }
    }

    const CONTRACT: Address = address!("00000000000000000000000000000000000000c0");

    #[tokio::test]
    async fn processor_drops_failed_and_unknown_logs() {
        let processor = LogProcessor::new(PingEnricher, Some("pings".into()));

        let ok = processor
            .process(log(CONTRACT, 3, &Ping { value: U256::from(9) }))
            .await;
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].chain.as_deref(), Some("pings"));
        assert_eq!(ok[0].block_number, 3);

        assert!(processor
            .process(log(CONTRACT, 4, &Ping { value: U256::ZERO }))
            .await
            .is_empty());

        let mut unknown = log(CONTRACT, 5, &Ping { value: U256::from(1) });
        unknown.inner.data = alloy::primitives::LogData::new_unchecked(vec![], Default::default());
        assert!(processor.process(unknown).await.is_empty());
    }

    #[tokio::test]
    async fn token_processor_uses_token_name_as_chain() {
        let processor = TokenProcessor::new(PingEnricher);
        let events = processor
            .process(TokenLog {
                name: "dai".into(),
                log: log(CONTRACT, 1, &Ping { value: U256::from(1) }),
            })
            .await;
        assert_eq!(events[0].chain.as_deref(), Some("dai"));
    }

    #[tokio::test]
    async fn storage_fetcher_sorts_and_honours_max_results() {
        let mut source = MockLogSource::new();
        source.expect_block_number().returning(|| Ok(100));
        source.expect_logs().returning(|_| {
            Ok(vec![
                log(CONTRACT, 30, &Ping { value: U256::from(3) }),
                log(CONTRACT, 10, &Ping { value: U256::from(1) }),
                log(CONTRACT, 20, &Ping { value: U256::from(2) }),
            ])
        });
        let fetcher = LogStorageFetcher::new(
            Arc::new(source),
            vec![CONTRACT],
            LogProcessor::new(PingEnricher, None),
        );

        let all = fetcher.fetch(None, false).await.unwrap();
        let blocks: Vec<u64> = all.iter().map(|e| e.block_number).collect();
        assert_eq!(blocks, vec![10, 20, 30]);

        let capped = fetcher
            .fetch(
                Some(DisconnectedRange {
                    start_block: 0,
                    end_block: None,
                    max_results: Some(2),
                }),
                false,
            )
            .await
            .unwrap();
        let blocks: Vec<u64> = capped.iter().map(|e| e.block_number).collect();
        assert_eq!(blocks, vec![20, 30]);
    }

    #[tokio::test]
    async fn fetch_past_head_is_empty() {
        let mut source = MockLogSource::new();
        source.expect_block_number().returning(|| Ok(10));
        source.expect_logs().never();
        let fetcher = LogStorageFetcher::new(
            Arc::new(source),
            vec![CONTRACT],
            LogProcessor::new(PingEnricher, None),
        );
        let events = fetcher
            .fetch(Some(DisconnectedRange::from_block(11)), false)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn dater_finds_first_block_at_or_after() {
        let source = linear_chain(50);
        assert_eq!(block_at_or_after(&source, 3).await.unwrap(), Some(3));
        assert_eq!(block_at_or_after(&source, 0).await.unwrap(), Some(0));
        assert_eq!(block_at_or_after(&source, 50).await.unwrap(), Some(50));
        assert_eq!(block_at_or_after(&source, 51).await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscriber_forwards_until_unsubscribed() {
        let mut source = MockLogSource::new();
        source.expect_subscribe_logs().returning(|_| {
            Ok(stream::iter(vec![
                log(CONTRACT, 1, &Ping { value: U256::from(1) }),
                log(CONTRACT, 2, &Ping { value: U256::from(2) }),
            ])
            .boxed())
        });
        let mut subscriber = EvmSubscriber::new(Arc::new(source), vec![CONTRACT]);
        let (tx, mut rx) = mpsc::channel(10);

        subscriber.subscribe(tx).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().block_number, Some(1));
        assert_eq!(rx.recv().await.unwrap().block_number, Some(2));
        subscriber.unsubscribe();
    }

    #[tokio::test(start_paused = true)]
    async fn adding_a_token_retries_without_disturbing_others() {
        let dai = TokenConfig {
            name: "dai".into(),
            address: address!("00000000000000000000000000000000000000d0"),
        };
        let usdc = TokenConfig {
            name: "usdc".into(),
            address: address!("00000000000000000000000000000000000000d1"),
        };

        let attempts = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter = attempts.clone();
        let mut source = MockLogSource::new();
        source.expect_subscribe_logs().returning(move |filter| {
            let is_usdc = serde_json::to_string(&filter)
                .unwrap()
                .contains("00000000000000000000000000000000000000d1");
            if is_usdc && counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) < 2 {
                return Err(ChainEventsError::Rpc("busy".into()));
            }
            Ok(stream::pending().boxed())
        });

        let mut subscriber =
            TokenSubscriber::new(Arc::new(source), vec![dai.clone()], Duration::from_secs(1));
        let handle = subscriber.clone();
        let (tx, _rx) = mpsc::channel(10);
        subscriber.subscribe(tx).await.unwrap();
        assert_eq!(handle.tracked(), vec![dai.address]);

        handle.add_token(usdc.clone()).await.unwrap();
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 3);
        let mut tracked = handle.tracked();
        tracked.sort();
        assert_eq!(tracked, vec![dai.address, usdc.address]);

        assert!(handle.remove_token(&usdc.address));
        assert!(!handle.remove_token(&usdc.address));
        subscriber.unsubscribe();
        assert!(handle.tracked().is_empty());
    }
}
