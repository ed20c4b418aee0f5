use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, error, trace};

use super::api::SubstrateApi;
use super::block::SubstrateBlock;
use super::enricher::SubstrateEnricher;
use super::parse::{parse_extrinsic, parse_type};
use super::versions::RuntimePaths;
use crate::events::CWEvent;
use crate::pipeline::Processor;

/// Expands a block into events: runtime events first, then successful calls, in block order.
pub struct SubstrateProcessor {
    api: Arc<dyn SubstrateApi>,
    enricher: SubstrateEnricher,
    chain: Option<String>,
    paths: Mutex<HashMap<u32, Arc<RuntimePaths>>>,
}

impl SubstrateProcessor {
    pub fn new(api: Arc<dyn SubstrateApi>, enricher: SubstrateEnricher, chain: Option<String>) -> Self {
        Self {
            api,
            enricher,
            chain,
            paths: Mutex::new(HashMap::new()),
        }
    }

    /// Paths for the block's runtime, resolved once per spec version.
    fn paths(&self, block: &SubstrateBlock) -> Arc<RuntimePaths> {
        let version = block.spec.version;
        if let Some(paths) = self.paths.lock().ok().and_then(|p| p.get(&version).cloned()) {
            return paths;
        }
        let api = self.api.as_ref();
        let paths = Arc::new(RuntimePaths::resolve(
            &block.spec,
            |p| api.has_pallet(p),
            |p, e| api.has_storage(p, e),
        ));
        if let Ok(mut cache) = self.paths.lock() {
            cache.insert(version, paths.clone());
        }
        paths
    }

    fn label(&self, event: CWEvent) -> CWEvent {
        match &self.chain {
            Some(chain) => event.with_chain(chain),
            None => event,
        }
    }

    pub async fn process_block(&self, block: &SubstrateBlock) -> Vec<CWEvent> {
        let paths = self.paths(block);
        let number = block.number;
        let mut events = Vec::new();

        for raw in &block.events {
            let Some(kind) = parse_type(&paths, &raw.section, &raw.method) else {
                trace!(block = number, section = %raw.section, method = %raw.method, "ignored event");
                continue;
            };
            match self.enricher.enrich_event(block, &paths, raw, kind).await {
                Ok(Some(event)) => events.push(self.label(event)),
                Ok(None) => debug!(block = number, kind = ?kind, "event suppressed"),
                Err(e) => error!(
                    block = number,
                    section = %raw.section,
                    method = %raw.method,
                    kind = ?kind,
                    "failed to enrich event: {e}"
                ),
            }
        }

        for raw in &block.extrinsics {
            let Some(kind) = parse_extrinsic(&paths, &raw.section, &raw.method) else {
                continue;
            };
            if !block.succeeded(raw.index) {
                debug!(block = number, index = raw.index, "skipping failed call");
                continue;
            }
            match self.enricher.enrich_extrinsic(block, &paths, raw, kind).await {
                Ok(Some(event)) => events.push(self.label(event)),
                Ok(None) => debug!(block = number, kind = ?kind, "call suppressed"),
                Err(e) => error!(
                    block = number,
                    section = %raw.section,
                    method = %raw.method,
                    kind = ?kind,
                    "failed to enrich call: {e}"
                ),
            }
        }
        events
    }
}

#[async_trait]
impl Processor for SubstrateProcessor {
    type Raw = SubstrateBlock;

    async fn process(&self, block: SubstrateBlock) -> Vec<CWEvent> {
        self.process_block(&block).await
    }
}
