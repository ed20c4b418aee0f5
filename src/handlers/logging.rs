use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::EventHandler;
use crate::error::Result;
use crate::events::CWEvent;

/// Logs every event and passes the previous result through untouched.
///
/// Events from chains in `verbose_chains` are logged in full at info level, the rest
/// as a one-line summary at debug level.
#[derive(Debug, Default)]
pub struct LoggingHandler {
    verbose_chains: HashSet<String>,
}

impl LoggingHandler {
    pub fn new(verbose_chains: impl IntoIterator<Item = String>) -> Self {
        Self {
            verbose_chains: verbose_chains.into_iter().collect(),
        }
    }

    pub fn is_verbose(&self, event: &CWEvent) -> bool {
        event
            .chain
            .as_ref()
            .is_some_and(|chain| self.verbose_chains.contains(chain))
    }
}

#[async_trait]
impl EventHandler for LoggingHandler {
    fn name(&self) -> &str {
        "logging"
    }

    async fn handle(&self, event: &CWEvent, previous: Option<Value>) -> Result<Option<Value>> {
        let chain = event.chain.as_deref().unwrap_or("-");
        if self.is_verbose(event) {
            info!(
                chain,
                block = event.block_number,
                "Received event: {}",
                serde_json::to_string_pretty(event)?
            );
        } else {
            debug!(chain, block = event.block_number, kind = %event.kind(), "Received event");
        }
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::erc20::EventData;
    use serde_json::json;

    fn transfer() -> CWEvent {
        CWEvent::new(
            7,
            EventData::Transfer {
                from: "0x1".into(),
                to: "0x2".into(),
                value: "5".into(),
                contract_address: "0xtoken".into(),
            },
        )
    }

    #[test]
    fn verbosity_is_chosen_per_chain() {
        let handler = LoggingHandler::new(["edgeware".to_string()]);
        assert!(handler.is_verbose(&transfer().with_chain("edgeware")));
        assert!(!handler.is_verbose(&transfer().with_chain("kusama")));
        assert!(!handler.is_verbose(&transfer()));
    }

    #[tokio::test]
    async fn passes_the_previous_result_through() {
        let handler = LoggingHandler::new(["edgeware".to_string()]);
        let previous = Some(json!({"id": 1}));
        let event = transfer().with_chain("edgeware");
        assert_eq!(handler.handle(&event, previous.clone()).await.unwrap(), previous);
        assert_eq!(handler.handle(&transfer(), None).await.unwrap(), None);
    }
}
