use std::sync::Arc;

use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use tracing::debug;

use super::contracts::{self, Approval, Erc20Api, Transfer};
use super::{parse, EventData, EventKind};
use crate::chains::evm::{fmt_address, LogEnricher};
use crate::chains::meets_transfer_threshold;
use crate::error::Result;
use crate::events::CWEvent;

#[derive(Clone)]
pub struct Erc20Enricher {
    api: Arc<dyn Erc20Api>,
    threshold_permill: Option<u64>,
}

impl Erc20Enricher {
    pub fn new(api: Arc<dyn Erc20Api>, threshold_permill: Option<u64>) -> Self {
        Self {
            api,
            threshold_permill,
        }
    }

    /// Transfers that are too small relative to the token's total supply yield `None`.
    pub async fn enrich(&self, block: u64, kind: EventKind, log: &Log) -> Result<Option<CWEvent>> {
        let token = log.address();
        let contract_address = fmt_address(&token);
        let event = match kind {
            EventKind::Transfer => {
                let e = Transfer::decode_log(&log.inner, true)?;
                if let Some(permill) = self.threshold_permill {
                    let total = self.api.total_supply(token).await?;
                    if !meets_transfer_threshold(e.value, total, permill) {
                        debug!(block, value = %e.value, "transfer below threshold, skipping");
                        return Ok(None);
                    }
                }
                let from = fmt_address(&e.from);
                CWEvent::new(
                    block,
                    EventData::Transfer {
                        from: from.clone(),
                        to: fmt_address(&e.to),
                        value: e.value.to_string(),
                        contract_address,
                    },
                )
                .exclude(vec![from])
            }
            EventKind::Approval => {
                let e = Approval::decode_log(&log.inner, true)?;
                let owner = fmt_address(&e.owner);
                CWEvent::new(
                    block,
                    EventData::Approval {
                        owner: owner.clone(),
                        spender: fmt_address(&e.spender),
                        value: e.value.to_string(),
                        contract_address,
                    },
                )
                .exclude(vec![owner])
            }
        };
        Ok(Some(event))
    }
}

#[async_trait]
impl LogEnricher for Erc20Enricher {
    type Kind = EventKind;

    fn event_name(&self, log: &Log) -> Option<&'static str> {
        contracts::event_name(log.topics().first()?)
    }

    fn parse_type(&self, name: &str) -> Option<EventKind> {
        parse::parse_type(name)
    }

    async fn enrich(&self, block: u64, kind: EventKind, log: &Log) -> Result<Option<CWEvent>> {
        Erc20Enricher::enrich(self, block, kind, log).await
    }
}
