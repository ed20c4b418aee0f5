use alloy::primitives::Address;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::events::SupportedNetwork;

fn default_retry_interval_ms() -> u64 {
    10_000
}

fn default_connect_attempts() -> u32 {
    3
}

fn default_max_range() -> u64 {
    500
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_contract_version() -> u8 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnricherConfig {
    /// Balance transfers below `permill / 1_000_000` of total issuance are not emitted.
    #[serde(default)]
    pub balance_transfer_threshold_permill: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_max_range")]
    pub max_range: u64,
    #[serde(default = "default_max_range")]
    pub batch_size: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_range: default_max_range(),
            batch_size: default_max_range(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchivalConfig {
    pub start_block: u64,
    #[serde(default)]
    pub end_block: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub address: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    pub chain: String,
    pub network: SupportedNetwork,
    pub url: String,
    /// Governance, DAO or project factory contract.
    #[serde(default)]
    pub address: Option<Address>,
    /// Governance token contracts (Aave).
    #[serde(default)]
    pub token_addresses: Vec<Address>,
    /// Tracked tokens (ERC20 / ERC721).
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    #[serde(default = "default_contract_version")]
    pub contract_version: u8,
    #[serde(default)]
    pub skip_catchup: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    #[serde(default)]
    pub enricher: EnricherConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub archival: Option<ArchivalConfig>,
}

impl ListenerConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandlersConfig {
    #[serde(default)]
    pub log_events: bool,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub telegram_bot_token: Option<String>,
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub listeners: Vec<ListenerConfig>,
    pub handlers: HandlersConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("CHAIN_EVENTS").separator("__"));

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_fill_optional_fields() {
        let raw = r#"
            [handlers]
            webhook_url = ""

            [[listeners]]
            chain = "edgeware"
            network = "substrate"
            url = "ws://localhost:9944"

            [listeners.enricher]
            balance_transfer_threshold_permill = 1000

            [[listeners]]
            chain = "dai"
            network = "erc20"
            url = "wss://mainnet.example"
            tokens = [{ name = "dai", address = "0x6b175474e89094c44da98b954eedeac495271d0f" }]
        "#;

        let cfg: AppConfig = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let substrate = &cfg.listeners[0];
        assert_eq!(substrate.network, SupportedNetwork::Substrate);
        assert_eq!(substrate.connect_attempts, 3);
        assert_eq!(substrate.retry_interval(), Duration::from_secs(10));
        assert_eq!(substrate.poller.max_range, 500);
        assert_eq!(
            substrate.enricher.balance_transfer_threshold_permill,
            Some(1000)
        );
        assert!(!substrate.skip_catchup);

        let erc20 = &cfg.listeners[1];
        assert_eq!(erc20.tokens.len(), 1);
        assert_eq!(erc20.tokens[0].name, "dai");
        assert_eq!(cfg.handlers.cooldown_secs, 60);
    }
}
