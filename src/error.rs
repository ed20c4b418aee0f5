use thiserror::Error;

use crate::events::SupportedNetwork;

#[derive(Debug, Error)]
pub enum ChainEventsError {
    #[error("could not connect to {url} after {attempts} attempts: {reason}")]
    ConnectionFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Substrate client error: {0}")]
    Substrate(#[from] subxt::Error),

    #[error("transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("ABI decode error: {0}")]
    Abi(#[from] alloy::sol_types::Error),

    #[error("{0}")]
    MissingData(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unknown event kind '{kind}' for network {network}")]
    UnknownKind {
        network: SupportedNetwork,
        kind: String,
    },

    #[error("handler error in '{handler}': {reason}")]
    Handler { handler: String, reason: String },

    #[error("listener for {chain} is {state}, expected {expected}")]
    InvalidState {
        chain: String,
        state: String,
        expected: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl ChainEventsError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingData(what.into())
    }

    pub fn decode(what: impl Into<String>) -> Self {
        Self::Decode(what.into())
    }
}

impl From<config::ConfigError> for ChainEventsError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T, E = ChainEventsError> = std::result::Result<T, E>;
