//! What the Substrate pipeline needs from a node. Storage is addressed by metadata names
//! (`"Democracy"`, `"PublicProps"`) and comes back as JSON, see [`super::block`].

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::Value as JsonValue;

#[cfg(test)]
use mockall::automock;

use super::block::{BlockHash, RuntimeSpec, SubstrateBlock};
use crate::error::{ChainEventsError, Result};

/// A storage map key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyArg {
    Int(u128),
    /// Raw bytes, for hashes.
    Bytes(Vec<u8>),
    /// An SS58 account.
    Account(String),
}

impl KeyArg {
    /// A `0x` hex string as a byte key.
    pub fn hash(hex_str: &str) -> Result<Self> {
        let raw = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        hex::decode(raw)
            .map(KeyArg::Bytes)
            .map_err(|e| ChainEventsError::decode(format!("invalid hash {hex_str}: {e}")))
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubstrateApi: Send + Sync {
    /// Runtime of the chain's current head.
    fn runtime(&self) -> RuntimeSpec;

    fn has_pallet(&self, pallet: &str) -> bool;

    fn has_storage(&self, pallet: &str, entry: &str) -> bool;

    async fn head(&self) -> Result<u64>;

    /// `None` for blocks the node does not know about or has pruned.
    async fn block_hash(&self, number: u64) -> Result<Option<BlockHash>>;

    async fn block(&self, hash: BlockHash) -> Result<SubstrateBlock>;

    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, Result<SubstrateBlock>>>;

    /// A storage value, at `at` or at the head. `None` when the entry is empty.
    async fn storage(
        &self,
        at: Option<BlockHash>,
        pallet: &str,
        entry: &str,
        keys: Vec<KeyArg>,
    ) -> Result<Option<JsonValue>>;

    /// Every `(keys, value)` pair of a storage map, at `at` or at the head. `prefix` narrows
    /// the iteration to entries whose leading keys match.
    async fn storage_entries(
        &self,
        at: Option<BlockHash>,
        pallet: &str,
        entry: &str,
        prefix: Vec<KeyArg>,
    ) -> Result<Vec<(Vec<JsonValue>, JsonValue)>>;

    fn constant(&self, pallet: &str, name: &str) -> Result<JsonValue>;

    /// Decodes SCALE-encoded call bytes, e.g. a preimage, to `{ "Pallet": { "call": args } }`.
    fn decode_call(&self, bytes: &[u8]) -> Result<JsonValue>;
}
