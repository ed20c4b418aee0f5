//! [`SubstrateApi`] over a subxt client. Blocks, events and storage are decoded with the
//! runtime metadata and converted to the JSON shape described in [`super::block`].

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use scale_info::{PortableRegistry, TypeDef, TypeDefPrimitive};
use scale_value::{Composite, Primitive, Value, ValueDef};
use serde_json::{Map, Value as JsonValue};
use subxt::backend::legacy::LegacyRpcMethods;
use subxt::backend::rpc::RpcClient;
use subxt::backend::BackendExt;
use subxt::blocks::Block;
use subxt::client::RuntimeVersion;
use subxt::events::Phase;
use subxt::metadata::types::StorageEntryType;
use subxt::utils::AccountId32;
use subxt::{Metadata, OnlineClient, SubstrateConfig};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use super::api::{KeyArg, SubstrateApi};
use super::block::{BlockHash, RawEvent, RawExtrinsic, RuntimeSpec, SubstrateBlock};
use crate::error::{ChainEventsError, Result};
use crate::pipeline::with_retries;

type Client = OnlineClient<SubstrateConfig>;

/// What the metadata says about a type, as far as JSON conversion cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeHint {
    /// Last path segment, for named types.
    pub name: Option<String>,
    /// Sequences and arrays of `u8`.
    pub bytes: bool,
}

pub fn type_hint(types: &PortableRegistry, id: u32) -> TypeHint {
    let Some(ty) = types.resolve(id) else {
        return TypeHint::default();
    };
    let is_u8 = |id: u32| {
        matches!(
            types.resolve(id).map(|t| &t.type_def),
            Some(TypeDef::Primitive(TypeDefPrimitive::U8))
        )
    };
    let bytes = match &ty.type_def {
        TypeDef::Sequence(seq) => is_u8(seq.type_param.id),
        TypeDef::Array(arr) => is_u8(arr.type_param.id),
        _ => false,
    };
    TypeHint {
        name: ty.path.segments.last().cloned(),
        bytes,
    }
}

/// Converts a decoded value. `hint` describes the type behind each value's context.
pub fn to_json<T>(value: &Value<T>, hint: &impl Fn(&T) -> TypeHint) -> JsonValue {
    match &value.value {
        ValueDef::Primitive(p) => primitive_json(p),
        ValueDef::BitSequence(bits) => JsonValue::Array(bits.iter().map(JsonValue::Bool).collect()),
        ValueDef::Variant(variant) => {
            let values = variant.values.values().collect::<Vec<_>>();
            match (variant.name.as_str(), values.as_slice()) {
                ("None", []) => JsonValue::Null,
                ("Some", [inner]) => to_json(inner, hint),
                (name, []) => JsonValue::String(name.to_string()),
                (name, _) => {
                    let mut map = Map::new();
                    map.insert(name.to_string(), fields_json(&variant.values, hint));
                    JsonValue::Object(map)
                }
            }
        }
        ValueDef::Composite(composite) => {
            let h = hint(&value.context);
            if let Some(bytes) = flat_bytes(value) {
                if h.name.as_deref() == Some("AccountId32") && bytes.len() == 32 {
                    let mut raw = [0u8; 32];
                    raw.copy_from_slice(&bytes);
                    return JsonValue::String(AccountId32(raw).to_string());
                }
                if h.bytes || (h.name.is_some() && bytes.len() > 1) {
                    return JsonValue::String(format!("0x{}", hex::encode(bytes)));
                }
            } else if h.bytes && composite.is_empty() {
                return JsonValue::String("0x".into());
            }
            match composite {
                Composite::Unnamed(items) if items.len() == 1 && h.name.is_some() => {
                    to_json(&items[0], hint)
                }
                other => fields_json(other, hint),
            }
        }
    }
}

fn fields_json<T>(composite: &Composite<T>, hint: &impl Fn(&T) -> TypeHint) -> JsonValue {
    match composite {
        Composite::Named(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), to_json(v, hint)))
                .collect(),
        ),
        Composite::Unnamed(items) if items.len() == 1 => to_json(&items[0], hint),
        Composite::Unnamed(items) => {
            JsonValue::Array(items.iter().map(|v| to_json(v, hint)).collect())
        }
    }
}

fn primitive_json(p: &Primitive) -> JsonValue {
    match p {
        Primitive::Bool(b) => JsonValue::Bool(*b),
        Primitive::Char(c) => JsonValue::String(c.to_string()),
        Primitive::String(s) => JsonValue::String(s.clone()),
        Primitive::U128(n) => match u64::try_from(*n) {
            Ok(n) => JsonValue::from(n),
            Err(_) => JsonValue::String(n.to_string()),
        },
        Primitive::I128(n) => match i64::try_from(*n) {
            Ok(n) => JsonValue::from(n),
            Err(_) => JsonValue::String(n.to_string()),
        },
        Primitive::U256(raw) => JsonValue::String(U256::from_le_bytes(*raw).to_string()),
        Primitive::I256(raw) => JsonValue::String(format!("0x{}", hex::encode(raw))),
    }
}

/// The bytes of a (possibly nested) unnamed composite made only of `u8`-sized integers.
fn flat_bytes<T>(value: &Value<T>) -> Option<Vec<u8>> {
    fn collect<T>(value: &Value<T>, out: &mut Vec<u8>) -> bool {
        match &value.value {
            ValueDef::Primitive(Primitive::U128(n)) => match u8::try_from(*n) {
                Ok(b) => {
                    out.push(b);
                    true
                }
                Err(_) => false,
            },
            ValueDef::Composite(Composite::Unnamed(items)) => {
                items.iter().all(|item| collect(item, out))
            }
            _ => false,
        }
    }
    let mut out = Vec::new();
    (collect(value, &mut out) && !out.is_empty()).then_some(out)
}

fn composite_fields(composite: Composite<u32>) -> Vec<Value<u32>> {
    match composite {
        Composite::Named(fields) => fields.into_iter().map(|(_, v)| v).collect(),
        Composite::Unnamed(values) => values,
    }
}

/// SS58 of a `MultiAddress::Id` (33 bytes, leading zero) or plain 32-byte address.
fn signer_address(bytes: &[u8]) -> Option<String> {
    let raw = match bytes {
        [0, rest @ ..] if rest.len() == 32 => rest,
        raw if raw.len() == 32 => raw,
        _ => return None,
    };
    let mut id = [0u8; 32];
    id.copy_from_slice(raw);
    Some(AccountId32(id).to_string())
}

fn spec_name(other: &HashMap<String, JsonValue>) -> String {
    other
        .get("specName")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string()
}

impl KeyArg {
    fn into_value(self) -> Result<Value> {
        Ok(match self {
            KeyArg::Int(n) => Value::u128(n),
            KeyArg::Bytes(bytes) => Value::from_bytes(bytes),
            KeyArg::Account(address) => {
                let account = AccountId32::from_str(&address).map_err(|e| {
                    ChainEventsError::decode(format!("invalid account {address}: {e}"))
                })?;
                Value::from_bytes(account.0)
            }
        })
    }
}

fn key_values(keys: Vec<KeyArg>) -> Result<Vec<Value>> {
    keys.into_iter().map(KeyArg::into_value).collect()
}

struct Inner {
    rpc_client: RpcClient,
    client: Client,
    rpc: LegacyRpcMethods<SubstrateConfig>,
    spec_name: String,
    /// Clients decoding with the metadata of earlier runtimes, by spec version.
    historic: Mutex<HashMap<u32, Client>>,
    updates: JoinHandle<()>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.updates.abort();
    }
}

#[derive(Clone)]
pub struct SubstrateClient {
    inner: Arc<Inner>,
}

/// Opens the node connection, retrying a bounded number of times.
pub async fn connect(url: &str, attempts: u32, interval: Duration) -> Result<SubstrateClient> {
    let client = with_retries(url, attempts, interval, || SubstrateClient::open(url)).await?;
    let spec = client.runtime();
    info!(spec = %spec.name, version = spec.version, "connected to substrate node");
    Ok(client)
}

impl SubstrateClient {
    async fn open(url: &str) -> Result<Self> {
        let rpc_client = RpcClient::from_insecure_url(url)
            .await
            .map_err(subxt::Error::from)?;
        let client = Client::from_rpc_client(rpc_client.clone()).await?;
        let rpc = LegacyRpcMethods::<SubstrateConfig>::new(rpc_client.clone());
        let version = rpc
            .state_get_runtime_version(None)
            .await
            .map_err(subxt::Error::from)?;

        let updater = client.updater();
        let updates = tokio::spawn(
            async move {
                if let Err(e) = updater.perform_runtime_updates().await {
                    warn!("runtime update watcher stopped: {e}");
                }
            }
            .in_current_span(),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                rpc_client,
                client,
                rpc,
                spec_name: spec_name(&version.other),
                historic: Mutex::new(HashMap::new()),
                updates,
            }),
        })
    }

    fn metadata(&self) -> Metadata {
        self.inner.client.metadata()
    }

    fn current_version(&self) -> u32 {
        self.inner.client.runtime_version().spec_version
    }

    /// A client whose metadata matches the runtime at `hash`.
    async fn client_at(&self, hash: BlockHash) -> Result<(Client, RuntimeSpec)> {
        let version = self
            .inner
            .rpc
            .state_get_runtime_version(Some(hash))
            .await
            .map_err(subxt::Error::from)?;
        let spec = RuntimeSpec::new(self.inner.spec_name.clone(), version.spec_version);
        if version.spec_version == self.current_version() {
            return Ok((self.inner.client.clone(), spec));
        }

        let cached = self
            .inner
            .historic
            .lock()
            .ok()
            .and_then(|h| h.get(&version.spec_version).cloned());
        if let Some(client) = cached {
            return Ok((client, spec));
        }

        debug!(version = version.spec_version, "loading metadata for historic runtime");
        let metadata = self.inner.client.backend().legacy_metadata(hash).await?;
        let client = Client::from_rpc_client_with(
            self.inner.client.genesis_hash(),
            RuntimeVersion {
                spec_version: version.spec_version,
                transaction_version: version.transaction_version,
            },
            metadata,
            self.inner.rpc_client.clone(),
        )?;
        if let Ok(mut historic) = self.inner.historic.lock() {
            historic.insert(version.spec_version, client.clone());
        }
        Ok((client, spec))
    }

    async fn decode(
        &self,
        block: Block<SubstrateConfig, Client>,
        metadata: Metadata,
        spec: RuntimeSpec,
    ) -> Result<SubstrateBlock> {
        let types = metadata.types();
        let hint = |id: &u32| type_hint(types, *id);

        let mut events = Vec::new();
        for event in block.events().await?.iter() {
            let event = event?;
            let data = composite_fields(event.field_values()?)
                .iter()
                .map(|v| to_json(v, &hint))
                .collect();
            events.push(RawEvent {
                section: event.pallet_name().to_string(),
                method: event.variant_name().to_string(),
                data,
                extrinsic: match event.phase() {
                    Phase::ApplyExtrinsic(index) => Some(index),
                    _ => None,
                },
            });
        }

        let mut extrinsics = Vec::new();
        for extrinsic in block.extrinsics().await?.iter() {
            let args = composite_fields(extrinsic.field_values()?)
                .iter()
                .map(|v| to_json(v, &hint))
                .collect();
            extrinsics.push(RawExtrinsic {
                index: extrinsic.index(),
                section: extrinsic.pallet_name()?.to_string(),
                method: extrinsic.variant_name()?.to_string(),
                signer: extrinsic.address_bytes().and_then(signer_address),
                args,
            });
        }

        Ok(SubstrateBlock {
            number: block.number().into(),
            hash: block.hash(),
            spec,
            events,
            extrinsics,
        })
    }

    async fn storage_at(&self, at: Option<BlockHash>) -> Result<subxt::storage::Storage<SubstrateConfig, Client>> {
        Ok(match at {
            Some(hash) => self.inner.client.storage().at(hash),
            None => self.inner.client.storage().at_latest().await?,
        })
    }

    /// Type ids of a storage map's keys, one per hasher.
    fn key_types(&self, pallet: &str, entry: &str) -> Vec<u32> {
        let metadata = self.metadata();
        let Some(entry) = metadata
            .pallet_by_name(pallet)
            .and_then(|p| p.storage())
            .and_then(|s| s.entry_by_name(entry))
        else {
            return vec![];
        };
        match entry.entry_type() {
            StorageEntryType::Map {
                hashers, key_ty, ..
            } if hashers.len() > 1 => match metadata.types().resolve(*key_ty).map(|t| &t.type_def) {
                Some(TypeDef::Tuple(tuple)) => tuple.fields.iter().map(|f| f.id).collect(),
                _ => vec![*key_ty],
            },
            StorageEntryType::Map { key_ty, .. } => vec![*key_ty],
            StorageEntryType::Plain(_) => vec![],
        }
    }
}

#[async_trait]
impl SubstrateApi for SubstrateClient {
    fn runtime(&self) -> RuntimeSpec {
        RuntimeSpec::new(self.inner.spec_name.clone(), self.current_version())
    }

    fn has_pallet(&self, pallet: &str) -> bool {
        self.metadata().pallet_by_name(pallet).is_some()
    }

    fn has_storage(&self, pallet: &str, entry: &str) -> bool {
        self.metadata()
            .pallet_by_name(pallet)
            .and_then(|p| p.storage())
            .and_then(|s| s.entry_by_name(entry))
            .is_some()
    }

    async fn head(&self) -> Result<u64> {
        let block = self.inner.client.blocks().at_latest().await?;
        Ok(block.number().into())
    }

    async fn block_hash(&self, number: u64) -> Result<Option<BlockHash>> {
        Ok(self
            .inner
            .rpc
            .chain_get_block_hash(Some(number.into()))
            .await
            .map_err(subxt::Error::from)?)
    }

    async fn block(&self, hash: BlockHash) -> Result<SubstrateBlock> {
        let (client, spec) = self.client_at(hash).await?;
        let block = client.blocks().at(hash).await?;
        self.decode(block, client.metadata(), spec).await
    }

    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, Result<SubstrateBlock>>> {
        let blocks = self.inner.client.blocks().subscribe_finalized().await?;
        let this = self.clone();
        let stream = blocks.then(move |block| {
            let this = this.clone();
            async move {
                let block = block?;
                let spec = this.runtime();
                this.decode(block, this.metadata(), spec).await
            }
        });
        Ok(stream.boxed())
    }

    async fn storage(
        &self,
        at: Option<BlockHash>,
        pallet: &str,
        entry: &str,
        keys: Vec<KeyArg>,
    ) -> Result<Option<JsonValue>> {
        let query = subxt::dynamic::storage(pallet, entry, key_values(keys)?);
        let Some(thunk) = self.storage_at(at).await?.fetch(&query).await? else {
            return Ok(None);
        };
        let value = thunk.to_value().map_err(subxt::Error::from)?;
        let metadata = self.metadata();
        let types = metadata.types();
        Ok(Some(to_json(&value, &|id: &u32| type_hint(types, *id))))
    }

    async fn storage_entries(
        &self,
        at: Option<BlockHash>,
        pallet: &str,
        entry: &str,
        prefix: Vec<KeyArg>,
    ) -> Result<Vec<(Vec<JsonValue>, JsonValue)>> {
        let key_types = self.key_types(pallet, entry);
        let query = subxt::dynamic::storage(pallet, entry, key_values(prefix)?);
        let mut pairs = self.storage_at(at).await?.iter(query).await?;

        let metadata = self.metadata();
        let types = metadata.types();
        let mut entries = Vec::new();
        while let Some(pair) = pairs.next().await {
            let pair = pair?;
            let keys = pair
                .keys
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    let hint = key_types
                        .get(i)
                        .map(|id| type_hint(types, *id))
                        .unwrap_or_default();
                    to_json(key, &|_: &()| hint.clone())
                })
                .collect();
            let value = pair.value.to_value().map_err(subxt::Error::from)?;
            entries.push((keys, to_json(&value, &|id: &u32| type_hint(types, *id))));
        }
        Ok(entries)
    }

    fn constant(&self, pallet: &str, name: &str) -> Result<JsonValue> {
        let query = subxt::dynamic::constant(pallet, name);
        let value = self.inner.client.constants().at(&query)?.to_value().map_err(subxt::Error::from)?;
        let metadata = self.metadata();
        let types = metadata.types();
        Ok(to_json(&value, &|id: &u32| type_hint(types, *id)))
    }

    fn decode_call(&self, bytes: &[u8]) -> Result<JsonValue> {
        let metadata = self.metadata();
        let types = metadata.types();
        let call_ty = metadata.outer_enums().call_enum_ty();
        let value = scale_value::scale::decode_as_type(&mut &bytes[..], call_ty, types)
            .map_err(|e| ChainEventsError::decode(format!("undecodable call: {e}")))?;
        Ok(to_json(&value, &|id: &u32| type_hint(types, *id)))
    }
}
