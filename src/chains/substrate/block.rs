//! Raw Substrate blocks as the pipeline sees them, plus accessors for the JSON shape
//! storage values and event fields are decoded into.
//!
//! Decoded values follow a few conventions: accounts are SS58 strings, byte arrays and
//! hashes are `0x` hex strings, `Option::None` is `null`, `Some(x)` is `x`, numbers that
//! fit in a `u64` are JSON numbers and larger ones decimal strings. Unit enum variants are
//! their variant name, other variants `{ "Name": fields }`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ChainEventsError, Result};
use crate::pipeline::BlockNumbered;

pub type BlockHash = subxt::utils::H256;

/// Runtime identity of the block's chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RuntimeSpec {
    pub name: String,
    pub version: u32,
}

impl RuntimeSpec {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub section: String,
    pub method: String,
    /// Positional event fields.
    pub data: Vec<JsonValue>,
    /// Index of the extrinsic that emitted the event, if any.
    pub extrinsic: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawExtrinsic {
    pub index: u32,
    pub section: String,
    pub method: String,
    pub signer: Option<String>,
    /// Positional call arguments.
    pub args: Vec<JsonValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubstrateBlock {
    pub number: u64,
    pub hash: BlockHash,
    pub spec: RuntimeSpec,
    pub events: Vec<RawEvent>,
    pub extrinsics: Vec<RawExtrinsic>,
}

impl SubstrateBlock {
    /// Whether the extrinsic at `index` has a `System.ExtrinsicSuccess` event in this block.
    pub fn succeeded(&self, index: u32) -> bool {
        self.events.iter().any(|e| {
            e.extrinsic == Some(index) && e.section == "System" && e.method == "ExtrinsicSuccess"
        })
    }
}

impl BlockNumbered for SubstrateBlock {
    fn block_number(&self) -> Option<u64> {
        Some(self.number)
    }
}

/// Strips single-element wrappers left over from tuple structs.
pub fn peel(value: &JsonValue) -> &JsonValue {
    match value {
        JsonValue::Array(items) if items.len() == 1 => peel(&items[0]),
        other => other,
    }
}

pub fn field<'a>(data: &'a [JsonValue], index: usize, name: &str) -> Result<&'a JsonValue> {
    data.get(index)
        .ok_or_else(|| ChainEventsError::decode(format!("missing field {index} ({name})")))
}

pub fn get<'a>(value: &'a JsonValue, key: &str) -> Result<&'a JsonValue> {
    peel(value)
        .get(key)
        .ok_or_else(|| ChainEventsError::decode(format!("missing key '{key}'")))
}

pub fn is_none(value: &JsonValue) -> bool {
    peel(value).is_null()
}

/// Any scalar as text: strings as-is, numbers and bools printed.
pub fn text(value: &JsonValue) -> Result<String> {
    match peel(value) {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        other => Err(ChainEventsError::decode(format!("expected scalar, got {other}"))),
    }
}

/// Balances and other amounts, as decimal strings.
pub fn amount(value: &JsonValue) -> Result<String> {
    let s = text(value)?;
    if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
        Ok(s)
    } else {
        Err(ChainEventsError::decode(format!("expected amount, got '{s}'")))
    }
}

pub fn amount_u128(value: &JsonValue) -> Result<u128> {
    amount(value)?
        .parse()
        .map_err(|_| ChainEventsError::decode("amount does not fit in u128"))
}

pub fn int(value: &JsonValue) -> Result<u64> {
    match peel(value) {
        JsonValue::Number(n) => n
            .as_u64()
            .ok_or_else(|| ChainEventsError::decode(format!("expected unsigned integer, got {n}"))),
        JsonValue::String(s) => s
            .parse()
            .map_err(|_| ChainEventsError::decode(format!("expected integer, got '{s}'"))),
        other => Err(ChainEventsError::decode(format!("expected integer, got {other}"))),
    }
}

pub fn boolean(value: &JsonValue) -> Result<bool> {
    peel(value)
        .as_bool()
        .ok_or_else(|| ChainEventsError::decode(format!("expected bool, got {value}")))
}

pub fn list(value: &JsonValue) -> Result<&[JsonValue]> {
    match value {
        JsonValue::Array(items) => Ok(items),
        other => Err(ChainEventsError::decode(format!("expected list, got {other}"))),
    }
}

pub fn texts(value: &JsonValue) -> Result<Vec<String>> {
    list(value)?.iter().map(text).collect()
}

/// Hex-encoded bytes as UTF-8; plain strings pass through.
pub fn utf8(value: &JsonValue) -> Result<String> {
    let s = text(value)?;
    match s.strip_prefix("0x") {
        Some(raw) => {
            let bytes = hex::decode(raw)
                .map_err(|e| ChainEventsError::decode(format!("invalid hex: {e}")))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => Ok(s),
    }
}

/// `(name, fields)` of an enum value. Unit variants have `null` fields.
pub fn variant(value: &JsonValue) -> Result<(&str, &JsonValue)> {
    match peel(value) {
        JsonValue::String(name) => Ok((name.as_str(), &JsonValue::Null)),
        JsonValue::Object(map) if map.len() == 1 => {
            let (name, fields) = map
                .iter()
                .next()
                .ok_or_else(|| ChainEventsError::decode("empty variant"))?;
            Ok((name.as_str(), fields))
        }
        other => Err(ChainEventsError::decode(format!("expected enum variant, got {other}"))),
    }
}

/// The result of a dispatch: `{ "Ok": .. }` or `{ "Err": .. }`, or a bare bool on old runtimes.
pub fn dispatch_ok(value: &JsonValue) -> Result<bool> {
    if let JsonValue::Bool(ok) = peel(value) {
        return Ok(*ok);
    }
    let (name, _) = variant(value)?;
    Ok(name == "Ok")
}

/// `{ section, method, args }` from a decoded call `{ "Pallet": { "call": { ..args } } }`.
pub fn call_info(value: &JsonValue) -> Result<super::CallInfo> {
    let (section, inner) = variant(value)?;
    let (method, args) = variant(inner)?;
    let args = match args {
        JsonValue::Object(fields) => fields.values().map(arg_text).collect(),
        JsonValue::Array(items) => items.iter().map(arg_text).collect(),
        JsonValue::Null => vec![],
        other => vec![arg_text(other)],
    };
    Ok(super::CallInfo {
        section: section.to_string(),
        method: method.to_string(),
        args,
    })
}

fn arg_text(value: &JsonValue) -> String {
    text(value).unwrap_or_else(|_| value.to_string())
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_tolerate_newtype_wrappers() {
        assert_eq!(int(&json!([[7]])).unwrap(), 7);
        assert_eq!(int(&json!("12")).unwrap(), 12);
        assert_eq!(amount(&json!("340282366920938463463374607431768211455")).unwrap().len(), 39);
        assert!(amount(&json!("-3")).is_err());
        assert_eq!(text(&json!(["0xabc"])).unwrap(), "0xabc");
    }

    #[test]
    fn variants_and_dispatch_results() {
        assert_eq!(variant(&json!("Reasonable")).unwrap().0, "Reasonable");
        let fee_paid = json!({ "FeePaid": 10 });
        let (name, fields) = variant(&fee_paid).unwrap();
        assert_eq!((name, fields), ("FeePaid", &json!(10)));
        assert!(dispatch_ok(&json!({ "Ok": null })).unwrap());
        assert!(!dispatch_ok(&json!({ "Err": { "Module": 1 } })).unwrap());
        assert!(dispatch_ok(&json!(true)).unwrap());
    }

    #[test]
    fn calls_flatten_to_section_method_args() {
        let call = call_info(&json!({ "Balances": { "transfer": { "dest": "alice", "value": 5 } } }))
            .unwrap();
        assert_eq!(call.section, "Balances");
        assert_eq!(call.method, "transfer");
        assert_eq!(call.args, vec!["alice".to_string(), "5".to_string()]);
    }

    #[test]
    fn hex_text_decodes_to_utf8() {
        assert_eq!(utf8(&json!("0x68656c6c6f")).unwrap(), "hello");
        assert_eq!(utf8(&json!("plain")).unwrap(), "plain");
    }

    #[test]
    fn extrinsic_success_is_per_index() {
        let mut ok = test_support::event("System", "ExtrinsicSuccess", vec![]);
        ok.extrinsic = Some(1);
        let block = test_support::block(1, vec![ok], vec![]);
        assert!(block.succeeded(1));
        assert!(!block.succeeded(0));
    }
}
