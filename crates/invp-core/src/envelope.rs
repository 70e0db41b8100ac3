//! Typed message envelopes with HMAC signing.
//!
//! Pipeline stages are called directly through their traits; envelopes are
//! the audit record of each hop (who asked whom for what, and when) and can
//! be signed so a receipt can be verified later.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::EnvelopeError;

type HmacSha256 = Hmac<Sha256>;

/// A request or response passed between pipeline participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<B> {
    /// Unique message id.
    pub id: String,

    /// Intent, e.g. `ocr.extract` or `ocr.extract.response`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Sender id.
    pub from: String,

    /// Recipient id.
    pub to: String,

    /// Creation time (UTC, whole seconds).
    pub timestamp: DateTime<Utc>,

    /// Payload.
    pub body: B,

    /// Free-form metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl<B> Envelope<B> {
    /// Create an envelope with a fresh id.
    pub fn new(kind: impl Into<String>, from: impl Into<String>, to: impl Into<String>, body: B) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.into(),
            from: from.into(),
            to: to.into(),
            timestamp: Utc::now().trunc_subsecs(0),
            body,
            metadata: BTreeMap::new(),
        }
    }

    /// Use a caller-supplied id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Build the response to this envelope, addressed back to its sender.
    pub fn reply<R>(&self, from: impl Into<String>, body: R) -> Envelope<R> {
        Envelope {
            id: format!("resp-{}", self.id),
            kind: format!("{}.response", self.kind),
            from: from.into(),
            to: self.from.clone(),
            timestamp: Utc::now().trunc_subsecs(0),
            body,
            metadata: BTreeMap::new(),
        }
    }

    /// Replace the body, keeping the routing fields.
    pub fn map_body<R>(self, f: impl FnOnce(B) -> R) -> Envelope<R> {
        Envelope {
            id: self.id,
            kind: self.kind,
            from: self.from,
            to: self.to,
            timestamp: self.timestamp,
            body: f(self.body),
            metadata: self.metadata,
        }
    }
}

impl<B: Serialize> Envelope<B> {
    /// Deterministic JSON encoding: sorted keys, compact separators.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_vec(&canonicalize(&value))?)
    }

    /// Hex encoded HMAC-SHA256 of the canonical encoding.
    pub fn sign(&self, secret: &str) -> Result<String, EnvelopeError> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| EnvelopeError::InvalidKey)?;
        mac.update(&self.canonical_bytes()?);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check a signature produced by [`Envelope::sign`] in constant time.
    pub fn verify(&self, signature: &str, secret: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        match self.canonical_bytes() {
            Ok(bytes) => {
                mac.update(&bytes);
                mac.verify_slice(&expected).is_ok()
            }
            Err(_) => false,
        }
    }
}

/// Rebuild a value with object keys inserted in sorted order, so the output
/// does not depend on the map implementation serde_json was built with.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request() -> Envelope<Value> {
        Envelope::new("parser.parse_text", "api-gateway", "parser", json!({"invoice_text": "INV-1"}))
            .with_id("msg-1")
    }

    #[test]
    fn test_new_envelope() {
        let env = Envelope::new("ocr.extract", "a", "b", ());
        assert_eq!(env.id.len(), 36);
        assert_eq!(env.timestamp.timestamp_subsec_nanos(), 0);
        assert!(env.metadata.is_empty());
    }

    #[test]
    fn test_reply_addresses_sender() {
        let req = request();
        let resp = req.reply("parser", json!({"ok": true}));

        assert_eq!(resp.id, "resp-msg-1");
        assert_eq!(resp.kind, "parser.parse_text.response");
        assert_eq!(resp.from, "parser");
        assert_eq!(resp.to, "api-gateway");
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(request()).unwrap();
        assert_eq!(value["type"], "parser.parse_text");
        assert_eq!(value["from"], "api-gateway");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_canonical_bytes_sorted() {
        let env = Envelope::new("k", "a", "b", json!({"zeta": 1, "alpha": {"y": 2, "x": 1}})).with_id("1");
        let text = String::from_utf8(env.canonical_bytes().unwrap()).unwrap();

        assert!(text.starts_with(r#"{"body":{"alpha":{"x":1,"y":2},"zeta":1},"from":"a""#));
        assert!(!text.contains(": "));
    }

    #[test]
    fn test_sign_and_verify() {
        let env = request();
        let sig = env.sign("secret").unwrap();

        assert_eq!(sig.len(), 64);
        assert!(env.verify(&sig, "secret"));
        assert!(!env.verify(&sig, "other"));
        assert!(!env.verify("not-hex", "secret"));
    }

    #[test]
    fn test_metadata_is_serialized_and_signed() {
        let env = request().with_metadata("stage", json!("parser"));
        assert_eq!(serde_json::to_value(&env).unwrap()["metadata"], json!({"stage": "parser"}));

        let sig = env.sign("secret").unwrap();
        assert!(!request().verify(&sig, "secret"));
        assert!(env.verify(&sig, "secret"));
    }

    #[test]
    fn test_tampered_envelope_fails_verification() {
        let env = request();
        let sig = env.sign("secret").unwrap();

        let tampered = env.map_body(|_| json!({"invoice_text": "INV-2"}));
        assert!(!tampered.verify(&sig, "secret"));
    }
}
