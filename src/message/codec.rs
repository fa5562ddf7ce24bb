//! Codec: pure, possibly-async encode/decode between values and wire bytes
//! or text (§4.1).

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// The operation a [`CodecError`] occurred during.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOp {
    Encode,
    Decode,
}

impl std::fmt::Display for CodecOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecOp::Encode => write!(f, "encode"),
            CodecOp::Decode => write!(f, "decode"),
        }
    }
}

/// `CodecError{codecName, op, cause, data?}` (§4.1, §7).
#[derive(Debug, Error)]
#[error("codec '{codec_name}' failed to {op}: {cause}")]
pub struct CodecError {
    pub codec_name: String,
    pub op: CodecOp,
    pub cause: String,
    pub data: Option<Value>,
}

impl CodecError {
    pub fn encode(codec_name: impl Into<String>, cause: impl ToString, data: Value) -> Self {
        Self {
            codec_name: codec_name.into(),
            op: CodecOp::Encode,
            cause: cause.to_string(),
            data: Some(data),
        }
    }

    pub fn decode(codec_name: impl Into<String>, cause: impl ToString) -> Self {
        Self {
            codec_name: codec_name.into(),
            op: CodecOp::Decode,
            cause: cause.to_string(),
            data: None,
        }
    }
}

/// The wire shape a codec produces: opaque text or opaque bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Text,
    Binary,
}

/// `Wire` is whichever of text or bytes the codec's `wire_format` declares.
/// Kept as one enum (rather than an associated type) so a component can hold
/// `Arc<dyn Codec>` without becoming generic over it.
#[derive(Debug, Clone)]
pub enum Wire {
    Text(String),
    Binary(Vec<u8>),
}

/// `{name, wireFormat, encode(data)->wire, decode(wire)->data}` (§4.1).
///
/// A codec MUST be symmetric: `decode(encode(x))` semantically equals `x`
/// for any value the codec claims to support — this is the "Codec
/// round-trip" testable property in §8.
#[async_trait]
pub trait Codec: Send + Sync {
    fn name(&self) -> &str;
    fn wire_format(&self) -> WireFormat;
    async fn encode(&self, data: &Value) -> Result<Wire, CodecError>;
    async fn decode(&self, wire: &Wire) -> Result<Value, CodecError>;
}

/// The engine's default codec: JSON over a text wire.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

#[async_trait]
impl Codec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    fn wire_format(&self) -> WireFormat {
        WireFormat::Text
    }

    async fn encode(&self, data: &Value) -> Result<Wire, CodecError> {
        serde_json::to_string(data)
            .map(Wire::Text)
            .map_err(|e| CodecError::encode(self.name(), e, data.clone()))
    }

    async fn decode(&self, wire: &Wire) -> Result<Value, CodecError> {
        let text = match wire {
            Wire::Text(text) => text.clone(),
            Wire::Binary(bytes) => String::from_utf8(bytes.clone())
                .map_err(|e| CodecError::decode(self.name(), e))?,
        };
        serde_json::from_str(&text).map_err(|e| CodecError::decode(self.name(), e))
    }
}
