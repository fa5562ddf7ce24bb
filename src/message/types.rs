//! The uniform message envelope exchanged between the engine and transport
//! adapters (§3 DATA MODEL).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::TraceId;

/// `{type, payload, traceId?, metadata?}` — the one envelope shape every
/// transport flavour (HTTP, async stream, MQ, gRPC) is translated into and
/// out of at the adapter boundary. `type` is the routing key consulted by
/// [`crate::hook::HookRegistry::find_first_match`]; `payload` is left as
/// `serde_json::Value` so the engine never needs to know a protocol's wire
/// shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Routing key: HTTP operation name, WS/TCP message name, gRPC method,
    /// MQ topic.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Protocol-specific payload. For HTTP this is `{method, path, headers?,
    /// body?}` (request) or `{code, headers?, body}` (response); for gRPC,
    /// metadata travels under `metadata.grpc_metadata`.
    pub payload: Value,

    /// Correlates a request with its response on sync clients and threads a
    /// mock reply through proxies.
    #[serde(rename = "traceId", skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<TraceId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Message {
    pub fn new(message_type: impl Into<String>, payload: Value) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
            trace_id: None,
            metadata: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Convenience used by `mockReply`/`assert` handlers that only care
    /// about the body shape, not the envelope.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Which way a recorded [`Interaction`] crossed the wire relative to the
/// component that recorded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionDirection {
    Inbound,
    Outbound,
}

/// A recorded wire-level exchange (§6, §8): a component logs one of these
/// every time it sends or receives a [`Message`]. Aggregated into
/// `TestCaseResult::interactions`/`TestResult::interactions` when
/// `TestScenarioConfig::recording` is on, discarded otherwise.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub component: String,
    pub direction: InteractionDirection,
    pub message_type: String,
    pub payload: Value,
    pub trace_id: Option<TraceId>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Interaction {
    pub fn new(component: impl Into<String>, direction: InteractionDirection, message: &Message) -> Self {
        Self {
            component: component.into(),
            direction,
            message_type: message.message_type.clone(),
            payload: message.payload.clone(),
            trace_id: message.trace_id,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_envelope_with_trace_id() {
        let trace_id = TraceId::new();
        let msg = Message::new("getUser", json!({"id": 1})).with_trace_id(trace_id);
        assert_eq!(msg.message_type, "getUser");
        assert_eq!(msg.trace_id, Some(trace_id));
    }

    #[test]
    fn payload_as_deserializes_typed_view() {
        #[derive(Deserialize)]
        struct Body {
            id: u64,
        }
        let msg = Message::new("getUser", json!({"id": 7}));
        let body: Body = msg.payload_as().unwrap();
        assert_eq!(body.id, 7);
    }
}
