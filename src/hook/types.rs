//! Matcher, handler and hook value types (§3, §4.2).

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::message::Message;
use crate::phase::Phase;
use crate::util::{ComponentName, HookId, TraceId};

/// Raised by a handler closure other than the dedicated drop signal.
/// Recorded on the owning component's `unhandled_errors` and re-raised so
/// the current step fails (§4.2, §7).
#[derive(Debug, Error, Clone)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for HandlerError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for HandlerError {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Either a literal message type or a predicate over `(type, payload)`.
/// A predicate's exception is interpreted as "no match" (§4.2 rule 2), so
/// the closure returns a plain `bool`; authors who want to signal failure
/// explicitly return `false` rather than unwinding.
#[derive(Clone)]
pub enum Matcher {
    Literal(String),
    Predicate(Arc<dyn Fn(&str, &Value) -> bool + Send + Sync>),
}

impl Matcher {
    pub fn literal(message_type: impl Into<String>) -> Self {
        Self::Literal(message_type.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    fn matches(&self, message_type: &str, payload: &Value) -> bool {
        match self {
            Matcher::Literal(expected) => expected == message_type,
            Matcher::Predicate(predicate) => predicate(message_type, payload),
        }
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// `{kind:"traceId", value}` or `{kind:"fn", fn}` (§3, §4.2 rule 3).
#[derive(Clone)]
pub enum PayloadMatcher {
    TraceId(TraceId),
    Fn(Arc<dyn Fn(&Message) -> bool + Send + Sync>),
}

impl PayloadMatcher {
    pub fn trace_id(value: TraceId) -> Self {
        Self::TraceId(value)
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        Self::Fn(Arc::new(f))
    }

    fn matches(&self, message: &Message) -> bool {
        match self {
            PayloadMatcher::TraceId(expected) => message.trace_id.as_ref() == Some(expected),
            PayloadMatcher::Fn(predicate) => predicate(message),
        }
    }
}

impl std::fmt::Debug for PayloadMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadMatcher::TraceId(id) => f.debug_tuple("TraceId").field(id).finish(),
            PayloadMatcher::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

/// What a handler in a chain produced for its successor.
#[derive(Debug, Clone)]
pub enum HandlerOutput {
    /// The payload to feed into the next handler (or to send on the wire,
    /// if this was the chain's last handler).
    Value(Value),
    /// The sentinel drop signal (§3 Handler): the engine suppresses any
    /// auto-reply and stops running the remaining handlers.
    Dropped,
}

type Predicate = Arc<dyn Fn(&Value) -> Result<bool, HandlerError> + Send + Sync>;
type Transformer = Arc<dyn Fn(&Value) -> Result<HandlerOutput, HandlerError> + Send + Sync>;

/// Tagged handler record (§3 DATA MODEL).
///
/// `assert`/`transform`/`mockReply`/`mockEvent`/`proxy` each wrap a closure;
/// `drop` needs none. This is the one type in the crate that holds
/// `Arc<dyn Fn>` fields rather than a generic constraint, because a handler
/// chain is a runtime-composed, heterogeneous pipeline by construction (see
/// `DESIGN.md`).
#[derive(Clone)]
pub enum Handler {
    /// Runs a predicate; `Ok(false)` or `Err` fails the hook (and the
    /// enclosing step). Passes its input through unchanged on success.
    Assert {
        description: Option<String>,
        predicate: Predicate,
    },
    /// Replaces the current value.
    Transform {
        description: Option<String>,
        transform: Transformer,
    },
    /// Sync server only: produces the response sent back on the wire.
    MockReply { response_factory: Transformer },
    /// Async server only: produces the event payload sent back on the wire,
    /// tagged with `event_type`.
    MockEvent {
        event_type: String,
        event_factory: Transformer,
    },
    /// Generic proxy-direction handler: transform, mock-respond
    /// (short-circuit), or drop.
    Proxy { execute: Transformer },
    /// Proxy-only: answers the upstream caller directly with `response_
    /// factory`'s output without ever calling the downstream backend (§8
    /// End-to-End Scenario 2 "backend never called").
    ProxyMock { response_factory: Transformer },
    /// Yields `HandlerOutput::Dropped`; the engine suppresses any
    /// auto-reply.
    Drop,
}

impl Handler {
    pub fn assert<F>(description: Option<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, HandlerError> + Send + Sync + 'static,
    {
        Self::Assert {
            description,
            predicate: Arc::new(predicate),
        }
    }

    pub fn transform<F>(description: Option<String>, transform: F) -> Self
    where
        F: Fn(&Value) -> Result<HandlerOutput, HandlerError> + Send + Sync + 'static,
    {
        Self::Transform {
            description,
            transform: Arc::new(transform),
        }
    }

    pub fn mock_reply<F>(response_factory: F) -> Self
    where
        F: Fn(&Value) -> Result<HandlerOutput, HandlerError> + Send + Sync + 'static,
    {
        Self::MockReply {
            response_factory: Arc::new(response_factory),
        }
    }

    pub fn mock_event<F>(event_type: impl Into<String>, event_factory: F) -> Self
    where
        F: Fn(&Value) -> Result<HandlerOutput, HandlerError> + Send + Sync + 'static,
    {
        Self::MockEvent {
            event_type: event_type.into(),
            event_factory: Arc::new(event_factory),
        }
    }

    pub fn proxy<F>(execute: F) -> Self
    where
        F: Fn(&Value) -> Result<HandlerOutput, HandlerError> + Send + Sync + 'static,
    {
        Self::Proxy {
            execute: Arc::new(execute),
        }
    }

    pub fn proxy_mock_response<F>(response_factory: F) -> Self
    where
        F: Fn(&Value) -> Result<HandlerOutput, HandlerError> + Send + Sync + 'static,
    {
        Self::ProxyMock {
            response_factory: Arc::new(response_factory),
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Assert { description, .. } => {
                f.debug_struct("Assert").field("description", description).finish()
            }
            Handler::Transform { description, .. } => f
                .debug_struct("Transform")
                .field("description", description)
                .finish(),
            Handler::MockReply { .. } => f.write_str("MockReply(..)"),
            Handler::MockEvent { event_type, .. } => {
                f.debug_struct("MockEvent").field("event_type", event_type).finish()
            }
            Handler::Proxy { .. } => f.write_str("Proxy(..)"),
            Handler::ProxyMock { .. } => f.write_str("ProxyMock(..)"),
            Handler::Drop => f.write_str("Drop"),
        }
    }
}

/// `{id, componentName, phase, matcher, payloadMatcher?, handlers,
/// persistent, timeout?}` (§3 DATA MODEL).
#[derive(Debug, Clone)]
pub struct Hook {
    pub id: HookId,
    pub component_name: ComponentName,
    pub phase: Phase,
    pub matcher: Matcher,
    pub payload_matcher: Option<PayloadMatcher>,
    pub handlers: Vec<Handler>,
    /// Persistent hooks survive test-case boundaries; non-persistent ones
    /// are cleared when the owning test case ends.
    pub persistent: bool,
    pub timeout: Option<Duration>,
    /// Sync server only: holds the reply for this long before sending it
    /// (`MockRequestBuilder::delay`).
    pub response_delay: Option<Duration>,
}

impl Hook {
    pub fn new(component_name: impl Into<String>, phase: Phase, matcher: Matcher) -> Self {
        Self {
            id: HookId::new(),
            component_name: component_name.into(),
            phase,
            matcher,
            payload_matcher: None,
            handlers: Vec::new(),
            persistent: false,
            timeout: None,
            response_delay: None,
        }
    }

    pub fn with_payload_matcher(mut self, payload_matcher: PayloadMatcher) -> Self {
        self.payload_matcher = Some(payload_matcher);
        self
    }

    pub fn with_handlers(mut self, handlers: Vec<Handler>) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Both the matcher and, if present, the payload matcher must accept
    /// `message` for this hook to be a candidate (§4.2 rules 1-3).
    pub fn accepts(&self, message: &Message) -> bool {
        if !self.matcher.matches(&message.message_type, &message.payload) {
            return false;
        }
        match &self.payload_matcher {
            Some(payload_matcher) => payload_matcher.matches(message),
            None => true,
        }
    }
}
