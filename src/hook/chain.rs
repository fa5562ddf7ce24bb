//! Handler-chain execution (§4.2).

use serde_json::Value;

use super::types::{Handler, HandlerError, HandlerOutput};

/// Why a handler chain failed to complete.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    /// An `assert` handler's predicate returned `false`.
    #[error("assertion failed: {value}")]
    AssertionFailed {
        description: Option<String>,
        value: Value,
    },
    /// Any handler (including an `assert` predicate) raised an exception.
    /// The caller is responsible for also recording this on the owning
    /// component's `unhandled_errors` (§4.2, §7).
    #[error("handler raised an exception: {0}")]
    HandlerException(#[from] HandlerError),
}

/// What running a hook's handler chain to completion produced.
#[derive(Debug, Clone)]
pub enum ChainOutcome {
    /// The value produced by the last handler (or the original input, if
    /// the chain was empty or ended in a pass-through `assert`).
    Value(Value),
    /// Some handler in the chain dropped the message.
    Dropped,
    /// A `ProxyMock` handler answered directly; the caller must reply with
    /// this value without forwarding anything further downstream.
    Respond(Value),
}

/// Runs `handlers` in order, feeding each handler's output into the next,
/// starting from `initial` (§4.2).
pub fn run_chain(handlers: &[Handler], initial: Value) -> Result<ChainOutcome, ChainError> {
    let mut current = initial;
    for handler in handlers {
        match handler {
            Handler::Assert {
                description,
                predicate,
            } => match predicate(&current) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(ChainError::AssertionFailed {
                        description: description.clone(),
                        value: current,
                    })
                }
                Err(e) => return Err(ChainError::HandlerException(e)),
            },
            Handler::Transform { transform, .. } => match transform(&current)? {
                HandlerOutput::Value(next) => current = next,
                HandlerOutput::Dropped => return Ok(ChainOutcome::Dropped),
            },
            Handler::MockReply { response_factory } => match response_factory(&current)? {
                HandlerOutput::Value(next) => current = next,
                HandlerOutput::Dropped => return Ok(ChainOutcome::Dropped),
            },
            Handler::MockEvent { event_factory, .. } => match event_factory(&current)? {
                HandlerOutput::Value(next) => current = next,
                HandlerOutput::Dropped => return Ok(ChainOutcome::Dropped),
            },
            Handler::Proxy { execute } => match execute(&current)? {
                HandlerOutput::Value(next) => current = next,
                HandlerOutput::Dropped => return Ok(ChainOutcome::Dropped),
            },
            Handler::ProxyMock { response_factory } => match response_factory(&current)? {
                HandlerOutput::Value(next) => return Ok(ChainOutcome::Respond(next)),
                HandlerOutput::Dropped => return Ok(ChainOutcome::Dropped),
            },
            Handler::Drop => return Ok(ChainOutcome::Dropped),
        }
    }
    Ok(ChainOutcome::Value(current))
}

/// The `event_type` a chain's `MockEvent` handler (if any) declared, used by
/// `AsyncServer` to name the outbound event message.
pub fn mock_event_type(handlers: &[Handler]) -> Option<&str> {
    handlers.iter().find_map(|handler| match handler {
        Handler::MockEvent { event_type, .. } => Some(event_type.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assert_passes_value_through_unchanged() {
        let handlers = vec![Handler::assert(None, |v| Ok(v["ok"] == json!(true)))];
        let outcome = run_chain(&handlers, json!({"ok": true})).unwrap();
        match outcome {
            ChainOutcome::Value(v) => assert_eq!(v, json!({"ok": true})),
            other => panic!("expected value, got {other:?}"),
        }
    }

    #[test]
    fn failing_assert_reports_description_and_value() {
        let handlers = vec![Handler::assert(Some("ok must be true".into()), |v| {
            Ok(v["ok"] == json!(true))
        })];
        let err = run_chain(&handlers, json!({"ok": false})).unwrap_err();
        match err {
            ChainError::AssertionFailed { description, value } => {
                assert_eq!(description.as_deref(), Some("ok must be true"));
                assert_eq!(value, json!({"ok": false}));
            }
            _ => panic!("expected assertion failure"),
        }
    }

    #[test]
    fn transform_replaces_value_for_next_handler() {
        let handlers = vec![
            Handler::transform(None, |v| {
                Ok(HandlerOutput::Value(json!({"value": v["value"].as_i64().unwrap() + 1})))
            }),
            Handler::assert(None, |v| Ok(v["value"] == json!(101))),
        ];
        let outcome = run_chain(&handlers, json!({"value": 100})).unwrap();
        assert!(matches!(outcome, ChainOutcome::Value(v) if v == json!({"value": 101})));
    }

    #[test]
    fn drop_short_circuits_the_chain() {
        let handlers = vec![
            Handler::Drop,
            Handler::assert(None, |_| panic!("should never run")),
        ];
        let outcome = run_chain(&handlers, json!({})).unwrap();
        assert!(matches!(outcome, ChainOutcome::Dropped));
    }

    #[test]
    fn handler_exception_is_distinguished_from_assertion_failure() {
        let handlers = vec![Handler::transform(None, |_| {
            Err(HandlerError::new("boom"))
        })];
        let err = run_chain(&handlers, json!({})).unwrap_err();
        assert!(matches!(err, ChainError::HandlerException(_)));
    }

    #[test]
    fn proxy_mock_answers_directly_without_continuing_the_chain() {
        let handlers = vec![
            Handler::proxy_mock_response(|_| Ok(HandlerOutput::Value(json!({"code": 200})))),
            Handler::assert(None, |_| panic!("should never run")),
        ];
        let outcome = run_chain(&handlers, json!({})).unwrap();
        assert!(matches!(outcome, ChainOutcome::Respond(v) if v == json!({"code": 200})));
    }

    #[test]
    fn mock_event_type_is_discovered_from_the_chain() {
        let handlers = vec![Handler::mock_event("pong", |v| {
            Ok(HandlerOutput::Value(v.clone()))
        })];
        assert_eq!(mock_event_type(&handlers), Some("pong"));
    }
}
