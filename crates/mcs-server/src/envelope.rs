//! Response envelope
//!
//! Every tool invocation returns `{ok: true, data}` or
//! `{ok: false, error, code, correlation_id}`. The envelope is the only
//! contract callers see; stack traces never leave the process.

use serde_json::{json, Value};
use tracing::info;

use mcs_domain::error::Error;

/// Successful envelope
pub fn ok(data: Value) -> Value {
    json!({ "ok": true, "data": data })
}

/// Failure envelope from a domain error
pub fn err(error: &Error, correlation_id: &str) -> Value {
    // Logged at info: callers treat many of these as expected control flow.
    info!(
        code = error.code().as_str(),
        correlation_id,
        message = %error,
        "tool_response_error"
    );
    json!({
        "ok": false,
        "error": error.to_string(),
        "code": error.code().as_str(),
        "correlation_id": correlation_id,
    })
}

/// Confirmation-gate envelope: success, no side effect performed
pub fn confirmation_required(tool: &str, detail: &str) -> Value {
    ok(json!({
        "confirmation_required": true,
        "message": format!("{tool} is destructive; call again with confirm=true {detail}"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_wraps_data() {
        let envelope = ok(json!({"count": 3}));
        assert_eq!(envelope["ok"], true);
        assert_eq!(envelope["data"]["count"], 3);
        assert!(envelope.get("error").is_none());
    }

    #[test]
    fn err_carries_code_and_correlation_id() {
        let envelope = err(&Error::validation("query must not be empty"), "corr-1");
        assert_eq!(envelope["ok"], false);
        assert_eq!(envelope["code"], "validation");
        assert_eq!(envelope["correlation_id"], "corr-1");
        assert!(envelope["error"].as_str().unwrap().contains("query"));
    }

    #[test]
    fn confirmation_gate_is_a_successful_envelope() {
        let envelope = confirmation_required("rebuild_index", "to drop and recreate the index");
        assert_eq!(envelope["ok"], true);
        assert_eq!(envelope["data"]["confirmation_required"], true);
    }
}
