//! Shared HTTP utilities for the Item store workspace.
//!
//! Provides the structured error bodies returned by api-server.

use domain::CoreError;

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a structured error JSON with a default message based on the code.
///
/// Returns: `{"error": {"code": "<code>", "message": "<default message>"}}`
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "not_found" => "Resource not found",
        "bad_request" => "Bad request",
        "error" | "internal" => "Internal server error",
        _ => code, // Fallback to code as message for unknown codes
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a structured error JSON with a custom message.
///
/// Returns: `{"error": {"code": "<code>", "message": "<message>"}}`
pub fn json_error_with_message(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({"error": {"code": code, "message": message}})
}

// ============================================================================
// Domain Error Mapping
// ============================================================================

/// HTTP status and error code for a domain error.
///
/// Storage failures are reported without their internal detail.
pub fn status_for(err: &CoreError) -> (u16, &'static str) {
    match err {
        CoreError::NotFound => (404, "not_found"),
        CoreError::InvalidItem(_) => (400, "bad_request"),
        CoreError::Repository(_) => (500, "internal"),
    }
}

/// Error body for a domain error.
pub fn json_core_err(err: &CoreError) -> serde_json::Value {
    match err {
        CoreError::InvalidItem(msg) => json_error_with_message(status_for(err).1, msg),
        other => json_err(status_for(other).1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_err() {
        let err = json_err("not_found");
        assert_eq!(err, serde_json::json!({"error": {"code": "not_found", "message": "Resource not found"}}));

        // Unknown code falls back to code as message
        let err = json_err("custom_error");
        assert_eq!(err, serde_json::json!({"error": {"code": "custom_error", "message": "custom_error"}}));
    }

    #[test]
    fn test_json_error_with_message() {
        let err = json_error_with_message("bad_request", "Invalid input");
        assert_eq!(
            err,
            serde_json::json!({"error": {"code": "bad_request", "message": "Invalid input"}})
        );
    }

    #[test]
    fn test_status_for() {
        assert_eq!(status_for(&CoreError::NotFound), (404, "not_found"));
        assert_eq!(status_for(&CoreError::InvalidItem("x".into())), (400, "bad_request"));
        assert_eq!(status_for(&CoreError::Repository("disk".into())), (500, "internal"));
    }

    #[test]
    fn test_json_core_err_hides_storage_detail() {
        let body = json_core_err(&CoreError::Repository("sqlite error: locked".into()));
        assert_eq!(body["error"]["message"], "Internal server error");

        let body = json_core_err(&CoreError::InvalidItem("id must be unset on save".into()));
        assert_eq!(body["error"]["code"], "bad_request");
        assert_eq!(body["error"]["message"], "id must be unset on save");
    }
}
