//! Transport-safe serialization of execution outcomes.

use crate::outcome::{CapturedValue, Outcome};

/// Render an outcome as the text payload returned to the caller.
///
/// Success yields the JSON encoding of the bound value (or its display
/// form when the value is not JSON-representable); failure yields
/// `"<Kind>: <message>"`. This function never fails: an encoding error
/// degrades to the value's own rendering.
pub fn serialize(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Success(CapturedValue::Json(value)) => {
            serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
        }
        Outcome::Success(CapturedValue::Repr(repr)) => repr.clone(),
        Outcome::Failure(err) => format!("{}: {}", err.kind(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ExecutionError;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_json_success() {
        let outcome = Outcome::Success(CapturedValue::Json(json!(4)));
        assert_eq!(serialize(&outcome), "4");

        let outcome = Outcome::Success(CapturedValue::Json(json!({"a": [1, 2]})));
        assert_eq!(serialize(&outcome), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_repr_fallback() {
        let outcome = Outcome::Success(CapturedValue::Repr("{1, 2}".to_string()));
        assert_eq!(serialize(&outcome), "{1, 2}");
    }

    #[test]
    fn test_failure_names_kind() {
        let outcome = Outcome::Failure(ExecutionError::CapabilityDenied {
            module: "os".to_string(),
        });
        assert_eq!(
            serialize(&outcome),
            "CapabilityDeniedError: module 'os' is not allowed"
        );

        let outcome = Outcome::Failure(ExecutionError::MissingResult);
        assert!(serialize(&outcome).starts_with("MissingResultError: "));

        let outcome = Outcome::Failure(ExecutionError::Timeout {
            budget: Duration::from_secs(5),
        });
        assert!(serialize(&outcome).starts_with("TimeoutError: "));
    }
}
