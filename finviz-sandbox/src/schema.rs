//! Input-schema builder shared by code-snippet tools.

use serde_json::{json, Value};

/// JSON schema for a tool that accepts one code snippet: an object with a
/// single required string property `code`.
pub fn code_snippet_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "code": {
                "type": "string",
                "description": description,
            }
        },
        "required": ["code"]
    })
}
