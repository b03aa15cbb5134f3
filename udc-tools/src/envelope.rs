use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Uniform result of every dispatch, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn success(payload: Value) -> Self {
        Self {
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: None,
            error: Some(message.into()),
        }
    }

    pub fn from_result(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(e) => Self::failure(e.to_string()),
        }
    }

    /// MCP `tools/call` result: one text block, pretty JSON on success.
    pub fn to_mcp_content(&self) -> Value {
        let text = if self.ok {
            match &self.payload {
                Some(Value::String(s)) => s.clone(),
                Some(payload) => {
                    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
                }
                None => String::new(),
            }
        } else {
            format!("Error: {}", self.error.as_deref().unwrap_or("unknown error"))
        };

        json!({
            "content": [{"type": "text", "text": text}],
            "isError": !self.ok,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_shape() {
        let envelope = Envelope::from_result(Err(ToolError::UnknownTool("nope".into())));
        assert!(!envelope.ok);
        assert_eq!(envelope.error.as_deref(), Some("Unknown tool: nope"));

        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("payload").is_none());
    }

    #[test]
    fn test_mcp_content() {
        let ok = Envelope::success(json!({"a": 1})).to_mcp_content();
        assert_eq!(ok["isError"], false);
        assert!(ok["content"][0]["text"].as_str().unwrap().contains("\"a\": 1"));

        let err = Envelope::failure("boom").to_mcp_content();
        assert_eq!(err["isError"], true);
        assert_eq!(err["content"][0]["text"], "Error: boom");
    }
}
