use crate::os_capabilities::OsError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use udc_executor::ExecutorError;

/// One offending argument field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

struct Issues<'a>(&'a [FieldIssue]);

impl fmt::Display for Issues<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {}", Issues(.0))]
    Validation(Vec<FieldIssue>),

    #[error(
        "'{0}' is a high-risk tool and the server is locked. Call request_unlock_code, \
         read the code from the file it names, then call verify_unlock_code"
    )]
    Locked(String),

    #[error("Invalid or expired unlock code")]
    Unauthorized,

    #[error("{0}")]
    HandlerFailure(String),

    #[error("Not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::Validation(vec![FieldIssue::new(field, message)])
    }
}

impl From<ExecutorError> for ToolError {
    fn from(err: ExecutorError) -> Self {
        ToolError::HandlerFailure(err.to_string())
    }
}

impl From<OsError> for ToolError {
    fn from(err: OsError) -> Self {
        match err {
            OsError::InvalidArgument { field, message } => ToolError::invalid(field, message),
            OsError::Unsupported(what) => ToolError::UnsupportedPlatform(what),
            other => ToolError::HandlerFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_fields() {
        let err = ToolError::Validation(vec![
            FieldIssue::new("pid", "is required"),
            FieldIssue::new("force", "expected boolean"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid arguments: pid: is required; force: expected boolean"
        );
    }

    #[test]
    fn test_os_error_mapping() {
        let err: ToolError = OsError::invalid("user", "user or group is required").into();
        assert!(matches!(err, ToolError::Validation(_)));

        let err: ToolError = OsError::Unsupported("registry".into()).into();
        assert!(matches!(err, ToolError::UnsupportedPlatform(_)));

        let err: ToolError = OsError::OperationFailed("boom".into()).into();
        assert_eq!(err.to_string(), "boom");
    }
}
