use crate::call::ToolName;
use serde::Serialize;
use std::time::Duration;

/// Per-invocation data handed to the handler.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    pub invocation_id: String,
    pub tool: ToolName,
    pub timeout_ms: u64,
}

impl ExecutionContext {
    pub fn new(tool: ToolName, timeout_ms: u64) -> Self {
        Self {
            invocation_id: uuid::Uuid::new_v4().to_string(),
            tool,
            timeout_ms,
        }
    }

    /// Timeout for a call, preferring the caller-supplied value.
    pub fn timeout(&self, requested_ms: Option<u64>) -> Duration {
        Duration::from_millis(requested_ms.filter(|ms| *ms > 0).unwrap_or(self.timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_override() {
        let ctx = ExecutionContext::new(ToolName::ExecuteCommand, 30_000);
        assert_eq!(ctx.timeout(None), Duration::from_secs(30));
        assert_eq!(ctx.timeout(Some(0)), Duration::from_secs(30));
        assert_eq!(ctx.timeout(Some(500)), Duration::from_millis(500));
    }

    #[test]
    fn test_invocation_ids_are_unique() {
        let a = ExecutionContext::new(ToolName::ListProcesses, 1);
        let b = ExecutionContext::new(ToolName::ListProcesses, 1);
        assert_ne!(a.invocation_id, b.invocation_id);
    }
}
