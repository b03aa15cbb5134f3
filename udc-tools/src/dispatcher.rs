use crate::call::ToolCall;
use crate::envelope::Envelope;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::handler::ToolHandler;
use crate::registry::{ToolRegistry, ToolSpec};
use crate::schema;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{error, info, warn};
use udc_policy::{GateError, UnlockGate};

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Validates, authorizes and routes every tool invocation.
///
/// Authorization is re-evaluated on every call. Any failure along the way is
/// turned into a failure [`Envelope`]; `invoke` itself never errors.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    gate: Arc<UnlockGate>,
    handler: Arc<dyn ToolHandler>,
    default_timeout_ms: u64,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        gate: Arc<UnlockGate>,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            registry,
            gate,
            handler,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &UnlockGate {
        &self.gate
    }

    pub async fn invoke(&self, tool_name: &str, arguments: Value) -> Envelope {
        let Some(spec) = self.registry.get(tool_name) else {
            warn!(tool = %tool_name, "Unknown tool requested");
            return Envelope::from_result(Err(ToolError::UnknownTool(tool_name.to_string())));
        };

        let started = Instant::now();
        let ctx = ExecutionContext::new(spec.name, self.default_timeout_ms);
        let result = self.dispatch(spec, &ctx, arguments).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(
                invocation_id = %ctx.invocation_id,
                tool = %spec.name,
                tier = ?spec.risk,
                elapsed_ms,
                outcome = "ok",
                "Tool dispatched"
            ),
            Err(e) => warn!(
                invocation_id = %ctx.invocation_id,
                tool = %spec.name,
                tier = ?spec.risk,
                elapsed_ms,
                outcome = "error",
                error = %e,
                "Tool dispatched"
            ),
        }

        Envelope::from_result(result)
    }

    async fn dispatch(
        &self,
        spec: &ToolSpec,
        ctx: &ExecutionContext,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        schema::validate(&spec.schema, &arguments).map_err(ToolError::Validation)?;
        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };
        let call = ToolCall::parse(spec.name, arguments)?;

        if !self.gate.is_authorized(spec.name.as_str()) {
            return Err(ToolError::Locked(spec.name.to_string()));
        }

        match call {
            ToolCall::RequestUnlockCode => self.request_unlock_code().await,
            ToolCall::VerifyUnlockCode(args) => {
                let code = args.code;
                if self.with_gate(move |gate| gate.redeem(&code)).await? {
                    let status = serde_json::to_value(self.gate.status())
                        .map_err(|e| ToolError::Internal(e.to_string()))?;
                    Ok(json!({
                        "message": "High-risk tools unlocked",
                        "status": status,
                    }))
                } else {
                    Err(ToolError::Unauthorized)
                }
            }
            ToolCall::UnlockStatus => serde_json::to_value(self.gate.status())
                .map_err(|e| ToolError::Internal(e.to_string())),
            call => self.run_handler(ctx.clone(), call).await,
        }
    }

    /// The code itself stays out of the response; only the file is named.
    async fn request_unlock_code(&self) -> Result<Value, ToolError> {
        match self.with_gate(|gate| gate.issue_code()).await? {
            Ok(issued) => {
                let destination = issued.destination().display().to_string();
                Ok(json!({
                    "message": format!(
                        "Unlock code written to {destination}. Ask the operator for it and call verify_unlock_code"
                    ),
                    "destination": destination,
                }))
            }
            Err(e @ GateError::AlreadyUnlocked { .. }) => {
                Err(ToolError::HandlerFailure(e.to_string()))
            }
            Err(e @ GateError::Artifact { .. }) => {
                error!("Unable to issue unlock code: {}", e);
                Err(ToolError::HandlerFailure(e.to_string()))
            }
        }
    }

    /// Issuing and redeeming touch the code file, so they run off the
    /// async workers.
    async fn with_gate<T, F>(&self, op: F) -> Result<T, ToolError>
    where
        F: FnOnce(&UnlockGate) -> T + Send + 'static,
        T: Send + 'static,
    {
        let gate = self.gate.clone();
        task::spawn_blocking(move || op(&gate))
            .await
            .map_err(|e| ToolError::Internal(format!("unlock gate task failed: {e}")))
    }

    async fn run_handler(&self, ctx: ExecutionContext, call: ToolCall) -> Result<Value, ToolError> {
        let handler = self.handler.clone();
        // Spawned so a panicking handler cannot take the dispatcher down
        let join = tokio::spawn(async move { handler.handle(ctx, call).await });

        match join.await {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => {
                error!("Tool handler panicked");
                Err(ToolError::Internal("tool handler panicked".to_string()))
            }
            Err(_) => {
                error!("Tool handler cancelled");
                Err(ToolError::Internal("tool handler cancelled".to_string()))
            }
        }
    }
}
