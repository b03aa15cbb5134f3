use crate::call::{SecurityAction, ToolCall};
use crate::chain::ChainExecutor;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::os_capabilities::{
    filesystem, network, permissions, power, process, registry, services, system, tasks, Host,
    Platform,
};
use crate::sandbox::PathGuard;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use udc_executor::{CommandBlocklist, CommandPolicy, CommandRunner};

/// Executes an authorized, fully validated tool call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, ctx: ExecutionContext, call: ToolCall) -> Result<Value, ToolError>;
}

fn to_value<T: Serialize>(value: T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Internal(e.to_string()))
}

fn message(text: impl Into<String>) -> Value {
    json!({ "success": true, "message": text.into() })
}

fn non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ToolError::invalid(field, "must not be empty"));
    }
    Ok(trimmed)
}

/// Handler backed by the real host.
pub struct SystemHandler {
    runner: Arc<dyn CommandRunner>,
    blocklist: Arc<CommandBlocklist>,
    chain: ChainExecutor,
    paths: PathGuard,
    platform: Platform,
}

impl SystemHandler {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        blocklist: Arc<CommandBlocklist>,
        paths: PathGuard,
    ) -> Self {
        let chain = ChainExecutor::new(runner.clone(), blocklist.clone());
        Self {
            runner,
            blocklist,
            chain,
            paths,
            platform: Platform::current(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    fn host(&self, timeout: Duration) -> Host<'_> {
        Host::new(self.runner.as_ref(), self.platform, timeout)
    }

    async fn execute_command(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<Value, ToolError> {
        let command = non_empty("command", command)?;
        if !self.blocklist.is_command_allowed(command) {
            return Err(ToolError::HandlerFailure(format!(
                "Command not allowed: {command}"
            )));
        }

        let output = self.runner.run_shell(command, timeout).await?;
        Ok(json!({
            "success": output.success(),
            "output": output.text(),
            "exitCode": output.exit_code,
        }))
    }

    async fn read_many(&self, paths: &[String]) -> Value {
        let mut results = Vec::with_capacity(paths.len());
        for raw in paths {
            let outcome = match self.paths.validate(raw) {
                Ok(path) => filesystem::read(&path).await,
                Err(e) => Err(e),
            };
            results.push(match outcome {
                Ok(content) => json!({ "path": raw, "content": content }),
                Err(e) => json!({ "path": raw, "error": e.to_string() }),
            });
        }
        Value::Array(results)
    }
}

#[async_trait]
impl ToolHandler for SystemHandler {
    async fn handle(&self, ctx: ExecutionContext, call: ToolCall) -> Result<Value, ToolError> {
        let host = self.host(ctx.timeout(None));

        match call {
            ToolCall::ExecuteCommand(args) => {
                self.execute_command(&args.command, ctx.timeout(args.timeout_ms))
                    .await
            }
            ToolCall::ExecuteCommandChain(args) => {
                let results = self
                    .chain
                    .run(&args.commands, ctx.timeout(args.timeout_ms))
                    .await;
                to_value(results)
            }
            ToolCall::ListProcesses => to_value(process::list().await?),
            ToolCall::KillProcess(args) => {
                process::kill(&host, args.pid).await?;
                Ok(message(format!("Process {} terminated", args.pid)))
            }

            ToolCall::BlockCommand(args) => {
                let command = non_empty("command", &args.command)?;
                Ok(if self.blocklist.block(command) {
                    message(format!("Command blocked: {command}"))
                } else {
                    message(format!("Command was already blocked: {command}"))
                })
            }
            ToolCall::UnblockCommand(args) => {
                let command = non_empty("command", &args.command)?;
                if self.blocklist.unblock(command) {
                    Ok(message(format!("Command unblocked: {command}")))
                } else {
                    Err(ToolError::HandlerFailure(format!(
                        "Command is not blocked: {command}"
                    )))
                }
            }
            ToolCall::ListBlockedCommands => Ok(json!({
                "enabled": self.blocklist.is_enabled(),
                "commands": self.blocklist.list(),
            })),
            ToolCall::ConfigureSecurity(args) => {
                let text = match args.action {
                    SecurityAction::DisableBlocking => {
                        self.blocklist.set_enabled(false);
                        "Command blocking disabled"
                    }
                    SecurityAction::EnableBlocking => {
                        self.blocklist.set_enabled(true);
                        "Command blocking enabled"
                    }
                    SecurityAction::ClearBlockedCommands => {
                        self.blocklist.clear();
                        "Blocked command list cleared"
                    }
                };
                Ok(message(text))
            }

            ToolCall::ReadFile(args) => {
                let path = self.paths.validate(&args.path)?;
                Ok(Value::String(filesystem::read(&path).await?))
            }
            ToolCall::ReadMultipleFiles(args) => Ok(self.read_many(&args.paths).await),
            ToolCall::WriteFile(args) => {
                let path = self.paths.validate(&args.path)?;
                filesystem::write_atomic(&path, &args.content).await?;
                Ok(message(format!("Wrote {} bytes to {}", args.content.len(), path.display())))
            }
            ToolCall::CreateDirectory(args) => {
                let path = self.paths.validate(&args.path)?;
                filesystem::create_dir(&path).await?;
                Ok(message(format!("Created directory {}", path.display())))
            }
            ToolCall::ListDirectory(args) => {
                let path = self.paths.validate(&args.path)?;
                Ok(Value::String(filesystem::list_dir(&path).await?.join("\n")))
            }
            ToolCall::MoveFile(args) => {
                let from = self.paths.validate(&args.source)?;
                let to = self.paths.validate(&args.destination)?;
                filesystem::move_path(&from, &to).await?;
                Ok(message(format!("Moved {} to {}", from.display(), to.display())))
            }
            ToolCall::SearchFiles(args) => {
                let root = self.paths.validate(&args.path)?;
                let pattern = non_empty("pattern", &args.pattern)?;
                let found: Vec<String> = filesystem::search(&root, pattern)
                    .await?
                    .into_iter()
                    .map(|p| p.display().to_string())
                    .collect();
                Ok(json!({ "matches": found }))
            }
            ToolCall::GetFileInfo(args) => {
                let path = self.paths.validate(&args.path)?;
                to_value(filesystem::info(&path).await?)
            }
            ToolCall::ListAllowedDirectories => {
                let dirs: Vec<String> = self
                    .paths
                    .allowed_directories()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                Ok(json!({ "restricted": self.paths.is_restricted(), "directories": dirs }))
            }
            ToolCall::SetFilePermissions(args) => {
                let path = self.paths.validate(&args.path)?;
                permissions::set_permissions(&host, &path, &args.permissions, args.recursive)
                    .await?;
                Ok(message(format!(
                    "Permissions of {} set to {}",
                    path.display(),
                    args.permissions.trim()
                )))
            }
            ToolCall::ChangeFileOwnership(args) => {
                let path = self.paths.validate(&args.path)?;
                permissions::change_owner(
                    &host,
                    &path,
                    args.user.as_deref(),
                    args.group.as_deref(),
                    args.recursive,
                )
                .await?;
                Ok(message(format!("Ownership of {} changed", path.display())))
            }
            ToolCall::CreateSymbolicLink(args) => {
                let target = self.paths.validate(&args.target)?;
                let link = self.paths.validate(&args.link_path)?;
                permissions::symlink(&target, &link, args.force).await?;
                Ok(message(format!(
                    "Created link {} -> {}",
                    link.display(),
                    target.display()
                )))
            }

            ToolCall::GetSystemInfo => to_value(system::info(&host).await?),
            ToolCall::GetNetworkInfo => to_value(network::info(&host).await?),
            ToolCall::CheckPort(args) => {
                let target = args.host.as_deref().map(str::trim).filter(|h| !h.is_empty());
                to_value(network::check_port(target.unwrap_or("localhost"), args.port).await)
            }
            ToolCall::ScanNetwork(args) => {
                let ports = args
                    .ports
                    .unwrap_or_else(|| network::DEFAULT_SCAN_PORTS.to_vec());
                to_value(network::scan(&host, &args.network, &ports).await?)
            }

            ToolCall::ListServices(args) => {
                to_value(services::list(&host, args.filter.as_deref()).await?)
            }
            ToolCall::ManageService(args) => {
                let output = services::manage(&host, &args.service_name, args.action).await?;
                Ok(json!({
                    "success": true,
                    "message": format!("Service {} {}", args.service_name.trim(), args.action.as_str()),
                    "output": output,
                }))
            }
            ToolCall::CreateScheduledTask(args) => {
                tasks::create(
                    &host,
                    &args.name,
                    &args.command,
                    &args.schedule,
                    args.run_as_admin,
                )
                .await?;
                Ok(message(format!("Scheduled task created: {}", args.name.trim())))
            }
            ToolCall::ListScheduledTasks(args) => {
                to_value(tasks::list(&host, args.filter.as_deref()).await?)
            }
            ToolCall::DeleteScheduledTask(args) => {
                tasks::delete(&host, &args.name).await?;
                Ok(message(format!("Scheduled task deleted: {}", args.name.trim())))
            }
            ToolCall::SystemPowerAction(args) => {
                let output = power::perform(&host, args.action, args.delay_seconds, args.force)
                    .await?;
                let mut text = format!("System {} initiated", args.action.as_str());
                if args.delay_seconds > 0 {
                    text.push_str(&format!(" with {} seconds delay", args.delay_seconds));
                }
                Ok(json!({ "success": true, "message": text, "output": output }))
            }
            ToolCall::RegistryOperation(args) => {
                let outcome = registry::operate(
                    &host,
                    args.action,
                    &args.key,
                    args.value.as_deref(),
                    args.data.as_deref(),
                    args.value_type.as_deref(),
                )
                .await?;
                info!("Registry {} on {}", outcome.action, outcome.key);
                to_value(outcome)
            }

            ToolCall::RequestUnlockCode | ToolCall::VerifyUnlockCode(_) | ToolCall::UnlockStatus => {
                Err(ToolError::Internal(format!(
                    "{} is served by the dispatcher",
                    ctx.tool
                )))
            }
        }
    }
}
