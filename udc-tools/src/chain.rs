//! Sequential command chains.
//!
//! Steps run strictly in order. A step rejected by the command policy ends
//! the chain immediately. A step that ran and failed ends the chain unless
//! its text starts with `#`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use udc_executor::{CommandPolicy, CommandRunner};

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainResult {
    pub command: String,
    pub success: bool,
    pub output: String,
    pub exit_code: i32,
}

impl ChainResult {
    fn failed(command: &str, output: String) -> Self {
        Self {
            command: command.to_string(),
            success: false,
            output,
            exit_code: 1,
        }
    }
}

fn is_comment(command: &str) -> bool {
    command.starts_with('#')
}

pub struct ChainExecutor {
    runner: Arc<dyn CommandRunner>,
    policy: Arc<dyn CommandPolicy>,
}

impl ChainExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>, policy: Arc<dyn CommandPolicy>) -> Self {
        Self { runner, policy }
    }

    /// Runs `commands` in order and returns one result per attempted step.
    pub async fn run(&self, commands: &[String], step_timeout: Duration) -> Vec<ChainResult> {
        let mut results = Vec::with_capacity(commands.len());

        for (index, command) in commands.iter().enumerate() {
            if !self.policy.is_command_allowed(command) {
                warn!("Chain step {} rejected by command policy", index);
                results.push(ChainResult::failed(
                    command,
                    format!("Command not allowed: {command}"),
                ));
                break;
            }

            debug!("Chain step {}: {}", index, command);
            let result = match self.runner.run_shell(command, step_timeout).await {
                Ok(output) => ChainResult {
                    command: command.clone(),
                    success: output.success(),
                    output: output.text().to_string(),
                    exit_code: output.exit_code,
                },
                Err(e) => ChainResult::failed(command, format!("Error: {e}")),
            };

            let stop = !result.success && !is_comment(command);
            results.push(result);
            if stop {
                info!("Chain stopped at step {} of {}", index + 1, commands.len());
                break;
            }
        }

        results
    }
}
