pub mod config;
pub mod server;

use anyhow::{Context, Result};
use config::Config;
use std::sync::Arc;
use udc_executor::{CommandBlocklist, ShellRunner};
use udc_policy::UnlockGate;
use udc_tools::{Dispatcher, PathGuard, SystemHandler, ToolRegistry};

/// Wires the gate, blocklist, handler and registry described by `config`.
pub fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let gate_file = config
        .gate_file
        .clone()
        .unwrap_or_else(UnlockGate::default_code_file);
    let gate = UnlockGate::new(gate_file).with_unlock_window(chrono::Duration::minutes(
        i64::from(config.unlock_window_minutes),
    ));

    let paths = PathGuard::new(&config.allowed_directories)
        .context("Invalid allowed_directories entry")?;
    let blocklist = Arc::new(CommandBlocklist::new(&config.blocked_commands));
    let handler = SystemHandler::new(Arc::new(ShellRunner::new()), blocklist, paths);

    Ok(Dispatcher::new(
        Arc::new(ToolRegistry::builtin()),
        Arc::new(gate),
        Arc::new(handler),
    )
    .with_default_timeout_ms(config.default_timeout_ms))
}
