//! Process listing and termination.

use super::{Host, Invocation, OsError, OsResult, Platform};
use tokio::task;
use udc_executor::ProcessInfo;

pub async fn list() -> OsResult<Vec<ProcessInfo>> {
    task::spawn_blocking(ProcessInfo::list)
        .await
        .map_err(|e| OsError::OperationFailed(e.to_string()))
}

pub fn kill_invocation(platform: Platform, pid: u32) -> Invocation {
    if platform.is_windows() {
        Invocation::new("taskkill", ["/PID".to_string(), pid.to_string(), "/F".to_string()])
    } else {
        Invocation::new("kill", ["-9".to_string(), pid.to_string()])
    }
}

/// Forcefully terminates `pid`.
pub async fn kill(host: &Host<'_>, pid: u32) -> OsResult<()> {
    if pid == 0 {
        return Err(OsError::invalid("pid", "must be a positive process id"));
    }
    host.run_checked(&kill_invocation(host.platform, pid)).await?;
    tracing::info!("Killed process {}", pid);
    Ok(())
}
