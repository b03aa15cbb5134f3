//! Host description: sysinfo snapshot plus native diagnostic output.

use super::{Host, Invocation, OsError, OsResult, Platform};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::task;
use udc_executor::EnvironmentSnapshot;

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    #[serde(flatten)]
    pub snapshot: EnvironmentSnapshot,
    pub summary: String,
    /// Raw output of native tools, keyed by tool name.
    pub details: BTreeMap<String, String>,
}

pub fn diagnostic_invocations(platform: Platform) -> Vec<(&'static str, Invocation)> {
    match platform {
        Platform::Windows => vec![("systeminfo", Invocation::new("systeminfo", Vec::<String>::new()))],
        Platform::Linux => vec![
            ("uname", Invocation::new("uname", ["-a"])),
            ("df", Invocation::new("df", ["-h"])),
            ("free", Invocation::new("free", ["-h"])),
        ],
        Platform::MacOs | Platform::OtherUnix => vec![
            ("uname", Invocation::new("uname", ["-a"])),
            ("df", Invocation::new("df", ["-h"])),
        ],
    }
}

pub async fn snapshot() -> OsResult<EnvironmentSnapshot> {
    task::spawn_blocking(EnvironmentSnapshot::capture)
        .await
        .map_err(|e| OsError::OperationFailed(e.to_string()))
}

pub async fn info(host: &Host<'_>) -> OsResult<SystemInfo> {
    let snapshot = snapshot().await?;

    let mut details = BTreeMap::new();
    for (label, invocation) in diagnostic_invocations(host.platform) {
        if let Some(output) = host.run_best_effort(&invocation).await {
            details.insert(label.to_string(), output.trim_end().to_string());
        }
    }

    Ok(SystemInfo {
        summary: snapshot.to_concise_string(),
        snapshot,
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_diagnostics() {
        let labels: Vec<_> = diagnostic_invocations(Platform::Linux)
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels, vec!["uname", "df", "free"]);
    }

    #[test]
    fn test_windows_diagnostics() {
        let invocations = diagnostic_invocations(Platform::Windows);
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].1.program, "systeminfo");
    }
}
