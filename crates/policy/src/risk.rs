use serde::{Deserialize, Serialize};

/// Tools able to make irreversible or privileged changes to the host.
///
/// The set is fixed at build time. Anything not listed here is `Normal`;
/// unknown tool names are rejected by the registry, not by the classifier.
pub const HIGH_RISK_TOOLS: &[&str] = &[
    "execute_command",
    "execute_command_chain",
    "system_power_action",
    "manage_service",
    "kill_process",
    "registry_operation",
    "change_file_ownership",
    "create_scheduled_task",
    "delete_scheduled_task",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Normal,
    HighRisk,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RiskClassifier;

impl RiskClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn is_high_risk(&self, tool_name: &str) -> bool {
        HIGH_RISK_TOOLS.contains(&tool_name)
    }

    pub fn tier(&self, tool_name: &str) -> RiskTier {
        if self.is_high_risk(tool_name) {
            RiskTier::HighRisk
        } else {
            RiskTier::Normal
        }
    }
}
