//! Typed tool invocations.
//!
//! `ToolName` is the closed set of tools the server knows about and
//! `ToolCall` pairs each of them with its strongly typed argument record.
//! The dispatcher matches on `ToolCall` instead of passing raw JSON around.

use crate::error::{FieldIssue, ToolError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

macro_rules! tool_names {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ToolName {
            $($variant),+
        }

        impl ToolName {
            pub const ALL: &'static [ToolName] = &[$(ToolName::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ToolName::$variant => $name),+
                }
            }

            pub fn parse(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(ToolName::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

tool_names! {
    ExecuteCommand => "execute_command",
    ExecuteCommandChain => "execute_command_chain",
    ListProcesses => "list_processes",
    KillProcess => "kill_process",
    BlockCommand => "block_command",
    UnblockCommand => "unblock_command",
    ListBlockedCommands => "list_blocked_commands",
    ConfigureSecurity => "configure_security",
    ReadFile => "read_file",
    ReadMultipleFiles => "read_multiple_files",
    WriteFile => "write_file",
    CreateDirectory => "create_directory",
    ListDirectory => "list_directory",
    MoveFile => "move_file",
    SearchFiles => "search_files",
    GetFileInfo => "get_file_info",
    ListAllowedDirectories => "list_allowed_directories",
    SetFilePermissions => "set_file_permissions",
    ChangeFileOwnership => "change_file_ownership",
    CreateSymbolicLink => "create_symbolic_link",
    GetSystemInfo => "get_system_info",
    GetNetworkInfo => "get_network_info",
    CheckPort => "check_port",
    ScanNetwork => "scan_network",
    ListServices => "list_services",
    ManageService => "manage_service",
    CreateScheduledTask => "create_scheduled_task",
    ListScheduledTasks => "list_scheduled_tasks",
    DeleteScheduledTask => "delete_scheduled_task",
    SystemPowerAction => "system_power_action",
    RegistryOperation => "registry_operation",
    RequestUnlockCode => "request_unlock_code",
    VerifyUnlockCode => "verify_unlock_code",
    UnlockStatus => "unlock_status",
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ToolName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteCommandArgs {
    pub command: String,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteCommandChainArgs {
    pub commands: Vec<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PidArgs {
    pub pid: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandArgs {
    pub command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityAction {
    DisableBlocking,
    EnableBlocking,
    ClearBlockedCommands,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigureSecurityArgs {
    pub action: SecurityAction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadMultipleFilesArgs {
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteFileArgs {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveFileArgs {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchFilesArgs {
    pub path: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetFilePermissionsArgs {
    pub path: String,
    pub permissions: String,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeFileOwnershipArgs {
    pub path: String,
    pub user: Option<String>,
    pub group: Option<String>,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSymbolicLinkArgs {
    pub target: String,
    pub link_path: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckPortArgs {
    pub port: u16,
    pub host: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanNetworkArgs {
    pub network: String,
    pub ports: Option<Vec<u16>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterArgs {
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Enable,
    Disable,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
            ServiceAction::Enable => "enable",
            ServiceAction::Disable => "disable",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageServiceArgs {
    pub service_name: String,
    pub action: ServiceAction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduledTaskArgs {
    pub name: String,
    pub command: String,
    pub schedule: String,
    #[serde(default)]
    pub run_as_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    Shutdown,
    Reboot,
    Sleep,
    Hibernate,
}

impl PowerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerAction::Shutdown => "shutdown",
            PowerAction::Reboot => "reboot",
            PowerAction::Sleep => "sleep",
            PowerAction::Hibernate => "hibernate",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPowerActionArgs {
    pub action: PowerAction,
    #[serde(default)]
    pub delay_seconds: u64,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryAction {
    Read,
    Write,
    Delete,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryOperationArgs {
    pub action: RegistryAction,
    pub key: String,
    pub value: Option<String>,
    pub data: Option<String>,
    #[serde(rename = "type")]
    pub value_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyUnlockCodeArgs {
    pub code: String,
}

#[derive(Debug, Clone)]
pub enum ToolCall {
    ExecuteCommand(ExecuteCommandArgs),
    ExecuteCommandChain(ExecuteCommandChainArgs),
    ListProcesses,
    KillProcess(PidArgs),
    BlockCommand(CommandArgs),
    UnblockCommand(CommandArgs),
    ListBlockedCommands,
    ConfigureSecurity(ConfigureSecurityArgs),
    ReadFile(PathArgs),
    ReadMultipleFiles(ReadMultipleFilesArgs),
    WriteFile(WriteFileArgs),
    CreateDirectory(PathArgs),
    ListDirectory(PathArgs),
    MoveFile(MoveFileArgs),
    SearchFiles(SearchFilesArgs),
    GetFileInfo(PathArgs),
    ListAllowedDirectories,
    SetFilePermissions(SetFilePermissionsArgs),
    ChangeFileOwnership(ChangeFileOwnershipArgs),
    CreateSymbolicLink(CreateSymbolicLinkArgs),
    GetSystemInfo,
    GetNetworkInfo,
    CheckPort(CheckPortArgs),
    ScanNetwork(ScanNetworkArgs),
    ListServices(FilterArgs),
    ManageService(ManageServiceArgs),
    CreateScheduledTask(CreateScheduledTaskArgs),
    ListScheduledTasks(FilterArgs),
    DeleteScheduledTask(NameArgs),
    SystemPowerAction(SystemPowerActionArgs),
    RegistryOperation(RegistryOperationArgs),
    RequestUnlockCode,
    VerifyUnlockCode(VerifyUnlockCodeArgs),
    UnlockStatus,
}

fn decode<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::Validation(vec![FieldIssue::new("arguments", e.to_string())]))
}

impl ToolCall {
    /// Decodes already shape-checked arguments into the tool's record.
    pub fn parse(name: ToolName, arguments: Value) -> Result<Self, ToolError> {
        let call = match name {
            ToolName::ExecuteCommand => ToolCall::ExecuteCommand(decode(arguments)?),
            ToolName::ExecuteCommandChain => ToolCall::ExecuteCommandChain(decode(arguments)?),
            ToolName::ListProcesses => ToolCall::ListProcesses,
            ToolName::KillProcess => ToolCall::KillProcess(decode(arguments)?),
            ToolName::BlockCommand => ToolCall::BlockCommand(decode(arguments)?),
            ToolName::UnblockCommand => ToolCall::UnblockCommand(decode(arguments)?),
            ToolName::ListBlockedCommands => ToolCall::ListBlockedCommands,
            ToolName::ConfigureSecurity => ToolCall::ConfigureSecurity(decode(arguments)?),
            ToolName::ReadFile => ToolCall::ReadFile(decode(arguments)?),
            ToolName::ReadMultipleFiles => ToolCall::ReadMultipleFiles(decode(arguments)?),
            ToolName::WriteFile => ToolCall::WriteFile(decode(arguments)?),
            ToolName::CreateDirectory => ToolCall::CreateDirectory(decode(arguments)?),
            ToolName::ListDirectory => ToolCall::ListDirectory(decode(arguments)?),
            ToolName::MoveFile => ToolCall::MoveFile(decode(arguments)?),
            ToolName::SearchFiles => ToolCall::SearchFiles(decode(arguments)?),
            ToolName::GetFileInfo => ToolCall::GetFileInfo(decode(arguments)?),
            ToolName::ListAllowedDirectories => ToolCall::ListAllowedDirectories,
            ToolName::SetFilePermissions => ToolCall::SetFilePermissions(decode(arguments)?),
            ToolName::ChangeFileOwnership => ToolCall::ChangeFileOwnership(decode(arguments)?),
            ToolName::CreateSymbolicLink => ToolCall::CreateSymbolicLink(decode(arguments)?),
            ToolName::GetSystemInfo => ToolCall::GetSystemInfo,
            ToolName::GetNetworkInfo => ToolCall::GetNetworkInfo,
            ToolName::CheckPort => ToolCall::CheckPort(decode(arguments)?),
            ToolName::ScanNetwork => ToolCall::ScanNetwork(decode(arguments)?),
            ToolName::ListServices => ToolCall::ListServices(decode(arguments)?),
            ToolName::ManageService => ToolCall::ManageService(decode(arguments)?),
            ToolName::CreateScheduledTask => ToolCall::CreateScheduledTask(decode(arguments)?),
            ToolName::ListScheduledTasks => ToolCall::ListScheduledTasks(decode(arguments)?),
            ToolName::DeleteScheduledTask => ToolCall::DeleteScheduledTask(decode(arguments)?),
            ToolName::SystemPowerAction => ToolCall::SystemPowerAction(decode(arguments)?),
            ToolName::RegistryOperation => ToolCall::RegistryOperation(decode(arguments)?),
            ToolName::RequestUnlockCode => ToolCall::RequestUnlockCode,
            ToolName::VerifyUnlockCode => ToolCall::VerifyUnlockCode(decode(arguments)?),
            ToolName::UnlockStatus => ToolCall::UnlockStatus,
        };
        Ok(call)
    }
}
