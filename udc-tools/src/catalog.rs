//! Built-in tool descriptions and argument schemas.

use crate::call::ToolName;
use serde_json::{json, Value};

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn empty() -> Value {
    object(json!({}), &[])
}

fn path_only(description: &str) -> Value {
    object(
        json!({"path": {"type": "string", "description": description}}),
        &["path"],
    )
}

fn filter_only(description: &str) -> Value {
    object(
        json!({"filter": {"type": "string", "description": description}}),
        &[],
    )
}

fn timeout_property() -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "description": "Per-command timeout in milliseconds"
    })
}

pub fn description(name: ToolName) -> &'static str {
    match name {
        ToolName::ExecuteCommand => "Execute a shell command and return its output",
        ToolName::ExecuteCommandChain => {
            "Execute commands in order, stopping at the first failure. Lines starting with '#' never stop the chain"
        }
        ToolName::ListProcesses => "List running processes with cpu and memory usage",
        ToolName::KillProcess => "Forcefully terminate a process by pid",
        ToolName::BlockCommand => "Add a command to the blocklist",
        ToolName::UnblockCommand => "Remove a command from the blocklist",
        ToolName::ListBlockedCommands => "List blocked commands",
        ToolName::ConfigureSecurity => "Enable or disable command blocking, or clear the blocklist",
        ToolName::ReadFile => "Read a text file",
        ToolName::ReadMultipleFiles => "Read several files, reporting per-file errors inline",
        ToolName::WriteFile => "Create or overwrite a file atomically",
        ToolName::CreateDirectory => "Create a directory and any missing parents",
        ToolName::ListDirectory => "List directory entries with [DIR] and [FILE] prefixes",
        ToolName::MoveFile => "Move or rename a file or directory",
        ToolName::SearchFiles => "Recursively find entries whose name contains a pattern",
        ToolName::GetFileInfo => "Size, timestamps, type and permissions of a path",
        ToolName::ListAllowedDirectories => "List the directories file tools may access",
        ToolName::SetFilePermissions => {
            "Set permissions: octal mode on Unix, icacls grant spec on Windows"
        }
        ToolName::ChangeFileOwnership => "Change the owner and/or group of a path",
        ToolName::CreateSymbolicLink => "Create a symbolic link",
        ToolName::GetSystemInfo => "Describe the host: OS, cpu, memory, disks, uptime",
        ToolName::GetNetworkInfo => "Describe network interfaces and routes",
        ToolName::CheckPort => "Check whether a TCP port accepts connections",
        ToolName::ScanNetwork => "Ping the base address of a network and probe common ports",
        ToolName::ListServices => "List system services",
        ToolName::ManageService => "Start, stop, restart, enable or disable a service",
        ToolName::CreateScheduledTask => "Create a scheduled task from a cron expression",
        ToolName::ListScheduledTasks => "List scheduled tasks",
        ToolName::DeleteScheduledTask => "Delete a scheduled task by name",
        ToolName::SystemPowerAction => "Shut down, reboot, sleep or hibernate the machine",
        ToolName::RegistryOperation => "Read, write or delete a Windows registry value",
        ToolName::RequestUnlockCode => {
            "Issue a one-time code for high-risk tools. The code is written to a local file for the operator"
        }
        ToolName::VerifyUnlockCode => "Redeem an unlock code, enabling high-risk tools for a limited window",
        ToolName::UnlockStatus => "Report whether high-risk tools are currently unlocked",
    }
}

pub fn schema(name: ToolName) -> Value {
    match name {
        ToolName::ExecuteCommand => object(
            json!({
                "command": {"type": "string", "description": "Command line to run"},
                "timeout_ms": timeout_property()
            }),
            &["command"],
        ),
        ToolName::ExecuteCommandChain => object(
            json!({
                "commands": {"type": "array", "items": {"type": "string"}},
                "timeout_ms": timeout_property()
            }),
            &["commands"],
        ),
        ToolName::KillProcess => object(
            json!({"pid": {"type": "integer", "minimum": 1, "maximum": u32::MAX}}),
            &["pid"],
        ),
        ToolName::BlockCommand | ToolName::UnblockCommand => object(
            json!({"command": {"type": "string", "description": "Base command name, e.g. rm"}}),
            &["command"],
        ),
        ToolName::ConfigureSecurity => object(
            json!({
                "action": {
                    "type": "string",
                    "enum": ["disable_blocking", "enable_blocking", "clear_blocked_commands"]
                }
            }),
            &["action"],
        ),
        ToolName::ReadFile => path_only("File to read"),
        ToolName::ReadMultipleFiles => object(
            json!({"paths": {"type": "array", "items": {"type": "string"}}}),
            &["paths"],
        ),
        ToolName::WriteFile => object(
            json!({
                "path": {"type": "string"},
                "content": {"type": "string"}
            }),
            &["path", "content"],
        ),
        ToolName::CreateDirectory => path_only("Directory to create"),
        ToolName::ListDirectory => path_only("Directory to list"),
        ToolName::MoveFile => object(
            json!({
                "source": {"type": "string"},
                "destination": {"type": "string"}
            }),
            &["source", "destination"],
        ),
        ToolName::SearchFiles => object(
            json!({
                "path": {"type": "string", "description": "Directory to search from"},
                "pattern": {"type": "string", "description": "Case-insensitive name fragment"}
            }),
            &["path", "pattern"],
        ),
        ToolName::GetFileInfo => path_only("Path to inspect"),
        ToolName::SetFilePermissions => object(
            json!({
                "path": {"type": "string"},
                "permissions": {"type": "string", "description": "e.g. 755, or an icacls grant on Windows"},
                "recursive": {"type": "boolean"}
            }),
            &["path", "permissions"],
        ),
        ToolName::ChangeFileOwnership => object(
            json!({
                "path": {"type": "string"},
                "user": {"type": "string"},
                "group": {"type": "string"},
                "recursive": {"type": "boolean"}
            }),
            &["path"],
        ),
        ToolName::CreateSymbolicLink => object(
            json!({
                "target": {"type": "string"},
                "linkPath": {"type": "string"},
                "force": {"type": "boolean"}
            }),
            &["target", "linkPath"],
        ),
        ToolName::CheckPort => object(
            json!({
                "port": {"type": "integer", "minimum": 1, "maximum": 65535},
                "host": {"type": "string", "description": "Defaults to localhost"}
            }),
            &["port"],
        ),
        ToolName::ScanNetwork => object(
            json!({
                "network": {"type": "string", "description": "CIDR such as 192.168.1.0/24"},
                "ports": {
                    "type": "array",
                    "items": {"type": "integer", "minimum": 1, "maximum": 65535}
                }
            }),
            &["network"],
        ),
        ToolName::ListServices => filter_only("Case-insensitive name filter"),
        ToolName::ManageService => object(
            json!({
                "serviceName": {"type": "string"},
                "action": {
                    "type": "string",
                    "enum": ["start", "stop", "restart", "enable", "disable"]
                }
            }),
            &["serviceName", "action"],
        ),
        ToolName::CreateScheduledTask => object(
            json!({
                "name": {"type": "string"},
                "command": {"type": "string"},
                "schedule": {"type": "string", "description": "Cron expression"},
                "runAsAdmin": {"type": "boolean"}
            }),
            &["name", "command", "schedule"],
        ),
        ToolName::ListScheduledTasks => filter_only("Case-insensitive name or command filter"),
        ToolName::DeleteScheduledTask => object(
            json!({"name": {"type": "string"}}),
            &["name"],
        ),
        ToolName::SystemPowerAction => object(
            json!({
                "action": {
                    "type": "string",
                    "enum": ["shutdown", "reboot", "sleep", "hibernate"]
                },
                "delaySeconds": {"type": "integer", "minimum": 0},
                "force": {"type": "boolean"}
            }),
            &["action"],
        ),
        ToolName::RegistryOperation => object(
            json!({
                "action": {"type": "string", "enum": ["read", "write", "delete"]},
                "key": {"type": "string"},
                "value": {"type": "string"},
                "data": {"type": "string"},
                "type": {"type": "string", "enum": ["STRING", "DWORD", "BINARY"]}
            }),
            &["action", "key"],
        ),
        ToolName::VerifyUnlockCode => object(
            json!({"code": {"type": "string", "description": "Six-digit code"}}),
            &["code"],
        ),
        ToolName::ListProcesses
        | ToolName::ListBlockedCommands
        | ToolName::ListAllowedDirectories
        | ToolName::GetSystemInfo
        | ToolName::GetNetworkInfo
        | ToolName::RequestUnlockCode
        | ToolName::UnlockStatus => empty(),
    }
}
