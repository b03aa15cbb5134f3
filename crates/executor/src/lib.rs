pub mod blocklist;
pub mod command_executor;
pub mod environment;

pub use blocklist::{CommandBlocklist, CommandPolicy, DEFAULT_BLOCKED_COMMANDS};
pub use command_executor::{CommandOutput, CommandRunner, ExecutorError, ShellRunner};
pub use environment::{DiskInfo, EnvironmentSnapshot, InterfaceInfo, ProcessInfo};
