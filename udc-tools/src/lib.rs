pub mod call;
pub mod catalog;
pub mod chain;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod execution_context;
pub mod handler;
pub mod os_capabilities;
pub mod registry;
pub mod sandbox;
pub mod schema;

pub use call::{ToolCall, ToolName};
pub use chain::{ChainExecutor, ChainResult, DEFAULT_STEP_TIMEOUT};
pub use dispatcher::{Dispatcher, DEFAULT_TIMEOUT_MS};
pub use envelope::Envelope;
pub use error::{FieldIssue, ToolError};
pub use execution_context::ExecutionContext;
pub use handler::{SystemHandler, ToolHandler};
pub use registry::{ToolRegistry, ToolSpec};
pub use sandbox::PathGuard;
