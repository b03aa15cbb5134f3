//! Structured OS capability layer.
//!
//! Each submodule wraps one family of platform utilities. Programs are
//! invoked with argv through a [`CommandRunner`] rather than through a shell,
//! so arguments never need quoting. Functions that only build command lines
//! are kept pure so they can be tested without touching the host.

pub mod filesystem;
pub mod network;
pub mod permissions;
pub mod power;
pub mod process;
pub mod registry;
pub mod services;
pub mod system;
pub mod tasks;

use std::time::Duration;
use udc_executor::{CommandOutput, CommandRunner, ExecutorError};

/// OS capability error types
#[derive(Debug, thiserror::Error)]
pub enum OsError {
    #[error("Invalid argument '{field}': {message}")]
    InvalidArgument { field: String, message: String },

    #[error("{0}")]
    OperationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl OsError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        OsError::InvalidArgument {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type OsResult<T> = Result<T, OsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    OtherUnix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::OtherUnix
        }
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }
}

/// A program and its arguments, ready to hand to a runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Everything a capability needs to run programs on the host.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    pub runner: &'a dyn CommandRunner,
    pub platform: Platform,
    pub timeout: Duration,
}

impl<'a> Host<'a> {
    pub fn new(runner: &'a dyn CommandRunner, platform: Platform, timeout: Duration) -> Self {
        Self {
            runner,
            platform,
            timeout,
        }
    }

    pub async fn run(&self, invocation: &Invocation) -> OsResult<CommandOutput> {
        Ok(self
            .runner
            .run_program(&invocation.program, &invocation.args, self.timeout)
            .await?)
    }

    /// Runs the invocation and turns a non-zero exit into an error.
    pub async fn run_checked(&self, invocation: &Invocation) -> OsResult<CommandOutput> {
        let output = self.run(invocation).await?;
        if !output.success() {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim()
            } else {
                output.stderr.trim()
            };
            return Err(OsError::OperationFailed(format!(
                "{} exited with code {}: {}",
                invocation.program, output.exit_code, detail
            )));
        }
        Ok(output)
    }

    /// Runs a diagnostic command whose failure is logged, not reported.
    pub async fn run_best_effort(&self, invocation: &Invocation) -> Option<String> {
        match self.run_checked(invocation).await {
            Ok(output) => Some(output.stdout),
            Err(e) => {
                tracing::warn!("{} failed: {}", invocation.program, e);
                None
            }
        }
    }
}
