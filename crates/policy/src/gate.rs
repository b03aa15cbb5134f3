//! Time-boxed, one-time-code unlock gate for high-risk tools.
//!
//! The gate starts locked. An operator obtains a six-digit code through a
//! private file on the host (`issue_code`), hands it back through
//! `redeem`, and high-risk tools are then authorized for the unlock window.
//! Expiry is evaluated lazily: every call that consults the gate first
//! re-locks it if the window has elapsed. There is no background timer.

use crate::risk::RiskClassifier;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

pub const DEFAULT_UNLOCK_MINUTES: i64 = 15;

const CODE_FILE_NAME: &str = ".udc_gate_code";

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Failed to write unlock code to {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Gate is already unlocked until {expires_at}")]
    AlreadyUnlocked { expires_at: DateTime<Utc> },
}

/// Source of the current time. Swapped out in tests to drive expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateStatus {
    Locked { code_pending: bool },
    Unlocked { expires_at: DateTime<Utc> },
}

/// A freshly issued code and where it was written.
pub struct IssuedCode {
    code: Zeroizing<String>,
    destination: PathBuf,
}

impl IssuedCode {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

impl fmt::Debug for IssuedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCode")
            .field("code", &"******")
            .field("destination", &self.destination)
            .finish()
    }
}

// A pending code and an active unlock cannot coexist.
enum GateState {
    Locked { pending: Option<Zeroizing<String>> },
    Unlocked { expires_at: DateTime<Utc> },
}

pub struct UnlockGate {
    state: Mutex<GateState>,
    classifier: RiskClassifier,
    code_file: PathBuf,
    unlock_window: Duration,
    clock: Arc<dyn Clock>,
}

impl UnlockGate {
    pub fn new(code_file: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(GateState::Locked { pending: None }),
            classifier: RiskClassifier::new(),
            code_file: code_file.into(),
            unlock_window: Duration::minutes(DEFAULT_UNLOCK_MINUTES),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_unlock_window(mut self, window: Duration) -> Self {
        self.unlock_window = window;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// `~/.udc_gate_code`, or the temp dir when no home directory is set.
    pub fn default_code_file() -> PathBuf {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join(CODE_FILE_NAME)
    }

    pub fn code_file(&self) -> &Path {
        &self.code_file
    }

    pub fn is_authorized(&self, tool_name: &str) -> bool {
        if !self.classifier.is_high_risk(tool_name) {
            return true;
        }

        let now = self.clock.now();
        let mut state = self.state.lock();
        Self::relock_if_expired(&mut state, now);
        matches!(*state, GateState::Unlocked { .. })
    }

    /// Generates a new code, replacing any pending one.
    pub fn issue_code(&self) -> Result<IssuedCode, GateError> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        Self::relock_if_expired(&mut state, now);

        if let GateState::Unlocked { expires_at } = *state {
            return Err(GateError::AlreadyUnlocked { expires_at });
        }

        let code = Zeroizing::new(generate_code());
        write_code_file(&self.code_file, &code).map_err(|source| GateError::Artifact {
            path: self.code_file.clone(),
            source,
        })?;

        *state = GateState::Locked {
            pending: Some(code.clone()),
        };
        info!(destination = %self.code_file.display(), "Unlock code issued");

        Ok(IssuedCode {
            code,
            destination: self.code_file.clone(),
        })
    }

    /// Redeems the pending code. Failed attempts leave the code in place.
    pub fn redeem(&self, candidate: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();
        Self::relock_if_expired(&mut state, now);

        let matched = match &*state {
            GateState::Locked { pending: Some(code) } => code.as_str() == candidate,
            _ => false,
        };

        if !matched {
            debug!("Unlock code rejected");
            return false;
        }

        let expires_at = now + self.unlock_window;
        *state = GateState::Unlocked { expires_at };
        remove_code_file(&self.code_file);
        info!(%expires_at, "Gate unlocked");
        true
    }

    pub fn status(&self) -> GateStatus {
        let now = self.clock.now();
        let mut state = self.state.lock();
        Self::relock_if_expired(&mut state, now);

        match &*state {
            GateState::Locked { pending } => GateStatus::Locked {
                code_pending: pending.is_some(),
            },
            GateState::Unlocked { expires_at } => GateStatus::Unlocked {
                expires_at: *expires_at,
            },
        }
    }

    fn relock_if_expired(state: &mut GateState, now: DateTime<Utc>) {
        if let GateState::Unlocked { expires_at } = *state {
            if now >= expires_at {
                *state = GateState::Locked { pending: None };
                info!("Unlock window elapsed, gate locked");
            }
        }
    }
}

fn generate_code() -> String {
    OsRng.gen_range(100_000u32..1_000_000).to_string()
}

fn write_code_file(path: &Path, code: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // mode() only applies when the file is created
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    let message = Zeroizing::new(format!(
        "UDC OPERATOR CODE: {code}\n\n\
         This code was requested to unlock High-Risk tools.\n\
         If you did not request this, check your system security.\n"
    ));
    file.write_all(message.as_bytes())?;
    file.sync_all()
}

fn remove_code_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove unlock code file: {e}"),
    }
}
