pub mod gate;
pub mod risk;

pub use gate::{
    Clock, GateError, GateStatus, IssuedCode, SystemClock, UnlockGate, DEFAULT_UNLOCK_MINUTES,
};
pub use risk::{RiskClassifier, RiskTier, HIGH_RISK_TOOLS};
