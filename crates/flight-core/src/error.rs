//! Error types for configuration and session commands.
//!
//! The physics model and planner never fail: refused motions cost nothing and an
//! unreachable goal degrades to a direct path. Only the layers above them use these.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },
}

/// Reasons a session command was refused before reaching the physics model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("drone not in flight, take off first")]
    NotFlying,
    #[error("battery critical ({percentage:.1}%)")]
    BatteryCritical { percentage: f64 },
    #[error("no payload loaded")]
    NoPayload,
}
