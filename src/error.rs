//! Error taxonomy for the simulation core
//!
//! Collision against malformed geometry is not an error: it simply reports no contact.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Requested level number has no definition; the current level stays loaded
    LevelNotFound { number: u32 },
    /// A level definition could not be turned into bricks
    InvalidLevel { number: u32, reason: String },
    /// Persistence read/write failed
    Storage { key: String, reason: String },
    /// Configuration is malformed or out of range
    Config(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LevelNotFound { number } => write!(f, "level {number} not found"),
            Self::InvalidLevel { number, reason } => {
                write!(f, "level {number} has an invalid layout: {reason}")
            }
            Self::Storage { key, reason } => write!(f, "storage failure for '{key}': {reason}"),
            Self::Config(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for SimError {}
