//! Notify error types

use thiserror::Error;

const EINVAL: isize = 22;
const EEXIST: isize = 17;
const ENOMEM: isize = 12;
const ENODEV: isize = 19;
const E2BIG: isize = 7;
const EACCES: isize = 13;

/// Errors reported by the notify policy engines and the attribute surface
///
/// Every error is reported synchronously to the caller and leaves the
/// previously accepted state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// Input exceeds the per-attribute maximum, rejected before parsing
    #[error("Input too long: {len} bytes (max: {max})")]
    InputTooLong { len: usize, max: usize },

    /// Unrecognized command token
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Recognized command that is a no-op against the current state
    ///
    /// The command text has still been persisted.
    #[error("Command already applied: {0}")]
    RedundantCommand(String),

    /// Malformed token (hex id, class name, number)
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// Backing buffer could not be obtained
    #[error("Backing storage unavailable")]
    AllocationFailure,

    /// Operation on a device that is not (or no longer) registered
    #[error("No such notify device: {0}")]
    NullDevice(String),

    /// A device with this name is already registered
    #[error("Notify device already registered: {0}")]
    DuplicateDevice(String),

    /// Attribute not exposed for this operation
    #[error("Unsupported attribute operation: {0}")]
    Unsupported(String),

    /// Uevent environment does not start with TYPE and STATE
    #[error("Invalid uevent environment: {0}")]
    InvalidUevent(String),
}

impl NotifyError {
    /// Negative errno reported on the attribute surface
    pub fn errno(&self) -> isize {
        match self {
            Self::InputTooLong { .. } => -E2BIG,
            Self::InvalidCommand(_) | Self::ParseFailure(_) | Self::InvalidUevent(_) => -EINVAL,
            Self::RedundantCommand(_) | Self::DuplicateDevice(_) => -EEXIST,
            Self::AllocationFailure => -ENOMEM,
            Self::NullDevice(_) => -ENODEV,
            Self::Unsupported(_) => -EACCES,
        }
    }
}

/// Type alias for notify results
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Collapse a write result into the attribute convention:
/// bytes consumed on success, negative errno on failure
pub fn attribute_status(result: &Result<usize>) -> isize {
    match result {
        Ok(consumed) => *consumed as isize,
        Err(e) => e.errno(),
    }
}
