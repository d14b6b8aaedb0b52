use core::fmt;

/// Errors of the dynamic macro engine.
///
/// Conditions that are part of normal operation, like an unmapped macro id,
/// a full active key set or a truncated macro program, are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroError {
    /// The reserved region doesn't fit into the storage
    StorageOutOfRange { base: u32, size: u16, capacity: usize },
    /// An access past the end of the reserved region
    OutOfBounds { offset: u16, len: usize },
    /// The storage driver failed
    Storage,
    /// A write didn't provide exactly one byte for every byte of the region
    SizeMismatch { expected: u16, actual: usize },
    /// An argument on the configuration channel isn't a valid number
    InvalidArgument { index: usize },
    /// A required argument on the configuration channel is missing
    MissingArgument,
}

impl fmt::Display for MacroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroError::StorageOutOfRange { base, size, capacity } => write!(
                f,
                "macro region {}+{} exceeds storage capacity {}",
                base, size, capacity
            ),
            MacroError::OutOfBounds { offset, len } => {
                write!(f, "access of {} bytes at {} is out of bounds", len, offset)
            }
            MacroError::Storage => write!(f, "storage error"),
            MacroError::SizeMismatch { expected, actual } => {
                write!(f, "expected {} bytes, got {}", expected, actual)
            }
            MacroError::InvalidArgument { index } => write!(f, "invalid argument #{}", index),
            MacroError::MissingArgument => write!(f, "missing argument"),
        }
    }
}
