//! Errors reported by the (non-realtime) initialization steps.
//!
//! Nothing in the per-sample path returns an error: out-of-range input is
//! clamped instead. Only buffer sizing, which happens once per session, can
//! fail.

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The allocator refused to size a backing buffer.
    AllocationFailed { requested: usize },
    /// A buffered stage was configured with zero capacity.
    InvalidCapacity,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AllocationFailed { requested } => {
                write!(f, "failed to allocate delay buffer of {} samples", requested)
            }
            Error::InvalidCapacity => write!(f, "delay capacity must be at least 2 samples"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_requested_size() {
        let err = Error::AllocationFailed { requested: 44_100 };
        assert_eq!(
            err.to_string(),
            "failed to allocate delay buffer of 44100 samples"
        );
    }
}
