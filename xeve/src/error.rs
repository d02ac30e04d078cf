//! Error types for the encoder binding.

use crate::status::ReturnCode;

/// Errors that can occur while configuring, feeding or tearing down an
/// encoder, or while splitting its output.
#[derive(Debug, thiserror::Error)]
pub enum XeveError {
    /// The engine returned no handle for the requested resource.
    #[error("Failed to allocate native {0}")]
    AllocationFailed(&'static str),

    /// The handle has already been released.
    #[error("Native {0} handle is closed")]
    HandleClosed(&'static str),

    /// `flush` was called more than once on the same encoder.
    #[error("Encoder has already been flushed")]
    AlreadyFlushed,

    /// A frame was submitted after `flush`.
    #[error("Encoder is draining (flushed), no more frames can be submitted")]
    Draining,

    /// The engine refused the pushed picture. The frame was not submitted.
    #[error("Engine rejected pushed picture: {0}")]
    PushRejected(ReturnCode),

    /// A native call other than push returned a failure status.
    #[error("Native call '{op}' failed: {code}")]
    Native { op: &'static str, code: ReturnCode },

    /// Length-prefixed NAL framing is violated.
    #[error("Malformed bitstream at offset {offset}: {reason}")]
    MalformedBitstream { offset: usize, reason: String },

    /// Picture planes do not match the configured geometry.
    #[error("Invalid picture: {0}")]
    InvalidPicture(String),
}

impl XeveError {
    pub(crate) fn native(op: &'static str, code: ReturnCode) -> Self {
        XeveError::Native { op, code }
    }

    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        XeveError::MalformedBitstream {
            offset,
            reason: reason.into(),
        }
    }

    /// Whether the error is a usage error on a released or drained handle.
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            XeveError::HandleClosed(_) | XeveError::AlreadyFlushed | XeveError::Draining
        )
    }
}
