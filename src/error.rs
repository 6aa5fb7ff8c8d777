//! Link-level errors and host-facing status codes.
//!
//! Construction-time and decode-time failures surface as [`LinkError`].
//! Runtime conditions a running link absorbs internally — corrupt
//! frames, ACK timeouts, retry exhaustion, queue-full — are represented
//! only as a [`StatusCode`] transition, never as a returned `Err`.

use thiserror::Error;

/// Construction-time and decode-time failures. Runtime failures that
/// are absorbed internally (CRC mismatch, ACK timeout, retry
/// exhaustion, queue-full) are intentionally *not* variants here; they
/// are represented purely by [`StatusCode`].
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("RF transport failed to initialize")]
    RfInitFailed,

    #[error("frame too short to decode: {len} bytes (minimum 10)")]
    MalformedFrame { len: usize },
}

/// Status codes reported by `status()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StatusCode {
    Success = 1,
    UnspecifiedError = 2,
    RfInitFailed = 3,
    TxDelivered = 4,
    TxFailed = 5,
    BadBufSize = 6,
    BadAddress = 7,
    BadMacAddress = 8,
    IllegalArgument = 9,
    InsufficientBufferSpace = 10,
}

impl StatusCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
