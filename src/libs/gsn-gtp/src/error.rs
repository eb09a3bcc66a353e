//! GTP Echo codec error types

use thiserror::Error;

/// GTP Echo codec error type
///
/// Every variant is a local, recoverable condition: the offending datagram
/// is dropped and the receive loop keeps going. None of these may take the
/// process down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GtpError {
    /// Buffer too short to carry even the fixed flags/type octets
    #[error("Buffer too short: need {needed} bytes, have {available}")]
    BufferTooShort { needed: usize, available: usize },

    /// GTPv1 datagram whose size does not match the v1 echo layout
    #[error("Malformed packet: GTPv1 echo must be 12 bytes, got {0}")]
    MalformedPacket(usize),

    /// GTPv2 datagram whose size matches neither v2 echo layout
    #[error("Unsupported length for GTPv2 echo: {0}")]
    UnsupportedLength(usize),

    /// Version bits not 1 or 2
    #[error("Unsupported GTP version: {0}")]
    UnsupportedVersion(u8),
}

/// GTP Result type
pub type GtpResult<T> = Result<T, GtpError>;
