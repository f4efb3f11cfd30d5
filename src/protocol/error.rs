//! Player protocol error types

use thiserror::Error;

use super::DeviceAddress;

/// Player protocol errors
///
/// Transport and framing errors are fatal: once one is returned the byte
/// stream position can no longer be trusted and the caller must reconnect.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream ended inside a fixed-size header read
    #[error("truncated message header: need {needed} bytes, got {got}")]
    ShortHeader {
        /// Bytes required
        needed: usize,
        /// Bytes available
        got: usize,
    },

    /// Header carried a message type outside the protocol enumeration
    #[error("invalid message type: {type_word:#x}")]
    InvalidMessageType {
        /// Raw type word from the header
        type_word: u32,
    },

    /// Header declared a payload larger than the protocol allows
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Declared payload size
        size: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Decode buffer exhausted mid-field
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Bytes required
        needed: usize,
        /// Bytes available
        got: usize,
    },

    /// A decode routine tried to read past the header's declared size
    #[error("body overrun: requested {requested} bytes with {remaining} left of a {size}-byte body")]
    BodyOverrun {
        /// Bytes requested
        requested: usize,
        /// Bytes left in the body
        remaining: usize,
        /// Declared body size
        size: usize,
    },

    /// A decode routine finished without consuming the whole body
    #[error("trailing bytes: {remaining} of a {size}-byte body left unconsumed")]
    TrailingBytes {
        /// Bytes left unread
        remaining: usize,
        /// Declared body size
        size: usize,
    },

    /// An embedded length field disagreed with its XDR array-length prefix
    #[error("length fields disagree: declared {declared}, array prefix {prefix}")]
    CountMismatch {
        /// Logical count field
        declared: u32,
        /// XDR array-length prefix
        prefix: u32,
    },

    /// Message addressed to a device no interface is registered for
    #[error("no interface registered for device {address}")]
    UnknownDevice {
        /// Address from the offending header
        address: DeviceAddress,
    },

    /// Server greeting was missing or malformed
    #[error("server handshake failed: {reason}")]
    Handshake {
        /// Human-readable cause
        reason: String,
    },

    /// Server refused or downgraded a device subscription
    #[error("subscription to {address} refused (granted access {granted:#x})")]
    SubscriptionRefused {
        /// Address we asked for
        address: DeviceAddress,
        /// Access level the server granted instead
        granted: u8,
    },

    /// Invalid UTF-8 in a wire string
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
