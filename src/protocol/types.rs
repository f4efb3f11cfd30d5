//! Player message types and protocol enumerations

use std::fmt;

/// Player message types
///
/// Every header carries one of these in its type word. Responses other than
/// [`MessageType::ResponseAck`] still occupy `size` bytes on the wire and
/// must be drained even though their bodies are not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    /// Periodic device data published by the server
    Data = 1,
    /// Command sent to a device (no reply expected)
    Command = 2,
    /// Request sent to a device (reply expected)
    Request = 3,
    /// Positive reply to a request
    ResponseAck = 4,
    /// End-of-cycle marker in pull data mode
    Synch = 5,
    /// Negative reply to a request
    ResponseNack = 6,
    /// Error reply to a request
    ResponseError = 7,
}

impl MessageType {
    /// Convert from the header's type word
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Data),
            2 => Some(Self::Command),
            3 => Some(Self::Request),
            4 => Some(Self::ResponseAck),
            5 => Some(Self::Synch),
            6 => Some(Self::ResponseNack),
            7 => Some(Self::ResponseError),
            _ => None,
        }
    }

    /// Convert to the header's type word
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Check if this type is any kind of reply
    #[must_use]
    pub const fn is_response(self) -> bool {
        matches!(
            self,
            Self::ResponseAck | Self::ResponseNack | Self::ResponseError
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Data => "DATA",
            Self::Command => "CMD",
            Self::Request => "REQ",
            Self::ResponseAck => "RESP_ACK",
            Self::Synch => "SYNCH",
            Self::ResponseNack => "RESP_NACK",
            Self::ResponseError => "RESP_ERR",
        };
        write!(f, "{name}")
    }
}

/// Access level requested when subscribing to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Access {
    /// Receive data only
    Read = 1,
    /// Send commands only
    Write = 2,
    /// Full access
    All = 3,
    /// Unsubscribe
    Close = 4,
}

impl Access {
    /// Convert to the wire byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Server data delivery mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DataMode {
    /// Server pushes data as soon as it is produced
    Push = 1,
    /// Client requests each data cycle explicitly
    Pull = 2,
}

impl DataMode {
    /// Convert to the wire word
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}
