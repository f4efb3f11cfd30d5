//! Player protocol core implementation
//!
//! This module provides the wire format, message header, XDR codec and the
//! framing guard used by every device interface.

mod error;
mod header;
mod payload;
mod types;
mod xdr;

pub mod geom;

pub use error::{Error, Result};
pub use header::{DeviceAddress, MessageHeader};
pub use payload::BodyReader;
pub use types::{Access, DataMode, MessageType};
pub use xdr::{XdrDecoder, XdrEncoder};

/// Message header size in bytes (all fields XDR-encoded)
pub const HEADER_SIZE: usize = 40;

/// Maximum payload size accepted from the server (8 MB)
pub const MAX_PAYLOAD_SIZE: usize = 8 * 1024 * 1024;

/// Size of the banner string the server sends on connect
pub const BANNER_SIZE: usize = 32;

/// Number of pad bytes required after an opaque field of `len` bytes
#[must_use]
pub const fn xdr_padding(len: usize) -> usize {
    match len % 4 {
        0 => 0,
        r => 4 - r,
    }
}
