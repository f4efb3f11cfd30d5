//! Shared message writer
//!
//! Command and request senders may run on any thread while the router
//! thread blocks on reads, so the write half of the connection sits behind
//! one mutex. A message is encoded to a buffer first; the header's declared
//! size therefore always equals the bytes written.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use crate::protocol::{DeviceAddress, MessageHeader, MessageType, Result};

/// Cloneable handle to the connection's write half.
#[derive(Clone)]
pub struct Sender {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Sender {
    pub(crate) fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Write header + body and flush.
    ///
    /// Any I/O failure is fatal and propagated; a partially written message
    /// cannot be retried safely (at-most-once send semantics).
    pub(crate) fn send(
        &self,
        address: DeviceAddress,
        msg_type: MessageType,
        subtype: u32,
        body: &[u8],
    ) -> Result<()> {
        let header = MessageHeader::new(address, msg_type, subtype, body.len() as u32);
        trace!(%address, %msg_type, subtype, size = body.len(), "send");

        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&header.to_bytes())?;
        if !body.is_empty() {
            writer.write_all(body)?;
        }
        writer.flush()?;
        Ok(())
    }
}
