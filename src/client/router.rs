//! Dispatch router
//!
//! Owns the read half of the connection and runs the two-state framing
//! machine: read one 40-byte header, then hand a [`BodyReader`] scoped to
//! `header.size` to the interface registered for the header's device
//! address. A new header is never read before the previous body has been
//! consumed down to the last pad byte.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::devices::Device;
use crate::protocol::{BodyReader, DeviceAddress, Error, MessageHeader, MessageType, Result};

/// What one router cycle did with the incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A DATA message was decoded by the addressed interface
    Data(DeviceAddress),
    /// An ACK response was decoded by the addressed interface
    Response(DeviceAddress),
    /// End-of-cycle marker (pull data mode)
    Synch,
    /// Body drained without decoding (NACK/ERR or unexpected type)
    Drained(DeviceAddress),
}

/// Header-dispatch loop over a blocking byte stream.
pub struct Router<R: Read> {
    stream: R,
    devices: HashMap<(u16, u16), Arc<dyn Device>>,
}

impl<R: Read> Router<R> {
    /// Wrap a connected stream positioned at the first message header
    pub fn new(stream: R) -> Self {
        Self {
            stream,
            devices: HashMap::new(),
        }
    }

    /// Register an interface under its (interface code, index) key.
    ///
    /// A later registration for the same key replaces the earlier one.
    pub fn register(&mut self, device: Arc<dyn Device>) {
        self.devices.insert(device.address().key(), device);
    }

    /// Read and dispatch exactly one message.
    ///
    /// Unknown device addresses are handled in degraded mode: the body is
    /// skipped using the header's declared size (the only thing still
    /// trusted), then [`Error::UnknownDevice`] is surfaced. The stream
    /// stays aligned, so the caller may keep reading.
    pub fn read_message(&mut self) -> Result<Dispatch> {
        let header = MessageHeader::read_from(&mut self.stream)?;
        let address = header.address();
        trace!(%address, msg_type = %header.msg_type(), subtype = header.subtype(),
               size = header.size(), "header");

        let mut body = BodyReader::new(&mut self.stream, header.size() as usize);

        if header.msg_type() == MessageType::Synch {
            body.drain()?;
            body.finish()?;
            return Ok(Dispatch::Synch);
        }

        let Some(device) = self.devices.get(&address.key()).cloned() else {
            body.drain()?;
            body.finish()?;
            return Err(Error::UnknownDevice { address });
        };

        match header.msg_type() {
            MessageType::Data => {
                device.on_data(&header, &mut body)?;
                body.finish()?;
                Ok(Dispatch::Data(address))
            }
            MessageType::ResponseAck => {
                device.on_response(&header, &mut body)?;
                body.finish()?;
                Ok(Dispatch::Response(address))
            }
            MessageType::ResponseNack | MessageType::ResponseError => {
                warn!(%address, subtype = header.subtype(), msg_type = %header.msg_type(),
                      "request rejected by server");
                body.drain()?;
                body.finish()?;
                Ok(Dispatch::Drained(address))
            }
            MessageType::Command | MessageType::Request => {
                // client-bound stream should not carry these
                debug!(%address, msg_type = %header.msg_type(), "unexpected client-bound type");
                body.drain()?;
                body.finish()?;
                Ok(Dispatch::Drained(address))
            }
            MessageType::Synch => unreachable!("handled above"),
        }
    }

    /// Dispatch messages until a SYNCH marker arrives (one pull cycle)
    pub fn read_until_synch(&mut self) -> Result<()> {
        loop {
            if self.read_message()? == Dispatch::Synch {
                return Ok(());
            }
        }
    }

    /// Dispatch messages until the first fatal error
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.read_message()?;
        }
    }
}
