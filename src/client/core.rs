//! The `player` meta-device
//!
//! Interface code 1 on every server. Carries device subscriptions, data
//! mode switches and pull-mode data requests. It is registered with the
//! router like any other interface; subscription replies land in a latch
//! the [`Client`](super::Client) facade polls while it drives the read
//! loop.

use crate::devices::{Device, DeviceCore};
use crate::protocol::{
    Access, BodyReader, DataMode, DeviceAddress, MessageHeader, Result, XdrDecoder, XdrEncoder,
};

use super::{Latch, Sender};

/// Interface code of the meta-device
pub(crate) const CODE: u16 = 1;

const REQ_DEV: u32 = 1;
const REQ_DATA: u32 = 2;
const REQ_DATAMODE: u32 = 3;

/// Decoded reply to a device subscription request
#[derive(Debug, Clone)]
pub(crate) struct DeviceReply {
    /// Full address the server assigned
    pub address: DeviceAddress,
    /// Access level actually granted
    pub access: u8,
    /// Name of the driver backing the device
    pub driver_name: String,
}

pub(crate) struct CoreInterface {
    core: DeviceCore,
    reply: Latch<DeviceReply>,
}

impl CoreInterface {
    pub(crate) fn new(sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("player", DeviceAddress::new(CODE, 0), sender),
            reply: Latch::new(),
        }
    }

    /// Ask the server for access to a device
    pub(crate) fn request_device(&self, address: DeviceAddress, access: Access) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(28);
        address.encode(&mut enc);
        enc.byte(access.as_u8());
        enc.array_len(0); // no driver name constraint
        self.core.request(REQ_DEV, &enc.into_bytes())
    }

    /// Switch the server's data delivery mode
    pub(crate) fn set_data_mode(&self, mode: DataMode) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.u32(mode.as_u32());
        self.core.request(REQ_DATAMODE, &enc.into_bytes())
    }

    /// Request one data cycle (pull mode)
    pub(crate) fn request_data(&self) -> Result<()> {
        self.core.request(REQ_DATA, &[])
    }

    pub(crate) fn take_reply_ready(&self) -> bool {
        self.reply.take_ready()
    }

    pub(crate) fn reply(&self) -> Option<DeviceReply> {
        self.reply.get()
    }
}

impl Device for CoreInterface {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        self.core.skip_unknown(header, body)
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_DEV => {
                self.core.touch(header);

                // addr, access, name_count, array prefix
                let buf = body.read_buf(28)?;
                let mut dec = XdrDecoder::new(&buf);
                let address = DeviceAddress::decode(&mut dec)?;
                let access = dec.byte()?;
                let name_count = dec.u32()? as usize;
                let _prefix = dec.u32()?;

                let raw = body.read_buf(name_count)?;
                body.skip_padding(name_count)?;
                let driver_name = String::from_utf8(raw.to_vec())?;

                self.reply.publish(DeviceReply {
                    address,
                    access,
                    driver_name,
                });
                Ok(())
            }
            REQ_DATA | REQ_DATAMODE => {
                // null responses
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }
}
