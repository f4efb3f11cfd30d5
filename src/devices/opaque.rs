//! Opaque interface
//!
//! A raw byte pipe for user-defined driver protocols. Payloads are
//! length-prefixed opaque blobs in both directions.

use bytes::Bytes;

use crate::client::{Latch, Sender};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrEncoder,
};

use super::{Device, DeviceCore};

const DATA_STATE: u32 = 1;
const CMD_DATA: u32 = 2;
const REQ_DATA: u32 = 3;

/// Opaque device interface
pub struct Opaque {
    core: DeviceCore,
    data: Latch<Bytes>,
}

impl Opaque {
    /// Interface code
    pub const CODE: u16 = 51;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("opaque", address, sender),
            data: Latch::new(),
        }
    }

    fn encode_blob(data: &[u8]) -> Bytes {
        let mut enc = XdrEncoder::with_capacity(8 + data.len());
        enc.array_len(data.len() as u32);
        enc.opaque(data);
        enc.into_bytes()
    }

    fn decode_blob(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        self.core.touch(header);
        let count = body.read_array_prefix()? as usize;
        let data = body.read_buf(count)?;
        body.skip_padding(count)?;
        self.data.publish(data);
        Ok(())
    }

    /// Send user-defined bytes as a command
    pub fn command(&self, data: &[u8]) -> Result<()> {
        self.core.command(CMD_DATA, &Self::encode_blob(data))
    }

    /// Send user-defined bytes as a request; the reply lands in
    /// [`Opaque::data`]
    pub fn request(&self, data: &[u8]) -> Result<()> {
        self.core.request(REQ_DATA, &Self::encode_blob(data))
    }

    /// Most recent received blob
    #[must_use]
    pub fn data(&self) -> Option<Bytes> {
        self.data.get()
    }

    /// Edge-triggered: has a new blob arrived since the last call?
    #[must_use]
    pub fn is_data_ready(&self) -> bool {
        self.data.take_ready()
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for Opaque {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => self.decode_blob(header, body),
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_DATA => self.decode_blob(header, body),
            _ => self.core.skip_unknown(header, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::test_support::{capture_sender, data_header, feed, null_sender, take_sent};
    use crate::protocol::{MessageType, xdr_padding};

    #[test]
    fn blob_roundtrip_with_padding() {
        let (sender, rx) = capture_sender();
        let tx_iface = Opaque::new(DeviceAddress::new(Opaque::CODE, 0), sender);

        let blob = b"seven b";
        tx_iface.command(blob).unwrap();

        let (header, body) = take_sent(&rx);
        assert_eq!(header.msg_type(), MessageType::Command);
        assert_eq!(body.len(), 8 + blob.len() + xdr_padding(blob.len()));

        // decode the identical bytes on the receiving half
        let rx_iface = Opaque::new(DeviceAddress::new(Opaque::CODE, 0), null_sender());
        feed(
            &rx_iface,
            &data_header(Opaque::CODE, DATA_STATE, body.len()),
            &body,
        )
        .unwrap();

        assert!(rx_iface.is_data_ready());
        assert_eq!(rx_iface.data().unwrap().as_ref(), blob);
    }

    #[test]
    fn consecutive_odd_blobs_stay_framed() {
        let iface = Opaque::new(DeviceAddress::new(Opaque::CODE, 0), null_sender());

        for blob in [&b"abc"[..], &b"defgh"[..]] {
            let payload = Opaque::encode_blob(blob);
            feed(
                &iface,
                &data_header(Opaque::CODE, DATA_STATE, payload.len()),
                &payload,
            )
            .unwrap();
            assert_eq!(iface.data().unwrap().as_ref(), blob);
        }
    }
}
