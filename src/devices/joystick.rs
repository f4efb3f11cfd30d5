//! Joystick interface
//!
//! Read-only view of a joystick's axes and buttons.

use crate::client::{Latch, Sender};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;

/// Maximum number of axes carried in a data message
pub const MAX_AXES: usize = 8;

/// Joystick state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JoystickData {
    /// Raw axis positions
    pub pos: [i32; MAX_AXES],
    /// Axis scaling factors
    pub scale: [i32; MAX_AXES],
    /// Button bit mask
    pub buttons: u32,
    /// Number of axes actually populated
    pub axes_count: i32,
}

/// Joystick device interface
pub struct Joystick {
    core: DeviceCore,
    data: Latch<JoystickData>,
}

impl Joystick {
    /// Interface code
    pub const CODE: u16 = 49;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("joystick", address, sender),
            data: Latch::new(),
        }
    }

    /// Most recent joystick state
    #[must_use]
    pub fn data(&self) -> Option<JoystickData> {
        self.data.get()
    }

    /// Edge-triggered: has new state arrived since the last call?
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

impl Device for Joystick {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let buf = body.read_buf(72)?;
                let mut dec = XdrDecoder::new(&buf);
                let mut data = JoystickData::default();
                for slot in &mut data.pos {
                    *slot = dec.i32()?;
                }
                for slot in &mut data.scale {
                    *slot = dec.i32()?;
                }
                data.buttons = dec.u32()?;
                data.axes_count = dec.i32()?;
                self.data.publish(data);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        self.core.skip_unknown(header, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::test_support::{data_header, feed, null_sender};
    use crate::protocol::XdrEncoder;

    #[test]
    fn state_decode() {
        let iface = Joystick::new(DeviceAddress::new(Joystick::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        for i in 0..8 {
            enc.i32(i * 100);
        }
        for _ in 0..8 {
            enc.i32(1);
        }
        enc.u32(0b11);
        enc.i32(2);
        let payload = enc.into_bytes();
        assert_eq!(payload.len(), 72);

        feed(
            &iface,
            &data_header(Joystick::CODE, DATA_STATE, payload.len()),
            &payload,
        )
        .unwrap();

        let data = iface.data().unwrap();
        assert_eq!(data.pos[3], 300);
        assert_eq!(data.buttons, 0b11);
        assert_eq!(data.axes_count, 2);
    }
}
