//! Infrared ranger interface
//!
//! Each data message carries two parallel variable arrays: raw voltages
//! and derived ranges, each with its own dual count prefix.

use crate::client::{Latch, Sender};
use crate::protocol::{BodyReader, DeviceAddress, MessageHeader, Result};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_RANGES: u32 = 1;

/// One IR scan
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IrData {
    /// Raw sensor voltages [V]
    pub voltages: Vec<f32>,
    /// Derived ranges [m]
    pub ranges: Vec<f32>,
}

/// Infrared ranger device interface
pub struct Ir {
    core: DeviceCore,
    data: Latch<IrData>,
}

impl Ir {
    /// Interface code
    pub const CODE: u16 = 22;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("ir", address, sender),
            data: Latch::new(),
        }
    }

    /// Most recent scan
    #[must_use]
    pub fn data(&self) -> Option<IrData> {
        self.data.get()
    }

    /// Edge-triggered: has a new scan arrived since the last call?
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

impl Device for Ir {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_RANGES => {
                self.core.touch(header);
                let voltage_count = body.read_array_prefix()? as usize;
                let voltages = body.read_elements(voltage_count, 4, |dec| dec.f32())?;
                let range_count = body.read_array_prefix()? as usize;
                let ranges = body.read_elements(range_count, 4, |dec| dec.f32())?;
                self.data.publish(IrData { voltages, ranges });
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
    fn two_parallel_arrays_decode() {
        let iface = Ir::new(DeviceAddress::new(Ir::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        enc.array_len(3);
        for v in [1.1f32, 1.2, 1.3] {
            enc.f32(v);
        }
        enc.array_len(3);
        for r in [0.3f32, 0.6, 0.9] {
            enc.f32(r);
        }
        let payload = enc.into_bytes();
        assert_eq!(payload.len(), 8 + 12 + 8 + 12);

        feed(
            &iface,
            &data_header(Ir::CODE, DATA_RANGES, payload.len()),
            &payload,
        )
        .unwrap();

        let data = iface.data().unwrap();
        assert_eq!(data.voltages[2], 1.3);
        assert_eq!(data.ranges[0], 0.3);
    }
}
