//! Health interface
//!
//! CPU and memory statistics of the machine running the server.

use crate::client::{Latch, Sender};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;

/// CPU load split
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HealthCpu {
    /// Idle fraction [%]
    pub idle: f32,
    /// System fraction [%]
    pub system: f32,
    /// User fraction [%]
    pub user: f32,
}

/// Memory usage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HealthMemory {
    /// Total [bytes]
    pub total: i64,
    /// Used [bytes]
    pub used: i64,
    /// Free [bytes]
    pub free: i64,
}

impl HealthMemory {
    fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            total: dec.i64()?,
            used: dec.i64()?,
            free: dec.i64()?,
        })
    }
}

/// One health sample
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HealthData {
    /// CPU load
    pub cpu: HealthCpu,
    /// Main memory
    pub mem: HealthMemory,
    /// Swap space
    pub swap: HealthMemory,
}

/// Health device interface
pub struct Health {
    core: DeviceCore,
    data: Latch<HealthData>,
}

impl Health {
    /// Interface code
    pub const CODE: u16 = 59;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("health", address, sender),
            data: Latch::new(),
        }
    }

    /// Most recent health sample
    #[must_use]
    pub fn data(&self) -> Option<HealthData> {
        self.data.get()
    }

    /// Edge-triggered: has a new sample arrived since the last call?
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

impl Device for Health {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let buf = body.read_buf(60)?;
                let mut dec = XdrDecoder::new(&buf);
                self.data.publish(HealthData {
                    cpu: HealthCpu {
                        idle: dec.f32()?,
                        system: dec.f32()?,
                        user: dec.f32()?,
                    },
                    mem: HealthMemory::decode(&mut dec)?,
                    swap: HealthMemory::decode(&mut dec)?,
                });
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        self.core.skip_unknown(header, body)
    }
}
