//! Bumper interface
//!
//! Contact switch states as an opaque byte array (one byte per bumper
//! panel), plus panel geometry on request.

use bytes::Bytes;

use crate::client::{Latch, Sender};
use crate::protocol::geom::Pose3d;
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;
const DATA_GEOM: u32 = 2;

const REQ_GET_GEOM: u32 = 1;

/// Geometry of one bumper panel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BumperDefine {
    /// Panel pose in the robot frame
    pub pose: Pose3d,
    /// Panel length [m]
    pub length: f32,
    /// Panel curvature radius [m]
    pub radius: f32,
}

impl BumperDefine {
    /// Wire stride per panel
    pub const WIRE_SIZE: usize = 56;

    fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            pose: Pose3d::decode(dec)?,
            length: dec.f32()?,
            radius: dec.f32()?,
        })
    }
}

/// Bumper device interface
pub struct Bumper {
    core: DeviceCore,
    state: Latch<Bytes>,
    geom: Latch<Vec<BumperDefine>>,
}

impl Bumper {
    /// Interface code
    pub const CODE: u16 = 14;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("bumper", address, sender),
            state: Latch::new(),
            geom: Latch::new(),
        }
    }

    fn decode_geom(body: &mut BodyReader<'_>) -> Result<Vec<BumperDefine>> {
        let count = body.read_array_prefix()? as usize;
        body.read_elements(count, BumperDefine::WIRE_SIZE, BumperDefine::decode)
    }

    /// Request the panel geometry; the reply lands in [`Bumper::geom`]
    pub fn query_geometry(&self) -> Result<()> {
        self.core.request(REQ_GET_GEOM, &[])
    }

    /// Most recent panel states (non-zero = pressed)
    #[must_use]
    pub fn state(&self) -> Option<Bytes> {
        self.state.get()
    }

    /// Edge-triggered: has a new state arrived since the last call?
    #[must_use]
    pub fn is_state_ready(&self) -> bool {
        self.state.take_ready()
    }

    /// Most recent panel geometry
    #[must_use]
    pub fn geom(&self) -> Option<Vec<BumperDefine>> {
        self.geom.get()
    }

    /// Edge-triggered readiness for the geometry slot
    #[must_use]
    pub fn is_geom_ready(&self) -> bool {
        self.geom.take_ready()
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for Bumper {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let count = body.read_array_prefix()? as usize;
                let state = body.read_buf(count)?;
                body.skip_padding(count)?;
                self.state.publish(state);
                Ok(())
            }
            DATA_GEOM => {
                self.core.touch(header);
                let geom = Self::decode_geom(body)?;
                self.geom.publish(geom);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_GET_GEOM => {
                self.core.touch(header);
                let geom = Self::decode_geom(body)?;
                self.geom.publish(geom);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }
}
