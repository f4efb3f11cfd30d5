//! Limb interface
//!
//! Cartesian control of an end effector: the limb reports its position,
//! approach and orientation vectors, and accepts pose and vector-move
//! commands.

use crate::client::{Latch, Sender};
use crate::protocol::geom::Point3d;
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder, XdrEncoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;

const CMD_HOME: u32 = 1;
const CMD_STOP: u32 = 2;
const CMD_SETPOSE: u32 = 3;
const CMD_SETPOSITION: u32 = 4;
const CMD_VECMOVE: u32 = 5;

const REQ_POWER: u32 = 1;
const REQ_BRAKES: u32 = 2;
const REQ_GEOM: u32 = 3;
const REQ_SPEED: u32 = 4;

/// End effector state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LimbData {
    /// Position of the end effector
    pub position: Point3d,
    /// Approach vector
    pub approach: Point3d,
    /// Orientation vector
    pub orientation: Point3d,
    /// Motion state (idle, brake, moving, out of reach, collision)
    pub state: u8,
}

/// Limb geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LimbGeom {
    /// Position of the limb base in the robot frame
    pub base_pos: Point3d,
}

/// Limb device interface
pub struct Limb {
    core: DeviceCore,
    data: Latch<LimbData>,
    geom: Latch<LimbGeom>,
}

impl Limb {
    /// Interface code
    pub const CODE: u16 = 54;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("limb", address, sender),
            data: Latch::new(),
            geom: Latch::new(),
        }
    }

    /// Send the end effector to its home position
    pub fn home(&self) -> Result<()> {
        self.core.command(CMD_HOME, &[])
    }

    /// Stop the limb immediately
    pub fn stop(&self) -> Result<()> {
        self.core.command(CMD_STOP, &[])
    }

    /// Move to a fully described pose
    pub fn set_pose(
        &self,
        position: Point3d,
        approach: Point3d,
        orientation: Point3d,
    ) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(72);
        position.encode(&mut enc);
        approach.encode(&mut enc);
        orientation.encode(&mut enc);
        self.core.command(CMD_SETPOSE, &enc.into_bytes())
    }

    /// Move to a position, any orientation
    pub fn set_position(&self, position: Point3d) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(24);
        position.encode(&mut enc);
        self.core.command(CMD_SETPOSITION, &enc.into_bytes())
    }

    /// Move along a direction vector for a given distance [m]
    pub fn vector_move(&self, direction: Point3d, length: f32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(28);
        direction.encode(&mut enc);
        enc.f32(length);
        self.core.command(CMD_VECMOVE, &enc.into_bytes())
    }

    /// Turn limb power on or off. Null response.
    pub fn set_power(&self, on: bool) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.byte(u8::from(on));
        self.core.request(REQ_POWER, &enc.into_bytes())
    }

    /// Engage or release the brakes. Null response.
    pub fn set_brakes(&self, on: bool) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.byte(u8::from(on));
        self.core.request(REQ_BRAKES, &enc.into_bytes())
    }

    /// Request the limb geometry; the reply lands in [`Limb::geom`]
    pub fn query_geometry(&self) -> Result<()> {
        self.core.request(REQ_GEOM, &[])
    }

    /// Set the end effector speed for subsequent moves [m/s]. Null response.
    pub fn set_speed(&self, speed: f32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.f32(speed);
        self.core.request(REQ_SPEED, &enc.into_bytes())
    }

    /// Most recent state data
    #[must_use]
    pub fn data(&self) -> Option<LimbData> {
        self.data.get()
    }

    /// Edge-triggered: has new state data arrived since the last call?
    #[must_use]
    pub fn is_data_ready(&self) -> bool {
        self.data.take_ready()
    }

    /// Most recent geometry reply
    #[must_use]
    pub fn geom(&self) -> Option<LimbGeom> {
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

impl Device for Limb {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let buf = body.read_buf(76)?;
                let mut dec = XdrDecoder::new(&buf);
                self.data.publish(LimbData {
                    position: Point3d::decode(&mut dec)?,
                    approach: Point3d::decode(&mut dec)?,
                    orientation: Point3d::decode(&mut dec)?,
                    state: dec.byte()?,
                });
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_GEOM => {
                self.core.touch(header);
                let buf = body.read_buf(24)?;
                let mut dec = XdrDecoder::new(&buf);
                self.geom.publish(LimbGeom {
                    base_pos: Point3d::decode(&mut dec)?,
                });
                Ok(())
            }
            REQ_POWER | REQ_BRAKES | REQ_SPEED => Ok(()),
            _ => self.core.skip_unknown(header, body),
        }
    }
}
