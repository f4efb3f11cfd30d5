//! Actuator array interface
//!
//! Access to an array of actuators, e.g. the joints of an arm. Data
//! messages carry the live actuator states; the geometry of the array is
//! available on request.

use crate::client::{Latch, Sender};
use crate::protocol::geom::{Orientation3d, Point3d};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder, XdrEncoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;

const CMD_POS: u32 = 1;
const CMD_SPEED: u32 = 2;
const CMD_HOME: u32 = 3;

const REQ_POWER: u32 = 1;
const REQ_BRAKES: u32 = 2;
const REQ_GET_GEOM: u32 = 3;
const REQ_SPEED: u32 = 4;

/// Live state of one actuator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActarrayActuator {
    /// Current position [m or rad]
    pub position: f32,
    /// Current speed [m/s or rad/s]
    pub speed: f32,
    /// Current acceleration [m/s^2 or rad/s^2]
    pub acceleration: f32,
    /// Current drawn [A]
    pub current: f32,
    /// Motion state (idle, moving, braked, stalled)
    pub state: u8,
}

impl ActarrayActuator {
    /// Wire stride per actuator, trailing alignment word included
    pub const WIRE_SIZE: usize = 24;

    fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        let actuator = Self {
            position: dec.f32()?,
            speed: dec.f32()?,
            acceleration: dec.f32()?,
            current: dec.f32()?,
            state: dec.byte()?,
        };
        dec.skip(4)?;
        Ok(actuator)
    }
}

/// One full state message: all actuators in array order
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActarrayData {
    /// Actuator states
    pub actuators: Vec<ActarrayActuator>,
}

/// Geometry of one actuator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActarrayActuatorGeom {
    /// Actuator type (linear or rotary)
    pub kind: u8,
    /// Length of the link following this actuator [m]
    pub length: f32,
    /// Orientation when the actuator is at zero
    pub orientation: Orientation3d,
    /// Axis of motion (unit vector)
    pub axis: Point3d,
    /// Minimum reachable position [m or rad]
    pub min: f32,
    /// Centre position [m or rad]
    pub centre: f32,
    /// Maximum reachable position [m or rad]
    pub max: f32,
    /// Home position [m or rad]
    pub home: f32,
    /// Configured speed [m/s or rad/s]
    pub config_speed: f32,
    /// Whether the actuator has brakes
    pub has_brakes: bool,
}

impl ActarrayActuatorGeom {
    /// Wire stride per actuator geometry record
    pub const WIRE_SIZE: usize = 80;

    fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            kind: dec.byte()?,
            length: dec.f32()?,
            orientation: Orientation3d::decode(dec)?,
            axis: Point3d::decode(dec)?,
            min: dec.f32()?,
            centre: dec.f32()?,
            max: dec.f32()?,
            home: dec.f32()?,
            config_speed: dec.f32()?,
            has_brakes: dec.byte()? != 0,
        })
    }
}

/// Geometry of the whole array
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActarrayGeom {
    /// Per-actuator geometry
    pub actuators: Vec<ActarrayActuatorGeom>,
    /// Position of the array base
    pub base_pos: Point3d,
    /// Orientation of the array base
    pub base_orientation: Orientation3d,
}

/// Actuator array device interface
pub struct Actarray {
    core: DeviceCore,
    data: Latch<ActarrayData>,
    geom: Latch<ActarrayGeom>,
}

impl Actarray {
    /// Interface code
    pub const CODE: u16 = 53;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("actarray", address, sender),
            data: Latch::new(),
            geom: Latch::new(),
        }
    }

    /// Command a joint to move to a position
    pub fn set_position(&self, joint: u8, position: f32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(8);
        enc.byte(joint);
        enc.f32(position);
        self.core.command(CMD_POS, &enc.into_bytes())
    }

    /// Command a joint to move at a speed
    pub fn set_speed(&self, joint: u8, speed: f32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(8);
        enc.byte(joint);
        enc.f32(speed);
        self.core.command(CMD_SPEED, &enc.into_bytes())
    }

    /// Command a joint (0xFF for the whole array) to its home position
    pub fn home(&self, joint: u8) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.byte(joint);
        self.core.command(CMD_HOME, &enc.into_bytes())
    }

    /// Request the array geometry; the reply lands in [`Actarray::geom`]
    pub fn query_geometry(&self) -> Result<()> {
        self.core.request(REQ_GET_GEOM, &[])
    }

    /// Turn power to the whole array on or off. Null response.
    pub fn set_power(&self, on: bool) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.byte(u8::from(on));
        self.core.request(REQ_POWER, &enc.into_bytes())
    }

    /// Engage or release the brakes of all actuators. Null response.
    pub fn set_brakes(&self, on: bool) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.byte(u8::from(on));
        self.core.request(REQ_BRAKES, &enc.into_bytes())
    }

    /// Configure the speed of a joint for subsequent moves. Null response.
    pub fn set_speed_config(&self, joint: u8, speed: f32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(8);
        enc.byte(joint);
        enc.f32(speed);
        self.core.request(REQ_SPEED, &enc.into_bytes())
    }

    /// Most recent actuator state data
    #[must_use]
    pub fn data(&self) -> Option<ActarrayData> {
        self.data.get()
    }

    /// Edge-triggered: has new state data arrived since the last call?
    #[must_use]
    pub fn is_data_ready(&self) -> bool {
        self.data.take_ready()
    }

    /// Most recent geometry reply
    #[must_use]
    pub fn geom(&self) -> Option<ActarrayGeom> {
        self.geom.get()
    }

    /// Edge-triggered: has a new geometry reply arrived since the last call?
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

impl Device for Actarray {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let count = body.read_array_prefix()? as usize;
                let actuators =
                    body.read_elements(count, ActarrayActuator::WIRE_SIZE, ActarrayActuator::decode)?;
                self.data.publish(ActarrayData { actuators });
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_GET_GEOM => {
                self.core.touch(header);
                let count = body.read_array_prefix()? as usize;
                let actuators = body.read_elements(
                    count,
                    ActarrayActuatorGeom::WIRE_SIZE,
                    ActarrayActuatorGeom::decode,
                )?;

                let base = body.read_buf(48)?;
                let mut dec = XdrDecoder::new(&base);
                let base_pos = Point3d::decode(&mut dec)?;
                let base_orientation = Orientation3d::decode(&mut dec)?;

                self.geom.publish(ActarrayGeom {
                    actuators,
                    base_pos,
                    base_orientation,
                });
                Ok(())
            }
            REQ_POWER | REQ_BRAKES | REQ_SPEED => Ok(()),
            _ => self.core.skip_unknown(header, body),
        }
    }
}
