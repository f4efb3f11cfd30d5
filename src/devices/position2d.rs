//! Planar position interface
//!
//! Odometric pose and velocity of a ground robot.

use crate::client::{Latch, Sender};
use crate::protocol::geom::{Bbox3d, Pose2d, Pose3d};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder, XdrEncoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;
const DATA_GEOM: u32 = 2;

const CMD_VEL: u32 = 1;
const CMD_POS: u32 = 2;

const REQ_GET_GEOM: u32 = 1;
const REQ_MOTOR_POWER: u32 = 2;
const REQ_SET_ODOM: u32 = 4;
const REQ_RESET_ODOM: u32 = 5;

/// Odometry state: pose, velocity and stall flag
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position2dData {
    /// Position [m] and heading [rad]
    pub pos: Pose2d,
    /// Translational [m/s] and rotational [rad/s] velocities
    pub vel: Pose2d,
    /// Non-zero if the motors are stalled
    pub stall: u8,
}

/// Robot base geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position2dGeom {
    /// Pose of the base in the robot frame
    pub pose: Pose3d,
    /// Dimensions of the base
    pub size: Bbox3d,
}

/// Planar position device interface
pub struct Position2d {
    core: DeviceCore,
    data: Latch<Position2dData>,
    geom: Latch<Position2dGeom>,
}

impl Position2d {
    /// Interface code
    pub const CODE: u16 = 4;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("position2d", address, sender),
            data: Latch::new(),
            geom: Latch::new(),
        }
    }

    fn decode_geom(body: &mut BodyReader<'_>) -> Result<Position2dGeom> {
        let buf = body.read_buf(72)?;
        let mut dec = XdrDecoder::new(&buf);
        Ok(Position2dGeom {
            pose: Pose3d::decode(&mut dec)?,
            size: Bbox3d::decode(&mut dec)?,
        })
    }

    /// Command target velocities
    pub fn set_velocity(&self, vel: Pose2d, state: u8) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(28);
        vel.encode(&mut enc);
        enc.byte(state);
        self.core.command(CMD_VEL, &enc.into_bytes())
    }

    /// Command a target pose and velocity
    pub fn set_position(&self, pos: Pose2d, vel: Pose2d, state: u8) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(52);
        pos.encode(&mut enc);
        vel.encode(&mut enc);
        enc.byte(state);
        self.core.command(CMD_POS, &enc.into_bytes())
    }

    /// Convenience: forward speed [m/s] and turn rate [rad/s]
    pub fn set_speed(&self, speed: f64, turnrate: f64) -> Result<()> {
        self.set_velocity(
            Pose2d {
                px: speed,
                pa: turnrate,
                ..Default::default()
            },
            1,
        )
    }

    /// Request robot geometry; the reply lands in [`Position2d::geom`]
    pub fn query_geometry(&self) -> Result<()> {
        self.core.request(REQ_GET_GEOM, &[])
    }

    /// Turn motor power on or off. Null response.
    pub fn set_motor_power(&self, on: bool) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.byte(u8::from(on));
        self.core.request(REQ_MOTOR_POWER, &enc.into_bytes())
    }

    /// Overwrite the odometry with a given pose. Null response.
    pub fn set_odometry(&self, pose: Pose2d) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(24);
        pose.encode(&mut enc);
        self.core.request(REQ_SET_ODOM, &enc.into_bytes())
    }

    /// Reset the odometry to (0, 0, 0). Null response.
    pub fn reset_odometry(&self) -> Result<()> {
        self.core.request(REQ_RESET_ODOM, &[])
    }

    /// Most recent odometry data
    #[must_use]
    pub fn data(&self) -> Option<Position2dData> {
        self.data.get()
    }

    /// Edge-triggered: has new odometry arrived since the last call?
    #[must_use]
    pub fn is_data_ready(&self) -> bool {
        self.data.take_ready()
    }

    /// Most recent geometry
    #[must_use]
    pub fn geom(&self) -> Option<Position2dGeom> {
        self.geom.get()
    }

    /// Edge-triggered: has new geometry arrived since the last call?
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

impl Device for Position2d {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let buf = body.read_buf(52)?;
                let mut dec = XdrDecoder::new(&buf);
                self.data.publish(Position2dData {
                    pos: Pose2d::decode(&mut dec)?,
                    vel: Pose2d::decode(&mut dec)?,
                    stall: dec.byte()?,
                });
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
            REQ_MOTOR_POWER | REQ_SET_ODOM | REQ_RESET_ODOM => Ok(()),
            _ => self.core.skip_unknown(header, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::test_support::{capture_sender, data_header, feed, null_sender, take_sent};
    use crate::protocol::MessageType;

    #[test]
    fn state_decode() {
        let iface = Position2d::new(DeviceAddress::new(Position2d::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        Pose2d {
            px: 2.0,
            py: 1.0,
            pa: 0.7,
        }
        .encode(&mut enc);
        Pose2d {
            px: 0.3,
            ..Default::default()
        }
        .encode(&mut enc);
        enc.byte(1);
        let payload = enc.into_bytes();
        assert_eq!(payload.len(), 52);

        feed(
            &iface,
            &data_header(Position2d::CODE, DATA_STATE, payload.len()),
            &payload,
        )
        .unwrap();

        let data = iface.data().unwrap();
        assert_eq!(data.pos.pa, 0.7);
        assert_eq!(data.vel.px, 0.3);
        assert_eq!(data.stall, 1);
    }

    #[test]
    fn velocity_command_roundtrip() {
        let (sender, rx) = capture_sender();
        let iface = Position2d::new(DeviceAddress::new(Position2d::CODE, 0), sender);

        iface.set_speed(0.5, 0.2).unwrap();

        let (header, body) = take_sent(&rx);
        assert_eq!(header.msg_type(), MessageType::Command);
        assert_eq!(header.subtype(), CMD_VEL);
        assert_eq!(body.len(), 28);

        let mut dec = XdrDecoder::new(&body);
        let vel = Pose2d::decode(&mut dec).unwrap();
        assert_eq!(vel.px, 0.5);
        assert_eq!(vel.pa, 0.2);
    }

    #[test]
    fn set_odometry_request() {
        let (sender, rx) = capture_sender();
        let iface = Position2d::new(DeviceAddress::new(Position2d::CODE, 0), sender);

        iface
            .set_odometry(Pose2d {
                px: 1.0,
                py: 2.0,
                pa: 3.0,
            })
            .unwrap();

        let (header, body) = take_sent(&rx);
        assert_eq!(header.msg_type(), MessageType::Request);
        assert_eq!(header.subtype(), REQ_SET_ODOM);
        assert_eq!(body.len(), 24);
    }
}
