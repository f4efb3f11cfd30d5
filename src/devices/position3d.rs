//! 3D position interface
//!
//! Odometric pose and velocity of a robot moving in three dimensions, plus
//! the usual crop of motor configuration requests.

use crate::client::{Latch, Sender};
use crate::protocol::geom::{Bbox3d, Pose3d};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder, XdrEncoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;
const DATA_GEOMETRY: u32 = 2;

const CMD_SET_VEL: u32 = 1;
const CMD_SET_POS: u32 = 2;

const REQ_GET_GEOM: u32 = 1;
const REQ_MOTOR_POWER: u32 = 2;
const REQ_VELOCITY_MODE: u32 = 3;
const REQ_POSITION_MODE: u32 = 4;
const REQ_SET_ODOM: u32 = 5;
const REQ_RESET_ODOM: u32 = 6;
const REQ_SPEED_PID: u32 = 7;
const REQ_POSITION_PID: u32 = 8;
const REQ_SPEED_PROF: u32 = 9;

/// Odometry state: pose, velocity and stall flag
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position3dData {
    /// Position [m] and orientation [rad]
    pub pos: Pose3d,
    /// Translational [m/s] and rotational [rad/s] velocities
    pub vel: Pose3d,
    /// Non-zero if the motors are stalled
    pub stall: u8,
}

/// Robot base geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position3dGeom {
    /// Pose of the base in the robot frame
    pub pose: Pose3d,
    /// Dimensions of the base
    pub size: Bbox3d,
}

/// 3D position device interface
pub struct Position3d {
    core: DeviceCore,
    data: Latch<Position3dData>,
    geom: Latch<Position3dGeom>,
}

impl Position3d {
    /// Interface code
    pub const CODE: u16 = 30;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("position3d", address, sender),
            data: Latch::new(),
            geom: Latch::new(),
        }
    }

    fn decode_geom(body: &mut BodyReader<'_>) -> Result<Position3dGeom> {
        let buf = body.read_buf(72)?;
        let mut dec = XdrDecoder::new(&buf);
        Ok(Position3dGeom {
            pose: Pose3d::decode(&mut dec)?,
            size: Bbox3d::decode(&mut dec)?,
        })
    }

    /// Command a target pose and velocity
    pub fn set_position(&self, pos: Pose3d, vel: Pose3d, state: u8) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(100);
        pos.encode(&mut enc);
        vel.encode(&mut enc);
        enc.byte(state);
        self.core.command(CMD_SET_POS, &enc.into_bytes())
    }

    /// Command target velocities
    pub fn set_velocity(&self, vel: Pose3d, state: u8) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(52);
        vel.encode(&mut enc);
        enc.byte(state);
        self.core.command(CMD_SET_VEL, &enc.into_bytes())
    }

    /// Convenience: forward speed [m/s] and turn rate [rad/s]
    pub fn set_speed(&self, speed: f64, turnrate: f64) -> Result<()> {
        self.set_velocity(
            Pose3d {
                px: speed,
                pyaw: turnrate,
                ..Default::default()
            },
            1,
        )
    }

    /// Request robot geometry; the reply lands in [`Position3d::geom`]
    pub fn query_geometry(&self) -> Result<()> {
        self.core.request(REQ_GET_GEOM, &[])
    }

    /// Turn motor power on or off. Null response.
    ///
    /// Be careful: the robot may start moving as soon as power returns.
    pub fn set_motor_power(&self, on: bool) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.byte(u8::from(on));
        self.core.request(REQ_MOTOR_POWER, &enc.into_bytes())
    }

    /// Select position (1) or velocity (0) control. Null response.
    pub fn set_control_mode(&self, mode: i32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.i32(mode);
        self.core.request(REQ_POSITION_MODE, &enc.into_bytes())
    }

    /// Select a driver-specific velocity control mode. Null response.
    pub fn set_velocity_control(&self, mode: i32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.i32(mode);
        self.core.request(REQ_VELOCITY_MODE, &enc.into_bytes())
    }

    /// Overwrite the odometry with a given pose. Null response.
    pub fn set_odometry(&self, pose: Pose3d) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(48);
        pose.encode(&mut enc);
        self.core.request(REQ_SET_ODOM, &enc.into_bytes())
    }

    /// Reset the odometry to the origin. Null response.
    pub fn reset_odometry(&self) -> Result<()> {
        self.core.request(REQ_RESET_ODOM, &[])
    }

    /// Set velocity PID parameters. Null response.
    pub fn set_velocity_pid(&self, kp: f32, ki: f32, kd: f32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(12);
        enc.f32(kp);
        enc.f32(ki);
        enc.f32(kd);
        self.core.request(REQ_SPEED_PID, &enc.into_bytes())
    }

    /// Set position PID parameters. Null response.
    pub fn set_position_pid(&self, kp: f32, ki: f32, kd: f32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(12);
        enc.f32(kp);
        enc.f32(ki);
        enc.f32(kd);
        self.core.request(REQ_POSITION_PID, &enc.into_bytes())
    }

    /// Set speed profile: max speed [rad/s] and max acceleration [rad/s^2].
    /// Null response.
    pub fn set_speed_profile(&self, speed: f32, accel: f32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(8);
        enc.f32(speed);
        enc.f32(accel);
        self.core.request(REQ_SPEED_PROF, &enc.into_bytes())
    }

    /// Most recent odometry data
    #[must_use]
    pub fn data(&self) -> Option<Position3dData> {
        self.data.get()
    }

    /// Edge-triggered: has new odometry arrived since the last call?
    #[must_use]
    pub fn is_data_ready(&self) -> bool {
        self.data.take_ready()
    }

    /// Most recent geometry
    #[must_use]
    pub fn geom(&self) -> Option<Position3dGeom> {
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

impl Device for Position3d {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let buf = body.read_buf(100)?;
                let mut dec = XdrDecoder::new(&buf);
                self.data.publish(Position3dData {
                    pos: Pose3d::decode(&mut dec)?,
                    vel: Pose3d::decode(&mut dec)?,
                    stall: dec.byte()?,
                });
                Ok(())
            }
            DATA_GEOMETRY => {
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
            REQ_MOTOR_POWER | REQ_VELOCITY_MODE | REQ_POSITION_MODE | REQ_SET_ODOM
            | REQ_RESET_ODOM | REQ_SPEED_PID | REQ_POSITION_PID | REQ_SPEED_PROF => Ok(()),
            _ => self.core.skip_unknown(header, body),
        }
    }
}
