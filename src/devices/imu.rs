//! Inertial measurement unit interface
//!
//! The IMU publishes one of five data shapes depending on the configured
//! datatype: 3D pose, calibrated sensor values, quaternion or Euler
//! orientation, or the full pose/velocity/acceleration state.

use crate::client::{Latch, Sender};
use crate::protocol::geom::{Orientation3d, Pose3d};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder, XdrEncoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;
const DATA_CALIB: u32 = 2;
const DATA_QUAT: u32 = 3;
const DATA_EULER: u32 = 4;
const DATA_FULLSTATE: u32 = 5;

const REQ_SET_DATATYPE: u32 = 1;
const REQ_RESET_ORIENTATION: u32 = 2;

/// Calibrated accelerometer, gyroscope and magnetometer values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImuCalib {
    /// Acceleration along X [m/s^2]
    pub accel_x: f32,
    /// Acceleration along Y [m/s^2]
    pub accel_y: f32,
    /// Acceleration along Z [m/s^2]
    pub accel_z: f32,
    /// Angular rate about X [rad/s]
    pub gyro_x: f32,
    /// Angular rate about Y [rad/s]
    pub gyro_y: f32,
    /// Angular rate about Z [rad/s]
    pub gyro_z: f32,
    /// Magnetic field along X
    pub magn_x: f32,
    /// Magnetic field along Y
    pub magn_y: f32,
    /// Magnetic field along Z
    pub magn_z: f32,
}

impl ImuCalib {
    /// Wire size in bytes
    pub const WIRE_SIZE: usize = 36;

    fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            accel_x: dec.f32()?,
            accel_y: dec.f32()?,
            accel_z: dec.f32()?,
            gyro_x: dec.f32()?,
            gyro_y: dec.f32()?,
            gyro_z: dec.f32()?,
            magn_x: dec.f32()?,
            magn_y: dec.f32()?,
            magn_z: dec.f32()?,
        })
    }
}

/// Calibrated values plus orientation as a quaternion
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImuQuat {
    /// Calibrated sensor values
    pub calib: ImuCalib,
    /// Orientation quaternion (q1..q4)
    pub quaternions: [f32; 4],
}

/// Calibrated values plus orientation as Euler angles
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImuEuler {
    /// Calibrated sensor values
    pub calib: ImuCalib,
    /// Orientation as Euler angles [rad]
    pub orientation: Orientation3d,
}

/// Full pose, velocity and acceleration state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImuFullState {
    /// Pose [m, rad]
    pub pose: Pose3d,
    /// Velocity [m/s, rad/s]
    pub vel: Pose3d,
    /// Acceleration [m/s^2, rad/s^2]
    pub acc: Pose3d,
}

/// IMU device interface
pub struct Imu {
    core: DeviceCore,
    state: Latch<Pose3d>,
    calib: Latch<ImuCalib>,
    quat: Latch<ImuQuat>,
    euler: Latch<ImuEuler>,
    full: Latch<ImuFullState>,
}

impl Imu {
    /// Interface code
    pub const CODE: u16 = 60;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("imu", address, sender),
            state: Latch::new(),
            calib: Latch::new(),
            quat: Latch::new(),
            euler: Latch::new(),
            full: Latch::new(),
        }
    }

    /// Select which data shape the server publishes:
    /// 1 pose, 2 calibrated, 3 quaternions, 4 Euler. Null response.
    pub fn set_datatype(&self, datatype: u8) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.byte(datatype);
        self.core.request(REQ_SET_DATATYPE, &enc.into_bytes())
    }

    /// Reset the IMU orientation (driver-specific value). Null response.
    pub fn reset_orientation(&self, value: i32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.i32(value);
        self.core.request(REQ_RESET_ORIENTATION, &enc.into_bytes())
    }

    /// Most recent 3D pose
    #[must_use]
    pub fn state(&self) -> Option<Pose3d> {
        self.state.get()
    }

    /// Edge-triggered readiness for the pose slot
    #[must_use]
    pub fn is_state_ready(&self) -> bool {
        self.state.take_ready()
    }

    /// Most recent calibrated values
    #[must_use]
    pub fn calib(&self) -> Option<ImuCalib> {
        self.calib.get()
    }

    /// Edge-triggered readiness for the calibrated slot
    #[must_use]
    pub fn is_calib_ready(&self) -> bool {
        self.calib.take_ready()
    }

    /// Most recent quaternion data
    #[must_use]
    pub fn quat(&self) -> Option<ImuQuat> {
        self.quat.get()
    }

    /// Edge-triggered readiness for the quaternion slot
    #[must_use]
    pub fn is_quat_ready(&self) -> bool {
        self.quat.take_ready()
    }

    /// Most recent Euler data
    #[must_use]
    pub fn euler(&self) -> Option<ImuEuler> {
        self.euler.get()
    }

    /// Edge-triggered readiness for the Euler slot
    #[must_use]
    pub fn is_euler_ready(&self) -> bool {
        self.euler.take_ready()
    }

    /// Most recent full state
    #[must_use]
    pub fn full_state(&self) -> Option<ImuFullState> {
        self.full.get()
    }

    /// Edge-triggered readiness for the full state slot
    #[must_use]
    pub fn is_full_state_ready(&self) -> bool {
        self.full.take_ready()
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for Imu {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let buf = body.read_buf(48)?;
                let mut dec = XdrDecoder::new(&buf);
                self.state.publish(Pose3d::decode(&mut dec)?);
                Ok(())
            }
            DATA_CALIB => {
                self.core.touch(header);
                let buf = body.read_buf(ImuCalib::WIRE_SIZE)?;
                let mut dec = XdrDecoder::new(&buf);
                self.calib.publish(ImuCalib::decode(&mut dec)?);
                Ok(())
            }
            DATA_QUAT => {
                self.core.touch(header);
                let buf = body.read_buf(52)?;
                let mut dec = XdrDecoder::new(&buf);
                let calib = ImuCalib::decode(&mut dec)?;
                let quaternions = [dec.f32()?, dec.f32()?, dec.f32()?, dec.f32()?];
                self.quat.publish(ImuQuat {
                    calib,
                    quaternions,
                });
                Ok(())
            }
            DATA_EULER => {
                self.core.touch(header);
                let buf = body.read_buf(60)?;
                let mut dec = XdrDecoder::new(&buf);
                self.euler.publish(ImuEuler {
                    calib: ImuCalib::decode(&mut dec)?,
                    orientation: Orientation3d::decode(&mut dec)?,
                });
                Ok(())
            }
            DATA_FULLSTATE => {
                self.core.touch(header);
                let buf = body.read_buf(144)?;
                let mut dec = XdrDecoder::new(&buf);
                self.full.publish(ImuFullState {
                    pose: Pose3d::decode(&mut dec)?,
                    vel: Pose3d::decode(&mut dec)?,
                    acc: Pose3d::decode(&mut dec)?,
                });
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_SET_DATATYPE | REQ_RESET_ORIENTATION => Ok(()),
            _ => self.core.skip_unknown(header, body),
        }
    }
}
