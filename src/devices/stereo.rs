//! Stereo vision interface
//!
//! One data message bundles the left and right channels, the disparity
//! image and a colored 3D point cloud computed from them.

use crate::client::{Latch, Sender};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder,
};

use super::camera::{CameraFrame, decode_frame};
use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;

/// One reconstructed point with its color
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StereoPoint {
    /// X [m]
    pub px: f32,
    /// Y [m]
    pub py: f32,
    /// Z [m]
    pub pz: f32,
    /// Red channel
    pub red: u8,
    /// Green channel
    pub green: u8,
    /// Blue channel
    pub blue: u8,
}

impl StereoPoint {
    /// Wire stride per point
    pub const WIRE_SIZE: usize = 24;

    fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            px: dec.f32()?,
            py: dec.f32()?,
            pz: dec.f32()?,
            red: dec.byte()?,
            green: dec.byte()?,
            blue: dec.byte()?,
        })
    }
}

/// One full stereo data message
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StereoData {
    /// Left camera channel
    pub left: CameraFrame,
    /// Right camera channel
    pub right: CameraFrame,
    /// Disparity image
    pub disparity: CameraFrame,
    /// Reconstructed point cloud
    pub points: Vec<StereoPoint>,
    /// Driver stereo mode
    pub mode: i32,
}

/// Stereo vision device interface
pub struct Stereo {
    core: DeviceCore,
    data: Latch<StereoData>,
}

impl Stereo {
    /// Interface code
    pub const CODE: u16 = 65;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("stereo", address, sender),
            data: Latch::new(),
        }
    }

    /// Most recent stereo data
    #[must_use]
    pub fn data(&self) -> Option<StereoData> {
        self.data.get()
    }

    /// Edge-triggered: has new stereo data arrived since the last call?
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

impl Device for Stereo {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);

                // embedded frames are packed back to back, unpadded
                let left = decode_frame(body, false)?;
                let right = decode_frame(body, false)?;
                let disparity = decode_frame(body, false)?;

                let count = body.read_array_prefix()? as usize;
                let points =
                    body.read_elements(count, StereoPoint::WIRE_SIZE, StereoPoint::decode)?;

                let mode_buf = body.read_buf(4)?;
                let mode = XdrDecoder::new(&mode_buf).i32()?;

                self.data.publish(StereoData {
                    left,
                    right,
                    disparity,
                    points,
                    mode,
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
