//! Sonar interface
//!
//! Range readings from a ring of sonar transducers, plus the transducer
//! poses on request.

use crate::client::{Latch, Sender};
use crate::protocol::geom::Pose3d;
use crate::protocol::{BodyReader, DeviceAddress, MessageHeader, Result};

use super::{Device, DeviceCore};

const DATA_RANGES: u32 = 1;
const DATA_GEOM: u32 = 2;

const REQ_GET_GEOM: u32 = 1;

/// Sonar device interface
pub struct Sonar {
    core: DeviceCore,
    ranges: Latch<Vec<f32>>,
    poses: Latch<Vec<Pose3d>>,
}

impl Sonar {
    /// Interface code
    pub const CODE: u16 = 5;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("sonar", address, sender),
            ranges: Latch::new(),
            poses: Latch::new(),
        }
    }

    fn decode_poses(body: &mut BodyReader<'_>) -> Result<Vec<Pose3d>> {
        let count = body.read_array_prefix()? as usize;
        body.read_elements(count, Pose3d::WIRE_SIZE, Pose3d::decode)
    }

    /// Request the transducer poses; the reply lands in [`Sonar::poses`]
    pub fn query_geometry(&self) -> Result<()> {
        self.core.request(REQ_GET_GEOM, &[])
    }

    /// Most recent range scan [m]
    #[must_use]
    pub fn ranges(&self) -> Option<Vec<f32>> {
        self.ranges.get()
    }

    /// Edge-triggered: has a new scan arrived since the last call?
    #[must_use]
    pub fn is_ranges_ready(&self) -> bool {
        self.ranges.take_ready()
    }

    /// Most recent transducer poses
    #[must_use]
    pub fn poses(&self) -> Option<Vec<Pose3d>> {
        self.poses.get()
    }

    /// Edge-triggered readiness for the pose slot
    #[must_use]
    pub fn is_geom_ready(&self) -> bool {
        self.poses.take_ready()
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for Sonar {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_RANGES => {
                self.core.touch(header);
                let count = body.read_array_prefix()? as usize;
                let ranges = body.read_elements(count, 4, |dec| dec.f32())?;
                self.ranges.publish(ranges);
                Ok(())
            }
            DATA_GEOM => {
                self.core.touch(header);
                let poses = Self::decode_poses(body)?;
                self.poses.publish(poses);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_GET_GEOM => {
                self.core.touch(header);
                let poses = Self::decode_poses(body)?;
                self.poses.publish(poses);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }
}
