//! 3D point cloud interface
//!
//! Publishes clouds of colored 3D points.

use crate::client::{Latch, Sender};
use crate::protocol::geom::{Color, Point3d};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;

/// One cloud element: a point and its color
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointCloud3dElement {
    /// Position of the point
    pub point: Point3d,
    /// Color of the point
    pub color: Color,
}

impl PointCloud3dElement {
    /// Wire stride per element
    pub const WIRE_SIZE: usize = Point3d::WIRE_SIZE + Color::WIRE_SIZE;

    fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            point: Point3d::decode(dec)?,
            color: Color::decode(dec)?,
        })
    }
}

/// 3D point cloud device interface
pub struct PointCloud3d {
    core: DeviceCore,
    points: Latch<Vec<PointCloud3dElement>>,
}

impl PointCloud3d {
    /// Interface code
    pub const CODE: u16 = 61;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("pointcloud3d", address, sender),
            points: Latch::new(),
        }
    }

    /// Most recent cloud
    #[must_use]
    pub fn points(&self) -> Option<Vec<PointCloud3dElement>> {
        self.points.get()
    }

    /// Edge-triggered: has a new cloud arrived since the last call?
    #[must_use]
    pub fn is_points_ready(&self) -> bool {
        self.points.take_ready()
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for PointCloud3d {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let count = body.read_array_prefix()? as usize;
                let points = body.read_elements(
                    count,
                    PointCloud3dElement::WIRE_SIZE,
                    PointCloud3dElement::decode,
                )?;
                self.points.publish(points);
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
    fn cloud_decode() {
        let iface = PointCloud3d::new(DeviceAddress::new(PointCloud3d::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        enc.array_len(2);
        for i in 0..2u8 {
            Point3d {
                px: f64::from(i),
                py: 0.0,
                pz: 1.0,
            }
            .encode(&mut enc);
            Color {
                alpha: 255,
                red: i,
                green: 0,
                blue: 0,
            }
            .encode(&mut enc);
        }
        let payload = enc.into_bytes();
        assert_eq!(payload.len(), 8 + 2 * PointCloud3dElement::WIRE_SIZE);

        feed(
            &iface,
            &data_header(PointCloud3d::CODE, DATA_STATE, payload.len()),
            &payload,
        )
        .unwrap();

        let points = iface.points().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].point.px, 1.0);
        assert_eq!(points[1].color.red, 1);
    }
}
