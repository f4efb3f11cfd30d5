//! 3D graphics interface
//!
//! Command-only device for drawing debug geometry in a visualizer. It
//! produces no data and accepts no requests.

use crate::client::Sender;
use crate::protocol::geom::{Color, Point3d};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrEncoder,
};

use super::{Device, DeviceCore};

const CMD_CLEAR: u32 = 1;
const CMD_DRAW: u32 = 2;

/// Maximum number of vertices per draw command
pub const MAX_DRAW_POINTS: usize = 64;

/// How a vertex list is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DrawMode {
    /// Isolated points
    Points = 1,
    /// Independent line segments
    Lines = 2,
    /// Connected line strip
    LineStrip = 3,
    /// Closed line loop
    LineLoop = 4,
    /// Independent triangles
    Triangles = 5,
    /// Filled polygon
    Polygon = 6,
}

/// 3D graphics device interface
pub struct Graphics3d {
    core: DeviceCore,
}

impl Graphics3d {
    /// Interface code
    pub const CODE: u16 = 58;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("graphics3d", address, sender),
        }
    }

    /// Clear everything drawn so far
    pub fn clear(&self) -> Result<()> {
        self.core.command(CMD_CLEAR, &[])
    }

    /// Draw a vertex list in the given mode and color.
    ///
    /// At most [`MAX_DRAW_POINTS`] vertices are sent; excess vertices are
    /// silently dropped.
    pub fn draw(&self, mode: DrawMode, points: &[Point3d], color: Color) -> Result<()> {
        let points = &points[..points.len().min(MAX_DRAW_POINTS)];

        let mut enc = XdrEncoder::with_capacity(12 + points.len() * Point3d::WIRE_SIZE + 16);
        enc.u32(mode as u32);
        enc.array_len(points.len() as u32);
        for point in points {
            point.encode(&mut enc);
        }
        color.encode(&mut enc);
        self.core.command(CMD_DRAW, &enc.into_bytes())
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for Graphics3d {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    // this interface produces no data
    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        self.core.skip_unknown(header, body)
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        self.core.skip_unknown(header, body)
    }
}
