//! Map interface
//!
//! Occupancy grid and vector maps served tile by tile. Grid tiles arrive
//! as raw cell bytes; the embedded `data_count` is what frames the stream,
//! so a disagreement with `width * height` is only worth a warning.

use bytes::Bytes;
use tracing::warn;

use crate::client::{Latch, Sender};
use crate::protocol::geom::{Pose2d, Segment};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder, XdrEncoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_INFO: u32 = 1;

const REQ_GET_INFO: u32 = 1;
const REQ_GET_DATA: u32 = 2;
const REQ_GET_VECTOR: u32 = 3;

/// Map metadata
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapInfo {
    /// Cell edge length [m/cell]
    pub scale: f32,
    /// Grid width [cells]
    pub width: i32,
    /// Grid height [cells]
    pub height: i32,
    /// Pose of cell (0, 0) in map coordinates
    pub origin: Pose2d,
}

/// One occupancy grid tile
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapTile {
    /// Tile origin column
    pub col: i32,
    /// Tile origin row
    pub row: i32,
    /// Tile width [cells]
    pub width: i32,
    /// Tile height [cells]
    pub height: i32,
    /// Occupancy value range hint from the driver
    pub data_range: u8,
    /// Cell occupancy values, row-major from the tile origin
    #[cfg_attr(feature = "serde", serde(skip))]
    pub data: Bytes,
}

/// Vector map: bounding box plus line segments
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapVector {
    /// Minimum X of the map extent [m]
    pub minx: f32,
    /// Maximum X of the map extent [m]
    pub maxx: f32,
    /// Minimum Y of the map extent [m]
    pub miny: f32,
    /// Maximum Y of the map extent [m]
    pub maxy: f32,
    /// Line segments making up the map
    pub segments: Vec<Segment>,
}

/// Map device interface
pub struct Map {
    core: DeviceCore,
    info: Latch<MapInfo>,
    tile: Latch<MapTile>,
    vector: Latch<MapVector>,
}

impl Map {
    /// Interface code
    pub const CODE: u16 = 42;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("map", address, sender),
            info: Latch::new(),
            tile: Latch::new(),
            vector: Latch::new(),
        }
    }

    fn decode_info(body: &mut BodyReader<'_>) -> Result<MapInfo> {
        let buf = body.read_buf(36)?;
        let mut dec = XdrDecoder::new(&buf);
        Ok(MapInfo {
            scale: dec.f32()?,
            width: dec.i32()?,
            height: dec.i32()?,
            origin: Pose2d::decode(&mut dec)?,
        })
    }

    /// Request map metadata; the reply lands in [`Map::info`]
    pub fn request_info(&self) -> Result<()> {
        self.core.request(REQ_GET_INFO, &[])
    }

    /// Request one grid tile by origin and size; the reply lands in
    /// [`Map::tile`]. The served tile may be clipped against the map.
    pub fn request_tile(&self, col: i32, row: i32, width: i32, height: i32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(28);
        enc.i32(col);
        enc.i32(row);
        enc.i32(width);
        enc.i32(height);
        // data_count, array prefix and data_range are zero in a request
        enc.i32(0);
        enc.i32(0);
        enc.i32(0);
        self.core.request(REQ_GET_DATA, &enc.into_bytes())
    }

    /// Request the vector map; the reply lands in [`Map::vector`]
    pub fn request_vector(&self) -> Result<()> {
        self.core.request(REQ_GET_VECTOR, &[])
    }

    /// Most recent map metadata
    #[must_use]
    pub fn info(&self) -> Option<MapInfo> {
        self.info.get()
    }

    /// Edge-triggered readiness for the metadata slot
    #[must_use]
    pub fn is_info_ready(&self) -> bool {
        self.info.take_ready()
    }

    /// Most recent grid tile
    #[must_use]
    pub fn tile(&self) -> Option<MapTile> {
        self.tile.get()
    }

    /// Edge-triggered readiness for the tile slot
    #[must_use]
    pub fn is_tile_ready(&self) -> bool {
        self.tile.take_ready()
    }

    /// Most recent vector map
    #[must_use]
    pub fn vector(&self) -> Option<MapVector> {
        self.vector.get()
    }

    /// Edge-triggered readiness for the vector map slot
    #[must_use]
    pub fn is_vector_ready(&self) -> bool {
        self.vector.take_ready()
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for Map {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_INFO => {
                self.core.touch(header);
                let info = Self::decode_info(body)?;
                self.info.publish(info);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_GET_INFO => {
                self.core.touch(header);
                let info = Self::decode_info(body)?;
                self.info.publish(info);
                Ok(())
            }
            REQ_GET_DATA => {
                self.core.touch(header);

                // col, row, width, height, data_count, array prefix, data_range
                let buf = body.read_buf(28)?;
                let mut dec = XdrDecoder::new(&buf);
                let col = dec.i32()?;
                let row = dec.i32()?;
                let width = dec.i32()?;
                let height = dec.i32()?;
                let data_count = dec.u32()? as usize;
                let _prefix = dec.u32()?;
                let data_range = dec.byte()?;

                let cells = width.checked_mul(height).unwrap_or(0);
                if data_count != cells.max(0) as usize {
                    // framing trusts data_count, not the believed cell total
                    warn!(data_count, cells, "tile cell count does not match its dimensions");
                }

                let data = body.read_buf(data_count)?;
                body.skip_padding(data_count)?;

                self.tile.publish(MapTile {
                    col,
                    row,
                    width,
                    height,
                    data_range,
                    data,
                });
                Ok(())
            }
            REQ_GET_VECTOR => {
                self.core.touch(header);

                let buf = body.read_buf(24)?;
                let mut dec = XdrDecoder::new(&buf);
                let minx = dec.f32()?;
                let maxx = dec.f32()?;
                let miny = dec.f32()?;
                let maxy = dec.f32()?;
                let count = dec.u32()? as usize;
                let _prefix = dec.u32()?;

                let segments = body.read_elements(count, Segment::WIRE_SIZE, Segment::decode)?;

                self.vector.publish(MapVector {
                    minx,
                    maxx,
                    miny,
                    maxy,
                    segments,
                });
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::test_support::{capture_sender, feed, null_sender, response_header, take_sent};
    use crate::protocol::{MessageType, xdr_padding};

    #[test]
    fn info_reply_decode() {
        let iface = Map::new(DeviceAddress::new(Map::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        enc.f32(0.05);
        enc.i32(200);
        enc.i32(100);
        Pose2d {
            px: -5.0,
            py: -2.5,
            pa: 0.0,
        }
        .encode(&mut enc);
        let payload = enc.into_bytes();
        assert_eq!(payload.len(), 36);

        feed(
            &iface,
            &response_header(Map::CODE, REQ_GET_INFO, payload.len()),
            &payload,
        )
        .unwrap();

        let info = iface.info().unwrap();
        assert_eq!(info.width, 200);
        assert_eq!(info.origin.px, -5.0);
    }

    #[test]
    fn tile_with_odd_cell_count_stays_framed() {
        let iface = Map::new(DeviceAddress::new(Map::CODE, 0), null_sender());

        let cells = [0u8, 1, 2, 1, 0, 2];
        let mut enc = XdrEncoder::new();
        enc.i32(0);
        enc.i32(0);
        enc.i32(3);
        enc.i32(2);
        enc.u32(cells.len() as u32);
        enc.u32(cells.len() as u32);
        enc.byte(2);
        enc.opaque(&cells);
        let payload = enc.into_bytes();
        assert_eq!(payload.len(), 28 + cells.len() + xdr_padding(cells.len()));

        feed(
            &iface,
            &response_header(Map::CODE, REQ_GET_DATA, payload.len()),
            &payload,
        )
        .unwrap();

        let tile = iface.tile().unwrap();
        assert_eq!(tile.width, 3);
        assert_eq!(tile.data.as_ref(), &cells);
    }

    #[test]
    fn cell_count_mismatch_is_tolerated() {
        // data_count frames the stream even when it disagrees with
        // width * height
        let iface = Map::new(DeviceAddress::new(Map::CODE, 0), null_sender());

        let cells = [1u8, 1, 1, 1];
        let mut enc = XdrEncoder::new();
        enc.i32(0);
        enc.i32(0);
        enc.i32(5);
        enc.i32(5);
        enc.u32(4);
        enc.u32(4);
        enc.byte(1);
        enc.opaque(&cells);
        let payload = enc.into_bytes();

        feed(
            &iface,
            &response_header(Map::CODE, REQ_GET_DATA, payload.len()),
            &payload,
        )
        .unwrap();
        assert_eq!(iface.tile().unwrap().data.len(), 4);
    }

    #[test]
    fn vector_reply_decode() {
        let iface = Map::new(DeviceAddress::new(Map::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        enc.f32(-1.0);
        enc.f32(1.0);
        enc.f32(-1.0);
        enc.f32(1.0);
        enc.array_len(2);
        for i in 0..2 {
            enc.f64(f64::from(i));
            enc.f64(0.0);
            enc.f64(f64::from(i) + 1.0);
            enc.f64(1.0);
        }
        let payload = enc.into_bytes();
        assert_eq!(payload.len(), 24 + 2 * Segment::WIRE_SIZE);

        feed(
            &iface,
            &response_header(Map::CODE, REQ_GET_VECTOR, payload.len()),
            &payload,
        )
        .unwrap();

        let vector = iface.vector().unwrap();
        assert_eq!(vector.segments.len(), 2);
        assert_eq!(vector.segments[1].x1, 2.0);
    }

    #[test]
    fn tile_request_is_28_bytes() {
        let (sender, rx) = capture_sender();
        let iface = Map::new(DeviceAddress::new(Map::CODE, 0), sender);

        iface.request_tile(10, 20, 64, 64).unwrap();

        let (header, body) = take_sent(&rx);
        assert_eq!(header.msg_type(), MessageType::Request);
        assert_eq!(header.subtype(), REQ_GET_DATA);
        assert_eq!(body.len(), 28);
    }
}
