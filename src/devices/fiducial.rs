//! Fiducial finder interface
//!
//! Detects coded markers and reports their poses relative to the sensor.

use crate::client::{Latch, Sender};
use crate::protocol::geom::{Bbox2d, Bbox3d, Pose3d};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder, XdrEncoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_SCAN: u32 = 1;

const REQ_GET_GEOM: u32 = 1;
const REQ_GET_FOV: u32 = 2;
const REQ_SET_FOV: u32 = 3;
const REQ_GET_ID: u32 = 7;
const REQ_SET_ID: u32 = 8;

/// One detected fiducial
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FiducialItem {
    /// Identifier read off the marker (-1 if unreadable)
    pub id: i32,
    /// Measured pose
    pub pose: Pose3d,
    /// Pose uncertainty
    pub upose: Pose3d,
}

impl FiducialItem {
    /// Wire stride per item
    pub const WIRE_SIZE: usize = 100;

    fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            id: dec.i32()?,
            pose: Pose3d::decode(dec)?,
            upose: Pose3d::decode(dec)?,
        })
    }
}

/// Fiducial detector geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FiducialGeom {
    /// Pose of the detector in the robot frame
    pub pose: Pose3d,
    /// Size of the detector
    pub size: Bbox3d,
    /// Dimensions of the fiducials themselves
    pub fiducial_size: Bbox2d,
}

/// Detector field of view
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FiducialFov {
    /// Minimum range [m]
    pub min_range: f32,
    /// Maximum range [m]
    pub max_range: f32,
    /// Receptive angle [rad]
    pub view_angle: f32,
}

/// Fiducial finder device interface
pub struct Fiducial {
    core: DeviceCore,
    scan: Latch<Vec<FiducialItem>>,
    geom: Latch<FiducialGeom>,
    fov: Latch<FiducialFov>,
    id: Latch<i32>,
}

impl Fiducial {
    /// Interface code
    pub const CODE: u16 = 10;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("fiducial", address, sender),
            scan: Latch::new(),
            geom: Latch::new(),
            fov: Latch::new(),
            id: Latch::new(),
        }
    }

    /// Request the detector geometry; the reply lands in [`Fiducial::geom`]
    pub fn query_geometry(&self) -> Result<()> {
        self.core.request(REQ_GET_GEOM, &[])
    }

    /// Request the field of view; the reply lands in [`Fiducial::fov`]
    pub fn query_fov(&self) -> Result<()> {
        self.core.request(REQ_GET_FOV, &[])
    }

    /// Set the field of view. Null response.
    pub fn set_fov(&self, fov: FiducialFov) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(12);
        enc.f32(fov.min_range);
        enc.f32(fov.max_range);
        enc.f32(fov.view_angle);
        self.core.request(REQ_SET_FOV, &enc.into_bytes())
    }

    /// Request the identifier this device displays; reply lands in
    /// [`Fiducial::displayed_id`]
    pub fn query_id(&self) -> Result<()> {
        self.core.request(REQ_GET_ID, &[])
    }

    /// Ask the device to display a given identifier.
    ///
    /// The device replies with the value it actually used, which may
    /// differ from the request.
    pub fn set_id(&self, id: i32) -> Result<()> {
        let mut enc = XdrEncoder::with_capacity(4);
        enc.i32(id);
        self.core.request(REQ_SET_ID, &enc.into_bytes())
    }

    /// Most recent scan
    #[must_use]
    pub fn scan(&self) -> Option<Vec<FiducialItem>> {
        self.scan.get()
    }

    /// Edge-triggered: has a new scan arrived since the last call?
    #[must_use]
    pub fn is_scan_ready(&self) -> bool {
        self.scan.take_ready()
    }

    /// Most recent geometry reply
    #[must_use]
    pub fn geom(&self) -> Option<FiducialGeom> {
        self.geom.get()
    }

    /// Edge-triggered readiness for the geometry slot
    #[must_use]
    pub fn is_geom_ready(&self) -> bool {
        self.geom.take_ready()
    }

    /// Most recent field-of-view reply
    #[must_use]
    pub fn fov(&self) -> Option<FiducialFov> {
        self.fov.get()
    }

    /// Edge-triggered readiness for the field-of-view slot
    #[must_use]
    pub fn is_fov_ready(&self) -> bool {
        self.fov.take_ready()
    }

    /// Identifier the device reported displaying
    #[must_use]
    pub fn displayed_id(&self) -> Option<i32> {
        self.id.get()
    }

    /// Edge-triggered readiness for the identifier slot
    #[must_use]
    pub fn is_id_ready(&self) -> bool {
        self.id.take_ready()
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for Fiducial {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_SCAN => {
                self.core.touch(header);
                let count = body.read_array_prefix()? as usize;
                let items =
                    body.read_elements(count, FiducialItem::WIRE_SIZE, FiducialItem::decode)?;
                self.scan.publish(items);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_GET_GEOM => {
                self.core.touch(header);
                let buf = body.read_buf(88)?;
                let mut dec = XdrDecoder::new(&buf);
                self.geom.publish(FiducialGeom {
                    pose: Pose3d::decode(&mut dec)?,
                    size: Bbox3d::decode(&mut dec)?,
                    fiducial_size: Bbox2d::decode(&mut dec)?,
                });
                Ok(())
            }
            REQ_GET_FOV => {
                self.core.touch(header);
                let buf = body.read_buf(12)?;
                let mut dec = XdrDecoder::new(&buf);
                self.fov.publish(FiducialFov {
                    min_range: dec.f32()?,
                    max_range: dec.f32()?,
                    view_angle: dec.f32()?,
                });
                Ok(())
            }
            REQ_GET_ID => {
                self.core.touch(header);
                let buf = body.read_buf(4)?;
                let mut dec = XdrDecoder::new(&buf);
                self.id.publish(dec.i32()?);
                Ok(())
            }
            REQ_SET_FOV | REQ_SET_ID => Ok(()),
            _ => self.core.skip_unknown(header, body),
        }
    }
}
