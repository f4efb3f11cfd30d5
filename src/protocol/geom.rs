//! Shared geometric wire structures
//!
//! These small records appear inside many device payloads. Each knows its
//! own XDR layout; composite payloads chain the `decode`/`encode` calls in
//! wire order.

use super::{Result, XdrDecoder, XdrEncoder};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Planar pose: position and heading
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose2d {
    /// X position [m]
    pub px: f64,
    /// Y position [m]
    pub py: f64,
    /// Heading [rad]
    pub pa: f64,
}

impl Pose2d {
    /// Wire size in bytes
    pub const WIRE_SIZE: usize = 24;

    pub(crate) fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            px: dec.f64()?,
            py: dec.f64()?,
            pa: dec.f64()?,
        })
    }

    pub(crate) fn encode(&self, enc: &mut XdrEncoder) {
        enc.f64(self.px);
        enc.f64(self.py);
        enc.f64(self.pa);
    }
}

/// Full 3D pose: position plus Euler orientation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose3d {
    /// X position [m]
    pub px: f64,
    /// Y position [m]
    pub py: f64,
    /// Z position [m]
    pub pz: f64,
    /// Roll [rad]
    pub proll: f64,
    /// Pitch [rad]
    pub ppitch: f64,
    /// Yaw [rad]
    pub pyaw: f64,
}

impl Pose3d {
    /// Wire size in bytes
    pub const WIRE_SIZE: usize = 48;

    pub(crate) fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            px: dec.f64()?,
            py: dec.f64()?,
            pz: dec.f64()?,
            proll: dec.f64()?,
            ppitch: dec.f64()?,
            pyaw: dec.f64()?,
        })
    }

    pub(crate) fn encode(&self, enc: &mut XdrEncoder) {
        enc.f64(self.px);
        enc.f64(self.py);
        enc.f64(self.pz);
        enc.f64(self.proll);
        enc.f64(self.ppitch);
        enc.f64(self.pyaw);
    }
}

/// 3D point or free vector
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3d {
    /// X [m]
    pub px: f64,
    /// Y [m]
    pub py: f64,
    /// Z [m]
    pub pz: f64,
}

impl Point3d {
    /// Wire size in bytes
    pub const WIRE_SIZE: usize = 24;

    pub(crate) fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            px: dec.f64()?,
            py: dec.f64()?,
            pz: dec.f64()?,
        })
    }

    pub(crate) fn encode(&self, enc: &mut XdrEncoder) {
        enc.f64(self.px);
        enc.f64(self.py);
        enc.f64(self.pz);
    }
}

/// Euler orientation triple
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Orientation3d {
    /// Roll [rad]
    pub proll: f64,
    /// Pitch [rad]
    pub ppitch: f64,
    /// Yaw [rad]
    pub pyaw: f64,
}

impl Orientation3d {
    /// Wire size in bytes
    pub const WIRE_SIZE: usize = 24;

    pub(crate) fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            proll: dec.f64()?,
            ppitch: dec.f64()?,
            pyaw: dec.f64()?,
        })
    }

    pub(crate) fn encode(&self, enc: &mut XdrEncoder) {
        enc.f64(self.proll);
        enc.f64(self.ppitch);
        enc.f64(self.pyaw);
    }
}

/// Planar bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bbox2d {
    /// Width [m]
    pub sw: f64,
    /// Length [m]
    pub sl: f64,
}

impl Bbox2d {
    /// Wire size in bytes
    pub const WIRE_SIZE: usize = 16;

    pub(crate) fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            sw: dec.f64()?,
            sl: dec.f64()?,
        })
    }
}

/// 3D bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bbox3d {
    /// Width [m]
    pub sw: f64,
    /// Length [m]
    pub sl: f64,
    /// Height [m]
    pub sh: f64,
}

impl Bbox3d {
    /// Wire size in bytes
    pub const WIRE_SIZE: usize = 24;

    pub(crate) fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            sw: dec.f64()?,
            sl: dec.f64()?,
            sh: dec.f64()?,
        })
    }
}

/// Line segment in the plane
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    /// Start X [m]
    pub x0: f64,
    /// Start Y [m]
    pub y0: f64,
    /// End X [m]
    pub x1: f64,
    /// End Y [m]
    pub y1: f64,
}

impl Segment {
    /// Wire size in bytes
    pub const WIRE_SIZE: usize = 32;

    pub(crate) fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            x0: dec.f64()?,
            y0: dec.f64()?,
            x1: dec.f64()?,
            y1: dec.f64()?,
        })
    }
}

/// ARGB color, one wire word per channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    /// Alpha channel
    pub alpha: u8,
    /// Red channel
    pub red: u8,
    /// Green channel
    pub green: u8,
    /// Blue channel
    pub blue: u8,
}

impl Color {
    /// Wire size in bytes
    pub const WIRE_SIZE: usize = 16;

    pub(crate) fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            alpha: dec.byte()?,
            red: dec.byte()?,
            green: dec.byte()?,
            blue: dec.byte()?,
        })
    }

    pub(crate) fn encode(&self, enc: &mut XdrEncoder) {
        enc.byte(self.alpha);
        enc.byte(self.red);
        enc.byte(self.green);
        enc.byte(self.blue);
    }
}
