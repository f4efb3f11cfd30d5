//! Gripper interface
//!
//! Reports the gripper state and breakbeam occupancy; accepts the five
//! classic open/close/stop/store/retrieve commands.

use crate::client::{Latch, Sender};
use crate::protocol::geom::{Bbox3d, Pose3d};
use crate::protocol::{
    BodyReader, DeviceAddress, MessageHeader, Result, XdrDecoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;

const CMD_OPEN: u32 = 1;
const CMD_CLOSE: u32 = 2;
const CMD_STOP: u32 = 3;
const CMD_STORE: u32 = 4;
const CMD_RETRIEVE: u32 = 5;

const REQ_GET_GEOM: u32 = 1;

/// Gripper state data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GripperData {
    /// Gripper state (open, closed, moving, error)
    pub state: u8,
    /// Breakbeam bit mask: which beams are interrupted
    pub beams: u32,
    /// Number of currently stored objects
    pub stored: u8,
}

/// Gripper geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GripperGeom {
    /// Pose of the gripper in the robot frame
    pub pose: Pose3d,
    /// Outside dimensions
    pub outer_size: Bbox3d,
    /// Inside dimensions (the space an object fits into)
    pub inner_size: Bbox3d,
    /// Number of breakbeams
    pub num_beams: u8,
    /// Storage capacity
    pub capacity: u8,
}

/// Gripper device interface
pub struct Gripper {
    core: DeviceCore,
    data: Latch<GripperData>,
    geom: Latch<GripperGeom>,
}

impl Gripper {
    /// Interface code
    pub const CODE: u16 = 3;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("gripper", address, sender),
            data: Latch::new(),
            geom: Latch::new(),
        }
    }

    /// Tell the gripper to open
    pub fn open(&self) -> Result<()> {
        self.core.command(CMD_OPEN, &[])
    }

    /// Tell the gripper to close
    pub fn close(&self) -> Result<()> {
        self.core.command(CMD_CLOSE, &[])
    }

    /// Tell the gripper to stop
    pub fn stop(&self) -> Result<()> {
        self.core.command(CMD_STOP, &[])
    }

    /// Tell the gripper to store whatever it is holding
    pub fn store(&self) -> Result<()> {
        self.core.command(CMD_STORE, &[])
    }

    /// Tell the gripper to retrieve a stored object
    pub fn retrieve(&self) -> Result<()> {
        self.core.command(CMD_RETRIEVE, &[])
    }

    /// Request the gripper geometry; the reply lands in [`Gripper::geom`]
    pub fn query_geometry(&self) -> Result<()> {
        self.core.request(REQ_GET_GEOM, &[])
    }

    /// Most recent state data
    #[must_use]
    pub fn data(&self) -> Option<GripperData> {
        self.data.get()
    }

    /// Edge-triggered: has new state data arrived since the last call?
    #[must_use]
    pub fn is_data_ready(&self) -> bool {
        self.data.take_ready()
    }

    /// Most recent geometry reply
    #[must_use]
    pub fn geom(&self) -> Option<GripperGeom> {
        self.geom.get()
    }

    /// Edge-triggered: has a new geometry reply arrived since the last call?
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

impl Device for Gripper {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let buf = body.read_buf(12)?;
                let mut dec = XdrDecoder::new(&buf);
                self.data.publish(GripperData {
                    state: dec.byte()?,
                    beams: dec.u32()?,
                    stored: dec.byte()?,
                });
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_GET_GEOM => {
                self.core.touch(header);
                let buf = body.read_buf(104)?;
                let mut dec = XdrDecoder::new(&buf);
                self.geom.publish(GripperGeom {
                    pose: Pose3d::decode(&mut dec)?,
                    outer_size: Bbox3d::decode(&mut dec)?,
                    inner_size: Bbox3d::decode(&mut dec)?,
                    num_beams: dec.byte()?,
                    capacity: dec.byte()?,
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
    use crate::devices::test_support::{capture_sender, data_header, feed, null_sender, take_sent};
    use crate::protocol::{MessageType, XdrEncoder};

    #[test]
    fn state_decode() {
        let iface = Gripper::new(DeviceAddress::new(Gripper::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        enc.byte(2);
        enc.u32(0b101);
        enc.byte(1);
        let payload = enc.into_bytes();

        feed(
            &iface,
            &data_header(Gripper::CODE, DATA_STATE, payload.len()),
            &payload,
        )
        .unwrap();

        assert!(iface.is_data_ready());
        let data = iface.data().unwrap();
        assert_eq!(data.state, 2);
        assert_eq!(data.beams, 0b101);
        assert_eq!(data.stored, 1);
    }

    #[test]
    fn commands_are_null_bodied() {
        let (sender, rx) = capture_sender();
        let iface = Gripper::new(DeviceAddress::new(Gripper::CODE, 0), sender);

        iface.open().unwrap();
        iface.retrieve().unwrap();

        let (header, body) = take_sent(&rx);
        assert_eq!(header.msg_type(), MessageType::Command);
        assert_eq!(header.subtype(), CMD_OPEN);
        assert!(body.is_empty());

        let (header, _) = take_sent(&rx);
        assert_eq!(header.subtype(), CMD_RETRIEVE);
    }

    #[test]
    fn geometry_response_decode() {
        let iface = Gripper::new(DeviceAddress::new(Gripper::CODE, 0), null_sender());

        let mut enc = XdrEncoder::new();
        Pose3d {
            px: 0.1,
            ..Default::default()
        }
        .encode(&mut enc);
        for v in [0.4, 0.3, 0.2, 0.1, 0.05, 0.02] {
            enc.f64(v);
        }
        enc.byte(2);
        enc.byte(1);
        let payload = enc.into_bytes();
        assert_eq!(payload.len(), 104);

        let header = crate::devices::test_support::response_header(
            Gripper::CODE,
            REQ_GET_GEOM,
            payload.len(),
        );
        feed(&iface, &header, &payload).unwrap();

        assert!(iface.is_geom_ready());
        let geom = iface.geom().unwrap();
        assert_eq!(geom.pose.px, 0.1);
        assert_eq!(geom.outer_size.sw, 0.4);
        assert_eq!(geom.inner_size.sh, 0.02);
        assert_eq!(geom.num_beams, 2);
    }
}
