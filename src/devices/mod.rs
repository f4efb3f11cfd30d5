//! Device interfaces
//!
//! One module per Player device type. Every interface follows the same
//! shape: latched payload slots with edge-triggered readiness, command and
//! request senders, and the [`Device`] decode hooks the router invokes.

mod actarray;
mod audio;
mod bumper;
mod camera;
mod fiducial;
mod graphics3d;
mod gripper;
mod health;
mod imu;
mod ir;
mod joystick;
mod limb;
mod map;
mod opaque;
mod pointcloud3d;
mod position2d;
mod position3d;
mod sonar;
mod speech_recognition;
mod stereo;

pub use actarray::{
    Actarray, ActarrayActuator, ActarrayActuatorGeom, ActarrayData, ActarrayGeom,
};
pub use audio::{
    Audio, AudioMixerChannel, AudioMixerChannelDetail, AudioMixerDetails, AudioSample,
    AudioSeqItem, AudioWav,
};
pub use bumper::{Bumper, BumperDefine};
pub use camera::{Camera, CameraFrame};
pub use fiducial::{Fiducial, FiducialFov, FiducialGeom, FiducialItem};
pub use graphics3d::{DrawMode, Graphics3d};
pub use gripper::{Gripper, GripperData, GripperGeom};
pub use health::{Health, HealthCpu, HealthData, HealthMemory};
pub use imu::{Imu, ImuCalib, ImuEuler, ImuFullState, ImuQuat};
pub use ir::{Ir, IrData};
pub use joystick::{Joystick, JoystickData};
pub use limb::{Limb, LimbData, LimbGeom};
pub use map::{Map, MapInfo, MapTile, MapVector};
pub use opaque::Opaque;
pub use pointcloud3d::{PointCloud3d, PointCloud3dElement};
pub use position2d::{Position2d, Position2dData, Position2dGeom};
pub use position3d::{Position3d, Position3dData, Position3dGeom};
pub use sonar::Sonar;
pub use speech_recognition::SpeechRecognition;
pub use stereo::{Stereo, StereoData, StereoPoint};

use std::sync::Mutex;

use tracing::debug;

use crate::client::Sender;
use crate::protocol::{BodyReader, DeviceAddress, MessageHeader, MessageType, Result};

/// Decode hooks the dispatch router drives.
///
/// Implementations must consume exactly `header.size` bytes from the body
/// reader across all paths, including the unknown-subtype one.
pub trait Device: Send + Sync {
    /// Address this interface is registered under
    fn address(&self) -> DeviceAddress;

    /// Decode one DATA message
    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()>;

    /// Decode one RESP_ACK message
    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()>;
}

/// State and plumbing shared by every interface: the subscribed address,
/// the connection's write half, and the last server timestamp seen.
pub(crate) struct DeviceCore {
    address: DeviceAddress,
    sender: Sender,
    name: &'static str,
    timestamp: Mutex<f64>,
}

impl DeviceCore {
    pub(crate) fn new(name: &'static str, address: DeviceAddress, sender: Sender) -> Self {
        Self {
            address,
            sender,
            name,
            timestamp: Mutex::new(0.0),
        }
    }

    pub(crate) fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Send a CMD message with the given body
    pub(crate) fn command(&self, subtype: u32, body: &[u8]) -> Result<()> {
        self.sender
            .send(self.address, MessageType::Command, subtype, body)
    }

    /// Send a REQ message with the given body
    pub(crate) fn request(&self, subtype: u32, body: &[u8]) -> Result<()> {
        self.sender
            .send(self.address, MessageType::Request, subtype, body)
    }

    /// Record the server timestamp of a decoded message
    pub(crate) fn touch(&self, header: &MessageHeader) {
        let mut ts = self
            .timestamp
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *ts = header.timestamp();
    }

    /// Server timestamp of the most recently decoded message [s]
    pub(crate) fn timestamp(&self) -> f64 {
        *self
            .timestamp
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Skip a message with a subtype this interface does not understand.
    ///
    /// Not an error: the protocol is extensible and older clients must
    /// tolerate newer subtypes, as long as the declared size is honored.
    pub(crate) fn skip_unknown(
        &self,
        header: &MessageHeader,
        body: &mut BodyReader<'_>,
    ) -> Result<()> {
        debug!(
            device = self.name,
            msg_type = %header.msg_type(),
            subtype = header.subtype(),
            size = header.size(),
            "unexpected subtype, skipping body"
        );
        body.drain()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use std::sync::mpsc;

    use crate::client::Sender;
    use crate::protocol::{BodyReader, DeviceAddress, MessageHeader, MessageType};

    struct ChannelSink(mpsc::Sender<Vec<u8>>);

    impl Write for ChannelSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.send(buf.to_vec()).ok();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Sender whose writes are captured chunk-by-chunk (header, then body)
    pub(crate) fn capture_sender() -> (Sender, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel();
        (Sender::new(Box::new(ChannelSink(tx))), rx)
    }

    /// Sender whose writes vanish
    pub(crate) fn null_sender() -> Sender {
        capture_sender().0
    }

    pub(crate) fn data_header(interf: u16, subtype: u32, size: usize) -> MessageHeader {
        MessageHeader::new(
            DeviceAddress::new(interf, 0),
            MessageType::Data,
            subtype,
            size as u32,
        )
    }

    pub(crate) fn response_header(interf: u16, subtype: u32, size: usize) -> MessageHeader {
        MessageHeader::new(
            DeviceAddress::new(interf, 0),
            MessageType::ResponseAck,
            subtype,
            size as u32,
        )
    }

    /// Drive a decode hook over an in-memory body and assert exact framing
    pub(crate) fn feed<D: super::Device>(
        device: &D,
        header: &MessageHeader,
        payload: &[u8],
    ) -> crate::protocol::Result<()> {
        assert_eq!(header.size() as usize, payload.len(), "test payload size");
        let mut stream: &[u8] = payload;
        let mut body = BodyReader::new(&mut stream, payload.len());
        match header.msg_type() {
            MessageType::Data => device.on_data(header, &mut body)?,
            MessageType::ResponseAck => device.on_response(header, &mut body)?,
            other => panic!("feed() does not handle {other}"),
        }
        body.finish()
    }

    /// Pop one sent message off a capture channel: (header, body bytes)
    pub(crate) fn take_sent(rx: &mpsc::Receiver<Vec<u8>>) -> (MessageHeader, Vec<u8>) {
        let header = MessageHeader::from_bytes(&rx.recv().expect("header chunk")).expect("header");
        let body = if header.size() == 0 {
            Vec::new()
        } else {
            rx.recv().expect("body chunk")
        };
        assert_eq!(header.size() as usize, body.len());
        (header, body)
    }
}
