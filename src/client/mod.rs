//! Client connection, dispatch loop and interface registry

mod core;
mod latch;
mod router;
mod sender;

pub use latch::Latch;
pub use router::{Dispatch, Router};
pub use sender::Sender;

use std::io::{BufReader, BufWriter, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;

use tracing::{debug, info};

use crate::devices::{
    Actarray, Audio, Bumper, Camera, Device, Fiducial, Graphics3d, Gripper, Health, Imu, Ir,
    Joystick, Limb, Map, Opaque, PointCloud3d, Position2d, Position3d, Sonar, SpeechRecognition,
    Stereo,
};
use crate::protocol::{
    Access, BANNER_SIZE, DataMode, DeviceAddress, Error, Result,
};

use self::core::CoreInterface;

/// Connection to a Player server.
///
/// Owns the read half of the socket (through the embedded [`Router`]) and
/// hands out `Arc`-wrapped device interfaces whose senders share the write
/// half. All reads happen on the thread driving [`Client::read_message`] /
/// [`Client::run`]; getters and senders on the interfaces are safe to call
/// from any thread.
pub struct Client {
    router: Router<BufReader<TcpStream>>,
    sender: Sender,
    core: Arc<CoreInterface>,
    banner: String,
}

impl Client {
    /// Connect to a server and consume its banner.
    ///
    /// The stream is left positioned at the first message header.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let mut banner_buf = [0u8; BANNER_SIZE];
        reader.read_exact(&mut banner_buf).map_err(|e| Error::Handshake {
            reason: format!("no banner from server: {e}"),
        })?;
        let banner = String::from_utf8_lossy(&banner_buf)
            .trim_end_matches('\0')
            .trim()
            .to_string();
        if !banner.starts_with("Player") {
            return Err(Error::Handshake {
                reason: format!("unexpected banner {banner:?}"),
            });
        }
        info!(%banner, "connected");

        let sender = Sender::new(Box::new(BufWriter::new(stream)));
        let core = Arc::new(CoreInterface::new(sender.clone()));
        let mut router = Router::new(reader);
        router.register(core.clone());

        Ok(Self {
            router,
            sender,
            core,
            banner,
        })
    }

    /// Banner string the server sent on connect
    #[must_use]
    pub fn banner(&self) -> &str {
        &self.banner
    }

    /// Switch the server between push and pull data delivery.
    ///
    /// The acknowledgement is a null response consumed by the read loop.
    pub fn set_data_mode(&self, mode: DataMode) -> Result<()> {
        self.core.set_data_mode(mode)
    }

    /// Request one data cycle (pull mode only)
    pub fn request_data(&self) -> Result<()> {
        self.core.request_data()
    }

    /// Read and dispatch exactly one message
    pub fn read_message(&mut self) -> Result<Dispatch> {
        self.router.read_message()
    }

    /// Pull one complete data cycle: request data, then dispatch messages
    /// until the server's SYNCH marker.
    pub fn read_all(&mut self) -> Result<()> {
        self.core.request_data()?;
        self.router.read_until_synch()
    }

    /// Dispatch messages until the first fatal error
    pub fn run(&mut self) -> Result<()> {
        self.router.run()
    }

    /// Subscribe to a device and block until the server replies.
    fn subscribe(&mut self, interf: u16, index: u16) -> Result<DeviceAddress> {
        let requested = DeviceAddress::new(interf, index);
        self.core.request_device(requested, Access::All)?;

        loop {
            self.router.read_message()?;
            if !self.core.take_reply_ready() {
                continue;
            }
            let Some(reply) = self.core.reply() else {
                continue;
            };
            if reply.address.key() != (interf, index) {
                debug!(address = %reply.address, "subscription reply for a different device");
                continue;
            }
            if reply.access != Access::All.as_u8() {
                return Err(Error::SubscriptionRefused {
                    address: reply.address,
                    granted: reply.access,
                });
            }
            debug!(address = %reply.address, driver = %reply.driver_name, "subscribed");
            return Ok(reply.address);
        }
    }

    fn open<D: Device + 'static>(
        &mut self,
        interf: u16,
        index: u16,
        make: impl FnOnce(DeviceAddress, Sender) -> D,
    ) -> Result<Arc<D>> {
        let address = self.subscribe(interf, index)?;
        let device = Arc::new(make(address, self.sender.clone()));
        self.router.register(device.clone());
        Ok(device)
    }

    /// Subscribe to an actuator array device
    pub fn actarray(&mut self, index: u16) -> Result<Arc<Actarray>> {
        self.open(Actarray::CODE, index, Actarray::new)
    }

    /// Subscribe to an audio device
    pub fn audio(&mut self, index: u16) -> Result<Arc<Audio>> {
        self.open(Audio::CODE, index, Audio::new)
    }

    /// Subscribe to a bumper array device
    pub fn bumper(&mut self, index: u16) -> Result<Arc<Bumper>> {
        self.open(Bumper::CODE, index, Bumper::new)
    }

    /// Subscribe to a camera device
    pub fn camera(&mut self, index: u16) -> Result<Arc<Camera>> {
        self.open(Camera::CODE, index, Camera::new)
    }

    /// Subscribe to a fiducial finder device
    pub fn fiducial(&mut self, index: u16) -> Result<Arc<Fiducial>> {
        self.open(Fiducial::CODE, index, Fiducial::new)
    }

    /// Subscribe to a 3D graphics device
    pub fn graphics3d(&mut self, index: u16) -> Result<Arc<Graphics3d>> {
        self.open(Graphics3d::CODE, index, Graphics3d::new)
    }

    /// Subscribe to a gripper device
    pub fn gripper(&mut self, index: u16) -> Result<Arc<Gripper>> {
        self.open(Gripper::CODE, index, Gripper::new)
    }

    /// Subscribe to a system health device
    pub fn health(&mut self, index: u16) -> Result<Arc<Health>> {
        self.open(Health::CODE, index, Health::new)
    }

    /// Subscribe to an inertial measurement unit
    pub fn imu(&mut self, index: u16) -> Result<Arc<Imu>> {
        self.open(Imu::CODE, index, Imu::new)
    }

    /// Subscribe to an infrared ranger array
    pub fn ir(&mut self, index: u16) -> Result<Arc<Ir>> {
        self.open(Ir::CODE, index, Ir::new)
    }

    /// Subscribe to a joystick device
    pub fn joystick(&mut self, index: u16) -> Result<Arc<Joystick>> {
        self.open(Joystick::CODE, index, Joystick::new)
    }

    /// Subscribe to a limb device
    pub fn limb(&mut self, index: u16) -> Result<Arc<Limb>> {
        self.open(Limb::CODE, index, Limb::new)
    }

    /// Subscribe to a map device
    pub fn map(&mut self, index: u16) -> Result<Arc<Map>> {
        self.open(Map::CODE, index, Map::new)
    }

    /// Subscribe to an opaque (user-defined) device
    pub fn opaque(&mut self, index: u16) -> Result<Arc<Opaque>> {
        self.open(Opaque::CODE, index, Opaque::new)
    }

    /// Subscribe to a 3D point cloud device
    pub fn pointcloud3d(&mut self, index: u16) -> Result<Arc<PointCloud3d>> {
        self.open(PointCloud3d::CODE, index, PointCloud3d::new)
    }

    /// Subscribe to a planar odometry device
    pub fn position2d(&mut self, index: u16) -> Result<Arc<Position2d>> {
        self.open(Position2d::CODE, index, Position2d::new)
    }

    /// Subscribe to a 3D odometry device
    pub fn position3d(&mut self, index: u16) -> Result<Arc<Position3d>> {
        self.open(Position3d::CODE, index, Position3d::new)
    }

    /// Subscribe to a sonar array device
    pub fn sonar(&mut self, index: u16) -> Result<Arc<Sonar>> {
        self.open(Sonar::CODE, index, Sonar::new)
    }

    /// Subscribe to a speech recognition device
    pub fn speech_recognition(&mut self, index: u16) -> Result<Arc<SpeechRecognition>> {
        self.open(SpeechRecognition::CODE, index, SpeechRecognition::new)
    }

    /// Subscribe to a stereo vision device
    pub fn stereo(&mut self, index: u16) -> Result<Arc<Stereo>> {
        self.open(Stereo::CODE, index, Stereo::new)
    }
}
