//! Client library for the Player robot-device network protocol
//!
//! Player servers expose robot hardware as logical devices addressed by
//! `(interface code, index)`. Every message on the wire is a fixed 40-byte
//! XDR header followed by exactly `header.size` payload bytes; this crate
//! implements that framing discipline, the per-device payload codecs, and
//! the client-side dispatch loop that routes incoming messages to latched
//! per-device mailboxes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use player_client::Client;
//!
//! let mut client = Client::connect(("robot", player_client::DEFAULT_PORT))?;
//! let position = client.position2d(0)?;
//! let sonar = client.sonar(0)?;
//!
//! position.set_speed(0.3, 0.0)?;
//! loop {
//!     client.read_message()?;
//!     if sonar.is_ranges_ready() {
//!         let ranges = sonar.ranges().unwrap_or_default();
//!         if ranges.iter().any(|r| *r < 0.5) {
//!             position.set_speed(0.0, 0.0)?;
//!             break;
//!         }
//!     }
//! }
//! # Ok::<(), player_client::Error>(())
//! ```
//!
//! # Threading
//!
//! One thread drives the read loop ([`Client::read_message`] /
//! [`Client::run`]); it blocks on the socket and executes all decode
//! routines. Interface getters, readiness checks and command senders are
//! safe to call from any thread. There are no timeouts or internal
//! retries: transport and framing errors are fatal, and the caller is
//! expected to reconnect.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod client;
pub mod devices;
pub mod protocol;

pub use client::{Client, Dispatch, Latch, Router, Sender};
pub use devices::Device;
pub use protocol::{
    Access, BodyReader, DataMode, DeviceAddress, Error, MessageHeader, MessageType, Result,
};

/// Protocol generation this client speaks
pub const VERSION: &str = "3.1";

/// Default Player server port
pub const DEFAULT_PORT: u16 = 6665;
