//! Speech recognition interface
//!
//! Publishes recognized utterances as length-prefixed text.

use crate::client::{Latch, Sender};
use crate::protocol::{BodyReader, DeviceAddress, MessageHeader, Result};

use super::{Device, DeviceCore};

const DATA_STRING: u32 = 1;

/// Speech recognition device interface
pub struct SpeechRecognition {
    core: DeviceCore,
    text: Latch<String>,
}

impl SpeechRecognition {
    /// Interface code
    pub const CODE: u16 = 50;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("speech_recognition", address, sender),
            text: Latch::new(),
        }
    }

    /// Most recent recognized utterance
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.text.get()
    }

    /// Edge-triggered: has a new utterance arrived since the last call?
    #[must_use]
    pub fn is_text_ready(&self) -> bool {
        self.text.take_ready()
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for SpeechRecognition {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STRING => {
                self.core.touch(header);
                let count = body.read_array_prefix()? as usize;
                let raw = body.read_buf(count)?;
                body.skip_padding(count)?;
                self.text.publish(String::from_utf8(raw.to_vec())?);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        self.core.skip_unknown(header, body)
    }
}
