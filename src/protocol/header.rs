//! Player message header
//!
//! The header is 40 bytes of XDR: a four-word device address, the message
//! type and subtype words, a double timestamp, a sequence number and the
//! payload byte length.

use std::fmt;
use std::io::Read;

use super::{Error, HEADER_SIZE, MAX_PAYLOAD_SIZE, MessageType, Result, XdrDecoder, XdrEncoder};

/// Address of a logical device on the server
///
/// `(interf, index)` selects the interface a message is routed to; `host`
/// and `robot` identify the server instance and are echoed back verbatim
/// when sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    /// Server host identifier
    pub host: u32,
    /// Server robot (port) identifier
    pub robot: u32,
    /// Interface code (which device type)
    pub interf: u16,
    /// Device index (which instance of the type)
    pub index: u16,
}

impl DeviceAddress {
    /// Address of a device on the local server instance
    #[must_use]
    pub const fn new(interf: u16, index: u16) -> Self {
        Self {
            host: 0,
            robot: 0,
            interf,
            index,
        }
    }

    /// Routing key: interface code and index
    #[must_use]
    pub const fn key(&self) -> (u16, u16) {
        (self.interf, self.index)
    }

    pub(crate) fn decode(dec: &mut XdrDecoder<'_>) -> Result<Self> {
        Ok(Self {
            host: dec.u32()?,
            robot: dec.u32()?,
            interf: dec.u32()? as u16,
            index: dec.u32()? as u16,
        })
    }

    pub(crate) fn encode(&self, enc: &mut XdrEncoder) {
        enc.u32(self.host);
        enc.u32(self.robot);
        enc.u32(u32::from(self.interf));
        enc.u32(u32::from(self.index));
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}:{}", self.interf, self.index, self.host, self.robot)
    }
}

/// Player message header (40 bytes)
///
/// # Wire Format
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Host (4)                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Robot (4)                          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          Interface (4)                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Index (4)                          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Message Type (4)                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Subtype (4)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                          Timestamp (8)                        +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          Sequence (4)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Payload Size (4)                       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// `size` is the exact number of payload bytes following the header; the
/// header itself is excluded. The consuming interface must read exactly
/// that many bytes or the stream desynchronizes.
#[derive(Debug, Clone, Copy)]
pub struct MessageHeader {
    address: DeviceAddress,
    msg_type: MessageType,
    subtype: u32,
    timestamp: f64,
    seq: u32,
    size: u32,
}

impl MessageHeader {
    /// Create a header for an outgoing message
    #[must_use]
    pub fn new(address: DeviceAddress, msg_type: MessageType, subtype: u32, size: u32) -> Self {
        Self {
            address,
            msg_type,
            subtype,
            timestamp: 0.0,
            seq: 0,
            size,
        }
    }

    /// Get the device address
    #[must_use]
    pub const fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Get the message type
    #[must_use]
    pub const fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    /// Get the subtype
    #[must_use]
    pub const fn subtype(&self) -> u32 {
        self.subtype
    }

    /// Get the server timestamp [s]
    #[must_use]
    pub const fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Get the sequence number
    #[must_use]
    pub const fn seq(&self) -> u32 {
        self.seq
    }

    /// Get the payload byte length (header excluded)
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Encode to wire bytes
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut enc = XdrEncoder::with_capacity(HEADER_SIZE);
        self.address.encode(&mut enc);
        enc.u32(self.msg_type.as_u32());
        enc.u32(self.subtype);
        enc.f64(self.timestamp);
        enc.u32(self.seq);
        enc.u32(self.size);
        let bytes = enc.into_bytes();
        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(&bytes);
        out
    }

    /// Parse from wire bytes, validating the type word and payload size
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::ShortHeader {
                needed: HEADER_SIZE,
                got: bytes.len(),
            });
        }
        let mut dec = XdrDecoder::new(&bytes[..HEADER_SIZE]);
        let address = DeviceAddress::decode(&mut dec)?;
        let type_word = dec.u32()?;
        let msg_type = MessageType::from_u32(type_word)
            .ok_or(Error::InvalidMessageType { type_word })?;
        let subtype = dec.u32()?;
        let timestamp = dec.f64()?;
        let seq = dec.u32()?;
        let size = dec.u32()?;
        if size as usize > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: size as usize,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self {
            address,
            msg_type,
            subtype,
            timestamp,
            seq,
            size,
        })
    }

    /// Read one header from a blocking stream.
    ///
    /// Never partially consumes a header: a short read is a fatal framing
    /// error, the only recovery is reconnecting.
    pub fn read_from(stream: &mut dyn Read) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        stream.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::ShortHeader {
                    needed: HEADER_SIZE,
                    got: 0,
                }
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_bytes(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let addr = DeviceAddress {
            host: 7,
            robot: 6665,
            interf: 53,
            index: 2,
        };
        let header = MessageHeader::new(addr, MessageType::Data, 1, 80);
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);

        let decoded = MessageHeader::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.address(), addr);
        assert_eq!(decoded.msg_type(), MessageType::Data);
        assert_eq!(decoded.subtype(), 1);
        assert_eq!(decoded.size(), 80);
    }

    #[test]
    fn invalid_type_word_rejected() {
        let addr = DeviceAddress::new(4, 0);
        let mut bytes = MessageHeader::new(addr, MessageType::Data, 1, 0).to_bytes();
        bytes[16..20].copy_from_slice(&99u32.to_be_bytes());
        assert!(matches!(
            MessageHeader::from_bytes(&bytes),
            Err(Error::InvalidMessageType { type_word: 99 })
        ));
    }

    #[test]
    fn oversized_payload_rejected() {
        let addr = DeviceAddress::new(4, 0);
        let mut bytes = MessageHeader::new(addr, MessageType::Data, 1, 0).to_bytes();
        let huge = (MAX_PAYLOAD_SIZE as u32) + 1;
        bytes[36..40].copy_from_slice(&huge.to_be_bytes());
        assert!(matches!(
            MessageHeader::from_bytes(&bytes),
            Err(Error::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn short_stream_is_framing_error() {
        let mut stream: &[u8] = &[0u8; 10];
        assert!(matches!(
            MessageHeader::read_from(&mut stream),
            Err(Error::ShortHeader { .. })
        ));
    }
}
