//! Camera interface
//!
//! Delivers packed image frames. The image byte stream carries its length
//! twice (the logical `image_count` field and the XDR byte-stream prefix);
//! the two must agree or the stream framing cannot be trusted.

use bytes::Bytes;

use crate::client::{Latch, Sender};
use crate::protocol::{
    BodyReader, DeviceAddress, Error, MessageHeader, Result, XdrDecoder,
};

use super::{Device, DeviceCore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DATA_STATE: u32 = 1;
const REQ_GET_IMAGE: u32 = 1;

/// One camera frame
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraFrame {
    /// Image width [px]
    pub width: i32,
    /// Image height [px]
    pub height: i32,
    /// Bits per pixel
    pub bpp: i32,
    /// Pixel format code
    pub format: i32,
    /// Frequency divider applied by the driver
    pub fdiv: i32,
    /// Compression code (0 = raw)
    pub compression: i32,
    /// Packed image bytes
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes_compat"))]
    pub image: Bytes,
}

#[cfg(feature = "serde")]
mod serde_bytes_compat {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Bytes, D::Error> {
        Ok(Bytes::from(Vec::<u8>::deserialize(de)?))
    }
}

/// Shared by camera and stereo: decode one frame from the body.
///
/// `padded` selects whether the trailing XDR alignment bytes after the
/// image are consumed (a lone camera frame is padded; the frames embedded
/// in a stereo message are not).
pub(crate) fn decode_frame(body: &mut BodyReader<'_>, padded: bool) -> Result<CameraFrame> {
    let buf = body.read_buf(28)?;
    let mut dec = XdrDecoder::new(&buf);
    let width = dec.i32()?;
    let height = dec.i32()?;
    let bpp = dec.i32()?;
    let format = dec.i32()?;
    let fdiv = dec.i32()?;
    let compression = dec.i32()?;
    let image_count = dec.u32()?;

    // The XDR byte-stream prefix duplicates image_count; this is the one
    // place the duplicate-length convention can be checked independently.
    let prefix_buf = body.read_buf(4)?;
    let prefix = XdrDecoder::new(&prefix_buf).u32()?;
    if prefix != image_count {
        return Err(Error::CountMismatch {
            declared: image_count,
            prefix,
        });
    }

    let image = body.read_buf(image_count as usize)?;
    if padded {
        body.skip_padding(image_count as usize)?;
    }

    Ok(CameraFrame {
        width,
        height,
        bpp,
        format,
        fdiv,
        compression,
        image,
    })
}

/// Camera device interface
pub struct Camera {
    core: DeviceCore,
    frame: Latch<CameraFrame>,
}

impl Camera {
    /// Interface code
    pub const CODE: u16 = 40;

    pub(crate) fn new(address: DeviceAddress, sender: Sender) -> Self {
        Self {
            core: DeviceCore::new("camera", address, sender),
            frame: Latch::new(),
        }
    }

    /// Request the current frame explicitly; the reply lands in
    /// [`Camera::frame`] just like pushed data.
    pub fn request_image(&self) -> Result<()> {
        self.core.request(REQ_GET_IMAGE, &[])
    }

    /// Most recent frame
    #[must_use]
    pub fn frame(&self) -> Option<CameraFrame> {
        self.frame.get()
    }

    /// Edge-triggered: has a new frame arrived since the last call?
    #[must_use]
    pub fn is_frame_ready(&self) -> bool {
        self.frame.take_ready()
    }

    /// Server timestamp of the most recent message [s]
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.core.timestamp()
    }
}

impl Device for Camera {
    fn address(&self) -> DeviceAddress {
        self.core.address()
    }

    fn on_data(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            DATA_STATE => {
                self.core.touch(header);
                let frame = decode_frame(body, true)?;
                self.frame.publish(frame);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }

    fn on_response(&self, header: &MessageHeader, body: &mut BodyReader<'_>) -> Result<()> {
        match header.subtype() {
            REQ_GET_IMAGE => {
                self.core.touch(header);
                let frame = decode_frame(body, true)?;
                self.frame.publish(frame);
                Ok(())
            }
            _ => self.core.skip_unknown(header, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::test_support::{data_header, feed, null_sender};
    use crate::protocol::{XdrEncoder, xdr_padding};

    pub(crate) fn frame_payload(image: &[u8]) -> Vec<u8> {
        let mut enc = XdrEncoder::new();
        enc.i32(4);
        enc.i32(3);
        enc.i32(8);
        enc.i32(1);
        enc.i32(1);
        enc.i32(0);
        enc.u32(image.len() as u32);
        enc.u32(image.len() as u32);
        enc.opaque(image);
        enc.into_bytes().to_vec()
    }

    #[test]
    fn odd_length_image_is_padded_and_consumed() {
        let iface = Camera::new(DeviceAddress::new(Camera::CODE, 0), null_sender());

        let image = [1u8, 2, 3, 4, 5];
        let payload = frame_payload(&image);
        assert_eq!(payload.len(), 32 + image.len() + xdr_padding(image.len()));

        feed(
            &iface,
            &data_header(Camera::CODE, DATA_STATE, payload.len()),
            &payload,
        )
        .unwrap();

        assert!(iface.is_frame_ready());
        let frame = iface.frame().unwrap();
        assert_eq!(frame.width, 4);
        assert_eq!(frame.image.as_ref(), &image);
    }

    #[test]
    fn disagreeing_byte_stream_length_is_fatal() {
        let iface = Camera::new(DeviceAddress::new(Camera::CODE, 0), null_sender());

        let mut payload = frame_payload(&[9u8; 8]);
        // corrupt the XDR byte-stream prefix
        payload[28..32].copy_from_slice(&7u32.to_be_bytes());

        let header = data_header(Camera::CODE, DATA_STATE, payload.len());
        let err = feed(&iface, &header, &payload).unwrap_err();
        assert!(matches!(
            err,
            Error::CountMismatch {
                declared: 8,
                prefix: 7
            }
        ));
        assert!(!iface.is_frame_ready());
    }

    #[test]
    fn two_consecutive_odd_frames_stay_framed() {
        // Regression: a decoder that forgets the pad bytes desynchronizes
        // on the second message.
        let iface = Camera::new(DeviceAddress::new(Camera::CODE, 0), null_sender());

        for image in [&[1u8, 2, 3][..], &[4u8, 5, 6, 7, 8][..]] {
            let payload = frame_payload(image);
            feed(
                &iface,
                &data_header(Camera::CODE, DATA_STATE, payload.len()),
                &payload,
            )
            .unwrap();
            assert_eq!(iface.frame().unwrap().image.as_ref(), image);
        }
    }
}
