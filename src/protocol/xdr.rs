//! XDR primitive codec
//!
//! External Data Representation per RFC 4506: big-endian scalars, every
//! field occupying a multiple of 4 bytes. Single bytes and booleans travel
//! as full 4-byte words; opaque data is padded with zeros to a 4-byte
//! boundary.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Error, Result, xdr_padding};

/// Decoder over a fixed byte buffer.
///
/// Mirrors the usual Player decode pattern: read an exact number of bytes
/// from the stream first, then pick the buffer apart field by field.
pub struct XdrDecoder<'a> {
    buf: &'a [u8],
}

impl<'a> XdrDecoder<'a> {
    /// Wrap a buffer for decoding
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes left in the buffer
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                got: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Decode a signed 32-bit integer
    pub fn i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    /// Decode an unsigned 32-bit integer
    pub fn u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    /// Decode a signed 64-bit integer
    pub fn i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    /// Decode a single-precision float
    pub fn f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32())
    }

    /// Decode a double-precision float
    pub fn f64(&mut self) -> Result<f64> {
        self.ensure(8)?;
        Ok(self.buf.get_f64())
    }

    /// Decode a byte (carried as a full 4-byte word)
    pub fn byte(&mut self) -> Result<u8> {
        Ok(self.u32()? as u8)
    }

    /// Decode a boolean (carried as a full 4-byte word)
    pub fn boolean(&mut self) -> Result<bool> {
        Ok(self.u32()? != 0)
    }

    /// Decode `len` raw opaque bytes (no padding consumed)
    pub fn opaque(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        Ok(self.buf.copy_to_bytes(len))
    }

    /// Skip `len` bytes
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.ensure(len)?;
        self.buf.advance(len);
        Ok(())
    }

    /// Decode a length-prefixed string (prefix + bytes + padding)
    pub fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let raw = self.opaque(len)?;
        self.skip(xdr_padding(len))?;
        Ok(String::from_utf8(raw.to_vec())?)
    }
}

/// Encoder writing XDR fields into a growable buffer.
#[derive(Default)]
pub struct XdrEncoder {
    buf: BytesMut,
}

impl XdrEncoder {
    /// Create an empty encoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with a capacity hint
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Bytes encoded so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been encoded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a signed 32-bit integer
    pub fn i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    /// Encode an unsigned 32-bit integer
    pub fn u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Encode a signed 64-bit integer
    pub fn i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    /// Encode a single-precision float
    pub fn f32(&mut self, value: f32) {
        self.buf.put_f32(value);
    }

    /// Encode a double-precision float
    pub fn f64(&mut self, value: f64) {
        self.buf.put_f64(value);
    }

    /// Encode a byte as a full 4-byte word
    pub fn byte(&mut self, value: u8) {
        self.buf.put_u32(u32::from(value));
    }

    /// Encode a boolean as a full 4-byte word
    pub fn boolean(&mut self, value: bool) {
        self.buf.put_u32(u32::from(value));
    }

    /// Encode raw opaque bytes followed by zero padding to a 4-byte boundary
    pub fn opaque(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
        self.buf.put_bytes(0, xdr_padding(data.len()));
    }

    /// Encode the dual count prefix every variable-length array carries:
    /// the logical element count followed by the XDR array-length word.
    pub fn array_len(&mut self, count: u32) {
        self.buf.put_u32(count);
        self.buf.put_u32(count);
    }

    /// Finish encoding and take the buffer
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_roundtrip() {
        let mut enc = XdrEncoder::new();
        enc.i32(-7);
        enc.u32(0xDEAD_BEEF);
        enc.f32(1.5);
        enc.f64(-2.25);
        enc.i64(1 << 40);
        enc.byte(0xAB);
        enc.boolean(true);
        let bytes = enc.into_bytes();
        assert_eq!(bytes.len(), 4 + 4 + 4 + 8 + 8 + 4 + 4);

        let mut dec = XdrDecoder::new(&bytes);
        assert_eq!(dec.i32().unwrap(), -7);
        assert_eq!(dec.u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(dec.f32().unwrap(), 1.5);
        assert_eq!(dec.f64().unwrap(), -2.25);
        assert_eq!(dec.i64().unwrap(), 1 << 40);
        assert_eq!(dec.byte().unwrap(), 0xAB);
        assert!(dec.boolean().unwrap());
        assert_eq!(dec.remaining(), 0);
    }

    #[test]
    fn byte_occupies_full_word() {
        let mut enc = XdrEncoder::new();
        enc.byte(3);
        enc.f32(2.0);
        let bytes = enc.into_bytes();
        // joint byte + float command payload shape
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 3]);
    }

    #[test]
    fn opaque_is_padded() {
        let mut enc = XdrEncoder::new();
        enc.opaque(b"abcde");
        let bytes = enc.into_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[5..8], &[0, 0, 0]);
    }

    #[test]
    fn string_roundtrip() {
        let mut enc = XdrEncoder::new();
        enc.u32(5);
        enc.opaque(b"motor");
        let bytes = enc.into_bytes();

        let mut dec = XdrDecoder::new(&bytes);
        assert_eq!(dec.string().unwrap(), "motor");
        assert_eq!(dec.remaining(), 0);
    }

    #[test]
    fn underflow_is_reported() {
        let mut dec = XdrDecoder::new(&[0, 1]);
        assert!(matches!(
            dec.u32(),
            Err(Error::BufferTooSmall { needed: 4, got: 2 })
        ));
    }

    #[test]
    fn big_endian_on_the_wire() {
        let mut enc = XdrEncoder::new();
        enc.u32(0x0102_0304);
        assert_eq!(enc.into_bytes().as_ref(), &[1, 2, 3, 4]);
    }

    // Property-based tests
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every scalar survives an encode/decode roundtrip
            #[test]
            fn prop_scalar_roundtrip(
                a in any::<i32>(),
                b in any::<u32>(),
                c in any::<i64>(),
                d in any::<f64>(),
                e in any::<u8>(),
                f in any::<bool>(),
            ) {
                let mut enc = XdrEncoder::new();
                enc.i32(a);
                enc.u32(b);
                enc.i64(c);
                enc.f64(d);
                enc.byte(e);
                enc.boolean(f);
                let bytes = enc.into_bytes();

                let mut dec = XdrDecoder::new(&bytes);
                prop_assert_eq!(dec.i32().unwrap(), a);
                prop_assert_eq!(dec.u32().unwrap(), b);
                prop_assert_eq!(dec.i64().unwrap(), c);
                prop_assert_eq!(dec.f64().unwrap().to_bits(), d.to_bits());
                prop_assert_eq!(dec.byte().unwrap(), e);
                prop_assert_eq!(dec.boolean().unwrap(), f);
                prop_assert_eq!(dec.remaining(), 0);
            }

            /// Property: opaque fields always land on a 4-byte boundary
            #[test]
            fn prop_opaque_alignment(data in prop::collection::vec(any::<u8>(), 0..256)) {
                let mut enc = XdrEncoder::new();
                enc.opaque(&data);
                let bytes = enc.into_bytes();

                prop_assert_eq!(bytes.len() % 4, 0);
                prop_assert_eq!(&bytes[..data.len()], data.as_slice());
                prop_assert!(bytes[data.len()..].iter().all(|b| *b == 0));
            }

            /// Property: the array prefix carries the count twice
            #[test]
            fn prop_array_prefix_duplicated(count in any::<u32>()) {
                let mut enc = XdrEncoder::new();
                enc.array_len(count);
                let bytes = enc.into_bytes();

                let mut dec = XdrDecoder::new(&bytes);
                prop_assert_eq!(dec.u32().unwrap(), count);
                prop_assert_eq!(dec.u32().unwrap(), count);
            }
        }
    }
}
