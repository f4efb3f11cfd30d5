//! Body framing guard
//!
//! Every decode routine reads through a [`BodyReader`] carrying the
//! header's declared payload size as a byte budget. The invariant: exactly
//! `size` bytes are consumed per message, including array padding, or the
//! stream position can no longer be trusted.

use std::io::Read;

use bytes::Bytes;
use tracing::trace;

use super::{Error, Result, XdrDecoder, xdr_padding};

/// Stream wrapper enforcing exact consumption of one message body.
pub struct BodyReader<'a> {
    stream: &'a mut dyn Read,
    remaining: usize,
    size: usize,
}

impl<'a> BodyReader<'a> {
    /// Wrap `stream` with a budget of `size` body bytes
    pub fn new(stream: &'a mut dyn Read, size: usize) -> Self {
        Self {
            stream,
            remaining: size,
            size,
        }
    }

    /// Declared body size
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Bytes still unconsumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn charge(&mut self, n: usize) -> Result<()> {
        if n > self.remaining {
            return Err(Error::BodyOverrun {
                requested: n,
                remaining: self.remaining,
                size: self.size,
            });
        }
        self.remaining -= n;
        Ok(())
    }

    /// Read exactly `n` bytes of the body into a buffer
    pub fn read_buf(&mut self, n: usize) -> Result<Bytes> {
        self.charge(n)?;
        let mut buf = vec![0u8; n];
        self.stream.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Read and discard `n` bytes
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.charge(n)?;
        let copied = std::io::copy(
            &mut (&mut self.stream).take(n as u64),
            &mut std::io::sink(),
        )?;
        if copied != n as u64 {
            return Err(Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }
        Ok(())
    }

    /// Consume the zero padding that follows an opaque field of `len` bytes
    pub fn skip_padding(&mut self, len: usize) -> Result<()> {
        self.skip(xdr_padding(len))
    }

    /// Read the dual count prefix of a variable-length array.
    ///
    /// Returns the logical element count. The XDR array-length word is
    /// consumed as well; a disagreement here is tolerated (framing follows
    /// the logical count) but worth a trace.
    pub fn read_array_prefix(&mut self) -> Result<u32> {
        let buf = self.read_buf(8)?;
        let mut dec = XdrDecoder::new(&buf);
        let count = dec.u32()?;
        let prefix = dec.u32()?;
        if prefix != count {
            trace!(count, prefix, "array count and XDR prefix disagree");
        }
        Ok(count)
    }

    /// Read `count` fixed-stride elements in one stream read.
    ///
    /// `decode` must consume exactly `stride` bytes per element.
    pub fn read_elements<T>(
        &mut self,
        count: usize,
        stride: usize,
        mut decode: impl FnMut(&mut XdrDecoder<'_>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let total = count.checked_mul(stride).ok_or(Error::BodyOverrun {
            requested: usize::MAX,
            remaining: self.remaining,
            size: self.size,
        })?;
        let buf = self.read_buf(total)?;
        let mut dec = XdrDecoder::new(&buf);
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(decode(&mut dec)?);
        }
        Ok(out)
    }

    /// Read and discard whatever is left of the body.
    ///
    /// Used for NACK/ERR bodies and unrecognized subtypes: the protocol is
    /// extensible, so the only safe interpretation of an unknown body is
    /// "skip exactly `size` bytes".
    pub fn drain(&mut self) -> Result<usize> {
        let n = self.remaining;
        self.skip(n)?;
        Ok(n)
    }

    /// Assert the body was consumed exactly
    pub fn finish(self) -> Result<()> {
        if self.remaining != 0 {
            return Err(Error::TrailingBytes {
                remaining: self.remaining,
                size: self.size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::XdrEncoder;

    #[test]
    fn exact_consumption_passes_finish() {
        let data = [0u8; 12];
        let mut stream: &[u8] = &data;
        let mut body = BodyReader::new(&mut stream, 12);
        body.read_buf(8).unwrap();
        body.skip(4).unwrap();
        body.finish().unwrap();
    }

    #[test]
    fn overrun_is_rejected_before_reading() {
        let data = [0u8; 64];
        let mut stream: &[u8] = &data;
        let mut body = BodyReader::new(&mut stream, 8);
        assert!(matches!(
            body.read_buf(12),
            Err(Error::BodyOverrun {
                requested: 12,
                remaining: 8,
                size: 8
            })
        ));
        // budget untouched after the refused read
        assert_eq!(body.remaining(), 8);
    }

    #[test]
    fn trailing_bytes_reported() {
        let data = [0u8; 8];
        let mut stream: &[u8] = &data;
        let mut body = BodyReader::new(&mut stream, 8);
        body.read_buf(4).unwrap();
        assert!(matches!(
            body.finish(),
            Err(Error::TrailingBytes {
                remaining: 4,
                size: 8
            })
        ));
    }

    #[test]
    fn array_prefix_returns_logical_count() {
        let mut enc = XdrEncoder::new();
        enc.array_len(3);
        let bytes = enc.into_bytes();
        let mut stream: &[u8] = &bytes;
        let mut body = BodyReader::new(&mut stream, 8);
        assert_eq!(body.read_array_prefix().unwrap(), 3);
        body.finish().unwrap();
    }

    #[test]
    fn padding_follows_odd_opaque() {
        assert_eq!(xdr_padding(5), 3);
        assert_eq!(xdr_padding(6), 2);
        assert_eq!(xdr_padding(7), 1);
        assert_eq!(xdr_padding(8), 0);

        let data = [0u8; 8];
        let mut stream: &[u8] = &data;
        let mut body = BodyReader::new(&mut stream, 8);
        body.read_buf(5).unwrap();
        body.skip_padding(5).unwrap();
        body.finish().unwrap();
    }

    #[test]
    fn drain_consumes_the_rest() {
        let data = [0u8; 20];
        let mut stream: &[u8] = &data;
        let mut body = BodyReader::new(&mut stream, 20);
        body.read_buf(4).unwrap();
        assert_eq!(body.drain().unwrap(), 16);
        body.finish().unwrap();
    }

    #[test]
    fn elements_consume_count_times_stride() {
        let mut enc = XdrEncoder::new();
        for i in 0..3 {
            enc.f32(i as f32);
            enc.f32(2.0 * i as f32);
        }
        let bytes = enc.into_bytes();
        let mut stream: &[u8] = &bytes;
        let mut body = BodyReader::new(&mut stream, bytes.len());
        let pairs = body
            .read_elements(3, 8, |dec| Ok((dec.f32()?, dec.f32()?)))
            .unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], (2.0, 4.0));
        body.finish().unwrap();
    }
}
