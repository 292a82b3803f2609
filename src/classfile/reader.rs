//! Big-endian cursor over class-file bytes.

use super::{DecodeResult, MalformedClassError};

#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub(crate) fn bytes(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(MalformedClassError::UnexpectedEof {
                offset: self.pos,
                wanted: len,
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn skip(&mut self, len: usize) -> DecodeResult<()> {
        self.bytes(len).map(|_| ())
    }

    pub(crate) fn u8(&mut self) -> DecodeResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> DecodeResult<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> DecodeResult<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn i8(&mut self) -> DecodeResult<i8> {
        Ok(self.u8()? as i8)
    }

    pub(crate) fn i16(&mut self) -> DecodeResult<i16> {
        Ok(self.u16()? as i16)
    }

    pub(crate) fn i32(&mut self) -> DecodeResult<i32> {
        Ok(self.u32()? as i32)
    }

    pub(crate) fn u64(&mut self) -> DecodeResult<u64> {
        let high = u64::from(self.u32()?);
        let low = u64::from(self.u32()?);
        Ok((high << 32) | low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian() {
        let mut r = ByteReader::new(&[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0xFF]);
        assert_eq!(r.u32().unwrap(), 0xCAFE_BABE);
        assert_eq!(r.u16().unwrap(), 52);
        assert_eq!(r.i8().unwrap(), -1);
        assert!(r.is_empty());
    }

    #[test]
    fn test_eof_reports_offset() {
        let mut r = ByteReader::new(&[0x01]);
        assert_eq!(
            r.u16(),
            Err(MalformedClassError::UnexpectedEof {
                offset: 0,
                wanted: 2
            })
        );
    }
}
