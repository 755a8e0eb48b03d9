//! Decoder for the post-r21 `GET_GPUPROPS` tag-value stream
//!
//! The stream is a tightly packed sequence of little-endian records:
//!
//! ```text
//! +----------------------+--------------------+
//! | header: u32          | value: 1/2/4/8 B   |
//! | [31:2] id [1:0] size |                    |
//! +----------------------+--------------------+
//! ```
//!
//! Every read is bounds checked; a record that runs past the end of the
//! buffer fails the whole decode.

use super::{PropertyField, PropertyId};
use crate::error::DecodeError;
use bytes::{Buf, BufMut};

const HEADER_BYTES: usize = 4;
const ID_SHIFT: u32 = 2;
const SIZE_MASK: u32 = 0b11;

/// Width of a value as encoded in the low header bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueWidth {
    /// `__u8`
    U8 = 0,
    /// `__u16`
    U16 = 1,
    /// `__u32`
    U32 = 2,
    /// `__u64`
    U64 = 3,
}

impl ValueWidth {
    fn from_header(header: u32) -> Self {
        match header & SIZE_MASK {
            0 => ValueWidth::U8,
            1 => ValueWidth::U16,
            2 => ValueWidth::U32,
            _ => ValueWidth::U64,
        }
    }

    /// Number of value bytes following the header
    pub const fn bytes(self) -> usize {
        1 << (self as usize)
    }
}

/// Streaming reader over a property buffer
///
/// Yields `(id, value)` for every record, including ids this crate does not
/// recognize, so callers can see the full stream.
pub struct PropertyDecoder<'a> {
    data: &'a [u8],
    len: usize,
    failed: bool,
}

impl<'a> PropertyDecoder<'a> {
    /// Create a decoder over `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, len: data.len(), failed: false }
    }

    fn offset(&self) -> usize {
        self.len - self.data.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        let remaining = self.data.remaining();
        if remaining < needed {
            return Err(DecodeError::Truncated { offset: self.offset(), needed, remaining });
        }
        Ok(())
    }

    fn read_record(&mut self) -> Result<(u32, u64), DecodeError> {
        self.ensure(HEADER_BYTES)?;
        let header = self.data.get_u32_le();
        let width = ValueWidth::from_header(header);

        self.ensure(width.bytes())?;
        let value = match width {
            ValueWidth::U8 => u64::from(self.data.get_u8()),
            ValueWidth::U16 => u64::from(self.data.get_u16_le()),
            ValueWidth::U32 => u64::from(self.data.get_u32_le()),
            ValueWidth::U64 => self.data.get_u64_le(),
        };

        Ok((header >> ID_SHIFT, value))
    }
}

impl Iterator for PropertyDecoder<'_> {
    type Item = Result<(u32, u64), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.data.has_remaining() {
            return None;
        }
        let record = self.read_record();
        self.failed = record.is_err();
        Some(record)
    }
}

/// Decode a property buffer into the fields this crate recognizes
///
/// Unknown ids are skipped. Any truncated record is an error; no partial
/// result is returned.
pub fn decode(data: &[u8]) -> Result<Vec<PropertyField>, DecodeError> {
    let mut fields = Vec::new();
    for record in PropertyDecoder::new(data) {
        let (code, value) = record?;
        match PropertyId::from_code(code) {
            Some(id) => fields.push(PropertyField { id, value }),
            None => log::trace!("skipping unknown property {} = 0x{:x}", code, value),
        }
    }
    Ok(fields)
}

/// Append one record to a property buffer
///
/// `value` is truncated to `width`. Used to build fixtures and fake driver
/// responses.
pub fn encode_property(out: &mut Vec<u8>, code: u32, width: ValueWidth, value: u64) {
    out.put_u32_le((code << ID_SHIFT) | width as u32);
    match width {
        ValueWidth::U8 => out.put_u8(value as u8),
        ValueWidth::U16 => out.put_u16_le(value as u16),
        ValueWidth::U32 => out.put_u32_le(value as u32),
        ValueWidth::U64 => out.put_u64_le(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn decodes_every_width() {
        let records = [
            (PropertyId::ProductId, ValueWidth::U32, 0x7212),
            (PropertyId::L2Log2CacheSize, ValueWidth::U8, 18),
            (PropertyId::MaxRegisters, ValueWidth::U16, 0x2000),
            (PropertyId::CoherencyGroup0, ValueWidth::U64, 0x0001_0000_0000_00ff),
        ];

        let mut buf = Vec::new();
        for (id, width, value) in records {
            encode_property(&mut buf, id.code(), width, value);
        }

        let expected: Vec<PropertyField> = records
            .iter()
            .map(|&(id, _, value)| PropertyField { id, value })
            .collect();
        assert_eq!(decode(&buf).unwrap(), expected);
    }

    #[test]
    fn header_packing_matches_the_driver() {
        let mut buf = Vec::new();
        encode_property(&mut buf, PropertyId::ProductId.code(), ValueWidth::U32, 0x9093);
        // id 1, size 2 -> header 0x6
        assert_eq!(buf, [0x06, 0x00, 0x00, 0x00, 0x93, 0x90, 0x00, 0x00]);
    }

    #[test]
    fn unknown_ids_are_skipped_but_consumed() {
        let mut buf = Vec::new();
        encode_property(&mut buf, 1000, ValueWidth::U64, u64::MAX);
        encode_property(&mut buf, 2, ValueWidth::U16, 7);
        encode_property(&mut buf, PropertyId::RawCoreFeatures.code(), ValueWidth::U32, 4);

        assert_eq!(
            decode(&buf).unwrap(),
            vec![PropertyField { id: PropertyId::RawCoreFeatures, value: 4 }]
        );
        assert_eq!(PropertyDecoder::new(&buf).count(), 3);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).unwrap(), Vec::new());
    }

    #[test]
    fn truncated_value_fails() {
        let mut buf = Vec::new();
        encode_property(&mut buf, PropertyId::ProductId.code(), ValueWidth::U32, 0x7002);
        encode_property(&mut buf, PropertyId::CoherencyGroup0.code(), ValueWidth::U64, 0xff);
        buf.truncate(buf.len() - 3);

        assert_eq!(
            decode(&buf),
            Err(DecodeError::Truncated { offset: 12, needed: 8, remaining: 5 })
        );
    }

    #[rstest]
    #[case(&[0x06])]
    #[case(&[0x06, 0x00, 0x00])]
    #[case(&[0x04, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00])]
    fn short_headers_fail(#[case] buf: &[u8]) {
        assert!(matches!(decode(buf), Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn iteration_stops_after_an_error() {
        let buf = [0x07, 0x00, 0x00, 0x00, 0x01];
        let mut decoder = PropertyDecoder::new(&buf);
        assert!(matches!(decoder.next(), Some(Err(_))));
        assert!(decoder.next().is_none());
    }

    #[test]
    fn width_bytes() {
        assert_eq!(ValueWidth::U8.bytes(), 1);
        assert_eq!(ValueWidth::U16.bytes(), 2);
        assert_eq!(ValueWidth::U32.bytes(), 4);
        assert_eq!(ValueWidth::U64.bytes(), 8);
    }
}
