//! `TypedValue` — the fixed 8-byte value record used by table entries and
//! XML attributes/CDATA.

use crate::cursor::{Reader, Writer};
use crate::error::{Error, Result};

/// Known `data_type` codes. Not exhaustive of every value Android's runtime
/// accepts, but exhaustive of the ones this crate's callers need to read or
/// write without losing fidelity; any other code round-trips fine too since
/// `data_type`/`data` are stored raw.
pub mod value_type {
    pub const NULL: u8 = 0x00;
    pub const REFERENCE: u8 = 0x01;
    pub const ATTRIBUTE: u8 = 0x02;
    pub const STRING: u8 = 0x03;
    pub const FLOAT: u8 = 0x04;
    pub const DIMENSION: u8 = 0x05;
    pub const FRACTION: u8 = 0x06;
    pub const DYNAMIC_REFERENCE: u8 = 0x07;
    pub const DYNAMIC_ATTRIBUTE: u8 = 0x08;
    pub const INT_DEC: u8 = 0x10;
    pub const INT_HEX: u8 = 0x11;
    pub const INT_BOOLEAN: u8 = 0x12;
    pub const INT_COLOR_ARGB8: u8 = 0x1c;
    pub const INT_COLOR_RGB8: u8 = 0x1d;
    pub const INT_COLOR_ARGB4: u8 = 0x1e;
    pub const INT_COLOR_RGB4: u8 = 0x1f;
}

/// On wire: `size` u16 (always 8), `res0` u8 (always 0), `data_type` u8,
/// `data` u32.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypedValue {
    pub data_type: u8,
    pub data: u32,
}

impl TypedValue {
    pub const WIRE_SIZE: usize = 8;

    pub fn new(data_type: u8, data: u32) -> Self {
        Self { data_type, data }
    }

    pub(crate) fn parse(r: &mut Reader) -> Result<Self> {
        let size = r.read_u16()?;
        if size != 8 {
            return Err(Error::BadValueSize(size));
        }
        let _res0 = r.read_u8()?;
        let data_type = r.read_u8()?;
        let data = r.read_u32()?;
        Ok(Self { data_type, data })
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        w.write_u16(8);
        w.write_u8(0);
        w.write_u8(self.data_type);
        w.write_u32(self.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let v = TypedValue::new(value_type::INT_DEC, 42);
        let mut w = Writer::new();
        v.write(&mut w);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        let parsed = TypedValue::parse(&mut r).unwrap();
        assert_eq!(parsed, v);
    }

    #[test]
    fn every_written_value_frames_size_and_res0() {
        let v = TypedValue::new(value_type::STRING, 7);
        let mut w = Writer::new();
        v.write(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[0..2], &8u16.to_le_bytes());
        assert_eq!(bytes[2], 0);
    }

    #[test]
    fn rejects_non_eight_size() {
        let mut w = Writer::new();
        w.write_u16(9);
        w.write_u8(0);
        w.write_u8(value_type::NULL);
        w.write_u32(0);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert!(matches!(TypedValue::parse(&mut r), Err(Error::BadValueSize(9))));
    }
}
