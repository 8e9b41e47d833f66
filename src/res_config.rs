//! `ResConfig` — the `BinaryResourceConfiguration` blob. Out of scope for
//! decoding per the spec's Non-goals; treated as an opaque, self-delimiting
//! byte blob (its own first field is its total size) preserved verbatim.

use crate::cursor::{Reader, Writer};
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResConfig {
    /// Raw bytes of the configuration blob, including its own leading
    /// 4-byte `size` field.
    bytes: Vec<u8>,
}

impl ResConfig {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub(crate) fn parse(r: &mut Reader) -> Result<Self> {
        let start = r.position();
        let size = r.read_u32()?;
        if size < 4 {
            return Err(Error::StructuralInvariant(format!(
                "config blob at offset 0x{:x} declares size {} smaller than its own size field",
                start, size
            )));
        }
        r.seek(start);
        let bytes = r.read_bytes(size as usize)?.to_vec();
        Ok(Self { bytes })
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        w.write_bytes(&self.bytes);
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn raw(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_opaque_blob() {
        let mut w = Writer::new();
        w.write_u32(36);
        w.write_bytes(&[0u8; 32]);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        let cfg = ResConfig::parse(&mut r).unwrap();
        assert_eq!(cfg.size(), 36);
        assert_eq!(cfg.raw(), bytes.as_slice());
    }

    #[test]
    fn rejects_size_smaller_than_self() {
        let mut w = Writer::new();
        w.write_u32(2);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert!(matches!(ResConfig::parse(&mut r), Err(Error::StructuralInvariant(_))));
    }
}
