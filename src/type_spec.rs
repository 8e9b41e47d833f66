//! `TypeSpecChunk` (`TABLE_TYPE_SPEC`) — per-entry configuration-dependence
//! bitmasks for one type id. The engine doesn't interpret the bitmask bits,
//! so the whole array is byte-copied verbatim on write, like an unknown
//! chunk but with its own header re-emitted.

use crate::chunk::{self, chunk_type, ChunkMeta};
use crate::cursor::{Reader, Writer};
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct TypeSpecChunk<'src> {
    pub meta: ChunkMeta,
    id: u8,
    header_extra: Vec<u8>,
    entry_count: u32,
    flags: &'src [u8],
}

impl<'src> TypeSpecChunk<'src> {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader<'src>) -> Result<Self> {
        let id = r.read_u8()?;
        let _res0 = r.read_u8()?;
        let _res1 = r.read_u16()?;
        let entry_count = r.read_u32()?;

        let consumed = 8 + 4 + 4;
        let header_extra_len = meta.original_header_size as usize - consumed;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();

        let flags = r.read_bytes(entry_count as usize * 4)?;

        Ok(Self {
            meta,
            id,
            header_extra,
            entry_count,
            flags,
        })
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    /// The configuration-dependence bitmask for entry `i`, raw (uninterpreted).
    pub fn flags_for(&self, i: u32) -> Option<u32> {
        if i >= self.entry_count {
            return None;
        }
        let off = i as usize * 4;
        Some(u32::from_le_bytes([
            self.flags[off],
            self.flags[off + 1],
            self.flags[off + 2],
            self.flags[off + 3],
        ]))
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = chunk::write_header(w, chunk_type::TABLE_TYPE_SPEC, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        w.write_u8(self.id);
        w.write_u8(0);
        w.write_u16(0);
        w.write_u32(self.entry_count);
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(
            w.position() - chunk_start,
            self.meta.original_header_size as usize,
            "TypeSpecChunk write_header must emit exactly originalHeaderSize bytes"
        );
        w.write_bytes(self.flags);
        chunk::patch_chunk_size(w, size_pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_flags_verbatim() {
        let mut w = Writer::new();
        w.write_u16(chunk_type::TABLE_TYPE_SPEC);
        w.write_u16(16);
        w.write_u32(0);
        w.write_u8(2);
        w.write_u8(0);
        w.write_u16(0);
        w.write_u32(2);
        w.write_u32(0xdead_beef);
        w.write_u32(0x1234_5678);
        let total = w.position() as u32;
        w.patch_u32(4, total);
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        let _typ = r.read_u16().unwrap();
        let header_size = r.read_u16().unwrap();
        let chunk_size = r.read_u32().unwrap();
        let meta = ChunkMeta {
            original_offset: 0,
            original_header_size: header_size,
            original_chunk_size: chunk_size,
        };
        let spec = TypeSpecChunk::parse(meta, &mut r).unwrap();
        assert_eq!(spec.id(), 2);
        assert_eq!(spec.flags_for(0), Some(0xdead_beef));
        assert_eq!(spec.flags_for(1), Some(0x1234_5678));

        let mut out = Writer::new();
        spec.write(&mut out);
        assert_eq!(out.as_slice(), bytes.as_slice());
    }
}
