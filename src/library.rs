//! `LibraryChunk` (`TABLE_LIBRARY`) — the table of shared-library package
//! id/name pairs a dynamically-referencing resource table declares.
//! Grounded on AOSP's `ResTable_lib_header`/`ResTable_lib_entry` layout.

use crate::chunk::{self, chunk_type, ChunkMeta};
use crate::cursor::{Reader, Writer};
use crate::error::Result;

const NAME_UTF16_UNITS: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryEntry {
    pub package_id: u32,
    /// 128 UTF-16 code units, NUL-padded, decoded and trimmed at the first NUL.
    pub package_name: String,
}

#[derive(Clone, Debug)]
pub struct LibraryChunk {
    pub meta: ChunkMeta,
    header_extra: Vec<u8>,
    entries: Vec<LibraryEntry>,
}

impl LibraryChunk {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader) -> Result<Self> {
        let count = r.read_u32()?;

        let consumed = 8 + 4;
        let header_extra_len = meta.original_header_size as usize - consumed;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();

        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let package_id = r.read_u32()?;
            let units: Vec<u16> = (0..NAME_UTF16_UNITS)
                .map(|_| r.read_u16())
                .collect::<Result<_>>()?;
            let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
            let package_name = String::from_utf16_lossy(&units[..end]);
            entries.push(LibraryEntry {
                package_id,
                package_name,
            });
        }

        Ok(Self {
            meta,
            header_extra,
            entries,
        })
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = chunk::write_header(w, chunk_type::TABLE_LIBRARY, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        w.write_u32(self.entries.len() as u32);
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(
            w.position() - chunk_start,
            self.meta.original_header_size as usize,
            "LibraryChunk write_header must emit exactly originalHeaderSize bytes"
        );
        for entry in &self.entries {
            w.write_u32(entry.package_id);
            let units: Vec<u16> = entry.package_name.encode_utf16().collect();
            for i in 0..NAME_UTF16_UNITS {
                w.write_u16(units.get(i).copied().unwrap_or(0));
            }
        }
        chunk::patch_chunk_size(w, size_pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_one_entry() {
        let mut w = Writer::new();
        w.write_u16(chunk_type::TABLE_LIBRARY);
        w.write_u16(12);
        w.write_u32(0);
        w.write_u32(1);
        w.write_u32(7);
        let mut units: Vec<u16> = "libfoo".encode_utf16().collect();
        units.resize(NAME_UTF16_UNITS, 0);
        for u in units {
            w.write_u16(u);
        }
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
        let lib = LibraryChunk::parse(meta, &mut r).unwrap();
        assert_eq!(lib.entries().len(), 1);
        assert_eq!(lib.entries()[0].package_id, 7);
        assert_eq!(lib.entries()[0].package_name, "libfoo");

        let mut out = Writer::new();
        lib.write(&mut out);
        assert_eq!(out.as_slice(), bytes.as_slice());
    }
}
