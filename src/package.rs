//! `PackageChunk` (`TABLE_PACKAGE`) — one package's resource tree: its id,
//! name, type/key string pools, and the type-spec/type/library child chunks
//! addressing entries within it.

use crate::chunk::{chunk_type, Chunk, ChunkMeta};
use crate::container::Container;
use crate::cursor::{Reader, Writer};
use crate::error::{Error, Result};
use crate::string_pool::StringPoolChunk;

const NAME_UTF16_UNITS: usize = 128;
/// `headerSize` threshold above which a `typeIdOffset` field is present.
/// The base fields (id, name, typeStrings/lastPublicType/keyStrings/
/// lastPublicKey) already total `0x11C` bytes, so the optional field only
/// appears once headerSize grows past that to `0x120`.
const TYPE_ID_OFFSET_THRESHOLD: u16 = 0x120;

#[derive(Clone, Debug)]
pub struct PackageChunk<'src> {
    pub meta: ChunkMeta,
    id: u32,
    /// Raw 128 UTF-16 code units (NUL-padded), preserved exactly.
    name_units: Vec<u16>,
    type_strings: u32,
    last_public_type: u32,
    key_strings: u32,
    last_public_key: u32,
    type_id_offset: Option<u32>,
    header_extra: Vec<u8>,
    children: Container<'src>,
}

impl<'src> PackageChunk<'src> {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader<'src>, chunk_end: usize) -> Result<Self> {
        let id = r.read_u32()?;
        let mut name_units = Vec::with_capacity(NAME_UTF16_UNITS);
        for _ in 0..NAME_UTF16_UNITS {
            name_units.push(r.read_u16()?);
        }
        let type_strings = r.read_u32()?;
        let last_public_type = r.read_u32()?;
        let key_strings = r.read_u32()?;
        let last_public_key = r.read_u32()?;

        let type_id_offset = if meta.original_header_size >= TYPE_ID_OFFSET_THRESHOLD {
            Some(r.read_u32()?)
        } else {
            None
        };

        let consumed = 8 + 4 + NAME_UTF16_UNITS * 2 + 16 + if type_id_offset.is_some() { 4 } else { 0 };
        let header_extra_len = meta.original_header_size as usize - consumed;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();

        let children = Container::parse(r, chunk_end)?;

        Ok(Self {
            meta,
            id,
            name_units,
            type_strings,
            last_public_type,
            key_strings,
            last_public_key,
            type_id_offset,
            header_extra,
            children,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> String {
        let end = self.name_units.iter().position(|&u| u == 0).unwrap_or(self.name_units.len());
        String::from_utf16_lossy(&self.name_units[..end])
    }

    pub fn children(&self) -> &[Chunk<'src>] {
        self.children.children()
    }

    pub fn children_mut(&mut self) -> &mut Vec<Chunk<'src>> {
        self.children.children_mut()
    }

    pub fn insert(&mut self, index: usize, chunk: Chunk<'src>) {
        self.children.insert(index, chunk);
    }

    fn string_pools(&self) -> impl Iterator<Item = &StringPoolChunk<'src>> {
        self.children().iter().filter_map(|c| match c {
            Chunk::StringPool(p) => Some(p),
            _ => None,
        })
    }

    /// The first string-pool child, by convention the type-name pool.
    pub fn type_string_pool(&self) -> Result<&StringPoolChunk<'src>> {
        self.string_pools().nth(0).ok_or_else(|| {
            Error::StructuralInvariant(format!(
                "package {} ({}) has no type string pool",
                self.id,
                self.name()
            ))
        })
    }

    /// The second string-pool child, by convention the key-name pool.
    pub fn key_string_pool(&self) -> Result<&StringPoolChunk<'src>> {
        self.string_pools().nth(1).ok_or_else(|| {
            Error::StructuralInvariant(format!(
                "package {} ({}) has no key string pool",
                self.id,
                self.name()
            ))
        })
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = crate::chunk::write_header(w, chunk_type::TABLE_PACKAGE, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        w.write_u32(self.id);
        for &u in &self.name_units {
            w.write_u16(u);
        }
        w.write_u32(self.type_strings);
        w.write_u32(self.last_public_type);
        w.write_u32(self.key_strings);
        w.write_u32(self.last_public_key);
        if let Some(offset) = self.type_id_offset {
            w.write_u32(offset);
        }
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(
            w.position() - chunk_start,
            self.meta.original_header_size as usize,
            "PackageChunk write_header must emit exactly originalHeaderSize bytes"
        );
        self.children.write(w);
        crate::chunk::patch_chunk_size(w, size_pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_units(s: &str) -> Vec<u16> {
        let mut units: Vec<u16> = s.encode_utf16().collect();
        units.resize(NAME_UTF16_UNITS, 0);
        units
    }

    #[test]
    fn round_trips_empty_package() {
        let mut w = Writer::new();
        w.write_u16(chunk_type::TABLE_PACKAGE);
        w.write_u16(0x11C);
        w.write_u32(0);
        w.write_u32(1);
        for u in name_units("com.example") {
            w.write_u16(u);
        }
        w.write_u32(0x11C); // typeStrings
        w.write_u32(0);
        w.write_u32(0x11C); // keyStrings
        w.write_u32(0);
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
        let pkg = PackageChunk::parse(meta, &mut r, bytes.len()).unwrap();
        assert_eq!(pkg.id(), 1);
        assert_eq!(pkg.name(), "com.example");
        assert!(pkg.type_id_offset.is_none());

        let mut out = Writer::new();
        pkg.write(&mut out);
        assert_eq!(out.as_slice(), bytes.as_slice());
    }
}
