//! `TypeChunk` (`TABLE_TYPE`) — all resource entries for one (type, config)
//! pair within a package: a sparse offset table with a `NO_ENTRY` sentinel,
//! each present slot pointing at a simple or complex [`Entry`].
//!
//! Like [`crate::string_pool`], original entries are byte-copied on write
//! rather than re-serialized from a decoded form — `get` decodes lazily for
//! callers, but the write path only needs each original entry's on-wire
//! byte length, computed once at parse time.

use std::collections::HashMap;

use crate::chunk::{self, chunk_type, ChunkMeta};
use crate::cursor::{Reader, Writer};
use crate::error::{Error, Result};
use crate::package::PackageChunk;
use crate::res_config::ResConfig;
use crate::resource_id::BinaryResourceIdentifier;
use crate::typed_value::TypedValue;

const NO_ENTRY: u32 = 0xFFFF_FFFF;
const ENTRY_FLAG_COMPLEX: u16 = 0x1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryValue {
    Simple(TypedValue),
    Complex {
        parent_ref: u32,
        values: Vec<(u32, TypedValue)>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key_index: u32,
    pub value: EntryValue,
}

impl Entry {
    pub fn simple(key_index: u32, value: TypedValue) -> Self {
        Self {
            key_index,
            value: EntryValue::Simple(value),
        }
    }

    pub fn complex(key_index: u32, parent_ref: u32, values: Vec<(u32, TypedValue)>) -> Self {
        Self {
            key_index,
            value: EntryValue::Complex { parent_ref, values },
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.value, EntryValue::Complex { .. })
    }

    fn decode(src: &[u8], abs: usize) -> Result<Self> {
        let mut r = Reader::new(src);
        r.seek(abs);
        let header_size = r.read_u16()?;
        let flags = r.read_u16()?;
        let key_index = r.read_u32()?;
        if flags & ENTRY_FLAG_COMPLEX != 0 {
            r.seek(abs + 8);
            let parent_ref = r.read_u32()?;
            let count = r.read_u32()?;
            let mut values = Vec::with_capacity(count as usize);
            let mut pos = abs + header_size as usize;
            for _ in 0..count {
                r.seek(pos);
                let res_key = r.read_u32()?;
                let tv = TypedValue::parse(&mut r)?;
                values.push((res_key, tv));
                pos += 12;
            }
            Ok(Entry {
                key_index,
                value: EntryValue::Complex { parent_ref, values },
            })
        } else {
            r.seek(abs + header_size as usize);
            let tv = TypedValue::parse(&mut r)?;
            Ok(Entry {
                key_index,
                value: EntryValue::Simple(tv),
            })
        }
    }

    /// On-wire byte length of the entry at `abs`, derived from its own
    /// `headerSize`/`flags` without decoding the values (§4.4).
    fn raw_size(src: &[u8], abs: usize) -> Result<usize> {
        let mut r = Reader::new(src);
        r.seek(abs);
        let header_size = r.read_u16()?;
        let flags = r.read_u16()?;
        if flags & ENTRY_FLAG_COMPLEX != 0 {
            r.seek(abs + 12);
            let count = r.read_u32()?;
            Ok(header_size as usize + count as usize * 12)
        } else {
            Ok(header_size as usize + TypedValue::WIRE_SIZE)
        }
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        match &self.value {
            EntryValue::Simple(tv) => {
                w.write_u16(8);
                w.write_u16(0);
                w.write_u32(self.key_index);
                tv.write(w);
            }
            EntryValue::Complex { parent_ref, values } => {
                w.write_u16(16);
                w.write_u16(ENTRY_FLAG_COMPLEX);
                w.write_u32(self.key_index);
                w.write_u32(*parent_ref);
                w.write_u32(values.len() as u32);
                for (res_key, tv) in values {
                    w.write_u32(*res_key);
                    tv.write(w);
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct TypeChunk<'src> {
    pub meta: ChunkMeta,
    src: &'src [u8],
    id: u8,
    config: ResConfig,
    header_extra: Vec<u8>,

    original_offsets: Vec<u32>,
    original_sizes: Vec<usize>,
    entries_abs_start: usize,

    original_overrides: HashMap<u32, Option<Entry>>,
    appended: Vec<Option<Entry>>,
}

impl<'src> TypeChunk<'src> {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader<'src>) -> Result<Self> {
        let chunk_start = meta.original_offset;
        let id = r.read_u8()?;
        let _res0 = r.read_u8()?;
        let _res1 = r.read_u16()?;
        let entry_count = r.read_u32()?;
        let entries_start = r.read_u32()?;
        let config = ResConfig::parse(r)?;

        let consumed = 8 + 4 + 4 + 4 + config.size();
        if (meta.original_header_size as usize) < consumed {
            return Err(Error::BadHeaderSize {
                offset: chunk_start,
                typ: chunk_type::TABLE_TYPE,
                header_size: meta.original_header_size,
                minimum: consumed.min(u16::MAX as usize) as u16,
            });
        }
        let header_extra_len = meta.original_header_size as usize - consumed;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();

        let mut original_offsets = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            original_offsets.push(r.read_u32()?);
        }

        let src = r.buffer();
        let entries_abs_start = chunk_start + entries_start as usize;

        let mut original_sizes = Vec::with_capacity(original_offsets.len());
        for &off in &original_offsets {
            if off == NO_ENTRY {
                original_sizes.push(0);
            } else {
                original_sizes.push(Entry::raw_size(src, entries_abs_start + off as usize)?);
            }
        }

        Ok(Self {
            meta,
            src,
            id,
            config,
            header_extra,
            original_offsets,
            original_sizes,
            entries_abs_start,
            original_overrides: HashMap::new(),
            appended: Vec::new(),
        })
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn type_name(&self, package: &PackageChunk<'_>) -> Result<String> {
        let pool = package.type_string_pool()?;
        pool.get(self.id as u32 - 1).ok_or_else(|| {
            Error::StructuralInvariant(format!(
                "package's type string pool has no entry for type id {}",
                self.id
            ))
        })
    }

    pub fn config(&self) -> &ResConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ResConfig) {
        self.config = config;
    }

    pub fn total_entry_count(&self) -> u32 {
        self.original_offsets.len() as u32 + self.appended.len() as u32
    }

    pub fn get(&self, i: u32) -> Option<Entry> {
        let original_count = self.original_offsets.len() as u32;
        if i < original_count {
            if let Some(ov) = self.original_overrides.get(&i) {
                return ov.clone();
            }
            let off = self.original_offsets[i as usize];
            if off == NO_ENTRY {
                None
            } else {
                Entry::decode(self.src, self.entries_abs_start + off as usize).ok()
            }
        } else {
            self.appended
                .get((i - original_count) as usize)
                .cloned()
                .flatten()
        }
    }

    /// `true` when `packed`'s package/type ids match this chunk's owner and
    /// type id, its entry id is in range, and an entry is present there.
    pub fn contains(&self, package_id: u8, packed: u32) -> bool {
        let rid = BinaryResourceIdentifier::from_packed(packed);
        rid.package_id == package_id
            && rid.type_id == self.id
            && (rid.entry_id as u32) < self.total_entry_count()
            && self.get(rid.entry_id as u32).is_some()
    }

    pub fn override_entry(&mut self, i: u32, entry: Option<Entry>) {
        if i >= self.total_entry_count() {
            return;
        }
        let original_count = self.original_offsets.len() as u32;
        if i < original_count {
            self.original_overrides.insert(i, entry);
        } else {
            self.appended[(i - original_count) as usize] = entry;
        }
    }

    pub fn add_entry(&mut self, entry: Option<Entry>) -> u32 {
        let idx = self.total_entry_count();
        self.appended.push(entry);
        idx
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = chunk::write_header(w, chunk_type::TABLE_TYPE, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        let total = self.total_entry_count();

        w.write_u8(self.id);
        w.write_u8(0);
        w.write_u16(0);
        w.write_u32(total);
        let entries_start_pos = w.position();
        w.write_u32(0);
        self.config.write(w);
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(
            w.position() - chunk_start,
            self.meta.original_header_size as usize,
            "TypeChunk write_header must emit exactly originalHeaderSize bytes"
        );

        let offsets_pos = w.position();
        for _ in 0..total {
            w.write_u32(0);
        }
        let entries_data_start = w.position();
        w.patch_u32(entries_start_pos, (entries_data_start - chunk_start) as u32);

        for i in 0..self.original_offsets.len() as u32 {
            let offset_val = if let Some(ov) = self.original_overrides.get(&i) {
                match ov {
                    None => NO_ENTRY,
                    Some(e) => {
                        let here = (w.position() - entries_data_start) as u32;
                        e.write(w);
                        here
                    }
                }
            } else {
                let orig = self.original_offsets[i as usize];
                if orig == NO_ENTRY {
                    NO_ENTRY
                } else {
                    let abs = self.entries_abs_start + orig as usize;
                    let size = self.original_sizes[i as usize];
                    let here = (w.position() - entries_data_start) as u32;
                    w.write_bytes(&self.src[abs..abs + size]);
                    here
                }
            };
            w.patch_u32(offsets_pos + i as usize * 4, offset_val);
        }

        let base = self.original_offsets.len();
        for (j, entry) in self.appended.iter().enumerate() {
            let offset_val = match entry {
                None => NO_ENTRY,
                Some(e) => {
                    let here = (w.position() - entries_data_start) as u32;
                    e.write(w);
                    here
                }
            };
            w.patch_u32(offsets_pos + (base + j) * 4, offset_val);
        }

        w.pad_to_4();
        chunk::patch_chunk_size(w, size_pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed_value::value_type;

    fn fixture_one_simple_entry() -> Vec<u8> {
        let mut w = Writer::new();
        w.write_u16(chunk_type::TABLE_TYPE);
        let header_size_pos = w.position();
        w.write_u16(0); // headerSize, patched below
        w.write_u32(0); // chunkSize placeholder
        w.write_u8(1); // id
        w.write_u8(0);
        w.write_u16(0);
        w.write_u32(1); // entryCount
        let entries_start_pos = w.position();
        w.write_u32(0);
        w.write_u32(28); // ResConfig.size
        w.write_bytes(&[0u8; 24]);
        let header_size = w.position();
        w.patch_u16(header_size_pos, header_size as u16);

        let offsets_pos = w.position();
        w.write_u32(0);
        let entries_data_start = w.position();
        w.patch_u32(entries_start_pos, (entries_data_start - 0) as u32);
        let here = (w.position() - entries_data_start) as u32;
        Entry::simple(3, TypedValue::new(value_type::INT_DEC, 42)).write(&mut w);
        w.patch_u32(offsets_pos, here);
        w.pad_to_4();
        let total = w.position() as u32;
        w.patch_u32(4, total);
        w.into_bytes()
    }

    fn parse(bytes: &[u8]) -> TypeChunk<'_> {
        let mut r = Reader::new(bytes);
        let _typ = r.read_u16().unwrap();
        let header_size = r.read_u16().unwrap();
        let chunk_size = r.read_u32().unwrap();
        let meta = ChunkMeta {
            original_offset: 0,
            original_header_size: header_size,
            original_chunk_size: chunk_size,
        };
        TypeChunk::parse(meta, &mut r).unwrap()
    }

    #[test]
    fn decodes_simple_entry() {
        let bytes = fixture_one_simple_entry();
        let tc = parse(&bytes);
        let entry = tc.get(0).unwrap();
        assert_eq!(entry.key_index, 3);
        assert_eq!(entry.value, EntryValue::Simple(TypedValue::new(value_type::INT_DEC, 42)));
    }

    #[test]
    fn override_to_none_removes_entry_on_round_trip() {
        let bytes = fixture_one_simple_entry();
        let mut tc = parse(&bytes);
        tc.override_entry(0, None);
        assert!(tc.get(0).is_none());

        let mut out = Writer::new();
        tc.write(&mut out);
        let reparsed = parse(out.as_slice());
        assert!(reparsed.get(0).is_none());
    }

    #[test]
    fn add_entry_grows_total_count_and_is_readable() {
        let bytes = fixture_one_simple_entry();
        let mut tc = parse(&bytes);
        let before = tc.total_entry_count();
        let new_entry = Entry::simple(9, TypedValue::new(value_type::INT_BOOLEAN, 1));
        let idx = tc.add_entry(Some(new_entry.clone()));
        assert_eq!(idx, before);
        assert_eq!(tc.total_entry_count(), before + 1);
        assert_eq!(tc.get(idx), Some(new_entry));
    }

    #[test]
    fn unmodified_round_trip_is_byte_identical() {
        let bytes = fixture_one_simple_entry();
        let tc = parse(&bytes);
        let mut out = Writer::new();
        tc.write(&mut out);
        assert_eq!(out.as_slice(), bytes.as_slice());
    }

    #[test]
    fn oversized_config_rejected_instead_of_panicking() {
        // headerSize (0x18 = 24, the declared minimum for TABLE_TYPE) is too
        // small to hold a ResConfig whose own size field claims 64 bytes;
        // this must not underflow the headerSize - consumed subtraction.
        let mut w = Writer::new();
        w.write_u16(chunk_type::TABLE_TYPE);
        w.write_u16(0x18);
        w.write_u32(0);
        w.write_u8(1);
        w.write_u8(0);
        w.write_u16(0);
        w.write_u32(0); // entryCount
        w.write_u32(0); // entriesStart
        w.write_u32(64); // ResConfig declares 64 bytes, overrunning headerSize
        w.write_bytes(&[0u8; 60]);
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
        assert!(matches!(
            TypeChunk::parse(meta, &mut r),
            Err(Error::BadHeaderSize { .. })
        ));
    }
}
