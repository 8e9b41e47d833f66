//! `StringPool` — the shared, indexable table of strings (and optional
//! per-string style spans) referenced by an enclosing `TABLE` or `XML`.
//!
//! Parsing is lazy: only the offset tables and (for identity-dedup on
//! write) each original style's span list are decoded eagerly. String
//! *text* is decoded on demand from the backing buffer in [`get`].
//! Writing byte-copies untouched original strings/styles verbatim,
//! preserving offset sharing, and appends fresh ones after them.

use std::collections::HashMap;

use crate::chunk::{self, chunk_type, ChunkMeta};
use crate::cursor::{Reader, Writer};
use crate::error::Result;
use crate::string_codec::{self, Encoding};

const STYLE_SENTINEL: u32 = 0xFFFF_FFFF;

/// A single formatting span: `(nameIndex, start, stop)` into this same pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub name_index: u32,
    pub start: u32,
    pub stop: u32,
}

#[derive(Clone, Debug)]
pub struct StringPoolChunk<'src> {
    pub meta: ChunkMeta,
    src: &'src [u8],

    /// Raw `flags` word, preserved verbatim so bits this crate doesn't
    /// interpret (anything beyond SORTED/UTF-8) still round-trip.
    flags: u32,

    /// Bytes of the 28-byte header beyond the 8 common framing bytes that
    /// this crate doesn't interpret (present only for headers larger than
    /// the canonical 28, which this engine has never observed but
    /// preserves rather than assumes can't happen).
    header_extra: Vec<u8>,

    /// Original string offsets, relative to the original `stringsStart`.
    original_offsets: Vec<u32>,
    /// Full encoded byte length of each original string, computed once at
    /// parse time so `write` never has to re-decode a length header.
    original_lengths: Vec<usize>,
    strings_abs_start: usize,

    original_style_offsets: Vec<u32>,
    original_styles: Vec<Vec<Span>>,
    styles_abs_start: usize,

    appended: Vec<String>,
    appended_styles: Vec<Vec<Span>>,
}

impl<'src> StringPoolChunk<'src> {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader<'src>) -> Result<Self> {
        let chunk_start = meta.original_offset;

        let string_count = r.read_u32()?;
        let style_count = r.read_u32()?;
        let flags = r.read_u32()?;
        let strings_start = r.read_u32()?;
        let styles_start = r.read_u32()?;

        let header_extra_len = meta.original_header_size as usize - 28;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();

        let mut original_offsets = Vec::with_capacity(string_count as usize);
        for _ in 0..string_count {
            original_offsets.push(r.read_u32()?);
        }
        let mut original_style_offsets = Vec::with_capacity(style_count as usize);
        for _ in 0..style_count {
            original_style_offsets.push(r.read_u32()?);
        }

        let src = r.buffer();
        let utf8 = flags & 0x100 != 0;
        let encoding = if utf8 { Encoding::Utf8 } else { Encoding::Utf16 };

        let strings_abs_start = chunk_start + strings_start as usize;
        let styles_abs_start = chunk_start + styles_start as usize;

        let mut original_lengths = Vec::with_capacity(original_offsets.len());
        for &off in &original_offsets {
            let abs = strings_abs_start + off as usize;
            original_lengths.push(string_codec::decode_full_byte_length(src, abs, encoding)?);
        }

        let mut original_styles = Vec::with_capacity(original_style_offsets.len());
        for &off in &original_style_offsets {
            let abs = styles_abs_start + off as usize;
            original_styles.push(Self::parse_style(src, abs)?);
        }

        Ok(Self {
            meta,
            src,
            flags,
            header_extra,
            original_offsets,
            original_lengths,
            strings_abs_start,
            original_style_offsets,
            original_styles,
            styles_abs_start,
            appended: Vec::new(),
            appended_styles: Vec::new(),
        })
    }

    fn parse_style(src: &'src [u8], mut abs: usize) -> Result<Vec<Span>> {
        let mut r = Reader::new(src);
        let mut spans = Vec::new();
        loop {
            r.seek(abs);
            let name_index = r.read_u32()?;
            if name_index == STYLE_SENTINEL {
                break;
            }
            let start = r.read_u32()?;
            let stop = r.read_u32()?;
            spans.push(Span {
                name_index,
                start,
                stop,
            });
            abs += 12;
        }
        Ok(spans)
    }

    pub fn encoding(&self) -> Encoding {
        if self.flags & 0x100 != 0 {
            Encoding::Utf8
        } else {
            Encoding::Utf16
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.flags & 0x1 != 0
    }

    pub fn count(&self) -> u32 {
        self.original_offsets.len() as u32 + self.appended.len() as u32
    }

    pub fn style_count(&self) -> u32 {
        self.original_style_offsets.len() as u32 + self.appended_styles.len() as u32
    }

    /// Decodes the string at pool index `i`, lazily for original entries.
    pub fn get(&self, i: u32) -> Option<String> {
        let original_count = self.original_offsets.len() as u32;
        if i < original_count {
            let abs = self.strings_abs_start + self.original_offsets[i as usize] as usize;
            string_codec::decode(self.src, abs, self.encoding()).ok()
        } else {
            self.appended.get((i - original_count) as usize).cloned()
        }
    }

    pub fn get_style(&self, i: u32) -> Option<Vec<Span>> {
        let original_count = self.original_style_offsets.len() as u32;
        if i < original_count {
            self.original_styles.get(i as usize).cloned()
        } else {
            self.appended_styles
                .get((i - original_count) as usize)
                .cloned()
        }
    }

    /// Scans the original pool's encoded bytes for a byte-equal match,
    /// then the appended list, for a string equal to `s`.
    pub fn index_of(&self, s: &str) -> Option<u32> {
        if let Some(i) = self.index_of_original(s) {
            return Some(i);
        }
        self.appended
            .iter()
            .position(|a| a == s)
            .map(|j| self.original_offsets.len() as u32 + j as u32)
    }

    fn index_of_original(&self, s: &str) -> Option<u32> {
        let encoded = string_codec::encode(s, self.encoding());
        for (i, &off) in self.original_offsets.iter().enumerate() {
            let abs = self.strings_abs_start + off as usize;
            let len = self.original_lengths[i];
            if self.src.get(abs..abs + len) == Some(encoded.as_slice()) {
                return Some(i as u32);
            }
        }
        None
    }

    /// Adds `s` to the pool. When `dedup` is set, an existing *original*
    /// string with the same encoded bytes is reused instead (appended
    /// strings are never deduplicated against each other or against a
    /// fresh `add` — see the crate's design notes).
    pub fn add(&mut self, s: &str, dedup: bool) -> u32 {
        if dedup {
            if let Some(i) = self.index_of_original(s) {
                return i;
            }
        }
        self.appended.push(s.to_string());
        self.original_offsets.len() as u32 + self.appended.len() as u32 - 1
    }

    pub fn add_style(&mut self, spans: Vec<Span>) -> u32 {
        self.appended_styles.push(spans);
        self.original_style_offsets.len() as u32 + self.appended_styles.len() as u32 - 1
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = chunk::write_header(w, chunk_type::STRING_POOL, self.meta.original_header_size);
        let chunk_start = size_pos - 4;

        let string_count = self.count();
        let style_count = self.style_count();

        w.write_u32(string_count);
        w.write_u32(style_count);
        w.write_u32(self.flags);
        let strings_start_pos = w.position();
        w.write_u32(0);
        let styles_start_pos = w.position();
        w.write_u32(0);
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(
            w.position() - chunk_start,
            self.meta.original_header_size as usize,
            "StringPool write_header must emit exactly originalHeaderSize bytes"
        );

        let string_offsets_pos = w.position();
        for _ in 0..string_count {
            w.write_u32(0);
        }
        let style_offsets_pos = w.position();
        for _ in 0..style_count {
            w.write_u32(0);
        }

        let strings_data_start = w.position();
        if string_count > 0 {
            w.patch_u32(strings_start_pos, (strings_data_start - chunk_start) as u32);
        }

        let mut seen: HashMap<usize, u32> = HashMap::new();
        for (i, &off) in self.original_offsets.iter().enumerate() {
            let src_abs = self.strings_abs_start + off as usize;
            let rel = *seen.entry(src_abs).or_insert_with(|| {
                let here = (w.position() - strings_data_start) as u32;
                let len = self.original_lengths[i];
                w.write_bytes(&self.src[src_abs..src_abs + len]);
                here
            });
            w.patch_u32(string_offsets_pos + i * 4, rel);
        }
        let base = self.original_offsets.len();
        for (j, s) in self.appended.iter().enumerate() {
            let here = (w.position() - strings_data_start) as u32;
            w.write_bytes(&string_codec::encode(s, self.encoding()));
            w.patch_u32(string_offsets_pos + (base + j) * 4, here);
        }
        w.pad_to_4();

        if style_count > 0 {
            let styles_data_start = w.position();
            w.patch_u32(styles_start_pos, (styles_data_start - chunk_start) as u32);

            let mut seen_styles: HashMap<usize, u32> = HashMap::new();
            for (i, &off) in self.original_style_offsets.iter().enumerate() {
                let src_abs = self.styles_abs_start + off as usize;
                let rel = *seen_styles.entry(src_abs).or_insert_with(|| {
                    let here = (w.position() - styles_data_start) as u32;
                    for span in &self.original_styles[i] {
                        w.write_u32(span.name_index);
                        w.write_u32(span.start);
                        w.write_u32(span.stop);
                    }
                    w.write_u32(STYLE_SENTINEL);
                    here
                });
                w.patch_u32(style_offsets_pos + i * 4, rel);
            }
            let style_base = self.original_style_offsets.len();
            for (j, spans) in self.appended_styles.iter().enumerate() {
                let here = (w.position() - styles_data_start) as u32;
                for span in spans {
                    w.write_u32(span.name_index);
                    w.write_u32(span.start);
                    w.write_u32(span.stop);
                }
                w.write_u32(STYLE_SENTINEL);
                w.patch_u32(style_offsets_pos + (style_base + j) * 4, here);
            }
            w.write_u32(STYLE_SENTINEL);
            w.write_u32(STYLE_SENTINEL);
            w.pad_to_4();
        }

        chunk::patch_chunk_size(w, size_pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_utf8(strings: &[&str]) -> Vec<u8> {
        let mut w = Writer::new();
        let header_size_pos = w.position();
        w.write_u16(chunk_type::STRING_POOL);
        w.write_u16(28);
        w.write_u32(0); // chunkSize placeholder
        w.write_u32(strings.len() as u32);
        w.write_u32(0);
        w.write_u32(1 << 8); // utf8
        let strings_start_pos = w.position();
        w.write_u32(0);
        w.write_u32(0); // stylesStart
        let offsets_pos = w.position();
        for _ in strings {
            w.write_u32(0);
        }
        let data_start = w.position();
        w.patch_u32(strings_start_pos, (data_start - header_size_pos) as u32);
        for (i, s) in strings.iter().enumerate() {
            let here = (w.position() - data_start) as u32;
            w.write_bytes(&string_codec::encode(s, Encoding::Utf8));
            w.patch_u32(offsets_pos + i * 4, here);
        }
        w.pad_to_4();
        let total = w.position() as u32;
        w.patch_u32(header_size_pos + 4, total);
        w.into_bytes()
    }

    fn parse(bytes: &[u8]) -> StringPoolChunk<'_> {
        let mut r = Reader::new(bytes);
        let _typ = r.read_u16().unwrap();
        let header_size = r.read_u16().unwrap();
        let chunk_size = r.read_u32().unwrap();
        let meta = ChunkMeta {
            original_offset: 0,
            original_header_size: header_size,
            original_chunk_size: chunk_size,
        };
        StringPoolChunk::parse(meta, &mut r).unwrap()
    }

    #[test]
    fn decodes_each_original_string() {
        let bytes = fixture_utf8(&["hello", "world"]);
        let pool = parse(&bytes);
        assert_eq!(pool.count(), 2);
        assert_eq!(pool.get(0).as_deref(), Some("hello"));
        assert_eq!(pool.get(1).as_deref(), Some("world"));
    }

    #[test]
    fn unrecognized_flag_bits_round_trip_verbatim() {
        // Bit 1 is neither SORTED (bit 0) nor UTF-8 (bit 8); this crate
        // doesn't interpret it, but it must still survive a write untouched.
        let mut w = Writer::new();
        w.write_u16(chunk_type::STRING_POOL);
        w.write_u16(28);
        w.write_u32(0);
        w.write_u32(0); // stringCount
        w.write_u32(0); // styleCount
        w.write_u32((1 << 8) | (1 << 1));
        w.write_u32(0);
        w.write_u32(0);
        let total = w.position() as u32;
        w.patch_u32(4, total);
        let bytes = w.into_bytes();

        let pool = parse(&bytes);
        let mut out = Writer::new();
        pool.write(&mut out);
        assert_eq!(out.as_slice(), bytes.as_slice());
    }

    #[test]
    fn add_returns_stable_index_and_is_readable() {
        let bytes = fixture_utf8(&["a"]);
        let mut pool = parse(&bytes);
        let idx = pool.add("abcdef", false);
        assert_eq!(idx, 1);
        assert_eq!(pool.count(), 2);
        assert_eq!(pool.get(idx).as_deref(), Some("abcdef"));
    }

    #[test]
    fn dedup_reuses_original_index_without_growing() {
        let bytes = fixture_utf8(&["shared", "other"]);
        let mut pool = parse(&bytes);
        let before = pool.count();
        let idx = pool.add("shared", true);
        assert_eq!(idx, 0);
        assert_eq!(pool.count(), before);
    }

    #[test]
    fn appended_strings_are_not_deduplicated_against_each_other() {
        let bytes = fixture_utf8(&["x"]);
        let mut pool = parse(&bytes);
        let a = pool.add("same", true);
        let b = pool.add("same", true);
        assert_ne!(a, b);
    }

    #[test]
    fn round_trip_preserves_offset_sharing() {
        // Two string-table slots point at the same encoded bytes.
        let mut w = Writer::new();
        w.write_u16(chunk_type::STRING_POOL);
        w.write_u16(28);
        w.write_u32(0);
        w.write_u32(2);
        w.write_u32(0);
        w.write_u32(1 << 8);
        let strings_start_pos = w.position();
        w.write_u32(0);
        w.write_u32(0);
        let offsets_pos = w.position();
        w.write_u32(0);
        w.write_u32(0);
        let data_start = w.position();
        w.patch_u32(strings_start_pos, (data_start - 0) as u32);
        let here = (w.position() - data_start) as u32;
        w.write_bytes(&string_codec::encode("shared", Encoding::Utf8));
        w.patch_u32(offsets_pos, here);
        w.patch_u32(offsets_pos + 4, here);
        w.pad_to_4();
        let total = w.position() as u32;
        w.patch_u32(4, total);
        let bytes = w.into_bytes();

        let pool = parse(&bytes);
        assert_eq!(pool.get(0), pool.get(1));

        let mut out = Writer::new();
        pool.write(&mut out);
        assert_eq!(out.as_slice(), bytes.as_slice());
    }

    #[test]
    fn style_spans_round_trip() {
        let mut w = Writer::new();
        w.write_u16(chunk_type::STRING_POOL);
        w.write_u16(28);
        w.write_u32(0);
        w.write_u32(1);
        w.write_u32(1);
        w.write_u32(1 << 8);
        let strings_start_pos = w.position();
        w.write_u32(0);
        let styles_start_pos = w.position();
        w.write_u32(0);
        let string_offsets_pos = w.position();
        w.write_u32(0);
        let style_offsets_pos = w.position();
        w.write_u32(0);
        let strings_data_start = w.position();
        w.patch_u32(strings_start_pos, strings_data_start as u32);
        let str_here = (w.position() - strings_data_start) as u32;
        w.write_bytes(&string_codec::encode("bold", Encoding::Utf8));
        w.patch_u32(string_offsets_pos, str_here);
        w.pad_to_4();
        let styles_data_start = w.position();
        w.patch_u32(styles_start_pos, styles_data_start as u32);
        let style_here = (w.position() - styles_data_start) as u32;
        w.write_u32(0);
        w.write_u32(0);
        w.write_u32(4);
        w.write_u32(STYLE_SENTINEL);
        w.patch_u32(style_offsets_pos, style_here);
        w.write_u32(STYLE_SENTINEL);
        w.write_u32(STYLE_SENTINEL);
        w.pad_to_4();
        let total = w.position() as u32;
        w.patch_u32(4, total);
        let bytes = w.into_bytes();

        let pool = parse(&bytes);
        assert_eq!(
            pool.get_style(0),
            Some(vec![Span {
                name_index: 0,
                start: 0,
                stop: 4
            }])
        );
        let mut out = Writer::new();
        pool.write(&mut out);
        assert_eq!(out.as_slice(), bytes.as_slice());
    }
}
