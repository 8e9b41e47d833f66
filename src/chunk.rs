//! Chunk framing: the common 8-byte header every chunk begins with, the
//! type-code table, and the recursive parse/write dispatcher.
//!
//! Represented as a tagged sum (per the distilled Design Notes: "Variant
//! chunks ... rather than a class hierarchy") instead of a trait-object
//! hierarchy. Each variant struct carries the shared [`ChunkMeta`] plus its
//! own payload fields.

use crate::cursor::{Reader, Writer};
use crate::error::{Error, Result};
use crate::library::LibraryChunk;
use crate::package::PackageChunk;
use crate::string_pool::StringPoolChunk;
use crate::table::TableChunk;
use crate::type_chunk::TypeChunk;
use crate::type_spec::TypeSpecChunk;
use crate::xml::{
    XmlCdataChunk, XmlChunk, XmlElementEndChunk, XmlElementStartChunk, XmlNamespaceChunk,
    XmlResourceMapChunk,
};

/// Chunk type codes (§3).
pub mod chunk_type {
    pub const NULL: u16 = 0x0000;
    pub const STRING_POOL: u16 = 0x0001;
    pub const TABLE: u16 = 0x0002;
    pub const XML: u16 = 0x0003;

    pub const XML_START_NAMESPACE: u16 = 0x0100;
    pub const XML_END_NAMESPACE: u16 = 0x0101;
    pub const XML_START_ELEMENT: u16 = 0x0102;
    pub const XML_END_ELEMENT: u16 = 0x0103;
    pub const XML_CDATA: u16 = 0x0104;
    pub const XML_RESOURCE_MAP: u16 = 0x0180;

    pub const TABLE_PACKAGE: u16 = 0x0200;
    pub const TABLE_TYPE: u16 = 0x0201;
    pub const TABLE_TYPE_SPEC: u16 = 0x0202;
    pub const TABLE_LIBRARY: u16 = 0x0203;
    pub const TABLE_OVERLAYABLE: u16 = 0x0204;
    pub const TABLE_OVERLAYABLE_POLICY: u16 = 0x0205;
    pub const TABLE_STAGED_ALIAS: u16 = 0x0206;
}

/// Minimum `headerSize` accepted for each structurally-recognized type.
fn min_header_size(typ: u16) -> u16 {
    use chunk_type::*;
    match typ {
        NULL => 8,
        STRING_POOL => 28,
        TABLE => 12,
        XML => 8,
        XML_START_NAMESPACE | XML_END_NAMESPACE => 16,
        XML_START_ELEMENT => 16,
        XML_END_ELEMENT => 16,
        XML_CDATA => 16,
        XML_RESOURCE_MAP => 8,
        // id(4) + name(128 u16) + type_strings/last_public_type/key_strings/last_public_key
        // (4 u32 each); typeIdOffset (when present) extends this to 0x120.
        TABLE_PACKAGE => 0x11C,
        // id/flags/res1(4) + entryCount(4) + entriesStart(4) + ResConfig (self-delimiting,
        // at least 4 bytes for its own size field).
        TABLE_TYPE => 0x18,
        TABLE_TYPE_SPEC => 16,
        TABLE_LIBRARY => 12,
        _ => 8,
    }
}

/// Metadata every chunk remembers from parse time, used to enforce
/// `headerSize` fidelity and recompute `chunkSize` on write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkMeta {
    pub original_offset: usize,
    pub original_header_size: u16,
    pub original_chunk_size: u32,
}

/// A byte-for-byte preserved chunk: `Null` (no structural content expected)
/// or any type code the engine doesn't recognize. Header bytes beyond the
/// common 8-byte frame, and the entire payload, are copied verbatim.
#[derive(Clone, Debug)]
pub struct RawChunk<'src> {
    pub meta: ChunkMeta,
    pub typ: u16,
    header_extra: &'src [u8],
    payload: &'src [u8],
}

impl<'src> RawChunk<'src> {
    fn parse(meta: ChunkMeta, typ: u16, r: &mut Reader<'src>) -> Result<Self> {
        let header_extra_len = meta.original_header_size as usize - 8;
        let header_extra = r.read_bytes(header_extra_len)?;
        let payload_len = meta.original_chunk_size as usize - meta.original_header_size as usize;
        let payload = r.read_bytes(payload_len)?;
        Ok(Self {
            meta,
            typ,
            header_extra,
            payload,
        })
    }

    pub fn payload(&self) -> &'src [u8] {
        self.payload
    }
}

/// Writes the common 8-byte frame (`type`, `headerSize`, placeholder
/// `chunkSize`). Returns the absolute position of the `chunkSize` field so
/// the caller can patch it once the payload is known.
pub(crate) fn write_header(w: &mut Writer, typ: u16, header_size: u16) -> usize {
    w.write_u16(typ);
    w.write_u16(header_size);
    let size_field_pos = w.position();
    w.write_u32(0);
    size_field_pos
}

pub(crate) fn patch_chunk_size(w: &mut Writer, size_field_pos: usize) {
    let chunk_start = size_field_pos - 4;
    let size = (w.position() - chunk_start) as u32;
    w.patch_u32(size_field_pos, size);
}

/// The tagged sum of every chunk kind this engine produces.
#[derive(Clone, Debug)]
pub enum Chunk<'src> {
    Null(RawChunk<'src>),
    StringPool(StringPoolChunk<'src>),
    Table(TableChunk<'src>),
    Xml(XmlChunk<'src>),
    XmlNamespaceStart(XmlNamespaceChunk),
    XmlNamespaceEnd(XmlNamespaceChunk),
    XmlElementStart(XmlElementStartChunk),
    XmlElementEnd(XmlElementEndChunk),
    XmlCdata(XmlCdataChunk),
    XmlResourceMap(XmlResourceMapChunk),
    Package(PackageChunk<'src>),
    Type(TypeChunk<'src>),
    TypeSpec(TypeSpecChunk<'src>),
    Library(LibraryChunk),
    Unknown(RawChunk<'src>),
}

impl<'src> Chunk<'src> {
    pub fn meta(&self) -> ChunkMeta {
        match self {
            Chunk::Null(c) | Chunk::Unknown(c) => c.meta,
            Chunk::StringPool(c) => c.meta,
            Chunk::Table(c) => c.meta,
            Chunk::Xml(c) => c.meta,
            Chunk::XmlNamespaceStart(c) | Chunk::XmlNamespaceEnd(c) => c.meta,
            Chunk::XmlElementStart(c) => c.meta,
            Chunk::XmlElementEnd(c) => c.meta,
            Chunk::XmlCdata(c) => c.meta,
            Chunk::XmlResourceMap(c) => c.meta,
            Chunk::Package(c) => c.meta,
            Chunk::Type(c) => c.meta,
            Chunk::TypeSpec(c) => c.meta,
            Chunk::Library(c) => c.meta,
        }
    }

    pub fn original_offset(&self) -> usize {
        self.meta().original_offset
    }

    pub fn original_chunk_size(&self) -> u32 {
        self.meta().original_chunk_size
    }

    pub fn type_code(&self) -> u16 {
        match self {
            Chunk::Null(c) => c.typ,
            Chunk::Unknown(c) => c.typ,
            Chunk::StringPool(_) => chunk_type::STRING_POOL,
            Chunk::Table(_) => chunk_type::TABLE,
            Chunk::Xml(_) => chunk_type::XML,
            Chunk::XmlNamespaceStart(_) => chunk_type::XML_START_NAMESPACE,
            Chunk::XmlNamespaceEnd(_) => chunk_type::XML_END_NAMESPACE,
            Chunk::XmlElementStart(_) => chunk_type::XML_START_ELEMENT,
            Chunk::XmlElementEnd(_) => chunk_type::XML_END_ELEMENT,
            Chunk::XmlCdata(_) => chunk_type::XML_CDATA,
            Chunk::XmlResourceMap(_) => chunk_type::XML_RESOURCE_MAP,
            Chunk::Package(_) => chunk_type::TABLE_PACKAGE,
            Chunk::Type(_) => chunk_type::TABLE_TYPE,
            Chunk::TypeSpec(_) => chunk_type::TABLE_TYPE_SPEC,
            Chunk::Library(_) => chunk_type::TABLE_LIBRARY,
        }
    }

    /// Writes this chunk (header + payload) and back-patches its
    /// `chunkSize`. Asserts header-size fidelity per §4.2.
    pub fn write(&self, w: &mut Writer) {
        let start = w.position();
        match self {
            Chunk::Null(c) | Chunk::Unknown(c) => {
                let size_pos = write_header(w, c.typ, c.meta.original_header_size);
                w.write_bytes(c.header_extra);
                w.write_bytes(c.payload);
                patch_chunk_size(w, size_pos);
            }
            Chunk::StringPool(c) => c.write(w),
            Chunk::Table(c) => c.write(w),
            Chunk::Xml(c) => c.write(w),
            Chunk::XmlNamespaceStart(c) => c.write(w, chunk_type::XML_START_NAMESPACE),
            Chunk::XmlNamespaceEnd(c) => c.write(w, chunk_type::XML_END_NAMESPACE),
            Chunk::XmlElementStart(c) => c.write(w),
            Chunk::XmlElementEnd(c) => c.write(w),
            Chunk::XmlCdata(c) => c.write(w),
            Chunk::XmlResourceMap(c) => c.write(w),
            Chunk::Package(c) => c.write(w),
            Chunk::Type(c) => c.write(w),
            Chunk::TypeSpec(c) => c.write(w),
            Chunk::Library(c) => c.write(w),
        }
        debug_assert!(
            w.position() > start,
            "write must emit at least the common 8-byte frame"
        );
    }
}

/// Parses one chunk starting at the reader's current position.
///
/// `enclosing_end` bounds this chunk so an over-long `chunkSize` is caught
/// as `BadChunkSize` rather than silently reading into a sibling or past
/// EOF. `top_level` controls whether an unrecognized type code is a hard
/// `UnknownTypeCode` error (top level) or absorbed into `Chunk::Unknown`
/// (nested), per §7.
pub(crate) fn parse_chunk<'src>(
    r: &mut Reader<'src>,
    enclosing_end: usize,
    top_level: bool,
) -> Result<Chunk<'src>> {
    let offset = r.position();
    let typ = r.read_u16()?;
    let header_size = r.read_u16()?;
    let chunk_size = r.read_u32()?;

    let minimum = min_header_size(typ);
    if (header_size as usize) < minimum as usize {
        return Err(Error::BadHeaderSize {
            offset,
            typ,
            header_size,
            minimum,
        });
    }
    if (chunk_size as usize) < header_size as usize
        || chunk_size % 4 != 0
        || offset + chunk_size as usize > enclosing_end
    {
        return Err(Error::BadChunkSize {
            offset,
            chunk_size,
            header_size,
        });
    }

    let meta = ChunkMeta {
        original_offset: offset,
        original_header_size: header_size,
        original_chunk_size: chunk_size,
    };
    let chunk_end = offset + chunk_size as usize;

    use chunk_type::*;
    let chunk = match typ {
        NULL => Chunk::Null(RawChunk::parse(meta, typ, r)?),
        STRING_POOL => Chunk::StringPool(StringPoolChunk::parse(meta, r)?),
        TABLE => Chunk::Table(TableChunk::parse(meta, r, chunk_end)?),
        XML => Chunk::Xml(XmlChunk::parse(meta, r, chunk_end)?),
        XML_START_NAMESPACE => Chunk::XmlNamespaceStart(XmlNamespaceChunk::parse(meta, r)?),
        XML_END_NAMESPACE => Chunk::XmlNamespaceEnd(XmlNamespaceChunk::parse(meta, r)?),
        XML_START_ELEMENT => Chunk::XmlElementStart(XmlElementStartChunk::parse(meta, r)?),
        XML_END_ELEMENT => Chunk::XmlElementEnd(XmlElementEndChunk::parse(meta, r)?),
        XML_CDATA => Chunk::XmlCdata(XmlCdataChunk::parse(meta, r)?),
        XML_RESOURCE_MAP => Chunk::XmlResourceMap(XmlResourceMapChunk::parse(meta, r, chunk_end)?),
        TABLE_PACKAGE => Chunk::Package(PackageChunk::parse(meta, r, chunk_end)?),
        TABLE_TYPE => Chunk::Type(TypeChunk::parse(meta, r)?),
        TABLE_TYPE_SPEC => Chunk::TypeSpec(TypeSpecChunk::parse(meta, r)?),
        TABLE_LIBRARY => Chunk::Library(LibraryChunk::parse(meta, r)?),
        other => {
            if top_level {
                return Err(Error::UnknownTypeCode(other));
            }
            log::debug!(
                "chunk type 0x{:04x} at offset 0x{:x} is not structurally recognized, preserving verbatim",
                other,
                offset
            );
            Chunk::Unknown(RawChunk::parse(meta, other, r)?)
        }
    };

    r.seek(chunk_end);
    Ok(chunk)
}
