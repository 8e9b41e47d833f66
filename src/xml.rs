//! Compiled XML chunks: the `XML` container itself, its optional resource
//! map, and the five node kinds that make up its body
//! (namespace start/end, element start/end, CDATA).

use crate::chunk::{chunk_type, Chunk, ChunkMeta};
use crate::container::Container;
use crate::cursor::{Reader, Writer};
use crate::error::Result;
use crate::string_pool::StringPoolChunk;
use crate::typed_value::TypedValue;

const NO_COMMENT: u32 = 0xFFFF_FFFF;
const NO_NAMESPACE: u32 = 0xFFFF_FFFF;

#[derive(Clone, Debug)]
pub struct XmlChunk<'src> {
    pub meta: ChunkMeta,
    header_extra: Vec<u8>,
    children: Container<'src>,
}

impl<'src> XmlChunk<'src> {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader<'src>, chunk_end: usize) -> Result<Self> {
        let header_extra_len = meta.original_header_size as usize - 8;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();
        let children = Container::parse(r, chunk_end)?;
        Ok(Self {
            meta,
            header_extra,
            children,
        })
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

    pub fn string_pool(&self) -> Option<&StringPoolChunk<'src>> {
        self.children().iter().find_map(|c| match c {
            Chunk::StringPool(p) => Some(p),
            _ => None,
        })
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = crate::chunk::write_header(w, chunk_type::XML, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(
            w.position() - chunk_start,
            self.meta.original_header_size as usize
        );
        self.children.write(w);
        crate::chunk::patch_chunk_size(w, size_pos);
    }
}

/// Shared `lineNumber`/`commentRef` prefix every namespace/element/CDATA
/// node chunk carries right after its common framing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NodeMetadata {
    line_number: u32,
    comment_ref: u32,
}

impl NodeMetadata {
    fn parse(r: &mut Reader) -> Result<Self> {
        Ok(Self {
            line_number: r.read_u32()?,
            comment_ref: r.read_u32()?,
        })
    }

    fn write(&self, w: &mut Writer) {
        w.write_u32(self.line_number);
        w.write_u32(self.comment_ref);
    }
}

/// `XML_START_NAMESPACE` / `XML_END_NAMESPACE` — identical payload shape,
/// distinguished only by which type code wrote them.
#[derive(Clone, Debug)]
pub struct XmlNamespaceChunk {
    pub meta: ChunkMeta,
    header_extra: Vec<u8>,
    metadata: NodeMetadata,
    pub prefix: u32,
    pub uri: u32,
}

impl XmlNamespaceChunk {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader) -> Result<Self> {
        let metadata = NodeMetadata::parse(r)?;
        let header_extra_len = meta.original_header_size as usize - 16;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();
        let prefix = r.read_u32()?;
        let uri = r.read_u32()?;
        Ok(Self {
            meta,
            header_extra,
            metadata,
            prefix,
            uri,
        })
    }

    pub fn line_number(&self) -> u32 {
        self.metadata.line_number
    }

    pub fn comment_ref(&self) -> Option<u32> {
        (self.metadata.comment_ref != NO_COMMENT).then_some(self.metadata.comment_ref)
    }

    pub(crate) fn write(&self, w: &mut Writer, typ: u16) {
        let size_pos = crate::chunk::write_header(w, typ, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        self.metadata.write(w);
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(w.position() - chunk_start, self.meta.original_header_size as usize);
        w.write_u32(self.prefix);
        w.write_u32(self.uri);
        crate::chunk::patch_chunk_size(w, size_pos);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<u32>,
    pub name: u32,
    pub raw_value: Option<u32>,
    pub typed_value: TypedValue,
}

#[derive(Clone, Debug)]
pub struct XmlElementStartChunk {
    pub meta: ChunkMeta,
    header_extra: Vec<u8>,
    metadata: NodeMetadata,
    pub namespace: Option<u32>,
    pub name: u32,
    attribute_start: u16,
    attribute_size: u16,
    pub id_index: u16,
    pub class_index: u16,
    pub style_index: u16,
    pub attributes: Vec<XmlAttribute>,
}

impl XmlElementStartChunk {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader) -> Result<Self> {
        let metadata = NodeMetadata::parse(r)?;
        let consumed = 16;
        let header_extra_len = meta.original_header_size as usize - consumed;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();

        let namespace_raw = r.read_u32()?;
        let name = r.read_u32()?;
        let attribute_start = r.read_u16()?;
        let attribute_size = r.read_u16()?;
        let attribute_count = r.read_u16()?;
        let id_index = r.read_u16()?;
        let class_index = r.read_u16()?;
        let style_index = r.read_u16()?;

        let mut attributes = Vec::with_capacity(attribute_count as usize);
        for _ in 0..attribute_count {
            let ns = r.read_u32()?;
            let attr_name = r.read_u32()?;
            let raw_value = r.read_u32()?;
            let typed_value = TypedValue::parse(r)?;
            attributes.push(XmlAttribute {
                namespace: (ns != NO_NAMESPACE).then_some(ns),
                name: attr_name,
                raw_value: (raw_value != NO_NAMESPACE).then_some(raw_value),
                typed_value,
            });
        }

        Ok(Self {
            meta,
            header_extra,
            metadata,
            namespace: (namespace_raw != NO_NAMESPACE).then_some(namespace_raw),
            name,
            attribute_start,
            attribute_size,
            id_index,
            class_index,
            style_index,
            attributes,
        })
    }

    pub fn line_number(&self) -> u32 {
        self.metadata.line_number
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = crate::chunk::write_header(w, chunk_type::XML_START_ELEMENT, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        self.metadata.write(w);
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(w.position() - chunk_start, self.meta.original_header_size as usize);
        w.write_u32(self.namespace.unwrap_or(NO_NAMESPACE));
        w.write_u32(self.name);
        w.write_u16(self.attribute_start);
        w.write_u16(self.attribute_size);
        w.write_u16(self.attributes.len() as u16);
        w.write_u16(self.id_index);
        w.write_u16(self.class_index);
        w.write_u16(self.style_index);
        for attr in &self.attributes {
            w.write_u32(attr.namespace.unwrap_or(NO_NAMESPACE));
            w.write_u32(attr.name);
            w.write_u32(attr.raw_value.unwrap_or(NO_NAMESPACE));
            attr.typed_value.write(w);
        }
        crate::chunk::patch_chunk_size(w, size_pos);
    }
}

#[derive(Clone, Debug)]
pub struct XmlElementEndChunk {
    pub meta: ChunkMeta,
    header_extra: Vec<u8>,
    metadata: NodeMetadata,
    pub namespace: Option<u32>,
    pub name: u32,
}

impl XmlElementEndChunk {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader) -> Result<Self> {
        let metadata = NodeMetadata::parse(r)?;
        let header_extra_len = meta.original_header_size as usize - 16;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();
        let namespace_raw = r.read_u32()?;
        let name = r.read_u32()?;
        Ok(Self {
            meta,
            header_extra,
            metadata,
            namespace: (namespace_raw != NO_NAMESPACE).then_some(namespace_raw),
            name,
        })
    }

    pub fn line_number(&self) -> u32 {
        self.metadata.line_number
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = crate::chunk::write_header(w, chunk_type::XML_END_ELEMENT, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        self.metadata.write(w);
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(w.position() - chunk_start, self.meta.original_header_size as usize);
        w.write_u32(self.namespace.unwrap_or(NO_NAMESPACE));
        w.write_u32(self.name);
        crate::chunk::patch_chunk_size(w, size_pos);
    }
}

#[derive(Clone, Debug)]
pub struct XmlCdataChunk {
    pub meta: ChunkMeta,
    header_extra: Vec<u8>,
    metadata: NodeMetadata,
    pub data: u32,
    pub typed_value: TypedValue,
}

impl XmlCdataChunk {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader) -> Result<Self> {
        let metadata = NodeMetadata::parse(r)?;
        let header_extra_len = meta.original_header_size as usize - 16;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();
        let data = r.read_u32()?;
        let typed_value = TypedValue::parse(r)?;
        Ok(Self {
            meta,
            header_extra,
            metadata,
            data,
            typed_value,
        })
    }

    pub fn line_number(&self) -> u32 {
        self.metadata.line_number
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = crate::chunk::write_header(w, chunk_type::XML_CDATA, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        self.metadata.write(w);
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(w.position() - chunk_start, self.meta.original_header_size as usize);
        w.write_u32(self.data);
        self.typed_value.write(w);
        crate::chunk::patch_chunk_size(w, size_pos);
    }
}

#[derive(Clone, Debug)]
pub struct XmlResourceMapChunk {
    pub meta: ChunkMeta,
    header_extra: Vec<u8>,
    pub resource_ids: Vec<u32>,
}

impl XmlResourceMapChunk {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader, chunk_end: usize) -> Result<Self> {
        let header_extra_len = meta.original_header_size as usize - 8;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();
        let remaining = chunk_end - r.position();
        let count = remaining / 4;
        let mut resource_ids = Vec::with_capacity(count);
        for _ in 0..count {
            resource_ids.push(r.read_u32()?);
        }
        Ok(Self {
            meta,
            header_extra,
            resource_ids,
        })
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = crate::chunk::write_header(w, chunk_type::XML_RESOURCE_MAP, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(w.position() - chunk_start, self.meta.original_header_size as usize);
        for id in &self.resource_ids {
            w.write_u32(*id);
        }
        crate::chunk::patch_chunk_size(w, size_pos);
    }
}
