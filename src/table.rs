//! `TableChunk` (`TABLE`) — the root of a `resources.arsc` file: a global
//! string pool followed by one child per package.

use crate::chunk::{chunk_type, Chunk, ChunkMeta};
use crate::container::Container;
use crate::cursor::{Reader, Writer};
use crate::error::{Error, Result};
use crate::package::PackageChunk;
use crate::string_pool::StringPoolChunk;

#[derive(Clone, Debug)]
pub struct TableChunk<'src> {
    pub meta: ChunkMeta,
    header_extra: Vec<u8>,
    /// The package count declared in the header. Not authoritative for
    /// iteration (`packages()` walks the actual child list) but preserved
    /// for byte fidelity.
    package_count: u32,
    children: Container<'src>,
}

impl<'src> TableChunk<'src> {
    pub(crate) fn parse(meta: ChunkMeta, r: &mut Reader<'src>, chunk_end: usize) -> Result<Self> {
        let package_count = r.read_u32()?;
        let header_extra_len = meta.original_header_size as usize - 12;
        let header_extra = r.read_bytes(header_extra_len)?.to_vec();
        let children = Container::parse(r, chunk_end)?;
        Ok(Self {
            meta,
            header_extra,
            package_count,
            children,
        })
    }

    pub fn declared_package_count(&self) -> u32 {
        self.package_count
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

    pub fn string_pool(&self) -> Result<&StringPoolChunk<'src>> {
        self.children()
            .iter()
            .find_map(|c| match c {
                Chunk::StringPool(p) => Some(p),
                _ => None,
            })
            .ok_or_else(|| Error::StructuralInvariant("table has no global string pool".into()))
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageChunk<'src>> {
        self.children().iter().filter_map(|c| match c {
            Chunk::Package(p) => Some(p),
            _ => None,
        })
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        let size_pos = crate::chunk::write_header(w, chunk_type::TABLE, self.meta.original_header_size);
        let chunk_start = size_pos - 4;
        w.write_u32(self.package_count);
        w.write_bytes(&self.header_extra);
        debug_assert_eq!(
            w.position() - chunk_start,
            self.meta.original_header_size as usize,
            "TableChunk write_header must emit exactly originalHeaderSize bytes"
        );
        self.children.write(w);
        crate::chunk::patch_chunk_size(w, size_pos);
    }
}
