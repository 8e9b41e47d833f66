//! Top-level entry point: a sequence of top-level chunks read from or
//! written back to a compiled resource container (`resources.arsc` or a
//! compiled binary XML file).

use crate::chunk::{parse_chunk, Chunk};
use crate::cursor::{Reader, Writer};
use crate::error::Result;

/// A parsed compiled resource container.
///
/// `resources.arsc` files and compiled binary XML files share the same
/// outer chunk framing; both are a flat sequence of one or more top-level
/// chunks (in practice exactly one `TABLE` or `XML` chunk, but the format
/// doesn't forbid siblings, so this holds a `Vec`).
#[derive(Clone, Debug)]
pub struct File<'src> {
    chunks: Vec<Chunk<'src>>,
}

impl<'src> File<'src> {
    /// Parses every top-level chunk in `bytes`.
    ///
    /// An unrecognized type code at the top level is a hard error
    /// (`Error::UnknownTypeCode`) rather than preserved verbatim; only
    /// chunks nested inside a recognized container get that leniency.
    pub fn parse(bytes: &'src [u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let end = bytes.len();
        let mut chunks = Vec::new();
        while r.remaining() > 0 {
            chunks.push(parse_chunk(&mut r, end, true)?);
        }
        Ok(Self { chunks })
    }

    pub fn chunks(&self) -> &[Chunk<'src>] {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut Vec<Chunk<'src>> {
        &mut self.chunks
    }

    pub fn insert(&mut self, index: usize, chunk: Chunk<'src>) {
        self.chunks.insert(index, chunk);
    }

    /// Serializes every top-level chunk back to bytes.
    ///
    /// Capacity is seeded at 1.125x the combined original chunk sizes so a
    /// handful of appended strings/entries don't force a reallocation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let original_total: usize = self.chunks.iter().map(|c| c.original_chunk_size() as usize).sum();
        let mut w = Writer::with_capacity(original_total + original_total / 8);
        for chunk in &self.chunks {
            chunk.write(&mut w);
            w.pad_to_4();
        }
        w.into_bytes()
    }
}
