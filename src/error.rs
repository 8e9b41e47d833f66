//! Error taxonomy for parsing and structural queries.
//!
//! Mirrors the teacher's one-enum-with-thiserror style (see the superseded
//! `nom_parser::ParseError`), but keyed by failure *kind* rather than parse
//! *site* — the mutation engine's failures don't line up one-to-one with
//! call sites the way a pure recursive-descent parser's do.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("truncated input: need {needed} byte(s) at offset {offset}, only {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error(
        "bad chunk size: chunk at offset 0x{offset:x} declares chunkSize {chunk_size} which is \
         smaller than its headerSize {header_size}, not 4-byte aligned, or extends past its \
         enclosing chunk"
    )]
    BadChunkSize {
        offset: usize,
        chunk_size: u32,
        header_size: u16,
    },

    #[error(
        "bad header size: chunk of type 0x{typ:04x} at offset 0x{offset:x} declares headerSize \
         {header_size}, which is smaller than the minimum {minimum} required for this type"
    )]
    BadHeaderSize {
        offset: usize,
        typ: u16,
        header_size: u16,
        minimum: u16,
    },

    #[error("unrecognized top-level chunk type 0x{0:04x}")]
    UnknownTypeCode(u16),

    #[error("typed value declares size {0}, expected 8")]
    BadValueSize(u16),

    #[error("structural invariant violated: {0}")]
    StructuralInvariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
