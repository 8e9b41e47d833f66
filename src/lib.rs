//! Read, mutate, and re-serialize Android binary resource containers
//! (`resources.arsc` and compiled binary XML such as `AndroidManifest.xml`
//! or a compiled `res/*.xml`) with byte-for-byte fidelity for every region
//! the caller doesn't touch.
//!
//! The format is a tree of self-describing chunks, each framed by a common
//! 8-byte header (`type`, `headerSize`, `chunkSize`). [`File::parse`] reads
//! the whole tree; [`Chunk`] is the tagged sum of every chunk kind this
//! crate understands structurally. Anything else (including chunk types
//! introduced by newer AAPT2 versions this crate doesn't know about) is
//! preserved as [`chunk::RawChunk`] rather than rejected, as long as it
//! isn't a top-level chunk.

pub mod chunk;
pub mod container;
pub mod cursor;
pub mod error;
pub mod file;
pub mod library;
pub mod package;
pub mod res_config;
pub mod resource_id;
pub mod string_codec;
pub mod string_pool;
pub mod table;
pub mod type_chunk;
pub mod type_spec;
pub mod typed_value;
pub mod xml;

pub use chunk::Chunk;
pub use error::{Error, Result};
pub use file::File;
pub use resource_id::BinaryResourceIdentifier;
