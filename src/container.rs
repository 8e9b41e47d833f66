//! Shared recursive child-list logic for the three chunk kinds whose
//! payload is itself a sequence of child chunks: `TABLE`, `XML`, and
//! `TABLE_PACKAGE`.

use crate::chunk::{parse_chunk, Chunk};
use crate::cursor::{Reader, Writer};
use crate::error::Result;

#[derive(Clone, Debug, Default)]
pub struct Container<'src> {
    children: Vec<Chunk<'src>>,
}

impl<'src> Container<'src> {
    pub fn parse(r: &mut Reader<'src>, end: usize) -> Result<Self> {
        let mut children = Vec::new();
        while r.position() < end {
            let child = parse_chunk(r, end, false)?;
            children.push(child);
        }
        Ok(Self { children })
    }

    pub fn write(&self, w: &mut Writer) {
        for child in &self.children {
            child.write(w);
            w.pad_to_4();
        }
    }

    pub fn children(&self) -> &[Chunk<'src>] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Chunk<'src>> {
        &mut self.children
    }

    pub fn insert(&mut self, index: usize, chunk: Chunk<'src>) {
        self.children.insert(index, chunk);
    }
}
