//! Index paths into the block tree.

use smallvec::SmallVec;
use std::fmt;

/// Address of a block inside a [`StructureModel`](super::StructureModel).
///
/// A path alternates block and cell indices: `[b]` is a top-level block,
/// `[b, c, b2]` is block `b2` inside cell `c` of the table at top-level
/// block `b`, and so on for deeper nesting. Paths never point into note or
/// memo bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(SmallVec<[usize; 4]>);

impl NodePath {
    pub fn root(block: usize) -> Self {
        let mut path = SmallVec::new();
        path.push(block);
        Self(path)
    }

    /// Path of block `block` inside cell `cell` of the table at `self`.
    pub fn child(&self, cell: usize, block: usize) -> Self {
        let mut path = self.0.clone();
        path.push(cell);
        path.push(block);
        Self(path)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of enclosing tables.
    pub fn depth(&self) -> usize {
        self.0.len() / 2
    }

    pub fn is_nested(&self) -> bool {
        self.depth() > 0
    }

    /// Well-formed paths have odd length: blocks at even positions.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() % 2 == 1
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.0.to_vec()
    }
}

impl From<&[usize]> for NodePath {
    fn from(indices: &[usize]) -> Self {
        Self(SmallVec::from_slice(indices))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(usize::to_string).collect();
        write!(f, "/{}", parts.join("/"))
    }
}
