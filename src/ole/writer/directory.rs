use super::super::consts::*;
use std::cmp::Ordering;

/// Name given to the root storage.
const ROOT_NAME: &str = "Root Entry";

/// Longest entry name the 64-byte name field can hold, excluding the terminator.
const MAX_NAME_UNITS: usize = 31;

#[derive(Debug, Clone)]
struct Node {
    name: String,
    entry_type: u8,
    start_sector: u32,
    size: u64,
    children: Vec<usize>,
}

impl Node {
    fn new(name: &str, entry_type: u8, start_sector: u32, size: u64) -> Self {
        Self {
            name: name.to_string(),
            entry_type,
            start_sector,
            size,
            children: Vec::new(),
        }
    }
}

/// Builds the directory stream from a set of storage and stream paths.
///
/// Node indices double as SIDs; the root is always SID 0.
#[derive(Debug)]
pub(super) struct DirectoryBuilder {
    nodes: Vec<Node>,
}

impl DirectoryBuilder {
    pub(super) fn new(ministream_start: u32, ministream_size: u64) -> Self {
        Self {
            nodes: vec![Node::new(ROOT_NAME, STGTY_ROOT, ministream_start, ministream_size)],
        }
    }

    /// Ensure every storage along `path` exists and return the SID of the last.
    pub(super) fn add_storage_path(&mut self, path: &[String]) -> usize {
        let mut parent = 0;
        for name in path {
            let existing = self.nodes[parent]
                .children
                .iter()
                .copied()
                .find(|&sid| self.nodes[sid].name == *name);
            parent = match existing {
                Some(sid) => sid,
                None => {
                    let sid = self.nodes.len();
                    self.nodes.push(Node::new(name, STGTY_STORAGE, 0, 0));
                    self.nodes[parent].children.push(sid);
                    sid
                }
            };
        }
        parent
    }

    /// Add a stream below its parent storages. An empty path is ignored.
    pub(super) fn add_stream_path(&mut self, path: &[String], start_sector: u32, size: u64) {
        let Some((name, parents)) = path.split_last() else {
            return;
        };
        let parent = self.add_storage_path(parents);
        let sid = self.nodes.len();
        self.nodes.push(Node::new(name, STGTY_STREAM, start_sector, size));
        self.nodes[parent].children.push(sid);
    }

    /// Serialize all entries, padded with unused entries to whole sectors.
    pub(super) fn to_bytes(&self, sector_size: usize) -> Vec<u8> {
        let mut links = vec![(NOSTREAM, NOSTREAM, NOSTREAM); self.nodes.len()];

        for (sid, node) in self.nodes.iter().enumerate() {
            if node.children.is_empty() {
                continue;
            }
            let mut siblings = node.children.clone();
            siblings.sort_by(|&a, &b| compare_names(&self.nodes[a].name, &self.nodes[b].name));
            let child = link_balanced(&siblings, &mut links);
            links[sid].2 = child;
        }

        let per_sector = sector_size / DIRENTRY_SIZE;
        let padded = self.nodes.len().div_ceil(per_sector) * per_sector;
        let mut out = Vec::with_capacity(padded * DIRENTRY_SIZE);

        for (node, &(left, right, child)) in self.nodes.iter().zip(&links) {
            out.extend_from_slice(&encode_entry(node, left, right, child));
        }
        for _ in self.nodes.len()..padded {
            out.extend_from_slice(&unused_entry());
        }
        out
    }
}

/// Sibling order required by the format: shorter names first, then uppercase comparison.
fn compare_names(a: &str, b: &str) -> Ordering {
    let len_a = a.encode_utf16().count();
    let len_b = b.encode_utf16().count();
    len_a
        .cmp(&len_b)
        .then_with(|| a.to_uppercase().cmp(&b.to_uppercase()))
}

/// Link a sorted sibling list into a balanced binary tree and return its root SID.
fn link_balanced(sorted: &[usize], links: &mut [(u32, u32, u32)]) -> u32 {
    if sorted.is_empty() {
        return NOSTREAM;
    }
    let mid = sorted.len() / 2;
    let root = sorted[mid];
    let left = link_balanced(&sorted[..mid], links);
    let right = link_balanced(&sorted[mid + 1..], links);
    links[root].0 = left;
    links[root].1 = right;
    root as u32
}

fn encode_entry(node: &Node, left: u32, right: u32, child: u32) -> [u8; DIRENTRY_SIZE] {
    let mut entry = [0u8; DIRENTRY_SIZE];

    let units: Vec<u16> = node.name.encode_utf16().take(MAX_NAME_UNITS).collect();
    for (i, unit) in units.iter().enumerate() {
        entry[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    let name_len = ((units.len() + 1) * 2) as u16;
    entry[64..66].copy_from_slice(&name_len.to_le_bytes());
    entry[66] = node.entry_type;
    // Every node black: a valid red-black colouring for any tree shape.
    entry[67] = 1;
    entry[68..72].copy_from_slice(&left.to_le_bytes());
    entry[72..76].copy_from_slice(&right.to_le_bytes());
    entry[76..80].copy_from_slice(&child.to_le_bytes());

    let (start, size) = match node.entry_type {
        STGTY_STORAGE => (0, 0),
        _ => (node.start_sector, node.size),
    };
    entry[116..120].copy_from_slice(&start.to_le_bytes());
    entry[120..128].copy_from_slice(&size.to_le_bytes());
    entry
}

fn unused_entry() -> [u8; DIRENTRY_SIZE] {
    let mut entry = [0u8; DIRENTRY_SIZE];
    entry[68..80].fill(0xFF);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_order_is_length_first() {
        assert_eq!(compare_names("Zz", "aaa"), Ordering::Less);
        assert_eq!(compare_names("doc", "DOC"), Ordering::Equal);
        assert_eq!(compare_names("abc", "ABD"), Ordering::Less);
    }

    #[test]
    fn test_storage_paths_are_shared() {
        let mut dir = DirectoryBuilder::new(ENDOFCHAIN, 0);
        let path = |p: &[&str]| p.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        dir.add_stream_path(&path(&["BodyText", "Section0"]), 0, 10);
        dir.add_stream_path(&path(&["BodyText", "Section1"]), 1, 10);
        assert_eq!(dir.nodes.len(), 4);
        assert_eq!(dir.nodes[1].children.len(), 2);

        let bytes = dir.to_bytes(512);
        assert_eq!(bytes.len(), 512);
        // Root's child is the only storage.
        assert_eq!(&bytes[76..80], &1u32.to_le_bytes());
    }
}
