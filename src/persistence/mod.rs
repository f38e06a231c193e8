//! Persistence layer for saving and loading forests.
//!
//! An index file is self-describing: the header records everything needed to
//! rebuild the in-memory forest without re-running any split.
//!
//! # File Format
//!
//! All integers and floats are little-endian.
//!
//! ```text
//! [HEADER 36B: MAGIC "GROVEDB\0", VERSION, D, T, N, LEAF_CAP, METRIC, CHECKSUM]
//! [VECTORS N x D f32]
//! T x [NODE_COUNT u32] NODE_COUNT x node, pre-order:
//!     leaf:     [0u8][ITEM_COUNT u32][ITEM_ID u32 ...]
//!     internal: [1u8][NORMAL D x f32][THRESHOLD f32][LEFT u32][RIGHT u32]
//! ```
//!
//! `LEFT`/`RIGHT` are node indices within the same tree block. Loading checks
//! every length against the bytes actually present before allocating, and
//! checks every offset and item id before the forest is handed out.
//!
//! # Example
//!
//! ```no_run
//! use grove_db::persistence::Persistable;
//! use grove_db::ForestIndex;
//!
//! # fn run(index: &ForestIndex) -> grove_db::Result<()> {
//! index.save("questions.grove")?;
//! let loaded = ForestIndex::load("questions.grove")?;
//! # Ok(())
//! # }
//! ```

mod format;

pub use format::{FileHeader, FORMAT_VERSION, MAGIC, NODE_INTERNAL, NODE_LEAF};

use crate::error::{GroveDbError, Result};
use crate::index::{ForestIndex, Node, PartitionTree};
use crate::types::{ItemId, NodeId};
use crate::vector::VectorTable;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Smallest encoded node: a leaf tag plus an empty item count.
const MIN_NODE_BYTES: usize = 1 + 4;

/// Trait for types that can be persisted to disk.
pub trait Persistable: Sized {
    /// Save the index to a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    fn save(&self, path: impl AsRef<Path>) -> Result<()>;

    /// Load an index from a file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `CorruptIndex` if it fails any
    /// header, checksum, length or offset check.
    fn load(path: impl AsRef<Path>) -> Result<Self>;
}

impl Persistable for ForestIndex {
    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let start = Instant::now();
        let bytes = encode_index(self)?;
        write_all_synced(path, &bytes)?;
        info!(
            path = %path.display(),
            bytes = bytes.len(),
            trees = self.tree_count(),
            items = self.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "index saved"
        );
        Ok(())
    }

    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let start = Instant::now();
        let bytes = std::fs::read(path)?;
        let index = decode_index(&bytes)?;
        info!(
            path = %path.display(),
            bytes = bytes.len(),
            trees = index.tree_count(),
            items = index.len(),
            dimension = index.dimension(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "index loaded"
        );
        Ok(index)
    }
}

/// Encode a forest into the on-disk byte layout.
pub fn encode_index(index: &ForestIndex) -> Result<Vec<u8>> {
    let to_u32 = |value: usize, what: &str| {
        u32::try_from(value)
            .map_err(|_| GroveDbError::invalid_parameter(format!("{what} {value} does not fit in u32")))
    };

    let dimension = to_u32(index.dimension(), "dimension")?;
    let tree_count = to_u32(index.tree_count(), "tree count")?;
    let item_count = to_u32(index.len(), "item count")?;
    let leaf_capacity = to_u32(index.leaf_capacity(), "leaf capacity")?;

    let mut body = Vec::with_capacity(index.memory_bytes());
    for value in index.vectors().as_slice() {
        body.extend_from_slice(&value.to_le_bytes());
    }
    for tree in index.trees() {
        body.extend_from_slice(&to_u32(tree.node_count(), "node count")?.to_le_bytes());
        for node in tree.nodes() {
            encode_node(&mut body, node)?;
        }
    }

    let header = FileHeader {
        magic: MAGIC,
        version: FORMAT_VERSION,
        dimension,
        tree_count,
        item_count,
        leaf_capacity,
        metric: index.metric(),
        checksum: crc32fast::hash(&body),
    };

    let mut bytes = Vec::with_capacity(FileHeader::SIZE + body.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

fn encode_node(out: &mut Vec<u8>, node: &Node) -> Result<()> {
    match node {
        Node::Leaf { items } => {
            out.push(NODE_LEAF);
            let count = u32::try_from(items.len())
                .map_err(|_| GroveDbError::invalid_parameter("leaf holds more than u32::MAX items"))?;
            out.extend_from_slice(&count.to_le_bytes());
            for id in items {
                out.extend_from_slice(&id.0.to_le_bytes());
            }
        }
        Node::Internal {
            normal,
            threshold,
            left,
            right,
        } => {
            out.push(NODE_INTERNAL);
            for value in normal.iter() {
                out.extend_from_slice(&value.to_le_bytes());
            }
            out.extend_from_slice(&threshold.to_le_bytes());
            out.extend_from_slice(&left.0.to_le_bytes());
            out.extend_from_slice(&right.0.to_le_bytes());
        }
    }
    Ok(())
}

/// Decode and fully validate a forest from the on-disk byte layout.
pub fn decode_index(bytes: &[u8]) -> Result<ForestIndex> {
    let (header, body) = verify_header(bytes)?;
    let dim = header.dimension as usize;
    let item_count = header.item_count as usize;

    let mut reader = ByteReader::new(body);
    let floats = item_count
        .checked_mul(dim)
        .ok_or_else(|| GroveDbError::corrupt("vector table size overflows"))?;
    let vectors = VectorTable::from_raw(dim, reader.f32_vec(floats, "vector table")?);

    let mut trees = Vec::new();
    for tree in 0..header.tree_count {
        let decoded = decode_tree(&mut reader, dim, item_count).map_err(|err| match err {
            GroveDbError::CorruptIndex(msg) => GroveDbError::corrupt(format!("tree {tree}: {msg}")),
            other => other,
        })?;
        trees.push(decoded);
    }

    if reader.remaining() != 0 {
        return Err(GroveDbError::corrupt(format!(
            "{} trailing bytes after the last tree",
            reader.remaining()
        )));
    }

    Ok(ForestIndex::from_parts(
        vectors,
        trees,
        header.metric,
        header.leaf_capacity as usize,
    ))
}

fn decode_tree(reader: &mut ByteReader<'_>, dim: usize, item_count: usize) -> Result<PartitionTree> {
    let node_count = reader.u32("node count")? as usize;
    if node_count == 0 {
        return Err(GroveDbError::corrupt("tree has no nodes"));
    }
    if node_count > reader.remaining() / MIN_NODE_BYTES {
        return Err(GroveDbError::corrupt(format!(
            "node count {node_count} exceeds remaining {} bytes",
            reader.remaining()
        )));
    }

    let mut nodes = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let node = match reader.u8("node tag")? {
            NODE_LEAF => {
                let count = reader.u32("leaf item count")? as usize;
                let items = reader
                    .u32_vec(count, "leaf items")?
                    .into_iter()
                    .map(ItemId)
                    .collect();
                Node::Leaf { items }
            }
            NODE_INTERNAL => Node::Internal {
                normal: reader.f32_vec(dim, "split normal")?.into_boxed_slice(),
                threshold: reader.f32("threshold")?,
                left: NodeId(reader.u32("left offset")?),
                right: NodeId(reader.u32("right offset")?),
            },
            tag => return Err(GroveDbError::corrupt(format!("unknown node tag {tag}"))),
        };
        nodes.push(node);
    }

    PartitionTree::from_nodes(nodes, dim, item_count)
}

/// Verify file header and checksum, returning the header and the data section.
pub(crate) fn verify_header(data: &[u8]) -> Result<(FileHeader, &[u8])> {
    if data.len() < FileHeader::SIZE {
        return Err(GroveDbError::corrupt("file too small for header"));
    }

    let header = FileHeader::from_bytes(&data[..FileHeader::SIZE])?;

    let data_section = &data[FileHeader::SIZE..];
    if crc32fast::hash(data_section) != header.checksum {
        return Err(GroveDbError::corrupt("checksum mismatch: file may be corrupted"));
    }

    Ok((header, data_section))
}

/// Write the whole buffer and flush it to stable storage.
fn write_all_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    writer.write_all(bytes)?;
    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Cursor over a byte slice whose every read is length-checked.
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(GroveDbError::corrupt(format!(
                "truncated {what}: need {len} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self, what: &str) -> Result<f32> {
        let b = self.take(4, what)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn words(&mut self, count: usize, what: &str) -> Result<impl Iterator<Item = [u8; 4]> + 'a> {
        let len = count
            .checked_mul(4)
            .ok_or_else(|| GroveDbError::corrupt(format!("{what} length overflows")))?;
        let bytes = self.take(len, what)?;
        Ok(bytes.chunks_exact(4).map(|b| [b[0], b[1], b[2], b[3]]))
    }

    fn f32_vec(&mut self, count: usize, what: &str) -> Result<Vec<f32>> {
        Ok(self.words(count, what)?.map(f32::from_le_bytes).collect())
    }

    fn u32_vec(&mut self, count: usize, what: &str) -> Result<Vec<u32>> {
        Ok(self.words(count, what)?.map(u32::from_le_bytes).collect())
    }
}

/// Save `index` to `path`.
pub fn save_index(index: &ForestIndex, path: impl AsRef<Path>) -> Result<()> {
    index.save(path)
}

/// Load an index from `path`.
pub fn load_index(path: impl AsRef<Path>) -> Result<ForestIndex> {
    ForestIndex::load(path)
}
