//! Random-projection partition tree.
//!
//! Each internal node splits its items with a random unit normal: every item
//! is projected onto the normal and the median projection becomes the
//! threshold. Items strictly below the threshold go left, the rest go right.
//! Splitting stops once a node holds at most `leaf_capacity` items, or when
//! every attempted direction leaves one side empty (duplicate vectors).
//!
//! Nodes live in a flat arena in pre-order. A child always sits at a higher
//! index than its parent and is referenced by exactly one parent, which makes
//! the persisted form trivially acyclic and lets descent run without
//! recursion.

use crate::constants::forest::SPLIT_ATTEMPTS;
use crate::distance::{squared_norm, DistanceMetric};
use crate::error::{GroveDbError, Result};
use crate::types::{ItemId, NodeId};
use crate::vector::VectorTable;
use rand::Rng;
use tracing::warn;

/// One node of a partition tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Splitting hyperplane with two exclusively owned children.
    Internal {
        /// Unit normal of the hyperplane.
        normal: Box<[f32]>,
        /// Median projection; projections below it descend left.
        threshold: f32,
        /// Child for projections `< threshold`.
        left: NodeId,
        /// Child for projections `>= threshold`.
        right: NodeId,
    },
    /// Bucket of item ids.
    Leaf {
        /// Items in this bucket.
        items: Vec<ItemId>,
    },
}

impl Node {
    /// Return true for leaf nodes.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// A subset still waiting to be turned into a node.
struct Pending {
    items: Vec<ItemId>,
    parent: Option<(usize, Side)>,
}

struct Split {
    normal: Vec<f32>,
    threshold: f32,
    left: Vec<ItemId>,
    right: Vec<ItemId>,
}

/// A single binary partition tree covering every item exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionTree {
    nodes: Vec<Node>,
}

impl PartitionTree {
    /// Build a tree over `items`.
    ///
    /// The generator is consumed in pre-order (a node's split, then its left
    /// subtree, then its right subtree), so a seeded generator always yields
    /// the same tree.
    pub fn build<R: Rng + ?Sized>(
        table: &VectorTable,
        items: Vec<ItemId>,
        metric: DistanceMetric,
        leaf_capacity: usize,
        rng: &mut R,
    ) -> Self {
        let mut nodes: Vec<Node> = Vec::new();
        let mut stack = vec![Pending {
            items,
            parent: None,
        }];

        while let Some(Pending { items, parent }) = stack.pop() {
            let index = nodes.len();
            if let Some((parent, side)) = parent {
                link_child(&mut nodes[parent], side, NodeId(index as u32));
            }

            if items.len() <= leaf_capacity {
                nodes.push(Node::Leaf { items });
                continue;
            }

            match split(table, &items, metric, rng) {
                Some(split) => {
                    // Child links are patched when the children are emitted.
                    nodes.push(Node::Internal {
                        normal: split.normal.into_boxed_slice(),
                        threshold: split.threshold,
                        left: NodeId::ROOT,
                        right: NodeId::ROOT,
                    });
                    // Right is pushed first so the left subtree is emitted next.
                    stack.push(Pending {
                        items: split.right,
                        parent: Some((index, Side::Right)),
                    });
                    stack.push(Pending {
                        items: split.left,
                        parent: Some((index, Side::Left)),
                    });
                }
                None => {
                    warn!(
                        items = items.len(),
                        leaf_capacity, "degenerate split, keeping oversized leaf"
                    );
                    nodes.push(Node::Leaf { items });
                }
            }
        }

        Self { nodes }
    }

    /// Wrap nodes decoded from disk, checking every structural invariant.
    pub(crate) fn from_nodes(nodes: Vec<Node>, dim: usize, item_count: usize) -> Result<Self> {
        let tree = Self { nodes };
        tree.validate(dim, item_count)?;
        Ok(tree)
    }

    /// Check that the arena is a proper tree over `[0, item_count)`.
    ///
    /// Children must sit after their parent and inside the arena, every
    /// non-root node must have exactly one parent, normals must have length
    /// `dim`, and every item id must appear in exactly one leaf.
    pub fn validate(&self, dim: usize, item_count: usize) -> Result<()> {
        let len = self.nodes.len();
        if len == 0 {
            return Err(GroveDbError::corrupt("tree has no nodes"));
        }

        let mut parents = vec![0u8; len];
        let mut seen = vec![false; item_count];
        let mut covered = 0usize;

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Internal {
                    normal,
                    threshold,
                    left,
                    right,
                } => {
                    if normal.len() != dim {
                        return Err(GroveDbError::corrupt(format!(
                            "node {index}: split normal has {} components, expected {dim}",
                            normal.len()
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(GroveDbError::corrupt(format!(
                            "node {index}: non-finite threshold"
                        )));
                    }
                    for child in [left, right] {
                        let child = child.index();
                        if child <= index || child >= len {
                            return Err(GroveDbError::corrupt(format!(
                                "node {index}: child offset {child} out of range ({index}, {len})"
                            )));
                        }
                        parents[child] += 1;
                        if parents[child] > 1 {
                            return Err(GroveDbError::corrupt(format!(
                                "node {child} is referenced by more than one parent"
                            )));
                        }
                    }
                }
                Node::Leaf { items } => {
                    for id in items {
                        let slot = seen.get_mut(id.index()).ok_or_else(|| {
                            GroveDbError::corrupt(format!(
                                "node {index}: item id {} out of range (N = {item_count})",
                                id.0
                            ))
                        })?;
                        if *slot {
                            return Err(GroveDbError::corrupt(format!(
                                "item id {} appears in more than one leaf",
                                id.0
                            )));
                        }
                        *slot = true;
                        covered += 1;
                    }
                }
            }
        }

        if let Some(orphan) = parents.iter().skip(1).position(|&count| count == 0) {
            return Err(GroveDbError::corrupt(format!(
                "node {} is unreachable from the root",
                orphan + 1
            )));
        }
        if covered != item_count {
            return Err(GroveDbError::corrupt(format!(
                "tree covers {covered} of {item_count} items"
            )));
        }
        Ok(())
    }

    /// Follow the query down to a single leaf and return its items.
    pub fn descend(&self, metric: DistanceMetric, query: &[f32]) -> &[ItemId] {
        let mut node = NodeId::ROOT;
        loop {
            match &self.nodes[node.index()] {
                Node::Internal {
                    normal,
                    threshold,
                    left,
                    right,
                } => {
                    node = if metric.margin(normal, query) < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { items } => return items,
            }
        }
    }

    /// Nodes in pre-order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Sizes of all leaves, in pre-order.
    pub fn leaf_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            Node::Leaf { items } => Some(items.len()),
            Node::Internal { .. } => None,
        })
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max_depth = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            let depth = depths[index];
            max_depth = max_depth.max(depth);
            if let Node::Internal { left, right, .. } = node {
                depths[left.index()] = depth + 1;
                depths[right.index()] = depth + 1;
            }
        }
        max_depth
    }

    /// Approximate heap bytes held by the tree.
    pub fn memory_bytes(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| {
                std::mem::size_of::<Node>()
                    + match node {
                        Node::Internal { normal, .. } => normal.len() * std::mem::size_of::<f32>(),
                        Node::Leaf { items } => items.len() * std::mem::size_of::<ItemId>(),
                    }
            })
            .sum()
    }
}

fn link_child(parent: &mut Node, side: Side, child: NodeId) {
    if let Node::Internal { left, right, .. } = parent {
        match side {
            Side::Left => *left = child,
            Side::Right => *right = child,
        }
    }
}

/// Draw a uniformly oriented unit vector, or `None` for a zero draw.
fn random_normal<R: Rng + ?Sized>(rng: &mut R, dim: usize) -> Option<Vec<f32>> {
    let mut normal: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    let norm = squared_norm(&normal).sqrt();
    if norm > 0.0 {
        normal.iter_mut().for_each(|x| *x /= norm);
        Some(normal)
    } else {
        None
    }
}

/// Median split along a random direction, retried a few times.
fn split<R: Rng + ?Sized>(
    table: &VectorTable,
    items: &[ItemId],
    metric: DistanceMetric,
    rng: &mut R,
) -> Option<Split> {
    for _ in 0..SPLIT_ATTEMPTS {
        let Some(normal) = random_normal(rng, table.dim()) else {
            continue;
        };

        let margins: Vec<f32> = items
            .iter()
            .map(|&id| metric.margin(&normal, table.row(id)))
            .collect();

        let mut ordered = margins.clone();
        let mid = ordered.len() / 2;
        let (_, &mut threshold, _) = ordered.select_nth_unstable_by(mid, f32::total_cmp);

        let (left, right): (Vec<(ItemId, f32)>, Vec<(ItemId, f32)>) = items
            .iter()
            .copied()
            .zip(margins)
            .partition(|&(_, margin)| margin < threshold);

        // The median itself always lands right, so only the left side can
        // come up empty (all projections tied).
        if !left.is_empty() && threshold.is_finite() {
            return Some(Split {
                normal,
                threshold,
                left: left.into_iter().map(|(id, _)| id).collect(),
                right: right.into_iter().map(|(id, _)| id).collect(),
            });
        }
    }
    None
}
