//! Binary tree of approximate-membership filters over reference k-mers.
//!
//! Each node's filter holds the k-mers of every reference sketch in its
//! subtree; each leaf stands for exactly one sketch. A query walks the tree
//! breadth-first and drops any subtree whose filter rejects the k-mer, so a
//! k-mer absent from most references touches only a handful of filters.
//!
//! ```text
//!                 {0,1,2,3}
//!                /         \
//!            {0,1}         {2,3}
//!           /    \        /    \
//!         {0}    {1}    {2}    {3}
//! ```
//!
//! Construction bisects the list of sketch indices at `len / 2` (floor), so an
//! odd-sized list puts the smaller half on the left. Leaf placement is a pure
//! function of the index order.

use std::collections::BTreeSet;

use tracing::debug;

use super::IndexError;
use crate::core::sketch::ReferenceSketch;
use crate::filter::ApproxSet;

/// A node of the classification tree
#[derive(Debug)]
pub struct TreeNode<F> {
    filter: F,
    kind: NodeKind<F>,
}

/// Either a leaf labelled with a sketch index or an internal node with two children
#[derive(Debug)]
pub enum NodeKind<F> {
    Leaf(usize),
    Internal {
        left: Box<TreeNode<F>>,
        right: Box<TreeNode<F>>,
    },
}

impl<F> TreeNode<F> {
    /// Filter covering every k-mer in this subtree
    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn kind(&self) -> &NodeKind<F> {
        &self.kind
    }

    /// Sketch index if this node is a leaf
    pub fn leaf_index(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Leaf(index) => Some(index),
            NodeKind::Internal { .. } => None,
        }
    }

    fn children(&self) -> Option<(&TreeNode<F>, &TreeNode<F>)> {
        match &self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Internal { left, right } => Some((&**left, &**right)),
        }
    }
}

/// Summary of one tree level, root first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStats {
    pub depth: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub filter_bits: usize,
    pub items: usize,
}

/// Tree of filters answering "which references may contain this k-mer?"
#[derive(Debug)]
pub struct ClassificationTree<F> {
    root: TreeNode<F>,
    leaf_count: usize,
}

impl<F: ApproxSet> ClassificationTree<F> {
    /// Build a tree over every sketch in `sketches`, in order
    ///
    /// # Errors
    ///
    /// Returns `IndexError::EmptyReferenceSet` if `sketches` is empty.
    pub fn from_sketches(sketches: &[ReferenceSketch], fp_rate: f64) -> Result<Self, IndexError> {
        let indices: Vec<usize> = (0..sketches.len()).collect();
        Self::build(sketches, &indices, fp_rate)
    }

    /// Build a tree over the sketches named by `indices`.
    ///
    /// Every node's filter is sized with `optimal_size(total_kmers, fp_rate)`
    /// where `total_kmers` counts the non-empty k-mers of the node's sketches.
    /// Sibling subtrees are built in parallel. The tree trusts that all sketches
    /// share one k-mer size; `ReferenceIndex::build` checks that beforehand.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::EmptyReferenceSet` if `indices` is empty, or
    /// `IndexError::IndexOutOfRange` if an index does not name a sketch.
    pub fn build(
        sketches: &[ReferenceSketch],
        indices: &[usize],
        fp_rate: f64,
    ) -> Result<Self, IndexError> {
        if indices.is_empty() {
            return Err(IndexError::EmptyReferenceSet);
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= sketches.len()) {
            return Err(IndexError::IndexOutOfRange {
                index,
                len: sketches.len(),
            });
        }

        let root = build_node(sketches, indices, fp_rate);
        debug!(
            "Built classification tree over {} sketches (fp_rate={fp_rate})",
            indices.len()
        );

        Ok(Self {
            root,
            leaf_count: indices.len(),
        })
    }

    /// Set of sketch indices whose filters accept `kmer` at every level.
    ///
    /// May include false positives, never false negatives.
    pub fn query(&self, kmer: &[u8]) -> BTreeSet<usize> {
        let mut result = BTreeSet::new();
        self.visit_matches(kmer, |index| {
            result.insert(index);
        });
        result
    }

    /// Breadth-first walk calling `on_match` for every matching leaf.
    ///
    /// Returns the number of matching leaves.
    pub fn visit_matches(&self, kmer: &[u8], mut on_match: impl FnMut(usize)) -> usize {
        let mut matches = 0;
        let mut frontier: Vec<&TreeNode<F>> = vec![&self.root];
        let mut next: Vec<&TreeNode<F>> = Vec::new();

        while !frontier.is_empty() {
            for node in frontier.drain(..) {
                if !node.filter.contains(kmer) {
                    continue;
                }
                match &node.kind {
                    NodeKind::Leaf(index) => {
                        matches += 1;
                        on_match(*index);
                    }
                    NodeKind::Internal { left, right } => {
                        next.push(left);
                        next.push(right);
                    }
                }
            }
            std::mem::swap(&mut frontier, &mut next);
        }

        matches
    }
}

impl<F> ClassificationTree<F> {
    pub fn root(&self) -> &TreeNode<F> {
        &self.root
    }

    /// Filter covering every reference k-mer
    pub fn root_filter(&self) -> &F {
        &self.root.filter
    }

    /// Number of leaves (one per sketch)
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// Always false: a tree holds at least one leaf
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Leaf indices in left-to-right order
    pub fn leaves(&self) -> Vec<usize> {
        let mut leaves = Vec::with_capacity(self.leaf_count);
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node.children() {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => leaves.extend(node.leaf_index()),
            }
        }
        leaves
    }

    /// Number of edges on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        self.levels().len().saturating_sub(1)
    }

    /// Total number of nodes
    pub fn node_count(&self) -> usize {
        self.levels().iter().map(Vec::len).sum()
    }

    fn levels(&self) -> Vec<Vec<&TreeNode<F>>> {
        let mut levels = Vec::new();
        let mut frontier = vec![&self.root];
        while !frontier.is_empty() {
            let next: Vec<&TreeNode<F>> = frontier
                .iter()
                .filter_map(|node| node.children())
                .flat_map(|(left, right)| [left, right])
                .collect();
            levels.push(frontier);
            frontier = next;
        }
        levels
    }
}

impl<F: ApproxSet> ClassificationTree<F> {
    /// Total bits allocated across all node filters
    pub fn filter_bits(&self) -> usize {
        self.level_stats().iter().map(|level| level.filter_bits).sum()
    }

    /// Per-level node, leaf and filter totals, root first
    pub fn level_stats(&self) -> Vec<LevelStats> {
        self.levels()
            .into_iter()
            .enumerate()
            .map(|(depth, nodes)| LevelStats {
                depth,
                nodes: nodes.len(),
                leaves: nodes.iter().filter(|n| n.leaf_index().is_some()).count(),
                filter_bits: nodes.iter().map(|n| n.filter.size_bits()).sum(),
                items: nodes.iter().map(|n| n.filter.item_count()).sum(),
            })
            .collect()
    }
}

/// Recursively build the subtree covering `indices` (non-empty, in range)
fn build_node<F: ApproxSet>(
    sketches: &[ReferenceSketch],
    indices: &[usize],
    fp_rate: f64,
) -> TreeNode<F> {
    let total_kmers: usize = indices.iter().map(|&i| sketches[i].usable_len()).sum();
    let filter = F::from_kmers(
        indices.iter().flat_map(|&i| sketches[i].usable_kmers()),
        total_kmers,
        fp_rate,
    );

    if let [index] = indices {
        return TreeNode {
            filter,
            kind: NodeKind::Leaf(*index),
        };
    }

    let mid = indices.len() / 2;
    let (left, right) = rayon::join(
        || build_node(sketches, &indices[..mid], fp_rate),
        || build_node(sketches, &indices[mid..], fp_rate),
    );

    TreeNode {
        filter,
        kind: NodeKind::Internal {
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}
