use std::fmt;

use crate::error::RfError;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a new feature index from a zero-based column position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in a fitted decision tree.
///
/// Each internal node owns its two children; there is no sharing between
/// subtrees and no link back to the parent.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node<L> {
    /// An interior split node.
    Internal {
        /// Feature used for the split.
        feature: FeatureIndex,
        /// Threshold value: samples with feature <= threshold go left.
        threshold: f64,
        /// Subtree for samples with feature <= threshold.
        left: Box<Node<L>>,
        /// Subtree for all other samples.
        right: Box<Node<L>>,
    },
    /// A terminal leaf node.
    Leaf {
        /// Majority label of the training rows that reached this leaf.
        label: L,
    },
}

impl<L> Node<L> {
    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Return the leaf label, or `None` for an internal node.
    #[must_use]
    pub fn label(&self) -> Option<&L> {
        match self {
            Node::Leaf { label } => Some(label),
            Node::Internal { .. } => None,
        }
    }

    /// Walk from this node to a leaf following `sample` and return its label.
    ///
    /// Fails with [`RfError::PredictionFeatureMismatch`] if a split reads a
    /// feature past the end of `sample`.
    pub(crate) fn descend(&self, sample: &[f64]) -> Result<&L, RfError> {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { label } => return Ok(label),
                Node::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = sample.get(feature.index()).ok_or(
                        RfError::PredictionFeatureMismatch {
                            expected: feature.index() + 1,
                            got: sample.len(),
                        },
                    )?;
                    node = if *value <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    /// Visit every node below and including this one with its depth.
    ///
    /// Iterative, so arbitrarily deep trees do not exhaust the stack.
    pub(crate) fn for_each_with_depth(&self, mut visit: impl FnMut(&Node<L>, usize)) {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            visit(node, depth);
            if let Node::Internal { left, right, .. } = node {
                stack.push((right.as_ref(), depth + 1));
                stack.push((left.as_ref(), depth + 1));
            }
        }
    }

    /// Return the depth of the deepest leaf below this node (a leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        self.for_each_with_depth(|_, d| max_depth = max_depth.max(d));
        max_depth
    }

    /// Return the number of nodes in this subtree.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        let mut n = 0;
        self.for_each_with_depth(|_, _| n += 1);
        n
    }

    /// Return the number of leaves in this subtree.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        let mut n = 0;
        self.for_each_with_depth(|node, _| {
            if node.is_leaf() {
                n += 1;
            }
        });
        n
    }
}
