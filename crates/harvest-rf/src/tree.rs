use tracing::{debug, instrument, trace};

use crate::{
    RfError,
    error::validate_training_set,
    node::Node,
    split::{PARALLEL_SPLIT_MIN_SAMPLES, SplitResult, find_best_split},
    vote::VoteTally,
};

/// Configuration for a single entropy-split decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default             |
/// |---------------------|---------------------|
/// | `max_depth`         | `None` (unlimited)  |
/// | `min_samples_split` | 2                   |
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTreeConfig {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
        }
    }

    /// Set the maximum tree depth.
    ///
    /// `None` means grow until leaves are pure or no split gains anything.
    /// `Some(d)` limits depth to `d` levels (root is depth 0, so `Some(0)`
    /// yields a single leaf).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Train a decision tree on the provided row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]`: row-major layout.
    /// `labels[sample_idx]`: any label type with equality.
    ///
    /// # Errors
    ///
    /// | Variant                             | When                                  |
    /// |-------------------------------------|---------------------------------------|
    /// | [`RfError::EmptyDataset`]           | `features` is empty                   |
    /// | [`RfError::LabelCountMismatch`]     | `labels.len() != features.len()`      |
    /// | [`RfError::ZeroFeatures`]           | rows have zero feature columns        |
    /// | [`RfError::FeatureCountMismatch`]   | rows have inconsistent lengths        |
    /// | [`RfError::NonFiniteValue`]         | any value is NaN or infinite          |
    /// | [`RfError::InvalidMinSamplesSplit`] | `min_samples_split` < 2               |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit<L>(&self, features: &[Vec<f64>], labels: &[L]) -> Result<DecisionTree<L>, RfError>
    where
        L: Clone + PartialEq,
    {
        let n_features = validate_training_set(features, labels)?;

        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }

        // Dense class ids in first-encounter order.
        let mut classes: Vec<L> = Vec::new();
        let class_ids: Vec<usize> = labels
            .iter()
            .map(|label| match classes.iter().position(|c| c == label) {
                Some(id) => id,
                None => {
                    classes.push(label.clone());
                    classes.len() - 1
                }
            })
            .collect();

        debug!(
            n_samples = features.len(),
            n_features,
            n_classes = classes.len(),
            "fitting decision tree"
        );

        // Column-major layout for the split search.
        let col_features: Vec<Vec<f64>> = (0..n_features)
            .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
            .collect();

        let builder = TreeBuilder {
            col_features: &col_features,
            class_ids: &class_ids,
            classes: &classes,
            config: self,
        };
        let root = builder.build((0..features.len()).collect());

        debug!(
            n_nodes = root.n_nodes(),
            depth = root.depth(),
            "decision tree built"
        );

        Ok(DecisionTree {
            root,
            n_features,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
        })
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed training state shared by every node of one fit.
struct TreeBuilder<'a, L> {
    col_features: &'a [Vec<f64>],
    class_ids: &'a [usize],
    classes: &'a [L],
    config: &'a DecisionTreeConfig,
}

impl<L: Clone> TreeBuilder<'_, L> {
    /// Grow the tree over the rows in `sample_indices`.
    ///
    /// Every node starts as the majority leaf of its rows and is replaced by
    /// a split in place. Nodes waiting to be grown sit on an explicit work
    /// stack, so a chain of splits as deep as the row count never deepens the
    /// call stack. Left children are grown before right ones.
    fn build(&self, sample_indices: Vec<usize>) -> Node<L> {
        let (mut root, n_distinct) = self.leaf(&sample_indices);
        {
            let mut work = vec![(&mut root, sample_indices, 0usize, n_distinct)];
            while let Some((slot, sample_indices, depth, n_distinct)) = work.pop() {
                let Some(split) = self.split(&sample_indices, depth, n_distinct) else {
                    continue;
                };
                let (left_leaf, left_distinct) = self.leaf(&split.left_indices);
                let (right_leaf, right_distinct) = self.leaf(&split.right_indices);
                *slot = Node::Internal {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left_leaf),
                    right: Box::new(right_leaf),
                };
                if let Node::Internal { left, right, .. } = slot {
                    work.push((right.as_mut(), split.right_indices, depth + 1, right_distinct));
                    work.push((left.as_mut(), split.left_indices, depth + 1, left_distinct));
                }
            }
        }
        root
    }

    /// Return the split for a node, or `None` when it stays a leaf.
    fn split(
        &self,
        sample_indices: &[usize],
        depth: usize,
        n_distinct: usize,
    ) -> Option<SplitResult> {
        let n_samples = sample_indices.len();
        let depth_exceeded = self.config.max_depth.is_some_and(|max_d| depth >= max_d);
        let too_few = n_samples < self.config.min_samples_split;
        let pure = n_distinct <= 1;

        if depth_exceeded || too_few || pure {
            return None;
        }

        let split = find_best_split(
            self.col_features,
            self.class_ids,
            sample_indices,
            self.classes.len(),
            n_samples >= PARALLEL_SPLIT_MIN_SAMPLES,
        )?;

        trace!(
            depth,
            n_samples,
            feature = split.feature.index(),
            threshold = split.threshold,
            gain = split.gain,
            "splitting node"
        );
        Some(split)
    }

    /// Majority leaf for the rows in `sample_indices`, with their distinct class count.
    fn leaf(&self, sample_indices: &[usize]) -> (Node<L>, usize) {
        let tally: VoteTally<usize> = sample_indices.iter().map(|&si| self.class_ids[si]).collect();
        let n_distinct = tally.n_distinct();
        // Every node holds at least one sample, so the tally has a winner.
        let class = tally.into_winner().unwrap_or_default();
        let leaf = Node::Leaf {
            label: self.classes[class].clone(),
        };
        (leaf, n_distinct)
    }
}

/// A fitted decision tree.
///
/// Immutable once built; refitting produces a new tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree<L> {
    pub(crate) root: Node<L>,
    pub(crate) n_features: usize,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
}

impl<L> DecisionTree<L> {
    /// Predict the label for a single sample.
    ///
    /// Traverses from the root: at each internal node, goes left when
    /// `sample[feature] <= threshold`, right otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`,
    /// or when a split reads a feature index the sample does not have.
    pub fn predict(&self, sample: &[f64]) -> Result<&L, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        self.root.descend(sample)
    }

    /// Predict one label per row, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<L>, RfError>
    where
        L: Clone,
    {
        features
            .iter()
            .map(|sample| self.predict(sample).cloned())
            .collect()
    }

    /// Borrow the root node.
    #[must_use]
    pub fn root(&self) -> &Node<L> {
        &self.root
    }

    /// Return the number of features this tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the depth limit the tree was trained with.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the min-samples-split threshold the tree was trained with.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the total number of nodes in the tree (both internal and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.root.n_nodes()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.root.n_leaves()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}
