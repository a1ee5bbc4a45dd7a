//! Configuration builder for bagged ensemble training.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::RfError;
use crate::eval::{Holdout, HoldoutEvaluation};
use crate::forest::BaggedEnsemble;

/// Whether to compute out-of-bag evaluation during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OobMode {
    /// Compute OOB accuracy and a classification report.
    Enabled,
    /// Skip OOB evaluation.
    Disabled,
}

/// Configuration for bagged ensemble training.
///
/// Construct via [`BaggingConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default     |
/// |---------------------|-------------|
/// | `max_depth`         | `None`      |
/// | `min_samples_split` | 2           |
/// | `sample_ratio`      | 0.8         |
/// | `seed`              | 42          |
/// | `oob_mode`          | `Disabled`  |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BaggingConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) sample_ratio: f64,
    pub(crate) seed: u64,
    pub(crate) oob_mode: OobMode,
}

impl BaggingConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_depth: None,
            min_samples_split: 2,
            sample_ratio: 0.8,
            seed: 42,
            oob_mode: OobMode::Disabled,
        })
    }

    // --- Setters ---

    /// Set the per-tree maximum depth. `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the per-tree minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the bootstrap sample ratio (fraction of the training rows drawn per tree).
    #[must_use]
    pub fn with_sample_ratio(mut self, sample_ratio: f64) -> Self {
        self.sample_ratio = sample_ratio;
        self
    }

    /// Set the random seed used by [`BaggingConfig::fit`].
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the OOB evaluation mode.
    #[must_use]
    pub fn with_oob_mode(mut self, oob_mode: OobMode) -> Self {
        self.oob_mode = oob_mode;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the per-tree depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the per-tree minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the bootstrap sample ratio.
    #[must_use]
    pub fn sample_ratio(&self) -> f64 {
        self.sample_ratio
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the OOB evaluation mode.
    #[must_use]
    pub fn oob_mode(&self) -> OobMode {
        self.oob_mode
    }

    /// Train a bagged ensemble, seeding a `ChaCha8Rng` from [`BaggingConfig::seed`].
    ///
    /// `features[sample_idx][feature_idx]`: row-major layout.
    /// `labels[sample_idx]`: any label type with equality.
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                          |
    /// |---------------------------------------|-----------------------------------------------|
    /// | [`RfError::EmptyDataset`]             | `features` is empty                           |
    /// | [`RfError::LabelCountMismatch`]       | `labels.len() != features.len()`              |
    /// | [`RfError::ZeroFeatures`]             | rows have zero feature columns                |
    /// | [`RfError::FeatureCountMismatch`]     | rows have inconsistent lengths                |
    /// | [`RfError::NonFiniteValue`]           | any value is NaN or infinite                  |
    /// | [`RfError::InvalidSampleRatio`]       | `sample_ratio` is not in (0.0, 1.0]           |
    /// | [`RfError::InvalidMinSamplesSplit`]   | `min_samples_split` < 2                       |
    /// | [`RfError::OobEvaluationFailed`]      | OOB enabled but no sample has any OOB tree    |
    pub fn fit<L>(&self, features: &[Vec<f64>], labels: &[L]) -> Result<BaggedEnsemble<L>, RfError>
    where
        L: Clone + PartialEq + Send + Sync,
    {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.fit_with_rng(features, labels, &mut rng)
    }

    /// Train a bagged ensemble drawing randomness from `rng`.
    ///
    /// `rng` yields one `u64` per tree, in tree order, before any tree is
    /// trained; tree `i` then draws its bootstrap sample from a `ChaCha8Rng`
    /// seeded with the `i`-th value. The configured seed is ignored.
    ///
    /// # Errors
    ///
    /// Same as [`BaggingConfig::fit`].
    pub fn fit_with_rng<L, R>(
        &self,
        features: &[Vec<f64>],
        labels: &[L],
        rng: &mut R,
    ) -> Result<BaggedEnsemble<L>, RfError>
    where
        L: Clone + PartialEq + Send + Sync,
        R: Rng,
    {
        crate::forest::train(self, features, labels, rng)
    }

    /// Fit on the training side of `holdout` and report on its test side.
    ///
    /// # Errors
    ///
    /// Same as [`BaggingConfig::fit`], plus prediction errors on the test rows.
    pub fn evaluate<L>(&self, holdout: &Holdout<L>) -> Result<HoldoutEvaluation<L>, RfError>
    where
        L: Clone + PartialEq + Send + Sync,
    {
        holdout.evaluate(self)
    }
}
