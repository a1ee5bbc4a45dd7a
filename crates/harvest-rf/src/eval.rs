//! Hold-out evaluation for bagged ensembles.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::config::BaggingConfig;
use crate::error::{RfError, validate_training_set};
use crate::forest::BaggedEnsemble;
use crate::report::ClassificationReport;

/// Train/test split configuration.
///
/// Construct via [`TrainTestSplit::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    test_fraction: f64,
    seed: u64,
}

/// Rows of a dataset divided into a training side and a test side.
#[derive(Debug, Clone, PartialEq)]
pub struct Holdout<L> {
    /// Training rows, in shuffled order.
    pub train_features: Vec<Vec<f64>>,
    /// Labels of the training rows.
    pub train_labels: Vec<L>,
    /// Test rows, in shuffled order.
    pub test_features: Vec<Vec<f64>>,
    /// Labels of the test rows.
    pub test_labels: Vec<L>,
}

/// A model fitted on the training side of a [`Holdout`] and its test-side report.
#[derive(Debug, Clone)]
pub struct HoldoutEvaluation<L> {
    /// The ensemble fitted on the training rows.
    pub ensemble: BaggedEnsemble<L>,
    /// Report of the ensemble's predictions on the test rows.
    pub report: ClassificationReport<L>,
    /// Number of training rows.
    pub n_train: usize,
    /// Number of test rows.
    pub n_test: usize,
}

impl TrainTestSplit {
    /// Create a split that holds out `test_fraction` of the rows for testing.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTestFraction`] unless `0.0 < test_fraction < 1.0`.
    pub fn new(test_fraction: f64) -> Result<Self, RfError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(RfError::InvalidTestFraction {
                fraction: test_fraction,
            });
        }
        Ok(Self {
            test_fraction,
            seed: 42,
        })
    }

    /// Set the random seed for row shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the held-out fraction.
    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Return the shuffling seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Shuffle the rows and divide them into train and test sides.
    ///
    /// The test side receives `ceil(test_fraction * n)` rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] and other input errors | Invalid feature matrix or labels |
    /// | [`RfError::EmptyEvaluationSet`] | Either side would receive no rows |
    pub fn split<L: Clone>(
        &self,
        features: &[Vec<f64>],
        labels: &[L],
    ) -> Result<Holdout<L>, RfError> {
        validate_training_set(features, labels)?;
        let n_samples = features.len();
        let n_test = ((n_samples as f64) * self.test_fraction).ceil() as usize;
        if n_test >= n_samples {
            return Err(RfError::EmptyEvaluationSet {
                reason: format!(
                    "{n_samples} rows leave no training rows at test_fraction {}",
                    self.test_fraction
                ),
            });
        }

        let mut order: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);
        let (test_idx, train_idx) = order.split_at(n_test);

        let rows = |idx: &[usize]| idx.iter().map(|&i| features[i].clone()).collect();
        let targets = |idx: &[usize]| idx.iter().map(|&i| labels[i].clone()).collect();

        Ok(Holdout {
            train_features: rows(train_idx),
            train_labels: targets(train_idx),
            test_features: rows(test_idx),
            test_labels: targets(test_idx),
        })
    }

    /// Split the data, fit `config` on the training side, and report on the test side.
    ///
    /// # Errors
    ///
    /// Any error from [`TrainTestSplit::split`], [`BaggingConfig::fit`], or prediction.
    #[instrument(skip_all, fields(test_fraction = self.test_fraction, n_samples = features.len()))]
    pub fn evaluate<L>(
        &self,
        config: &BaggingConfig,
        features: &[Vec<f64>],
        labels: &[L],
    ) -> Result<HoldoutEvaluation<L>, RfError>
    where
        L: Clone + PartialEq + Send + Sync,
    {
        self.split(features, labels)?.evaluate(config)
    }
}

impl<L> Holdout<L>
where
    L: Clone + PartialEq + Send + Sync,
{
    /// Fit `config` on the training side and report on the test side.
    ///
    /// # Errors
    ///
    /// Any error from [`BaggingConfig::fit`] or prediction.
    pub fn evaluate(&self, config: &BaggingConfig) -> Result<HoldoutEvaluation<L>, RfError> {
        let ensemble = config.fit(&self.train_features, &self.train_labels)?;
        let predictions = ensemble.predict_batch(&self.test_features)?;
        let report = ClassificationReport::from_predictions(&self.test_labels, &predictions)?;

        info!(
            n_train = self.train_labels.len(),
            n_test = self.test_labels.len(),
            accuracy = report.accuracy(),
            "hold-out evaluation complete"
        );

        Ok(HoldoutEvaluation {
            ensemble,
            report,
            n_train: self.train_labels.len(),
            n_test: self.test_labels.len(),
        })
    }
}
