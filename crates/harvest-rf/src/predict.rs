//! Prediction methods for the bagged ensemble.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::config::BaggingConfig;
use crate::error::RfError;
use crate::forest::BaggedEnsemble;
use crate::oob::OobScore;
use crate::tree::DecisionTree;
use crate::vote::VoteTally;

impl<L: PartialEq> BaggedEnsemble<L> {
    fn check_width(&self, sample: &[f64]) -> Result<(), RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(())
    }

    /// Collect one vote per tree for a single sample.
    ///
    /// Votes are recorded in tree order, so the tally's first-encounter
    /// order follows the trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_votes(&self, sample: &[f64]) -> Result<VoteTally<&L>, RfError> {
        self.check_width(sample)?;
        self.trees.iter().map(|tree| tree.predict(sample)).collect()
    }

    /// Predict the majority label for a single sample.
    ///
    /// Ties go to the label predicted by the earliest tree.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<&L, RfError> {
        let votes = self.predict_votes(sample)?;
        // The ensemble always holds at least one tree.
        votes.into_winner().ok_or(RfError::InvalidTreeCount { n_trees: 0 })
    }

    /// Predict one label per row in parallel, returned in input order.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<L>, RfError>
    where
        L: Clone + Send + Sync,
    {
        features
            .par_iter()
            .map(|sample| self.predict(sample).cloned())
            .collect()
    }
}

impl<L> BaggedEnsemble<L> {
    /// Borrow the fitted trees, in vote order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree<L>] {
        &self.trees
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the number of features this ensemble was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the configuration the ensemble was trained with.
    #[must_use]
    pub fn config(&self) -> &BaggingConfig {
        &self.config
    }

    /// Return the bootstrap row indices drawn for each tree, in tree order.
    #[must_use]
    pub fn bootstrap_indices(&self) -> &[Vec<usize>] {
        &self.bootstrap_indices
    }

    /// Return the out-of-bag score, if OOB evaluation was enabled.
    #[must_use]
    pub fn oob_score(&self) -> Option<&OobScore<L>> {
        self.oob_score.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use crate::RfError;
    use crate::config::BaggingConfig;
    use crate::forest::BaggedEnsemble;
    use crate::tree::{DecisionTree, DecisionTreeConfig};

    /// A tree that predicts `label` for every 1-feature sample.
    fn constant_tree(label: &'static str) -> DecisionTree<&'static str> {
        DecisionTreeConfig::new().fit(&[vec![0.0]], &[label]).unwrap()
    }

    fn ensemble_of(trees: Vec<DecisionTree<&'static str>>) -> BaggedEnsemble<&'static str> {
        BaggedEnsemble {
            config: BaggingConfig::new(trees.len()).unwrap(),
            n_features: 1,
            bootstrap_indices: vec![Vec::new(); trees.len()],
            oob_score: None,
            trees,
        }
    }

    #[test]
    fn majority_of_three_trees() {
        let ensemble = ensemble_of(vec![
            constant_tree("A"),
            constant_tree("A"),
            constant_tree("B"),
        ]);
        assert_eq!(*ensemble.predict(&[5.0]).unwrap(), "A");

        let ensemble = ensemble_of(vec![
            constant_tree("B"),
            constant_tree("A"),
            constant_tree("A"),
        ]);
        assert_eq!(*ensemble.predict(&[5.0]).unwrap(), "A");
    }

    #[test]
    fn tie_goes_to_earliest_tree() {
        let ensemble = ensemble_of(vec![
            constant_tree("B"),
            constant_tree("A"),
            constant_tree("A"),
            constant_tree("B"),
        ]);
        assert_eq!(*ensemble.predict(&[0.0]).unwrap(), "B");
    }

    #[test]
    fn votes_expose_distribution() {
        let ensemble = ensemble_of(vec![
            constant_tree("A"),
            constant_tree("B"),
            constant_tree("A"),
        ]);
        let votes = ensemble.predict_votes(&[1.0]).unwrap();
        assert_eq!(votes.total(), 3);
        assert_eq!(votes.count(&&"A"), 2);
        assert!((votes.fraction(&&"B") - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn batch_preserves_row_order() {
        let features: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
        let labels: Vec<&str> = (0..40).map(|i| if i < 20 { "low" } else { "high" }).collect();
        let ensemble = BaggingConfig::new(9)
            .unwrap()
            .with_sample_ratio(1.0)
            .fit(&features, &labels)
            .unwrap();

        let rows = vec![vec![39.0], vec![0.0], vec![35.0], vec![2.0]];
        let predictions = ensemble.predict_batch(&rows).unwrap();
        assert_eq!(predictions, vec!["high", "low", "high", "low"]);
        for (row, prediction) in rows.iter().zip(&predictions) {
            assert_eq!(ensemble.predict(row).unwrap(), prediction);
        }
    }

    #[test]
    fn prediction_is_idempotent() {
        let features: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let labels: Vec<u8> = (0..30).map(|i| (i % 3) as u8).collect();
        let ensemble = BaggingConfig::new(5).unwrap().fit(&features, &labels).unwrap();
        let first = ensemble.predict_batch(&features).unwrap();
        let second = ensemble.predict_batch(&features).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn prediction_feature_mismatch() {
        let ensemble = ensemble_of(vec![constant_tree("A")]);
        let err = ensemble.predict(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            RfError::PredictionFeatureMismatch { expected: 1, got: 2 }
        ));
        assert!(ensemble.predict_batch(&[vec![1.0], vec![]]).is_err());
    }
}
