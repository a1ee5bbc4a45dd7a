//! Bagged ensemble training with parallel tree construction.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{BaggingConfig, OobMode};
use crate::error::{RfError, validate_training_set};
use crate::oob::{OobScore, compute_oob};
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// A fitted bagged ensemble of decision trees.
///
/// Trees are stored in the order their seeds were drawn; ties in the
/// majority vote go to the label predicted first in that order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BaggedEnsemble<L> {
    pub(crate) trees: Vec<DecisionTree<L>>,
    pub(crate) config: BaggingConfig,
    pub(crate) n_features: usize,
    pub(crate) bootstrap_indices: Vec<Vec<usize>>,
    pub(crate) oob_score: Option<OobScore<L>>,
}

/// Number of rows drawn per bootstrap sample.
///
/// `round(sample_ratio * n_samples)`, never less than one row.
pub(crate) fn draw_count(n_samples: usize, sample_ratio: f64) -> usize {
    ((n_samples as f64) * sample_ratio).round().max(1.0) as usize
}

/// Draw `draw_count` row indices uniformly with replacement.
fn bootstrap_sample(n_samples: usize, draw_count: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..draw_count).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the bagged ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train<L, R>(
    config: &BaggingConfig,
    features: &[Vec<f64>],
    labels: &[L],
    rng: &mut R,
) -> Result<BaggedEnsemble<L>, RfError>
where
    L: Clone + PartialEq + Send + Sync,
    R: Rng,
{
    // --- Validate inputs ---
    let n_features = validate_training_set(features, labels)?;
    let n_samples = features.len();

    // --- Validate config ---
    if config.n_trees == 0 {
        return Err(RfError::InvalidTreeCount {
            n_trees: config.n_trees,
        });
    }
    // Negated form also rejects NaN.
    if !(config.sample_ratio > 0.0 && config.sample_ratio <= 1.0) {
        return Err(RfError::InvalidSampleRatio {
            ratio: config.sample_ratio,
        });
    }
    if config.min_samples_split < 2 {
        return Err(RfError::InvalidMinSamplesSplit {
            min_samples_split: config.min_samples_split,
        });
    }

    let draw_count = draw_count(n_samples, config.sample_ratio);

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        draw_count,
        "training bagged ensemble"
    );

    // Per-tree seeds come off the caller's source in tree order, so the
    // parallel fits below see the same draws regardless of scheduling.
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| rng.r#gen()).collect();

    let tree_config = DecisionTreeConfig::new()
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split);

    let fitted: Vec<(DecisionTree<L>, Vec<usize>)> = tree_seeds
        .into_par_iter()
        .enumerate()
        .map(|(tree_idx, seed)| -> Result<(DecisionTree<L>, Vec<usize>), RfError> {
            let mut tree_rng = ChaCha8Rng::seed_from_u64(seed);
            let in_bag = bootstrap_sample(n_samples, draw_count, &mut tree_rng);

            let boot_features: Vec<Vec<f64>> =
                in_bag.iter().map(|&i| features[i].clone()).collect();
            let boot_labels: Vec<L> = in_bag.iter().map(|&i| labels[i].clone()).collect();

            let tree = tree_config.fit(&boot_features, &boot_labels)?;
            debug!(
                tree_idx,
                n_nodes = tree.n_nodes(),
                depth = tree.depth(),
                "tree fitted"
            );
            Ok((tree, in_bag))
        })
        .collect::<Result<_, _>>()?;

    let (trees, bootstrap_indices): (Vec<_>, Vec<_>) = fitted.into_iter().unzip();

    let oob_score = match config.oob_mode {
        OobMode::Enabled => Some(compute_oob(&trees, features, labels, &bootstrap_indices)?),
        OobMode::Disabled => None,
    };

    info!(
        oob_accuracy = oob_score.as_ref().map(|s| s.accuracy),
        "bagged ensemble training complete"
    );

    Ok(BaggedEnsemble {
        trees,
        config: config.clone(),
        n_features,
        bootstrap_indices,
        oob_score,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{bootstrap_sample, draw_count};
    use crate::RfError;
    use crate::config::{BaggingConfig, OobMode};

    /// Generate a simple 3-class separable dataset.
    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<&'static str>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for (offset, label) in [(0.0, "maize"), (10.0, "rice"), (20.0, "cotton")] {
            for i in 0..20 {
                features.push(vec![offset + i as f64 * 0.15, 0.5]);
                labels.push(label);
            }
        }
        (features, labels)
    }

    #[test]
    fn draw_count_rounds_and_floors_at_one() {
        assert_eq!(draw_count(10, 0.8), 8);
        assert_eq!(draw_count(5, 0.5), 3);
        assert_eq!(draw_count(7, 0.3), 2);
        assert_eq!(draw_count(2, 0.1), 1);
        assert_eq!(draw_count(4, 1.0), 4);
    }

    #[test]
    fn bootstrap_draws_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let sample = bootstrap_sample(5, 100, &mut rng);
        assert_eq!(sample.len(), 100);
        assert!(sample.iter().all(|&i| i < 5));
    }

    #[test]
    fn three_class_separable_accuracy() {
        let (features, labels) = make_separable_data();
        let ensemble = BaggingConfig::new(25)
            .unwrap()
            .fit(&features, &labels)
            .unwrap();

        let predictions = ensemble.predict_batch(&features).unwrap();
        let correct = predictions
            .iter()
            .zip(&labels)
            .filter(|&(p, l)| p == l)
            .count();
        let accuracy = correct as f64 / labels.len() as f64;
        assert!(accuracy > 0.9, "accuracy = {accuracy}");
    }

    #[test]
    fn tree_count_and_bootstrap_sizes() {
        let (features, labels) = make_separable_data();
        let ensemble = BaggingConfig::new(7)
            .unwrap()
            .with_sample_ratio(0.5)
            .fit(&features, &labels)
            .unwrap();
        assert_eq!(ensemble.n_trees(), 7);
        assert_eq!(ensemble.bootstrap_indices().len(), 7);
        for bag in ensemble.bootstrap_indices() {
            assert_eq!(bag.len(), 30);
            assert!(bag.iter().all(|&i| i < features.len()));
        }
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels) = make_separable_data();
        let config = BaggingConfig::new(10).unwrap().with_seed(99);
        let first = config.fit(&features, &labels).unwrap();
        let second = config.fit(&features, &labels).unwrap();
        assert_eq!(first.bootstrap_indices(), second.bootstrap_indices());
        assert_eq!(first, second);
    }

    #[test]
    fn explicit_rng_matches_seeded_fit() {
        let (features, labels) = make_separable_data();
        let config = BaggingConfig::new(5).unwrap().with_seed(11);
        let seeded = config.fit(&features, &labels).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let explicit = config.fit_with_rng(&features, &labels, &mut rng).unwrap();
        assert_eq!(seeded.trees(), explicit.trees());
    }

    #[test]
    fn different_seeds_draw_different_bags() {
        let (features, labels) = make_separable_data();
        let a = BaggingConfig::new(3).unwrap().with_seed(1).fit(&features, &labels).unwrap();
        let b = BaggingConfig::new(3).unwrap().with_seed(2).fit(&features, &labels).unwrap();
        assert_ne!(a.bootstrap_indices(), b.bootstrap_indices());
    }

    #[test]
    fn trees_draw_independent_bags() {
        let (features, labels) = make_separable_data();
        let ensemble = BaggingConfig::new(4).unwrap().fit(&features, &labels).unwrap();
        let bags = ensemble.bootstrap_indices();
        assert_ne!(bags[0], bags[1]);
        assert_ne!(bags[1], bags[2]);
    }

    #[test]
    fn oob_score_computed() {
        let (features, labels) = make_separable_data();
        let ensemble = BaggingConfig::new(30)
            .unwrap()
            .with_oob_mode(OobMode::Enabled)
            .fit(&features, &labels)
            .unwrap();

        let oob = ensemble.oob_score().expect("OOB should be computed");
        assert!(oob.accuracy > 0.8, "oob accuracy = {}", oob.accuracy);
        assert!(oob.n_oob_samples > 0);
    }

    #[test]
    fn oob_disabled_by_default() {
        let (features, labels) = make_separable_data();
        let ensemble = BaggingConfig::new(2).unwrap().fit(&features, &labels).unwrap();
        assert!(ensemble.oob_score().is_none());
    }

    #[test]
    fn invalid_sample_ratio_rejected() {
        let (features, labels) = make_separable_data();
        for ratio in [0.0, -0.5, 1.01, f64::NAN] {
            let err = BaggingConfig::new(3)
                .unwrap()
                .with_sample_ratio(ratio)
                .fit(&features, &labels)
                .unwrap_err();
            assert!(matches!(err, RfError::InvalidSampleRatio { .. }), "ratio {ratio}");
        }
    }

    #[test]
    fn invalid_min_samples_split_rejected() {
        let (features, labels) = make_separable_data();
        let err = BaggingConfig::new(3)
            .unwrap()
            .with_min_samples_split(0)
            .fit(&features, &labels)
            .unwrap_err();
        assert!(matches!(err, RfError::InvalidMinSamplesSplit { .. }));
    }

    #[test]
    fn empty_dataset_error() {
        let config = BaggingConfig::new(10).unwrap();
        let err = config.fit::<u8>(&[], &[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn label_mismatch_error() {
        let config = BaggingConfig::new(2).unwrap();
        let err = config.fit(&[vec![1.0], vec![2.0]], &[1u8]).unwrap_err();
        assert!(matches!(err, RfError::LabelCountMismatch { .. }));
    }
}
