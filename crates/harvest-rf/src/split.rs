use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::node::FeatureIndex;
use crate::vote::VoteTally;

/// Node size at which the per-feature split search fans out across threads.
pub(crate) const PARALLEL_SPLIT_MIN_SAMPLES: usize = 4096;

/// Shannon entropy in bits of a node from its class counts.
///
/// `-Σ p_i · log2(p_i)` over classes with a non-zero count, where
/// `p_i = count_i / n_samples`. Returns 0.0 when `n_samples` is zero.
#[must_use]
pub fn entropy(class_counts: &[usize], n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    -class_counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Shannon entropy in bits of a label sequence.
#[must_use]
pub fn label_entropy<L: PartialEq>(labels: &[L]) -> f64 {
    let tally: VoteTally<&L> = labels.iter().collect();
    let counts: Vec<usize> = tally.iter().map(|(_, count)| count).collect();
    entropy(&counts, labels.len())
}

/// Information gain of splitting a node with `left_counts` and `right_counts`.
///
/// Parent entropy minus the size-weighted average of the child entropies.
/// A split that leaves either side empty has zero gain.
#[must_use]
pub fn information_gain(left_counts: &[usize], right_counts: &[usize]) -> f64 {
    let n_left: usize = left_counts.iter().sum();
    let n_right: usize = right_counts.iter().sum();
    if n_left == 0 || n_right == 0 {
        return 0.0;
    }
    let parent_counts: Vec<usize> = left_counts
        .iter()
        .zip(right_counts)
        .map(|(l, r)| l + r)
        .collect();
    weighted_gain(
        entropy(&parent_counts, n_left + n_right),
        left_counts,
        n_left,
        right_counts,
        n_right,
    )
}

fn weighted_gain(
    parent_entropy: f64,
    left_counts: &[usize],
    n_left: usize,
    right_counts: &[usize],
    n_right: usize,
) -> f64 {
    let n = (n_left + n_right) as f64;
    let left_weight = n_left as f64 / n;
    let right_weight = n_right as f64 / n;
    parent_entropy
        - (left_weight * entropy(left_counts, n_left)
            + right_weight * entropy(right_counts, n_right))
}

/// Best split found for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    /// Feature used for the split.
    pub(crate) feature: FeatureIndex,
    /// Threshold value; one of the values observed for `feature` in the node.
    pub(crate) threshold: f64,
    /// Information gain in bits.
    pub(crate) gain: f64,
    /// Sample indices going to the left child, in input order.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices going to the right child, in input order.
    pub(crate) right_indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Keep the first candidate that strictly beats the running best, starting from zero gain.
fn first_strict_max(candidates: impl IntoIterator<Item = Candidate>) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for candidate in candidates {
        let best_gain = best.map_or(0.0, |b| b.gain);
        if candidate.gain > best_gain {
            best = Some(candidate);
        }
    }
    best
}

/// Score every observed value of one feature as a threshold.
///
/// Sorts the node's `(value, class)` pairs and sweeps distinct values in
/// ascending order, moving rows from the right counts to the left counts.
/// Each step scores the threshold `value`, i.e. `x <= value` goes left.
fn best_threshold_for_feature(
    feature: usize,
    column: &[f64],
    classes: &[usize],
    sample_indices: &[usize],
    parent_counts: &[usize],
    parent_entropy: f64,
) -> Option<Candidate> {
    let n_samples = sample_indices.len();
    let mut sorted: Vec<(f64, usize)> = sample_indices
        .iter()
        .map(|&si| (column[si], classes[si]))
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut left_counts = vec![0usize; parent_counts.len()];
    let mut right_counts = parent_counts.to_vec();

    let sweep = std::iter::from_fn({
        let mut i = 0;
        move || {
            if i >= n_samples {
                return None;
            }
            let value = sorted[i].0;
            while i < n_samples && sorted[i].0 == value {
                let class = sorted[i].1;
                left_counts[class] += 1;
                right_counts[class] -= 1;
                i += 1;
            }
            // The largest value sends every row left: zero gain, never selected.
            if i == n_samples {
                return None;
            }
            let gain = weighted_gain(
                parent_entropy,
                &left_counts,
                i,
                &right_counts,
                n_samples - i,
            );
            Some(Candidate {
                feature,
                threshold: value,
                gain,
            })
        }
    });

    first_strict_max(sweep)
}

/// Find the split with the highest information gain.
///
/// Features are scanned in index order and thresholds in ascending order;
/// the first candidate to strictly exceed the best gain so far is kept, so
/// ties go to the lowest feature index and then the lowest threshold. Only
/// splits with positive gain are returned.
///
/// With `parallel` set, features are scored concurrently and then reduced in
/// feature order with the same rule, which yields the identical split.
///
/// # Column-major layout
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
/// `classes[sample_idx]` is the dense class id of each sample and
/// `sample_indices` lists the samples reaching the node.
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    classes: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    parallel: bool,
) -> Option<SplitResult> {
    let n_samples = sample_indices.len();
    if n_samples < 2 || features.is_empty() {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[classes[si]] += 1;
    }
    let parent_entropy = entropy(&parent_counts, n_samples);

    let score = |feature: usize| {
        best_threshold_for_feature(
            feature,
            &features[feature],
            classes,
            sample_indices,
            &parent_counts,
            parent_entropy,
        )
    };

    let per_feature: Vec<Option<Candidate>> = if parallel {
        (0..features.len()).into_par_iter().map(score).collect()
    } else {
        (0..features.len()).map(score).collect()
    };

    let best = first_strict_max(per_feature.into_iter().flatten())?;

    let column = &features[best.feature];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .partition(|&&si| column[si] <= best.threshold);

    Some(SplitResult {
        feature: FeatureIndex::new(best.feature),
        threshold: best.threshold,
        gain: best.gain,
        left_indices,
        right_indices,
    })
}
