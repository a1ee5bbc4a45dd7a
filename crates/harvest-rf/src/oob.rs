//! Out-of-bag (OOB) evaluation for bagged ensembles.

use crate::error::RfError;
use crate::report::ClassificationReport;
use crate::tree::DecisionTree;
use crate::vote::VoteTally;

/// Out-of-bag evaluation result.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OobScore<L> {
    /// OOB accuracy (fraction of correctly predicted OOB samples).
    pub accuracy: f64,
    /// Number of samples that had at least one OOB tree.
    pub n_oob_samples: usize,
    /// Report over the OOB-evaluated samples.
    pub report: ClassificationReport<L>,
}

/// Compute out-of-bag predictions and accuracy.
///
/// For each sample, only trees whose bootstrap did NOT draw it vote, with
/// the usual first-encounter tie-break over tree order. Samples with no OOB
/// tree are skipped.
pub(crate) fn compute_oob<L: Clone + PartialEq>(
    trees: &[DecisionTree<L>],
    features: &[Vec<f64>],
    labels: &[L],
    bootstrap_indices: &[Vec<usize>],
) -> Result<OobScore<L>, RfError> {
    let n_samples = features.len();

    let in_bag: Vec<Vec<bool>> = bootstrap_indices
        .iter()
        .map(|bag| {
            let mut flags = vec![false; n_samples];
            for &i in bag {
                flags[i] = true;
            }
            flags
        })
        .collect();

    let mut truth = Vec::new();
    let mut predicted = Vec::new();

    for (sample_idx, sample) in features.iter().enumerate() {
        let mut tally = VoteTally::new();
        for (tree, flags) in trees.iter().zip(&in_bag) {
            if !flags[sample_idx] {
                tally.record(tree.predict(sample)?);
            }
        }
        if let Some(winner) = tally.into_winner() {
            truth.push(labels[sample_idx].clone());
            predicted.push(winner.clone());
        }
    }

    if truth.is_empty() {
        return Err(RfError::OobEvaluationFailed {
            reason: "no sample has any OOB tree".to_string(),
        });
    }

    let report = ClassificationReport::from_predictions(&truth, &predicted)?;

    Ok(OobScore {
        accuracy: report.accuracy(),
        n_oob_samples: truth.len(),
        report,
    })
}
