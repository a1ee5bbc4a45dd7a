//! Confusion matrix and per-label classification metrics.

use std::fmt;

use crate::error::RfError;

/// Precision, recall, and F1 for one label.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassMetrics<L> {
    /// The label these metrics describe.
    pub label: L,
    /// Precision: TP / (TP + FP). 0.0 if the label was never predicted.
    pub precision: f64,
    /// Recall: TP / (TP + FN). 0.0 if the label never occurs in the truth.
    pub recall: f64,
    /// F1: 2 * precision * recall / (precision + recall). 0.0 if both are zero.
    pub f1: f64,
    /// Number of true samples with this label.
    pub support: usize,
}

/// Precision, recall, and F1 averaged over labels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AverageMetrics {
    /// Averaged precision.
    pub precision: f64,
    /// Averaged recall.
    pub recall: f64,
    /// Averaged F1.
    pub f1: f64,
}

/// Classification report over arbitrary labels.
///
/// Labels are indexed in first-encounter order: the truth is scanned first,
/// then the predictions for labels that never occur in the truth. Entry
/// `matrix[t][p]` counts samples with true label `labels[t]` predicted as
/// `labels[p]`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassificationReport<L> {
    labels: Vec<L>,
    matrix: Vec<Vec<usize>>,
}

impl<L: Clone + PartialEq> ClassificationReport<L> {
    /// Build a report from true and predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyEvaluationSet`] | Zero labels provided |
    /// | [`RfError::LabelCountMismatch`] | `predicted.len() != truth.len()` |
    pub fn from_predictions(truth: &[L], predicted: &[L]) -> Result<Self, RfError> {
        if truth.is_empty() {
            return Err(RfError::EmptyEvaluationSet {
                reason: "no labels to compare".to_string(),
            });
        }
        if truth.len() != predicted.len() {
            return Err(RfError::LabelCountMismatch {
                n_samples: truth.len(),
                n_labels: predicted.len(),
            });
        }

        let mut labels: Vec<L> = Vec::new();
        for label in truth.iter().chain(predicted) {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        let index_of = |label: &L| labels.iter().position(|l| l == label).unwrap_or_default();

        let n_labels = labels.len();
        let mut matrix = vec![vec![0usize; n_labels]; n_labels];
        for (t, p) in truth.iter().zip(predicted) {
            matrix[index_of(t)][index_of(p)] += 1;
        }
        Ok(Self { labels, matrix })
    }
}

impl<L> ClassificationReport<L> {
    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.labels.len()).map(|i| self.matrix[i][i]).sum();
        let total = self.n_samples();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Per-label precision, recall, F1, and support, in label order.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics<L>>
    where
        L: Clone,
    {
        let n = self.labels.len();
        (0..n)
            .map(|c| {
                let tp = self.matrix[c][c];
                let predicted_c: usize = (0..n).map(|i| self.matrix[i][c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = if predicted_c == 0 {
                    0.0
                } else {
                    tp as f64 / predicted_c as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    label: self.labels[c].clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Unweighted mean of the per-label metrics.
    #[must_use]
    pub fn macro_average(&self) -> AverageMetrics
    where
        L: Clone,
    {
        let metrics = self.class_metrics();
        let n = metrics.len() as f64;
        AverageMetrics {
            precision: metrics.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: metrics.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: metrics.iter().map(|m| m.f1).sum::<f64>() / n,
        }
    }

    /// Support-weighted mean of the per-label metrics.
    #[must_use]
    pub fn weighted_average(&self) -> AverageMetrics
    where
        L: Clone,
    {
        let metrics = self.class_metrics();
        let total = self.n_samples() as f64;
        let weighted = |f: fn(&ClassMetrics<L>) -> f64| {
            metrics.iter().map(|m| f(m) * m.support as f64).sum::<f64>() / total
        };
        AverageMetrics {
            precision: weighted(|m: &ClassMetrics<L>| m.precision),
            recall: weighted(|m: &ClassMetrics<L>| m.recall),
            f1: weighted(|m: &ClassMetrics<L>| m.f1),
        }
    }

    /// Return the labels in matrix order.
    #[must_use]
    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    /// Return the underlying confusion matrix rows (`[true][predicted]`).
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of evaluated samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.matrix.iter().flat_map(|row| row.iter()).sum()
    }
}

impl<L: Clone + fmt::Display> fmt::Display for ClassificationReport<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|l| l.to_string().len())
            .max()
            .unwrap_or(0)
            .max(12);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for m in self.class_metrics() {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label.to_string(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f)?;

        let total = self.n_samples();
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy(),
            total
        )?;
        for (name, avg) in [
            ("macro avg", self.macro_average()),
            ("weighted avg", self.weighted_average()),
        ] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, total
            )?;
        }
        Ok(())
    }
}
