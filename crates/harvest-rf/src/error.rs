/// Broad class of an [`RfError`].
///
/// Lets a caller tell "the input was malformed" apart from "the model or its
/// settings are not usable" without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed training, prediction, or evaluation data.
    Input,
    /// Invalid hyperparameters or an unusable configuration.
    Config,
}

/// Errors from tree and ensemble operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when sample_ratio is not in (0.0, 1.0].
    #[error("sample_ratio must be in (0.0, 1.0], got {ratio}")]
    InvalidSampleRatio {
        /// The invalid sample_ratio value provided.
        ratio: f64,
    },

    /// Returned when a hold-out test fraction is not in (0.0, 1.0).
    #[error("test_fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTestFraction {
        /// The invalid test fraction provided.
        fraction: f64,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the label vector and the feature matrix disagree in length.
    #[error("got {n_labels} labels for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when an evaluation receives no rows, or a split would leave one side empty.
    #[error("evaluation set is empty: {reason}")]
    EmptyEvaluationSet {
        /// Human-readable description of what was empty.
        reason: String,
    },

    /// Returned when OOB evaluation fails (no sample has any OOB tree).
    #[error("OOB evaluation failed: {reason}")]
    OobEvaluationFailed {
        /// Human-readable description of why OOB evaluation failed.
        reason: String,
    },
}

impl RfError {
    /// Classify this error as an input problem or a configuration problem.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            RfError::InvalidTreeCount { .. }
            | RfError::InvalidMinSamplesSplit { .. }
            | RfError::InvalidSampleRatio { .. }
            | RfError::InvalidTestFraction { .. }
            | RfError::OobEvaluationFailed { .. } => ErrorCategory::Config,
            RfError::EmptyDataset
            | RfError::ZeroFeatures
            | RfError::LabelCountMismatch { .. }
            | RfError::FeatureCountMismatch { .. }
            | RfError::PredictionFeatureMismatch { .. }
            | RfError::NonFiniteValue { .. }
            | RfError::EmptyEvaluationSet { .. } => ErrorCategory::Input,
        }
    }
}

/// Check that a feature matrix is non-empty, rectangular, and finite.
///
/// Returns the feature count on success.
pub(crate) fn validate_matrix(features: &[Vec<f64>]) -> Result<usize, RfError> {
    let Some(first) = features.first() else {
        return Err(RfError::EmptyDataset);
    };
    let n_features = first.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }

    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }

    Ok(n_features)
}

/// Check a feature matrix as [`validate_matrix`] does, plus one label per row.
///
/// Returns the feature count on success.
pub(crate) fn validate_training_set<L>(
    features: &[Vec<f64>],
    labels: &[L],
) -> Result<usize, RfError> {
    if !features.is_empty() && labels.len() != features.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    validate_matrix(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_features_rejected() {
        let err = validate_training_set::<u8>(&[], &[]).unwrap_err();
        assert_eq!(err, RfError::EmptyDataset);
        assert_eq!(err.category(), ErrorCategory::Input);
    }

    #[test]
    fn label_length_mismatch_rejected() {
        let features = vec![vec![1.0], vec![2.0]];
        let err = validate_training_set(&features, &["a"]).unwrap_err();
        assert_eq!(
            err,
            RfError::LabelCountMismatch {
                n_samples: 2,
                n_labels: 1
            }
        );
    }

    #[test]
    fn ragged_rows_rejected() {
        let features = vec![vec![1.0, 2.0], vec![3.0]];
        let err = validate_training_set(&features, &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            RfError::FeatureCountMismatch {
                expected: 2,
                got: 1,
                sample_index: 1
            }
        ));
    }

    #[test]
    fn infinite_value_located() {
        let features = vec![vec![1.0, 2.0], vec![3.0, f64::INFINITY]];
        let err = validate_training_set(&features, &[0, 1]).unwrap_err();
        assert_eq!(
            err,
            RfError::NonFiniteValue {
                sample_index: 1,
                feature_index: 1
            }
        );
    }

    #[test]
    fn valid_set_reports_width() {
        let features = vec![vec![1.0, 2.0, 3.0]];
        assert_eq!(validate_training_set(&features, &['x']).unwrap(), 3);
    }

    #[test]
    fn config_variants_are_config_errors() {
        assert_eq!(
            RfError::InvalidTreeCount { n_trees: 0 }.category(),
            ErrorCategory::Config
        );
        assert_eq!(
            RfError::InvalidSampleRatio { ratio: 1.5 }.category(),
            ErrorCategory::Config
        );
        assert_eq!(
            RfError::InvalidMinSamplesSplit { min_samples_split: 1 }.category(),
            ErrorCategory::Config
        );
    }

    #[test]
    fn display_messages_carry_fields() {
        let msg = RfError::PredictionFeatureMismatch { expected: 4, got: 3 }.to_string();
        assert_eq!(msg, "prediction input has 3 features, expected 4");
    }
}
