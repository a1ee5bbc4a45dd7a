//! Per-feature standardization to zero mean and unit variance.

use crate::error::{RfError, validate_matrix};

/// Column-wise standard scaler.
///
/// Learns each column's mean and population standard deviation (divides by
/// n, not n-1). Columns with zero variance keep a scale of 1.0 so they are
/// only centered.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn column means and scales from `features`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | `features` is empty |
    /// | [`RfError::ZeroFeatures`] | rows have zero feature columns |
    /// | [`RfError::FeatureCountMismatch`] | rows have inconsistent lengths |
    /// | [`RfError::NonFiniteValue`] | any value is NaN or infinite |
    pub fn fit(features: &[Vec<f64>]) -> Result<Self, RfError> {
        let n_features = validate_matrix(features)?;
        let n = features.len() as f64;

        let means: Vec<f64> = (0..n_features)
            .map(|j| features.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let scales: Vec<f64> = means
            .iter()
            .enumerate()
            .map(|(j, &mean)| {
                let variance = features.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / n;
                let std = variance.sqrt();
                if std == 0.0 { 1.0 } else { std }
            })
            .collect();

        Ok(Self { means, scales })
    }

    /// Standardize a single row.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `row.len()` differs from
    /// the fitted width.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, RfError> {
        if row.len() != self.means.len() {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.means.len(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(&x, (&mean, &scale))| (x - mean) / scale)
            .collect())
    }

    /// Standardize every row of `features`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::FeatureCountMismatch`] for the first row whose width differs.
    pub fn transform(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, RfError> {
        features
            .iter()
            .enumerate()
            .map(|(sample_index, row)| {
                self.transform_row(row).map_err(|_| RfError::FeatureCountMismatch {
                    expected: self.means.len(),
                    got: row.len(),
                    sample_index,
                })
            })
            .collect()
    }

    /// Learn the scaler from `features` and return it with the standardized rows.
    ///
    /// # Errors
    ///
    /// Same as [`StandardScaler::fit`].
    pub fn fit_transform(features: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>), RfError> {
        let scaler = Self::fit(features)?;
        let scaled = scaler.transform(features)?;
        Ok((scaler, scaled))
    }

    /// Return the per-column means.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Return the per-column scales (population standard deviations, 1.0 for constant columns).
    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_get_zero_mean_unit_variance() {
        let features = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0], vec![4.0, 40.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(&features).unwrap();

        assert!((scaler.means()[0] - 2.5).abs() < 1e-12);
        assert!((scaler.means()[1] - 25.0).abs() < 1e-12);

        for j in 0..2 {
            let col: Vec<f64> = scaled.iter().map(|row| row[j]).collect();
            let mean = col.iter().sum::<f64>() / 4.0;
            let var = col.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_column_is_only_centered() {
        let features = vec![vec![5.0, 1.0], vec![5.0, 3.0]];
        let scaler = StandardScaler::fit(&features).unwrap();
        assert!((scaler.scales()[0] - 1.0).abs() < f64::EPSILON);
        let row = scaler.transform_row(&[7.0, 2.0]).unwrap();
        assert!((row[0] - 2.0).abs() < 1e-12);
        assert!(row[1].abs() < 1e-12);
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(
            StandardScaler::fit(&[]).unwrap_err(),
            RfError::EmptyDataset
        ));
    }

    #[test]
    fn non_finite_rejected() {
        let err = StandardScaler::fit(&[vec![1.0], vec![f64::NAN]]).unwrap_err();
        assert!(matches!(err, RfError::NonFiniteValue { sample_index: 1, .. }));
    }

    #[test]
    fn width_mismatch_on_transform() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform_row(&[1.0]).unwrap_err(),
            RfError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
        assert!(matches!(
            scaler.transform(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err(),
            RfError::FeatureCountMismatch { sample_index: 1, .. }
        ));
    }
}
