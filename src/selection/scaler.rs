use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Column-wise standardization to zero mean and unit variance.
///
/// Tree regressors are scale-invariant, so this step changes nothing
/// about their fits; it is kept in front of every candidate so all
/// pipelines share the same shape. Zero-variance columns keep a scale of
/// one so transforming them is a no-op shift.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Array1<f64>,
    scales: Array1<f64>,
}

impl StandardScaler {
    /// Learns per-column mean and standard deviation (population, ddof 0).
    pub fn fit(features: &ArrayView2<'_, f64>) -> Self {
        let n = features.nrows().max(1) as f64;
        let means = features.sum_axis(Axis(0)) / n;
        let scales = features
            .axis_iter(Axis(1))
            .zip(means.iter())
            .map(|(column, mean)| {
                let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = variance.sqrt();
                if std > 0.0 {
                    std
                } else {
                    1.0
                }
            })
            .collect();
        Self { means, scales }
    }

    /// Applies the learned standardization.
    pub fn transform(&self, features: &ArrayView2<'_, f64>) -> Array2<f64> {
        debug_assert_eq!(features.ncols(), self.means.len());
        let mut out = features.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            column.mapv_inplace(|v| (v - self.means[j]) / self.scales[j]);
        }
        out
    }
}
