//! The weight fitter: intercept-free ordinary least squares over model
//! columns.

use crate::blend::error::BlendError;
use crate::dataset::AlignedMatrix;
use log::debug;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView2};
use std::collections::BTreeMap;

/// Model name to fitted coefficient. Weights carry no non-negativity or
/// sum-to-one constraint; negative or larger-than-one values are valid
/// least-squares output.
pub type WeightVector = BTreeMap<String, f64>;

/// A fitted linear blend of model forecasts.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendModel {
    models: Vec<String>,
    coefficients: Array1<f64>,
}

impl BlendModel {
    /// Builds a blend from precomputed weights, e.g. reloaded from an
    /// earlier fit. Model order follows the map's sorted keys.
    pub fn from_weights(weights: &WeightVector) -> Self {
        Self {
            models: weights.keys().cloned().collect(),
            coefficients: weights.values().copied().collect(),
        }
    }

    /// Model names in coefficient order.
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Fitted coefficients in model order.
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// The weights as a name-keyed map.
    pub fn weights(&self) -> WeightVector {
        self.models
            .iter()
            .cloned()
            .zip(self.coefficients.iter().copied())
            .collect()
    }

    /// Applies the blend to a feature matrix with one column per model,
    /// in this model's column order.
    pub fn predict(&self, features: &ArrayView2<'_, f64>) -> Array1<f64> {
        debug_assert_eq!(features.ncols(), self.models.len());
        features.dot(&self.coefficients)
    }
}

/// Tolerance ladder for the SVD solve; singular values below the working
/// epsilon are treated as zero, which gives the minimum-norm solution on
/// rank-deficient input.
const SVD_EPSILONS: [f64; 3] = [1e-12, 1e-9, 1e-6];

/// Fits `observed ≈ Σ weight_i * model_i` by ordinary least squares with
/// no intercept.
///
/// The matrix must be fully populated; missing cells are a caller
/// contract violation, not data this fitter imputes. Collinear or
/// constant columns are not an error: the SVD solve yields the
/// minimum-norm solution, at the price of non-unique weights.
///
/// # Errors
///
/// [`BlendError::EmptyMatrix`] and [`BlendError::NoModelColumns`] for
/// degenerate shapes, [`BlendError::MissingValue`] for any missing cell
/// and [`BlendError::NonFinite`] for NaN or infinite inputs.
pub fn fit_weights(matrix: &AlignedMatrix) -> Result<BlendModel, BlendError> {
    if matrix.n_rows() == 0 {
        return Err(BlendError::EmptyMatrix);
    }
    if matrix.n_models() == 0 {
        return Err(BlendError::NoModelColumns);
    }
    if let Some((row, col)) = matrix.first_missing() {
        return Err(BlendError::MissingValue {
            model: matrix.models()[col].clone(),
            run_datetime: matrix.run_datetimes()[row],
            datetime: matrix.datetimes()[row],
        });
    }

    let n = matrix.n_rows();
    let m = matrix.n_models();
    let features = matrix.zero_filled_features();
    for row in 0..n {
        if !matrix.observed()[row].is_finite()
            || (0..m).any(|col| !features[[row, col]].is_finite())
        {
            return Err(BlendError::NonFinite { row });
        }
    }

    let a = DMatrix::from_fn(n, m, |i, j| features[[i, j]]);
    let b = DVector::from_iterator(n, matrix.observed().iter().copied());
    let svd = a.svd(true, true);
    let mut solution = None;
    for eps in SVD_EPSILONS {
        if let Ok(x) = svd.solve(&b, eps) {
            solution = Some(x);
            break;
        }
    }
    let solution = solution.ok_or_else(|| BlendError::SolveFailed {
        reason: "singular value decomposition produced no solution".to_string(),
    })?;

    let coefficients = Array1::from_iter(solution.iter().copied());
    debug!(
        "fitted {} blend weights over {} rows: {:?}",
        m,
        n,
        coefficients.as_slice()
    );
    Ok(BlendModel {
        models: matrix.models().to_vec(),
        coefficients,
    })
}
