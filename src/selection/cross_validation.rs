//! Contiguous k-fold cross-validation with negative-MSE scoring.

use crate::selection::error::SelectionError;
use crate::selection::pipeline::ScaledPipeline;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Deterministic contiguous fold boundaries: `n_rows` split into `folds`
/// ranges, the first `n_rows % folds` of them one row longer. Rows are
/// never shuffled, so fold membership is independent of execution order.
pub fn fold_bounds(n_rows: usize, folds: usize) -> Vec<(usize, usize)> {
    debug_assert!(folds > 0 && n_rows >= folds);
    let base = n_rows / folds;
    let extra = n_rows % folds;
    let mut bounds = Vec::with_capacity(folds);
    let mut start = 0;
    for fold in 0..folds {
        let len = base + usize::from(fold < extra);
        bounds.push((start, start + len));
        start += len;
    }
    bounds
}

/// Cross-validates a pipeline configuration over the training split.
///
/// Each fold scores a fresh clone of `pipeline` fitted on the out-of-fold
/// rows with negative mean squared error, reported here after negation
/// and square root as one RMSE per fold.
pub fn cross_validate_rmse(
    pipeline: &ScaledPipeline,
    x: &ArrayView2<'_, f64>,
    y: &ArrayView1<'_, f64>,
    folds: usize,
) -> Result<Vec<f64>, SelectionError> {
    let n = x.nrows();
    let mut scores = Vec::with_capacity(folds);
    for (start, end) in fold_bounds(n, folds) {
        let train_idx: Vec<usize> = (0..start).chain(end..n).collect();
        let x_train: Array2<f64> = x.select(Axis(0), &train_idx);
        let y_train: Array1<f64> = y.select(Axis(0), &train_idx);
        let x_val = x.slice_axis(Axis(0), (start..end).into());
        let y_val = y.slice_axis(Axis(0), (start..end).into());

        let mut fold_pipeline = pipeline.clone();
        fold_pipeline.fit(&x_train.view(), &y_train.view())?;
        let predictions = fold_pipeline.predict(&x_val)?;
        let neg_mse = -predictions
            .iter()
            .zip(y_val.iter())
            .map(|(p, o)| (p - o).powi(2))
            .sum::<f64>()
            / (end - start) as f64;
        scores.push((-neg_mse).sqrt());
    }
    Ok(scores)
}
