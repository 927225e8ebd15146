//! The candidate selector: trailing-time holdout, cross-validation and
//! the pick of the best pipeline.

use crate::blend::{mae, r_squared, rmse};
use crate::dataset::AlignedMatrix;
use crate::selection::cross_validation::cross_validate_rmse;
use crate::selection::error::SelectionError;
use crate::selection::gradient_boosting::{GradientBoostingParams, GradientBoostingRegressor};
use crate::selection::pipeline::{CandidateRegressor, ScaledPipeline};
use crate::selection::random_forest::{RandomForestParams, RandomForestRegressor};
use crate::selection::xgboost::{XgBoostParams, XgBoostRegressor};
use log::info;
use ndarray::{ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use std::fmt;

/// Folds used for cross-validation on the training split.
pub const CV_FOLDS: usize = 5;

/// Fraction of trailing rows held out for testing.
pub const TEST_FRACTION: f64 = 0.2;

/// The fixed candidate set in declaration order; declaration order is the
/// tie-break when two candidates test equally well.
fn candidates() -> Vec<(&'static str, CandidateRegressor)> {
    vec![
        (
            "RandomForest",
            CandidateRegressor::RandomForest(RandomForestRegressor::new(
                RandomForestParams::default(),
            )),
        ),
        (
            "GradientBoosting",
            CandidateRegressor::GradientBoosting(GradientBoostingRegressor::new(
                GradientBoostingParams::default(),
            )),
        ),
        (
            "XGBoost",
            CandidateRegressor::XgBoost(XgBoostRegressor::new(XgBoostParams::default())),
        ),
    ]
}

/// One candidate's cross-validated and held-out scores, with its fitted
/// pipeline retained for reuse.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub name: String,
    pub cv_rmse_mean: f64,
    pub test_rmse: f64,
    pub test_mae: f64,
    pub test_r2: f64,
    pub pipeline: ScaledPipeline,
}

/// Every candidate's result plus the index of the winner.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionReport {
    results: Vec<CandidateResult>,
    best: usize,
}

impl SelectionReport {
    /// Results in candidate declaration order.
    pub fn results(&self) -> &[CandidateResult] {
        &self.results
    }

    /// The candidate with the lowest held-out RMSE (first declared wins
    /// ties).
    pub fn best(&self) -> &CandidateResult {
        &self.results[self.best]
    }
}

impl fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<18} {:>12} {:>10} {:>10} {:>10}",
            "candidate", "CV RMSE mean", "test RMSE", "test MAE", "test R2"
        )?;
        for (index, result) in self.results.iter().enumerate() {
            let marker = if index == self.best { " *" } else { "" };
            writeln!(
                f,
                "{:<18} {:>12.4} {:>10.4} {:>10.4} {:>10.4}{}",
                result.name,
                result.cv_rmse_mean,
                result.test_rmse,
                result.test_mae,
                result.test_r2,
                marker
            )?;
        }
        write!(f, "best candidate: {}", self.best().name)
    }
}

fn evaluate_candidate(
    name: &str,
    regressor: CandidateRegressor,
    x_train: &ArrayView2<'_, f64>,
    y_train: &ArrayView1<'_, f64>,
    x_test: &ArrayView2<'_, f64>,
    y_test: &ArrayView1<'_, f64>,
) -> Result<CandidateResult, SelectionError> {
    let template = ScaledPipeline::new(regressor);
    let fold_scores = cross_validate_rmse(&template, x_train, y_train, CV_FOLDS)?;
    let cv_rmse_mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;

    let mut pipeline = template;
    pipeline.fit(x_train, y_train)?;
    let predictions = pipeline.predict(x_test)?;
    Ok(CandidateResult {
        name: name.to_string(),
        cv_rmse_mean,
        test_rmse: rmse(predictions.view(), y_test.reborrow()),
        test_mae: mae(predictions.view(), y_test.reborrow()),
        test_r2: r_squared(predictions.view(), y_test.reborrow()),
        pipeline,
    })
}

/// Trains and scores the fixed candidate set over `matrix` and picks the
/// winner by held-out RMSE.
///
/// The matrix is split 80/20 in row order with no shuffling: because rows
/// are chronologically sorted, the held-out 20% is the most recent data
/// and the evaluation respects temporal causality. That property only
/// holds on ordered input, so order is asserted rather than assumed.
/// Candidates are evaluated in parallel; every fit is seeded per tree, so
/// the report is identical across runs and thread schedules.
///
/// # Errors
///
/// [`SelectionError::EmptyMatrix`], [`SelectionError::NoModelColumns`],
/// [`SelectionError::MissingValue`] for incomplete input,
/// [`SelectionError::NonFinite`] for NaN or infinite cells,
/// [`SelectionError::UnorderedRows`] when rows are not chronological and
/// [`SelectionError::TooFewRows`] when the split cannot cover
/// [`CV_FOLDS`] training folds and one test row.
pub fn select_best_pipeline(matrix: &AlignedMatrix) -> Result<SelectionReport, SelectionError> {
    let n = matrix.n_rows();
    if n == 0 {
        return Err(SelectionError::EmptyMatrix);
    }
    if matrix.n_models() == 0 {
        return Err(SelectionError::NoModelColumns);
    }
    if let Some((row, col)) = matrix.first_missing() {
        return Err(SelectionError::MissingValue {
            model: matrix.models()[col].clone(),
            run_datetime: matrix.run_datetimes()[row],
            datetime: matrix.datetimes()[row],
        });
    }
    if let Some(row) = first_unordered_row(matrix) {
        return Err(SelectionError::UnorderedRows { row });
    }

    let features = matrix.zero_filled_features();
    let target = matrix.observed_array();
    for row in 0..n {
        if !target[row].is_finite() || features.row(row).iter().any(|v| !v.is_finite()) {
            return Err(SelectionError::NonFinite { row });
        }
    }

    let test_len = ((n as f64) * TEST_FRACTION).ceil() as usize;
    let train_len = n - test_len;
    if train_len < CV_FOLDS || test_len == 0 {
        return Err(SelectionError::TooFewRows {
            rows: n,
            train: train_len,
            test: test_len,
            folds: CV_FOLDS,
        });
    }

    let x_train = features.slice_axis(Axis(0), (0..train_len).into());
    let y_train = target.slice_axis(Axis(0), (0..train_len).into());
    let x_test = features.slice_axis(Axis(0), (train_len..n).into());
    let y_test = target.slice_axis(Axis(0), (train_len..n).into());

    let results: Vec<CandidateResult> = candidates()
        .into_par_iter()
        .map(|(name, regressor)| {
            evaluate_candidate(name, regressor, &x_train, &y_train, &x_test, &y_test)
        })
        .collect::<Result<_, _>>()?;

    let mut best = 0;
    for (index, result) in results.iter().enumerate().skip(1) {
        if result.test_rmse < results[best].test_rmse {
            best = index;
        }
    }
    info!(
        "selected {} over {} rows ({} train / {} test): test RMSE {:.4}",
        results[best].name, n, train_len, test_len, results[best].test_rmse
    );
    Ok(SelectionReport { results, best })
}

fn first_unordered_row(matrix: &AlignedMatrix) -> Option<usize> {
    let runs = matrix.run_datetimes();
    let targets = matrix.datetimes();
    (1..matrix.n_rows())
        .find(|&row| (runs[row], targets[row]) < (runs[row - 1], targets[row - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{align_records, AlignedMatrix, ForecastRecord};
    use ndarray::Array2;

    /// Sixty hourly rows of two synthetic models around a deterministic
    /// pseudo-observation, complete and chronological.
    fn synthetic_matrix() -> AlignedMatrix {
        let records: Vec<ForecastRecord> = (0..60)
            .flat_map(|i| {
                let t = i as f64;
                let obs = (t * 0.37).sin().abs() * 3.0 + (t * 0.11).cos() + 1.5;
                let run = i * 3_600_000;
                let target = run + 3_600_000;
                vec![
                    ForecastRecord::new("alpha", run, target, obs * 0.8 + 0.2, obs),
                    ForecastRecord::new("beta", run, target, obs + (t * 0.5).sin() * 0.7, obs),
                ]
            })
            .collect();
        align_records(&records).unwrap()
    }

    #[test]
    fn winner_has_the_lowest_held_out_rmse_and_scores_are_finite() {
        let report = select_best_pipeline(&synthetic_matrix()).unwrap();
        assert_eq!(report.results().len(), 3);
        let names: Vec<&str> = report.results().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["RandomForest", "GradientBoosting", "XGBoost"]);
        for result in report.results() {
            assert!(result.cv_rmse_mean.is_finite() && result.cv_rmse_mean >= 0.0);
            assert!(result.test_rmse.is_finite() && result.test_rmse >= 0.0);
            assert!(report.best().test_rmse <= result.test_rmse);
        }
    }

    #[test]
    fn repeated_selection_is_bit_identical() {
        let matrix = synthetic_matrix();
        let first = select_best_pipeline(&matrix).unwrap();
        let second = select_best_pipeline(&matrix).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn retained_pipelines_can_predict_again() {
        let matrix = synthetic_matrix();
        let report = select_best_pipeline(&matrix).unwrap();
        let features = matrix.zero_filled_features();
        for result in report.results() {
            let predictions = result.pipeline.predict(&features.view()).unwrap();
            assert_eq!(predictions.len(), matrix.n_rows());
        }
    }

    #[test]
    fn rejects_incomplete_and_empty_matrices() {
        let incomplete = align_records(&[
            ForecastRecord::new("a", 0, 1, 1.0, 0.5),
            ForecastRecord::new("b", 0, 2, 2.0, 0.6),
        ])
        .unwrap();
        assert!(matches!(
            select_best_pipeline(&incomplete).unwrap_err(),
            SelectionError::MissingValue { .. }
        ));
        let empty = align_records(&[]).unwrap();
        assert!(matches!(
            select_best_pipeline(&empty).unwrap_err(),
            SelectionError::EmptyMatrix
        ));
    }

    #[test]
    fn rejects_unordered_rows() {
        let matrix = AlignedMatrix::from_parts(
            vec!["a".into()],
            vec![3_600_000, 0],
            vec![0, 0],
            vec![1.0, 2.0],
            Array2::from_shape_vec((2, 1), vec![Some(1.0), Some(2.0)]).unwrap(),
        );
        assert!(matches!(
            select_best_pipeline(&matrix).unwrap_err(),
            SelectionError::UnorderedRows { row: 1 }
        ));
    }

    #[test]
    fn rejects_matrices_too_small_for_the_split() {
        let records: Vec<ForecastRecord> = (0..4)
            .map(|i| ForecastRecord::new("a", i, i + 1, i as f64, i as f64))
            .collect();
        let matrix = align_records(&records).unwrap();
        assert!(matches!(
            select_best_pipeline(&matrix).unwrap_err(),
            SelectionError::TooFewRows { rows: 4, .. }
        ));
    }
}
