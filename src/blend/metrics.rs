//! The metrics evaluator: in-sample RMSE and MAE per model and for the
//! fitted ensemble.

use crate::blend::error::BlendError;
use crate::blend::weights::BlendModel;
use crate::dataset::AlignedMatrix;
use ndarray::{Array1, ArrayView1};
use std::fmt;

/// Entity name of the blended forecast in a [`MetricsTable`].
pub const ENSEMBLE_ENTITY: &str = "Ensemble";

/// Accuracy of one scored entity (a model name or [`ENSEMBLE_ENTITY`]).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub entity: String,
    pub rmse: f64,
    pub mae: f64,
}

/// Per-entity accuracy metrics, one row per model plus the ensemble row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsTable {
    rows: Vec<MetricRow>,
}

impl MetricsTable {
    /// Rows in column order of the source matrix, ensemble last.
    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    /// Looks up one entity's row by name.
    pub fn get(&self, entity: &str) -> Option<&MetricRow> {
        self.rows.iter().find(|row| row.entity == entity)
    }
}

impl fmt::Display for MetricsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<20} {:>10} {:>10}", "entity", "RMSE", "MAE")?;
        for row in &self.rows {
            writeln!(f, "{:<20} {:>10.4} {:>10.4}", row.entity, row.rmse, row.mae)?;
        }
        Ok(())
    }
}

/// Root-mean-square error of `predicted` against `observed`.
pub fn rmse(predicted: ArrayView1<'_, f64>, observed: ArrayView1<'_, f64>) -> f64 {
    debug_assert_eq!(predicted.len(), observed.len());
    let mse = predicted
        .iter()
        .zip(observed.iter())
        .map(|(p, o)| (p - o).powi(2))
        .sum::<f64>()
        / predicted.len() as f64;
    mse.sqrt()
}

/// Mean absolute error of `predicted` against `observed`.
pub fn mae(predicted: ArrayView1<'_, f64>, observed: ArrayView1<'_, f64>) -> f64 {
    debug_assert_eq!(predicted.len(), observed.len());
    predicted
        .iter()
        .zip(observed.iter())
        .map(|(p, o)| (p - o).abs())
        .sum::<f64>()
        / predicted.len() as f64
}

/// Coefficient of determination of `predicted` against `observed`.
///
/// A constant observed column has no variance to explain; that case
/// scores 1.0 for an exact prediction and 0.0 otherwise.
pub fn r_squared(predicted: ArrayView1<'_, f64>, observed: ArrayView1<'_, f64>) -> f64 {
    debug_assert_eq!(predicted.len(), observed.len());
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    let ss_res: f64 = predicted
        .iter()
        .zip(observed.iter())
        .map(|(p, o)| (o - p).powi(2))
        .sum();
    let ss_tot: f64 = observed.iter().map(|o| (o - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Scores every model column and the fitted ensemble over the whole
/// matrix, in sample.
///
/// Missing forecasts are filled with zero before scoring, for the
/// individual columns and for the ensemble's feature matrix alike. This
/// is a deliberate, known approximation: a model with sparse coverage is
/// scored as if it predicted "no precipitation" wherever it was silent,
/// which can materially bias its metrics. Downstream consumers depend on
/// exactly this behavior, so it is documented here rather than replaced
/// by imputation.
///
/// # Errors
///
/// [`BlendError::EmptyMatrix`] for a matrix with no rows and
/// [`BlendError::ModelMismatch`] when the fitted blend's model set does
/// not match the matrix columns.
pub fn evaluate_models(
    matrix: &AlignedMatrix,
    model: &BlendModel,
) -> Result<MetricsTable, BlendError> {
    if matrix.n_rows() == 0 {
        return Err(BlendError::EmptyMatrix);
    }
    if model.models() != matrix.models() {
        return Err(BlendError::ModelMismatch {
            fitted: model.models().to_vec(),
            matrix: matrix.models().to_vec(),
        });
    }

    let observed = matrix.observed_array();
    let filled = matrix.zero_filled_features();
    let mut rows = Vec::with_capacity(matrix.n_models() + 1);
    for (col, name) in matrix.models().iter().enumerate() {
        let predicted = filled.column(col);
        rows.push(MetricRow {
            entity: name.clone(),
            rmse: rmse(predicted, observed.view()),
            mae: mae(predicted, observed.view()),
        });
    }

    let ensemble: Array1<f64> = model.predict(&filled.view());
    rows.push(MetricRow {
        entity: ENSEMBLE_ENTITY.to_string(),
        rmse: rmse(ensemble.view(), observed.view()),
        mae: mae(ensemble.view(), observed.view()),
    });
    Ok(MetricsTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::weights::{fit_weights, WeightVector};
    use crate::dataset::{align_records, AlignedMatrix, ForecastRecord};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn rec(model: &str, run: i64, target: i64, fc: f64, obs: f64) -> ForecastRecord {
        ForecastRecord::new(model, run, target, fc, obs)
    }

    fn fitted_pair() -> (AlignedMatrix, BlendModel) {
        let records: Vec<ForecastRecord> = (0..6)
            .flat_map(|i| {
                let obs = 0.5 * i as f64;
                vec![
                    rec("a", i, i + 1, obs + 0.1, obs),
                    rec("b", i, i + 1, obs - 0.2, obs),
                ]
            })
            .collect();
        let matrix = align_records(&records).unwrap();
        let model = fit_weights(&matrix).unwrap();
        (matrix, model)
    }

    #[test]
    fn rmse_dominates_mae_and_both_are_non_negative() {
        let (matrix, model) = fitted_pair();
        let table = evaluate_models(&matrix, &model).unwrap();
        assert_eq!(table.rows().len(), 3);
        for row in table.rows() {
            assert!(row.mae >= 0.0);
            assert!(row.rmse >= row.mae);
        }
    }

    #[test]
    fn zero_rmse_exactly_when_predictions_match_observations() {
        let records: Vec<ForecastRecord> = (0..4)
            .map(|i| rec("exact", i, i + 1, i as f64, i as f64))
            .collect();
        let matrix = align_records(&records).unwrap();
        let model = fit_weights(&matrix).unwrap();
        let table = evaluate_models(&matrix, &model).unwrap();
        assert_abs_diff_eq!(table.get("exact").unwrap().rmse, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            table.get(ENSEMBLE_ENTITY).unwrap().rmse,
            0.0,
            epsilon = 1e-9
        );
        let (imperfect_matrix, imperfect) = fitted_pair();
        let table = evaluate_models(&imperfect_matrix, &imperfect).unwrap();
        assert!(table.get("a").unwrap().rmse > 0.0);
    }

    #[test]
    fn fully_missing_column_scores_the_mean_absolute_observation() {
        // Model "b" never predicts; the zero-fill policy scores it as a
        // constant zero forecast.
        let observed = vec![1.0, -2.0, 3.0];
        let matrix = AlignedMatrix::from_parts(
            vec!["a".into(), "b".into()],
            vec![0, 1, 2],
            vec![1, 2, 3],
            observed.clone(),
            Array2::from_shape_vec(
                (3, 2),
                vec![Some(1.0), None, Some(-2.0), None, Some(3.0), None],
            )
            .unwrap(),
        );
        let mut weights = WeightVector::new();
        weights.insert("a".to_string(), 1.0);
        weights.insert("b".to_string(), 0.0);
        let model = BlendModel::from_weights(&weights);
        let table = evaluate_models(&matrix, &model).unwrap();

        let mean_abs_obs = observed.iter().map(|o| o.abs()).sum::<f64>() / 3.0;
        assert_abs_diff_eq!(table.get("b").unwrap().mae, mean_abs_obs, epsilon = 1e-12);
        assert_abs_diff_eq!(table.get("a").unwrap().rmse, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_model_set_mismatch_and_empty_matrix() {
        let (matrix, _) = fitted_pair();
        let mut weights = WeightVector::new();
        weights.insert("other".to_string(), 1.0);
        let stranger = BlendModel::from_weights(&weights);
        assert!(matches!(
            evaluate_models(&matrix, &stranger).unwrap_err(),
            BlendError::ModelMismatch { .. }
        ));
        let empty = align_records(&[]).unwrap();
        assert!(matches!(
            evaluate_models(&empty, &stranger).unwrap_err(),
            BlendError::EmptyMatrix
        ));
    }

    #[test]
    fn r_squared_handles_constant_observations() {
        let perfect = array![2.0, 2.0];
        let constant = array![2.0, 2.0];
        assert_abs_diff_eq!(r_squared(perfect.view(), constant.view()), 1.0);
        let off = array![2.0, 3.0];
        assert_abs_diff_eq!(r_squared(off.view(), constant.view()), 0.0);
    }
}
