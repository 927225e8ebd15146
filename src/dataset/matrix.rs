use ndarray::{Array1, Array2};

/// The wide, model-aligned view of a forecast dataset.
///
/// One row per distinct (run timestamp, target timestamp, observed value)
/// triple, one column per forecast model. A cell is `None` when that model
/// issued no prediction for the row's (run, target) pair — missing never
/// means zero here; zero-filling is an explicit downstream choice made only
/// by the metrics evaluator.
///
/// Rows are sorted ascending by (run timestamp, target timestamp) and
/// columns by model name, so two matrices built from the same records are
/// identical. The matrix is read-only once constructed; every downstream
/// stage derives a new structure from it.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedMatrix {
    models: Vec<String>,
    run_datetimes: Vec<i64>,
    datetimes: Vec<i64>,
    observed: Vec<f64>,
    forecasts: Array2<Option<f64>>,
}

impl AlignedMatrix {
    pub(crate) fn from_parts(
        models: Vec<String>,
        run_datetimes: Vec<i64>,
        datetimes: Vec<i64>,
        observed: Vec<f64>,
        forecasts: Array2<Option<f64>>,
    ) -> Self {
        debug_assert_eq!(run_datetimes.len(), datetimes.len());
        debug_assert_eq!(run_datetimes.len(), observed.len());
        debug_assert_eq!(forecasts.nrows(), run_datetimes.len());
        debug_assert_eq!(forecasts.ncols(), models.len());
        Self {
            models,
            run_datetimes,
            datetimes,
            observed,
            forecasts,
        }
    }

    /// Number of (run, target) rows.
    pub fn n_rows(&self) -> usize {
        self.run_datetimes.len()
    }

    /// Number of model columns.
    pub fn n_models(&self) -> usize {
        self.models.len()
    }

    /// Model names in column order (sorted).
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Run timestamps (epoch ms) in row order.
    pub fn run_datetimes(&self) -> &[i64] {
        &self.run_datetimes
    }

    /// Target timestamps (epoch ms) in row order.
    pub fn datetimes(&self) -> &[i64] {
        &self.datetimes
    }

    /// Observed station values in row order.
    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    /// Observed values as an owned target vector.
    pub fn observed_array(&self) -> Array1<f64> {
        Array1::from_vec(self.observed.clone())
    }

    /// The forecast cell for `row` and model column `col`.
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.forecasts[[row, col]]
    }

    /// Column index of `model`, if present.
    pub fn model_index(&self, model: &str) -> Option<usize> {
        self.models.iter().position(|m| m == model)
    }

    /// True when every cell holds a forecast value.
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    /// (row, column) of the first missing cell in row-major order.
    pub(crate) fn first_missing(&self) -> Option<(usize, usize)> {
        for row in 0..self.n_rows() {
            for col in 0..self.n_models() {
                if self.forecasts[[row, col]].is_none() {
                    return Some((row, col));
                }
            }
        }
        None
    }

    /// True when rows are sorted ascending by (run timestamp, target
    /// timestamp). The candidate selector's trailing-time holdout only
    /// means anything when this holds.
    pub fn is_chronological(&self) -> bool {
        self.run_datetimes
            .iter()
            .zip(&self.datetimes)
            .zip(self.run_datetimes.iter().zip(&self.datetimes).skip(1))
            .all(|(prev, next)| prev <= next)
    }

    /// A new matrix keeping only the rows where every model has a value.
    pub fn drop_incomplete_rows(&self) -> AlignedMatrix {
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&row| (0..self.n_models()).all(|col| self.forecasts[[row, col]].is_some()))
            .collect();
        let forecasts = Array2::from_shape_fn((keep.len(), self.n_models()), |(i, j)| {
            self.forecasts[[keep[i], j]]
        });
        AlignedMatrix {
            models: self.models.clone(),
            run_datetimes: keep.iter().map(|&i| self.run_datetimes[i]).collect(),
            datetimes: keep.iter().map(|&i| self.datetimes[i]).collect(),
            observed: keep.iter().map(|&i| self.observed[i]).collect(),
            forecasts,
        }
    }

    /// The feature matrix with every missing cell replaced by zero.
    ///
    /// This is the metrics evaluator's documented approximation; nothing
    /// else in the crate treats missing as zero.
    pub fn zero_filled_features(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.n_rows(), self.n_models()), |(i, j)| {
            self.forecasts[[i, j]].unwrap_or(0.0)
        })
    }

    /// The feature matrix, or `None` if any cell is missing.
    pub fn complete_features(&self) -> Option<Array2<f64>> {
        if self.is_complete() {
            Some(self.zero_filled_features())
        } else {
            None
        }
    }
}
