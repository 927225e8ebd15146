use crate::selection::error::SelectionError;
use crate::selection::gradient_boosting::GradientBoostingRegressor;
use crate::selection::random_forest::RandomForestRegressor;
use crate::selection::scaler::StandardScaler;
use crate::selection::xgboost::XgBoostRegressor;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// One of the fixed regressor families the selector compares.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateRegressor {
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
    XgBoost(XgBoostRegressor),
}

impl CandidateRegressor {
    fn fit(
        &mut self,
        x: &ArrayView2<'_, f64>,
        y: &ArrayView1<'_, f64>,
    ) -> Result<(), SelectionError> {
        match self {
            CandidateRegressor::RandomForest(model) => model.fit(x, y),
            CandidateRegressor::GradientBoosting(model) => model.fit(x, y),
            CandidateRegressor::XgBoost(model) => model.fit(x, y),
        }
    }

    fn predict(&self, x: &ArrayView2<'_, f64>) -> Array1<f64> {
        match self {
            CandidateRegressor::RandomForest(model) => model.predict(x),
            CandidateRegressor::GradientBoosting(model) => model.predict(x),
            CandidateRegressor::XgBoost(model) => model.predict(x),
        }
    }
}

/// A feature-scaling step in front of a candidate regressor.
///
/// Every candidate runs behind the same scaler for pipeline uniformity,
/// even though tree regressors are indifferent to feature scale. The
/// scaler's statistics come from the rows the pipeline was fitted on and
/// are reused verbatim at prediction time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledPipeline {
    scaler: Option<StandardScaler>,
    regressor: CandidateRegressor,
}

impl ScaledPipeline {
    /// A new, unfitted pipeline around `regressor`.
    pub fn new(regressor: CandidateRegressor) -> Self {
        Self {
            scaler: None,
            regressor,
        }
    }

    /// The wrapped regressor, fitted or not.
    pub fn regressor(&self) -> &CandidateRegressor {
        &self.regressor
    }

    /// Fits the scaler on `x`, then the regressor on the scaled features.
    pub fn fit(
        &mut self,
        x: &ArrayView2<'_, f64>,
        y: &ArrayView1<'_, f64>,
    ) -> Result<(), SelectionError> {
        if x.nrows() == 0 {
            return Err(SelectionError::EmptyTrainingSet);
        }
        let scaler = StandardScaler::fit(x);
        let scaled = scaler.transform(x);
        self.regressor.fit(&scaled.view(), y)?;
        self.scaler = Some(scaler);
        Ok(())
    }

    /// Predicts through the fitted scaler and regressor.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NotFitted`] if [`ScaledPipeline::fit`] has not
    /// succeeded yet.
    pub fn predict(&self, x: &ArrayView2<'_, f64>) -> Result<Array1<f64>, SelectionError> {
        let scaler = self.scaler.as_ref().ok_or(SelectionError::NotFitted)?;
        let scaled = scaler.transform(x);
        Ok(self.regressor.predict(&scaled.view()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::random_forest::RandomForestParams;
    use ndarray::{Array1, Array2};

    fn forest_pipeline() -> ScaledPipeline {
        ScaledPipeline::new(CandidateRegressor::RandomForest(
            RandomForestRegressor::new(RandomForestParams {
                n_trees: 10,
                ..RandomForestParams::default()
            }),
        ))
    }

    #[test]
    fn predicting_before_fitting_is_an_error() {
        let pipeline = forest_pipeline();
        let x = Array2::<f64>::zeros((2, 1));
        assert!(matches!(
            pipeline.predict(&x.view()).unwrap_err(),
            SelectionError::NotFitted
        ));
    }

    #[test]
    fn scaling_does_not_change_tree_predictions_materially() {
        // The same data on two very different feature scales must produce
        // the same fit, since the scaler normalizes both to one shape.
        let x_small = Array2::from_shape_fn((20, 1), |(i, _)| i as f64);
        let x_large = &x_small * 1024.0;
        let y = Array1::from_shape_fn(20, |i| if i < 10 { 0.0 } else { 1.0 });

        let mut a = forest_pipeline();
        let mut b = forest_pipeline();
        a.fit(&x_small.view(), &y.view()).unwrap();
        b.fit(&x_large.view(), &y.view()).unwrap();
        assert_eq!(
            a.predict(&x_small.view()).unwrap(),
            b.predict(&x_large.view()).unwrap()
        );
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let mut pipeline = forest_pipeline();
        let x = Array2::<f64>::zeros((0, 1));
        let y = Array1::<f64>::zeros(0);
        assert!(matches!(
            pipeline.fit(&x.view(), &y.view()).unwrap_err(),
            SelectionError::EmptyTrainingSet
        ));
    }
}
