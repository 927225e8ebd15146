//! Boosted decision-tree ensemble, the second selection candidate.

use crate::selection::decision_tree::{DecisionTreeParams, DecisionTreeRegressor};
use crate::selection::error::SelectionError;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Fixed hyperparameters for the boosted ensemble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientBoostingParams {
    pub n_stages: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Stages grow on the full training sample, so fits are deterministic
    /// and the seed only pins the candidate's documented configuration.
    pub seed: u64,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_stages: 200,
            learning_rate: 0.1,
            max_depth: 3,
            seed: 42,
        }
    }
}

/// Least-squares gradient boosting: a mean baseline plus shallow trees
/// fitted stage by stage to the running residuals.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostingRegressor {
    params: GradientBoostingParams,
    baseline: f64,
    trees: Vec<DecisionTreeRegressor>,
}

impl GradientBoostingRegressor {
    pub fn new(params: GradientBoostingParams) -> Self {
        Self {
            params,
            baseline: 0.0,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &GradientBoostingParams {
        &self.params
    }

    pub fn fit(
        &mut self,
        x: &ArrayView2<'_, f64>,
        y: &ArrayView1<'_, f64>,
    ) -> Result<(), SelectionError> {
        let n = x.nrows();
        if n == 0 {
            return Err(SelectionError::EmptyTrainingSet);
        }
        if n != y.len() {
            return Err(SelectionError::ShapeMismatch {
                rows: n,
                targets: y.len(),
            });
        }

        self.baseline = y.sum() / n as f64;
        self.trees = Vec::with_capacity(self.params.n_stages);
        let tree_params = DecisionTreeParams {
            max_depth: Some(self.params.max_depth),
            ..DecisionTreeParams::default()
        };
        let indices: Vec<usize> = (0..n).collect();
        let mut predictions = Array1::from_elem(n, self.baseline);
        for _ in 0..self.params.n_stages {
            let residuals = y - &predictions;
            let tree = DecisionTreeRegressor::fit(tree_params, x, &residuals.view(), &indices);
            predictions += &(tree.predict(x) * self.params.learning_rate);
            self.trees.push(tree);
        }
        Ok(())
    }

    pub fn predict(&self, x: &ArrayView2<'_, f64>) -> Array1<f64> {
        let mut predictions = Array1::from_elem(x.nrows(), self.baseline);
        for tree in &self.trees {
            predictions += &(tree.predict(x) * self.params.learning_rate);
        }
        predictions
    }
}
