//! Bagged decision-tree ensemble, the first selection candidate.

use crate::selection::decision_tree::{DecisionTreeParams, DecisionTreeRegressor};
use crate::selection::error::SelectionError;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Fixed hyperparameters for the bagged ensemble. No search happens over
/// these; they are the documented candidate configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: None,
            seed: 42,
        }
    }
}

/// A bagged ensemble of unpruned regression trees, each grown on a
/// bootstrap sample and averaged at prediction time.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestRegressor {
    params: RandomForestParams,
    trees: Vec<DecisionTreeRegressor>,
}

impl RandomForestRegressor {
    pub fn new(params: RandomForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &RandomForestParams {
        &self.params
    }

    /// Fits the forest. Trees train in parallel; each tree's bootstrap
    /// sample comes from its own RNG stream seeded by (seed, tree index),
    /// so the fit is identical no matter how rayon schedules the work.
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
        let tree_params = DecisionTreeParams {
            max_depth: self.params.max_depth,
            ..DecisionTreeParams::default()
        };
        let seed = self.params.seed;
        self.trees = (0..self.params.n_trees)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(tree_index as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTreeRegressor::fit(tree_params, x, y, &sample)
            })
            .collect();
        Ok(())
    }

    /// Mean prediction across all trees.
    pub fn predict(&self, x: &ArrayView2<'_, f64>) -> Array1<f64> {
        if self.trees.is_empty() {
            return Array1::zeros(x.nrows());
        }
        let mut total = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            total += &tree.predict(x);
        }
        total / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, Array2};

    fn step_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(40, |i| if i < 20 { 1.0 } else { 4.0 });
        (x, y)
    }

    #[test]
    fn learns_a_step_function() {
        let (x, y) = step_data();
        let mut forest = RandomForestRegressor::new(RandomForestParams {
            n_trees: 25,
            ..RandomForestParams::default()
        });
        forest.fit(&x.view(), &y.view()).unwrap();
        let preds = forest.predict(&x.view());
        assert!(preds[2] < 2.0);
        assert!(preds[35] > 3.0);
    }

    #[test]
    fn refitting_with_the_same_seed_is_deterministic() {
        let (x, y) = step_data();
        let params = RandomForestParams {
            n_trees: 15,
            ..RandomForestParams::default()
        };
        let mut a = RandomForestRegressor::new(params);
        let mut b = RandomForestRegressor::new(params);
        a.fit(&x.view(), &y.view()).unwrap();
        b.fit(&x.view(), &y.view()).unwrap();
        assert_eq!(a, b);
        let pa = a.predict(&x.view());
        let pb = b.predict(&x.view());
        for (va, vb) in pa.iter().zip(pb.iter()) {
            assert_abs_diff_eq!(*va, *vb);
        }
    }

    #[test]
    fn rejects_empty_or_mismatched_input() {
        let mut forest = RandomForestRegressor::new(RandomForestParams::default());
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        assert!(matches!(
            forest.fit(&x.view(), &y.view()).unwrap_err(),
            SelectionError::EmptyTrainingSet
        ));
        let x = Array2::<f64>::zeros((3, 2));
        let y = Array1::<f64>::zeros(2);
        assert!(matches!(
            forest.fit(&x.view(), &y.view()).unwrap_err(),
            SelectionError::ShapeMismatch { rows: 3, targets: 2 }
        ));
    }
}
