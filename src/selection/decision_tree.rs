//! CART regression tree, the base learner shared by the bagged and
//! boosted candidates.

use ndarray::{Array1, ArrayView1, ArrayView2};
use std::cmp::Ordering;

/// Growth limits for a single regression tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionTreeParams {
    /// Maximum depth; `None` grows until leaves are pure or too small.
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before a split is considered.
    pub min_samples_split: usize,
    /// Minimum samples each child must keep after a split.
    pub min_samples_leaf: usize,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted variance-reduction regression tree over row indices of a
/// shared feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTreeRegressor {
    nodes: Vec<Node>,
}

struct Builder<'a> {
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    params: DecisionTreeParams,
    nodes: Vec<Node>,
}

impl DecisionTreeRegressor {
    /// Grows a tree on the rows named by `indices`. Repeated indices are
    /// legal and weight their rows accordingly (bootstrap sampling).
    pub fn fit(
        params: DecisionTreeParams,
        x: &ArrayView2<'_, f64>,
        y: &ArrayView1<'_, f64>,
        indices: &[usize],
    ) -> Self {
        debug_assert!(!indices.is_empty());
        let mut builder = Builder {
            x: x.reborrow(),
            y: y.reborrow(),
            params,
            nodes: Vec::new(),
        };
        let mut indices = indices.to_vec();
        builder.grow(&mut indices, 0);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Prediction for a single feature row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = 0;
        loop {
            match self.nodes[node] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    /// Predictions for every row of a feature matrix.
    pub fn predict(&self, x: &ArrayView2<'_, f64>) -> Array1<f64> {
        Array1::from_iter(x.rows().into_iter().map(|row| self.predict_row(row)))
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl Builder<'_> {
    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let mean = indices.iter().map(|&i| self.y[i]).sum::<f64>() / indices.len() as f64;
        let at_depth_limit = self.params.max_depth.is_some_and(|max| depth >= max);
        if at_depth_limit || indices.len() < self.params.min_samples_split {
            return self.leaf(mean);
        }
        let Some(split) = self.best_split(indices) else {
            return self.leaf(mean);
        };

        let mid = partition(indices, |i| self.x[[i, split.feature]] <= split.threshold);
        debug_assert!(mid > 0 && mid < indices.len());
        let node = self.nodes.len();
        self.nodes.push(Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = self.grow(left_indices, depth + 1);
        let right = self.grow(right_indices, depth + 1);
        self.nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node
    }

    fn leaf(&mut self, value: f64) -> usize {
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    /// Exhaustive variance-reduction split search via sorted prefix sums.
    fn best_split(&self, indices: &[usize]) -> Option<BestSplit> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        if n < 2 * min_leaf {
            return None;
        }

        let total_sum: f64 = indices.iter().map(|&i| self.y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| self.y[i] * self.y[i]).sum();
        let node_sse = total_sq - total_sum * total_sum / n as f64;
        if node_sse <= 1e-12 {
            return None;
        }

        let mut best: Option<BestSplit> = None;
        let mut sorted = indices.to_vec();
        for feature in 0..self.x.ncols() {
            sorted.sort_by(|&a, &b| {
                self.x[[a, feature]]
                    .partial_cmp(&self.x[[b, feature]])
                    .unwrap_or(Ordering::Equal)
            });
            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 1..n {
                let yi = self.y[sorted[pos - 1]];
                left_sum += yi;
                left_sq += yi * yi;
                if pos < min_leaf || n - pos < min_leaf {
                    continue;
                }
                let prev = self.x[[sorted[pos - 1], feature]];
                let next = self.x[[sorted[pos], feature]];
                if prev == next {
                    continue;
                }
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / pos as f64)
                    + (right_sq - right_sum * right_sum / (n - pos) as f64);
                if best.as_ref().is_none_or(|b| sse < b.sse - 1e-12) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (prev + next) / 2.0,
                        sse,
                    });
                }
            }
        }
        best
    }
}

/// Stable in-place partition; returns the size of the matching prefix.
fn partition(indices: &mut [usize], predicate: impl Fn(usize) -> bool) -> usize {
    let mut reordered: Vec<usize> = Vec::with_capacity(indices.len());
    reordered.extend(indices.iter().copied().filter(|&i| predicate(i)));
    let mid = reordered.len();
    reordered.extend(indices.iter().copied().filter(|&i| !predicate(i)));
    indices.copy_from_slice(&reordered);
    mid
}
