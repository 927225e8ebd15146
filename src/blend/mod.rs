//! Linear blending of model forecasts: the weight fitter and the metrics
//! evaluator.

mod error;
mod metrics;
mod weights;

pub use error::BlendError;
pub use metrics::{evaluate_models, mae, r_squared, rmse, MetricRow, MetricsTable, ENSEMBLE_ENTITY};
pub use weights::{fit_weights, BlendModel, WeightVector};
