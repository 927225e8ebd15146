//! The candidate selector and its fixed set of nonlinear regression
//! pipelines.

mod cross_validation;
mod decision_tree;
mod error;
mod gradient_boosting;
mod pipeline;
mod random_forest;
mod scaler;
mod selector;
mod xgboost;

pub use cross_validation::{cross_validate_rmse, fold_bounds};
pub use decision_tree::{DecisionTreeParams, DecisionTreeRegressor};
pub use error::SelectionError;
pub use gradient_boosting::{GradientBoostingParams, GradientBoostingRegressor};
pub use pipeline::{CandidateRegressor, ScaledPipeline};
pub use random_forest::{RandomForestParams, RandomForestRegressor};
pub use scaler::StandardScaler;
pub use selector::{select_best_pipeline, CandidateResult, SelectionReport, CV_FOLDS, TEST_FRACTION};
pub use xgboost::{XgBoostParams, XgBoostRegressor};
