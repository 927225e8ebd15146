//! Blend multi-model precipitation forecasts against station
//! observations.
//!
//! The crate takes long-format forecast records (one row per model, run
//! time and target time, joined with the observed station value), aligns
//! them into a wide per-model matrix, fits intercept-free least-squares
//! blend weights, scores every model and the blend, and cross-validates a
//! fixed set of tree-ensemble pipelines to pick the strongest nonlinear
//! candidate on a trailing-time holdout.
//!
//! ```no_run
//! use blendcast::{align_records, evaluate_models, fit_weights, read_records, select_best_pipeline};
//! use std::path::Path;
//!
//! # fn run() -> Result<(), blendcast::BlendcastError> {
//! let records = read_records(Path::new("dataset.csv"))?;
//! let matrix = align_records(&records)?.drop_incomplete_rows();
//! let blend = fit_weights(&matrix)?;
//! println!("{}", evaluate_models(&matrix, &blend)?);
//! println!("{}", select_best_pipeline(&matrix)?);
//! # Ok(())
//! # }
//! ```
//!
//! Dataset assembly against a live forecast provider goes through
//! [`ForecastApi`]; see the `build_dataset` example.

mod blend;
mod dataset;
mod epoch;
mod error;
mod provider;
mod selection;

pub use error::BlendcastError;

pub use epoch::{
    add_duration, epoch_ms, epoch_origin, from_epoch_ms, shift_ms, DurationUnit, TimeError,
    FIVE_DAYS_IN_MS, HOUR_IN_MS, ONE_DAY_IN_MS,
};

pub use dataset::{
    align_records, read_matrix, read_records, write_matrix, write_records, AlignedMatrix,
    DatasetError, ForecastRecord, MATRIX_KEY_COLUMNS, RECORD_COLUMNS,
};

pub use blend::{
    evaluate_models, fit_weights, mae, r_squared, rmse, BlendError, BlendModel, MetricRow,
    MetricsTable, WeightVector, ENSEMBLE_ENTITY,
};

pub use selection::{
    cross_validate_rmse, fold_bounds, select_best_pipeline, CandidateRegressor, CandidateResult,
    DecisionTreeParams, DecisionTreeRegressor, GradientBoostingParams, GradientBoostingRegressor,
    RandomForestParams, RandomForestRegressor, ScaledPipeline, SelectionError, SelectionReport,
    StandardScaler, XgBoostParams, XgBoostRegressor, CV_FOLDS, TEST_FRACTION,
};

pub use provider::{
    ForecastApi, ForecastModel, ForecastRegion, ForecastSample, ProviderConfig, ProviderError,
    StationMeasure, API_KEY_VAR, API_URL_VAR, AUTHORIZATION_VAR,
};
