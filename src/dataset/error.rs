use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating or aligning forecast data.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read CSV file {path:?}")]
    ReadCsv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("failed to write CSV file {path:?}")]
    WriteCsv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("failed to create file {path:?}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("required column {column:?} is missing from the input")]
    MissingColumn { column: String },

    #[error("column {column:?} has type {found}, expected {expected}")]
    ColumnWrongType {
        column: String,
        expected: String,
        found: String,
    },

    #[error("column {column:?} contains a null value at row {row}")]
    NullValue { column: String, row: usize },

    #[error(
        "record for model {model:?} at run {run_datetime}, target {datetime} \
         has a non-finite {field} value"
    )]
    NonFiniteRecord {
        model: String,
        run_datetime: i64,
        datetime: i64,
        field: &'static str,
    },

    #[error(
        "model {model:?} reports conflicting forecasts {first} and {second} \
         for run {run_datetime}, target {datetime}; duplicate keys must agree"
    )]
    DuplicateForecast {
        model: String,
        run_datetime: i64,
        datetime: i64,
        first: f64,
        second: f64,
    },

    #[error(
        "run {run_datetime}, target {datetime} carries conflicting observed \
         values {first} and {second}"
    )]
    ObservedConflict {
        run_datetime: i64,
        datetime: i64,
        first: f64,
        second: f64,
    },

    #[error("internal polars failure")]
    Polars(#[from] PolarsError),
}
