use thiserror::Error;

/// Errors from weight fitting and metric evaluation.
#[derive(Error, Debug)]
pub enum BlendError {
    #[error("the aligned matrix has no rows; nothing to fit or score")]
    EmptyMatrix,

    #[error("the aligned matrix has no model columns")]
    NoModelColumns,

    #[error(
        "model {model:?} has no forecast at run {run_datetime}, target {datetime}; \
         drop or impute incomplete rows before fitting (see AlignedMatrix::drop_incomplete_rows)"
    )]
    MissingValue {
        model: String,
        run_datetime: i64,
        datetime: i64,
    },

    #[error("non-finite value in the fitting inputs at row {row}")]
    NonFinite { row: usize },

    #[error("least-squares solve failed: {reason}")]
    SolveFailed { reason: String },

    #[error("fitted blend covers models {fitted:?} but the matrix has columns {matrix:?}")]
    ModelMismatch {
        fitted: Vec<String>,
        matrix: Vec<String>,
    },
}
