use thiserror::Error;

/// Errors from candidate training, cross-validation and selection.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("the aligned matrix has no rows; nothing to select over")]
    EmptyMatrix,

    #[error("the aligned matrix has no model columns to use as features")]
    NoModelColumns,

    #[error(
        "model {model:?} has no forecast at run {run_datetime}, target {datetime}; \
         drop incomplete rows (AlignedMatrix::drop_incomplete_rows) before selection"
    )]
    MissingValue {
        model: String,
        run_datetime: i64,
        datetime: i64,
    },

    #[error("non-finite value in the selection inputs at row {row}")]
    NonFinite { row: usize },

    #[error(
        "matrix rows are not in chronological (run, target) order at row {row}; \
         the trailing-time holdout is meaningless on unordered input"
    )]
    UnorderedRows { row: usize },

    #[error(
        "matrix has {rows} rows, too few for selection: the {train}-row training \
         split must cover at least {folds} cross-validation folds and the \
         {test}-row test split at least one row"
    )]
    TooFewRows {
        rows: usize,
        train: usize,
        test: usize,
        folds: usize,
    },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("feature matrix has {rows} rows but the target has {targets}")]
    ShapeMismatch { rows: usize, targets: usize },

    #[error("pipeline was asked to predict before being fitted")]
    NotFitted,
}
