use crate::blend::BlendError;
use crate::dataset::DatasetError;
use crate::epoch::TimeError;
use crate::provider::ProviderError;
use crate::selection::SelectionError;
use thiserror::Error;

/// Any error the crate can report, aggregated for callers that drive the
/// full calibration flow.
#[derive(Debug, Error)]
pub enum BlendcastError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Blend(#[from] BlendError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Time(#[from] TimeError),
}
