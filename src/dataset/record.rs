use serde::{Deserialize, Serialize};

/// One long-format forecast row: a single model's prediction for a single
/// (run, target) pair, together with the station observation for the
/// target time.
///
/// Field names mirror the CSV exchange columns. Timestamps are epoch
/// milliseconds. Uniqueness is keyed on (model, run_datetime, datetime);
/// several models normally cover the same (run_datetime, datetime) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Forecast model identifier (e.g. `"gfs3h"`).
    pub model: String,
    /// When the forecast run was issued, epoch ms.
    pub run_datetime: i64,
    /// The moment the forecast predicts a value for, epoch ms.
    pub datetime: i64,
    /// Forecast precipitation for the target time.
    pub precipitation: f64,
    /// Observed precipitation at the station for the target time.
    pub precipitation_obs: f64,
}

impl ForecastRecord {
    pub fn new(
        model: impl Into<String>,
        run_datetime: i64,
        datetime: i64,
        precipitation: f64,
        precipitation_obs: f64,
    ) -> Self {
        Self {
            model: model.into(),
            run_datetime,
            datetime,
            precipitation,
            precipitation_obs,
        }
    }
}
