//! The schema normalizer: long-format records in, aligned matrix out.

use crate::dataset::error::DatasetError;
use crate::dataset::matrix::AlignedMatrix;
use crate::dataset::record::ForecastRecord;
use log::debug;
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet};

struct RowBuild {
    observed: f64,
    forecasts: BTreeMap<String, f64>,
}

/// Pivots long-format forecast records into an [`AlignedMatrix`].
///
/// Rows are keyed by (run timestamp, target timestamp) and sorted
/// ascending; columns are the sorted set of model names. A (run, target,
/// model) combination with no record becomes a missing cell.
///
/// Duplicate (model, run, target) keys are collapsed when they carry the
/// same forecast value and rejected when they disagree; a (run, target)
/// pair reported with two different observed values is rejected as well.
/// Silent resolution of either collision would corrupt the weight fit.
///
/// # Errors
///
/// [`DatasetError::NonFiniteRecord`] for NaN or infinite values,
/// [`DatasetError::DuplicateForecast`] for conflicting duplicate keys and
/// [`DatasetError::ObservedConflict`] for diverging observations.
pub fn align_records(records: &[ForecastRecord]) -> Result<AlignedMatrix, DatasetError> {
    let mut models: BTreeSet<&str> = BTreeSet::new();
    let mut rows: BTreeMap<(i64, i64), RowBuild> = BTreeMap::new();

    for record in records {
        for (field, value) in [
            ("precipitation", record.precipitation),
            ("precipitation_obs", record.precipitation_obs),
        ] {
            if !value.is_finite() {
                return Err(DatasetError::NonFiniteRecord {
                    model: record.model.clone(),
                    run_datetime: record.run_datetime,
                    datetime: record.datetime,
                    field,
                });
            }
        }
        models.insert(&record.model);

        let row = rows
            .entry((record.run_datetime, record.datetime))
            .or_insert_with(|| RowBuild {
                observed: record.precipitation_obs,
                forecasts: BTreeMap::new(),
            });
        if row.observed != record.precipitation_obs {
            return Err(DatasetError::ObservedConflict {
                run_datetime: record.run_datetime,
                datetime: record.datetime,
                first: row.observed,
                second: record.precipitation_obs,
            });
        }
        if let Some(&existing) = row.forecasts.get(&record.model) {
            if existing != record.precipitation {
                return Err(DatasetError::DuplicateForecast {
                    model: record.model.clone(),
                    run_datetime: record.run_datetime,
                    datetime: record.datetime,
                    first: existing,
                    second: record.precipitation,
                });
            }
        } else {
            row.forecasts
                .insert(record.model.clone(), record.precipitation);
        }
    }

    let models: Vec<String> = models.into_iter().map(String::from).collect();
    let mut run_datetimes = Vec::with_capacity(rows.len());
    let mut datetimes = Vec::with_capacity(rows.len());
    let mut observed = Vec::with_capacity(rows.len());
    let mut forecasts = Array2::from_elem((rows.len(), models.len()), None);

    for (i, ((run, target), row)) in rows.into_iter().enumerate() {
        run_datetimes.push(run);
        datetimes.push(target);
        observed.push(row.observed);
        for (j, model) in models.iter().enumerate() {
            forecasts[[i, j]] = row.forecasts.get(model).copied();
        }
    }

    debug!(
        "aligned {} records into {} rows x {} models",
        records.len(),
        run_datetimes.len(),
        models.len()
    );
    Ok(AlignedMatrix::from_parts(
        models,
        run_datetimes,
        datetimes,
        observed,
        forecasts,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn rec(model: &str, run: i64, target: i64, fc: f64, obs: f64) -> ForecastRecord {
        ForecastRecord::new(model, run, target, fc, obs)
    }

    #[test]
    fn row_count_matches_distinct_triples_and_columns_distinct_models() {
        let records = vec![
            rec("icon", 0, 1, 0.1, 0.2),
            rec("gfs3h", 0, 1, 0.3, 0.2),
            rec("icon", 0, 2, 0.4, 0.5),
            rec("ecmwf", 3, 1, 0.6, 0.7),
        ];
        let matrix = align_records(&records).unwrap();

        let triples: BTreeSet<(i64, i64)> = records
            .iter()
            .map(|r| (r.run_datetime, r.datetime))
            .collect();
        let models: BTreeSet<&str> = records.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(matrix.n_rows(), triples.len());
        assert_eq!(matrix.n_models(), models.len());
        assert_eq!(matrix.models(), &["ecmwf", "gfs3h", "icon"]);
    }

    #[test]
    fn rows_sort_by_run_then_target_regardless_of_input_order() {
        let matrix = align_records(&[
            rec("a", 5, 9, 1.0, 0.0),
            rec("a", 0, 2, 2.0, 0.0),
            rec("a", 0, 1, 3.0, 0.0),
            rec("a", 5, 1, 4.0, 0.0),
        ])
        .unwrap();
        assert_eq!(matrix.run_datetimes(), &[0, 0, 5, 5]);
        assert_eq!(matrix.datetimes(), &[1, 2, 1, 9]);
        assert!(matrix.is_chronological());
    }

    #[test]
    fn uncovered_combinations_stay_missing_not_zero() {
        let matrix = align_records(&[
            rec("a", 0, 1, 1.0, 0.5),
            rec("b", 0, 2, 2.0, 0.6),
        ])
        .unwrap();
        assert_eq!(matrix.value(0, 0), Some(1.0));
        assert_eq!(matrix.value(0, 1), None);
        assert_eq!(matrix.value(1, 0), None);
        assert_eq!(matrix.value(1, 1), Some(2.0));
    }

    #[test]
    fn identical_duplicates_collapse_to_one() {
        let matrix = align_records(&[
            rec("a", 0, 1, 1.0, 0.5),
            rec("a", 0, 1, 1.0, 0.5),
        ])
        .unwrap();
        assert_eq!(matrix.n_rows(), 1);
        assert_eq!(matrix.value(0, 0), Some(1.0));
    }

    #[test]
    fn conflicting_duplicates_are_rejected() {
        let err = align_records(&[
            rec("a", 0, 1, 1.0, 0.5),
            rec("a", 0, 1, 2.0, 0.5),
        ])
        .unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateForecast { .. }));
    }

    #[test]
    fn diverging_observations_are_rejected() {
        let err = align_records(&[
            rec("a", 0, 1, 1.0, 0.5),
            rec("b", 0, 1, 2.0, 0.6),
        ])
        .unwrap_err();
        assert!(matches!(err, DatasetError::ObservedConflict { .. }));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let err = align_records(&[rec("a", 0, 1, f64::NAN, 0.5)]).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::NonFiniteRecord {
                field: "precipitation",
                ..
            }
        ));
        let err = align_records(&[rec("a", 0, 1, 1.0, f64::INFINITY)]).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::NonFiniteRecord {
                field: "precipitation_obs",
                ..
            }
        ));
    }

    #[test]
    fn empty_input_aligns_to_an_empty_matrix() {
        let matrix = align_records(&[]).unwrap();
        assert_eq!(matrix.n_rows(), 0);
        assert_eq!(matrix.n_models(), 0);
    }
}
