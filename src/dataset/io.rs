//! Flat CSV exchange for long-format records and wide aligned matrices.
//!
//! CSV with a header row is the only persisted artifact. The long format
//! carries one row per (model, run, target) record; the wide format
//! mirrors an [`AlignedMatrix`] with missing forecasts as empty cells.

use crate::dataset::error::DatasetError;
use crate::dataset::matrix::AlignedMatrix;
use crate::dataset::record::ForecastRecord;
use log::info;
use ndarray::Array2;
use polars::df;
use polars::prelude::*;
use std::path::Path;

/// Column order of the long-format record file.
pub const RECORD_COLUMNS: [&str; 5] = [
    "model",
    "run_datetime",
    "datetime",
    "precipitation",
    "precipitation_obs",
];

/// Key columns of the wide-format matrix file; the remaining columns are
/// one per model.
pub const MATRIX_KEY_COLUMNS: [&str; 3] = ["run_datetime", "datetime", "precipitation_obs"];

fn read_csv(path: &Path) -> Result<DataFrame, DatasetError> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|source| DatasetError::ReadCsv {
            path: path.to_path_buf(),
            source,
        })?
        .finish()
        .map_err(|source| DatasetError::ReadCsv {
            path: path.to_path_buf(),
            source,
        })
}

fn write_csv(path: &Path, df: &mut DataFrame) -> Result<(), DatasetError> {
    let file = std::fs::File::create(path).map_err(|source| DatasetError::CreateFile {
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .map_err(|source| DatasetError::WriteCsv {
            path: path.to_path_buf(),
            source,
        })
}

fn typed_column(df: &DataFrame, column: &str, dtype: &DataType) -> Result<Series, DatasetError> {
    let series = df
        .column(column)
        .map_err(|_| DatasetError::MissingColumn {
            column: column.to_string(),
        })?
        .as_materialized_series();
    series
        .strict_cast(dtype)
        .map_err(|_| DatasetError::ColumnWrongType {
            column: column.to_string(),
            expected: dtype.to_string(),
            found: series.dtype().to_string(),
        })
}

fn i64_column(df: &DataFrame, column: &str) -> Result<Vec<i64>, DatasetError> {
    let series = typed_column(df, column, &DataType::Int64)?;
    let values = series.i64().map_err(DatasetError::Polars)?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| DatasetError::NullValue {
                column: column.to_string(),
                row,
            })
        })
        .collect()
}

fn f64_column(df: &DataFrame, column: &str) -> Result<Vec<f64>, DatasetError> {
    let series = typed_column(df, column, &DataType::Float64)?;
    let values = series.f64().map_err(DatasetError::Polars)?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| DatasetError::NullValue {
                column: column.to_string(),
                row,
            })
        })
        .collect()
}

fn optional_f64_column(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, DatasetError> {
    let series = typed_column(df, column, &DataType::Float64)?;
    let values = series.f64().map_err(DatasetError::Polars)?;
    Ok(values.into_iter().collect())
}

fn string_column(df: &DataFrame, column: &str) -> Result<Vec<String>, DatasetError> {
    let series = typed_column(df, column, &DataType::String)?;
    let values = series.str().map_err(DatasetError::Polars)?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(String::from).ok_or_else(|| DatasetError::NullValue {
                column: column.to_string(),
                row,
            })
        })
        .collect()
}

/// Loads a long-format record file, validating column presence and types.
///
/// # Errors
///
/// [`DatasetError::MissingColumn`] when a required column is absent,
/// [`DatasetError::ColumnWrongType`] when a column fails to cast and
/// [`DatasetError::NullValue`] when a required cell is empty.
pub fn read_records(path: &Path) -> Result<Vec<ForecastRecord>, DatasetError> {
    let df = read_csv(path)?;
    let models = string_column(&df, "model")?;
    let run_datetimes = i64_column(&df, "run_datetime")?;
    let datetimes = i64_column(&df, "datetime")?;
    let precipitation = f64_column(&df, "precipitation")?;
    let precipitation_obs = f64_column(&df, "precipitation_obs")?;

    let records = models
        .into_iter()
        .zip(run_datetimes)
        .zip(datetimes)
        .zip(precipitation)
        .zip(precipitation_obs)
        .map(|((((model, run), target), fc), obs)| ForecastRecord {
            model,
            run_datetime: run,
            datetime: target,
            precipitation: fc,
            precipitation_obs: obs,
        })
        .collect::<Vec<_>>();
    info!("read {} forecast records from {:?}", records.len(), path);
    Ok(records)
}

/// Writes records to a long-format CSV file.
pub fn write_records(path: &Path, records: &[ForecastRecord]) -> Result<(), DatasetError> {
    let mut df = df!(
        "model" => records.iter().map(|r| r.model.clone()).collect::<Vec<_>>(),
        "run_datetime" => records.iter().map(|r| r.run_datetime).collect::<Vec<_>>(),
        "datetime" => records.iter().map(|r| r.datetime).collect::<Vec<_>>(),
        "precipitation" => records.iter().map(|r| r.precipitation).collect::<Vec<_>>(),
        "precipitation_obs" => records.iter().map(|r| r.precipitation_obs).collect::<Vec<_>>(),
    )?;
    write_csv(path, &mut df)?;
    info!("wrote {} forecast records to {:?}", records.len(), path);
    Ok(())
}

/// Loads a wide-format matrix file.
///
/// Key columns come first; every other column is read as a model column
/// (empty cells become missing forecasts). Rows keep their file order.
pub fn read_matrix(path: &Path) -> Result<AlignedMatrix, DatasetError> {
    let df = read_csv(path)?;
    let run_datetimes = i64_column(&df, "run_datetime")?;
    let datetimes = i64_column(&df, "datetime")?;
    let observed = f64_column(&df, "precipitation_obs")?;

    let mut models: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .filter(|name| !MATRIX_KEY_COLUMNS.contains(&name.as_str()))
        .collect();
    models.sort();

    let n_rows = run_datetimes.len();
    let mut forecasts = Array2::from_elem((n_rows, models.len()), None);
    for (j, model) in models.iter().enumerate() {
        let column = optional_f64_column(&df, model)?;
        for (i, value) in column.into_iter().enumerate() {
            forecasts[[i, j]] = value;
        }
    }
    info!(
        "read {} x {} aligned matrix from {:?}",
        n_rows,
        models.len(),
        path
    );
    Ok(AlignedMatrix::from_parts(
        models,
        run_datetimes,
        datetimes,
        observed,
        forecasts,
    ))
}

/// Writes an aligned matrix to a wide-format CSV file, missing forecasts
/// as empty cells.
pub fn write_matrix(path: &Path, matrix: &AlignedMatrix) -> Result<(), DatasetError> {
    let mut columns: Vec<Column> = vec![
        Column::new("run_datetime".into(), matrix.run_datetimes().to_vec()),
        Column::new("datetime".into(), matrix.datetimes().to_vec()),
        Column::new("precipitation_obs".into(), matrix.observed().to_vec()),
    ];
    for (j, model) in matrix.models().iter().enumerate() {
        let values: Vec<Option<f64>> = (0..matrix.n_rows()).map(|i| matrix.value(i, j)).collect();
        columns.push(Column::new(model.as_str().into(), values));
    }
    let mut df = DataFrame::new(columns)?;
    write_csv(path, &mut df)?;
    info!(
        "wrote {} x {} aligned matrix to {:?}",
        matrix.n_rows(),
        matrix.n_models(),
        path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::align::align_records;
    use tempfile::tempdir;

    fn sample_records() -> Vec<ForecastRecord> {
        vec![
            ForecastRecord::new("icon", 0, 3_600_000, 0.1, 0.25),
            ForecastRecord::new("gfs3h", 0, 3_600_000, 0.3, 0.25),
            ForecastRecord::new("icon", 3_600_000, 7_200_000, 1.7, 2.05),
        ]
    }

    #[test]
    fn records_round_trip_through_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.csv");
        let records = sample_records();
        write_records(&path, &records).unwrap();
        assert_eq!(read_records(&path).unwrap(), records);
    }

    #[test]
    fn matrix_round_trip_is_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        let matrix = align_records(&sample_records()).unwrap();
        write_matrix(&path, &matrix).unwrap();
        assert_eq!(read_matrix(&path).unwrap(), matrix);
    }

    #[test]
    fn realignment_after_reload_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.csv");
        let first = align_records(&sample_records()).unwrap();
        write_records(&path, &sample_records()).unwrap();
        let second = align_records(&read_records(&path).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "model,run_datetime,datetime,precipitation\na,0,1,0.5\n").unwrap();
        let err = read_records(&path).unwrap_err();
        assert!(
            matches!(err, DatasetError::MissingColumn { ref column } if column == "precipitation_obs")
        );
    }

    #[test]
    fn unparseable_column_is_a_type_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "model,run_datetime,datetime,precipitation,precipitation_obs\na,noon,1,0.5,0.6\n",
        )
        .unwrap();
        let err = read_records(&path).unwrap_err();
        assert!(
            matches!(err, DatasetError::ColumnWrongType { ref column, .. } if column == "run_datetime")
        );
    }

    #[test]
    fn empty_required_cell_is_a_null_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "model,run_datetime,datetime,precipitation,precipitation_obs\na,0,1,,0.6\n",
        )
        .unwrap();
        let err = read_records(&path).unwrap_err();
        assert!(
            matches!(err, DatasetError::NullValue { ref column, row: 0 } if column == "precipitation")
        );
    }
}
