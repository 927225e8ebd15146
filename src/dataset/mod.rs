//! Forecast records, the aligned matrix, the schema normalizer and CSV
//! exchange.

mod align;
mod error;
mod io;
mod matrix;
mod record;

pub use align::align_records;
pub use error::DatasetError;
pub use io::{read_matrix, read_records, write_matrix, write_records, MATRIX_KEY_COLUMNS, RECORD_COLUMNS};
pub use matrix::AlignedMatrix;
pub use record::ForecastRecord;
