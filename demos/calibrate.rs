//! Runs the full calibration flow over a record CSV: align, fit blend
//! weights, score every model and the ensemble, then cross-validate the
//! nonlinear candidates and report the winner.
//!
//! Usage: `calibrate [dataset.csv]`

use blendcast::{align_records, evaluate_models, fit_weights, read_records, select_best_pipeline};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dataset.csv".to_string());
    let records = read_records(Path::new(&path))?;

    let matrix = align_records(&records)?;
    let complete = matrix.drop_incomplete_rows();
    println!(
        "{} rows x {} models ({} rows complete)",
        matrix.n_rows(),
        matrix.n_models(),
        complete.n_rows()
    );

    let blend = fit_weights(&complete)?;
    println!("\nfitted blend weights:");
    for (model, weight) in blend.weights() {
        println!("  {model:<20} {weight:+.4}");
    }

    println!("\n{}", evaluate_models(&matrix, &blend)?);
    println!("{}", select_best_pipeline(&complete)?);
    Ok(())
}
