//! Assembles a long-format forecast dataset from the live provider:
//! walks the model catalog, downloads every recent run's five-day hourly
//! window for one region, joins observed station measures by target time
//! and writes the record CSV that `calibrate` consumes.
//!
//! Needs `API_URL`, `AUTHORIZATION` and `API_KEY` in the environment or
//! a `.env` file.

use blendcast::{from_epoch_ms, write_records, ForecastApi, ForecastRecord};
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

/// Forecast models worth blending, by provider alias.
const MODEL_ALIASES: [&str; 7] = [
    "gfs3h",
    "wrf_tps_myj",
    "icon",
    "ecmwf",
    "wrf_kess_myj",
    "wrf",
    "wrf_wdm7_myj",
];

const REGION_NAME: &str = "BR-116 - 01 Curitiba - PR";

/// Runs issued before this epoch-ms cutoff are skipped.
const RUN_CUTOFF_MS: i64 = 1_744_934_400_000;

const OUTPUT_PATH: &str = "dataset.csv";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let api = ForecastApi::from_env()?;

    let models = api
        .models()
        .alias_filter(MODEL_ALIASES.iter().map(|s| s.to_string()).collect())
        .call()
        .await?;
    let region = api
        .regions()
        .await?
        .into_iter()
        .find(|region| region.name == REGION_NAME)
        .ok_or_else(|| format!("region {REGION_NAME:?} not found in the catalog"))?;

    // Forecast values per model, keyed for the later measure join.
    let mut forecasts: Vec<(String, i64, i64, f64)> = Vec::new();
    for model in &models {
        let runs = api.run_datetimes(model.id).await?;
        for run in runs.into_iter().filter(|&run| run >= RUN_CUTOFF_MS) {
            info!(
                "{} | {} | run {}",
                model.name,
                region.name,
                from_epoch_ms(run)?
            );
            let samples = match api
                .download_forecasts()
                .model_id(model.id)
                .region_id(region.id)
                .run_datetime(run)
                .call()
                .await
            {
                Ok(samples) => samples,
                Err(err) => {
                    warn!("skipping {} run {run}: {err}", model.name);
                    continue;
                }
            };
            for sample in samples {
                forecasts.push((model.name.clone(), run, sample.datetime, sample.precipitation));
            }
        }
    }
    if forecasts.is_empty() {
        return Err("no forecasts downloaded; nothing to assemble".into());
    }

    let start = forecasts.iter().map(|f| f.2).min().unwrap_or_default();
    let end = forecasts.iter().map(|f| f.2).max().unwrap_or_default();
    let measures: HashMap<i64, f64> = api
        .station_measures()
        .datetime_start(start)
        .datetime_end(end)
        .station_ids(vec![region.station_id])
        .call()
        .await
        .into_iter()
        .map(|measure| (measure.datetime, measure.precipitation_obs))
        .collect();
    info!("joined against {} station measures", measures.len());

    // Inner join on the target timestamp; hours without an observation
    // are dropped.
    let records: Vec<ForecastRecord> = forecasts
        .into_iter()
        .filter_map(|(model, run, target, precipitation)| {
            measures.get(&target).map(|&precipitation_obs| {
                ForecastRecord::new(model, run, target, precipitation, precipitation_obs)
            })
        })
        .collect();
    write_records(Path::new(OUTPUT_PATH), &records)?;
    println!("wrote {} records to {OUTPUT_PATH}", records.len());
    Ok(())
}
