use serde::Deserialize;
use serde_json::Value;

/// A forecast model from the provider catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastModel {
    pub id: i64,
    pub alias: String,
    pub name: String,
}

/// A region row as the provider reports it; inactive regions and regions
/// without a measuring station are filtered out before exposure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct RawRegion {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub inactive: bool,
    #[serde(default)]
    pub station_id: Option<i64>,
}

/// An active forecast region with its measuring station.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRegion {
    pub id: i64,
    pub name: String,
    pub station_id: i64,
}

/// One hourly forecast value from a model download.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastSample {
    /// Target timestamp, epoch ms.
    pub datetime: i64,
    /// Forecast precipitation for the target hour.
    pub precipitation: f64,
}

/// One observed station value.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMeasure {
    /// Measurement timestamp, epoch ms.
    pub datetime: i64,
    /// Observed precipitation, from the aggregation's absolute sum.
    pub precipitation_obs: f64,
}

/// Pulls a usable precipitation number out of a station measure cell.
///
/// The provider serializes the field either as a plain number or as an
/// aggregation-keyed record like `{"abs": "12.4"}`, where the absolute
/// sum may itself be a number or a numeric string.
pub(crate) fn extract_absolute_sum(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Object(map) => match map.get("abs")? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.parse().ok(),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_rows_deserialize() {
        let model: ForecastModel =
            serde_json::from_value(json!({"id": 3, "alias": "gfs3h", "name": "GFS 3h"})).unwrap();
        assert_eq!(model.alias, "gfs3h");

        let region: RawRegion = serde_json::from_value(
            json!({"id": 7, "name": "BR-116 - 01 Curitiba - PR", "inactive": false, "station_id": 547}),
        )
        .unwrap();
        assert_eq!(region.station_id, Some(547));

        let stationless: RawRegion =
            serde_json::from_value(json!({"id": 8, "name": "x", "inactive": true, "station_id": null}))
                .unwrap();
        assert!(stationless.inactive);
        assert_eq!(stationless.station_id, None);
    }

    #[test]
    fn absolute_sum_extraction_covers_both_shapes() {
        assert_eq!(extract_absolute_sum(&json!(1.25)), Some(1.25));
        assert_eq!(extract_absolute_sum(&json!({"abs": 2.5})), Some(2.5));
        assert_eq!(extract_absolute_sum(&json!({"abs": "12.4"})), Some(12.4));
        assert_eq!(extract_absolute_sum(&json!({"rel": 1.0})), None);
        assert_eq!(extract_absolute_sum(&json!({"abs": "not a number"})), None);
        assert_eq!(extract_absolute_sum(&json!(null)), None);
        assert_eq!(extract_absolute_sum(&json!("3.0")), None);
    }
}
