use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, WeatherError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(WeatherError::invalid(format!(
                "lat must be between -90 and 90, got {lat}"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(WeatherError::invalid(format!(
                "lon must be between -180 and 180, got {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Parse raw query-string values. Absent or blank values are reported as
    /// missing, unparsable ones as invalid.
    pub fn parse(lat: Option<&str>, lon: Option<&str>) -> Result<Self, WeatherError> {
        let lat = required(lat, "lat")?;
        let lon = required(lon, "lon")?;

        let lat: f64 = lat
            .parse()
            .map_err(|_| WeatherError::invalid(format!("lat must be a number, got '{lat}'")))?;
        let lon: f64 = lon
            .parse()
            .map_err(|_| WeatherError::invalid(format!("lon must be a number, got '{lon}'")))?;

        Self::new(lat, lon)
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, WeatherError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| WeatherError::missing(name))
}

/// What the user asked to see: a named city or a position.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coords(Coordinates),
}

impl LocationQuery {
    /// Build a city query, rejecting blank names.
    pub fn city(name: &str) -> Result<Self, WeatherError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WeatherError::missing("City"));
        }
        Ok(Self::City(name.to_string()))
    }

    /// Pick a query from request parameters: a non-blank city wins, then a
    /// coordinate pair.
    pub fn from_params(
        city: Option<&str>,
        lat: Option<&str>,
        lon: Option<&str>,
    ) -> Result<Self, WeatherError> {
        if let Some(city) = city.filter(|c| !c.trim().is_empty()) {
            return Self::city(city);
        }
        if lat.is_none() && lon.is_none() {
            return Err(WeatherError::missing("City or lat/lon"));
        }
        Coordinates::parse(lat, lon).map(Self::Coords)
    }
}

/// One timestamped reading from the provider. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Unix seconds, UTC.
    pub timestamp: i64,
    /// Seconds east of UTC for the sampled location.
    #[serde(default)]
    pub utc_offset: i32,
    pub temperature: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    /// Provider icon code, e.g. `10d`.
    pub condition_code: String,
    pub condition_text: String,
    /// Probability in `0.0..=1.0`, when the provider reports one.
    pub precipitation_probability: Option<f64>,
}

impl WeatherSample {
    /// Calendar date of the sample in the location's local time.
    pub fn local_date(&self) -> NaiveDate {
        local_datetime(self.timestamp, self.utc_offset).date_naive()
    }
}

/// Convert unix seconds into the location's local time. Offsets chrono
/// rejects fall back to UTC.
pub fn local_datetime(timestamp: i64, utc_offset: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(utc_offset).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .with_timezone(&offset)
}

/// A point of the hourly trend, either straight from the provider or
/// interpolated between two samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub timestamp: i64,
    #[serde(default)]
    pub utc_offset: i32,
    pub temperature: f64,
    pub condition_icon: String,
    #[serde(default)]
    pub precipitation_probability: Option<f64>,
    #[serde(default)]
    pub interpolated: bool,
}

/// A per-day forecast card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub representative_icon: String,
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_temp: f64,
    pub precipitation_probability: f64,
}

/// Current conditions for the headline block of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub country: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub condition: String,
    pub icon: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub rain_1h_mm: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub observation_time: DateTime<Utc>,
}

/// Everything the view needs for one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DaySummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_parse_reports_missing_before_invalid() {
        let err = Coordinates::parse(None, Some("x")).unwrap_err();
        assert_eq!(err, WeatherError::missing("lat"));

        let err = Coordinates::parse(Some("51.5"), Some("  ")).unwrap_err();
        assert_eq!(err, WeatherError::missing("lon"));
    }

    #[test]
    fn coordinates_parse_rejects_garbage_and_out_of_range() {
        let err = Coordinates::parse(Some("north"), Some("0")).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidParameter(_)));

        let err = Coordinates::parse(Some("91"), Some("0")).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidParameter(_)));

        let err = Coordinates::parse(Some("0"), Some("NaN")).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidParameter(_)));
    }

    #[test]
    fn coordinates_parse_accepts_padded_numbers() {
        let coords = Coordinates::parse(Some(" 13.08 "), Some("80.27")).unwrap();
        assert_eq!(coords, Coordinates { lat: 13.08, lon: 80.27 });
    }

    #[test]
    fn city_query_trims_and_rejects_blank() {
        assert_eq!(
            LocationQuery::city("  Chennai ").unwrap(),
            LocationQuery::City("Chennai".into())
        );
        assert_eq!(
            LocationQuery::city("   ").unwrap_err(),
            WeatherError::missing("City")
        );
    }

    #[test]
    fn from_params_prefers_city_then_coordinates() {
        assert_eq!(
            LocationQuery::from_params(Some("Oslo"), Some("1"), Some("2")).unwrap(),
            LocationQuery::City("Oslo".into())
        );
        assert_eq!(
            LocationQuery::from_params(Some(" "), Some("1"), Some("2")).unwrap(),
            LocationQuery::Coords(Coordinates { lat: 1.0, lon: 2.0 })
        );
        assert_eq!(
            LocationQuery::from_params(None, None, None).unwrap_err(),
            WeatherError::missing("City or lat/lon")
        );
        assert_eq!(
            LocationQuery::from_params(None, Some("1"), None).unwrap_err(),
            WeatherError::missing("lon")
        );
    }

    #[test]
    fn local_date_applies_offset() {
        let sample = WeatherSample {
            // 2024-03-01T22:00:00Z
            timestamp: 1_709_330_400,
            utc_offset: 3 * 3600,
            temperature: 1.0,
            humidity: 50,
            wind_speed: 1.0,
            condition_code: "01n".into(),
            condition_text: "clear sky".into(),
            precipitation_probability: None,
        };
        assert_eq!(sample.local_date(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());

        let utc_sample = WeatherSample { utc_offset: 0, ..sample };
        assert_eq!(utc_sample.local_date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
