use crate::{Config, error::WeatherError, model::Coordinates, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// One match from the provider's geocoding endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMatch {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl GeoMatch {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.lat, lon: self.lon }
    }
}

/// Upstream weather API. Payloads come back as the provider's JSON, untouched.
///
/// Implementations map an upstream "no such place" to
/// [`WeatherError::NotFound`] and every other failure to
/// [`WeatherError::UpstreamFailure`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city name.
    async fn current_by_city(&self, city: &str) -> Result<Value, WeatherError>;

    /// Resolve a city name to candidate positions, best match first.
    async fn geocode(&self, city: &str) -> Result<Vec<GeoMatch>, WeatherError>;

    /// 5-day forecast in 3-hour steps.
    async fn forecast_by_coords(&self, coords: Coordinates) -> Result<Value, WeatherError>;

    /// Current, hourly and daily forecast in one payload.
    async fn one_call(&self, coords: Coordinates) -> Result<Value, WeatherError>;
}

/// Construct the provider described by the configuration.
pub fn provider_from_config(config: &Config) -> Arc<dyn WeatherProvider> {
    Arc::new(OpenWeatherProvider::with_base_url(
        config.api_key_or_placeholder().to_owned(),
        config.api_base_url.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_match_deserializes_without_optional_fields() {
        let m: GeoMatch =
            serde_json::from_value(serde_json::json!({"name": "Oslo", "lat": 59.91, "lon": 10.75}))
                .unwrap();

        assert_eq!(m.country, None);
        assert_eq!(m.coordinates(), Coordinates { lat: 59.91, lon: 10.75 });
    }

    #[test]
    fn provider_from_config_uses_configured_base_url() {
        let mut cfg = Config::default();
        cfg.api_base_url = "http://localhost:9999".into();

        let provider = provider_from_config(&cfg);

        assert!(format!("{provider:?}").contains("localhost:9999"));
    }
}
