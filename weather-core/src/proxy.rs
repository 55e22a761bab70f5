//! The stateless proxy service behind the HTTP endpoints.
//!
//! Each call validates its parameters, then issues fresh upstream requests.
//! Raw endpoints relay the provider's JSON untouched; [`WeatherProxy::dashboard`]
//! additionally runs the aggregator over it.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    aggregate::{build_daily_summaries, build_hourly_series},
    error::WeatherError,
    model::{Coordinates, Dashboard, LocationQuery},
    provider::{
        WeatherProvider,
        openweather::{parse_current, parse_forecast_samples, parse_one_call},
    },
};

/// Hours shown in the hourly trend.
pub const HOURLY_WINDOW: usize = 8;
/// Day cards built from the 3-hour forecast.
pub const FORECAST_DAYS: usize = 5;
/// Day cards taken from a one-call payload.
pub const ONE_CALL_DAYS: usize = 7;

#[derive(Debug, Clone)]
pub struct WeatherProxy {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherProxy {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Current conditions for `city`, as the provider returned them.
    pub async fn weather(&self, city: Option<&str>) -> Result<Value, WeatherError> {
        let city = require_city(city)?;
        self.provider.current_by_city(city).await
    }

    /// 3-hour forecast for `city`: geocode first, then forecast by coordinates.
    pub async fn forecast(&self, city: Option<&str>) -> Result<Value, WeatherError> {
        let coords = self.resolve(require_city(city)?).await?;
        self.provider.forecast_by_coords(coords).await
    }

    /// One-call forecast for a coordinate pair given as raw query values.
    pub async fn full_weather(
        &self,
        lat: Option<&str>,
        lon: Option<&str>,
    ) -> Result<Value, WeatherError> {
        let coords = Coordinates::parse(lat, lon)?;
        self.provider.one_call(coords).await
    }

    /// Everything the view renders for one search.
    pub async fn dashboard(&self, query: &LocationQuery) -> Result<Dashboard, WeatherError> {
        match query {
            LocationQuery::City(city) => self.city_dashboard(city).await,
            LocationQuery::Coords(coords) => self.coords_dashboard(*coords).await,
        }
    }

    async fn city_dashboard(&self, city: &str) -> Result<Dashboard, WeatherError> {
        let current = parse_current(&self.provider.current_by_city(city).await?)?;
        let coords = match current.coordinates {
            Some(coords) => coords,
            None => self.resolve(city).await?,
        };

        let samples = parse_forecast_samples(&self.provider.forecast_by_coords(coords).await?)?;
        tracing::debug!(city, samples = samples.len(), "building dashboard");

        Ok(Dashboard {
            current,
            hourly: build_hourly_series(&samples, HOURLY_WINDOW),
            daily: build_daily_summaries(&samples, FORECAST_DAYS),
        })
    }

    async fn coords_dashboard(&self, coords: Coordinates) -> Result<Dashboard, WeatherError> {
        let mut one_call = parse_one_call(&self.provider.one_call(coords).await?)?;
        one_call.daily.truncate(ONE_CALL_DAYS);

        Ok(Dashboard {
            current: one_call.current,
            hourly: build_hourly_series(&one_call.hourly, HOURLY_WINDOW),
            daily: one_call.daily,
        })
    }

    async fn resolve(&self, city: &str) -> Result<Coordinates, WeatherError> {
        let matches = self.provider.geocode(city).await?;
        let best = matches.first().ok_or_else(|| WeatherError::not_found("City"))?;
        tracing::debug!(city, lat = best.lat, lon = best.lon, "geocoded");
        Ok(best.coordinates())
    }
}

fn require_city(city: Option<&str>) -> Result<&str, WeatherError> {
    city.map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| WeatherError::missing("City"))
}
