use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::WeatherError,
    model::{Coordinates, CurrentConditions, DaySummary, WeatherSample, local_datetime},
};

use super::{GeoMatch, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Client for the OpenWeather HTTP API.
#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// GET `path` and decode the body as JSON.
    ///
    /// An upstream 404 becomes `NotFound(subject)`.
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        subject: &str,
    ) -> Result<Value, WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({path})"))
            .map_err(WeatherError::upstream)?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather response body ({path})"))
            .map_err(WeatherError::upstream)?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::not_found(subject));
        }

        if !status.is_success() {
            return Err(WeatherError::upstream(anyhow!(
                "OpenWeather request {} failed with status {}: {}",
                path,
                status,
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OpenWeather JSON ({path})"))
            .map_err(WeatherError::upstream)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_by_city(&self, city: &str) -> Result<Value, WeatherError> {
        self.get_json("/data/2.5/weather", &[("q", city), ("units", "metric")], "City")
            .await
    }

    async fn geocode(&self, city: &str) -> Result<Vec<GeoMatch>, WeatherError> {
        let body = self
            .get_json("/geo/1.0/direct", &[("q", city), ("limit", "1")], "City")
            .await?;

        serde_json::from_value(body)
            .context("Failed to parse OpenWeather geocoding JSON")
            .map_err(WeatherError::upstream)
    }

    async fn forecast_by_coords(&self, coords: Coordinates) -> Result<Value, WeatherError> {
        let (lat, lon) = (coords.lat.to_string(), coords.lon.to_string());
        self.get_json(
            "/data/2.5/forecast",
            &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", "metric")],
            "Location",
        )
        .await
    }

    async fn one_call(&self, coords: Coordinates) -> Result<Value, WeatherError> {
        let (lat, lon) = (coords.lat.to_string(), coords.lon.to_string());
        self.get_json(
            "/data/3.0/onecall",
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("exclude", "minutely,alerts"),
                ("units", "metric"),
            ],
            "Location",
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    coord: Option<OwCoord>,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    rain: Option<OwRain>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OcCurrent {
    dt: i64,
    temp: f64,
    feels_like: f64,
    humidity: u8,
    wind_speed: f64,
    weather: Vec<OwWeather>,
    rain: Option<OwRain>,
}

#[derive(Debug, Deserialize)]
struct OcHour {
    dt: i64,
    temp: f64,
    humidity: u8,
    wind_speed: f64,
    weather: Vec<OwWeather>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OcDayTemp {
    day: f64,
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OcDay {
    dt: i64,
    temp: OcDayTemp,
    weather: Vec<OwWeather>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    lat: f64,
    lon: f64,
    #[serde(default)]
    timezone_offset: i32,
    current: OcCurrent,
    #[serde(default)]
    hourly: Vec<OcHour>,
    #[serde(default)]
    daily: Vec<OcDay>,
}

/// Typed view of a one-call payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OneCall {
    pub current: CurrentConditions,
    pub hourly: Vec<WeatherSample>,
    pub daily: Vec<DaySummary>,
}

/// Name shown for a one-call lookup, which carries no place name.
pub const COORDINATES_PLACE_NAME: &str = "Your location";

fn decode<T: serde::de::DeserializeOwned>(body: &Value, what: &str) -> Result<T, WeatherError> {
    T::deserialize(body)
        .with_context(|| format!("Malformed OpenWeather {what} payload"))
        .map_err(WeatherError::upstream)
}

fn condition(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.icon.clone(), w.description.clone()))
        .unwrap_or_else(|| (String::new(), "Unknown".to_string()))
}

/// Read the headline block out of a current-conditions payload.
pub fn parse_current(body: &Value) -> Result<CurrentConditions, WeatherError> {
    let parsed: OwCurrentResponse = decode(body, "current weather")?;
    let (icon, description) = condition(&parsed.weather);

    Ok(CurrentConditions {
        location_name: parsed.name,
        country: parsed.sys.country.unwrap_or_default(),
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        condition: description,
        icon,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
        rain_1h_mm: parsed.rain.and_then(|r| r.one_hour),
        coordinates: parsed.coord.map(|c| Coordinates { lat: c.lat, lon: c.lon }),
        observation_time: unix_to_utc(parsed.dt),
    })
}

/// Flatten a 3-hour forecast payload into samples, in provider order.
pub fn parse_forecast_samples(body: &Value) -> Result<Vec<WeatherSample>, WeatherError> {
    let parsed: OwForecastResponse = decode(body, "forecast")?;
    let utc_offset = parsed.city.timezone;

    Ok(parsed
        .list
        .into_iter()
        .map(|entry| {
            let (icon, description) = condition(&entry.weather);
            WeatherSample {
                timestamp: entry.dt,
                utc_offset,
                temperature: entry.main.temp,
                humidity: entry.main.humidity,
                wind_speed: entry.wind.speed,
                condition_code: icon,
                condition_text: description,
                precipitation_probability: entry.pop,
            }
        })
        .collect())
}

/// Split a one-call payload into the headline block, hourly samples and
/// the provider's own daily cards.
pub fn parse_one_call(body: &Value) -> Result<OneCall, WeatherError> {
    let parsed: OneCallResponse = decode(body, "one-call")?;
    let utc_offset = parsed.timezone_offset;
    let (icon, description) = condition(&parsed.current.weather);

    let current = CurrentConditions {
        location_name: COORDINATES_PLACE_NAME.to_string(),
        country: String::new(),
        temperature_c: parsed.current.temp,
        feels_like_c: parsed.current.feels_like,
        condition: description,
        icon,
        humidity_pct: parsed.current.humidity,
        wind_speed_mps: parsed.current.wind_speed,
        rain_1h_mm: parsed.current.rain.and_then(|r| r.one_hour),
        coordinates: Some(Coordinates { lat: parsed.lat, lon: parsed.lon }),
        observation_time: unix_to_utc(parsed.current.dt),
    };

    let hourly = parsed
        .hourly
        .into_iter()
        .map(|hour| {
            let (icon, description) = condition(&hour.weather);
            WeatherSample {
                timestamp: hour.dt,
                utc_offset,
                temperature: hour.temp,
                humidity: hour.humidity,
                wind_speed: hour.wind_speed,
                condition_code: icon,
                condition_text: description,
                precipitation_probability: hour.pop,
            }
        })
        .collect();

    let daily = parsed
        .daily
        .into_iter()
        .map(|day| {
            let (icon, _) = condition(&day.weather);
            let (min_temp, max_temp) = (day.temp.min.min(day.temp.max), day.temp.max.max(day.temp.min));
            DaySummary {
                date: local_datetime(day.dt, utc_offset).date_naive(),
                representative_icon: icon,
                min_temp,
                max_temp,
                avg_temp: day.temp.day.clamp(min_temp, max_temp),
                precipitation_probability: day.pop.unwrap_or(0.0),
            }
        })
        .collect();

    Ok(OneCall { current, hourly, daily })
}

fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
