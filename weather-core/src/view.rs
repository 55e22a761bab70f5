//! View controller: turns user input into dashboard requests and keeps an
//! explicit [`ViewState`] that any front end can draw.
//!
//! Overlapping searches are resolved with a monotonic request token: only
//! the response to the most recently issued request is applied.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::{
    chart::{ChartPoint, SvgSurface, render_line_chart, round_half_up},
    error::WeatherError,
    model::{Coordinates, Dashboard, DaySummary, HourlyPoint, LocationQuery, local_datetime},
    proxy::WeatherProxy,
};

/// Default drawing area of the hourly chart.
pub const CHART_SIZE: (f64, f64) = (600.0, 160.0);

/// Anything that can answer a dashboard query.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    async fn fetch_dashboard(&self, query: &LocationQuery) -> Result<Dashboard, WeatherError>;
}

#[async_trait]
impl DashboardSource for WeatherProxy {
    async fn fetch_dashboard(&self, query: &LocationQuery) -> Result<Dashboard, WeatherError> {
        self.dashboard(query).await
    }
}

pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

/// `HH:MM` in the location's local time.
pub fn hour_label(timestamp: i64, utc_offset: i32) -> String {
    local_datetime(timestamp, utc_offset).format("%H:%M").to_string()
}

/// Short weekday name, e.g. `Mon`.
pub fn weekday_label(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub place: String,
    pub temperature: String,
    pub description: String,
    pub icon_url: String,
    pub precipitation: String,
    pub humidity: String,
    pub wind: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourCard {
    pub time: String,
    pub icon_url: String,
    pub temperature: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCard {
    pub day: String,
    pub icon_url: String,
    pub high_low: String,
    pub average: String,
    pub precipitation: String,
}

/// Everything currently on screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub headline: Option<Headline>,
    pub hours: Vec<HourCard>,
    pub days: Vec<DayCard>,
    pub chart_svg: Option<String>,
    pub loading: bool,
    pub alert: Option<String>,
    in_flight: usize,
}

impl ViewState {
    /// Replace displayed data with `dashboard`.
    pub fn apply(&mut self, dashboard: &Dashboard, chart_size: (f64, f64)) {
        self.headline = Some(headline(dashboard));
        self.hours = dashboard.hourly.iter().map(hour_card).collect();
        self.days = dashboard.daily.iter().map(day_card).collect();
        self.chart_svg = hourly_chart(&dashboard.hourly, chart_size);
        self.alert = None;
    }
}

fn headline(dashboard: &Dashboard) -> Headline {
    let current = &dashboard.current;
    let place = if current.country.is_empty() {
        current.location_name.clone()
    } else {
        format!("{}, {}", current.location_name, current.country)
    };
    let next_hour_pop = dashboard
        .hourly
        .first()
        .and_then(|hour| hour.precipitation_probability);
    let precipitation = match (current.rain_1h_mm, next_hour_pop, dashboard.daily.first()) {
        (Some(mm), _, _) => format!("Precip: {mm} mm"),
        (None, Some(pop), _) => format!("Precip: {}%", percent(pop)),
        (None, None, Some(day)) => format!("Precip: {}%", percent(day.precipitation_probability)),
        (None, None, None) => "Precip: -".to_string(),
    };

    Headline {
        place,
        temperature: format!("{}°C", round_half_up(current.temperature_c)),
        description: current.condition.clone(),
        icon_url: icon_url(&current.icon),
        precipitation,
        humidity: format!("Humidity: {}%", current.humidity_pct),
        wind: format!("Wind: {} m/s", round_half_up(current.wind_speed_mps)),
    }
}

fn hour_card(point: &HourlyPoint) -> HourCard {
    HourCard {
        time: hour_label(point.timestamp, point.utc_offset),
        icon_url: icon_url(&point.condition_icon),
        temperature: format!("{}°C", round_half_up(point.temperature)),
    }
}

fn day_card(day: &DaySummary) -> DayCard {
    DayCard {
        day: weekday_label(day.date),
        icon_url: icon_url(&day.representative_icon),
        high_low: format!("{}° / {}°", round_half_up(day.max_temp), round_half_up(day.min_temp)),
        average: format!("{}°C", round_half_up(day.avg_temp)),
        precipitation: format!("Pop: {}%", percent(day.precipitation_probability)),
    }
}

fn percent(probability: f64) -> i64 {
    round_half_up(probability * 100.0)
}

/// Temperatures of the hourly trend, labelled with their local hour.
pub fn chart_points(hourly: &[HourlyPoint]) -> Vec<ChartPoint> {
    hourly
        .iter()
        .map(|p| ChartPoint::new(hour_label(p.timestamp, p.utc_offset), p.temperature))
        .collect()
}

/// Render the hourly trend as SVG, or `None` when there is nothing to plot.
pub fn hourly_chart(hourly: &[HourlyPoint], (width, height): (f64, f64)) -> Option<String> {
    let mut surface = SvgSurface::new(width, height);
    render_line_chart(&mut surface, &chart_points(hourly)).map(|_| surface.to_svg())
}

/// What happened to a search once its response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Applied,
    /// A newer search was issued meanwhile; this response was dropped.
    Stale,
}

pub struct ViewController<S> {
    source: S,
    state: Mutex<ViewState>,
    latest_token: AtomicU64,
    chart_size: (f64, f64),
}

impl<S: DashboardSource> ViewController<S> {
    pub fn new(source: S) -> Self {
        Self::with_chart_size(source, CHART_SIZE)
    }

    pub fn with_chart_size(source: S, chart_size: (f64, f64)) -> Self {
        Self {
            source,
            state: Mutex::new(ViewState::default()),
            latest_token: AtomicU64::new(0),
            chart_size,
        }
    }

    /// Copy of the current view state.
    pub fn snapshot(&self) -> ViewState {
        self.state.lock().clone()
    }

    /// Search by the text typed into the search box.
    pub async fn search(&self, input: &str) -> Result<SearchOutcome, WeatherError> {
        match LocationQuery::city(input) {
            Ok(query) => self.run(query).await,
            Err(err) => {
                self.state.lock().alert = Some("Type a city name".to_string());
                Err(err)
            }
        }
    }

    /// Search by a position reported by the device.
    pub async fn locate(&self, lat: f64, lon: f64) -> Result<SearchOutcome, WeatherError> {
        match Coordinates::new(lat, lon) {
            Ok(coords) => self.run(LocationQuery::Coords(coords)).await,
            Err(err) => {
                self.state.lock().alert = Some(format!("Location error: {}", err.user_message()));
                Err(err)
            }
        }
    }

    async fn run(&self, query: LocationQuery) -> Result<SearchOutcome, WeatherError> {
        let token = self.latest_token.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = LoadingGuard::acquire(&self.state);

        let result = self.source.fetch_dashboard(&query).await;

        if token != self.latest_token.load(Ordering::SeqCst) {
            tracing::debug!(token, ?query, "dropping response to superseded search");
            return Ok(SearchOutcome::Stale);
        }

        match result {
            Ok(dashboard) => {
                self.state.lock().apply(&dashboard, self.chart_size);
                Ok(SearchOutcome::Applied)
            }
            Err(err) => {
                if let WeatherError::UpstreamFailure(detail) = &err {
                    tracing::error!(?query, %detail, "dashboard request failed");
                }
                self.state.lock().alert = Some(format!("Error: {}", err.user_message()));
                Err(err)
            }
        }
    }
}

/// Holds the loading indicator on while any request is in flight.
struct LoadingGuard<'a> {
    state: &'a Mutex<ViewState>,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(state: &'a Mutex<ViewState>) -> Self {
        let mut s = state.lock();
        s.in_flight += 1;
        s.loading = true;
        drop(s);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut s = self.state.lock();
        s.in_flight = s.in_flight.saturating_sub(1);
        s.loading = s.in_flight > 0;
    }
}
