//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider client and the stateless proxy service on top of it
//! - Forecast aggregation (hourly trend, per-day cards) and chart rendering
//! - The view controller and the HTTP client it uses to talk to the proxy
//!
//! It is used by the `weather-dashboard` binary, but can also be reused by other front ends.

pub mod aggregate;
pub mod chart;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod proxy;
pub mod view;

pub use aggregate::{build_daily_summaries, build_hourly_series};
pub use chart::{ChartLayout, ChartPoint, Surface, SvgSurface, render_line_chart};
pub use client::ProxyClient;
pub use config::Config;
pub use error::WeatherError;
pub use model::{
    Coordinates, CurrentConditions, Dashboard, DaySummary, HourlyPoint, LocationQuery,
    WeatherSample,
};
pub use provider::{GeoMatch, WeatherProvider, provider_from_config};
pub use proxy::WeatherProxy;
pub use view::{DashboardSource, SearchOutcome, ViewController, ViewState};
