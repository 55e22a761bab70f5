//! HTTP client for the proxy's own `/api/dashboard` endpoint.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{Dashboard, LocationQuery},
    view::DashboardSource,
};

#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: String,
    http: Client,
}

/// Error body written by the proxy.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    kind: Option<String>,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub async fn dashboard(&self, query: &LocationQuery) -> Result<Dashboard, WeatherError> {
        let url = format!("{}/api/dashboard", self.base_url);
        let request = match query {
            LocationQuery::City(city) => self.http.get(&url).query(&[("city", city.as_str())]),
            LocationQuery::Coords(c) => self
                .http
                .get(&url)
                .query(&[("lat", c.lat.to_string()), ("lon", c.lon.to_string())]),
        };

        let res = request
            .send()
            .await
            .with_context(|| format!("Failed to reach weather proxy at {}", self.base_url))
            .map_err(WeatherError::upstream)?;

        let status = res.status();
        if status.is_success() {
            return res
                .json::<Dashboard>()
                .await
                .context("Failed to parse dashboard JSON")
                .map_err(WeatherError::upstream);
        }

        let body = res.text().await.unwrap_or_default();
        Err(error_from_response(status, &body))
    }
}

/// Rebuild the typed error from a proxy error response.
fn error_from_response(status: StatusCode, body: &str) -> WeatherError {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return WeatherError::UpstreamFailure(format!("proxy returned {status}: {body}"));
    };

    let kind = parsed.kind.as_deref().unwrap_or(match status {
        StatusCode::BAD_REQUEST => "invalid_parameter",
        StatusCode::NOT_FOUND => "not_found",
        _ => "upstream_failure",
    });

    match kind {
        "missing_parameter" => WeatherError::MissingParameter(
            parsed.error.trim_end_matches(" required").to_string(),
        ),
        "invalid_parameter" => WeatherError::InvalidParameter(parsed.error),
        "not_found" => {
            WeatherError::NotFound(parsed.error.trim_end_matches(" not found").to_string())
        }
        _ => WeatherError::UpstreamFailure(format!("proxy returned {status}: {}", parsed.error)),
    }
}

#[async_trait]
impl DashboardSource for ProxyClient {
    async fn fetch_dashboard(&self, query: &LocationQuery) -> Result<Dashboard, WeatherError> {
        self.dashboard(query).await
    }
}
