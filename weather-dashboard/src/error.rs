//! HTTP mapping of proxy failures.
//!
//! Clients only ever see the short user-facing message and a stable `kind`;
//! upstream detail stays in the server log.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use weather_core::WeatherError;

#[derive(Debug)]
pub struct ApiError(pub WeatherError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WeatherError::MissingParameter(_) | WeatherError::InvalidParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            WeatherError::NotFound(_) => StatusCode::NOT_FOUND,
            WeatherError::UpstreamFailure(_) | WeatherError::RenderingDegenerate => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            WeatherError::UpstreamFailure(detail) => {
                tracing::error!(%detail, "upstream request failed");
            }
            other => tracing::debug!(error = %other, %status, "rejecting request"),
        }

        let body = ErrorBody {
            error: self.0.user_message(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(ApiError(WeatherError::missing("City")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(WeatherError::invalid("lat")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(WeatherError::not_found("City")).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError(WeatherError::UpstreamFailure("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
