//! Error type shared by the provider client, the proxy service and the view layer.

use thiserror::Error;

/// Every failure the dashboard can surface.
///
/// `UpstreamFailure` carries the full provider error chain for logging; it is
/// never shown to callers verbatim, see [`WeatherError::user_message`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WeatherError {
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream request failed: {0}")]
    UpstreamFailure(String),

    #[error("nothing to render")]
    RenderingDegenerate,
}

impl WeatherError {
    pub fn missing<S: Into<String>>(name: S) -> Self {
        Self::MissingParameter(name.into())
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    /// Collapse an `anyhow` chain into an upstream failure, keeping every
    /// context layer in the detail.
    pub fn upstream(err: anyhow::Error) -> Self {
        Self::UpstreamFailure(format!("{err:#}"))
    }

    /// Stable machine-readable code for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_parameter",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::NotFound(_) => "not_found",
            Self::UpstreamFailure(_) => "upstream_failure",
            Self::RenderingDegenerate => "rendering_degenerate",
        }
    }

    /// Message that is safe to hand to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingParameter(name) => format!("{name} required"),
            Self::InvalidParameter(message) => message.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::UpstreamFailure(_) => "Error fetching weather".to_string(),
            Self::RenderingDegenerate => "No data to display".to_string(),
        }
    }
}
