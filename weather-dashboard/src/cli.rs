use std::{fmt::Write as _, path::PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::Password;
use weather_core::{Config, ProxyClient, SearchOutcome, ViewController, ViewState};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard server and viewer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the proxy server and serve the dashboard.
    Serve {
        /// Port to listen on; overrides config and `PORT`.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show the dashboard for a city or a coordinate pair.
    Show {
        /// City name, e.g. "Chennai".
        city: Option<String>,

        #[arg(long, requires = "lon", conflicts_with = "city", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", conflicts_with = "city", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Proxy base URL; defaults to the locally configured server.
        #[arg(long)]
        server: Option<String>,

        /// Write the hourly chart as SVG to this path.
        #[arg(long)]
        chart: Option<PathBuf>,
    },

    /// Store the OpenWeather API key in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { port } => {
                let mut config = Config::load()?;
                if let Some(port) = port {
                    config.port = port;
                }
                server::run(config).await
            }
            Command::Show { city, lat, lon, server, chart } => {
                let server = match server {
                    Some(url) => url,
                    None => format!("http://localhost:{}", Config::load()?.port),
                };
                let controller = ViewController::new(ProxyClient::new(server));

                let result = match (lat, lon) {
                    (Some(lat), Some(lon)) => controller.locate(lat, lon).await,
                    _ => controller.search(city.as_deref().unwrap_or_default()).await,
                };
                let state = controller.snapshot();

                match result {
                    Ok(SearchOutcome::Applied) => {}
                    Ok(SearchOutcome::Stale) => return Ok(()),
                    Err(err) => {
                        tracing::debug!(%err, "dashboard request failed");
                        bail!(state.alert.unwrap_or_else(|| err.user_message()));
                    }
                }

                print!("{}", render_state(&state));

                if let Some(path) = chart {
                    let svg = state.chart_svg.as_deref().context("No data to display")?;
                    std::fs::write(&path, svg)
                        .with_context(|| format!("Failed to write chart to {}", path.display()))?;
                    println!("\nChart written to {}", path.display());
                }
                Ok(())
            }
            Command::Configure => {
                let api_key = Password::new("OpenWeather API key:")
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                let mut config = Config::load_file()?;
                config.set_api_key(api_key.trim().to_string());
                config.save()?;

                println!("Saved API key to {}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

/// Plain-text rendering of the dashboard.
fn render_state(state: &ViewState) -> String {
    let mut out = String::new();

    if let Some(h) = &state.headline {
        let _ = writeln!(out, "{}  {}  {}", h.place, h.temperature, h.description);
        let _ = writeln!(out, "{} | {} | {}", h.precipitation, h.humidity, h.wind);
    }

    if !state.hours.is_empty() {
        let _ = writeln!(out, "\nNext hours");
        for hour in &state.hours {
            let _ = writeln!(out, "  {:>5}  {:>5}", hour.time, hour.temperature);
        }
    }

    if !state.days.is_empty() {
        let _ = writeln!(out, "\nDays");
        for day in &state.days {
            let _ = writeln!(
                out,
                "  {:<3}  {:<11}  avg {:>5}  {}",
                day.day, day.high_low, day.average, day.precipitation
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::view::{DayCard, Headline, HourCard};

    #[test]
    fn parses_show_with_coordinates() {
        let cli = Cli::try_parse_from(["weather-dashboard", "show", "--lat", "-33.9", "--lon", "18.4"])
            .unwrap();

        match cli.command {
            Command::Show { city, lat, lon, .. } => {
                assert_eq!(city, None);
                assert_eq!(lat, Some(-33.9));
                assert_eq!(lon, Some(18.4));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_half_a_coordinate_pair() {
        assert!(Cli::try_parse_from(["weather-dashboard", "show", "--lat", "10"]).is_err());
    }

    #[test]
    fn parses_serve_port() {
        let cli = Cli::try_parse_from(["weather-dashboard", "serve", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { port: Some(8080) }));
    }

    #[test]
    fn renders_headline_hours_and_days() {
        let mut state = ViewState::default();
        state.headline = Some(Headline {
            place: "Chennai, IN".into(),
            temperature: "31°C".into(),
            description: "haze".into(),
            icon_url: String::new(),
            precipitation: "Precip: 10%".into(),
            humidity: "Humidity: 70%".into(),
            wind: "Wind: 3 m/s".into(),
        });
        state.hours = vec![HourCard {
            time: "05:30".into(),
            icon_url: String::new(),
            temperature: "28°C".into(),
        }];
        state.days = vec![DayCard {
            day: "Fri".into(),
            icon_url: String::new(),
            high_low: "31° / 28°".into(),
            average: "30°C".into(),
            precipitation: "Pop: 10%".into(),
        }];

        let text = render_state(&state);

        assert!(text.starts_with("Chennai, IN  31°C  haze\n"));
        assert!(text.contains("05:30"));
        assert!(text.contains("Fri"));
        assert!(text.contains("Pop: 10%"));
    }

    #[test]
    fn renders_nothing_for_empty_state() {
        assert!(render_state(&ViewState::default()).is_empty());
    }
}
