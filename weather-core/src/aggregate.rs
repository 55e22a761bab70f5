//! Turns raw provider samples into what the dashboard displays: an hourly
//! temperature trend and per-day forecast cards.
//!
//! Both functions expect samples ordered by ascending timestamp and never
//! fail; short or empty input yields a short or empty result.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{DaySummary, HourlyPoint, WeatherSample};

const HOUR_SECS: i64 = 3600;

/// Build an hourly series of at most `window_hours` points.
///
/// Samples further apart than one hour get the hours in between synthesized
/// by linear interpolation of temperature. A synthesized hour shows the icon
/// and precipitation probability of the nearer bounding sample, the earlier
/// one on a tie.
pub fn build_hourly_series(samples: &[WeatherSample], window_hours: usize) -> Vec<HourlyPoint> {
    let mut series = Vec::with_capacity(window_hours);
    if window_hours == 0 {
        return series;
    }

    for pair in samples.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let gap = to.timestamp - from.timestamp;
        let steps = (gap / HOUR_SECS).max(1);

        for step in 0..steps {
            if series.len() == window_hours {
                return series;
            }
            series.push(hour_between(from, to, step * HOUR_SECS));
        }
    }

    if let Some(last) = samples.last() {
        if series.len() < window_hours {
            series.push(direct(last));
        }
    }

    series
}

fn direct(sample: &WeatherSample) -> HourlyPoint {
    HourlyPoint {
        timestamp: sample.timestamp,
        utc_offset: sample.utc_offset,
        temperature: sample.temperature,
        condition_icon: sample.condition_code.clone(),
        precipitation_probability: sample.precipitation_probability,
        interpolated: false,
    }
}

/// The point `elapsed` seconds after `from` on the way to `to`.
fn hour_between(from: &WeatherSample, to: &WeatherSample, elapsed: i64) -> HourlyPoint {
    if elapsed == 0 {
        return direct(from);
    }

    let gap = to.timestamp - from.timestamp;
    let fraction = elapsed as f64 / gap as f64;
    let nearer = if elapsed * 2 <= gap { from } else { to };

    HourlyPoint {
        timestamp: from.timestamp + elapsed,
        utc_offset: from.utc_offset,
        temperature: lerp(from.temperature, to.temperature, fraction),
        condition_icon: nearer.condition_code.clone(),
        precipitation_probability: nearer.precipitation_probability,
        interpolated: true,
    }
}

// Weighted form keeps the midpoint bit-identical to (a + b) / 2.
fn lerp(a: f64, b: f64, fraction: f64) -> f64 {
    a * (1.0 - fraction) + b * fraction
}

/// Group samples by local calendar date and reduce each day to a card.
///
/// Returns at most `max_days` cards in chronological order.
pub fn build_daily_summaries(samples: &[WeatherSample], max_days: usize) -> Vec<DaySummary> {
    let mut days: BTreeMap<NaiveDate, Vec<&WeatherSample>> = BTreeMap::new();
    for sample in samples {
        days.entry(sample.local_date()).or_default().push(sample);
    }

    days.into_iter()
        .take(max_days)
        .filter_map(|(date, group)| summarize_day(date, &group))
        .collect()
}

fn summarize_day(date: NaiveDate, group: &[&WeatherSample]) -> Option<DaySummary> {
    let first = group.first()?;

    let mut min_temp = f64::INFINITY;
    let mut max_temp = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for sample in group {
        min_temp = min_temp.min(sample.temperature);
        max_temp = max_temp.max(sample.temperature);
        sum += sample.temperature;
    }
    // Summation rounding can push the mean a hair outside the extrema.
    let avg_temp = (sum / group.len() as f64).clamp(min_temp, max_temp);

    Some(DaySummary {
        date,
        representative_icon: representative_icon(group),
        min_temp,
        max_temp,
        avg_temp,
        precipitation_probability: first.precipitation_probability.unwrap_or(0.0),
    })
}

/// Most frequent condition code; ties go to the code seen first.
fn representative_icon(group: &[&WeatherSample]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for sample in group {
        let code = sample.condition_code.as_str();
        match counts.iter_mut().find(|(seen, _)| *seen == code) {
            Some((_, count)) => *count += 1,
            None => counts.push((code, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (code, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((code, count));
        }
    }
    best.map(|(code, _)| code.to_string()).unwrap_or_default()
}
