//! Filled line chart of a temperature series.
//!
//! Drawing goes through the [`Surface`] trait so the layout logic does not
//! depend on any particular output; [`SvgSurface`] renders a standalone SVG.

use std::fmt::Write as _;

use crate::error::WeatherError;

const PADDING: f64 = 20.0;
const MARKER_RADIUS: f64 = 3.0;
const VALUE_LABEL_RISE: f64 = 8.0;
const AXIS_LABEL_INSET: f64 = 6.0;
const FONT_SIZE: f64 = 11.0;

const AREA_FILL: &str = "rgba(255,211,107,0.12)";
const LINE_STROKE: &str = "#ffd36b";
const LINE_WIDTH: f64 = 2.0;
const MARKER_FILL: &str = "#fff";
const AXIS_LABEL_FILL: &str = "rgba(255,255,255,0.6)";

/// Round to the nearest whole number, halves towards positive infinity.
///
/// Readings just below zero come out as `0`, never `-0`.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// A 2D drawing target with a fixed size.
pub trait Surface {
    /// Width and height in drawing units.
    fn size(&self) -> (f64, f64);
    fn clear(&mut self);
    fn fill_polygon(&mut self, points: &[(f64, f64)], color: &str);
    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: &str, width: f64);
    fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: &str);
    /// Draw text horizontally centred on `at`.
    fn fill_text(&mut self, text: &str, at: (f64, f64), color: &str, font_size: f64);
}

/// One value of the series plus the label drawn under it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new<S: Into<String>>(label: S, value: f64) -> Self {
        Self { label: label.into(), value }
    }
}

/// Where each value landed on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub positions: Vec<(f64, f64)>,
    pub min: f64,
    pub max: f64,
    /// Bottom edge of the usable area.
    pub baseline: f64,
}

impl ChartLayout {
    /// Scale `points` into a `width` x `height` area inside the fixed padding.
    ///
    /// The minimum value maps to the bottom of the usable area and the
    /// maximum to the top. A flat series uses a range of 1.
    pub fn compute(width: f64, height: f64, points: &[ChartPoint]) -> Result<Self, WeatherError> {
        if points.is_empty() || points.iter().any(|p| !p.value.is_finite()) {
            return Err(WeatherError::RenderingDegenerate);
        }

        let usable_w = (width - PADDING * 2.0).max(0.0);
        let usable_h = (height - PADDING * 2.0).max(0.0);

        let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
        let max = points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);
        let range = if max == min { 1.0 } else { max - min };

        let step_x = usable_w / (points.len().saturating_sub(1).max(1)) as f64;
        let positions = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let x = PADDING + i as f64 * step_x;
                let y = PADDING + (1.0 - (p.value - min) / range) * usable_h;
                (x, y)
            })
            .collect();

        Ok(Self { positions, min, max, baseline: PADDING + usable_h })
    }
}

/// Clear `surface` and draw `points` as a filled line chart.
///
/// Returns `None` without drawing anything beyond the clear when there is
/// nothing to plot. A single point gets a marker and labels but no line.
pub fn render_line_chart<S: Surface + ?Sized>(
    surface: &mut S,
    points: &[ChartPoint],
) -> Option<ChartLayout> {
    surface.clear();

    let (width, height) = surface.size();
    let layout = match ChartLayout::compute(width, height, points) {
        Ok(layout) => layout,
        Err(err) => {
            tracing::debug!(points = points.len(), "skipping chart: {err}");
            return None;
        }
    };

    let positions = &layout.positions;
    if positions.len() > 1 {
        let (first_x, last_x) = (positions[0].0, positions[positions.len() - 1].0);
        let mut area = positions.clone();
        area.push((last_x, layout.baseline));
        area.push((first_x, layout.baseline));
        surface.fill_polygon(&area, AREA_FILL);
        surface.stroke_polyline(positions, LINE_STROKE, LINE_WIDTH);
    }

    for (point, &(x, y)) in points.iter().zip(positions) {
        surface.fill_circle((x, y), MARKER_RADIUS, MARKER_FILL);
        let label = format!("{}°", round_half_up(point.value));
        surface.fill_text(&label, (x, y - VALUE_LABEL_RISE), MARKER_FILL, FONT_SIZE);
    }

    for (point, &(x, _)) in points.iter().zip(positions) {
        surface.fill_text(&point.label, (x, height - AXIS_LABEL_INSET), AXIS_LABEL_FILL, FONT_SIZE);
    }

    Some(layout)
}

/// A surface that records SVG elements.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    elements: Vec<String>,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, elements: Vec::new() }
    }

    /// The complete SVG document for what has been drawn so far.
    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        );
        svg.push('\n');
        for element in &self.elements {
            svg.push_str("  ");
            svg.push_str(element);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }
}

fn svg_points(points: &[(f64, f64)]) -> String {
    let mut out = String::new();
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{x:.1},{y:.1}");
    }
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

impl Surface for SvgSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.elements.clear();
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)], color: &str) {
        self.elements.push(format!(
            r#"<polygon points="{}" fill="{color}" stroke="none"/>"#,
            svg_points(points)
        ));
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], color: &str, width: f64) {
        self.elements.push(format!(
            r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="{width}"/>"#,
            svg_points(points)
        ));
    }

    fn fill_circle(&mut self, (x, y): (f64, f64), radius: f64, color: &str) {
        self.elements.push(format!(
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="{radius}" fill="{color}"/>"#
        ));
    }

    fn fill_text(&mut self, text: &str, (x, y): (f64, f64), color: &str, font_size: f64) {
        self.elements.push(format!(
            r#"<text x="{x:.1}" y="{y:.1}" fill="{color}" font-family="system-ui" font-size="{font_size}" text-anchor="middle">{}</text>"#,
            escape_text(text)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Polygon(usize),
        Polyline(usize),
        Circle(f64, f64),
        Text(String),
    }

    struct Recorder {
        ops: Vec<Op>,
    }

    impl Recorder {
        fn new() -> Self {
            Self { ops: Vec::new() }
        }
    }

    impl Surface for Recorder {
        fn size(&self) -> (f64, f64) {
            (340.0, 140.0)
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn fill_polygon(&mut self, points: &[(f64, f64)], _: &str) {
            self.ops.push(Op::Polygon(points.len()));
        }
        fn stroke_polyline(&mut self, points: &[(f64, f64)], _: &str, _: f64) {
            self.ops.push(Op::Polyline(points.len()));
        }
        fn fill_circle(&mut self, (x, y): (f64, f64), _: f64, _: &str) {
            self.ops.push(Op::Circle(x, y));
        }
        fn fill_text(&mut self, text: &str, _: (f64, f64), _: &str, _: f64) {
            self.ops.push(Op::Text(text.to_string()));
        }
    }

    fn series(values: &[f64]) -> Vec<ChartPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ChartPoint::new(format!("{:02}:00", i), *v))
            .collect()
    }

    #[test]
    fn draws_area_then_line_then_markers_then_axis_labels() {
        let mut surface = Recorder::new();

        render_line_chart(&mut surface, &series(&[10.0, 12.4, 11.0])).unwrap();

        assert_eq!(surface.ops[0], Op::Clear);
        assert_eq!(surface.ops[1], Op::Polygon(5));
        assert_eq!(surface.ops[2], Op::Polyline(3));
        assert!(matches!(surface.ops[3], Op::Circle(..)));
        assert_eq!(surface.ops[4], Op::Text("10°".into()));
        assert_eq!(surface.ops[6], Op::Text("12°".into()));
        assert_eq!(surface.ops[9], Op::Text("00:00".into()));
        assert_eq!(surface.ops[11], Op::Text("02:00".into()));
        assert_eq!(surface.ops.len(), 12);
    }

    #[test]
    fn min_maps_to_bottom_and_max_to_top() {
        let layout = ChartLayout::compute(340.0, 140.0, &series(&[5.0, 15.0, 10.0])).unwrap();

        assert_eq!(layout.positions[0], (20.0, 120.0));
        assert_eq!(layout.positions[1], (170.0, 20.0));
        assert_eq!(layout.positions[2], (320.0, 70.0));
        assert_eq!(layout.baseline, 120.0);
    }

    #[test]
    fn single_point_draws_marker_only() {
        let mut surface = Recorder::new();

        let layout = render_line_chart(&mut surface, &series(&[7.0])).unwrap();

        assert_eq!(layout.positions.len(), 1);
        assert!(!surface.ops.iter().any(|op| matches!(op, Op::Polygon(_) | Op::Polyline(_))));
        assert_eq!(surface.ops.iter().filter(|op| matches!(op, Op::Circle(..))).count(), 1);
    }

    #[test]
    fn empty_series_only_clears() {
        let mut surface = Recorder::new();

        assert!(render_line_chart(&mut surface, &[]).is_none());
        assert_eq!(surface.ops, vec![Op::Clear]);
        assert_eq!(
            ChartLayout::compute(100.0, 100.0, &[]).unwrap_err(),
            WeatherError::RenderingDegenerate
        );
    }

    #[test]
    fn non_finite_values_are_degenerate() {
        let mut surface = Recorder::new();

        assert!(render_line_chart(&mut surface, &series(&[1.0, f64::NAN])).is_none());
        assert_eq!(surface.ops, vec![Op::Clear]);
    }

    #[test]
    fn rounding_never_yields_negative_zero() {
        assert_eq!(round_half_up(-0.3), 0);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.6), -3);
        assert_eq!(round_half_up(12.4), 12);
    }

    #[test]
    fn value_labels_just_below_zero_read_as_zero() {
        let mut surface = Recorder::new();

        render_line_chart(&mut surface, &series(&[-0.3])).unwrap();
        assert!(surface.ops.contains(&Op::Text("0°".into())));

        let mut svg = SvgSurface::new(100.0, 100.0);
        render_line_chart(&mut svg, &series(&[-0.3, -2.5]));
        let doc = svg.to_svg();
        assert!(!doc.contains("-0°"));
        assert!(doc.contains(">-2°<"));
    }

    #[test]
    fn svg_rendering_is_idempotent() {
        let points = series(&[3.0, 4.0, 2.5, 6.0]);
        let mut surface = SvgSurface::new(400.0, 160.0);

        render_line_chart(&mut surface, &points);
        let first = surface.to_svg();
        render_line_chart(&mut surface, &points);

        assert_eq!(first, surface.to_svg());
        assert!(first.starts_with("<svg"));
        assert_eq!(first.matches("<circle").count(), 4);
        assert_eq!(first.matches("<polyline").count(), 1);
    }

    #[test]
    fn svg_escapes_label_text() {
        let mut surface = SvgSurface::new(100.0, 100.0);

        render_line_chart(&mut surface, &[ChartPoint::new("<now>", 1.0)]);

        assert!(surface.to_svg().contains("&lt;now&gt;"));
    }

    proptest! {
        #[test]
        fn flat_series_shares_one_height(value in -50.0f64..50.0, len in 1usize..24) {
            let points = series(&vec![value; len]);

            let layout = ChartLayout::compute(300.0, 150.0, &points).unwrap();

            let y0 = layout.positions[0].1;
            prop_assert!(y0.is_finite());
            prop_assert!(layout.positions.iter().all(|&(_, y)| y == y0));
        }

        #[test]
        fn positions_stay_inside_the_padding(values in prop::collection::vec(-50.0f64..50.0, 1..24)) {
            let layout = ChartLayout::compute(300.0, 150.0, &series(&values)).unwrap();

            for &(x, y) in &layout.positions {
                prop_assert!(x >= PADDING - 1e-9 && x <= 300.0 - PADDING + 1e-9);
                prop_assert!(y >= PADDING - 1e-9 && y <= layout.baseline + 1e-9);
            }
        }
    }
}
