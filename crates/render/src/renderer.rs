use formats::BoundaryDocument;
use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::projection::Mercator;
use layers::{MapRecord, PointStyle, RadiusScale, format_count, tooltip};
use tracing::debug;

use crate::frame::{RenderCommand, RenderFrame};
use crate::viewport::ViewportConfig;

/// Presentation backend for a list of map records.
///
/// Implementations receive the records already filtered and a style function
/// that decides how each one is drawn.
pub trait Renderer {
    type Output;

    fn render<F>(&mut self, records: &[MapRecord], style: F) -> Self::Output
    where
        F: Fn(&MapRecord) -> PointStyle;
}

/// Collects draw commands for one map state.
///
/// Ordering contract:
/// - Boundaries come first, in document then feature order.
/// - Points follow, largest radius first so small points stay on top; equal
///   radii keep record order.
/// - Legend and placeholder message come last.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    viewport: ViewportConfig,
    projection: Mercator,
    boundaries: Vec<RenderCommand>,
    legend: Vec<RenderCommand>,
    message: Option<String>,
}

impl FrameRenderer {
    pub fn new(viewport: ViewportConfig) -> Self {
        Self {
            viewport,
            projection: viewport.projection(),
            boundaries: Vec::new(),
            legend: Vec::new(),
            message: None,
        }
    }

    pub fn viewport(&self) -> ViewportConfig {
        self.viewport
    }

    /// Projects the outlines once; they are reused by every frame.
    pub fn with_boundaries<'a>(mut self, documents: impl IntoIterator<Item = &'a BoundaryDocument>) -> Self {
        for doc in documents {
            for feature in &doc.features {
                let rings = feature
                    .polygons
                    .iter()
                    .flatten()
                    .map(|ring| ring.iter().map(|p| self.projection.project(*p)).collect())
                    .collect();
                self.boundaries.push(RenderCommand::Boundary {
                    name: feature.name.clone(),
                    rings,
                });
            }
            debug!("projected {} features from {}", doc.features.len(), doc.name);
        }
        self
    }

    pub fn with_legend(mut self, scale: &RadiusScale) -> Self {
        self.legend = scale
            .legend_values()
            .into_iter()
            .map(|value| RenderCommand::LegendCircle {
                value,
                radius: scale.radius(value),
                label: format_count(value),
            })
            .collect();
        if !self.legend.is_empty() {
            self.legend.push(RenderCommand::LegendTitle {
                text: "Recordings".to_string(),
                max_radius: scale.max_radius(),
            });
        }
        self
    }

    /// Text drawn when a frame has no points.
    pub fn set_message(&mut self, message: Option<String>) {
        self.message = message;
    }
}

impl Renderer for FrameRenderer {
    type Output = RenderFrame;

    fn render<F>(&mut self, records: &[MapRecord], style: F) -> RenderFrame
    where
        F: Fn(&MapRecord) -> PointStyle,
    {
        let mut points: Vec<RenderCommand> = records
            .iter()
            .filter(|r| r.location.is_finite())
            .map(|r| RenderCommand::Point {
                center: self.projection.project(r.location),
                style: style(r),
                city: r.city.clone(),
                tooltip: tooltip(r),
                recording_count: r.recording_count,
            })
            .collect();
        points.sort_by(|a, b| stable_total_cmp_f64(point_radius(b), point_radius(a)));

        let mut commands = self.boundaries.clone();
        let empty = points.is_empty();
        commands.extend(points);
        commands.extend(self.legend.iter().cloned());
        if empty && let Some(text) = &self.message {
            commands.push(RenderCommand::Message { text: text.clone() });
        }

        RenderFrame {
            width: self.viewport.width,
            height: self.viewport.height,
            margin: self.viewport.margin,
            commands,
        }
    }
}

fn point_radius(cmd: &RenderCommand) -> f64 {
    match cmd {
        RenderCommand::Point { style, .. } => style.radius,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameRenderer, Renderer};
    use crate::frame::RenderCommand;
    use crate::viewport::ViewportConfig;
    use formats::BoundaryDocument;
    use foundation::{GeoPoint, YearSpan};
    use layers::{MapRecord, PointStyle, RadiusScale};

    fn record(city: &str, count: u64, lon: f64, lat: f64) -> MapRecord {
        MapRecord {
            city: city.to_string(),
            country: "Peru".to_string(),
            location: GeoPoint::new(lon, lat),
            recording_count: count,
            span: YearSpan::instant(1905),
            years: vec![1905],
            scouts: Vec::new(),
            start_date: None,
            end_date: None,
            audio_clips: Vec::new(),
            recordings: Vec::new(),
        }
    }

    fn boundaries() -> BoundaryDocument {
        BoundaryDocument::from_geojson_str(
            "test",
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"name":"Peru"},
               "geometry":{"type":"Polygon","coordinates":[[[-81,-18],[-68,-18],[-68,0],[-81,0],[-81,-18]]]}}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn commands_are_ordered_boundaries_points_legend() {
        let scale = RadiusScale::new(100, 10.0, 2.0);
        let doc = boundaries();
        let mut renderer = FrameRenderer::new(ViewportConfig::default())
            .with_boundaries([&doc])
            .with_legend(&scale);
        let records = vec![
            record("Small", 1, -77.0, -12.0),
            record("Big", 100, -70.0, -15.0),
            record("Mid", 25, -72.0, -13.0),
        ];
        let frame = renderer.render(&records, |r| PointStyle {
            radius: scale.radius(r.recording_count),
            ..PointStyle::default()
        });

        assert!(matches!(frame.commands[0], RenderCommand::Boundary { .. }));
        let cities: Vec<&str> = frame
            .points()
            .filter_map(|c| match c {
                RenderCommand::Point { city, .. } => Some(city.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(cities, vec!["Big", "Mid", "Small"]);
        assert!(matches!(
            frame.commands.last(),
            Some(RenderCommand::LegendTitle { .. })
        ));
        assert_eq!(frame.message(), None);
    }

    #[test]
    fn projects_onto_the_viewport() {
        let mut renderer = FrameRenderer::new(ViewportConfig::default());
        let frame = renderer.render(&[record("Center", 1, -80.0, -10.0)], |_| PointStyle::default());
        match &frame.commands[0] {
            RenderCommand::Point { center, tooltip, .. } => {
                assert!((center[0] - 500.0).abs() < 1e-9);
                assert!((center[1] - 262.5).abs() < 1e-9);
                assert_eq!(tooltip, "Center, Peru");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn empty_frames_carry_the_message() {
        let mut renderer = FrameRenderer::new(ViewportConfig::default());
        renderer.set_message(Some("No recordings for 1850".to_string()));
        let frame = renderer.render(&[], |_| PointStyle::default());
        assert_eq!(frame.message(), Some("No recordings for 1850"));

        let frame = renderer.render(&[record("Lima", 1, -77.0, -12.0)], |_| PointStyle::default());
        assert_eq!(frame.message(), None);
    }
}
