use layers::PointStyle;
use serde::Serialize;

/// Screen position in pixels, relative to the inner (margin-free) area.
pub type ScreenPoint = [f64; 2];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderCommand {
    /// One country outline; each ring is a closed polygon ring.
    Boundary {
        name: Option<String>,
        rings: Vec<Vec<ScreenPoint>>,
    },
    Point {
        center: ScreenPoint,
        style: PointStyle,
        city: String,
        tooltip: String,
        recording_count: u64,
    },
    LegendCircle {
        value: u64,
        radius: f64,
        label: String,
    },
    LegendTitle {
        text: String,
        max_radius: f64,
    },
    /// Placeholder shown when nothing matches the current filter.
    Message { text: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderFrame {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn points(&self) -> impl Iterator<Item = &RenderCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Point { .. }))
    }

    pub fn message(&self) -> Option<&str> {
        self.commands.iter().find_map(|c| match c {
            RenderCommand::Message { text } => Some(text.as_str()),
            _ => None,
        })
    }
}
