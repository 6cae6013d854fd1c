use std::fmt::Write;

use formats::BoundaryDocument;
use layers::{MapModel, MapRecord, MapSelection, PointStyle};

use crate::frame::{RenderCommand, RenderFrame};
use crate::renderer::{FrameRenderer, Renderer};
use crate::viewport::ViewportConfig;

/// Renders map records to a standalone SVG document.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    frames: FrameRenderer,
}

impl SvgRenderer {
    pub fn new(frames: FrameRenderer) -> Self {
        Self { frames }
    }

    /// Renderer with the model's legend and the given outlines.
    pub fn for_model<'a>(
        viewport: ViewportConfig,
        model: &MapModel,
        boundaries: impl IntoIterator<Item = &'a BoundaryDocument>,
    ) -> Self {
        Self::new(
            FrameRenderer::new(viewport)
                .with_boundaries(boundaries)
                .with_legend(model.scale()),
        )
    }

    /// Draws a selection with the model's point styles.
    pub fn render_selection(&mut self, model: &MapModel, selection: &MapSelection) -> String {
        self.frames.set_message(selection.message.clone());
        self.render(&selection.records, |r| model.style(r))
    }
}

impl Renderer for SvgRenderer {
    type Output = String;

    fn render<F>(&mut self, records: &[MapRecord], style: F) -> String
    where
        F: Fn(&MapRecord) -> PointStyle,
    {
        let frame = self.frames.render(records, style);
        to_svg(&frame)
    }
}

pub fn to_svg(frame: &RenderFrame) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_svg(&mut out, frame);
    out
}

fn write_svg(out: &mut String, frame: &RenderFrame) -> std::fmt::Result {
    let outer_w = frame.width + 2.0 * frame.margin;
    let outer_h = frame.height + 2.0 * frame.margin;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
        num(outer_w),
        num(outer_h),
        num(outer_w),
        num(outer_h)
    )?;
    writeln!(
        out,
        r#"<g class="map" transform="translate({},{})">"#,
        num(frame.margin),
        num(frame.margin)
    )?;

    let mut legend_open = false;
    for cmd in &frame.commands {
        match cmd {
            RenderCommand::Boundary { name, rings } => {
                let mut d = String::new();
                for ring in rings.iter().filter(|r| !r.is_empty()) {
                    for (i, [x, y]) in ring.iter().enumerate() {
                        d.push(if i == 0 { 'M' } else { 'L' });
                        write!(d, "{},{}", num(*x), num(*y))?;
                    }
                    d.push('Z');
                }
                write!(out, r#"<path class="country" d="{d}""#)?;
                if let Some(name) = name {
                    write!(out, r#" data-name="{}""#, escape(name))?;
                }
                writeln!(out, "/>")?;
            }
            RenderCommand::Point {
                center,
                style,
                city,
                tooltip,
                recording_count,
            } => {
                writeln!(
                    out,
                    r#"<circle class="{}" cx="{}" cy="{}" r="{}" fill="{}" fill-opacity="{}" stroke="{}" stroke-width="{}" data-city="{}" data-recordings="{}"><title>{}</title></circle>"#,
                    style.class,
                    num(center[0]),
                    num(center[1]),
                    num(style.radius),
                    style.fill,
                    num(style.fill_opacity),
                    style.stroke,
                    num(style.stroke_width),
                    escape(city),
                    recording_count,
                    escape(tooltip)
                )?;
            }
            RenderCommand::LegendCircle { radius, label, .. } => {
                if !legend_open {
                    open_legend(out, frame, legend_max_radius(frame))?;
                    legend_open = true;
                }
                writeln!(
                    out,
                    r##"<g class="legend"><circle class="legend" fill="none" stroke="#ccc" cy="{}" r="{}"/><text y="{}" dy="1.3em">{}</text></g>"##,
                    num(-radius),
                    num(*radius),
                    num(-2.0 * radius),
                    escape(label)
                )?;
            }
            RenderCommand::LegendTitle { text, max_radius } => {
                if !legend_open {
                    open_legend(out, frame, *max_radius)?;
                    legend_open = true;
                }
                writeln!(
                    out,
                    r#"<text y="{}" dy="-0.7em">{}</text>"#,
                    num(-max_radius),
                    escape(text)
                )?;
            }
            RenderCommand::Message { text } => {
                if legend_open {
                    writeln!(out, "</g>")?;
                    legend_open = false;
                }
                writeln!(
                    out,
                    r#"<text class="no-data" x="{}" y="{}" text-anchor="middle">{}</text>"#,
                    num(frame.width / 2.0),
                    num(frame.height / 2.0),
                    escape(text)
                )?;
            }
        }
    }
    if legend_open {
        writeln!(out, "</g>")?;
    }

    writeln!(out, "</g>")?;
    writeln!(out, "</svg>")
}

fn legend_max_radius(frame: &RenderFrame) -> f64 {
    frame
        .commands
        .iter()
        .find_map(|c| match c {
            RenderCommand::LegendTitle { max_radius, .. } => Some(*max_radius),
            _ => None,
        })
        .unwrap_or(0.0)
}

/// Legend sits in the bottom-right corner, anchored on circle bottoms.
fn open_legend(out: &mut String, frame: &RenderFrame, max_radius: f64) -> std::fmt::Result {
    writeln!(
        out,
        r##"<g class="legend-group" fill="#777" transform="translate({},{})" text-anchor="middle" font-size="10" font-family="sans-serif">"##,
        num(frame.width - max_radius - 10.0),
        num(frame.height - 10.0)
    )
}

/// Two decimals, trailing zeros dropped.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
