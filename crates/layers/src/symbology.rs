use serde::Serialize;

use crate::query::MapRecord;

pub const DEFAULT_MAX_RADIUS: f64 = 10.0;
pub const DEFAULT_MIN_RADIUS: f64 = 2.0;

/// Square-root scale from a recording count to a circle radius in pixels.
///
/// The domain is `[0, max_count]` and the range `[0, max_radius]`; every
/// output is floored at `min_radius` so empty visits stay visible without
/// breaking monotonicity.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct RadiusScale {
    max_count: u64,
    max_radius: f64,
    min_radius: f64,
}

impl RadiusScale {
    pub fn new(max_count: u64, max_radius: f64, min_radius: f64) -> Self {
        let max_radius = if max_radius.is_finite() { max_radius.max(0.0) } else { DEFAULT_MAX_RADIUS };
        let min_radius = if min_radius.is_finite() { min_radius.clamp(0.0, max_radius) } else { 0.0 };
        Self {
            max_count,
            max_radius,
            min_radius,
        }
    }

    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    pub fn min_radius(&self) -> f64 {
        self.min_radius
    }

    pub fn radius(&self, count: u64) -> f64 {
        if self.max_count == 0 {
            return self.min_radius;
        }
        let t = (count as f64 / self.max_count as f64).sqrt();
        (t * self.max_radius).max(self.min_radius)
    }

    /// Round tick values over the domain, stepping by 1, 2 or 5 times a power
    /// of ten. Counts are whole, so the step never drops below 1.
    pub fn ticks(&self, count: usize) -> Vec<u64> {
        if self.max_count == 0 || count == 0 {
            return vec![0];
        }
        let step = tick_step(self.max_count as f64, count as f64).max(1.0).round() as u64;
        (0..=self.max_count / step).map(|i| i * step).collect()
    }

    /// Values shown in the size legend: four ticks without the zero tick.
    pub fn legend_values(&self) -> Vec<u64> {
        self.ticks(4).into_iter().skip(1).collect()
    }
}

fn tick_step(span: f64, count: f64) -> f64 {
    let raw = span / count;
    let power = raw.log10().floor();
    let error = raw / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * 10f64.powf(power)
}

/// Compact label for a legend value (`1.5k`, `20k`, `3M`).
pub fn format_count(value: u64) -> String {
    fn trim(v: f64) -> String {
        let s = format!("{v:.1}");
        s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
    }
    match value {
        0..1_000 => value.to_string(),
        1_000..1_000_000 => format!("{}k", trim(value as f64 / 1e3)),
        _ => format!("{}M", trim(value as f64 / 1e6)),
    }
}

/// Visual attributes of one map point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointStyle {
    pub radius: f64,
    pub fill: &'static str,
    pub fill_opacity: f64,
    pub stroke: &'static str,
    pub stroke_width: f64,
    pub class: &'static str,
}

impl PointStyle {
    pub fn for_record(record: &MapRecord, scale: &RadiusScale) -> Self {
        let radius = scale.radius(record.recording_count);
        if record.is_empty_visit() {
            Self {
                radius,
                fill: "none",
                fill_opacity: 0.0,
                stroke: "#b2182b",
                stroke_width: 1.0,
                class: "point point--empty",
            }
        } else {
            Self {
                radius,
                ..Self::default()
            }
        }
    }
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            radius: DEFAULT_MIN_RADIUS,
            fill: "#b2182b",
            fill_opacity: 0.6,
            stroke: "#fff",
            stroke_width: 0.5,
            class: "point",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PointStyle, RadiusScale, format_count};
    use crate::query::MapRecord;
    use foundation::{GeoPoint, YearSpan};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {a} ~= {b}");
    }

    #[test]
    fn zero_count_gets_min_radius() {
        let scale = RadiusScale::new(100, 10.0, 2.0);
        assert_close(scale.radius(0), 2.0);
        assert!(scale.radius(0) > 0.0);
        assert_close(scale.radius(100), 10.0);
        assert_close(scale.radius(25), 5.0);
    }

    #[test]
    fn radius_is_non_decreasing() {
        let scale = RadiusScale::new(137, 10.0, 2.0);
        let radii: Vec<f64> = (0..=200).map(|c| scale.radius(c)).collect();
        assert!(radii.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn empty_domain_uses_min_radius() {
        let scale = RadiusScale::new(0, 10.0, 2.0);
        assert_close(scale.radius(0), 2.0);
        assert_close(scale.radius(5), 2.0);
    }

    #[test]
    fn min_radius_never_exceeds_max() {
        let scale = RadiusScale::new(10, 3.0, 8.0);
        assert_close(scale.min_radius(), 3.0);
    }

    #[test]
    fn ticks_use_round_steps() {
        assert_eq!(RadiusScale::new(100, 10.0, 2.0).ticks(4), vec![0, 20, 40, 60, 80, 100]);
        assert_eq!(RadiusScale::new(1234, 10.0, 2.0).ticks(4), vec![0, 200, 400, 600, 800, 1000, 1200]);
        assert_eq!(RadiusScale::new(3, 10.0, 2.0).ticks(4), vec![0, 1, 2, 3]);
        assert_eq!(RadiusScale::new(100, 10.0, 2.0).legend_values(), vec![20, 40, 60, 80, 100]);
        assert_eq!(RadiusScale::new(0, 10.0, 2.0).legend_values(), Vec::<u64>::new());
    }

    #[test]
    fn counts_format_compactly() {
        assert_eq!(format_count(800), "800");
        assert_eq!(format_count(1500), "1.5k");
        assert_eq!(format_count(20_000), "20k");
        assert_eq!(format_count(3_000_000), "3M");
    }

    #[test]
    fn empty_visits_are_hollow() {
        let mut record = MapRecord {
            city: "Lima".to_string(),
            country: "Peru".to_string(),
            location: GeoPoint::new(-77.0, -12.0),
            recording_count: 0,
            span: YearSpan::instant(1905),
            years: vec![1905],
            scouts: Vec::new(),
            start_date: None,
            end_date: None,
            audio_clips: Vec::new(),
            recordings: Vec::new(),
        };
        let scale = RadiusScale::new(10, 10.0, 2.0);
        let empty = PointStyle::for_record(&record, &scale);
        assert_eq!(empty.class, "point point--empty");
        assert_eq!(empty.fill, "none");

        record.recording_count = 10;
        let full = PointStyle::for_record(&record, &scale);
        assert_eq!(full.class, "point");
        assert_close(full.radius, 10.0);
    }
}
