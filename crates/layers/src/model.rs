use std::path::Path;

use compute::{ALL_SCOUTS, Aggregates, aggregate};
use dataset::Dataset;
use formats::{DatasetError, ParseReport, Recording, RowError, load_recordings};
use foundation::YearSpan;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metadata::MetadataPanel;
use crate::query::{MapRecord, MapSelection, Selection, select};
use crate::symbology::{DEFAULT_MAX_RADIUS, DEFAULT_MIN_RADIUS, PointStyle, RadiusScale};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub max_radius: f64,
    pub min_radius: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            max_radius: DEFAULT_MAX_RADIUS,
            min_radius: DEFAULT_MIN_RADIUS,
        }
    }
}

/// Values needed to populate the scout selector and the year slider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Controls {
    pub scout_options: Vec<String>,
    pub default_scout: &'static str,
    pub year_bounds: Option<YearSpan>,
    /// Legend circle values and their radii.
    pub legend: Vec<(u64, f64)>,
}

/// Read-only map data: the recordings, their aggregates and the radius scale.
///
/// Built once per load; a reload builds a new model.
#[derive(Debug, Clone)]
pub struct MapModel {
    dataset: Dataset,
    aggregates: Aggregates,
    rejected: Vec<RowError>,
    scale: RadiusScale,
}

impl MapModel {
    pub fn load(path: &Path, config: MapConfig) -> Result<Self, DatasetError> {
        let report = load_recordings(path)?;
        info!(
            "loaded {} recordings from {} ({} rows rejected)",
            report.recordings.len(),
            path.display(),
            report.rejected.len()
        );
        Ok(Self::from_report(report, config))
    }

    pub fn from_report(report: ParseReport, config: MapConfig) -> Self {
        let ParseReport {
            recordings,
            rejected,
        } = report;
        let mut model = Self::from_recordings(recordings, config);
        model.rejected = rejected;
        model
    }

    pub fn from_recordings(recordings: Vec<Recording>, config: MapConfig) -> Self {
        let dataset = Dataset::new(recordings);
        let aggregates = aggregate(&dataset);
        let scale = RadiusScale::new(
            aggregates.max_recording_count,
            config.max_radius,
            config.min_radius,
        );
        Self {
            dataset,
            aggregates,
            rejected: Vec::new(),
            scale,
        }
    }

    pub fn select(&self, selection: &Selection) -> MapSelection {
        select(&self.dataset, &self.aggregates, selection)
    }

    pub fn radius(&self, record: &MapRecord) -> f64 {
        self.scale.radius(record.recording_count)
    }

    pub fn style(&self, record: &MapRecord) -> PointStyle {
        PointStyle::for_record(record, &self.scale)
    }

    pub fn metadata(&self, record: &MapRecord, selection: &Selection) -> MetadataPanel {
        MetadataPanel::for_record(record, selection)
    }

    pub fn scale(&self) -> &RadiusScale {
        &self.scale
    }

    pub fn scout_options(&self) -> &[String] {
        &self.aggregates.scout_options
    }

    pub fn year_bounds(&self) -> Option<YearSpan> {
        self.aggregates.year_bounds
    }

    pub fn controls(&self) -> Controls {
        Controls {
            scout_options: self.aggregates.scout_options.clone(),
            default_scout: ALL_SCOUTS,
            year_bounds: self.aggregates.year_bounds,
            legend: self
                .scale
                .legend_values()
                .into_iter()
                .map(|v| (v, self.scale.radius(v)))
                .collect(),
        }
    }

    /// City aggregate as a map record, matched on the trimmed name.
    pub fn city(&self, name: &str) -> Option<MapRecord> {
        self.aggregates.city(name).map(MapRecord::from_city)
    }

    pub fn rejected(&self) -> &[RowError] {
        &self.rejected
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn aggregates(&self) -> &Aggregates {
        &self.aggregates
    }
}
