//! City and scout aggregation over a loaded [`Dataset`].
//!
//! Aggregates are computed in one pass and never patched afterwards; a reload
//! builds a new [`Aggregates`] value.

use std::collections::{BTreeMap, BTreeSet};

use dataset::{Dataset, RecordingId};
use formats::AudioClip;
use foundation::{GeoPoint, LonLatBounds, Year, YearSpan};
use serde::Serialize;
use tracing::{debug, warn};

use super::spatial::SpatialAnalysis;
use super::statistics::Statistics;
use super::temporal::TemporalAnalysis;

/// Synthetic first entry of the scout option list.
pub const ALL_SCOUTS: &str = "All";

/// Every recording made in one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityAggregate {
    pub city: String,
    pub country: String,
    /// Coordinates of the first contributing recording.
    pub location: GeoPoint,
    pub total_recordings: u64,
    pub first_year: Year,
    pub last_year: Year,
    /// Start year of each contributing recording.
    pub years: BTreeSet<Year>,
    pub scout_names: BTreeSet<String>,
    pub audio_clips: Vec<AudioClip>,
    pub recordings: Vec<RecordingId>,
}

impl CityAggregate {
    pub fn span(&self) -> YearSpan {
        YearSpan {
            start: self.first_year,
            end: self.last_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoutSummary {
    pub name: String,
    pub total_recordings: u64,
    /// Number of table rows naming this scout.
    pub visits: usize,
    pub cities: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregates {
    pub cities: BTreeMap<String, CityAggregate>,
    pub scouts: BTreeMap<String, ScoutSummary>,
    /// `"All"` followed by every distinct scout name, sorted.
    pub scout_options: Vec<String>,
    pub year_bounds: Option<YearSpan>,
    /// Largest count any displayed point can carry (city total or single row).
    pub max_recording_count: u64,
    pub extent: Option<LonLatBounds>,
    /// Recordings left out of city grouping because their city is blank.
    pub skipped: Vec<RecordingId>,
}

impl Aggregates {
    pub fn city(&self, name: &str) -> Option<&CityAggregate> {
        self.cities.get(name.trim())
    }
}

pub fn aggregate(dataset: &Dataset) -> Aggregates {
    let mut cities: BTreeMap<String, CityAggregate> = BTreeMap::new();
    let mut scouts: BTreeMap<String, ScoutSummary> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (id, recording) in dataset.iter() {
        let city_key = recording.city.trim();
        let count = u64::from(recording.recording_count);

        for name in recording.scouts.iter().map(|s| s.trim()) {
            if name.is_empty() {
                continue;
            }
            let summary = scouts
                .entry(name.to_string())
                .or_insert_with(|| ScoutSummary {
                    name: name.to_string(),
                    total_recordings: 0,
                    visits: 0,
                    cities: BTreeSet::new(),
                });
            summary.total_recordings += count;
            summary.visits += 1;
            if !city_key.is_empty() {
                summary.cities.insert(city_key.to_string());
            }
        }

        if city_key.is_empty() {
            warn!("recording {id} has no city; left out of city totals");
            skipped.push(id);
            continue;
        }

        let entry = cities
            .entry(city_key.to_string())
            .or_insert_with(|| CityAggregate {
                city: city_key.to_string(),
                country: recording.country.trim().to_string(),
                location: recording.location,
                total_recordings: 0,
                first_year: recording.start_year(),
                last_year: recording.end_year(),
                years: BTreeSet::new(),
                scout_names: BTreeSet::new(),
                audio_clips: Vec::new(),
                recordings: Vec::new(),
            });
        entry.total_recordings += count;
        entry.first_year = entry.first_year.min(recording.start_year());
        entry.last_year = entry.last_year.max(recording.end_year());
        entry.years.insert(recording.start_year());
        entry.scout_names.extend(
            recording
                .scouts
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        if let Some(clip) = &recording.audio_clip {
            entry.audio_clips.push(clip.clone());
        }
        entry.recordings.push(id);
    }

    let scout_options = std::iter::once(ALL_SCOUTS.to_string())
        .chain(scouts.keys().cloned())
        .collect();

    let year_bounds = TemporalAnalysis::bounds(dataset.recordings().iter().map(|r| r.span));
    let max_city = cities.values().map(|c| c.total_recordings).max().unwrap_or(0);
    let max_row = Statistics::min_max(dataset.recordings().iter().map(|r| r.recording_count))
        .map(|(_, hi)| u64::from(hi))
        .unwrap_or(0);
    let extent = SpatialAnalysis::extent(cities.values().map(|c| c.location));

    debug!(
        "aggregated {} cities and {} scouts ({} skipped)",
        cities.len(),
        scouts.len(),
        skipped.len()
    );

    Aggregates {
        cities,
        scouts,
        scout_options,
        year_bounds,
        max_recording_count: max_city.max(max_row),
        extent,
        skipped,
    }
}

/// Exact total of the given recordings' counts.
pub fn total_recordings(dataset: &Dataset, ids: impl IntoIterator<Item = RecordingId>) -> u64 {
    Statistics::sum(
        ids.into_iter()
            .filter_map(|id| dataset.get(id))
            .map(|r| r.recording_count),
    )
}
