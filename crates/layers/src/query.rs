use chrono::NaiveDate;
use compute::{ALL_SCOUTS, Aggregates, CityAggregate};
use dataset::{Dataset, RecordingId};
use formats::{AudioClip, Recording};
use foundation::{GeoPoint, Year, YearSpan};
use serde::{Deserialize, Serialize};

/// Scout and year filter of the map.
///
/// `"All"` and the empty string normalize to no scout, so `("All", None)` is
/// the city-aggregate view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub scout: Option<String>,
    pub year: Option<Year>,
}

impl Selection {
    pub fn new(scout: Option<&str>, year: Option<Year>) -> Self {
        let scout = scout
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != ALL_SCOUTS)
            .map(str::to_string);
        Self { scout, year }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.scout.is_none() && self.year.is_none()
    }

    /// Scout name for display, `"All"` when unset.
    pub fn scout_label(&self) -> &str {
        self.scout.as_deref().unwrap_or(ALL_SCOUTS)
    }

    fn empty_message(&self) -> String {
        match (&self.scout, self.year) {
            (None, None) => "No recordings".to_string(),
            (Some(scout), None) => format!("No recordings for {scout}"),
            (None, Some(year)) => format!("No recordings for {year}"),
            (Some(scout), Some(year)) => format!("No recordings for {scout} in {year}"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// One point per city with citywide totals.
    Cities,
    /// One point per matching table row.
    Recordings,
}

/// One point on the map, either a city aggregate or a single recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRecord {
    pub city: String,
    pub country: String,
    pub location: GeoPoint,
    pub recording_count: u64,
    pub span: YearSpan,
    pub years: Vec<Year>,
    pub scouts: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub audio_clips: Vec<AudioClip>,
    pub recordings: Vec<RecordingId>,
}

impl MapRecord {
    pub fn from_city(city: &CityAggregate) -> Self {
        Self {
            city: city.city.clone(),
            country: city.country.clone(),
            location: city.location,
            recording_count: city.total_recordings,
            span: city.span(),
            years: city.years.iter().copied().collect(),
            scouts: city.scout_names.iter().cloned().collect(),
            start_date: None,
            end_date: None,
            audio_clips: city.audio_clips.clone(),
            recordings: city.recordings.clone(),
        }
    }

    pub fn from_recording(id: RecordingId, recording: &Recording) -> Self {
        Self {
            city: recording.city.clone(),
            country: recording.country.clone(),
            location: recording.location,
            recording_count: u64::from(recording.recording_count),
            span: recording.span,
            years: vec![recording.start_year()],
            scouts: recording.scouts.clone(),
            start_date: recording.start_date,
            end_date: recording.end_date,
            audio_clips: recording.audio_clip.iter().cloned().collect(),
            recordings: vec![id],
        }
    }

    pub fn is_empty_visit(&self) -> bool {
        self.recording_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSelection {
    pub selection: Selection,
    pub view: ViewKind,
    pub records: Vec<MapRecord>,
    /// Placeholder text when nothing matches.
    pub message: Option<String>,
}

impl MapSelection {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_recordings(&self) -> u64 {
        self.records.iter().map(|r| r.recording_count).sum()
    }
}

/// Four-way dispatch from `(scout, year)` to the points to draw.
///
/// City records follow city name order; recording records follow input order.
pub fn select(dataset: &Dataset, aggregates: &Aggregates, selection: &Selection) -> MapSelection {
    let (view, records): (ViewKind, Vec<MapRecord>) = match (&selection.scout, selection.year) {
        (None, None) => (
            ViewKind::Cities,
            aggregates.cities.values().map(MapRecord::from_city).collect(),
        ),
        (scout, year) => {
            let mut set = dataset.all();
            if let Some(scout) = scout {
                set = set.intersect(&dataset.with_scout(scout));
            }
            if let Some(year) = year {
                set = set.intersect(&dataset.active_in(year));
            }
            let records = dataset
                .resolve(&set)
                .map(|(id, r)| MapRecord::from_recording(id, r))
                .collect();
            (ViewKind::Recordings, records)
        }
    };

    let message = records
        .is_empty()
        .then(|| selection.empty_message());

    MapSelection {
        selection: selection.clone(),
        view,
        records,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::{MapRecord, Selection, ViewKind, select};
    use compute::aggregate;
    use dataset::{Dataset, RecordingId};
    use formats::Recording;
    use foundation::{GeoPoint, YearSpan};
    use pretty_assertions::assert_eq;

    fn rec(city: &str, count: u32, scouts: &[&str], start: i32, end: i32) -> Recording {
        Recording {
            span: YearSpan::new(start, end).unwrap(),
            start_date: None,
            end_date: None,
            country: "Peru".to_string(),
            city: city.to_string(),
            location: GeoPoint::new(-77.0, -12.0),
            scouts: scouts.iter().map(|s| s.to_string()).collect(),
            recording_count: count,
            audio_clip: None,
        }
    }

    fn fixture() -> Dataset {
        Dataset::new(vec![
            rec("Lima", 3, &["A", "B"], 1905, 1905),
            rec("Lima", 5, &["B"], 1907, 1908),
            rec("Cusco", 0, &["C"], 1902, 1906),
            rec("Arequipa", 2, &[" A "], 1910, 1910),
        ])
    }

    fn ids(records: &[MapRecord]) -> Vec<u32> {
        records.iter().flat_map(|r| r.recordings.iter().map(|id| id.0)).collect()
    }

    #[test]
    fn no_filter_returns_one_entry_per_city() {
        let ds = fixture();
        let agg = aggregate(&ds);
        let out = select(&ds, &agg, &Selection::all());
        assert_eq!(out.view, ViewKind::Cities);
        let cities: Vec<&str> = out.records.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Arequipa", "Cusco", "Lima"]);
        assert_eq!(out.records[2].recording_count, 8);
        assert_eq!(out.message, None);
    }

    #[test]
    fn all_is_the_unfiltered_view() {
        let ds = fixture();
        let agg = aggregate(&ds);
        let all = Selection::new(Some("All"), None);
        assert!(all.is_unfiltered());
        assert_eq!(
            select(&ds, &agg, &all).records,
            select(&ds, &agg, &Selection::all()).records
        );
        assert_eq!(Selection::new(Some("  "), Some(1905)), Selection::new(None, Some(1905)));
    }

    #[test]
    fn scout_filter_matches_trimmed_names() {
        let ds = fixture();
        let agg = aggregate(&ds);
        let b = select(&ds, &agg, &Selection::new(Some("B"), None));
        assert_eq!(b.view, ViewKind::Recordings);
        assert_eq!(ids(&b.records), vec![0, 1]);

        let a = select(&ds, &agg, &Selection::new(Some("A"), None));
        assert_eq!(ids(&a.records), vec![0, 3]);
        assert_eq!(a.records[0].city, "Lima");
    }

    #[test]
    fn year_filter_is_inclusive() {
        let ds = fixture();
        let agg = aggregate(&ds);
        let out = select(&ds, &agg, &Selection::new(Some("All"), Some(1905)));
        assert_eq!(ids(&out.records), vec![0, 2]);
        let out = select(&ds, &agg, &Selection::new(None, Some(1908)));
        assert_eq!(ids(&out.records), vec![1]);
    }

    #[test]
    fn scout_and_year_intersect() {
        let ds = fixture();
        let agg = aggregate(&ds);
        let out = select(&ds, &agg, &Selection::new(Some("B"), Some(1907)));
        assert_eq!(ids(&out.records), vec![1]);

        // The minimum year is not special.
        let out = select(&ds, &agg, &Selection::new(Some("B"), Some(1902)));
        assert!(out.is_empty());
        assert_eq!(out.message.as_deref(), Some("No recordings for B in 1902"));
    }

    #[test]
    fn recording_records_carry_row_details() {
        let ds = fixture();
        let agg = aggregate(&ds);
        let out = select(&ds, &agg, &Selection::new(Some("C"), None));
        let r = &out.records[0];
        assert!(r.is_empty_visit());
        assert_eq!(r.span, YearSpan::new(1902, 1906).unwrap());
        assert_eq!(r.years, vec![1902]);
        assert_eq!(r.recordings, vec![RecordingId(2)]);
        assert_eq!(out.total_recordings(), 0);
    }

    #[test]
    fn empty_messages_name_the_filter() {
        let ds = fixture();
        let agg = aggregate(&ds);
        let out = select(&ds, &agg, &Selection::new(Some("Nobody"), None));
        assert_eq!(out.message.as_deref(), Some("No recordings for Nobody"));
        let out = select(&ds, &agg, &Selection::new(None, Some(1850)));
        assert_eq!(out.message.as_deref(), Some("No recordings for 1850"));
        let empty = Dataset::default();
        let out = select(&empty, &aggregate(&empty), &Selection::all());
        assert_eq!(out.message.as_deref(), Some("No recordings"));
    }
}
