//! Text shown for a map point: hover tooltip and the click-through panel.

use chrono::NaiveDate;
use foundation::Year;
use serde::Serialize;

use crate::query::{MapRecord, Selection};

const DATE_FORMAT: &str = "%b %d, %Y";

pub fn tooltip(record: &MapRecord) -> String {
    format!("{}, {}", record.city, record.country)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioEntry {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub source_url: Option<String>,
    pub item_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataPanel {
    pub title: String,
    /// Count as text; `"Unknown"` for visits with nothing recorded.
    pub recordings: String,
    pub years: Vec<Year>,
    pub scouts: Vec<String>,
    /// Visit dates, only when a scout or a year is selected.
    pub dates: Option<String>,
    pub audio: Vec<AudioEntry>,
}

impl MetadataPanel {
    pub fn for_record(record: &MapRecord, selection: &Selection) -> Self {
        let recordings = if record.recording_count == 0 {
            "Unknown".to_string()
        } else {
            record.recording_count.to_string()
        };

        let dates = if selection.is_unfiltered() {
            None
        } else {
            visit_dates(record.start_date, record.end_date)
        };

        let audio = record
            .audio_clips
            .iter()
            .filter(|clip| clip.source_url.is_some() || clip.item_url.is_some())
            .map(|clip| AudioEntry {
                title: clip.title.clone(),
                creator: clip.creator.clone(),
                source_url: clip.source_url.clone(),
                item_url: clip.item_url.clone(),
            })
            .collect();

        Self {
            title: tooltip(record),
            recordings,
            years: record.years.clone(),
            scouts: record.scouts.clone(),
            dates,
            audio,
        }
    }

    /// Plain-text rendering, one field per line; empty fields are left out.
    pub fn lines(&self) -> Vec<String> {
        let mut out = vec![
            self.title.clone(),
            format!("Number of recordings: {}", self.recordings),
        ];
        if !self.years.is_empty() {
            let years: Vec<String> = self.years.iter().map(Year::to_string).collect();
            out.push(format!("Years: {}", years.join(", ")));
        }
        if !self.scouts.is_empty() {
            out.push(format!("Scouts: {}", self.scouts.join(", ")));
        }
        if let Some(dates) = &self.dates {
            out.push(format!("Dates of visit: {dates}"));
        }
        for entry in &self.audio {
            let label = entry.title.as_deref().unwrap_or("Audio");
            let link = entry
                .source_url
                .as_deref()
                .or(entry.item_url.as_deref())
                .unwrap_or_default();
            out.push(format!("{label}: {link}"));
        }
        out
    }
}

fn visit_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    let start = start?;
    let end = end.unwrap_or(start);
    Some(format!(
        "{} - {}",
        start.format(DATE_FORMAT),
        end.format(DATE_FORMAT)
    ))
}
