//! Recordings table parsing.
//!
//! One CSV row describes one visit of one or more scouts to a city, with the
//! number of audio recordings captured there. Rows that fail validation are
//! skipped and reported; they never reach the aggregates as NaN or zero.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use foundation::{GeoPoint, Year, YearSpan};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DatasetError, ErrorKind, RowError};

/// Columns every recordings table must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = ["city", "country", "lat", "lon", "scouts", "recordings"];

/// Scout names in the `scouts` column are separated by this character.
pub const SCOUT_DELIMITER: char = ';';

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Archive metadata for an audio clip made during a visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClip {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub item_url: Option<String>,
    pub source_url: Option<String>,
    pub year: Option<Year>,
}

/// One validated source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub span: YearSpan,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub country: String,
    pub city: String,
    pub location: GeoPoint,
    pub scouts: Vec<String>,
    /// `0` means the city was visited but nothing was recorded.
    pub recording_count: u32,
    pub audio_clip: Option<AudioClip>,
}

impl Recording {
    pub fn start_year(&self) -> Year {
        self.span.start
    }

    pub fn end_year(&self) -> Year {
        self.span.end
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParseReport {
    pub recordings: Vec<Recording>,
    pub rejected: Vec<RowError>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    fn reject(&mut self, err: RowError) {
        warn!("skipping row: {err}");
        self.rejected.push(err);
    }
}

pub fn load_recordings(path: &Path) -> Result<ParseReport, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_recordings(file)
}

/// Parses a recordings table with a header row.
///
/// Missing required columns fail the whole table. Everything else is decided
/// per row: a bad row lands in [`ParseReport::rejected`] and parsing goes on.
pub fn parse_recordings<R: Read>(reader: R) -> Result<ParseReport, DatasetError> {
    let mut csv = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = csv.headers()?.clone();
    check_columns(&headers)?;

    let mut report = ParseReport::default();
    for result in csv.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(DatasetError::Csv(err)),
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or(0);
                report.reject(RowError::new(
                    line,
                    ErrorKind::Unreadable {
                        reason: err.to_string(),
                    },
                ));
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw: RawRow = match record.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(err) => {
                report.reject(RowError::new(
                    line,
                    ErrorKind::Unreadable {
                        reason: err.to_string(),
                    },
                ));
                continue;
            }
        };

        match raw.into_recording() {
            Ok(recording) => report.recordings.push(recording),
            Err(kind) => report.reject(RowError::new(line, kind)),
        }
    }

    debug!(
        "parsed {} recordings, rejected {} rows",
        report.recordings.len(),
        report.rejected.len()
    );
    Ok(report)
}

fn check_columns(headers: &StringRecord) -> Result<(), DatasetError> {
    let has = |name: &str| headers.iter().any(|h| h == name);
    for column in REQUIRED_COLUMNS {
        if !has(column) {
            return Err(DatasetError::MissingColumn(column));
        }
    }
    if !has("start_date") && !has("year") {
        return Err(DatasetError::MissingColumn("start_date"));
    }
    Ok(())
}

/// Splits the delimited scout field. Blank tokens are dropped.
pub fn split_scouts(field: &str) -> Vec<String> {
    field
        .split(SCOUT_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRow {
    start_date: String,
    end_date: String,
    year: String,
    country: String,
    city: String,
    lat: String,
    lon: String,
    scouts: String,
    recordings: String,
    recordings_url: String,
    omeka_title: String,
    omeka_creator: String,
    omeka_item_url: String,
    omeka_item_year: String,
}

impl RawRow {
    fn into_recording(self) -> Result<Recording, ErrorKind> {
        if self.city.is_empty() {
            return Err(ErrorKind::MissingField { field: "city" });
        }

        let start = if !self.start_date.is_empty() {
            year_prefix("start_date", &self.start_date)?
        } else if !self.year.is_empty() {
            year_prefix("year", &self.year)?
        } else {
            return Err(ErrorKind::MissingField { field: "year" });
        };
        let end = if !self.end_date.is_empty() {
            year_prefix("end_date", &self.end_date)?
        } else if !self.year.is_empty() {
            year_prefix("year", &self.year)?
        } else {
            start
        };
        let span = YearSpan::new(start, end).ok_or_else(|| ErrorKind::MalformedRow {
            field: "end_date",
            value: format!("{end} is before {start}"),
        })?;

        let lat = parse_coordinate("lat", &self.lat, 90.0)?;
        let lon = parse_coordinate("lon", &self.lon, 180.0)?;

        if self.recordings.is_empty() {
            return Err(ErrorKind::MissingField {
                field: "recordings",
            });
        }
        let recording_count =
            self.recordings
                .parse::<u32>()
                .map_err(|_| ErrorKind::MalformedRow {
                    field: "recordings",
                    value: self.recordings.clone(),
                })?;

        let audio_clip = self.audio_clip()?;

        Ok(Recording {
            span,
            start_date: parse_date(&self.start_date),
            end_date: parse_date(&self.end_date),
            country: self.country,
            city: self.city,
            location: GeoPoint::new(lon, lat),
            scouts: split_scouts(&self.scouts),
            recording_count,
            audio_clip,
        })
    }

    fn audio_clip(&self) -> Result<Option<AudioClip>, ErrorKind> {
        let year = match self.omeka_item_year.as_str() {
            "" => None,
            v => Some(year_prefix("omeka_item_year", v)?),
        };
        let clip = AudioClip {
            title: non_empty(&self.omeka_title),
            creator: non_empty(&self.omeka_creator),
            item_url: non_empty(&self.omeka_item_url),
            source_url: non_empty(&self.recordings_url),
            year,
        };
        if clip == AudioClip::default() {
            return Ok(None);
        }
        Ok(Some(clip))
    }
}

/// Year from the first four characters of a date or bare year field.
fn year_prefix(field: &'static str, value: &str) -> Result<Year, ErrorKind> {
    let malformed = || ErrorKind::MalformedRow {
        field,
        value: value.to_string(),
    };
    let prefix = value.get(..4).ok_or_else(malformed)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    prefix.parse::<Year>().map_err(|_| malformed())
}

fn parse_coordinate(field: &'static str, value: &str, limit: f64) -> Result<f64, ErrorKind> {
    if value.is_empty() {
        return Err(ErrorKind::MissingField { field });
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() <= limit => Ok(v),
        _ => Err(ErrorKind::MalformedRow {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
