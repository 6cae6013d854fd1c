use foundation::{Year, YearSpan};
use serde::Serialize;
use tracing::debug;

use crate::event_bus::{Event, EventBus, TimelineEvent};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    Paused,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    #[error("year {year} is outside {bounds}")]
    OutOfRange { year: Year, bounds: YearSpan },
    #[error("cannot reset while playing")]
    ResetWhilePlaying,
    #[error("dataset has no years")]
    NoYears,
}

/// Year slider with play/pause.
///
/// `year == None` means the whole range is shown. Playback advances one year
/// per tick and stops on the last year.
#[derive(Debug, Clone)]
pub struct Timeline {
    bounds: YearSpan,
    year: Option<Year>,
    state: PlayState,
    bus: EventBus,
}

impl Timeline {
    pub fn new(bounds: YearSpan) -> Self {
        Self {
            bounds,
            year: None,
            state: PlayState::Paused,
            bus: EventBus::new(),
        }
    }

    pub fn from_bounds(bounds: Option<YearSpan>) -> Result<Self, TimelineError> {
        bounds.map(Self::new).ok_or(TimelineError::NoYears)
    }

    pub fn bounds(&self) -> YearSpan {
        self.bounds
    }

    pub fn year(&self) -> Option<Year> {
        self.year
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// `"1902-1926"` for the whole range, otherwise the selected year.
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => year.to_string(),
            None => format!("{}-{}", self.bounds.start, self.bounds.end),
        }
    }

    /// Reset is offered only while paused.
    pub fn can_reset(&self) -> bool {
        !self.is_playing()
    }

    pub fn play(&mut self) {
        if self.is_playing() {
            return;
        }
        self.state = PlayState::Playing;
        self.bus.emit(TimelineEvent::Played);
    }

    /// No-op when already paused.
    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.state = PlayState::Paused;
        self.bus.emit(TimelineEvent::Paused);
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Advances playback by one year. Does nothing while paused.
    pub fn tick(&mut self) {
        if !self.is_playing() {
            return;
        }
        let next = match self.year {
            None => Some(self.bounds.start),
            Some(year) if year < self.bounds.end => Some(year + 1),
            Some(_) => None,
        };
        if let Some(year) = next {
            self.year = Some(year);
            self.bus.emit(TimelineEvent::YearChanged(year));
            debug!("timeline at {year}");
        }
        if self.year == Some(self.bounds.end) {
            self.state = PlayState::Paused;
            self.bus.emit(TimelineEvent::Finished);
        }
    }

    pub fn set_year(&mut self, year: Year) -> Result<(), TimelineError> {
        if !self.bounds.contains(year) {
            return Err(TimelineError::OutOfRange {
                year,
                bounds: self.bounds,
            });
        }
        if self.year != Some(year) {
            self.year = Some(year);
            self.bus.emit(TimelineEvent::YearChanged(year));
        }
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), TimelineError> {
        if self.is_playing() {
            return Err(TimelineError::ResetWhilePlaying);
        }
        self.year = None;
        self.bus.emit(TimelineEvent::Reset);
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        self.bus.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }
}
