use serde::Serialize;

use foundation::Year;

/// Something observable that happened to a timeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "year", rename_all = "snake_case")]
pub enum TimelineEvent {
    Played,
    Paused,
    YearChanged(Year),
    /// Playback reached the last year and stopped there.
    Finished,
    /// The year selection was cleared back to the whole range.
    Reset,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Emission order, starting at 0.
    pub seq: u64,
    pub kind: TimelineEvent,
}

#[derive(Debug, Default, Clone)]
pub struct EventBus {
    next_seq: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, kind: TimelineEvent) {
        self.events.push(Event {
            seq: self.next_seq,
            kind,
        });
        self.next_seq += 1;
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
