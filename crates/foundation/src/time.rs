use serde::{Deserialize, Serialize};

/// Calendar year.
pub type Year = i32;

/// Inclusive range of calendar years.
///
/// A span whose `start` is greater than its `end` cannot be constructed
/// through [`YearSpan::new`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearSpan {
    pub start: Year,
    pub end: Year,
}

impl YearSpan {
    pub fn new(start: Year, end: Year) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn instant(year: Year) -> Self {
        Self {
            start: year,
            end: year,
        }
    }

    pub fn contains(&self, year: Year) -> bool {
        year >= self.start && year <= self.end
    }

    pub fn overlaps(&self, other: YearSpan) -> bool {
        !(self.end < other.start || other.end < self.start)
    }

    /// Smallest span covering both.
    pub fn union(&self, other: YearSpan) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Number of years covered, counting both endpoints.
    pub fn len(&self) -> u32 {
        self.start.abs_diff(self.end) + 1
    }

    pub fn years(&self) -> impl Iterator<Item = Year> {
        self.start..=self.end
    }
}

impl std::fmt::Display for YearSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}
