use std::collections::BTreeMap;

use formats::Recording;
use foundation::Year;
use tracing::debug;

use crate::ids::RecordingId;
use crate::selection::SelectionSet;
use crate::temporal::{IntervalItem, IntervalTree};

/// Immutable recording table with scout and year indexes.
///
/// Ids are dense and follow input order, so every query result that is
/// ordered by id is also in source order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    recordings: Vec<Recording>,
    by_scout: BTreeMap<String, SelectionSet>,
    by_year: IntervalTree,
}

impl Dataset {
    pub fn new(recordings: Vec<Recording>) -> Self {
        let mut by_scout: BTreeMap<String, SelectionSet> = BTreeMap::new();
        let mut spans = Vec::with_capacity(recordings.len());

        for (idx, recording) in recordings.iter().enumerate() {
            let id = RecordingId(idx as u32);
            for scout in &recording.scouts {
                let name = scout.trim();
                if name.is_empty() {
                    continue;
                }
                by_scout.entry(name.to_string()).or_default().insert(id);
            }
            spans.push(IntervalItem {
                id,
                span: recording.span,
            });
        }

        debug!(
            "indexed {} recordings across {} scouts",
            recordings.len(),
            by_scout.len()
        );

        Self {
            recordings,
            by_scout,
            by_year: IntervalTree::build(spans),
        }
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    pub fn get(&self, id: RecordingId) -> Option<&Recording> {
        self.recordings.get(id.index() as usize)
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    pub fn iter(&self) -> impl Iterator<Item = (RecordingId, &Recording)> {
        self.recordings
            .iter()
            .enumerate()
            .map(|(idx, r)| (RecordingId(idx as u32), r))
    }

    pub fn all(&self) -> SelectionSet {
        SelectionSet::full(self.recordings.len() as u32)
    }

    /// Recordings whose trimmed scout list contains `name` exactly.
    pub fn with_scout(&self, name: &str) -> SelectionSet {
        self.by_scout.get(name.trim()).cloned().unwrap_or_default()
    }

    /// Recordings whose inclusive year span contains `year`.
    pub fn active_in(&self, year: Year) -> SelectionSet {
        self.by_year.active_in(year).into_iter().collect()
    }

    /// Distinct scout names, sorted.
    pub fn scouts(&self) -> impl Iterator<Item = &str> {
        self.by_scout.keys().map(String::as_str)
    }

    /// The returned records borrow only the dataset, so `selection` may be a
    /// temporary.
    pub fn resolve<'a, 's>(
        &'a self,
        selection: &'s SelectionSet,
    ) -> impl Iterator<Item = (RecordingId, &'a Recording)> + 's
    where
        'a: 's,
    {
        selection
            .iter()
            .filter_map(move |id| self.get(id).map(|r| (id, r)))
    }
}
