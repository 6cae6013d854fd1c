use std::collections::BTreeMap;

use foundation::{Year, YearSpan};

pub struct TemporalAnalysis;

impl TemporalAnalysis {
    /// Smallest span covering every input span.
    pub fn bounds(spans: impl IntoIterator<Item = YearSpan>) -> Option<YearSpan> {
        spans.into_iter().reduce(|acc, s| acc.union(s))
    }

    /// Number of spans active in each year of `bounds`, zeros included.
    pub fn activity(spans: impl IntoIterator<Item = YearSpan>, bounds: YearSpan) -> BTreeMap<Year, usize> {
        let mut out: BTreeMap<Year, usize> = bounds.years().map(|y| (y, 0)).collect();
        for span in spans {
            for year in span.years() {
                if let Some(n) = out.get_mut(&year) {
                    *n += 1;
                }
            }
        }
        out
    }
}
