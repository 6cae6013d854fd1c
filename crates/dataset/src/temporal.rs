use foundation::{Year, YearSpan};

use crate::ids::RecordingId;

/// Centered interval tree over the active years of recordings.
///
/// Ordering contract:
/// - `active_in` and `overlapping` return ids in ascending order.
#[derive(Debug, Clone, Default)]
pub struct IntervalTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
struct Node {
    center: Year,
    items: Vec<IntervalItem>,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IntervalItem {
    pub id: RecordingId,
    pub span: YearSpan,
}

impl IntervalTree {
    pub fn build(items: Vec<IntervalItem>) -> Self {
        let mut nodes = Vec::new();
        if !items.is_empty() {
            build_node(&mut nodes, items);
        }
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recordings whose inclusive span contains `year`.
    pub fn active_in(&self, year: Year) -> Vec<RecordingId> {
        self.overlapping(YearSpan::instant(year))
    }

    pub fn overlapping(&self, span: YearSpan) -> Vec<RecordingId> {
        if self.nodes.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        query(&self.nodes, 0, span, &mut hits);
        hits.sort_unstable();
        hits.dedup();
        hits
    }
}

fn build_node(nodes: &mut Vec<Node>, items: Vec<IntervalItem>) -> usize {
    let center = choose_center(&items);

    let mut left_items = Vec::new();
    let mut right_items = Vec::new();
    let mut here = Vec::new();

    for item in items {
        if item.span.end < center {
            left_items.push(item);
        } else if item.span.start > center {
            right_items.push(item);
        } else {
            here.push(item);
        }
    }

    here.sort_by_key(|item| (item.span.start, item.span.end, item.id));

    let idx = nodes.len();
    nodes.push(Node {
        center,
        items: here,
        left: None,
        right: None,
    });

    if !left_items.is_empty() {
        let child = build_node(nodes, left_items);
        nodes[idx].left = Some(child);
    }
    if !right_items.is_empty() {
        let child = build_node(nodes, right_items);
        nodes[idx].right = Some(child);
    }

    idx
}

/// Median endpoint; always lies inside at least one item's span.
fn choose_center(items: &[IntervalItem]) -> Year {
    let mut endpoints: Vec<Year> = items
        .iter()
        .flat_map(|item| [item.span.start, item.span.end])
        .collect();
    endpoints.sort_unstable();
    endpoints[endpoints.len() / 2]
}

fn query(nodes: &[Node], idx: usize, span: YearSpan, out: &mut Vec<RecordingId>) {
    let node = &nodes[idx];

    out.extend(
        node.items
            .iter()
            .filter(|item| item.span.overlaps(span))
            .map(|item| item.id),
    );

    if span.start < node.center
        && let Some(left) = node.left
    {
        query(nodes, left, span, out);
    }
    if span.end > node.center
        && let Some(right) = node.right
    {
        query(nodes, right, span, out);
    }
}

#[cfg(test)]
mod tests {
    use super::{IntervalItem, IntervalTree};
    use crate::ids::RecordingId;
    use foundation::YearSpan;

    fn item(id: u32, start: i32, end: i32) -> IntervalItem {
        IntervalItem {
            id: RecordingId(id),
            span: YearSpan::new(start, end).unwrap(),
        }
    }

    #[test]
    fn active_in_is_inclusive_and_sorted() {
        let tree = IntervalTree::build(vec![
            item(3, 1900, 1910),
            item(1, 1905, 1906),
            item(2, 1899, 1901),
            item(0, 1910, 1910),
        ]);
        assert_eq!(tree.active_in(1905), vec![RecordingId(1), RecordingId(3)]);
        assert_eq!(tree.active_in(1910), vec![RecordingId(0), RecordingId(3)]);
        assert_eq!(tree.active_in(1901), vec![RecordingId(2), RecordingId(3)]);
        assert!(tree.active_in(1911).is_empty());
    }

    #[test]
    fn results_do_not_depend_on_build_order() {
        let a = vec![item(1, 1900, 1901), item(2, 1902, 1903), item(3, 1904, 1905)];
        let mut b = a.clone();
        b.reverse();

        let span = YearSpan::new(1903, 1904).unwrap();
        let ha = IntervalTree::build(a).overlapping(span);
        let hb = IntervalTree::build(b).overlapping(span);
        assert_eq!(ha, hb);
        assert_eq!(ha, vec![RecordingId(2), RecordingId(3)]);
    }

    #[test]
    fn brute_force_agreement() {
        let items: Vec<IntervalItem> = (0..40)
            .map(|i| {
                let start = 1890 + (i * 7) % 25;
                item(i as u32, start, start + (i % 5))
            })
            .collect();
        let tree = IntervalTree::build(items.clone());
        for year in 1885..1925 {
            let expected: Vec<RecordingId> = items
                .iter()
                .filter(|it| it.span.contains(year))
                .map(|it| it.id)
                .collect();
            assert_eq!(tree.active_in(year), expected, "year {year}");
        }
    }

    #[test]
    fn empty_tree() {
        let tree = IntervalTree::build(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.active_in(1900).is_empty());
    }
}
