use crate::ids::RecordingId;

/// Set of recordings backed by a bitset.
///
/// Ordering contract:
/// - Iteration yields ids in ascending order, i.e. input order of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    words: Vec<u64>,
    len: usize,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every id below `len`.
    pub fn full(len: u32) -> Self {
        let mut s = Self::default();
        if len == 0 {
            return s;
        }
        s.ensure_capacity(len - 1);
        let (last_word, last_bit) = word_bit(len - 1);
        for w in &mut s.words[..last_word] {
            *w = u64::MAX;
        }
        s.words[last_word] = if last_bit == 63 {
            u64::MAX
        } else {
            (1u64 << (last_bit + 1)) - 1
        };
        s.len = len as usize;
        s
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: RecordingId) -> bool {
        let (word, bit) = word_bit(id.index());
        self.words
            .get(word)
            .is_some_and(|w| (w & (1u64 << bit)) != 0)
    }

    /// Returns `true` if the set changed.
    pub fn insert(&mut self, id: RecordingId) -> bool {
        self.ensure_capacity(id.index());
        let (word, bit) = word_bit(id.index());
        let mask = 1u64 << bit;
        let w = &mut self.words[word];
        if (*w & mask) != 0 {
            return false;
        }
        *w |= mask;
        self.len += 1;
        true
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let words: Vec<u64> = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a & b)
            .collect();
        let mut out = Self { words, len: 0 };
        out.recount_len();
        out
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = RecordingId> + '_ {
        SelectionIter {
            words: &self.words,
            word_index: 0,
            current_word: 0,
            base_index: 0,
        }
    }

    fn ensure_capacity(&mut self, index: u32) {
        let (word, _bit) = word_bit(index);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
    }

    fn recount_len(&mut self) {
        self.len = self.words.iter().map(|w| w.count_ones() as usize).sum();
    }
}

impl FromIterator<RecordingId> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = RecordingId>>(iter: T) -> Self {
        let mut s = Self::new();
        for id in iter {
            s.insert(id);
        }
        s
    }
}

fn word_bit(index: u32) -> (usize, u32) {
    ((index / 64) as usize, index % 64)
}

struct SelectionIter<'a> {
    words: &'a [u64],
    word_index: usize,
    current_word: u64,
    base_index: u32,
}

impl Iterator for SelectionIter<'_> {
    type Item = RecordingId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let tz = self.current_word.trailing_zeros();
                self.current_word &= !(1u64 << tz);
                return Some(RecordingId(self.base_index + tz));
            }

            let w = *self.words.get(self.word_index)?;
            self.current_word = w;
            self.base_index = (self.word_index as u32) * 64;
            self.word_index += 1;
        }
    }
}
