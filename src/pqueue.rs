use std::collections::VecDeque;

/// A bucketed priority queue which supports O(1) pop-min for small integer
/// priorities. Priorities must lie within the range given at construction.
/// Items of equal priority come out in insertion order.
pub struct PriorityQueue<T> {
    buckets: Vec<VecDeque<T>>,
    bitmap: Vec<u64>,
    summary: Vec<u64>,
}

impl<T> PriorityQueue<T> {
    /// Queue accepting priorities in `0..num_buckets`.
    pub fn new(num_buckets: usize) -> Self {
        let num_words = num_buckets.div_ceil(64);
        Self {
            buckets: (0..num_buckets).map(|_| VecDeque::new()).collect(),
            bitmap: vec![0; num_words],
            summary: vec![0; num_words.div_ceil(64)],
        }
    }

    pub fn push(&mut self, priority: usize, item: T) {
        assert!(
            priority < self.buckets.len(),
            "priority must be < {}",
            self.buckets.len()
        );
        self.buckets[priority].push_back(item);

        let word_idx = priority / 64;
        self.bitmap[word_idx] |= 1u64 << (priority % 64);
        self.summary[word_idx / 64] |= 1u64 << (word_idx % 64);
    }

    pub fn pop_min(&mut self) -> Option<T> {
        // First non-empty word, then first non-empty bucket in it
        let (summary_idx, summary) = self
            .summary
            .iter()
            .enumerate()
            .find(|&(_, &word)| word != 0)?;
        let word_idx = summary_idx * 64 + summary.trailing_zeros() as usize;
        let bit_idx = self.bitmap[word_idx].trailing_zeros() as usize;
        let priority = word_idx * 64 + bit_idx;

        let item = self.buckets[priority].pop_front()?;

        if self.buckets[priority].is_empty() {
            self.bitmap[word_idx] &= !(1u64 << bit_idx);
            if self.bitmap[word_idx] == 0 {
                self.summary[summary_idx] &= !(1u64 << (word_idx % 64));
            }
        }

        Some(item)
    }
}
