//! Weighted waiting list backing the [`AdmissionPool`](crate::AdmissionPool).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A max-ordered queue of items keyed by an `f64` weight.
///
/// Both [`insert`](Self::insert) and [`extract_max`](Self::extract_max) run
/// in `O(log n)`. Weights are compared with [`f64::total_cmp`], so a `NaN`
/// weight sorts above every other value instead of corrupting the heap.
///
/// Items with equal weights come out in insertion order (FIFO).
///
/// # Examples
///
/// ```
/// use backcheck_asyncutils::PriorityQueue;
///
/// let mut queue = PriorityQueue::new();
/// queue.insert(10.0, "small");
/// queue.insert(1000.0, "large");
/// queue.insert(50.0, "medium");
/// assert_eq!(queue.extract_max(), Some("large"));
/// assert_eq!(queue.extract_max(), Some("medium"));
/// assert_eq!(queue.extract_max(), Some("small"));
/// assert_eq!(queue.extract_max(), None);
/// ```
#[derive(Debug)]
pub struct PriorityQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    inserted: u64,
}

#[derive(Debug)]
struct Entry<T> {
    weight: f64,
    sequence: u64,
    item: T,
}
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earlier insertions win ties, so the lower sequence is "greater".
        self.weight.total_cmp(&other.weight).then_with(|| other.sequence.cmp(&self.sequence))
    }
}
impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl<T> Eq for Entry<T> {}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new(), inserted: 0 }
    }

    pub fn insert(&mut self, weight: f64, item: T) {
        let sequence = self.inserted;
        self.inserted = self.inserted.wrapping_add(1);
        self.heap.push(Entry { weight, sequence, item });
    }

    /// Remove and return the item with the highest weight.
    pub fn extract_max(&mut self) -> Option<T> {
        self.heap.pop().map(|entry| entry.item)
    }

    /// Weight of the item [`extract_max`](Self::extract_max) would return next.
    pub fn peek_weight(&self) -> Option<f64> {
        self.heap.peek().map(|entry| entry.weight)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn drain<T>(queue: &mut PriorityQueue<T>) -> Vec<T> {
        std::iter::from_fn(|| queue.extract_max()).collect()
    }

    #[rstest]
    #[case(vec![10.0, 1000.0, 50.0], vec![1000.0, 50.0, 10.0])]
    #[case(vec![1.0, 2.0, 3.0, 4.0], vec![4.0, 3.0, 2.0, 1.0])]
    #[case(vec![4.0, 3.0, 2.0, 1.0], vec![4.0, 3.0, 2.0, 1.0])]
    #[case(vec![0.5, -1.0, 7.25, 0.0], vec![7.25, 0.5, 0.0, -1.0])]
    fn test_extracts_by_descending_weight(#[case] weights: Vec<f64>, #[case] expected: Vec<f64>) {
        let mut queue = PriorityQueue::new();
        for weight in weights {
            queue.insert(weight, weight);
        }
        assert_eq!(drain(&mut queue), expected);
    }

    #[test]
    fn test_equal_weights_are_fifo() {
        let mut queue = PriorityQueue::new();
        queue.insert(5.0, "first");
        queue.insert(5.0, "second");
        queue.insert(9.0, "heavy");
        queue.insert(5.0, "third");
        assert_eq!(drain(&mut queue), vec!["heavy", "first", "second", "third"]);
    }

    #[test]
    fn test_len_and_is_empty() {
        let mut queue = PriorityQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        queue.insert(1.0, ());
        queue.insert(2.0, ());
        assert!(!queue.is_empty());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek_weight(), Some(2.0));
        queue.extract_max();
        queue.extract_max();
        assert!(queue.is_empty());
        assert_eq!(queue.extract_max(), None);
    }

    #[test]
    fn test_nan_does_not_corrupt_ordering() {
        let mut queue = PriorityQueue::new();
        queue.insert(1.0, "one");
        queue.insert(f64::NAN, "nan");
        queue.insert(3.0, "three");
        assert_eq!(drain(&mut queue), vec!["nan", "three", "one"]);
    }

    #[test]
    fn test_interleaved_insert_and_extract() {
        let mut queue = PriorityQueue::new();
        queue.insert(10.0, 10);
        queue.insert(30.0, 30);
        assert_eq!(queue.extract_max(), Some(30));
        queue.insert(20.0, 20);
        queue.insert(5.0, 5);
        assert_eq!(drain(&mut queue), vec![20, 10, 5]);
    }
}
