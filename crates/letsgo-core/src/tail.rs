//! # Bounded Tail
//!
//! Fixed-capacity FIFO that keeps only the most recent items pushed into it.
//! Memory stays O(capacity) no matter how many items flow through.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct BoundedTail<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedTail<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            // Capacity comes from user input; don't preallocate huge limits
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Push an item, evicting the oldest one when full.
    /// A zero-capacity tail drops everything.
    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained items, oldest first
    pub fn into_vec(self) -> Vec<T> {
        self.items.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_last_items_in_order() {
        let mut tail = BoundedTail::new(3);
        for i in 0..10 {
            tail.push(i);
        }
        assert_eq!(tail.into_vec(), vec![7, 8, 9]);
    }

    #[test]
    fn test_under_capacity() {
        let mut tail = BoundedTail::new(5);
        tail.push("a");
        tail.push("b");
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.into_vec(), vec!["a", "b"]);
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let mut tail = BoundedTail::new(0);
        tail.push(1);
        tail.push(2);
        assert!(tail.is_empty());
    }

    #[test]
    fn test_peak_never_exceeds_capacity() {
        let mut tail = BoundedTail::new(7);
        let mut peak = 0;
        for i in 0..250_000u32 {
            tail.push(i);
            peak = peak.max(tail.len());
        }
        assert_eq!(peak, 7);
        assert_eq!(tail.capacity(), 7);
    }
}
