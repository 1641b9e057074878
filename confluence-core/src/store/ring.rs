use crate::domain::Bar;

/// Fixed-capacity FIFO of closed bars.
///
/// Storage never grows past `capacity`: once full, each push overwrites the
/// slot at `head` (the oldest bar) and advances it.
#[derive(Clone, Debug)]
pub(crate) struct BarRing {
    buffer: Vec<Bar>,
    head: usize,
    capacity: usize,
}

impl BarRing {
    /// A requested capacity of zero is raised to one.
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append at the tail, returning the evicted oldest bar once full.
    pub(crate) fn push(&mut self, bar: Bar) -> Option<Bar> {
        if self.is_full() {
            let old = std::mem::replace(&mut self.buffer[self.head], bar);
            self.head += 1;
            if self.head == self.capacity {
                self.head = 0;
            }
            Some(old)
        } else {
            self.buffer.push(bar);
            None
        }
    }

    /// Most recently pushed bar.
    pub(crate) fn latest(&self) -> Option<&Bar> {
        if self.buffer.is_empty() {
            return None;
        }
        let tail = if self.head == 0 {
            self.buffer.len() - 1
        } else {
            self.head - 1
        };
        self.buffer.get(tail)
    }

    /// Bars oldest-first.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Bar> {
        let (newer, older) = self.buffer.split_at(self.head);
        older.iter().chain(newer.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::BarRing;
    use crate::domain::bar::test_bar;
    use crate::domain::Resolution;

    fn bar(close: f64) -> crate::domain::Bar {
        test_bar(Resolution::Micro, close as i64, close, close + 1.0, close - 1.0, close, 10.0)
    }

    fn closes(ring: &BarRing) -> Vec<f64> {
        ring.iter().map(|b| b.close).collect()
    }

    #[test]
    fn filling_returns_none() {
        let mut rb = BarRing::new(3);
        assert_eq!(rb.push(bar(1.0)), None);
        assert_eq!(rb.push(bar(2.0)), None);
        assert_eq!(rb.push(bar(3.0)), None);
        assert!(rb.is_full());
        assert_eq!(closes(&rb), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn full_evicts_oldest() {
        let mut rb = BarRing::new(3);
        rb.push(bar(1.0));
        rb.push(bar(2.0));
        rb.push(bar(3.0));
        assert_eq!(rb.push(bar(4.0)).map(|b| b.close), Some(1.0));
        assert_eq!(rb.push(bar(5.0)).map(|b| b.close), Some(2.0));
        assert_eq!(closes(&rb), vec![3.0, 4.0, 5.0]);
        assert_eq!(rb.len(), 3);
    }

    #[test]
    fn latest_tracks_tail_across_wrap() {
        let mut rb = BarRing::new(2);
        assert!(rb.latest().is_none());
        rb.push(bar(1.0));
        assert_eq!(rb.latest().map(|b| b.close), Some(1.0));
        rb.push(bar(2.0));
        rb.push(bar(3.0)); // head wraps to 1
        assert_eq!(rb.latest().map(|b| b.close), Some(3.0));
        rb.push(bar(4.0)); // head wraps to 0
        assert_eq!(rb.latest().map(|b| b.close), Some(4.0));
        assert_eq!(closes(&rb), vec![3.0, 4.0]);
    }

    #[test]
    fn capacity_one() {
        let mut rb = BarRing::new(1);
        assert_eq!(rb.push(bar(1.0)), None);
        assert!(rb.is_full());
        assert_eq!(rb.push(bar(2.0)).map(|b| b.close), Some(1.0));
        assert_eq!(closes(&rb), vec![2.0]);
        assert_eq!(rb.capacity(), 1);
    }

    #[test]
    fn zero_capacity_holds_one_bar() {
        let mut rb = BarRing::new(0);
        assert_eq!(rb.capacity(), 1);
        assert_eq!(rb.push(bar(1.0)), None);
        assert_eq!(rb.push(bar(2.0)).map(|b| b.close), Some(1.0));
        assert_eq!(closes(&rb), vec![2.0]);
    }
}
