use std::{cmp::Ordering, ops::Range};

/// Binary max-heap with a fixed capacity. Once full, an item only gets in
/// by displacing the largest one.
pub(crate) struct BoundedHeap<T>
where
    T: Copy + PartialOrd,
{
    items: Vec<T>,
    capacity: usize,
}

fn parent(index: usize) -> Option<usize> {
    if index > 0 {
        Some((index - 1) >> 1)
    } else {
        None
    }
}

fn children(index: usize) -> Range<usize> {
    let off = index << 1;
    (off + 1)..(off + 3)
}

impl<T> BoundedHeap<T>
where
    T: Copy + PartialOrd,
{
    pub fn new(capacity: usize) -> Self {
        BoundedHeap {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// The largest item.
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    fn sift_up(&mut self, index: usize) {
        let item = self.items[index];
        let mut index = index;
        while let Some(pi) = parent(index) {
            if let Some(Ordering::Less) = self.items[pi].partial_cmp(&item) {
                self.items[index] = self.items[pi];
                index = pi;
            } else {
                break;
            }
        }
        self.items[index] = item;
    }

    fn sift_down(&mut self, index: usize) {
        let item = self.items[index];
        let mut index = index;
        loop {
            // Largest child.
            let child = children(index)
                .filter(|ci| *ci < self.items.len())
                .fold(None, |best: Option<usize>, ci| match best {
                    Some(b) if self.items[ci].partial_cmp(&self.items[b]) != Some(Ordering::Greater) => {
                        Some(b)
                    }
                    _ => Some(ci),
                });
            match child {
                Some(ci) if item.partial_cmp(&self.items[ci]) == Some(Ordering::Less) => {
                    self.items[index] = self.items[ci];
                    index = ci;
                }
                _ => break,
            }
        }
        self.items[index] = item;
    }

    /// Offer an item to the heap. Returns `false` if the heap is full and
    /// the item is not smaller than the largest item.
    pub fn offer(&mut self, val: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if !self.is_full() {
            self.items.push(val);
            self.sift_up(self.items.len() - 1);
            return true;
        }
        match val.partial_cmp(&self.items[0]) {
            Some(Ordering::Less) => {
                self.items[0] = val;
                self.sift_down(0);
                true
            }
            _ => false,
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        let last = self.items.pop()?;
        if self.items.is_empty() {
            return Some(last);
        }
        let top = std::mem::replace(&mut self.items[0], last);
        self.sift_down(0);
        Some(top)
    }

    /// Consume the heap, producing the items smallest first.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.items.len());
        while let Some(item) = self.pop() {
            out.push(item);
        }
        out.reverse();
        out
    }
}

#[cfg(test)]
mod test {
    use super::BoundedHeap;

    #[test]
    fn t_heap_order() {
        let mut heap = BoundedHeap::new(16);
        for i in [8, 1, 5, 3, 9, 2, 6, 4, 7, 0] {
            assert!(heap.offer(i));
        }
        assert_eq!(heap.peek(), Some(&9));
        let mut popped = Vec::new();
        while let Some(i) = heap.pop() {
            popped.push(i);
        }
        assert_eq!(popped, (0..10).rev().collect::<Vec<_>>());
    }

    #[test]
    fn t_heap_bounded() {
        let mut heap = BoundedHeap::new(3);
        for i in [8, 1, 5, 3, 9, 2, 6] {
            heap.offer(i);
        }
        assert_eq!(heap.len(), 3);
        assert!(!heap.offer(4));
        assert_eq!(heap.into_sorted_vec(), vec![1, 2, 3]);
        let mut empty = BoundedHeap::new(0);
        assert!(!empty.offer(1.0));
        assert_eq!(empty.pop(), None);
    }
}
