//! Fixed-capacity FIFO ring.
//!
//! A thin wrapper over [`heapless::Deque`] exposing only what the command
//! queue needs: push at the back, pop and edit at the front. `CAP` is the
//! number of items the ring can hold. The command queue sizes it as
//! `QUEUE_SLOTS - 1`, the usable room of a slot ring that keeps one slot free.

use heapless::Deque;

/// Bounded FIFO ring.
///
/// # Example
///
/// ```rust
/// use train_console::ring::Ring;
///
/// let mut ring: Ring<u8, 3> = Ring::new();
/// assert_eq!(ring.capacity(), 3);
///
/// assert!(ring.push(1).is_ok());
/// assert!(ring.push(2).is_ok());
/// assert!(ring.push(3).is_ok());
/// assert_eq!(ring.push(4), Err(4)); // full
///
/// assert_eq!(ring.pop(), Some(1));
/// assert!(ring.push(4).is_ok()); // wraps around
/// ```
#[derive(Clone, Debug)]
pub struct Ring<T, const CAP: usize> {
    items: Deque<T, CAP>,
}

impl<T, const CAP: usize> Ring<T, CAP> {
    /// Creates an empty ring.
    pub const fn new() -> Self {
        Self {
            items: Deque::new(),
        }
    }

    /// Append an item at the back.
    ///
    /// Returns the item back if the ring is full; the ring is unchanged.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        self.items.push_back(item)
    }

    /// Remove the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// The oldest item, if any.
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Mutable access to the oldest item, if any.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.items.front_mut()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    /// Number of items held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the ring holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if another push would fail.
    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    /// Maximum number of items (`CAP`).
    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T, const CAP: usize> Default for Ring<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}
