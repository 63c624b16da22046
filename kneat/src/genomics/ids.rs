use crate::Innovation;

use serde::{Deserialize, Serialize};

/// A monotonically increasing id counter.
///
/// A single allocator is shared by hidden nodes and
/// connection innovations, so that node ids and
/// innovation numbers never overlap. Genome ids are
/// drawn from an allocator of their own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: Innovation,
}

impl IdAllocator {
    /// Creates an allocator whose first id is `first`.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::IdAllocator;
    ///
    /// let mut ids = IdAllocator::new(5);
    /// assert_eq!(ids.next_id(), 5);
    /// assert_eq!(ids.next_id(), 6);
    /// ```
    pub const fn new(first: Innovation) -> IdAllocator {
        IdAllocator { next: first }
    }

    /// Returns a fresh id.
    pub fn next_id(&mut self) -> Innovation {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Returns the id the next call to
    /// [`next_id`](IdAllocator::next_id) will return.
    pub fn peek(&self) -> Innovation {
        self.next
    }

    /// Makes sure `id` will never be handed out.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::IdAllocator;
    ///
    /// let mut ids = IdAllocator::new(0);
    /// ids.reserve_through(9);
    /// assert_eq!(ids.next_id(), 10);
    ///
    /// ids.reserve_through(3);
    /// assert_eq!(ids.next_id(), 11);
    /// ```
    pub fn reserve_through(&mut self, id: Innovation) {
        self.next = self.next.max(id + 1);
    }
}
