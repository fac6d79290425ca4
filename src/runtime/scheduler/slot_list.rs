//! Ordered slot list for the scheduler
//!
//! A doubly-linked sequence whose nodes live in a [`Slab`]. Keys stay valid
//! until their node is removed, so a pass can hold on to the key of the next
//! node while the current one is detached.

use slab::Slab;

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Insertion-ordered list with O(1) append, O(1) removal by key and
/// key-based forward traversal.
#[derive(Debug)]
pub struct SlotList<T> {
    nodes: Slab<Node<T>>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<T> SlotList<T> {
    /// Create an empty list.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Slab::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Append a value and return its key.
    pub fn push_back(
        &mut self,
        value: T,
    ) -> usize {
        let key = self.nodes.insert(Node {
            value,
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);

        key
    }

    /// Unlink and return the value stored under `key`.
    pub fn remove(
        &mut self,
        key: usize,
    ) -> Option<T> {
        let node = self.nodes.try_remove(key)?;

        match node.prev {
            Some(prev) => self.nodes[prev].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.nodes[next].prev = node.prev,
            None => self.tail = node.prev,
        }

        Some(node.value)
    }

    /// Remove and return the first value.
    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        self.remove(head)
    }

    /// Key of the first node.
    #[inline]
    pub fn front(&self) -> Option<usize> {
        self.head
    }

    /// Key of the last node.
    #[inline]
    pub fn back(&self) -> Option<usize> {
        self.tail
    }

    /// Key of the node following `key`.
    #[inline]
    pub fn next(
        &self,
        key: usize,
    ) -> Option<usize> {
        self.nodes.get(key).and_then(|node| node.next)
    }

    #[inline]
    pub fn get(
        &self,
        key: usize,
    ) -> Option<&T> {
        self.nodes.get(key).map(|node| &node.value)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterate `(key, value)` pairs front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }
}

impl<T> Default for SlotList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Front-to-back iterator over a [`SlotList`].
pub struct Iter<'a, T> {
    list: &'a SlotList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        let node = self.list.nodes.get(key)?;
        self.cursor = node.next;
        Some((key, &node.value))
    }
}
