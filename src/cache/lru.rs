//! LRU Store Module
//!
//! Byte-budgeted least-recently-used store. Not thread-safe on its own; see
//! [`ConcurrentCache`](super::ConcurrentCache) for the locked wrapper.

use std::collections::HashMap;
use std::fmt;

// == Byte Size ==
/// Values stored in an [`LruStore`] report their size in bytes.
pub trait ByteSize {
    fn byte_size(&self) -> usize;
}

impl ByteSize for Vec<u8> {
    fn byte_size(&self) -> usize {
        self.len()
    }
}

impl ByteSize for String {
    fn byte_size(&self) -> usize {
        self.len()
    }
}

/// Callback invoked with every entry removed by eviction.
pub type OnEvicted<V> = Box<dyn FnMut(&str, &V) + Send>;

/// Stable handle into the entry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot(usize);

#[derive(Debug)]
struct Node<V> {
    key: String,
    value: V,
    prev: Option<Slot>,
    next: Option<Slot>,
}

impl<V: ByteSize> Node<V> {
    fn size(&self) -> usize {
        self.key.len() + self.value.byte_size()
    }
}

// == LRU Store ==
/// Least-recently-used store bounded by the combined byte size of keys and
/// values.
///
/// Entries live in an arena addressed by [`Slot`] handles and are linked into
/// a recency list:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// A `capacity` of 0 means unbounded.
pub struct LruStore<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    index: HashMap<String, Slot>,
    head: Option<Slot>,
    tail: Option<Slot>,
    capacity: usize,
    used: usize,
    on_evicted: Option<OnEvicted<V>>,
}

impl<V: ByteSize> LruStore<V> {
    // == Constructor ==
    /// Creates an empty store with the given byte budget.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            capacity,
            used: 0,
            on_evicted: None,
        }
    }

    /// Creates an empty store that reports evicted entries to `on_evicted`.
    pub fn with_on_evicted(capacity: usize, on_evicted: OnEvicted<V>) -> Self {
        let mut store = Self::new(capacity);
        store.on_evicted = Some(on_evicted);
        store
    }

    // == Get ==
    /// Looks up a key and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.move_to_front(slot);
        Some(&self.node(slot).value)
    }

    // == Put ==
    /// Inserts or replaces a value, then evicts from the tail until the
    /// store fits its budget.
    pub fn put(&mut self, key: String, value: V) {
        if let Some(&slot) = self.index.get(&key) {
            self.move_to_front(slot);
            let node = self.node_mut(slot);
            let old = node.value.byte_size();
            let new = value.byte_size();
            node.value = value;
            self.used = self.used - old + new;
        } else {
            let size = key.len() + value.byte_size();
            let slot = self.alloc(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.push_front(slot);
            self.index.insert(key, slot);
            self.used += size;
        }

        while self.capacity != 0 && self.used > self.capacity {
            if self.evict_oldest().is_none() {
                break;
            }
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used entry.
    pub fn evict_oldest(&mut self) -> Option<(String, V)> {
        let slot = self.tail?;
        self.unlink(slot);
        let node = self.slots[slot.0].take()?;
        self.free.push(slot.0);
        self.index.remove(&node.key);
        self.used -= node.size();

        if let Some(callback) = self.on_evicted.as_mut() {
            callback(&node.key, &node.value);
        }
        Some((node.key, node.value))
    }

    // == Peek Oldest ==
    /// Returns the key that would be evicted next, without touching it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.tail.map(|slot| self.node(slot).key.as_str())
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = Vec::with_capacity(self.index.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let node = self.node(slot);
            keys.push(node.key.as_str());
            cursor = node.next;
        }
        keys
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bytes currently accounted to live entries.
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Recency List ==
    fn alloc(&mut self, node: Node<V>) -> Slot {
        match self.free.pop() {
            Some(i) => {
                self.slots[i] = Some(node);
                Slot(i)
            }
            None => {
                self.slots.push(Some(node));
                Slot(self.slots.len() - 1)
            }
        }
    }

    fn push_front(&mut self, slot: Slot) {
        let old_head = self.head;
        {
            let node = self.node_mut(slot);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn unlink(&mut self, slot: Slot) {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    fn move_to_front(&mut self, slot: Slot) {
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.push_front(slot);
    }

    // Slots reachable from `index` or the list are always occupied.
    fn node(&self, slot: Slot) -> &Node<V> {
        match &self.slots[slot.0] {
            Some(node) => node,
            None => unreachable!("vacant slot {} linked into recency list", slot.0),
        }
    }

    fn node_mut(&mut self, slot: Slot) -> &mut Node<V> {
        match &mut self.slots[slot.0] {
            Some(node) => node,
            None => unreachable!("vacant slot {} linked into recency list", slot.0),
        }
    }
}

impl<V> fmt::Debug for LruStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("len", &self.index.len())
            .field("used", &self.used)
            .field("capacity", &self.capacity)
            .finish()
    }
}
