//! Consistent Hash Ring
//!
//! Maps keys to node identities using virtual nodes.

use std::collections::HashMap;

/// Hashes raw bytes onto the ring.
pub type HashFn = fn(&[u8]) -> u32;

/// Default hash: CRC-32 (IEEE).
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// == Hash Ring ==
/// Consistent hash ring with `replicas` virtual nodes per real node.
///
/// Virtual node `i` of node `n` sits at `hash(format!("{i}{n}"))`. A key is
/// owned by the first virtual node at or after its own hash, wrapping around
/// to the start of the ring.
#[derive(Debug, Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted ascending
    keys: Vec<u32>,
    nodes: HashMap<u32, String>,
}

impl HashRing {
    // == Constructor ==
    /// Creates an empty ring. `hash` defaults to [`crc32`].
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or(crc32),
            replicas,
            keys: Vec::new(),
            nodes: HashMap::new(),
        }
    }

    // == Add ==
    /// Places every node on the ring.
    pub fn add<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                let hash = (self.hash)(format!("{}{}", i, node).as_bytes());
                if self.nodes.insert(hash, node.to_string()).is_none() {
                    self.keys.push(hash);
                }
            }
        }
        self.keys.sort_unstable();
    }

    // == Get ==
    /// Returns the node that owns `key`, or `None` on an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        let idx = self.keys.partition_point(|&k| k < hash);
        let owner = self.keys[idx % self.keys.len()];
        self.nodes.get(&owner).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of virtual nodes on the ring.
    pub fn len(&self) -> usize {
        self.keys.len()
    }
}
