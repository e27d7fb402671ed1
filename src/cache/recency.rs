//! Recency List Module
//!
//! Doubly linked ring over cache keys, used by the LRU layer.
//!
//! The list has no node allocations of its own: every key owns one entry in
//! a side table mapping it to its `{prev, next}` neighbours, addressed by
//! key. Two sentinels anchor the ring:
//!
//! ```text
//! HEAD <-> most recent <-> ... <-> least recent <-> TAIL
//! ```
//!
//! An empty list is HEAD and TAIL linked directly to each other. Sentinels
//! are enum variants, so no data key can ever be mistaken for one.

use std::collections::HashMap;

static HEAD: Node = Node::Head;
static TAIL: Node = Node::Tail;

// == Node ==
/// A position in the ring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Head,
    Tail,
    Key(String),
}

impl Node {
    /// The data key, or None for a sentinel.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Node::Key(key) => Some(key),
            Node::Head | Node::Tail => None,
        }
    }
}

// == Link ==
/// Neighbours of a node. HEAD's `prev` and TAIL's `next` point at themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub prev: Node,
    pub next: Node,
}

// == Recency List ==
/// Most-to-least recently used ordering of keys.
///
/// The list does not keep a length; the LRU layer counts its own size and
/// rebuilds it with [`RecencyList::counting_walk`] when reattached.
#[derive(Debug, Clone)]
pub struct RecencyList {
    links: HashMap<Node, Link>,
}

impl RecencyList {
    // == Constructor ==
    /// Creates an empty ring, HEAD and TAIL adjacent.
    pub fn new() -> Self {
        let mut list = Self {
            links: HashMap::new(),
        };
        list.ensure_sentinels();
        list
    }

    fn ensure_sentinels(&mut self) {
        self.links.insert(
            Node::Head,
            Link {
                prev: Node::Head,
                next: Node::Tail,
            },
        );
        self.links.insert(
            Node::Tail,
            Link {
                prev: Node::Head,
                next: Node::Tail,
            },
        );
    }

    // == Neighbours ==
    /// Node after `node`, walking from HEAD towards TAIL.
    pub fn next(&self, node: &Node) -> Option<&Node> {
        self.links.get(node).map(|link| &link.next)
    }

    /// Node before `node`, walking from TAIL towards HEAD.
    pub fn prev(&self, node: &Node) -> Option<&Node> {
        self.links.get(node).map(|link| &link.prev)
    }

    // == Contains ==
    /// Checks if a key is linked into the ring.
    pub fn contains(&self, key: &str) -> bool {
        self.links.contains_key(&Node::Key(key.to_string()))
    }

    // == Peek ==
    /// The most recently used key, next to HEAD.
    pub fn most_recent(&self) -> Option<&str> {
        self.next(&Node::Head).and_then(Node::as_key)
    }

    /// The least recently used key, next to TAIL.
    pub fn least_recent(&self) -> Option<&str> {
        self.prev(&Node::Tail).and_then(Node::as_key)
    }

    /// True when HEAD and TAIL are adjacent.
    pub fn is_empty(&self) -> bool {
        self.next(&Node::Head) == Some(&Node::Tail)
    }

    /// Sets `node.next = next` and `next.prev = node`.
    fn join(&mut self, node: &Node, next: &Node) {
        if let Some(link) = self.links.get_mut(node) {
            link.next = next.clone();
        }
        if let Some(link) = self.links.get_mut(next) {
            link.prev = node.clone();
        }
    }

    // == Push Front ==
    /// Links a new key right after HEAD.
    ///
    /// Returns false (and leaves the ring untouched) if the key is already
    /// linked.
    pub fn push_front(&mut self, key: &str) -> bool {
        let node = Node::Key(key.to_string());
        if self.links.contains_key(&node) {
            return false;
        }

        let first = self
            .next(&Node::Head)
            .cloned()
            .unwrap_or(Node::Tail);
        self.links.insert(
            node.clone(),
            Link {
                prev: Node::Head,
                next: first.clone(),
            },
        );
        self.join(&node, &first);
        self.join(&Node::Head, &node);
        true
    }

    // == Remove ==
    /// Unlinks a key, joining its neighbours directly.
    ///
    /// Returns false if the key was not linked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.links.remove(&Node::Key(key.to_string())) {
            Some(Link { prev, next }) => {
                self.join(&prev, &next);
                true
            }
            None => false,
        }
    }

    // == Touch ==
    /// Moves a linked key to the front. Returns false if the key is not linked.
    pub fn touch(&mut self, key: &str) -> bool {
        if self.most_recent() == Some(key) {
            return true;
        }
        self.remove(key) && self.push_front(key)
    }

    // == Clear ==
    /// Drops every key, leaving HEAD and TAIL adjacent.
    pub fn clear(&mut self) {
        self.links.clear();
        self.ensure_sentinels();
    }

    // == Counting Walk ==
    /// Counts the keys reachable from HEAD before reaching TAIL.
    ///
    /// Stops early on a broken link or after visiting every stored node, so
    /// a corrupted table cannot loop forever.
    pub fn counting_walk(&self) -> usize {
        let limit = self.links.len();
        let mut count = 0;
        let mut current = &HEAD;

        while let Some(next) = self.next(current) {
            if *next == Node::Tail || count >= limit {
                break;
            }
            count += 1;
            current = next;
        }
        count
    }

    /// Keys from most to least recently used.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            current: &HEAD,
        }
    }

    /// Verifies the ring: the forward walk and the backward walk visit the
    /// same keys in mirrored order, every linked key is visited exactly once,
    /// and each link agrees with its neighbour's back-link.
    pub fn is_consistent(&self) -> bool {
        let forward: Vec<&str> = self.iter().take(self.links.len()).collect();

        let mut backward = Vec::new();
        let mut current = &TAIL;
        while let Some(prev) = self.prev(current) {
            if *prev == Node::Head || backward.len() > self.links.len() {
                break;
            }
            match prev.as_key() {
                Some(key) => backward.push(key),
                None => return false,
            }
            current = prev;
        }
        backward.reverse();

        let linked_keys = self.links.len().saturating_sub(2);
        let neighbours_agree = self.links.iter().all(|(node, link)| {
            let next_ok = *node == Node::Tail || self.prev(&link.next) == Some(node);
            let prev_ok = *node == Node::Head || self.next(&link.prev) == Some(node);
            next_ok && prev_ok
        });

        forward == backward && forward.len() == linked_keys && neighbours_agree
    }
}

impl Default for RecencyList {
    fn default() -> Self {
        Self::new()
    }
}

// == Iterator ==
/// Iterator over keys, most recent first.
pub struct Iter<'a> {
    list: &'a RecencyList,
    current: &'a Node,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.list.next(self.current)?;
        let key = next.as_key()?;
        self.current = next;
        Some(key)
    }
}
