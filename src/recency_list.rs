//! Arena-backed doubly linked list ordering entries from most to least
//! recently used.
//!
//! Nodes live in a dense `Vec` and link to each other by index, so the list
//! needs neither raw pointers nor shared ownership. Slots `0` and `1` are the
//! head and tail sentinels: they never carry a value and are always linked,
//! which removes every empty-list special case from insert and unlink.
//!
//! ```text
//!   HEAD <-> [mru] <-> ... <-> [lru] <-> TAIL
//!    0                                    1
//! ```
//!
//! Freed slots are recycled through a free list, so a shard running at
//! capacity stops allocating once its arena has grown to `capacity + 2`.

const HEAD: usize = 0;
const TAIL: usize = 1;

/// Stable handle to a live node. Only valid until the node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

#[derive(Debug)]
struct Node<T> {
    prev: usize,
    next: usize,
    value: Option<T>,
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            prev: HEAD,
            next: TAIL,
            value: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct RecencyList<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> RecencyList<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.saturating_add(2));
        nodes.push(Node::sentinel());
        nodes.push(Node::sentinel());
        Self {
            nodes,
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        if id.0 <= TAIL {
            return None;
        }
        self.nodes.get(id.0)?.value.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        if id.0 <= TAIL {
            return None;
        }
        self.nodes.get_mut(id.0)?.value.as_mut()
    }

    /// Inserts `value` as the most recently used node.
    pub(crate) fn push_front(&mut self, value: T) -> NodeId {
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx].value = Some(value);
                idx
            }
            None => {
                self.nodes.push(Node {
                    prev: HEAD,
                    next: TAIL,
                    value: Some(value),
                });
                self.nodes.len() - 1
            }
        };
        self.attach_front(idx);
        self.len += 1;
        NodeId(idx)
    }

    /// Marks a live node as most recently used. Returns `false` for a stale id.
    pub(crate) fn move_to_front(&mut self, id: NodeId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if self.nodes[HEAD].next != id.0 {
            self.detach(id.0);
            self.attach_front(id.0);
        }
        true
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> Option<T> {
        if id.0 <= TAIL {
            return None;
        }
        let value = self.nodes.get_mut(id.0)?.value.take()?;
        self.detach(id.0);
        self.free.push(id.0);
        self.len -= 1;
        Some(value)
    }

    /// The least recently used node, i.e. the one just before the tail sentinel.
    pub(crate) fn back(&self) -> Option<NodeId> {
        match self.nodes[TAIL].prev {
            HEAD => None,
            idx => Some(NodeId(idx)),
        }
    }

    pub(crate) fn pop_back(&mut self) -> Option<T> {
        let id = self.back()?;
        self.remove(id)
    }

    /// Drops every node and relinks the two sentinels to each other.
    pub(crate) fn clear(&mut self) {
        self.nodes.truncate(2);
        self.nodes[HEAD] = Node::sentinel();
        self.nodes[TAIL] = Node::sentinel();
        self.free.clear();
        self.len = 0;
    }

    /// Walks from most to least recently used.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.nodes[HEAD].next,
            remaining: self.nodes.len(),
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    fn attach_front(&mut self, idx: usize) {
        let first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = first;
        self.nodes[first].prev = idx;
        self.nodes[HEAD].next = idx;
    }
}

/// Front-to-back iterator. Stops after visiting as many nodes as the arena
/// holds, so a corrupted cycle cannot loop forever.
pub(crate) struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == TAIL || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let idx = self.cursor;
        let node = self.list.nodes.get(idx)?;
        self.cursor = node.next;
        node.value.as_ref().map(|value| (NodeId(idx), value))
    }
}
