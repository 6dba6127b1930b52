//! View history.
//!
//! Records which entities were looked at, oldest first, each id at most
//! once. Entries live in an arena of doubly linked nodes and an id index
//! points at each node, so add, promote and remove are all O(1).

use std::collections::HashMap;

use crate::task::{Entity, TaskId};

#[derive(Debug, Clone)]
struct Node {
    entity: Entity,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryTracker {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    index: HashMap<TaskId, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: Option<usize>,
}

impl HistoryTracker {
    /// Unbounded history; entries leave only through `remove`.
    pub fn new() -> Self {
        Self::default()
    }

    /// History that evicts its oldest entry once `capacity` ids are held.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    /// Append a snapshot at the tail, dropping any older entry for the id.
    pub fn add(&mut self, entity: Entity) {
        let id = entity.id();
        self.remove(id);

        if let Some(capacity) = self.capacity {
            while self.index.len() >= capacity {
                match self.head {
                    Some(head) => self.unlink(head),
                    None => break,
                }
            }
        }

        self.link_last(entity);
    }

    pub fn remove(&mut self, id: TaskId) {
        if let Some(slot) = self.index.get(&id).copied() {
            self.unlink(slot);
        }
    }

    /// Snapshot of the history, oldest first.
    pub fn list(&self) -> Vec<Entity> {
        let mut entries = Vec::with_capacity(self.index.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let Some(node) = self.nodes[slot].as_ref() else {
                break;
            };
            entries.push(node.entity.clone());
            cursor = node.next;
        }
        entries
    }

    fn link_last(&mut self, entity: Entity) {
        let id = entity.id();
        let node = Node {
            entity,
            prev: self.tail,
            next: None,
        };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail_node) = self.nodes[tail].as_mut() {
                    tail_node.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.index.insert(id, slot);
    }

    fn unlink(&mut self, slot: usize) {
        let Some(node) = self.nodes[slot].take() else {
            return;
        };

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.nodes[prev].as_mut() {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next_node) = self.nodes[next].as_mut() {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        self.index.remove(&node.entity.id());
        self.free.push(slot);
    }
}
