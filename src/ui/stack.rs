//! # UI Element Stack
//!
//! Three bounded, insertion-ordered queues of pending display mutations:
//! deletions, graphics and strings. Pushes are rejected when the relevant
//! queue is full, which is a backpressure signal to the producing layer, not
//! a fault. Drain order across the three kinds is the composer's policy; the
//! stack only guarantees FIFO order within each kind.

use std::collections::VecDeque;

use super::element::{DeleteOp, GraphicElement, StringElement};

/// Default pending-deletion capacity
pub const DEFAULT_DELETE_CAPACITY: usize = 4;

/// Default pending-graphic capacity
pub const DEFAULT_GRAPHIC_CAPACITY: usize = 16;

/// Default pending-string capacity
pub const DEFAULT_STRING_CAPACITY: usize = 8;

/// One pending display mutation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiOp {
    Delete(DeleteOp),
    Graphic(GraphicElement),
    String(StringElement),
}

/// Bounded queues of pending UI operations
#[derive(Debug)]
pub struct UiStack {
    deletes: VecDeque<DeleteOp>,
    graphics: VecDeque<GraphicElement>,
    strings: VecDeque<StringElement>,
    delete_capacity: usize,
    graphic_capacity: usize,
    string_capacity: usize,
}

impl Default for UiStack {
    fn default() -> Self {
        Self::new(
            DEFAULT_DELETE_CAPACITY,
            DEFAULT_GRAPHIC_CAPACITY,
            DEFAULT_STRING_CAPACITY,
        )
    }
}

impl UiStack {
    pub fn new(delete_capacity: usize, graphic_capacity: usize, string_capacity: usize) -> Self {
        Self {
            deletes: VecDeque::with_capacity(delete_capacity),
            graphics: VecDeque::with_capacity(graphic_capacity),
            strings: VecDeque::with_capacity(string_capacity),
            delete_capacity,
            graphic_capacity,
            string_capacity,
        }
    }

    /// Enqueue a pending deletion
    ///
    /// # Returns
    ///
    /// * `bool` - false if the queue is full and the operation was rejected
    pub fn push_delete(&mut self, op: DeleteOp) -> bool {
        if self.deletes.len() >= self.delete_capacity {
            return false;
        }
        self.deletes.push_back(op);
        true
    }

    /// Enqueue a pending graphic
    pub fn push_graphic(&mut self, element: GraphicElement) -> bool {
        if self.graphics.len() >= self.graphic_capacity {
            return false;
        }
        self.graphics.push_back(element);
        true
    }

    /// Enqueue a pending string
    pub fn push_string(&mut self, element: StringElement) -> bool {
        if self.strings.len() >= self.string_capacity {
            return false;
        }
        self.strings.push_back(element);
        true
    }

    /// Enqueue any pending operation by kind
    pub fn push_op(&mut self, op: UiOp) -> bool {
        match op {
            UiOp::Delete(delete) => self.push_delete(delete),
            UiOp::Graphic(graphic) => self.push_graphic(graphic),
            UiOp::String(string) => self.push_string(string),
        }
    }

    /// Oldest pending deletion, if any
    pub fn pop_delete(&mut self) -> Option<DeleteOp> {
        self.deletes.pop_front()
    }

    /// Oldest pending graphic, if any
    pub fn pop_graphic(&mut self) -> Option<GraphicElement> {
        self.graphics.pop_front()
    }

    /// Oldest pending string, if any
    pub fn pop_string(&mut self) -> Option<StringElement> {
        self.strings.pop_front()
    }

    pub fn delete_len(&self) -> usize {
        self.deletes.len()
    }

    pub fn graphic_len(&self) -> usize {
        self.graphics.len()
    }

    pub fn string_len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.graphics.is_empty() && self.strings.is_empty()
    }
}
