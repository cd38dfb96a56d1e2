use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque node identifier, unique for the session and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// A fresh id of the form `node-<uuid>`.
    pub fn generate() -> Self {
        Self(format!("node-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A position in world units. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// A labeled vertex of the mind map.
///
/// Identity, content and level belong to the tree store; position and pin
/// belong to the layout engine and the interaction controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(super) id: NodeId,
    pub(super) content: String,
    pub(super) level: u32,
    position: Point,
    placed: bool,
    pin: Option<Point>,
}

impl Node {
    pub(super) fn new(content: impl Into<String>, level: u32) -> Self {
        Self::restored(NodeId::generate(), content, level)
    }

    /// Rebuild a node from persisted fields. The node starts unplaced.
    pub fn restored(id: NodeId, content: impl Into<String>, level: u32) -> Self {
        Self {
            id,
            content: content.into(),
            level,
            position: Point::default(),
            placed: false,
            pin: None,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// False until the layout engine or a mutation assigned a position.
    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
        self.placed = true;
    }

    pub fn pin(&self) -> Option<Point> {
        self.pin
    }

    /// Fix the node at `pin`, or release it with `None`.
    pub fn set_pin(&mut self, pin: Option<Point>) {
        self.pin = pin;
    }
}

/// A directed parent → child edge, stored as a pair of ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub(super) source: NodeId,
    pub(super) target: NodeId,
}

impl Link {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = NodeId::generate();
        let b = NodeId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("node-"));
    }

    #[test]
    fn restored_node_starts_unplaced_and_unpinned() {
        let mut node = Node::restored("n1".into(), "hello", 2);
        assert!(!node.is_placed());
        assert_eq!(node.pin(), None);
        node.set_position(Point::new(3.0, 4.0));
        assert!(node.is_placed());
        assert_eq!(node.position(), Point::new(3.0, 4.0));
    }
}
