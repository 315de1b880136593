pub mod keys;
pub mod schema;
pub mod types;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical entity kinds, one per backend table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    VertexLabel,
    EdgeLabel,
    PropertyKey,
    IndexLabel,
    Vertex,
    Edge,
    SecondaryIndex,
    SearchIndex,
}

const ALL_KINDS: [EntityKind; 8] = [
    EntityKind::VertexLabel,
    EntityKind::EdgeLabel,
    EntityKind::PropertyKey,
    EntityKind::IndexLabel,
    EntityKind::Vertex,
    EntityKind::Edge,
    EntityKind::SecondaryIndex,
    EntityKind::SearchIndex,
];

impl EntityKind {
    /// Every kind, schema kinds first.
    pub fn all() -> &'static [EntityKind] {
        &ALL_KINDS
    }

    pub fn parse(name: &str) -> Option<EntityKind> {
        ALL_KINDS.iter().copied().find(|k| k.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::VertexLabel => "vertex_label",
            EntityKind::EdgeLabel => "edge_label",
            EntityKind::PropertyKey => "property_key",
            EntityKind::IndexLabel => "index_label",
            EntityKind::Vertex => "vertex",
            EntityKind::Edge => "edge",
            EntityKind::SecondaryIndex => "secondary_index",
            EntityKind::SearchIndex => "search_index",
        }
    }

    pub fn is_index(self) -> bool {
        matches!(self, EntityKind::SecondaryIndex | EntityKind::SearchIndex)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
