use mdcommand_core::{DVec3, DimensionId, ResourceKey, Rotation};
use std::collections::BTreeSet;
use std::fmt;

/// Stable handle of an entity owned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of an entity as seen by a selector at evaluation time.
///
/// Contexts hold snapshots, not live handles, so each forked branch owns its
/// own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRef {
    pub id: EntityId,
    pub name: String,
    pub kind: ResourceKey,
    pub dimension: DimensionId,
    pub position: DVec3,
    pub rotation: Rotation,
    pub eye_height: f64,
    pub tags: BTreeSet<String>,
}

impl EntityRef {
    pub fn is_player(&self) -> bool {
        self.kind.namespace() == mdcommand_core::DEFAULT_NAMESPACE && self.kind.path() == "player"
    }

    pub fn eye_position(&self) -> DVec3 {
        self.position + DVec3::new(0.0, self.eye_height, 0.0)
    }

    /// Name under which this entity owns scoreboard scores.
    pub fn score_holder(&self) -> &str {
        &self.name
    }
}
