//! JSON world fixtures.
//!
//! ```json
//! {
//!   "seed": 7,
//!   "objectives": ["kills"],
//!   "blocks": [{ "pos": [0, 64, 0], "state": "minecraft:chest[facing=north]", "data": {} }],
//!   "entities": [{ "kind": "zombie", "name": "Zed", "pos": [1.5, 64.0, 2.5], "tags": ["boss"] }],
//!   "scores": { "Zed": { "kills": 3 } }
//! }
//! ```

use anyhow::{Context, Result};
use mdcommand_core::{BlockPos, BlockState, DVec3, DimensionId, ResourceKey, Rotation, Tag};
use mdcommand_engine::{EntityId, EntityRef};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::server::{default_eye_height, BossBar, MemoryServer, PredicateRule};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockFixture {
    #[serde(default)]
    pub dimension: DimensionId,
    pub pos: [i32; 3],
    pub state: BlockState,
    /// Block entity document; its presence makes the block a block entity.
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityFixture {
    /// Entity type; bare names are in the `minecraft` namespace.
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub dimension: DimensionId,
    pub pos: [f64; 3],
    /// `[yaw, pitch]` in degrees.
    #[serde(default)]
    pub rotation: [f32; 2],
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub eye_height: Option<f64>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnFixture {
    #[serde(default)]
    pub dimension: DimensionId,
    pub chunk: [i32; 2],
}

/// Declarative description of a [`MemoryServer`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldFixture {
    pub seed: u64,
    pub blocks: Vec<BlockFixture>,
    pub unloaded_columns: Vec<ColumnFixture>,
    pub entities: Vec<EntityFixture>,
    pub objectives: Vec<String>,
    /// holder -> objective -> value
    pub scores: BTreeMap<String, BTreeMap<String, i32>>,
    pub storage: BTreeMap<ResourceKey, Value>,
    pub boss_bars: BTreeMap<ResourceKey, BossBar>,
    pub predicates: BTreeMap<ResourceKey, PredicateRule>,
}

impl WorldFixture {
    /// Read a fixture from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read world fixture {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Invalid world fixture {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse world fixture JSON")
    }

    /// Build the world. Scores must name declared objectives.
    pub fn build(&self) -> Result<MemoryServer> {
        use mdcommand_engine::CommandServer;

        let mut server = MemoryServer::new(self.seed);
        for column in &self.unloaded_columns {
            server.unload_column(column.dimension, column.chunk[0], column.chunk[1]);
        }
        for block in &self.blocks {
            let pos = BlockPos::new(block.pos[0], block.pos[1], block.pos[2]);
            match &block.data {
                Some(data) => server.put_block_entity(
                    block.dimension,
                    pos,
                    block.state.clone(),
                    Tag::compound_from_json(data),
                ),
                None => server.put_block(block.dimension, pos, block.state.clone()),
            }
        }
        for entity in &self.entities {
            spawn(&mut server, entity)?;
        }
        for objective in &self.objectives {
            server.add_objective(objective)?;
        }
        for (holder, scores) in &self.scores {
            for (objective, value) in scores {
                anyhow::ensure!(
                    server.has_objective(objective),
                    "score for {holder} uses undeclared objective '{objective}'"
                );
                server.set_score(holder, objective, *value);
            }
        }
        for (id, data) in &self.storage {
            server.set_storage_data(id, Tag::compound_from_json(data));
        }
        for (id, bar) in &self.boss_bars {
            server.create_boss_bar(id.clone(), *bar);
        }
        for (id, rule) in &self.predicates {
            server.define_predicate(id.clone(), rule.clone());
        }
        Ok(server)
    }
}

fn spawn(server: &mut MemoryServer, fixture: &EntityFixture) -> Result<EntityId> {
    let kind = ResourceKey::parse(&fixture.kind)
        .with_context(|| format!("Invalid entity kind for {}", fixture.name))?;
    let [x, y, z] = fixture.pos;
    let entity = EntityRef {
        id: EntityId(0),
        name: fixture.name.clone(),
        eye_height: fixture.eye_height.unwrap_or_else(|| default_eye_height(&kind)),
        kind,
        dimension: fixture.dimension,
        position: DVec3::new(x, y, z),
        rotation: Rotation::new(fixture.rotation[0], fixture.rotation[1]),
        tags: fixture.tags.iter().cloned().collect::<BTreeSet<_>>(),
    };
    let data = fixture
        .data
        .as_ref()
        .map(Tag::compound_from_json)
        .unwrap_or_default();
    Ok(server.spawn(entity, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdcommand_engine::CommandServer;

    const FIXTURE: &str = r#"{
        "seed": 3,
        "objectives": ["kills"],
        "blocks": [
            { "pos": [0, 64, 0], "state": "stone" },
            { "dimension": "nether", "pos": [1, 70, 1], "state": "minecraft:chest[facing=north]", "data": { "Lock": "key" } }
        ],
        "unloaded_columns": [{ "chunk": [10, 10] }],
        "entities": [
            { "kind": "player", "name": "Alex", "pos": [0.5, 64.0, 0.5] },
            { "kind": "zombie", "name": "Zed", "pos": [3.0, 64.0, 0.0], "tags": ["boss"], "data": { "Health": 20.0 } }
        ],
        "scores": { "Alex": { "kills": 4 } },
        "storage": { "demo:cfg": { "level": 2 } },
        "boss_bars": { "demo:raid": { "value": 5, "max": 10 } },
        "predicates": { "demo:high": { "type": "min_y", "y": 100.0 } }
    }"#;

    #[test]
    fn fixture_builds_every_section() {
        let server = WorldFixture::from_json_str(FIXTURE)
            .and_then(|f| f.build())
            .expect("fixture builds");
        assert_eq!(
            server.block_state(DimensionId::Overworld, BlockPos::new(0, 64, 0)),
            BlockState::parse("stone").ok()
        );
        let chest = server
            .block_data(DimensionId::Nether, BlockPos::new(1, 70, 1))
            .expect("block entity");
        assert_eq!(chest.get("Lock"), Some(&Tag::String("key".into())));
        assert!(!server.is_loaded(DimensionId::Overworld, BlockPos::new(165, 64, 170)));
        assert_eq!(server.entities().count(), 2);
        let zed = server.entity_named("Zed").expect("zombie spawned");
        assert!(zed.tags.contains("boss"));
        assert_eq!(zed.eye_height, 1.74);
        let data = server.entity_data(zed.id).expect("data");
        assert_eq!(data.get("Health"), Some(&Tag::Double(20.0)));
        assert_eq!(server.score("Alex", "kills"), Some(4));
        let cfg = ResourceKey::parse("demo:cfg").expect("key");
        assert_eq!(server.storage_data(&cfg).get("level"), Some(&Tag::Int(2)));
        let raid = ResourceKey::parse("demo:raid").expect("key");
        assert_eq!(server.boss_bar(&raid), Some(BossBar { value: 5, max: 10 }));
    }

    #[test]
    fn scores_must_reference_declared_objectives() {
        let fixture = WorldFixture::from_json_str(r#"{ "scores": { "Alex": { "deaths": 1 } } }"#)
            .expect("parses");
        let err = fixture.build().unwrap_err();
        assert!(err.to_string().contains("deaths"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(WorldFixture::from_json_str(r#"{ "weather": "rain" }"#).is_err());
    }
}
