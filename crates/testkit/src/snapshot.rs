//! Golden-file snapshots of world state.
//!
//! A [`WorldSnapshot`] captures everything commands can change in a
//! [`MemoryServer`], rendered as canonical pretty JSON with sorted keys. Tests
//! compare against the golden file on disk; rerun with
//! `MDC_UPDATE_SNAPSHOTS=1` to rewrite it.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::server::MemoryServer;

/// Environment variable that enables snapshot updates.
pub const UPDATE_SNAPSHOTS_ENV: &str = "MDC_UPDATE_SNAPSHOTS";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub name: String,
    pub kind: String,
    pub dimension: String,
    pub pos: [f64; 3],
    pub rotation: [f32; 2],
    pub tags: Vec<String>,
    /// Entity document in SNBT form.
    pub data: String,
}

/// Serializable view of a [`MemoryServer`]. Documents are rendered as SNBT.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    /// `dimension x y z` -> block state
    pub blocks: BTreeMap<String, String>,
    pub block_entities: BTreeMap<String, String>,
    pub entities: Vec<EntitySnapshot>,
    /// holder -> objective -> value
    pub scores: BTreeMap<String, BTreeMap<String, i32>>,
    pub storage: BTreeMap<String, String>,
    /// id -> [value, max]
    pub boss_bars: BTreeMap<String, [i32; 2]>,
}

impl WorldSnapshot {
    pub fn capture(server: &MemoryServer) -> Self {
        use mdcommand_engine::CommandServer;

        let place = |dimension: mdcommand_core::DimensionId, pos: mdcommand_core::BlockPos| {
            format!("{} {} {} {}", dimension.as_str(), pos.x, pos.y, pos.z)
        };
        let blocks = server
            .placed_blocks()
            .into_iter()
            .map(|(dimension, pos, state)| (place(dimension, pos), state.to_string()))
            .collect();
        let block_entities = server
            .block_entities()
            .into_iter()
            .map(|(dimension, pos, data)| {
                (
                    place(dimension, pos),
                    mdcommand_core::Tag::Compound(data.clone()).to_string(),
                )
            })
            .collect();
        let entities = server
            .entities()
            .map(|entity| EntitySnapshot {
                name: entity.name.clone(),
                kind: entity.kind.to_string(),
                dimension: entity.dimension.as_str().to_string(),
                pos: entity.position.to_array(),
                rotation: [entity.rotation.yaw, entity.rotation.pitch],
                tags: entity.tags.iter().cloned().collect(),
                data: server
                    .entity_data(entity.id)
                    .map(|data| mdcommand_core::Tag::Compound(data).to_string())
                    .unwrap_or_default(),
            })
            .collect();
        let mut scores: BTreeMap<String, BTreeMap<String, i32>> = BTreeMap::new();
        for (holder, objective, value) in server.scores() {
            scores
                .entry(holder.to_string())
                .or_default()
                .insert(objective.to_string(), value);
        }
        let storage = server
            .storages()
            .map(|(id, data)| {
                (
                    id.to_string(),
                    mdcommand_core::Tag::Compound(data.clone()).to_string(),
                )
            })
            .collect();
        let boss_bars = server
            .boss_bars()
            .map(|(id, bar)| (id.to_string(), [bar.value, bar.max]))
            .collect();
        Self {
            blocks,
            block_entities,
            entities,
            scores,
            storage,
            boss_bars,
        }
    }
}

/// Assert that the world state matches the snapshot stored at `path`.
pub fn assert_world_snapshot<P: AsRef<Path>>(path: P, server: &MemoryServer) -> Result<()> {
    assert_json_snapshot(path, &WorldSnapshot::capture(server))
}

/// Assert that `value` matches the JSON snapshot stored at `path`.
///
/// With `MDC_UPDATE_SNAPSHOTS=1` the file is written instead.
pub fn assert_json_snapshot<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let actual = canonical_json(value)?;

    if should_update_snapshots() {
        return write_snapshot(path, &actual);
    }

    let expected = fs::read_to_string(path).with_context(|| {
        format!(
            "Snapshot missing at {} (run with {}=1 to create it)",
            path.display(),
            UPDATE_SNAPSHOTS_ENV
        )
    })?;
    if expected != actual {
        anyhow::bail!(
            "Snapshot mismatch at {} (run with {}=1 to update)\n--- expected\n{expected}--- actual\n{actual}",
            path.display(),
            UPDATE_SNAPSHOTS_ENV
        );
    }
    Ok(())
}

fn should_update_snapshots() -> bool {
    matches!(
        std::env::var(UPDATE_SNAPSHOTS_ENV).as_deref(),
        Ok("1" | "true" | "TRUE" | "yes" | "YES")
    )
}

fn write_snapshot(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create snapshot directory {}", parent.display()))?;
    }
    fs::write(path, contents)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))
}

/// Pretty JSON with object keys sorted at every level.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    let mut text =
        serde_json::to_string_pretty(&sort_keys(value)).context("Failed to format snapshot")?;
    text.push('\n');
    Ok(text)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(values) => Value::Array(values.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdcommand_core::{BlockPos, BlockState, DVec3, DimensionId, ResourceKey};
    use mdcommand_engine::CommandServer;

    #[test]
    fn capture_lists_changed_state() {
        let mut server = MemoryServer::new(0);
        server.put_block(
            DimensionId::Overworld,
            BlockPos::new(1, 64, -2),
            BlockState::simple(ResourceKey::minecraft("stone")),
        );
        let id = server.spawn_player("Alex", DimensionId::Overworld, DVec3::new(0.5, 64.0, 0.5));
        server.add_entity_tag(id, "seen");
        server.add_objective("kills").expect("new objective");
        server.set_score("Alex", "kills", 2);

        let snapshot = WorldSnapshot::capture(&server);
        assert_eq!(
            snapshot.blocks.get("overworld 1 64 -2").map(String::as_str),
            Some("minecraft:stone")
        );
        assert_eq!(snapshot.entities.len(), 1);
        assert_eq!(snapshot.entities[0].tags, vec!["seen".to_string()]);
        assert_eq!(snapshot.scores["Alex"]["kills"], 2);
    }

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let value = serde_json::json!({ "b": { "z": 1, "a": 2 }, "a": [ { "y": 0, "x": 1 } ] });
        let text = canonical_json(&value).expect("serializes");
        let a = text.find("\"a\"").expect("a present");
        let b = text.find("\"b\"").expect("b present");
        assert!(a < b);
        assert!(text.find("\"x\"").expect("x") < text.find("\"y\"").expect("y"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn mismatch_reports_update_hint() {
        let path = std::env::temp_dir().join(format!(
            "mdcommand-snapshot-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{}\n").expect("write golden");
        if should_update_snapshots() {
            return;
        }
        let err = assert_json_snapshot(&path, &serde_json::json!({ "a": 1 })).unwrap_err();
        assert!(err.to_string().contains(UPDATE_SNAPSHOTS_ENV));
        let _ = std::fs::remove_file(&path);
    }
}
