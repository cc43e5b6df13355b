//! In-memory [`CommandServer`] used by tests, fixtures and the headless binary.

use mdcommand_core::{
    BlockPos, BlockState, Compound, DVec3, DimensionId, ResourceKey, Rotation, Tag,
};
use mdcommand_engine::{
    CommandError, CommandResult, CommandServer, EntityId, EntityRef, EntitySelector,
    ExecutionContext, Message, OutputSink, PredicateContext,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Lowest buildable y coordinate.
pub const MIN_BUILD_HEIGHT: i32 = -64;
/// One past the highest buildable y coordinate.
pub const MAX_BUILD_HEIGHT: i32 = 320;

/// Keys synthesized from entity state; they are never stored in custom data.
const COMPUTED_ENTITY_KEYS: [&str; 4] = ["id", "Pos", "Rotation", "Tags"];

/// Rule behind a named predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredicateRule {
    /// Always the given value.
    Constant { value: bool },
    /// Passes when the context has a source entity.
    HasEntity,
    /// Passes when the origin is at or above `y`.
    MinY { y: f64 },
    /// Passes in the given dimension.
    InDimension { dimension: DimensionId },
    /// Passes when the source entity carries `tag`.
    EntityTag { tag: String },
}

impl PredicateRule {
    /// Evaluate against a predicate context.
    pub fn test(&self, ctx: &PredicateContext) -> bool {
        match self {
            Self::Constant { value } => *value,
            Self::HasEntity => ctx.this_entity.is_some(),
            Self::MinY { y } => ctx.origin.y >= *y,
            Self::InDimension { dimension } => ctx.dimension == *dimension,
            Self::EntityTag { tag } => ctx
                .this_entity
                .as_ref()
                .is_some_and(|entity| entity.tags.contains(tag)),
        }
    }
}

/// Value and maximum of a boss bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossBar {
    pub value: i32,
    pub max: i32,
}

impl Default for BossBar {
    fn default() -> Self {
        Self { value: 0, max: 100 }
    }
}

/// Kind of a recorded feedback line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Success,
    Failure,
    /// Copy of a success sent to operators.
    Ops,
    /// Chat line delivered to every player.
    Broadcast,
}

/// One line of feedback as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackLine {
    pub kind: FeedbackKind,
    /// `console`, a player name, or `*` for broadcasts.
    pub audience: String,
    pub message: Message,
}

impl fmt::Display for FeedbackLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            FeedbackKind::Success => "+",
            FeedbackKind::Failure => "!",
            FeedbackKind::Ops => "@",
            FeedbackKind::Broadcast => "*",
        };
        write!(f, "{marker} [{}] {}", self.audience, self.message)
    }
}

/// Game rules that shape feedback delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackSettings {
    /// Deliver success feedback to players.
    pub send_command_feedback: bool,
    /// Copy broadcast successes to operators.
    pub broadcast_to_ops: bool,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            send_command_feedback: true,
            broadcast_to_ops: true,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredEntity {
    entity: EntityRef,
    data: Compound,
}

impl StoredEntity {
    fn full_data(&self) -> Compound {
        let mut data = self.data.clone();
        let entity = &self.entity;
        data.insert("id".to_string(), Tag::String(entity.kind.to_string()));
        data.insert(
            "Pos".to_string(),
            Tag::List(vec![
                Tag::Double(entity.position.x),
                Tag::Double(entity.position.y),
                Tag::Double(entity.position.z),
            ]),
        );
        data.insert(
            "Rotation".to_string(),
            Tag::List(vec![
                Tag::Float(entity.rotation.yaw),
                Tag::Float(entity.rotation.pitch),
            ]),
        );
        if !entity.tags.is_empty() {
            data.insert(
                "Tags".to_string(),
                Tag::List(entity.tags.iter().cloned().map(Tag::String).collect()),
            );
        }
        data
    }
}

/// A small deterministic world: everything a command can touch, kept in maps.
///
/// Unset loaded blocks read as air. A column is loaded unless it was marked
/// unloaded with [`MemoryServer::unload_column`], and only within build height.
#[derive(Debug)]
pub struct MemoryServer {
    blocks: HashMap<(DimensionId, BlockPos), BlockState>,
    block_entities: HashMap<(DimensionId, BlockPos), Compound>,
    unloaded: HashSet<(DimensionId, i32, i32)>,
    entities: Vec<StoredEntity>,
    next_entity: u64,
    storage: BTreeMap<ResourceKey, Compound>,
    objectives: BTreeSet<String>,
    scores: BTreeMap<String, BTreeMap<String, i32>>,
    boss_bars: BTreeMap<ResourceKey, BossBar>,
    predicates: BTreeMap<ResourceKey, PredicateRule>,
    feedback: Vec<FeedbackLine>,
    settings: FeedbackSettings,
    block_reads: Cell<u64>,
    rng: StdRng,
}

impl MemoryServer {
    /// Empty world; `seed` drives `@r`.
    pub fn new(seed: u64) -> Self {
        Self {
            blocks: HashMap::new(),
            block_entities: HashMap::new(),
            unloaded: HashSet::new(),
            entities: Vec::new(),
            next_entity: 1,
            storage: BTreeMap::new(),
            objectives: BTreeSet::new(),
            scores: BTreeMap::new(),
            boss_bars: BTreeMap::new(),
            predicates: BTreeMap::new(),
            feedback: Vec::new(),
            settings: FeedbackSettings::default(),
            block_reads: Cell::new(0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn settings(&self) -> FeedbackSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: FeedbackSettings) {
        self.settings = settings;
    }

    // World setup.

    /// Place a block without any checks.
    pub fn put_block(&mut self, dimension: DimensionId, pos: BlockPos, state: BlockState) {
        if state.is_air() {
            self.blocks.remove(&(dimension, pos));
        } else {
            self.blocks.insert((dimension, pos), state);
        }
    }

    /// Place a block together with its block entity data.
    pub fn put_block_entity(
        &mut self,
        dimension: DimensionId,
        pos: BlockPos,
        state: BlockState,
        data: Compound,
    ) {
        self.put_block(dimension, pos, state);
        self.block_entities.insert((dimension, pos), data);
    }

    /// Mark the chunk column `(chunk_x, chunk_z)` as not loaded.
    pub fn unload_column(&mut self, dimension: DimensionId, chunk_x: i32, chunk_z: i32) {
        self.unloaded.insert((dimension, chunk_x, chunk_z));
    }

    /// Add an entity; `id`, `Pos`, `Rotation` and `Tags` in `data` are
    /// ignored since they are derived from the entity itself.
    pub fn spawn(&mut self, mut entity: EntityRef, mut data: Compound) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        entity.id = id;
        for key in COMPUTED_ENTITY_KEYS {
            data.remove(key);
        }
        self.entities.push(StoredEntity { entity, data });
        id
    }

    /// Spawn a player at `position` in `dimension`.
    pub fn spawn_player(&mut self, name: &str, dimension: DimensionId, position: DVec3) -> EntityId {
        self.spawn(
            entity_template(ResourceKey::minecraft("player"), name, dimension, position),
            Compound::new(),
        )
    }

    /// Spawn a non-player entity; `kind` may omit the `minecraft:` namespace.
    pub fn spawn_mob(
        &mut self,
        kind: &str,
        name: &str,
        dimension: DimensionId,
        position: DVec3,
    ) -> CommandResult<EntityId> {
        let kind = ResourceKey::parse(kind)
            .map_err(|err| CommandError::syntax(format!("invalid entity type: {err}"), 0))?;
        Ok(self.spawn(
            entity_template(kind, name, dimension, position),
            Compound::new(),
        ))
    }

    pub fn define_predicate(&mut self, id: ResourceKey, rule: PredicateRule) {
        self.predicates.insert(id, rule);
    }

    pub fn create_boss_bar(&mut self, id: ResourceKey, bar: BossBar) {
        self.boss_bars.insert(id, bar);
    }

    // Inspection.

    /// Number of block state and block entity reads so far.
    pub fn block_reads(&self) -> u64 {
        self.block_reads.get()
    }

    pub fn reset_block_reads(&self) {
        self.block_reads.set(0);
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityRef> + '_ {
        self.entities.iter().map(|stored| &stored.entity)
    }

    /// Entity with this display name, if any.
    pub fn entity_named(&self, name: &str) -> Option<&EntityRef> {
        self.entities().find(|entity| entity.name == name)
    }

    pub fn boss_bar(&self, id: &ResourceKey) -> Option<BossBar> {
        self.boss_bars.get(id).copied()
    }

    pub fn boss_bars(&self) -> impl Iterator<Item = (&ResourceKey, &BossBar)> + '_ {
        self.boss_bars.iter()
    }

    pub fn objectives(&self) -> impl Iterator<Item = &str> + '_ {
        self.objectives.iter().map(String::as_str)
    }

    /// Every set score as `(holder, objective, value)`, sorted.
    pub fn scores(&self) -> impl Iterator<Item = (&str, &str, i32)> + '_ {
        self.scores.iter().flat_map(|(holder, scores)| {
            scores
                .iter()
                .map(move |(objective, value)| (holder.as_str(), objective.as_str(), *value))
        })
    }

    /// Non-air blocks, sorted by dimension then position.
    pub fn placed_blocks(&self) -> Vec<(DimensionId, BlockPos, &BlockState)> {
        let mut blocks: Vec<_> = self
            .blocks
            .iter()
            .map(|((dimension, pos), state)| (*dimension, *pos, state))
            .collect();
        blocks.sort_by_key(|(dimension, pos, _)| (*dimension, *pos));
        blocks
    }

    /// Block entity documents, sorted by dimension then position.
    pub fn block_entities(&self) -> Vec<(DimensionId, BlockPos, &Compound)> {
        let mut entries: Vec<_> = self
            .block_entities
            .iter()
            .map(|((dimension, pos), data)| (*dimension, *pos, data))
            .collect();
        entries.sort_by_key(|(dimension, pos, _)| (*dimension, *pos));
        entries
    }

    pub fn storages(&self) -> impl Iterator<Item = (&ResourceKey, &Compound)> + '_ {
        self.storage.iter()
    }

    pub fn feedback(&self) -> &[FeedbackLine] {
        &self.feedback
    }

    /// Drain recorded feedback.
    pub fn take_feedback(&mut self) -> Vec<FeedbackLine> {
        std::mem::take(&mut self.feedback)
    }

    /// Translation keys of recorded feedback, in order.
    pub fn feedback_keys(&self) -> Vec<&'static str> {
        self.feedback.iter().map(|line| line.message.key).collect()
    }

    fn stored(&self, id: EntityId) -> Option<&StoredEntity> {
        self.entities.iter().find(|stored| stored.entity.id == id)
    }

    fn stored_mut(&mut self, id: EntityId) -> Option<&mut StoredEntity> {
        self.entities.iter_mut().find(|stored| stored.entity.id == id)
    }

    fn record(&mut self, kind: FeedbackKind, audience: impl Into<String>, message: &Message) {
        self.feedback.push(FeedbackLine {
            kind,
            audience: audience.into(),
            message: message.clone(),
        });
    }

    fn count_read(&self) {
        self.block_reads.set(self.block_reads.get() + 1);
    }
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Eye height by entity type, falling back to a generic mob height.
pub fn default_eye_height(kind: &ResourceKey) -> f64 {
    match kind.path() {
        "player" => 1.62,
        "zombie" | "husk" | "drowned" | "villager" => 1.74,
        "skeleton" | "stray" => 1.74,
        "creeper" => 1.445,
        "cow" => 1.3,
        "pig" => 0.765,
        "armor_stand" => 1.7775,
        _ => 1.5,
    }
}

fn entity_template(
    kind: ResourceKey,
    name: &str,
    dimension: DimensionId,
    position: DVec3,
) -> EntityRef {
    EntityRef {
        id: EntityId(0),
        name: name.to_string(),
        eye_height: default_eye_height(&kind),
        kind,
        dimension,
        position,
        rotation: Rotation::default(),
        tags: BTreeSet::new(),
    }
}

fn audience(sink: &OutputSink) -> Option<String> {
    match sink {
        OutputSink::Silent => None,
        OutputSink::Console => Some("console".to_string()),
        OutputSink::Player { name } => Some(name.clone()),
    }
}

impl CommandServer for MemoryServer {
    fn select_entities(
        &mut self,
        ctx: &ExecutionContext,
        selector: &EntitySelector,
    ) -> CommandResult<Vec<EntityRef>> {
        let candidates: Vec<EntityRef> = self.entities().cloned().collect();
        Ok(selector.select(ctx, candidates, &mut self.rng))
    }

    fn entity(&self, id: EntityId) -> Option<EntityRef> {
        self.stored(id).map(|stored| stored.entity.clone())
    }

    fn entity_data(&self, id: EntityId) -> Option<Compound> {
        self.stored(id).map(StoredEntity::full_data)
    }

    fn set_entity_data(&mut self, id: EntityId, mut data: Compound) -> CommandResult<()> {
        let stored = self.stored_mut(id).ok_or(CommandError::EntityNotFound)?;
        if stored.entity.is_player() {
            return Err(CommandError::Failed(Message::new("commands.data.entity.invalid")));
        }
        for key in COMPUTED_ENTITY_KEYS {
            data.remove(key);
        }
        stored.data = data;
        Ok(())
    }

    fn add_entity_tag(&mut self, id: EntityId, tag: &str) -> bool {
        self.stored_mut(id)
            .is_some_and(|stored| stored.entity.tags.insert(tag.to_string()))
    }

    fn remove_entity_tag(&mut self, id: EntityId, tag: &str) -> bool {
        self.stored_mut(id)
            .is_some_and(|stored| stored.entity.tags.remove(tag))
    }

    fn teleport_entity(
        &mut self,
        id: EntityId,
        dimension: DimensionId,
        position: DVec3,
        rotation: Rotation,
    ) -> CommandResult<()> {
        let stored = self.stored_mut(id).ok_or(CommandError::EntityNotFound)?;
        stored.entity.dimension = dimension;
        stored.entity.position = position;
        stored.entity.rotation = rotation;
        Ok(())
    }

    fn is_loaded(&self, dimension: DimensionId, pos: BlockPos) -> bool {
        let (chunk_x, chunk_z) = pos.chunk_column();
        (MIN_BUILD_HEIGHT..MAX_BUILD_HEIGHT).contains(&pos.y)
            && !self.unloaded.contains(&(dimension, chunk_x, chunk_z))
    }

    fn block_state(&self, dimension: DimensionId, pos: BlockPos) -> Option<BlockState> {
        if !self.is_loaded(dimension, pos) {
            return None;
        }
        self.count_read();
        Some(
            self.blocks
                .get(&(dimension, pos))
                .cloned()
                .unwrap_or_else(BlockState::air),
        )
    }

    fn set_block_state(
        &mut self,
        dimension: DimensionId,
        pos: BlockPos,
        state: BlockState,
    ) -> CommandResult<()> {
        if !self.is_loaded(dimension, pos) {
            return Err(CommandError::NotLoaded { pos });
        }
        self.block_entities.remove(&(dimension, pos));
        self.put_block(dimension, pos, state);
        Ok(())
    }

    fn block_data(&self, dimension: DimensionId, pos: BlockPos) -> Option<Compound> {
        if !self.is_loaded(dimension, pos) {
            return None;
        }
        self.count_read();
        self.block_entities.get(&(dimension, pos)).cloned()
    }

    fn set_block_data(
        &mut self,
        dimension: DimensionId,
        pos: BlockPos,
        data: Compound,
    ) -> CommandResult<()> {
        let slot = self
            .block_entities
            .get_mut(&(dimension, pos))
            .ok_or(CommandError::NotABlockEntity { pos })?;
        *slot = data;
        Ok(())
    }

    fn storage_data(&self, id: &ResourceKey) -> Compound {
        self.storage.get(id).cloned().unwrap_or_default()
    }

    fn set_storage_data(&mut self, id: &ResourceKey, data: Compound) {
        self.storage.insert(id.clone(), data);
    }

    fn has_objective(&self, objective: &str) -> bool {
        self.objectives.contains(objective)
    }

    fn add_objective(&mut self, objective: &str) -> CommandResult<()> {
        if !self.objectives.insert(objective.to_string()) {
            return Err(CommandError::DuplicateObjective(objective.to_string()));
        }
        Ok(())
    }

    fn score(&self, holder: &str, objective: &str) -> Option<i32> {
        self.scores.get(holder)?.get(objective).copied()
    }

    fn set_score(&mut self, holder: &str, objective: &str, value: i32) {
        if !self.objectives.contains(objective) {
            debug!(holder, objective, "score for unknown objective dropped");
            return;
        }
        self.scores
            .entry(holder.to_string())
            .or_default()
            .insert(objective.to_string(), value);
    }

    fn score_holders(&self) -> Vec<String> {
        self.scores
            .iter()
            .filter(|(_, scores)| !scores.is_empty())
            .map(|(holder, _)| holder.clone())
            .collect()
    }

    fn has_boss_bar(&self, id: &ResourceKey) -> bool {
        self.boss_bars.contains_key(id)
    }

    fn set_boss_bar_value(&mut self, id: &ResourceKey, value: i32) {
        if let Some(bar) = self.boss_bars.get_mut(id) {
            bar.value = value;
        }
    }

    fn set_boss_bar_max(&mut self, id: &ResourceKey, max: i32) {
        if let Some(bar) = self.boss_bars.get_mut(id) {
            bar.max = max.max(1);
        }
    }

    fn test_predicate(&mut self, id: &ResourceKey, ctx: &PredicateContext) -> Option<bool> {
        self.predicates.get(id).map(|rule| rule.test(ctx))
    }

    fn send_feedback(&mut self, sink: &OutputSink, message: &Message, broadcast_to_ops: bool) {
        let Some(audience) = audience(sink) else {
            return;
        };
        let is_player = matches!(sink, OutputSink::Player { .. });
        if !is_player || self.settings.send_command_feedback {
            self.record(FeedbackKind::Success, audience, message);
        }
        if broadcast_to_ops && self.settings.broadcast_to_ops {
            self.record(FeedbackKind::Ops, "ops", message);
        }
    }

    fn send_failure(&mut self, sink: &OutputSink, message: &Message) {
        if let Some(audience) = audience(sink) {
            self.record(FeedbackKind::Failure, audience, message);
        }
    }

    fn broadcast(&mut self, message: &Message) {
        self.record(FeedbackKind::Broadcast, "*", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> BlockState {
        BlockState::simple(ResourceKey::minecraft("stone"))
    }

    #[test]
    fn unset_blocks_read_as_air_and_count_reads() {
        let server = MemoryServer::new(1);
        let pos = BlockPos::new(0, 64, 0);
        assert_eq!(
            server.block_state(DimensionId::Overworld, pos),
            Some(BlockState::air())
        );
        assert_eq!(server.block_reads(), 1);
        server.reset_block_reads();
        assert_eq!(server.block_reads(), 0);
    }

    #[test]
    fn unloaded_columns_and_out_of_height_are_not_loaded() {
        let mut server = MemoryServer::new(1);
        server.unload_column(DimensionId::Overworld, 2, -1);
        assert!(!server.is_loaded(DimensionId::Overworld, BlockPos::new(40, 64, -5)));
        assert!(server.is_loaded(DimensionId::Nether, BlockPos::new(40, 64, -5)));
        assert!(!server.is_loaded(DimensionId::Overworld, BlockPos::new(0, 320, 0)));
        assert!(server.is_loaded(DimensionId::Overworld, BlockPos::new(0, -64, 0)));
        assert_eq!(
            server.block_state(DimensionId::Overworld, BlockPos::new(40, 64, -5)),
            None
        );
        assert_eq!(server.block_reads(), 0);
    }

    #[test]
    fn replacing_a_block_drops_its_block_entity() {
        let mut server = MemoryServer::new(1);
        let pos = BlockPos::new(1, 64, 1);
        let chest = BlockState::simple(ResourceKey::minecraft("chest"));
        server.put_block_entity(DimensionId::Overworld, pos, chest, Compound::new());
        assert!(server.block_data(DimensionId::Overworld, pos).is_some());
        server
            .set_block_state(DimensionId::Overworld, pos, stone())
            .expect("loaded");
        assert!(server.block_data(DimensionId::Overworld, pos).is_none());
    }

    #[test]
    fn entity_data_exposes_position_and_tags() {
        let mut server = MemoryServer::new(1);
        let id = server
            .spawn_mob("zombie", "Zed", DimensionId::Overworld, DVec3::new(1.0, 64.0, 2.0))
            .expect("valid kind");
        assert!(server.add_entity_tag(id, "boss"));
        assert!(!server.add_entity_tag(id, "boss"));
        let data = server.entity_data(id).expect("spawned");
        assert_eq!(data.get("id"), Some(&Tag::String("minecraft:zombie".into())));
        assert_eq!(
            data.get("Tags"),
            Some(&Tag::List(vec![Tag::String("boss".into())]))
        );
        assert!(matches!(data.get("Pos"), Some(Tag::List(items)) if items.len() == 3));
    }

    #[test]
    fn player_data_cannot_be_modified() {
        let mut server = MemoryServer::new(1);
        let id = server.spawn_player("Alex", DimensionId::Overworld, DVec3::ZERO);
        let err = server.set_entity_data(id, Compound::new()).unwrap_err();
        assert_eq!(err.message().key, "commands.data.entity.invalid");
    }

    #[test]
    fn duplicate_objective_is_rejected() {
        let mut server = MemoryServer::new(1);
        server.add_objective("kills").expect("first add");
        assert_eq!(
            server.add_objective("kills"),
            Err(CommandError::DuplicateObjective("kills".into()))
        );
    }

    #[test]
    fn feedback_respects_settings() {
        let mut server = MemoryServer::new(1);
        server.set_settings(FeedbackSettings {
            send_command_feedback: false,
            broadcast_to_ops: true,
        });
        let player = OutputSink::Player {
            name: "Alex".into(),
        };
        let msg = Message::new("commands.say.test");
        server.send_feedback(&player, &msg, true);
        server.send_feedback(&OutputSink::Console, &msg, false);
        server.send_feedback(&OutputSink::Silent, &msg, true);
        let kinds: Vec<_> = server.feedback().iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![FeedbackKind::Ops, FeedbackKind::Success]
        );
        assert_eq!(
            server.feedback()[1].to_string(),
            "+ [console] commands.say.test"
        );
    }

    #[test]
    fn predicate_rules_evaluate_against_context() {
        let ctx = PredicateContext {
            dimension: DimensionId::Nether,
            origin: DVec3::new(0.0, 70.0, 0.0),
            this_entity: None,
        };
        assert!(PredicateRule::MinY { y: 64.0 }.test(&ctx));
        assert!(!PredicateRule::HasEntity.test(&ctx));
        assert!(PredicateRule::InDimension {
            dimension: DimensionId::Nether
        }
        .test(&ctx));
        assert!(!PredicateRule::EntityTag { tag: "x".into() }.test(&ctx));
    }
}
