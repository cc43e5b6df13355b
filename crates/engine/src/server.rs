use mdcommand_core::{BlockPos, BlockState, Compound, DVec3, DimensionId, ResourceKey, Rotation};

use crate::context::{ExecutionContext, OutputSink};
use crate::entity::{EntityId, EntityRef};
use crate::error::CommandResult;
use crate::message::Message;
use crate::selector::EntitySelector;

/// Inputs available to an externally defined predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateContext {
    pub dimension: DimensionId,
    pub origin: DVec3,
    pub this_entity: Option<EntityRef>,
}

/// Everything the engine needs from the game server.
///
/// The engine runs on the server's single command thread and calls these
/// methods inline; implementations mutate their state directly.
pub trait CommandServer {
    // Entities.

    /// Resolve a selector in selector-defined order.
    fn select_entities(
        &mut self,
        ctx: &ExecutionContext,
        selector: &EntitySelector,
    ) -> CommandResult<Vec<EntityRef>>;
    fn entity(&self, id: EntityId) -> Option<EntityRef>;
    fn entity_data(&self, id: EntityId) -> Option<Compound>;
    fn set_entity_data(&mut self, id: EntityId, data: Compound) -> CommandResult<()>;
    /// Returns false when the entity already had the tag.
    fn add_entity_tag(&mut self, id: EntityId, tag: &str) -> bool;
    /// Returns false when the entity did not have the tag.
    fn remove_entity_tag(&mut self, id: EntityId, tag: &str) -> bool;
    fn teleport_entity(
        &mut self,
        id: EntityId,
        dimension: DimensionId,
        position: DVec3,
        rotation: Rotation,
    ) -> CommandResult<()>;

    // Blocks.

    fn is_loaded(&self, dimension: DimensionId, pos: BlockPos) -> bool;
    /// `None` when the position is not loaded.
    fn block_state(&self, dimension: DimensionId, pos: BlockPos) -> Option<BlockState>;
    fn set_block_state(
        &mut self,
        dimension: DimensionId,
        pos: BlockPos,
        state: BlockState,
    ) -> CommandResult<()>;
    /// `None` when there is no block entity at the position.
    fn block_data(&self, dimension: DimensionId, pos: BlockPos) -> Option<Compound>;
    fn set_block_data(
        &mut self,
        dimension: DimensionId,
        pos: BlockPos,
        data: Compound,
    ) -> CommandResult<()>;

    // Command storage.

    /// Missing storages read as empty compounds.
    fn storage_data(&self, id: &ResourceKey) -> Compound;
    fn set_storage_data(&mut self, id: &ResourceKey, data: Compound);

    // Scoreboard.

    fn has_objective(&self, objective: &str) -> bool;
    fn add_objective(&mut self, objective: &str) -> CommandResult<()>;
    fn score(&self, holder: &str, objective: &str) -> Option<i32>;
    fn set_score(&mut self, holder: &str, objective: &str, value: i32);
    /// Every holder with at least one score.
    fn score_holders(&self) -> Vec<String>;

    // Boss bars.

    fn has_boss_bar(&self, id: &ResourceKey) -> bool;
    fn set_boss_bar_value(&mut self, id: &ResourceKey, value: i32);
    fn set_boss_bar_max(&mut self, id: &ResourceKey, max: i32);

    // Predicates.

    /// `None` when no predicate with this id exists.
    fn test_predicate(&mut self, id: &ResourceKey, ctx: &PredicateContext) -> Option<bool>;

    // Feedback.

    fn send_feedback(&mut self, sink: &OutputSink, message: &Message, broadcast_to_ops: bool);
    fn send_failure(&mut self, sink: &OutputSink, message: &Message);
    /// Chat line delivered to every player.
    fn broadcast(&mut self, message: &Message);
}
