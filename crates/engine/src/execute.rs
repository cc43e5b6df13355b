//! The `execute` command tree.
//!
//! Every sub-command hands control back to the `execute` node through a fork,
//! redirect, gate or store edge, so clauses chain freely until `run` jumps to
//! the root or a trailing `if`/`unless` ends the command.

use crate::args::ArgumentKind;
use crate::condition::{ConditionKind, Polarity, RegionMode};
use crate::data::DataSourceKind;
use crate::graph::{CommandGraph, Executor, NodeId};
use crate::store::{BossBarField, NumericType, StoreMode, StoreTargetKind};
use crate::transform::{ForkTransform, RedirectTransform};

/// Permission level needed to see `execute`.
pub const EXECUTE_PERMISSION: u8 = 2;

/// Add `execute` under the root and return its node.
pub fn register(graph: &mut CommandGraph) -> NodeId {
    let root = graph.root();
    let exec = graph.literal(root, "execute");
    graph.requires(exec, EXECUTE_PERMISSION);

    let run = graph.literal(exec, "run");
    graph.redirect(run, root, RedirectTransform::Run);

    let as_ = graph.literal(exec, "as");
    fork_over_targets(graph, as_, exec, ForkTransform::As);
    let at = graph.literal(exec, "at");
    fork_over_targets(graph, at, exec, ForkTransform::At);

    let positioned = graph.literal(exec, "positioned");
    let positioned_as = graph.literal(positioned, "as");
    fork_over_targets(graph, positioned_as, exec, ForkTransform::PositionedAs);
    let pos = graph.argument(positioned, "pos", ArgumentKind::Vec3);
    graph.redirect(pos, exec, RedirectTransform::Positioned);

    let rotated = graph.literal(exec, "rotated");
    let rotated_as = graph.literal(rotated, "as");
    fork_over_targets(graph, rotated_as, exec, ForkTransform::RotatedAs);
    let rot = graph.argument(rotated, "rot", ArgumentKind::Rotation);
    graph.redirect(rot, exec, RedirectTransform::Rotated);

    let facing = graph.literal(exec, "facing");
    let facing_entity = graph.literal(facing, "entity");
    let targets = graph.argument(facing_entity, "targets", ArgumentKind::Entities);
    let anchor = graph.argument(targets, "anchor", ArgumentKind::Anchor);
    graph.fork(anchor, exec, ForkTransform::FacingEntity);
    let pos = graph.argument(facing, "pos", ArgumentKind::Vec3);
    graph.redirect(pos, exec, RedirectTransform::Facing);

    let anchored = graph.literal(exec, "anchored");
    let anchor = graph.argument(anchored, "anchor", ArgumentKind::Anchor);
    graph.redirect(anchor, exec, RedirectTransform::Anchored);

    let in_ = graph.literal(exec, "in");
    let dimension = graph.argument(in_, "dimension", ArgumentKind::Dimension);
    graph.redirect(dimension, exec, RedirectTransform::In);

    let align = graph.literal(exec, "align");
    let axes = graph.argument(align, "axes", ArgumentKind::Swizzle);
    graph.redirect(axes, exec, RedirectTransform::Align);

    for polarity in [Polarity::If, Polarity::Unless] {
        let branch = graph.literal(exec, polarity.literal());
        register_conditions(graph, branch, exec, polarity);
    }

    let store = graph.literal(exec, "store");
    for mode in StoreMode::ALL {
        let branch = graph.literal(store, mode.literal());
        register_store_targets(graph, branch, exec, mode);
    }

    exec
}

fn fork_over_targets(graph: &mut CommandGraph, parent: NodeId, exec: NodeId, transform: ForkTransform) {
    let targets = graph.argument(parent, "targets", ArgumentKind::Entities);
    graph.fork(targets, exec, transform);
}

/// `node` both ends a command as a test and gates the rest of the chain.
fn conditional(
    graph: &mut CommandGraph,
    node: NodeId,
    exec: NodeId,
    condition: ConditionKind,
    polarity: Polarity,
) {
    graph.executes(node, Executor::Conditional { condition, polarity });
    graph.gate(node, exec, condition, polarity);
}

fn data_source_argument(graph: &mut CommandGraph, parent: NodeId, kind: DataSourceKind) -> NodeId {
    let literal = graph.literal(parent, kind.literal());
    let argument = match kind {
        DataSourceKind::Block => ArgumentKind::BlockPos,
        DataSourceKind::Entity => ArgumentKind::Entity,
        DataSourceKind::Storage => ArgumentKind::ResourceKey,
    };
    graph.argument(literal, "target", argument)
}

fn register_conditions(graph: &mut CommandGraph, branch: NodeId, exec: NodeId, polarity: Polarity) {
    let block = graph.literal(branch, "block");
    let pos = graph.argument(block, "pos", ArgumentKind::BlockPos);
    let predicate = graph.argument(pos, "block", ArgumentKind::BlockPredicate);
    conditional(graph, predicate, exec, ConditionKind::Block, polarity);

    let blocks = graph.literal(branch, "blocks");
    let start = graph.argument(blocks, "start", ArgumentKind::BlockPos);
    let end = graph.argument(start, "end", ArgumentKind::BlockPos);
    let destination = graph.argument(end, "destination", ArgumentKind::BlockPos);
    for (literal, mode) in [("all", RegionMode::All), ("masked", RegionMode::Masked)] {
        let node = graph.literal(destination, literal);
        conditional(graph, node, exec, ConditionKind::Blocks(mode), polarity);
    }

    let score = graph.literal(branch, "score");
    let target = graph.argument(score, "target", ArgumentKind::ScoreHolder);
    let target_objective = graph.argument(target, "target_objective", ArgumentKind::Objective);
    let matches = graph.literal(target_objective, "matches");
    let range = graph.argument(matches, "range", ArgumentKind::IntRange);
    conditional(graph, range, exec, ConditionKind::ScoreMatches, polarity);
    let operation = graph.argument(target_objective, "operation", ArgumentKind::ScoreOperator);
    let source = graph.argument(operation, "source", ArgumentKind::ScoreHolder);
    let source_objective = graph.argument(source, "source_objective", ArgumentKind::Objective);
    conditional(graph, source_objective, exec, ConditionKind::ScoreCompare, polarity);

    let entity = graph.literal(branch, "entity");
    let entities = graph.argument(entity, "entities", ArgumentKind::Entities);
    conditional(graph, entities, exec, ConditionKind::Entity, polarity);

    let data = graph.literal(branch, "data");
    for kind in DataSourceKind::ALL {
        let target = data_source_argument(graph, data, kind);
        let path = graph.argument(target, "path", ArgumentKind::DataPath);
        conditional(graph, path, exec, ConditionKind::Data(kind), polarity);
    }

    let predicate = graph.literal(branch, "predicate");
    let id = graph.argument(predicate, "predicate", ArgumentKind::ResourceKey);
    conditional(graph, id, exec, ConditionKind::Predicate, polarity);

    let dimension = graph.literal(branch, "dimension");
    let id = graph.argument(dimension, "dimension", ArgumentKind::Dimension);
    conditional(graph, id, exec, ConditionKind::Dimension, polarity);

    let loaded = graph.literal(branch, "loaded");
    let pos = graph.argument(loaded, "pos", ArgumentKind::BlockPos);
    conditional(graph, pos, exec, ConditionKind::Loaded, polarity);
}

fn register_store_targets(graph: &mut CommandGraph, branch: NodeId, exec: NodeId, mode: StoreMode) {
    let score = graph.literal(branch, "score");
    let targets = graph.argument(score, "targets", ArgumentKind::ScoreHolders);
    let objective = graph.argument(targets, "objective", ArgumentKind::Objective);
    graph.store(objective, exec, mode, StoreTargetKind::Score);

    let bossbar = graph.literal(branch, "bossbar");
    let id = graph.argument(bossbar, "id", ArgumentKind::ResourceKey);
    for field in [BossBarField::Value, BossBarField::Max] {
        let node = graph.literal(id, field.literal());
        graph.store(node, exec, mode, StoreTargetKind::BossBar(field));
    }

    for source in DataSourceKind::ALL {
        let target = data_source_argument(graph, branch, source);
        let path = graph.argument(target, "path", ArgumentKind::DataPath);
        for numeric in NumericType::ALL {
            let literal = graph.literal(path, numeric.literal());
            let scale = graph.argument(literal, "scale", ArgumentKind::Double);
            graph.store(scale, exec, mode, StoreTargetKind::Data { source, numeric });
        }
    }
}
