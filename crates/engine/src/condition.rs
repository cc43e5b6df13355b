//! `if` / `unless` tests.
//!
//! Every test kind is a variant of [`Condition`] and goes through
//! [`Condition::evaluate`]. The outcome is either a plain pass/fail or a count
//! of matches; [`Polarity`] decides which outcome is accepted but never changes
//! the count that gets reported.

use mdcommand_core::{
    BlockBox, BlockPos, BlockPredicate, DataPath, DimensionId, IntRange, ResourceKey,
};

use crate::args::Arguments;
use crate::context::ExecutionContext;
use crate::coords::Coordinates;
use crate::data::{DataSource, DataSourceKind};
use crate::error::{CommandError, CommandResult};
use crate::message::Message;
use crate::selector::{EntitySelector, ScoreHolder};
use crate::server::{CommandServer, PredicateContext};

/// Largest region `if blocks` will compare.
pub const MAX_REGION_VOLUME: u64 = 32768;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    If,
    Unless,
}

impl Polarity {
    pub fn literal(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Unless => "unless",
        }
    }

    pub fn accepts(self, matched: bool) -> bool {
        matched == (self == Self::If)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOp {
    Less,
    LessOrEqual,
    Equal,
    Greater,
    GreaterOrEqual,
}

impl ScoreOp {
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "<" => Self::Less,
            "<=" => Self::LessOrEqual,
            "=" => Self::Equal,
            ">" => Self::Greater,
            ">=" => Self::GreaterOrEqual,
            _ => return None,
        })
    }

    pub fn test(self, target: i32, source: i32) -> bool {
        match self {
            Self::Less => target < source,
            Self::LessOrEqual => target <= source,
            Self::Equal => target == source,
            Self::Greater => target > source,
            Self::GreaterOrEqual => target >= source,
        }
    }
}

/// Whether `if blocks` skips air in the source region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionMode {
    All,
    Masked,
}

/// Raw result of a test before polarity is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Test(bool),
    /// `None` when nothing matched. A match may still count zero items
    /// (a masked region with only air).
    Count(Option<u32>),
}

impl Outcome {
    fn counted(count: usize) -> Self {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        Self::Count((count > 0).then_some(count))
    }

    pub fn matched(self) -> bool {
        match self {
            Self::Test(matched) => matched,
            Self::Count(count) => count.is_some(),
        }
    }

    /// Feedback and result when used as the final command, or the failure.
    pub fn verdict(self, polarity: Polarity) -> CommandResult<(Message, i32)> {
        let pass = || Message::new("commands.execute.conditional.pass");
        match (self, polarity) {
            (Self::Count(Some(count)), Polarity::If) => Ok((
                Message::new("commands.execute.conditional.pass_count").arg(count),
                i32::try_from(count).unwrap_or(i32::MAX),
            )),
            (Self::Count(None), Polarity::If) => Err(CommandError::ConditionalFailed),
            (Self::Count(None), Polarity::Unless) => Ok((pass(), 1)),
            (Self::Count(Some(count)), Polarity::Unless) => {
                Err(CommandError::ConditionalFailedCount { count })
            }
            (Self::Test(matched), polarity) if polarity.accepts(matched) => Ok((pass(), 1)),
            (Self::Test(_), _) => Err(CommandError::ConditionalFailed),
        }
    }
}

/// A fully bound test.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Block {
        pos: Coordinates,
        predicate: BlockPredicate,
    },
    Blocks {
        start: Coordinates,
        end: Coordinates,
        destination: Coordinates,
        mode: RegionMode,
    },
    ScoreCompare {
        target: ScoreHolder,
        target_objective: String,
        op: ScoreOp,
        source: ScoreHolder,
        source_objective: String,
    },
    ScoreMatches {
        target: ScoreHolder,
        objective: String,
        range: IntRange,
    },
    Entity(EntitySelector),
    Data {
        source: DataSource,
        path: DataPath,
    },
    Predicate(ResourceKey),
    Dimension(DimensionId),
    Loaded(Coordinates),
}

impl Condition {
    pub fn evaluate(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
    ) -> CommandResult<Outcome> {
        match self {
            Self::Block { pos, predicate } => {
                let pos = loaded_pos(server, ctx, pos)?;
                let state = server
                    .block_state(ctx.dimension(), pos)
                    .ok_or(CommandError::NotLoaded { pos })?;
                Ok(Outcome::Test(predicate.matches(&state)))
            }
            Self::Blocks {
                start,
                end,
                destination,
                mode,
            } => compare_regions(
                server,
                ctx,
                BlockBox::from_corners(start.block_pos(ctx), end.block_pos(ctx)),
                destination.block_pos(ctx),
                *mode,
            ),
            Self::ScoreCompare {
                target,
                target_objective,
                op,
                source,
                source_objective,
            } => {
                let target = target.resolve_single(server, ctx)?;
                let source = source.resolve_single(server, ctx)?;
                require_objective(server, target_objective)?;
                require_objective(server, source_objective)?;
                let matched = match (
                    server.score(&target, target_objective),
                    server.score(&source, source_objective),
                ) {
                    (Some(a), Some(b)) => op.test(a, b),
                    _ => false,
                };
                Ok(Outcome::Test(matched))
            }
            Self::ScoreMatches {
                target,
                objective,
                range,
            } => {
                let target = target.resolve_single(server, ctx)?;
                require_objective(server, objective)?;
                let matched = server
                    .score(&target, objective)
                    .is_some_and(|score| range.matches(score));
                Ok(Outcome::Test(matched))
            }
            Self::Entity(selector) => {
                let found = server.select_entities(ctx, selector)?;
                Ok(Outcome::counted(found.len()))
            }
            Self::Data { source, path } => {
                let accessor = source.resolve(server, ctx)?;
                let data = accessor.get_data(server)?;
                Ok(Outcome::counted(path.count_matching(&data)))
            }
            Self::Predicate(id) => {
                let predicate_ctx = PredicateContext {
                    dimension: ctx.dimension(),
                    origin: ctx.position(),
                    this_entity: ctx.entity().cloned(),
                };
                server
                    .test_predicate(id, &predicate_ctx)
                    .map(Outcome::Test)
                    .ok_or_else(|| CommandError::UnknownPredicate(id.clone()))
            }
            Self::Dimension(dimension) => Ok(Outcome::Test(ctx.dimension() == *dimension)),
            Self::Loaded(pos) => {
                let pos = pos.block_pos(ctx);
                Ok(Outcome::Test(server.is_loaded(ctx.dimension(), pos)))
            }
        }
    }

    /// Zero or one branch: `ctx` itself when the test agrees with `polarity`.
    pub fn gate(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
        polarity: Polarity,
    ) -> CommandResult<Vec<ExecutionContext>> {
        let outcome = self.evaluate(server, ctx)?;
        if polarity.accepts(outcome.matched()) {
            Ok(vec![ctx.clone()])
        } else {
            Ok(Vec::new())
        }
    }

    /// `execute if ...` with nothing after it.
    pub fn run_terminal(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
        polarity: Polarity,
    ) -> CommandResult<i32> {
        let (message, result) = self.evaluate(server, ctx)?.verdict(polarity)?;
        ctx.send_success(server, message, false);
        Ok(result)
    }
}

fn require_objective(server: &dyn CommandServer, objective: &str) -> CommandResult<()> {
    if server.has_objective(objective) {
        Ok(())
    } else {
        Err(CommandError::UnknownObjective(objective.to_string()))
    }
}

fn loaded_pos(
    server: &dyn CommandServer,
    ctx: &ExecutionContext,
    coords: &Coordinates,
) -> CommandResult<BlockPos> {
    let pos = coords.block_pos(ctx);
    if server.is_loaded(ctx.dimension(), pos) {
        Ok(pos)
    } else {
        Err(CommandError::NotLoaded { pos })
    }
}

/// Every chunk column the box touches, top and bottom.
fn region_loaded(server: &dyn CommandServer, dimension: DimensionId, region: &BlockBox) -> bool {
    let (min_cx, min_cz) = region.min.chunk_column();
    let (max_cx, max_cz) = region.max.chunk_column();
    (min_cx..=max_cx).all(|cx| {
        (min_cz..=max_cz).all(|cz| {
            [region.min.y, region.max.y]
                .iter()
                .all(|&y| server.is_loaded(dimension, BlockPos::new(cx * 16, y, cz * 16)))
        })
    })
}

fn compare_regions(
    server: &dyn CommandServer,
    ctx: &ExecutionContext,
    source: BlockBox,
    destination: BlockPos,
    mode: RegionMode,
) -> CommandResult<Outcome> {
    let volume = source.volume();
    if volume > MAX_REGION_VOLUME {
        return Err(CommandError::AreaTooLarge {
            max: MAX_REGION_VOLUME,
            actual: volume,
        });
    }
    let target = source.moved_to(destination);
    let dimension = ctx.dimension();
    for (region, corner) in [(&source, source.min), (&target, target.min)] {
        if !region_loaded(server, dimension, region) {
            return Err(CommandError::NotLoaded { pos: corner });
        }
    }

    // Coordinates wrap at the i32 edges, the same way `BlockPos::offset` does.
    let (dx, dy, dz) = (
        target.min.x.wrapping_sub(source.min.x),
        target.min.y.wrapping_sub(source.min.y),
        target.min.z.wrapping_sub(source.min.z),
    );
    let mut count = 0u32;
    for pos in source.positions() {
        let here = server
            .block_state(dimension, pos)
            .ok_or(CommandError::NotLoaded { pos })?;
        if mode == RegionMode::Masked && here.is_air() {
            continue;
        }
        let there_pos = pos.offset(dx, dy, dz);
        let there = server
            .block_state(dimension, there_pos)
            .ok_or(CommandError::NotLoaded { pos: there_pos })?;
        if here != there {
            return Ok(Outcome::Count(None));
        }
        if server.block_data(dimension, pos) != server.block_data(dimension, there_pos) {
            return Ok(Outcome::Count(None));
        }
        count += 1;
    }
    Ok(Outcome::Count(Some(count)))
}

/// Which test a graph branch binds, read from the stage's arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Block,
    Blocks(RegionMode),
    ScoreCompare,
    ScoreMatches,
    Entity,
    Data(DataSourceKind),
    Predicate,
    Dimension,
    Loaded,
}

impl ConditionKind {
    pub fn bind(self, args: &Arguments) -> CommandResult<Condition> {
        Ok(match self {
            Self::Block => Condition::Block {
                pos: *args.coordinates("pos")?,
                predicate: args.block_predicate("block")?.clone(),
            },
            Self::Blocks(mode) => Condition::Blocks {
                start: *args.coordinates("start")?,
                end: *args.coordinates("end")?,
                destination: *args.coordinates("destination")?,
                mode,
            },
            Self::ScoreCompare => Condition::ScoreCompare {
                target: args.score_holder("target")?.clone(),
                target_objective: args.string("target_objective")?.clone(),
                op: *args.score_op("operation")?,
                source: args.score_holder("source")?.clone(),
                source_objective: args.string("source_objective")?.clone(),
            },
            Self::ScoreMatches => Condition::ScoreMatches {
                target: args.score_holder("target")?.clone(),
                objective: args.string("target_objective")?.clone(),
                range: *args.int_range("range")?,
            },
            Self::Entity => Condition::Entity(args.selector("entities")?.clone()),
            Self::Data(kind) => Condition::Data {
                source: kind.bind(args, "target")?,
                path: args.data_path("path")?.clone(),
            },
            Self::Predicate => Condition::Predicate(args.resource_key("predicate")?.clone()),
            Self::Dimension => Condition::Dimension(*args.dimension("dimension")?),
            Self::Loaded => Condition::Loaded(*args.coordinates("pos")?),
        })
    }
}
