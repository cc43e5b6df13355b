//! Typed argument parsers and the per-stage argument map.

use mdcommand_core::{
    BlockPredicate, BlockState, DataPath, DimensionId, IntRange, ResourceKey,
};

use crate::condition::ScoreOp;
use crate::context::Anchor;
use crate::coords::{Coordinates, RotationArg, Swizzle};
use crate::error::{CommandError, CommandResult};
use crate::reader::StringReader;
use crate::selector::{EntitySelector, ScoreHolder};

/// Parser attached to an argument node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Entities,
    /// A selector that may match at most one entity.
    Entity,
    ScoreHolders,
    ScoreHolder,
    Objective,
    /// Position with centre correction.
    Vec3,
    BlockPos,
    Rotation,
    Swizzle,
    Anchor,
    Dimension,
    BlockState,
    BlockPredicate,
    DataPath,
    IntRange,
    ResourceKey,
    Integer,
    Double,
    Word,
    /// Rest of the input.
    GreedyString,
    ScoreOperator,
}

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Selector(EntitySelector),
    ScoreHolder(ScoreHolder),
    Coordinates(Coordinates),
    Rotation(RotationArg),
    Swizzle(Swizzle),
    Anchor(Anchor),
    Dimension(DimensionId),
    BlockState(BlockState),
    BlockPredicate(BlockPredicate),
    DataPath(DataPath),
    IntRange(IntRange),
    ResourceKey(ResourceKey),
    Integer(i32),
    Double(f64),
    String(String),
    ScoreOp(ScoreOp),
}

fn token_error(start: usize, what: &str, err: impl std::fmt::Display) -> CommandError {
    CommandError::syntax(format!("invalid {what}: {err}"), start)
}

impl ArgumentKind {
    pub fn parse(self, reader: &mut StringReader<'_>) -> CommandResult<Argument> {
        let start = reader.cursor();
        let arg = match self {
            Self::Entities | Self::Entity => {
                let selector = EntitySelector::parse(reader)?;
                if self == Self::Entity && selector.max_results() > 1 {
                    return Err(CommandError::syntax(
                        "only one entity is allowed, but the selector allows more",
                        start,
                    ));
                }
                Argument::Selector(selector)
            }
            Self::ScoreHolders | Self::ScoreHolder => {
                let holder = ScoreHolder::parse(reader)?;
                if self == Self::ScoreHolder && holder.max_results() > 1 {
                    return Err(CommandError::syntax(
                        "only one score holder is allowed",
                        start,
                    ));
                }
                Argument::ScoreHolder(holder)
            }
            Self::Objective | Self::Word => {
                let word = reader.read_unquoted();
                if word.is_empty() {
                    return Err(reader.error("expected a word"));
                }
                Argument::String(word.to_string())
            }
            Self::Vec3 => Argument::Coordinates(Coordinates::parse_vec3(reader, true)?),
            Self::BlockPos => Argument::Coordinates(Coordinates::parse_block_pos(reader)?),
            Self::Rotation => Argument::Rotation(RotationArg::parse(reader)?),
            Self::Swizzle => Argument::Swizzle(Swizzle::parse(reader)?),
            Self::Anchor => {
                let token = reader.read_token();
                Argument::Anchor(Anchor::parse(token).ok_or_else(|| {
                    CommandError::syntax(format!("invalid entity anchor '{token}'"), start)
                })?)
            }
            Self::Dimension => {
                let token = reader.read_token();
                let key = ResourceKey::parse(token).map_err(|e| token_error(start, "dimension", e))?;
                Argument::Dimension(DimensionId::from_key(&key).ok_or_else(|| {
                    CommandError::syntax(format!("unknown dimension '{key}'"), start)
                })?)
            }
            Self::BlockState => {
                let token = reader.read_token();
                Argument::BlockState(
                    BlockState::parse(token).map_err(|e| token_error(start, "block state", e))?,
                )
            }
            Self::BlockPredicate => {
                let token = reader.read_token();
                Argument::BlockPredicate(
                    BlockPredicate::parse(token)
                        .map_err(|e| token_error(start, "block predicate", e))?,
                )
            }
            Self::DataPath => {
                let token = reader.read_quoted_token()?;
                Argument::DataPath(DataPath::parse(token).map_err(|e| token_error(start, "path", e))?)
            }
            Self::IntRange => {
                let token = reader.read_token();
                Argument::IntRange(IntRange::parse(token).map_err(|e| token_error(start, "range", e))?)
            }
            Self::ResourceKey => {
                let token = reader.read_token();
                Argument::ResourceKey(
                    ResourceKey::parse(token).map_err(|e| token_error(start, "id", e))?,
                )
            }
            Self::Integer => Argument::Integer(reader.read_int()?),
            Self::Double => Argument::Double(reader.read_double()?),
            Self::GreedyString => Argument::String(reader.read_remaining().to_string()),
            Self::ScoreOperator => {
                let token = reader.read_token();
                Argument::ScoreOp(ScoreOp::parse(token).ok_or_else(|| {
                    CommandError::syntax(format!("invalid operation '{token}'"), start)
                })?)
            }
        };
        if !reader.at_boundary() {
            return Err(reader.error("expected whitespace to end one argument"));
        }
        Ok(arg)
    }
}

/// Named arguments collected while parsing one stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<(String, Argument)>,
}

macro_rules! typed_getter {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        pub fn $fn_name(&self, name: &str) -> CommandResult<&$ty> {
            match self.get(name) {
                Some(Argument::$variant(value)) => Ok(value),
                _ => Err(CommandError::MissingArgument(name.to_string())),
            }
        }
    };
}

impl Arguments {
    pub fn insert(&mut self, name: impl Into<String>, value: Argument) {
        self.values.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.values
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    typed_getter!(selector, Selector, EntitySelector);
    typed_getter!(score_holder, ScoreHolder, ScoreHolder);
    typed_getter!(coordinates, Coordinates, Coordinates);
    typed_getter!(rotation, Rotation, RotationArg);
    typed_getter!(swizzle, Swizzle, Swizzle);
    typed_getter!(anchor, Anchor, Anchor);
    typed_getter!(dimension, Dimension, DimensionId);
    typed_getter!(block_state, BlockState, BlockState);
    typed_getter!(block_predicate, BlockPredicate, BlockPredicate);
    typed_getter!(data_path, DataPath, DataPath);
    typed_getter!(int_range, IntRange, IntRange);
    typed_getter!(resource_key, ResourceKey, ResourceKey);
    typed_getter!(string, String, String);
    typed_getter!(score_op, ScoreOp, ScoreOp);

    pub fn integer(&self, name: &str) -> CommandResult<i32> {
        match self.get(name) {
            Some(Argument::Integer(value)) => Ok(*value),
            _ => Err(CommandError::MissingArgument(name.to_string())),
        }
    }

    pub fn double(&self, name: &str) -> CommandResult<f64> {
        match self.get(name) {
            Some(Argument::Double(value)) => Ok(*value),
            Some(Argument::Integer(value)) => Ok(f64::from(*value)),
            _ => Err(CommandError::MissingArgument(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kind: ArgumentKind, text: &str) -> CommandResult<Argument> {
        kind.parse(&mut StringReader::new(text))
    }

    #[test]
    fn single_entity_rejects_multi_selectors() {
        assert!(parse(ArgumentKind::Entity, "@e").is_err());
        assert!(parse(ArgumentKind::Entity, "@e[limit=1]").is_ok());
        assert!(parse(ArgumentKind::Entities, "@e").is_ok());
        assert!(parse(ArgumentKind::ScoreHolder, "*").is_err());
    }

    #[test]
    fn arguments_must_end_at_whitespace() {
        assert!(parse(ArgumentKind::Integer, "12x").is_err());
        assert!(parse(ArgumentKind::Objective, "kills!").is_err());
        assert_eq!(
            parse(ArgumentKind::Dimension, "the_nether").unwrap(),
            Argument::Dimension(DimensionId::Nether)
        );
        assert!(parse(ArgumentKind::Dimension, "minecraft:moon").is_err());
    }

    #[test]
    fn getters_check_type() {
        let mut args = Arguments::default();
        args.insert("count", Argument::Integer(3));
        args.insert("name", Argument::String("kills".to_string()));
        assert_eq!(args.integer("count").unwrap(), 3);
        assert_eq!(args.double("count").unwrap(), 3.0);
        assert_eq!(args.string("name").unwrap(), "kills");
        assert_eq!(
            args.string("count"),
            Err(CommandError::MissingArgument("count".to_string()))
        );
        assert!(args.selector("targets").is_err());
    }
}
