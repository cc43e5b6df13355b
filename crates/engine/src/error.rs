use mdcommand_core::{BlockPos, DataPathError, ResourceKey};
use thiserror::Error;

use crate::message::Message;

/// Result alias used by every command path.
pub type CommandResult<T> = Result<T, CommandError>;

/// Everything that can stop an execution path.
///
/// Grammar errors come from parsing; the rest are raised while a stage or a
/// terminal runs. `ConditionalFailed*` are the designed outcome of a failed
/// `if`/`unless` test rather than faults.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown or incomplete command at position {cursor}: {input}")]
    UnknownCommand { input: String, cursor: usize },
    #[error("{message} at position {cursor}")]
    Syntax { message: String, cursor: usize },
    #[error("argument '{0}' is missing or has the wrong type")]
    MissingArgument(String),
    #[error("test failed")]
    ConditionalFailed,
    #[error("test failed, count: {count}")]
    ConditionalFailedCount { count: u32 },
    #[error("too many blocks in the specified area (maximum {max}, specified {actual})")]
    AreaTooLarge { max: u64, actual: u64 },
    #[error("position {pos} is not loaded")]
    NotLoaded { pos: BlockPos },
    #[error("target block at {pos} is not a block entity")]
    NotABlockEntity { pos: BlockPos },
    #[error("no entity was found")]
    EntityNotFound,
    #[error("only one entity is allowed, but {count} were found")]
    TooManyEntities { count: usize },
    #[error("a source entity is required")]
    RequiresEntity,
    #[error("unknown scoreboard objective '{0}'")]
    UnknownObjective(String),
    #[error("an objective named '{0}' already exists")]
    DuplicateObjective(String),
    #[error("{holder} has no score in objective {objective}")]
    NoScore { holder: String, objective: String },
    #[error("no boss bar exists with id '{0}'")]
    UnknownBossBar(ResourceKey),
    #[error("unknown predicate '{0}'")]
    UnknownPredicate(ResourceKey),
    #[error(transparent)]
    DataPath(#[from] DataPathError),
    #[error("{0}")]
    Failed(Message),
}

impl CommandError {
    /// Shorthand for a syntax error at `cursor`.
    pub fn syntax(message: impl Into<String>, cursor: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            cursor,
        }
    }

    /// Feedback message reported to the failing context's output sink.
    pub fn message(&self) -> Message {
        match self {
            Self::UnknownCommand { input, cursor } => Message::new("command.unknown.command")
                .arg(input)
                .arg(cursor),
            Self::Syntax { message, cursor } => {
                Message::new("command.context.here").arg(message).arg(cursor)
            }
            Self::MissingArgument(name) => Message::new("command.argument.missing").arg(name),
            Self::ConditionalFailed => Message::new("commands.execute.conditional.fail"),
            Self::ConditionalFailedCount { count } => {
                Message::new("commands.execute.conditional.fail_count").arg(count)
            }
            Self::AreaTooLarge { max, actual } => Message::new("commands.execute.blocks.toobig")
                .arg(max)
                .arg(actual),
            Self::NotLoaded { pos } => Message::new("argument.pos.unloaded").arg(pos),
            Self::NotABlockEntity { pos } => Message::new("commands.data.block.invalid").arg(pos),
            Self::EntityNotFound => Message::new("argument.entity.notfound.entity"),
            Self::TooManyEntities { count } => {
                Message::new("argument.entity.toomany").arg(count)
            }
            Self::RequiresEntity => Message::new("permissions.requires.entity"),
            Self::UnknownObjective(name) => Message::new("arguments.objective.notFound").arg(name),
            Self::DuplicateObjective(name) => {
                Message::new("commands.scoreboard.objectives.add.duplicate").arg(name)
            }
            Self::NoScore { holder, objective } => {
                Message::new("commands.scoreboard.players.get.null")
                    .arg(objective)
                    .arg(holder)
            }
            Self::UnknownBossBar(id) => Message::new("commands.bossbar.unknown").arg(id),
            Self::UnknownPredicate(id) => Message::new("predicate.unknown").arg(id),
            Self::DataPath(err) => Message::new("arguments.nbtpath.nothing_found").arg(err),
            Self::Failed(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_too_large_reports_limit_and_size() {
        let err = CommandError::AreaTooLarge {
            max: 32768,
            actual: 40000,
        };
        assert_eq!(
            err.to_string(),
            "too many blocks in the specified area (maximum 32768, specified 40000)"
        );
        assert_eq!(err.message().args, vec!["32768", "40000"]);
    }

    #[test]
    fn failed_passes_message_through() {
        let msg = Message::new("commands.tag.add.failed");
        assert_eq!(CommandError::Failed(msg.clone()).message(), msg);
    }
}
