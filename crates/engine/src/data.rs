//! Structured-data holders addressed by `block`, `entity` and `storage`.

use mdcommand_core::{BlockPos, DimensionId, ResourceKey, Tag};

use crate::args::Arguments;
use crate::context::ExecutionContext;
use crate::coords::Coordinates;
use crate::entity::EntityId;
use crate::error::{CommandError, CommandResult};
use crate::message::Message;
use crate::selector::EntitySelector;
use crate::server::CommandServer;

/// Which holder family a graph branch addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Block,
    Entity,
    Storage,
}

impl DataSourceKind {
    pub const ALL: [Self; 3] = [Self::Block, Self::Entity, Self::Storage];

    pub fn literal(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Entity => "entity",
            Self::Storage => "storage",
        }
    }

    /// Read the source out of the argument named `name`.
    pub fn bind(self, args: &Arguments, name: &str) -> CommandResult<DataSource> {
        Ok(match self {
            Self::Block => DataSource::Block(*args.coordinates(name)?),
            Self::Entity => DataSource::Entity(args.selector(name)?.clone()),
            Self::Storage => DataSource::Storage(args.resource_key(name)?.clone()),
        })
    }
}

/// Unresolved holder as written in the command.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Block(Coordinates),
    Entity(EntitySelector),
    Storage(ResourceKey),
}

impl DataSource {
    /// Pin the holder down against the current world.
    pub fn resolve(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
    ) -> CommandResult<DataAccessor> {
        match self {
            Self::Block(coords) => {
                let pos = coords.block_pos(ctx);
                let dimension = ctx.dimension();
                if server.block_data(dimension, pos).is_none() {
                    return Err(CommandError::NotABlockEntity { pos });
                }
                Ok(DataAccessor::Block { dimension, pos })
            }
            Self::Entity(selector) => {
                let mut found = server.select_entities(ctx, selector)?;
                if found.len() > 1 {
                    return Err(CommandError::TooManyEntities { count: found.len() });
                }
                let entity = found.pop().ok_or(CommandError::EntityNotFound)?;
                Ok(DataAccessor::Entity(entity.id))
            }
            Self::Storage(id) => Ok(DataAccessor::Storage(id.clone())),
        }
    }
}

/// A concrete document holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataAccessor {
    Block { dimension: DimensionId, pos: BlockPos },
    Entity(EntityId),
    Storage(ResourceKey),
}

impl DataAccessor {
    /// Current document, always a compound.
    pub fn get_data(&self, server: &dyn CommandServer) -> CommandResult<Tag> {
        let data = match self {
            Self::Block { dimension, pos } => server
                .block_data(*dimension, *pos)
                .ok_or(CommandError::NotABlockEntity { pos: *pos })?,
            Self::Entity(id) => server.entity_data(*id).ok_or(CommandError::EntityNotFound)?,
            Self::Storage(id) => server.storage_data(id),
        };
        Ok(Tag::Compound(data))
    }

    pub fn set_data(&self, server: &mut dyn CommandServer, data: Tag) -> CommandResult<()> {
        let Tag::Compound(data) = data else {
            return Err(CommandError::Failed(Message::new("commands.data.modify.invalid")));
        };
        match self {
            Self::Block { dimension, pos } => server.set_block_data(*dimension, *pos, data),
            Self::Entity(id) => server.set_entity_data(*id, data),
            Self::Storage(id) => {
                server.set_storage_data(id, data);
                Ok(())
            }
        }
    }

    /// Feedback for a query that printed `value`.
    pub fn query_message(&self, value: impl std::fmt::Display) -> Message {
        match self {
            Self::Block { pos, .. } => Message::new("commands.data.block.query")
                .arg(pos.x)
                .arg(pos.y)
                .arg(pos.z)
                .arg(value),
            Self::Entity(id) => Message::new("commands.data.entity.query").arg(id).arg(value),
            Self::Storage(id) => Message::new("commands.data.storage.query").arg(id).arg(value),
        }
    }
}
