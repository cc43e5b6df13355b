//! Leaf commands bundled with the engine.
//!
//! Each returns its conventional result: the number of things it affected, or
//! the value it read.

mod data;
mod say;
mod scoreboard;
mod setblock;
mod tag;
mod teleport;

use crate::args::Arguments;
use crate::context::ExecutionContext;
use crate::entity::EntityRef;
use crate::error::{CommandError, CommandResult};
use crate::graph::CommandGraph;
use crate::server::CommandServer;

/// Permission level shared by the bundled commands.
pub const GAMEMASTER_PERMISSION: u8 = 2;

pub fn register_all(graph: &mut CommandGraph) {
    say::register(graph);
    tag::register(graph);
    scoreboard::register(graph);
    data::register(graph);
    setblock::register(graph);
    teleport::register(graph);
}

/// Entities for a multi-target argument; at least one.
fn entities(
    server: &mut dyn CommandServer,
    ctx: &ExecutionContext,
    args: &Arguments,
    name: &str,
) -> CommandResult<Vec<EntityRef>> {
    let found = server.select_entities(ctx, args.selector(name)?)?;
    if found.is_empty() {
        return Err(CommandError::EntityNotFound);
    }
    Ok(found)
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
