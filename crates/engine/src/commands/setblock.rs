use crate::args::ArgumentKind;
use crate::error::CommandError;
use crate::graph::{CommandGraph, Executor};
use crate::message::Message;

use super::GAMEMASTER_PERMISSION;

/// `setblock <pos> <block>`: fails when the block is already there.
pub(super) fn register(graph: &mut CommandGraph) {
    let root = graph.root();
    let setblock = graph.literal(root, "setblock");
    graph.requires(setblock, GAMEMASTER_PERMISSION);
    let pos = graph.argument(setblock, "pos", ArgumentKind::BlockPos);
    let block = graph.argument(pos, "block", ArgumentKind::BlockState);
    graph.executes(
        block,
        Executor::leaf(|server, ctx, args| {
            let pos = args.coordinates("pos")?.block_pos(ctx);
            let state = args.block_state("block")?;
            let dimension = ctx.dimension();
            let current = server
                .block_state(dimension, pos)
                .ok_or(CommandError::NotLoaded { pos })?;
            if &current == state {
                return Err(CommandError::Failed(Message::new("commands.setblock.failed")));
            }
            server.set_block_state(dimension, pos, state.clone())?;
            ctx.send_success(
                server,
                Message::new("commands.setblock.success")
                    .arg(pos.x)
                    .arg(pos.y)
                    .arg(pos.z),
                true,
            );
            Ok(1)
        }),
    );
}
