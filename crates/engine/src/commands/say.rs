use crate::args::ArgumentKind;
use crate::graph::{CommandGraph, Executor};
use crate::message::Message;

use super::GAMEMASTER_PERMISSION;

/// `say <message>`: broadcast as the source. Always 1.
pub(super) fn register(graph: &mut CommandGraph) {
    let root = graph.root();
    let say = graph.literal(root, "say");
    graph.requires(say, GAMEMASTER_PERMISSION);
    let message = graph.argument(say, "message", ArgumentKind::GreedyString);
    graph.executes(
        message,
        Executor::leaf(|server, ctx, args| {
            let text = args.string("message")?;
            server.broadcast(
                &Message::new("chat.type.announcement")
                    .arg(ctx.name())
                    .arg(text),
            );
            Ok(1)
        }),
    );
}
