use mdcommand_core::DVec3;

use crate::args::{ArgumentKind, Arguments};
use crate::context::ExecutionContext;
use crate::entity::EntityRef;
use crate::error::{CommandError, CommandResult};
use crate::graph::{CommandGraph, Executor};
use crate::message::Message;
use crate::server::CommandServer;

use super::{count, entities, GAMEMASTER_PERMISSION};

/// `tp <location>` moves the source; `tp <targets> <location>` moves targets.
/// Relative coordinates are taken from the source either way.
pub(super) fn register(graph: &mut CommandGraph) {
    for name in ["tp", "teleport"] {
        let root = graph.root();
        let tp = graph.literal(root, name);
        graph.requires(tp, GAMEMASTER_PERMISSION);

        let location = graph.argument(tp, "location", ArgumentKind::Vec3);
        graph.executes(
            location,
            Executor::leaf(|server, ctx, args| {
                let source = ctx.entity().cloned().ok_or(CommandError::RequiresEntity)?;
                teleport(server, ctx, args, vec![source])
            }),
        );

        let targets = graph.argument(tp, "targets", ArgumentKind::Entities);
        let location = graph.argument(targets, "location", ArgumentKind::Vec3);
        graph.executes(
            location,
            Executor::leaf(|server, ctx, args| {
                let targets = entities(server, ctx, args, "targets")?;
                teleport(server, ctx, args, targets)
            }),
        );
    }
}

fn teleport(
    server: &mut dyn CommandServer,
    ctx: &ExecutionContext,
    args: &Arguments,
    targets: Vec<EntityRef>,
) -> CommandResult<i32> {
    let destination: DVec3 = args.coordinates("location")?.position(ctx);
    for target in &targets {
        server.teleport_entity(target.id, ctx.dimension(), destination, target.rotation)?;
    }
    let message = match targets.as_slice() {
        [single] => Message::new("commands.teleport.success.location.single")
            .arg(&single.name)
            .arg(format!("{:.2}", destination.x))
            .arg(format!("{:.2}", destination.y))
            .arg(format!("{:.2}", destination.z)),
        _ => Message::new("commands.teleport.success.location.multiple")
            .arg(targets.len())
            .arg(format!("{:.2}", destination.x))
            .arg(format!("{:.2}", destination.y))
            .arg(format!("{:.2}", destination.z)),
    };
    ctx.send_success(server, message, true);
    Ok(count(targets.len()))
}
