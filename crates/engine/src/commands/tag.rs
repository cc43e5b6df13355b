use crate::args::ArgumentKind;
use crate::error::CommandError;
use crate::graph::{CommandGraph, Executor};
use crate::message::Message;

use super::{count, entities, GAMEMASTER_PERMISSION};

/// `tag <targets> add|remove <name>` and `tag <targets> list`.
pub(super) fn register(graph: &mut CommandGraph) {
    let root = graph.root();
    let tag = graph.literal(root, "tag");
    graph.requires(tag, GAMEMASTER_PERMISSION);
    let targets = graph.argument(tag, "targets", ArgumentKind::Entities);

    let add = graph.literal(targets, "add");
    let name = graph.argument(add, "name", ArgumentKind::Word);
    graph.executes(
        name,
        Executor::leaf(|server, ctx, args| {
            let name = args.string("name")?;
            let targets = entities(server, ctx, args, "targets")?;
            let added = targets
                .iter()
                .filter(|entity| server.add_entity_tag(entity.id, name))
                .count();
            if added == 0 {
                return Err(CommandError::Failed(Message::new("commands.tag.add.failed")));
            }
            let message = match targets.as_slice() {
                [single] => Message::new("commands.tag.add.success.single")
                    .arg(name)
                    .arg(&single.name),
                _ => Message::new("commands.tag.add.success.multiple")
                    .arg(name)
                    .arg(targets.len()),
            };
            ctx.send_success(server, message, true);
            Ok(count(added))
        }),
    );

    let remove = graph.literal(targets, "remove");
    let name = graph.argument(remove, "name", ArgumentKind::Word);
    graph.executes(
        name,
        Executor::leaf(|server, ctx, args| {
            let name = args.string("name")?;
            let targets = entities(server, ctx, args, "targets")?;
            let removed = targets
                .iter()
                .filter(|entity| server.remove_entity_tag(entity.id, name))
                .count();
            if removed == 0 {
                return Err(CommandError::Failed(Message::new(
                    "commands.tag.remove.failed",
                )));
            }
            let message = match targets.as_slice() {
                [single] => Message::new("commands.tag.remove.success.single")
                    .arg(name)
                    .arg(&single.name),
                _ => Message::new("commands.tag.remove.success.multiple")
                    .arg(name)
                    .arg(targets.len()),
            };
            ctx.send_success(server, message, true);
            Ok(count(removed))
        }),
    );

    let list = graph.literal(targets, "list");
    graph.executes(
        list,
        Executor::leaf(|server, ctx, args| {
            let targets = entities(server, ctx, args, "targets")?;
            let mut tags: Vec<&str> = targets
                .iter()
                .flat_map(|entity| entity.tags.iter().map(String::as_str))
                .collect();
            tags.sort_unstable();
            tags.dedup();
            let message = if tags.is_empty() {
                Message::new("commands.tag.list.empty").arg(targets.len())
            } else {
                Message::new("commands.tag.list.success")
                    .arg(targets.len())
                    .arg(tags.len())
                    .arg(tags.join(", "))
            };
            ctx.send_success(server, message, false);
            Ok(count(tags.len()))
        }),
    );
}
