use mdcommand_core::DataPathError;

use crate::args::{ArgumentKind, Arguments};
use crate::context::ExecutionContext;
use crate::data::DataSourceKind;
use crate::error::{CommandError, CommandResult};
use crate::graph::{CommandGraph, Executor};
use crate::message::Message;
use crate::server::CommandServer;

use super::GAMEMASTER_PERMISSION;

/// `data get (block|entity|storage) <target> [<path> [<scale>]]`.
pub(super) fn register(graph: &mut CommandGraph) {
    let root = graph.root();
    let data = graph.literal(root, "data");
    graph.requires(data, GAMEMASTER_PERMISSION);
    let get = graph.literal(data, "get");

    for kind in DataSourceKind::ALL {
        let literal = graph.literal(get, kind.literal());
        let target = graph.argument(
            literal,
            "target",
            match kind {
                DataSourceKind::Block => ArgumentKind::BlockPos,
                DataSourceKind::Entity => ArgumentKind::Entity,
                DataSourceKind::Storage => ArgumentKind::ResourceKey,
            },
        );
        graph.executes(
            target,
            Executor::leaf(move |server, ctx, args| get_all(server, ctx, args, kind)),
        );
        let path = graph.argument(target, "path", ArgumentKind::DataPath);
        graph.executes(
            path,
            Executor::leaf(move |server, ctx, args| get_path(server, ctx, args, kind, None)),
        );
        let scale = graph.argument(path, "scale", ArgumentKind::Double);
        graph.executes(
            scale,
            Executor::leaf(move |server, ctx, args| {
                let scale = args.double("scale")?;
                get_path(server, ctx, args, kind, Some(scale))
            }),
        );
    }
}

fn get_all(
    server: &mut dyn CommandServer,
    ctx: &ExecutionContext,
    args: &Arguments,
    kind: DataSourceKind,
) -> CommandResult<i32> {
    let accessor = kind.bind(args, "target")?.resolve(server, ctx)?;
    let data = accessor.get_data(server)?;
    ctx.send_success(server, accessor.query_message(&data), false);
    Ok(1)
}

fn get_path(
    server: &mut dyn CommandServer,
    ctx: &ExecutionContext,
    args: &Arguments,
    kind: DataSourceKind,
    scale: Option<f64>,
) -> CommandResult<i32> {
    let accessor = kind.bind(args, "target")?.resolve(server, ctx)?;
    let path = args.data_path("path")?;
    let data = accessor.get_data(server)?;
    let found = path.get(&data);
    let tag = match found.as_slice() {
        [] => return Err(DataPathError::NothingFound(path.to_string()).into()),
        [tag] => *tag,
        _ => {
            return Err(CommandError::Failed(
                Message::new("commands.data.get.multiple").arg(path),
            ))
        }
    };
    let value = match (scale, tag.as_f64()) {
        (Some(scale), Some(number)) => (number * scale).floor() as i32,
        (Some(_), None) => {
            return Err(CommandError::Failed(
                Message::new("commands.data.get.invalid").arg(path),
            ))
        }
        (None, Some(number)) => number.floor() as i32,
        (None, None) => tag.size().map_or(0, super::count),
    };
    let message = match scale {
        Some(scale) => Message::new("commands.data.get.success")
            .arg(path)
            .arg(scale)
            .arg(value),
        None => accessor.query_message(tag),
    };
    ctx.send_success(server, message, false);
    Ok(value)
}
