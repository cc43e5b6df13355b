use crate::args::ArgumentKind;
use crate::error::{CommandError, CommandResult};
use crate::graph::{CommandGraph, Executor};
use crate::message::Message;
use crate::server::CommandServer;

use super::GAMEMASTER_PERMISSION;

pub(super) fn register(graph: &mut CommandGraph) {
    let root = graph.root();
    let scoreboard = graph.literal(root, "scoreboard");
    graph.requires(scoreboard, GAMEMASTER_PERMISSION);

    let objectives = graph.literal(scoreboard, "objectives");
    let add = graph.literal(objectives, "add");
    let objective = graph.argument(add, "objective", ArgumentKind::Word);
    // The criterion is accepted for familiarity; every objective is a plain counter.
    let criterion = graph.argument(objective, "criterion", ArgumentKind::Word);
    let add_objective = Executor::leaf(|server, ctx, args| {
        let name = args.string("objective")?;
        server.add_objective(name)?;
        ctx.send_success(
            server,
            Message::new("commands.scoreboard.objectives.add.success").arg(name),
            true,
        );
        Ok(1)
    });
    graph.executes(objective, add_objective.clone());
    graph.executes(criterion, add_objective);

    let players = graph.literal(scoreboard, "players");

    let set = graph.literal(players, "set");
    let targets = graph.argument(set, "targets", ArgumentKind::ScoreHolders);
    let objective = graph.argument(targets, "objective", ArgumentKind::Objective);
    let score = graph.argument(objective, "score", ArgumentKind::Integer);
    graph.executes(
        score,
        Executor::leaf(|server, ctx, args| {
            let holders = args.score_holder("targets")?.resolve(server, ctx)?;
            let objective = args.string("objective")?;
            let value = args.integer("score")?;
            require_objective(server, objective)?;
            for holder in &holders {
                server.set_score(holder, objective, value);
            }
            let message = match holders.as_slice() {
                [single] => Message::new("commands.scoreboard.players.set.success.single")
                    .arg(objective)
                    .arg(single)
                    .arg(value),
                _ => Message::new("commands.scoreboard.players.set.success.multiple")
                    .arg(objective)
                    .arg(holders.len())
                    .arg(value),
            };
            ctx.send_success(server, message, true);
            Ok(value.wrapping_mul(super::count(holders.len())))
        }),
    );

    let add = graph.literal(players, "add");
    let targets = graph.argument(add, "targets", ArgumentKind::ScoreHolders);
    let objective = graph.argument(targets, "objective", ArgumentKind::Objective);
    let score = graph.argument(objective, "score", ArgumentKind::Integer);
    graph.executes(
        score,
        Executor::leaf(|server, ctx, args| {
            let holders = args.score_holder("targets")?.resolve(server, ctx)?;
            let objective = args.string("objective")?;
            let delta = args.integer("score")?;
            require_objective(server, objective)?;
            let mut total = 0i32;
            for holder in &holders {
                let value = server
                    .score(holder, objective)
                    .unwrap_or(0)
                    .wrapping_add(delta);
                server.set_score(holder, objective, value);
                total = total.wrapping_add(value);
            }
            let message = match holders.as_slice() {
                [single] => Message::new("commands.scoreboard.players.add.success.single")
                    .arg(delta)
                    .arg(objective)
                    .arg(single)
                    .arg(total),
                _ => Message::new("commands.scoreboard.players.add.success.multiple")
                    .arg(delta)
                    .arg(objective)
                    .arg(holders.len()),
            };
            ctx.send_success(server, message, true);
            Ok(total)
        }),
    );

    let get = graph.literal(players, "get");
    let target = graph.argument(get, "target", ArgumentKind::ScoreHolder);
    let objective = graph.argument(target, "objective", ArgumentKind::Objective);
    graph.executes(
        objective,
        Executor::leaf(|server, ctx, args| {
            let holder = args.score_holder("target")?.resolve_single(server, ctx)?;
            let objective = args.string("objective")?;
            require_objective(server, objective)?;
            let value = server
                .score(&holder, objective)
                .ok_or_else(|| CommandError::NoScore {
                    holder: holder.clone(),
                    objective: objective.clone(),
                })?;
            ctx.send_success(
                server,
                Message::new("commands.scoreboard.players.get.success")
                    .arg(&holder)
                    .arg(value)
                    .arg(objective),
                false,
            );
            Ok(value)
        }),
    );
}

fn require_objective(server: &dyn CommandServer, objective: &str) -> CommandResult<()> {
    if server.has_objective(objective) {
        Ok(())
    } else {
        Err(CommandError::UnknownObjective(objective.to_string()))
    }
}
