//! End-to-end `execute` scenarios against the in-memory world.

use std::cell::RefCell;
use std::rc::Rc;

use mdcommand_core::{BlockPos, BlockState, Compound, DVec3, DimensionId, ResourceKey, Tag};
use mdcommand_engine::{
    CommandError, CommandServer, Dispatcher, EntityId, ExecutionContext, Executor,
    MAX_REGION_VOLUME,
};
use mdcommand_testkit::{BossBar, FeedbackKind, MemoryServer, PredicateRule};

type Seen = Rc<RefCell<Vec<ExecutionContext>>>;

/// Built-in commands plus `probe`, which records every context it runs under.
fn dispatcher_with_probe() -> (Dispatcher, Seen) {
    let mut dispatcher = Dispatcher::with_builtin_commands();
    let seen: Seen = Rc::default();
    let graph = dispatcher.graph_mut();
    let root = graph.root();
    let probe = graph.literal(root, "probe");
    let sink = Rc::clone(&seen);
    graph.executes(
        probe,
        Executor::leaf(move |_, ctx, _| {
            sink.borrow_mut().push(ctx.clone());
            Ok(1)
        }),
    );
    (dispatcher, seen)
}

fn console() -> ExecutionContext {
    ExecutionContext::console(DimensionId::Overworld, DVec3::new(0.5, 64.0, 0.5))
}

fn zombies(server: &mut MemoryServer, count: usize) -> Vec<EntityId> {
    (0..count)
        .map(|i| {
            server
                .spawn_mob(
                    "zombie",
                    &format!("Zombie{i}"),
                    DimensionId::Overworld,
                    DVec3::new(i as f64 * 2.0, 64.0, 0.0),
                )
                .expect("valid kind")
        })
        .collect()
}

fn stone() -> BlockState {
    BlockState::simple(ResourceKey::minecraft("stone"))
}

fn key(text: &str) -> ResourceKey {
    ResourceKey::parse(text).expect("valid key")
}

#[test]
fn as_forks_once_per_target_with_distinct_contexts() {
    let (dispatcher, seen) = dispatcher_with_probe();
    let mut server = MemoryServer::new(1);
    let ids = zombies(&mut server, 3);

    let result = dispatcher.execute(&mut server, "execute as @e[type=zombie] run probe", &console());

    assert_eq!(result, Ok(3));
    let seen = seen.borrow();
    let executors: Vec<EntityId> = seen
        .iter()
        .map(|ctx| ctx.entity().expect("entity source").id)
        .collect();
    assert_eq!(executors, ids);
    // `as` changes the executor only; position stays with the console.
    assert!(seen.iter().all(|ctx| ctx.position() == console().position()));
}

#[test]
fn fork_over_nothing_runs_nothing_and_succeeds_with_zero() {
    let (dispatcher, seen) = dispatcher_with_probe();
    let mut server = MemoryServer::new(1);
    zombies(&mut server, 2);

    let result = dispatcher.execute(&mut server, "execute as @e[type=pig] run probe", &console());

    assert_eq!(result, Ok(0));
    assert!(seen.borrow().is_empty());
    assert!(server.feedback().is_empty());
}

#[test]
fn at_moves_position_rotation_and_dimension() {
    let (dispatcher, seen) = dispatcher_with_probe();
    let mut server = MemoryServer::new(1);
    let id = server
        .spawn_mob("cow", "Bess", DimensionId::Nether, DVec3::new(4.0, 70.0, -3.0))
        .expect("valid kind");

    let result = dispatcher.execute(&mut server, "execute at @e[type=cow] run probe", &console());

    assert_eq!(result, Ok(1));
    let ctx = seen.borrow()[0].clone();
    assert_eq!(ctx.position(), DVec3::new(4.0, 70.0, -3.0));
    assert_eq!(ctx.dimension(), DimensionId::Nether);
    assert!(ctx.entity().is_none(), "the executor is still the console");
    assert_eq!(server.entity(id).map(|e| e.position), Some(ctx.position()));
}

#[test]
fn five_of_seven_tag_adds_report_five() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    let ids = zombies(&mut server, 7);
    server.add_entity_tag(ids[1], "seen");
    server.add_entity_tag(ids[4], "seen");

    let result = dispatcher.execute(
        &mut server,
        "execute as @e[type=zombie] run tag @s add seen",
        &console(),
    );

    assert_eq!(result, Ok(5));
    assert!(server.entities().all(|entity| entity.tags.contains("seen")));
    let failures: Vec<_> = server
        .feedback()
        .iter()
        .filter(|line| line.kind == FeedbackKind::Failure)
        .map(|line| line.message.key)
        .collect();
    assert_eq!(failures, vec!["commands.tag.add.failed"; 2]);
}

#[test]
fn if_entity_reports_match_count_and_unless_fails_with_it() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    zombies(&mut server, 3);
    server
        .spawn_mob("cow", "Bess", DimensionId::Overworld, DVec3::ZERO)
        .expect("valid kind");

    let passed = dispatcher.execute(&mut server, "execute if entity @e[type=zombie]", &console());
    assert_eq!(passed, Ok(3));
    assert_eq!(
        server.feedback().last().map(|line| line.message.to_string()),
        Some("commands.execute.conditional.pass_count [3]".to_string())
    );

    let failed = dispatcher.execute(&mut server, "execute unless entity @e[type=zombie]", &console());
    assert_eq!(failed, Err(CommandError::ConditionalFailedCount { count: 3 }));
    assert_eq!(
        CommandError::ConditionalFailedCount { count: 3 }.message().to_string(),
        "commands.execute.conditional.fail_count [3]"
    );
}

#[test]
fn unless_with_no_matches_passes_with_one() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    let result = dispatcher.execute(&mut server, "execute unless entity @e", &console());
    assert_eq!(result, Ok(1));
    assert_eq!(
        server.feedback_keys(),
        vec!["commands.execute.conditional.pass"]
    );
}

#[test]
fn gates_filter_branches_without_failing() {
    let (dispatcher, seen) = dispatcher_with_probe();
    let mut server = MemoryServer::new(1);
    let ids = zombies(&mut server, 4);
    server.add_entity_tag(ids[0], "boss");
    server.add_entity_tag(ids[2], "boss");

    let result = dispatcher.execute(
        &mut server,
        "execute as @e[type=zombie] if entity @s[tag=boss] run probe",
        &console(),
    );

    assert_eq!(result, Ok(2));
    let ran: Vec<EntityId> = seen
        .borrow()
        .iter()
        .filter_map(|ctx| ctx.entity().map(|e| e.id))
        .collect();
    assert_eq!(ran, vec![ids[0], ids[2]]);
}

#[test]
fn region_over_the_cap_fails_before_reading_any_block() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);

    let result = dispatcher.execute(
        &mut server,
        "execute if blocks 0 0 0 40 40 40 100 0 100 all",
        &console(),
    );

    assert_eq!(
        result,
        Err(CommandError::AreaTooLarge {
            max: MAX_REGION_VOLUME,
            actual: 41 * 41 * 41,
        })
    );
    assert_eq!(server.block_reads(), 0);
}

#[test]
fn region_at_the_cap_is_compared() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);

    let result = dispatcher.execute(
        &mut server,
        "execute if blocks 0 0 0 31 31 31 100 0 100 all",
        &console(),
    );

    assert_eq!(result, Ok(32768));
    assert!(server.block_reads() > 0);
}

#[test]
fn masked_region_ignores_air_in_the_source() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.put_block(DimensionId::Overworld, BlockPos::new(0, 64, 0), stone());
    server.put_block(DimensionId::Overworld, BlockPos::new(10, 64, 0), stone());
    server.put_block(DimensionId::Overworld, BlockPos::new(11, 64, 0), stone());

    let all = dispatcher.execute(&mut server, "execute if blocks 0 64 0 1 64 0 10 64 0 all", &console());
    assert_eq!(all, Err(CommandError::ConditionalFailed));

    let masked = dispatcher.execute(
        &mut server,
        "execute if blocks 0 64 0 1 64 0 10 64 0 masked",
        &console(),
    );
    assert_eq!(masked, Ok(1));
}

#[test]
fn region_across_the_coordinate_edge_is_compared() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.put_block(DimensionId::Overworld, BlockPos::new(i32::MIN, 64, 0), stone());
    server.put_block(DimensionId::Overworld, BlockPos::new(i32::MAX, 64, 0), stone());
    let command = "execute if blocks -2147483648 64 0 -2147483648 64 0 2147483647 64 0 all";

    assert_eq!(dispatcher.execute(&mut server, command, &console()), Ok(1));

    server.put_block(
        DimensionId::Overworld,
        BlockPos::new(i32::MAX, 64, 0),
        BlockState::simple(ResourceKey::minecraft("dirt")),
    );
    assert_eq!(
        dispatcher.execute(&mut server, command, &console()),
        Err(CommandError::ConditionalFailed)
    );
}

#[test]
fn region_in_unloaded_chunks_is_rejected() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.unload_column(DimensionId::Overworld, 6, 6);

    let result = dispatcher.execute(
        &mut server,
        "execute if blocks 0 64 0 3 64 3 100 64 100 all",
        &console(),
    );

    assert!(matches!(result, Err(CommandError::NotLoaded { .. })));
    assert_eq!(server.block_reads(), 0);
}

#[test]
fn store_result_keeps_the_raw_value() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.add_objective("out").expect("new objective");
    server.add_objective("x").expect("new objective");

    let result = dispatcher.execute(
        &mut server,
        "execute store result score Alex out run scoreboard players set Bob x -70000",
        &console(),
    );

    assert_eq!(result, Ok(-70000));
    assert_eq!(server.score("Alex", "out"), Some(-70000));
}

#[test]
fn store_success_is_zero_or_one() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.add_objective("ok").expect("new objective");
    server.add_objective("x").expect("new objective");

    dispatcher
        .execute(
            &mut server,
            "execute store success score Alex ok run scoreboard players set Bob x 42",
            &console(),
        )
        .expect("set succeeds");
    assert_eq!(server.score("Alex", "ok"), Some(1));

    let failed = dispatcher.execute(
        &mut server,
        "execute store success score Alex ok run scoreboard players get Nobody x",
        &console(),
    );
    assert!(matches!(failed, Err(CommandError::NoScore { .. })));
    assert_eq!(server.score("Alex", "ok"), Some(0));
}

#[test]
fn nested_stores_both_observe_the_leaf() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.add_objective("O1").expect("new objective");
    server.add_objective("O2").expect("new objective");

    let result = dispatcher.execute(
        &mut server,
        "execute store result score P O1 run execute store result score P O2 run say hi",
        &console(),
    );

    assert_eq!(result, Ok(1));
    assert_eq!(server.score("P", "O1"), Some(1));
    assert_eq!(server.score("P", "O2"), Some(1));
    assert_eq!(
        server.feedback().last().map(ToString::to_string),
        Some("* [*] chat.type.announcement [Server, hi]".to_string())
    );
}

#[test]
fn store_into_unknown_objective_aborts_before_the_leaf() {
    let (dispatcher, seen) = dispatcher_with_probe();
    let mut server = MemoryServer::new(1);

    let result = dispatcher.execute(
        &mut server,
        "execute store result score @s missing run probe",
        &console(),
    );

    assert_eq!(result, Err(CommandError::UnknownObjective("missing".into())));
    assert!(seen.borrow().is_empty());
}

#[test]
fn store_bossbar_and_scaled_data() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.create_boss_bar(key("demo:raid"), BossBar::default());
    server.add_objective("x").expect("new objective");

    dispatcher
        .execute(
            &mut server,
            "execute store result bossbar demo:raid value run scoreboard players set A x 37",
            &console(),
        )
        .expect("stored");
    assert_eq!(
        server.boss_bar(&key("demo:raid")),
        Some(BossBar { value: 37, max: 100 })
    );

    dispatcher
        .execute(
            &mut server,
            "execute store result storage demo:out stats.half double 0.5 run scoreboard players set A x 7",
            &console(),
        )
        .expect("stored");
    let data = Tag::Compound(server.storage_data(&key("demo:out")));
    let path = mdcommand_core::DataPath::parse("stats.half").expect("valid path");
    assert_eq!(path.get(&data), vec![&Tag::Double(3.5)]);

    dispatcher
        .execute(
            &mut server,
            "execute store result storage demo:out small byte 1 run scoreboard players set A x 300",
            &console(),
        )
        .expect("stored");
    let data = server.storage_data(&key("demo:out"));
    assert_eq!(data.get("small"), Some(&Tag::Byte(44)));
}

#[test]
fn failed_data_store_is_swallowed_and_the_chain_continues() {
    // Intentionally permissive: a write that cannot land is skipped silently.
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.add_objective("after").expect("new objective");
    let mut doc = Compound::new();
    doc.insert("a".into(), Tag::String("text".into()));
    server.set_storage_data(&key("demo:s"), doc.clone());
    server.spawn_player("Alex", DimensionId::Overworld, DVec3::new(0.5, 64.0, 0.5));

    let into_string = dispatcher.execute(
        &mut server,
        "execute store result storage demo:s a.b int 1 store result score P after run say hi",
        &console(),
    );
    assert_eq!(into_string, Ok(1));
    assert_eq!(server.storage_data(&key("demo:s")), doc);
    assert_eq!(server.score("P", "after"), Some(1));

    let into_player = dispatcher.execute(
        &mut server,
        "execute store result entity @p Health float 1 run say hi",
        &console(),
    );
    assert_eq!(into_player, Ok(1));
    let alex = server.entity_named("Alex").expect("player").id;
    let data = server.entity_data(alex).expect("data");
    assert!(data.get("Health").is_none());
    assert!(server
        .feedback()
        .iter()
        .all(|line| line.kind != FeedbackKind::Failure));
}

#[test]
fn positioned_then_facing_points_east() {
    let (dispatcher, seen) = dispatcher_with_probe();
    let mut server = MemoryServer::new(1);

    let result = dispatcher.execute(
        &mut server,
        "execute rotated 45 30 positioned 0 0 0 facing 10 0 0 run probe",
        &console(),
    );

    assert_eq!(result, Ok(1));
    let rotation = seen.borrow()[0].rotation();
    assert!((rotation.yaw - -90.0).abs() < 1e-4, "yaw was {}", rotation.yaw);
    assert!(rotation.pitch.abs() < 1e-4, "pitch was {}", rotation.pitch);
}

#[test]
fn in_scales_horizontal_coordinates() {
    let (dispatcher, seen) = dispatcher_with_probe();
    let mut server = MemoryServer::new(1);

    dispatcher
        .execute(
            &mut server,
            "execute positioned 80 64 -16 in the_nether run probe",
            &console(),
        )
        .expect("runs");

    let ctx = seen.borrow()[0].clone();
    assert_eq!(ctx.dimension(), DimensionId::Nether);
    // Whole-number x and z are centred first: (80.5, -15.5) / 8.
    assert_eq!(ctx.position(), DVec3::new(10.0625, 64.0, -1.9375));
}

#[test]
fn align_and_local_coordinates() {
    let (dispatcher, seen) = dispatcher_with_probe();
    let mut server = MemoryServer::new(1);

    dispatcher
        .execute(
            &mut server,
            "execute positioned 1.7 64.2 -3.4 align xz run probe",
            &console(),
        )
        .expect("runs");
    dispatcher
        .execute(
            &mut server,
            "execute positioned 0 64 0 rotated -90 0 positioned ^ ^ ^2 run probe",
            &console(),
        )
        .expect("runs");

    let seen = seen.borrow();
    assert_eq!(seen[0].position(), DVec3::new(1.0, 64.2, -4.0));
    let local = seen[1].position();
    assert!((local - DVec3::new(2.5, 64.0, 0.5)).length() < 1e-5, "{local}");
}

#[test]
fn block_score_data_predicate_and_loaded_conditions() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.put_block(DimensionId::Overworld, BlockPos::new(0, 63, 0), stone());
    server.add_objective("kills").expect("new objective");
    server.set_score("Alex", "kills", 5);
    server.set_score("Bob", "kills", 2);
    let mut doc = Compound::new();
    doc.insert(
        "items".into(),
        Tag::List(vec![Tag::Int(1), Tag::Int(2), Tag::Int(3)]),
    );
    server.set_storage_data(&key("demo:inv"), doc);
    server.define_predicate(key("demo:high"), PredicateRule::MinY { y: 100.0 });
    server.unload_column(DimensionId::Overworld, 100, 100);

    let ctx = console();
    let run = |server: &mut MemoryServer, command: &str| dispatcher.execute(server, command, &ctx);

    assert_eq!(run(&mut server, "execute if block 0 63 0 stone"), Ok(1));
    assert_eq!(run(&mut server, "execute unless block ~ ~-1 ~ air"), Ok(1));
    assert_eq!(
        run(&mut server, "execute if block ~ ~-1 ~ dirt"),
        Err(CommandError::ConditionalFailed)
    );
    assert_eq!(run(&mut server, "execute if score Alex kills matches 3.."), Ok(1));
    assert_eq!(run(&mut server, "execute if score Alex kills > Bob kills"), Ok(1));
    assert_eq!(
        run(&mut server, "execute if score Alex kills < Bob kills"),
        Err(CommandError::ConditionalFailed)
    );
    assert_eq!(run(&mut server, "execute if data storage demo:inv items[]"), Ok(3));
    assert_eq!(
        run(&mut server, "execute if predicate demo:high"),
        Err(CommandError::ConditionalFailed)
    );
    assert_eq!(
        run(&mut server, "execute positioned 0 120 0 if predicate demo:high"),
        Ok(1)
    );
    assert_eq!(
        run(&mut server, "execute if predicate demo:missing"),
        Err(CommandError::UnknownPredicate(key("demo:missing")))
    );
    assert_eq!(run(&mut server, "execute if dimension overworld"), Ok(1));
    assert_eq!(run(&mut server, "execute unless loaded 1600 64 1600"), Ok(1));
}

#[test]
fn a_failing_branch_does_not_stop_its_siblings() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.add_objective("hp").expect("new objective");
    let ids = zombies(&mut server, 3);
    server.set_score("Zombie0", "hp", 10);
    server.set_score("Zombie2", "hp", 30);

    let result = dispatcher.execute(
        &mut server,
        "execute as @e[type=zombie] run scoreboard players get @s hp",
        &console(),
    );

    assert_eq!(result, Ok(2));
    assert_eq!(ids.len(), 3);
    let kinds: Vec<FeedbackKind> = server.feedback().iter().map(|line| line.kind).collect();
    assert_eq!(
        kinds,
        vec![FeedbackKind::Success, FeedbackKind::Failure, FeedbackKind::Success]
    );
}

#[test]
fn a_stage_failing_after_the_fork_drops_only_that_branch() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    server.add_objective("o").expect("new objective");
    server.unload_column(DimensionId::Overworld, 10, 10);
    server
        .spawn_mob("zombie", "Near", DimensionId::Overworld, DVec3::new(0.5, 64.0, 0.5))
        .expect("valid kind");
    server
        .spawn_mob("zombie", "Far", DimensionId::Overworld, DVec3::new(165.5, 64.0, 165.5))
        .expect("valid kind");

    let result = dispatcher.execute(
        &mut server,
        "execute as @e[type=zombie] store result score @s o at @s if block ~ ~ ~ air run say hi",
        &console(),
    );

    assert_eq!(result, Ok(1));
    assert_eq!(server.score("Near", "o"), Some(1));
    // The dropped branch still completes its store with 0.
    assert_eq!(server.score("Far", "o"), Some(0));
    let kinds: Vec<FeedbackKind> = server.feedback().iter().map(|line| line.kind).collect();
    assert_eq!(kinds, vec![FeedbackKind::Failure, FeedbackKind::Broadcast]);
}

#[test]
fn sender_selector_sees_changes_made_by_earlier_branches() {
    let inner = Rc::new(Dispatcher::with_builtin_commands());
    let mut dispatcher = Dispatcher::with_builtin_commands();
    let graph = dispatcher.graph_mut();
    let root = graph.root();
    let mark = graph.literal(root, "mark_unless_marked");
    graph.executes(
        mark,
        Executor::leaf(move |server, ctx, _| {
            if inner
                .execute(&mut *server, "execute if entity @s[tag=marked]", ctx)
                .is_ok()
            {
                return Err(CommandError::ConditionalFailed);
            }
            inner.execute(&mut *server, "tag @e[type=zombie] add marked", ctx)?;
            Ok(1)
        }),
    );
    let mut server = MemoryServer::new(1);
    zombies(&mut server, 3);

    let result = dispatcher.execute(
        &mut server,
        "execute as @e[type=zombie] run mark_unless_marked",
        &console(),
    );

    // Only the first branch finds its zombie unmarked.
    assert_eq!(result, Ok(1));
}

#[test]
fn failures_before_a_fork_abort_the_command() {
    let (dispatcher, seen) = dispatcher_with_probe();
    let mut server = MemoryServer::new(1);
    zombies(&mut server, 2);

    let result = dispatcher.execute(
        &mut server,
        "execute if score Alex missing matches 1 as @e run probe",
        &console(),
    );

    assert_eq!(result, Err(CommandError::UnknownObjective("missing".into())));
    assert!(seen.borrow().is_empty());
}

#[test]
fn run_command_reports_failures_and_returns_zero() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);

    assert_eq!(dispatcher.run_command(&mut server, "/execute if entity @e", &console()), 0);
    assert_eq!(dispatcher.run_command(&mut server, "frobnicate", &console()), 0);

    let keys = server.feedback_keys();
    assert_eq!(
        keys,
        vec!["commands.execute.conditional.fail", "command.unknown.command"]
    );
}
