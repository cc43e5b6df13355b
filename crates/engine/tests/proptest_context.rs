//! Context derivations never touch their input, and callback chains run in
//! registration order with the same arguments.

use std::cell::RefCell;
use std::rc::Rc;

use mdcommand_core::{DVec3, DimensionId, Rotation};
use mdcommand_engine::{
    Anchor, CallbackChain, Combine, Dispatcher, ExecutionContext, ResultCallback,
};
use mdcommand_testkit::MemoryServer;
use proptest::prelude::*;

type Log = Rc<RefCell<Vec<(&'static str, String, bool, i32)>>>;

fn recorder(label: &'static str, log: &Log) -> ResultCallback {
    let log = Rc::clone(log);
    ResultCallback::observer(move |_, ctx, success, result| {
        log.borrow_mut()
            .push((label, ctx.name().to_string(), success, result));
    })
}

fn console() -> ExecutionContext {
    ExecutionContext::console(DimensionId::Overworld, DVec3::new(0.5, 64.0, 0.5))
}

#[derive(Debug, Clone, PartialEq)]
struct Fields {
    name: String,
    position: DVec3,
    rotation: Rotation,
    anchor: Anchor,
    dimension: DimensionId,
    permission_level: u8,
    callbacks: usize,
}

fn fields(ctx: &ExecutionContext) -> Fields {
    Fields {
        name: ctx.name().to_string(),
        position: ctx.position(),
        rotation: ctx.rotation(),
        anchor: ctx.anchor(),
        dimension: ctx.dimension(),
        permission_level: ctx.permission_level(),
        callbacks: ctx.callbacks().len(),
    }
}

fn dimension() -> impl Strategy<Value = DimensionId> {
    prop_oneof![
        Just(DimensionId::Overworld),
        Just(DimensionId::Nether),
        Just(DimensionId::End),
    ]
}

proptest! {
    #[test]
    fn derivations_leave_the_original_untouched(
        x in -3.0e7f64..3.0e7,
        y in -64.0f64..320.0,
        z in -3.0e7f64..3.0e7,
        yaw in -180.0f32..180.0,
        pitch in -90.0f32..90.0,
        level in 0u8..=4,
        target in dimension(),
        eyes in any::<bool>(),
    ) {
        let original = console().with_callback(ResultCallback::observer(|_, _, _, _| {}), Combine::Replace);
        let before = fields(&original);
        let anchor = if eyes { Anchor::Eyes } else { Anchor::Feet };

        let derived = vec![
            original.with_position(DVec3::new(x, y, z)),
            original.with_rotation(Rotation::new(yaw, pitch)),
            original.with_anchor(anchor),
            original.with_dimension(target),
            original.with_permission_level(level),
            original.with_callback(ResultCallback::observer(|_, _, _, _| {}), Combine::Chain),
            original.with_callback(ResultCallback::observer(|_, _, _, _| {}), Combine::Replace),
            original.with_suppressed_output(),
            original.facing(DVec3::new(x, y, z)),
        ];

        prop_assert_eq!(fields(&original), before);
        prop_assert_eq!(derived[0].position(), DVec3::new(x, y, z));
        prop_assert_eq!(derived[1].rotation(), Rotation::new(yaw, pitch));
        prop_assert_eq!(derived[5].callbacks().len(), 2);
        prop_assert_eq!(derived[6].callbacks().len(), 1);
    }

    #[test]
    fn facing_is_independent_of_the_previous_rotation(
        yaw in -180.0f32..180.0,
        pitch in -90.0f32..90.0,
        dx in 1.0f64..100.0,
    ) {
        let ctx = console()
            .with_rotation(Rotation::new(yaw, pitch))
            .with_position(DVec3::ZERO);
        let faced = ctx.facing(DVec3::new(dx, 0.0, 0.0));
        prop_assert!((faced.rotation().yaw + 90.0).abs() < 1e-3);
        prop_assert!(faced.rotation().pitch.abs() < 1e-3);
    }
}

#[test]
fn chained_callbacks_fire_in_registration_order_with_identical_arguments() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    let log: Log = Rc::default();
    let ctx = console()
        .with_callback(recorder("outer", &log), Combine::Chain)
        .with_callback(recorder("inner", &log), Combine::Chain);

    assert_eq!(dispatcher.execute(&mut server, "say hi", &ctx), Ok(1));

    let log = log.borrow();
    assert_eq!(
        *log,
        vec![
            ("outer", "Server".to_string(), true, 1),
            ("inner", "Server".to_string(), true, 1),
        ]
    );
}

#[test]
fn failures_reach_every_callback_as_false_zero() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    let log: Log = Rc::default();
    let ctx = console()
        .with_callback(recorder("a", &log), Combine::Chain)
        .with_callback(recorder("b", &log), Combine::Chain);

    assert!(dispatcher
        .execute(&mut server, "execute if entity @e", &ctx)
        .is_err());

    let calls: Vec<_> = log.borrow().iter().map(|(l, _, s, r)| (*l, *s, *r)).collect();
    assert_eq!(calls, vec![("a", false, 0), ("b", false, 0)]);
}

#[test]
fn replace_drops_the_existing_chain() {
    let log: Log = Rc::default();
    let ctx = console()
        .with_callback(recorder("dropped", &log), Combine::Chain)
        .with_callback(recorder("kept", &log), Combine::Replace);
    let mut server = MemoryServer::new(1);

    ctx.on_command_complete(&mut server, true, 7);

    let labels: Vec<_> = log.borrow().iter().map(|(l, ..)| *l).collect();
    assert_eq!(labels, vec!["kept"]);
}

#[test]
fn combined_chains_keep_both_halves_in_order() {
    let log: Log = Rc::default();
    let first = CallbackChain::single(recorder("first", &log)).then(recorder("second", &log));
    let second = CallbackChain::single(recorder("third", &log));
    let combined = CallbackChain::combine(&first, &second);
    let mut server = MemoryServer::new(1);

    combined.invoke(&mut server, &console(), true, 4);

    let calls: Vec<_> = log.borrow().iter().map(|(l, _, s, r)| (*l, *s, *r)).collect();
    assert_eq!(
        calls,
        vec![("first", true, 4), ("second", true, 4), ("third", true, 4)]
    );
    assert_eq!(first.len(), 2, "combining does not consume its inputs");
}

#[test]
fn each_forked_branch_reports_to_the_shared_chain() {
    let dispatcher = Dispatcher::with_builtin_commands();
    let mut server = MemoryServer::new(1);
    for (i, name) in ["A", "B", "C"].into_iter().enumerate() {
        server.spawn_player(name, DimensionId::Overworld, DVec3::new(i as f64, 64.0, 0.0));
    }
    let log: Log = Rc::default();
    let ctx = console().with_callback(recorder("seen", &log), Combine::Chain);

    assert_eq!(dispatcher.execute(&mut server, "execute as @a run say hi", &ctx), Ok(3));

    let names: Vec<_> = log.borrow().iter().map(|(_, n, ..)| n.clone()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}
