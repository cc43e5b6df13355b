use mdcommand::command_script::CommandScriptPlayer;
use proptest::prelude::*;

fn script_json(ticks: &[u64]) -> String {
    let steps: Vec<serde_json::Value> = ticks
        .iter()
        .enumerate()
        .map(|(i, tick)| serde_json::json!({ "tick": tick, "command": format!("say {i}") }))
        .collect();
    serde_json::json!({ "steps": steps }).to_string()
}

proptest! {
    #[test]
    fn draining_in_any_tick_steps_yields_every_command_once(
        mut ticks in prop::collection::vec(0u64..50, 1..20),
        stride in 1u64..7,
    ) {
        ticks.sort_unstable();
        let mut script = CommandScriptPlayer::from_str(&script_json(&ticks)).unwrap();
        let mut seen = Vec::new();
        let mut now = 0;
        while !script.is_finished() {
            for step in script.drain_ready(now) {
                prop_assert!(step.tick <= now);
                seen.push(step.command);
            }
            now += stride;
        }
        let expected: Vec<String> = (0..ticks.len()).map(|i| format!("say {i}")).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn out_of_order_ticks_are_rejected(a in 1u64..100, back in 1u64..100) {
        let b = a.saturating_sub(back);
        prop_assume!(b < a);
        prop_assert!(CommandScriptPlayer::from_str(&script_json(&[a, b])).is_err());
    }
}
