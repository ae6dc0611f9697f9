//! Tests for the write policy, lock flow and modified-file watcher.

use super::*;
use crate::backend::LfsBackend;
use crate::prefs::{DISABLED_KEY, MemoryPreferenceStore, PreferenceStore};
use crate::test_support::{Reply, ScriptedPrompter, ScriptedRunner, target};
use std::cell::Cell;

type TestCoordinator<'a> = LockCoordinator<&'a ScriptedRunner, &'a MemoryPreferenceStore>;

fn coordinator<'a>(
    runner: &'a ScriptedRunner,
    prefs: &'a MemoryPreferenceStore,
) -> TestCoordinator<'a> {
    LockCoordinator::new(LfsBackend::new(runner), prefs)
}

fn observed(path: &str, modified: bool) -> Observation {
    Observation {
        target: target(path),
        modified,
        read_only: true,
    }
}

// ============================================================================
// decide
// ============================================================================

#[test]
fn test_decide_disabled_always_proceeds() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    prefs.set_bool(DISABLED_KEY, true).unwrap();
    let coord = coordinator(&runner, &prefs);

    assert_eq!(
        decide(&coord, &target("a.unity"), true).unwrap(),
        Decision::Proceed
    );
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn test_decide_writable_proceeds_read_only_escalates() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);

    assert_eq!(
        decide(&coord, &target("a.unity"), false).unwrap(),
        Decision::Proceed
    );
    assert_eq!(
        decide(&coord, &target("a.unity"), true).unwrap(),
        Decision::EscalateToLockFlow
    );
    assert_eq!(runner.call_count(), 0);
}

// ============================================================================
// run_lock_flow
// ============================================================================

#[test]
fn test_flow_lock_now_success() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter = ScriptedPrompter::choosing(UserChoice::LockNow);

    let outcome = run_lock_flow(&coord, &target("a.unity"), &mut prompter).unwrap();
    assert_eq!(outcome, FlowOutcome::Locked);
    assert!(!outcome.silences_target());
    assert!(prompter.notices[0].contains("Locking successful"));
}

#[test]
fn test_flow_held_by_other_declined_force() {
    let runner = ScriptedRunner::new([
        Reply::fail(),
        Reply::stdout(r#"[{"owner":{"name":"Alice"}}]"#),
    ]);
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter = ScriptedPrompter::choosing(UserChoice::LockNow).confirming_force(false);

    let outcome = run_lock_flow(&coord, &target("a.unity"), &mut prompter).unwrap();
    assert_eq!(
        outcome,
        FlowOutcome::WorkingWithoutLock {
            owner: Some("Alice".to_string())
        }
    );
    assert!(outcome.silences_target());
    assert!(prompter.notices[0].contains("Alice has a.unity currently locked"));
    // No force unlock without confirmation.
    assert_eq!(runner.call_count(), 2);
}

#[test]
fn test_flow_held_by_other_confirmed_force() {
    let runner = ScriptedRunner::new([
        Reply::fail(),
        Reply::stdout(r#"[{"owner":{"name":"Alice"}}]"#),
        Reply::ok(),
        Reply::ok(),
    ]);
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter = ScriptedPrompter::choosing(UserChoice::LockNow).confirming_force(true);

    let outcome = run_lock_flow(&coord, &target("a.unity"), &mut prompter).unwrap();
    assert_eq!(
        outcome,
        FlowOutcome::ForceAcquired {
            previous_owner: Some("Alice".to_string())
        }
    );
    assert_eq!(
        runner.calls()[2..],
        ["git lfs unlock a.unity --force", "git lfs lock a.unity"]
    );
    assert!(prompter.notices[1].contains("Make sure Alice knows"));
}

#[test]
fn test_flow_force_failure_reported() {
    let runner = ScriptedRunner::new([
        Reply::fail(),
        Reply::stdout("[]"),
        Reply::ok(),
        Reply::fail(),
    ]);
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter = ScriptedPrompter::choosing(UserChoice::LockNow).confirming_force(true);

    let outcome = run_lock_flow(&coord, &target("a.unity"), &mut prompter).unwrap();
    assert_eq!(outcome, FlowOutcome::ForceFailed { owner: None });
    assert!(!outcome.silences_target());
    assert!(prompter.notices[0].contains("unknown has a.unity"));
}

#[test]
fn test_flow_ignore_choices_touch_nothing() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);

    let mut once = ScriptedPrompter::choosing(UserChoice::IgnoreOnce);
    assert_eq!(
        run_lock_flow(&coord, &target("a.unity"), &mut once).unwrap(),
        FlowOutcome::IgnoredOnce
    );

    let mut session = ScriptedPrompter::choosing(UserChoice::IgnoreSession);
    let outcome = run_lock_flow(&coord, &target("a.unity"), &mut session).unwrap();
    assert_eq!(outcome, FlowOutcome::IgnoredForSession);
    assert!(outcome.silences_target());

    assert_eq!(runner.call_count(), 0);
}

#[test]
fn test_flow_disable_requires_confirmation() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);

    let mut declined = ScriptedPrompter::choosing(UserChoice::DisableSystem);
    assert_eq!(
        run_lock_flow(&coord, &target("a.unity"), &mut declined).unwrap(),
        FlowOutcome::DisableDeclined
    );
    assert!(!coord.is_disabled().unwrap());

    let mut confirmed =
        ScriptedPrompter::choosing(UserChoice::DisableSystem).confirming_disable(true);
    assert_eq!(
        run_lock_flow(&coord, &target("a.unity"), &mut confirmed).unwrap(),
        FlowOutcome::Disabled
    );
    assert!(coord.is_disabled().unwrap());
    assert_eq!(runner.call_count(), 0);
}

// ============================================================================
// gate_write
// ============================================================================

#[test]
fn test_gate_writable_proceeds_without_prompt() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter = ScriptedPrompter::choosing(UserChoice::LockNow);

    let gate = gate_write(&coord, &target("a.unity"), &mut prompter, |_| Ok(false)).unwrap();
    assert_eq!(gate.decision, Decision::Proceed);
    assert_eq!(gate.flow, None);
    assert!(prompter.asked.is_empty());
}

#[test]
fn test_gate_proceeds_once_lock_makes_file_writable() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter = ScriptedPrompter::choosing(UserChoice::LockNow);
    let probes = Cell::new(0);

    // Read-only on the first probe, writable after locking.
    let gate = gate_write(&coord, &target("a.unity"), &mut prompter, |_| {
        probes.set(probes.get() + 1);
        Ok(probes.get() == 1)
    })
    .unwrap();
    assert_eq!(gate.decision, Decision::Proceed);
    assert_eq!(gate.flow, Some(FlowOutcome::Locked));
}

#[test]
fn test_gate_blocks_when_still_read_only() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter = ScriptedPrompter::choosing(UserChoice::IgnoreOnce);

    let gate = gate_write(&coord, &target("a.unity"), &mut prompter, |_| Ok(true)).unwrap();
    assert_eq!(gate.decision, Decision::Block);
    assert_eq!(gate.flow, Some(FlowOutcome::IgnoredOnce));
}

// ============================================================================
// ModifiedWatcher
// ============================================================================

#[test]
fn test_watcher_ignored_set_lifecycle() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter = ScriptedPrompter::choosing(UserChoice::IgnoreSession);
    let mut watcher = ModifiedWatcher::new();
    let t = target("Assets/Main.unity");

    // First modification escalates and is silenced.
    let outcomes = watcher
        .poll(&coord, &[observed("Assets/Main.unity", true)], &mut prompter)
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(watcher.is_ignored(&t));

    // Still modified: no re-escalation.
    for _ in 0..3 {
        let outcomes = watcher
            .poll(&coord, &[observed("Assets/Main.unity", true)], &mut prompter)
            .unwrap();
        assert!(outcomes.is_empty());
    }
    assert_eq!(prompter.asked.len(), 1);

    // Clean again: entry removed immediately.
    watcher
        .poll(&coord, &[observed("Assets/Main.unity", false)], &mut prompter)
        .unwrap();
    assert!(!watcher.is_ignored(&t));

    // Modified again: escalates again.
    let outcomes = watcher
        .poll(&coord, &[observed("Assets/Main.unity", true)], &mut prompter)
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(prompter.asked.len(), 2);
}

#[test]
fn test_watcher_ignore_once_asks_every_poll() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter = ScriptedPrompter::choosing(UserChoice::IgnoreOnce);
    let mut watcher = ModifiedWatcher::new();

    for _ in 0..2 {
        watcher
            .poll(&coord, &[observed("a.unity", true)], &mut prompter)
            .unwrap();
    }
    assert_eq!(prompter.asked.len(), 2);
    assert_eq!(watcher.ignored().count(), 0);
}

#[test]
fn test_watcher_skips_writable_and_disabled() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter = ScriptedPrompter::choosing(UserChoice::LockNow);
    let mut watcher = ModifiedWatcher::new();

    let writable = Observation {
        target: target("a.unity"),
        modified: true,
        read_only: false,
    };
    assert!(watcher.poll(&coord, &[writable], &mut prompter).unwrap().is_empty());

    prefs.set_bool(DISABLED_KEY, true).unwrap();
    assert!(
        watcher
            .poll(&coord, &[observed("b.unity", true)], &mut prompter)
            .unwrap()
            .is_empty()
    );
    assert!(prompter.asked.is_empty());
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn test_watcher_stops_escalating_after_disable() {
    let runner = ScriptedRunner::always(Reply::ok());
    let prefs = MemoryPreferenceStore::default();
    let coord = coordinator(&runner, &prefs);
    let mut prompter =
        ScriptedPrompter::choosing(UserChoice::DisableSystem).confirming_disable(true);
    let mut watcher = ModifiedWatcher::new();

    let outcomes = watcher
        .poll(
            &coord,
            &[observed("a.unity", true), observed("b.unity", true)],
            &mut prompter,
        )
        .unwrap();
    assert_eq!(outcomes, vec![(target("a.unity"), FlowOutcome::Disabled)]);
    assert_eq!(prompter.asked, vec!["a.unity"]);
}
