//! Unit tests for bt-tree.

use std::time::Duration;

use bt_core::{AgentId, AgentRng, NodeId, Tick};

use crate::{BehaviorTree, TickContext, TreeBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// 100 ms ticks: tick 10 is one second.
fn ctx(tick: u64) -> TickContext {
    TickContext::new(Tick(tick), Duration::from_millis(100), AgentId(0))
}

fn builder() -> TreeBuilder<Log> {
    TreeBuilder::new(AgentRng::new(7, AgentId(0)))
}

/// Per-agent state used by every test tree.
#[derive(Default)]
struct Log {
    names:   Vec<&'static str>,
    seen:    Vec<usize>,
    ticks:   Vec<u64>,
    counts:  Vec<u32>,
    delays:  Vec<u32>,
    flag:    bool,
    counter: u32,
}

fn run(tree: &mut BehaviorTree<Log>, log: &mut Log, ticks: std::ops::RangeInclusive<u64>) {
    for t in ticks {
        tree.update(&ctx(t), log);
    }
}

// ── Builder validation ────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_errors {
    use super::*;
    use crate::{Cooldown, TreeError};

    #[test]
    fn event_needs_exactly_one_child() {
        let mut b = builder();
        let err = b.event("ev", "hit", 0, []).unwrap_err();
        assert!(matches!(err, TreeError::WrongChildCount { kind: "Event", got: 0, .. }));

        let x = b.action("x", |_, _| {});
        let y = b.action("y", |_, _| {});
        let err = b.event("ev", "hit", 0, [x, y]).unwrap_err();
        assert!(matches!(err, TreeError::WrongChildCount { expected: 1, got: 2, .. }));
    }

    #[test]
    fn random_needs_children() {
        let mut b = builder();
        assert!(matches!(b.random("r", []), Err(TreeError::NoChildren { kind: "Random" })));
    }

    #[test]
    fn zero_priority_period_rejected() {
        let mut b = builder();
        let a = b.action("a", |_, _| {});
        let err = b.priority("p", [a], Some(Duration::ZERO), false).unwrap_err();
        assert!(matches!(err, TreeError::ZeroPeriod));
    }

    #[test]
    fn child_cannot_have_two_parents() {
        let mut b = builder();
        let a = b.action("a", |_, _| {});
        b.sequence("s1", [a]).unwrap();
        assert!(matches!(b.selector("s2", [a]), Err(TreeError::AlreadyParented(id)) if id == a));
    }

    #[test]
    fn duplicate_child_in_one_list_rejected() {
        let mut b = builder();
        let a = b.action("a", |_, _| {});
        assert!(matches!(b.sequence("s", [a, a]), Err(TreeError::AlreadyParented(_))));
    }

    #[test]
    fn unknown_child_rejected() {
        let mut b = builder();
        let err = b.latch("l", Cooldown::Fixed(Duration::from_secs(1)), NodeId(99)).unwrap_err();
        assert!(matches!(err, TreeError::UnknownNode(NodeId(99))));
    }

    #[test]
    fn single_child_wrappers_check_their_child() {
        let mut b = builder();
        let a = b.action("a", |_, _| {});
        let not = b.not("not", a).unwrap();
        assert_eq!(b.len(), 2);

        // The wrapped child is taken; a second wrapper around it is refused.
        let err = b.fail_if_success("again", a).unwrap_err();
        assert!(matches!(err, TreeError::AlreadyParented(id) if id == a));
        let err = b.latch("l", Cooldown::Fixed(Duration::from_secs(1)), a).unwrap_err();
        assert!(matches!(err, TreeError::AlreadyParented(id) if id == a));
        assert_eq!(b.len(), 2);

        let tree = b.build(not).unwrap();
        assert_eq!(tree.node(not).unwrap().children(), [a]);
    }

    #[test]
    fn orphan_rejected() {
        let mut b = builder();
        let stray = b.action("stray", |_, _| {});
        let root = b.action("root", |_, _| {});
        assert!(matches!(b.build(root), Err(TreeError::Orphan(id)) if id == stray));
    }

    #[test]
    fn root_with_parent_rejected() {
        let mut b = builder();
        let a = b.action("a", |_, _| {});
        b.sequence("s", [a]).unwrap();
        assert!(matches!(b.build(a), Err(TreeError::RootHasParent(_))));
    }

    #[test]
    fn valid_tree_builds() {
        let mut b = builder();
        let a = b.action("a", |_, _| {});
        let w = b.wait("w", Duration::from_secs(1));
        let root = b.sequence("root", [a, w]).unwrap();
        let tree = b.build(root).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.root(), root);
        assert_eq!(tree.node(a).unwrap().parent(), Some(root));
        assert_eq!(tree.node(root).unwrap().kind_name(), "Sequence");
    }
}

// ── Leaves ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod leaves {
    use super::*;
    use crate::Status;

    #[test]
    fn condition_never_runs() {
        let mut b = builder();
        let root = b.condition("c", |s: &mut Log, _| s.flag);
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Failed);
        log.flag = true;
        assert_eq!(tree.update(&ctx(1), &mut log), Status::Success);
        assert_eq!(tree.last_result(), Status::Success);
        assert_eq!(tree.sleep_time(Duration::ZERO), None);
    }

    #[test]
    fn condition_wait_runs_until_true() {
        let mut b = builder();
        let root = b.condition_wait("cw", |s: &mut Log, _| s.flag);
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        assert_eq!(tree.sleep_time(Duration::ZERO), Some(Duration::ZERO));
        log.flag = true;
        assert_eq!(tree.update(&ctx(1), &mut log), Status::Success);
    }

    #[test]
    fn action_runs_once_per_visit() {
        let mut b = builder();
        let root = b.action("a", |s: &mut Log, _| s.counter += 1);
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        run(&mut tree, &mut log, 0..=4);
        assert_eq!(log.counter, 5);
        assert_eq!(tree.last_result(), Status::Success);
    }

    #[test]
    fn action_sees_tick_context() {
        let mut b = builder();
        let root = b.action("a", |s: &mut Log, ctx| s.ticks.push(ctx.tick.0));
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        run(&mut tree, &mut log, 3..=5);
        assert_eq!(log.ticks, vec![3, 4, 5]);
    }

    #[test]
    fn wait_reports_remaining_time() {
        let mut b = builder();
        let root = b.wait("w", Duration::from_secs(2));
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        assert_eq!(tree.sleep_time(ctx(0).now), Some(Duration::from_secs(2)));

        assert_eq!(tree.update(&ctx(10), &mut log), Status::Running);
        assert_eq!(tree.sleep_time(ctx(10).now), Some(Duration::from_secs(1)));

        assert_eq!(tree.update(&ctx(20), &mut log), Status::Success);
        assert_eq!(tree.sleep_time(ctx(20).now), None);
    }

    #[test]
    fn zero_wait_succeeds_immediately() {
        let mut b = builder();
        let root = b.wait("w", Duration::ZERO);
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.update(&ctx(0), &mut Log::default()), Status::Success);
    }

    #[test]
    fn multi_condition_switches_to_continue() {
        let mut b = builder();
        let body = b.condition_wait("body", |_, _| false);
        let root = b
            .if_then_do_while_node(
                "guarded",
                |s: &mut Log, _| {
                    s.names.push("start");
                    true
                },
                |s: &mut Log, _| {
                    s.names.push("continue");
                    s.flag
                },
                body,
            )
            .unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log { flag: true, ..Log::default() };

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        assert_eq!(tree.update(&ctx(1), &mut log), Status::Running);
        log.flag = false;
        assert_eq!(tree.update(&ctx(2), &mut log), Status::Failed);
        assert_eq!(log.names, vec!["start", "continue", "continue"]);

        // The failure reset the gate, so the next visit starts over.
        log.flag = true;
        tree.update(&ctx(3), &mut log);
        assert_eq!(log.names.last(), Some(&"start"));
    }
}

// ── Composites ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod composites {
    use super::*;
    use crate::{Decorator, Status};

    #[test]
    fn sequence_holds_cursor_while_running() {
        let mut b = builder();
        let a = b.action("a", |s: &mut Log, _| s.names.push("a"));
        let w = b.condition_wait("w", |s: &mut Log, _| {
            s.names.push("w");
            s.flag
        });
        let c = b.action("c", |s: &mut Log, _| s.names.push("c"));
        let root = b.sequence("seq", [a, w, c]).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        assert_eq!(tree.selected_child(root), Some(1));
        assert_eq!(tree.update(&ctx(1), &mut log), Status::Running);
        log.flag = true;
        assert_eq!(tree.update(&ctx(2), &mut log), Status::Success);
        assert_eq!(log.names, vec!["a", "w", "w", "w", "c"]);
    }

    #[test]
    fn failed_sequence_restarts_from_first_child() {
        let mut b = builder();
        let a = b.action("a", |s: &mut Log, _| s.names.push("a"));
        let no = b.condition("no", |_, _| false);
        let root = b.sequence("seq", [a, no]).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Failed);
        assert_eq!(tree.update(&ctx(1), &mut log), Status::Failed);
        assert_eq!(log.names, vec!["a", "a"]);
        assert_eq!(tree.selected_child(root), Some(0));
    }

    #[test]
    fn selector_stops_at_first_running_child() {
        let mut b = builder();
        let x = b.condition("x", |s: &mut Log, _| {
            s.names.push("x");
            false
        });
        let y = b.condition_wait("y", |s: &mut Log, _| {
            s.names.push("y");
            false
        });
        let z = b.action("z", |s: &mut Log, _| s.names.push("z"));
        let root = b.selector("sel", [x, y, z]).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        assert_eq!(log.names, vec!["x", "y"]);
        assert_eq!(tree.status(z), Some(Status::Ready));
    }

    #[test]
    fn exhausted_selector_fails() {
        let mut b = builder();
        let x = b.condition("x", |_, _| false);
        let y = b.condition("y", |_, _| false);
        let root = b.selector("sel", [x, y]).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.update(&ctx(0), &mut Log::default()), Status::Failed);
    }

    #[test]
    fn empty_composites() {
        let mut b = builder();
        let root = b.sequence("seq", []).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.update(&ctx(0), &mut Log::default()), Status::Success);

        let mut b = builder();
        let root = b.selector("sel", []).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.update(&ctx(0), &mut Log::default()), Status::Failed);
    }

    #[test]
    fn bounded_loop_counts_passes() {
        let mut b = builder();
        let a = b.action("a", |s: &mut Log, _| s.counter += 1);
        let root = b.loop_node("loop", [a], Some(3)).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        assert_eq!(tree.loop_reps(root), Some(1));
        assert_eq!(tree.update(&ctx(1), &mut log), Status::Running);
        assert_eq!(tree.loop_reps(root), Some(2));
        assert_eq!(tree.update(&ctx(2), &mut log), Status::Success);
        assert_eq!(log.counter, 3);
        // Finished loops reset their counter.
        assert_eq!(tree.loop_reps(root), Some(0));
    }

    #[test]
    fn unbounded_loop_keeps_running() {
        let mut b = builder();
        let a = b.action("a", |s: &mut Log, _| s.counter += 1);
        let root = b.loop_node("loop", [a], None).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        run(&mut tree, &mut log, 0..=9);
        assert_eq!(tree.last_result(), Status::Running);
        assert_eq!(tree.loop_reps(root), Some(10));
        assert_eq!(tree.sleep_time(Duration::ZERO), Some(Duration::ZERO));
    }

    #[test]
    fn loop_fails_with_its_child() {
        let mut b = builder();
        let c = b.condition("c", |s: &mut Log, _| s.flag);
        let root = b.loop_node("loop", [c], None).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log { flag: true, ..Log::default() };

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        log.flag = false;
        assert_eq!(tree.update(&ctx(1), &mut log), Status::Failed);
    }

    #[test]
    fn decorator_truth_table() {
        use Status::*;
        let table = [
            (Decorator::Not, Success, Failed),
            (Decorator::Not, Failed, Success),
            (Decorator::Not, Running, Running),
            (Decorator::FailIfRunning, Running, Failed),
            (Decorator::FailIfRunning, Success, Success),
            (Decorator::FailIfRunning, Failed, Failed),
            (Decorator::FailIfSuccess, Success, Failed),
            (Decorator::FailIfSuccess, Running, Running),
            (Decorator::FailIfSuccess, Failed, Failed),
        ];
        for (d, input, expected) in table {
            assert_eq!(d.apply(input), expected, "{} on {input}", d.name());
        }
    }

    #[test]
    fn not_inverts_child_in_tree() {
        let mut b = builder();
        let c = b.condition("c", |_, _| true);
        let root = b.not("not", c).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.update(&ctx(0), &mut Log::default()), Status::Failed);
        assert_eq!(tree.node(root).unwrap().kind_name(), "Not");
    }

    #[test]
    fn parallel_waits_for_all_children() {
        let mut b = builder();
        let a = b.action("a", |s: &mut Log, _| s.counter += 1);
        let w = b.condition_wait("w", |s: &mut Log, _| s.flag);
        let root = b.parallel("par", [a, w]).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        assert_eq!(tree.update(&ctx(1), &mut log), Status::Running);
        log.flag = true;
        assert_eq!(tree.update(&ctx(2), &mut log), Status::Success);
        // The finished action is not visited again while the node runs.
        assert_eq!(log.counter, 1);
    }

    #[test]
    fn parallel_any_stops_on_first_completion() {
        let mut b = builder();
        let w = b.condition_wait("w", |_, _| false);
        let a = b.action("a", |_, _| {});
        let root = b.parallel_any("any", [w, a]).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.update(&ctx(0), &mut Log::default()), Status::Success);
    }

    #[test]
    fn while_node_rechecks_its_gate_every_tick() {
        let mut b = builder();
        let body = b.condition_wait("body", |_, _| false);
        let root = b
            .while_node(
                "guard",
                |s: &mut Log, _| {
                    s.counter += 1;
                    s.flag
                },
                body,
            )
            .unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log { flag: true, ..Log::default() };

        run(&mut tree, &mut log, 0..=2);
        assert_eq!(log.counter, 3);
        assert_eq!(tree.last_result(), Status::Running);

        log.flag = false;
        assert_eq!(tree.update(&ctx(3), &mut log), Status::Failed);
        assert_eq!(tree.status(body), Some(Status::Ready));
    }

    #[test]
    fn if_node_guards_child() {
        let mut b = builder();
        let body = b.action("body", |s: &mut Log, _| s.counter += 1);
        let root = b.if_node("if", |s: &mut Log, _| s.flag, body).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Failed);
        log.flag = true;
        assert_eq!(tree.update(&ctx(1), &mut log), Status::Success);
        assert_eq!(log.counter, 1);
    }
}

// ── Random ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod random {
    use proptest::prelude::*;

    use super::*;
    use crate::Status;

    #[test]
    fn commits_to_first_non_failing_child() {
        let mut b = builder();
        let no = b.condition("no", |s: &mut Log, _| {
            s.names.push("no");
            false
        });
        let busy = b.condition_wait("busy", |s: &mut Log, _| {
            s.names.push("busy");
            false
        });
        let root = b.random("rnd", [no, busy]).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        assert_eq!(tree.selected_child(root), Some(1));
        let after_first = log.names.len();

        run(&mut tree, &mut log, 1..=5);
        assert_eq!(&log.names[after_first..], ["busy"; 5]);
    }

    #[test]
    fn all_failing_children_fail() {
        let mut b = builder();
        let x = b.condition("x", |_, _| false);
        let y = b.condition("y", |_, _| false);
        let root = b.random("rnd", [x, y]).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.update(&ctx(0), &mut Log::default()), Status::Failed);
    }

    proptest! {
        /// A Random node that was running at the start of a tick visits only
        /// its committed child, even when that child fails; it rolls again
        /// only once it has been reset to READY.
        #[test]
        fn rerolls_only_from_ready(
            seed    in any::<u64>(),
            n       in 2usize..6,
            pattern in proptest::collection::vec(any::<bool>(), 1..40),
        ) {
            let mut b = TreeBuilder::<Log>::new(AgentRng::new(seed, AgentId(3)));
            let mut children = Vec::with_capacity(n);
            for idx in 0..n {
                let wait = b.condition_wait(format!("c{idx}"), move |s: &mut Log, _| {
                    s.seen.push(idx);
                    s.flag
                });
                children.push(b.fail_if_success(format!("f{idx}"), wait).unwrap());
            }
            let root = b.random("rnd", children).unwrap();
            let mut tree = b.build(root).unwrap();
            let mut log = Log::default();

            let mut prev: Option<(Status, usize)> = None;
            for (t, finish) in pattern.into_iter().enumerate() {
                log.flag = finish;
                log.seen.clear();
                let was_ready = tree.status(root) == Some(Status::Ready);
                let status = tree.update(&ctx(t as u64), &mut log);

                match prev {
                    Some((Status::Running, idx)) => {
                        prop_assert!(!was_ready);
                        prop_assert_eq!(&log.seen, &vec![idx]);
                    }
                    _ => {
                        prop_assert!(was_ready);
                        prop_assert!(!log.seen.is_empty());
                    }
                }
                prev = log.seen.last().map(|&idx| (status, idx));
            }
        }
    }
}

// ── Property: Sequence visit counts ──────────────────────────────────────────

#[cfg(test)]
mod sequence_props {
    use proptest::prelude::*;

    use super::*;
    use crate::Status;

    proptest! {
        /// Child `i` runs for `delays[i]` ticks and then succeeds.  The
        /// Sequence succeeds after every child resolved exactly once and
        /// never goes back to an earlier child.
        #[test]
        fn each_child_resolves_once(delays in proptest::collection::vec(0u32..4, 1..8)) {
            let n = delays.len();
            let mut b = builder();
            let children: Vec<NodeId> = (0..n)
                .map(|idx| {
                    b.condition_wait(format!("c{idx}"), move |s: &mut Log, _| {
                        s.seen.push(idx);
                        s.counts[idx] += 1;
                        s.counts[idx] > s.delays[idx]
                    })
                })
                .collect();
            let root = b.sequence("seq", children).unwrap();
            let mut tree = b.build(root).unwrap();
            let mut log = Log { counts: vec![0; n], delays: delays.clone(), ..Log::default() };

            let expected_ticks: u32 = delays.iter().sum::<u32>() + 1;
            let mut ticks = 0;
            loop {
                let status = tree.update(&ctx(u64::from(ticks)), &mut log);
                ticks += 1;
                if status != Status::Running {
                    prop_assert_eq!(status, Status::Success);
                    break;
                }
                prop_assert!(ticks < expected_ticks);
            }
            prop_assert_eq!(ticks, expected_ticks);
            for idx in 0..n {
                prop_assert_eq!(log.counts[idx], delays[idx] + 1);
            }
            prop_assert!(log.seen.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}

// ── Priority ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod priority {
    use super::*;
    use crate::Status;

    #[test]
    fn reevaluates_only_at_period_multiples() {
        let mut b = builder();
        let gate = b.condition("gate", |s: &mut Log, ctx| {
            s.ticks.push(ctx.tick.0);
            false
        });
        let idle = b.condition_wait("idle", |_, _| false);
        let root = b.priority("pri", [gate, idle], Some(Duration::from_secs(1)), false).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        run(&mut tree, &mut log, 0..=30);
        assert_eq!(log.ticks, vec![0, 10, 20, 30]);
        assert_eq!(tree.selected_child(root), Some(1));
    }

    #[test]
    fn idle_priority_between_evaluations_lets_sequence_continue() {
        let mut b = builder();
        let gate = b.condition("gate", |_, _| false);
        let pri = b.priority("pri", [gate], None, false).unwrap();
        let after = b.action("after", |s: &mut Log, _| s.names.push("after"));
        let root = b.sequence("seq", [pri, after]).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Failed);
        assert!(log.names.is_empty());

        // Not due yet: the Priority stays Ready and the Sequence moves on.
        assert_eq!(tree.update(&ctx(1), &mut log), Status::Success);
        assert_eq!(log.names, ["after"]);
        assert_eq!(tree.node(pri).unwrap().last_result(), Status::Ready);

        // Due again: the failing scan stops the Sequence.
        assert_eq!(tree.update(&ctx(10), &mut log), Status::Failed);
        assert_eq!(log.names, ["after"]);
    }

    #[test]
    fn failed_priority_sleeps_until_next_evaluation() {
        let mut b = builder();
        let gate = b.condition("gate", |_, _| false);
        let root = b.priority("pri", [gate], None, false).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Failed);
        assert_eq!(tree.sleep_time(ctx(0).now), Some(Duration::from_secs(1)));
        assert_eq!(tree.sleep_time(ctx(4).now), Some(Duration::from_millis(600)));
    }

    #[test]
    fn settled_child_triggers_evaluation_next_tick() {
        let mut b = builder();
        let gate = b.condition("gate", |s: &mut Log, ctx| {
            s.ticks.push(ctx.tick.0);
            true
        });
        let work = b.condition_wait("work", |s: &mut Log, _| s.flag);
        let branch = b.sequence("branch", [gate, work]).unwrap();
        let root = b.priority("pri", [branch], Some(Duration::from_secs(10)), false).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        run(&mut tree, &mut log, 0..=2);
        log.flag = true;
        assert_eq!(tree.update(&ctx(3), &mut log), Status::Success);
        assert_eq!(tree.sleep_time(ctx(3).now), Some(Duration::ZERO));
        // The root is READY again with no pending evaluation time, so the
        // next visit re-evaluates right away.
        log.flag = false;
        tree.update(&ctx(4), &mut log);
        assert_eq!(log.ticks, vec![0, 4]);
    }

    #[test]
    fn event_forces_out_of_band_evaluation() {
        let mut b = builder();
        let flee = b.condition_wait("flee", |s: &mut Log, _| s.flag);
        let alarm = b.event("alarm", "alarm", 0, [flee]).unwrap();
        let idle = b.condition_wait("idle", |_, _| false);
        let root = b.priority("pri", [alarm, idle], Some(Duration::from_secs(10)), false).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        run(&mut tree, &mut log, 0..=1);
        assert_eq!(tree.selected_child(root), Some(1));

        assert_eq!(tree.trigger_event("alarm", None), 1);
        assert_eq!(tree.sleep_time(ctx(1).now), Some(Duration::ZERO));

        assert_eq!(tree.update(&ctx(2), &mut log), Status::Running);
        assert_eq!(tree.selected_child(root), Some(0));
        assert_eq!(tree.status(alarm), Some(Status::Running));
        assert_eq!(tree.status(idle), Some(Status::Ready));
        assert!(!tree.is_force_update());
    }

    #[test]
    fn equal_priority_event_may_preempt_selected_event() {
        let mut b = builder();
        let a = b.condition_wait("a", |_, _| false);
        let ev_a = b.event("ev_a", "a", 0, [a]).unwrap();
        let c = b.condition_wait("c", |_, _| false);
        let ev_c = b.event("ev_c", "c", 0, [c]).unwrap();
        let root = b.priority("pri", [ev_a, ev_c], Some(Duration::from_secs(10)), false).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        tree.trigger_event("a", None);
        tree.update(&ctx(0), &mut log);
        assert_eq!(tree.selected_child(root), Some(0));

        tree.trigger_event("c", None);
        tree.update(&ctx(1), &mut log);
        assert_eq!(tree.selected_child(root), Some(1));
        assert_eq!(tree.status(ev_a), Some(Status::Ready));
        assert_eq!(tree.status(ev_c), Some(Status::Running));
    }

    #[test]
    fn lower_priority_event_does_not_preempt() {
        let mut b = builder();
        let a = b.condition_wait("a", |_, _| false);
        let ev_a = b.event("ev_a", "a", 1, [a]).unwrap();
        let c = b.condition_wait("c", |_, _| false);
        let ev_c = b.event("ev_c", "c", 0, [c]).unwrap();
        let root = b.priority("pri", [ev_a, ev_c], Some(Duration::from_secs(10)), false).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        tree.trigger_event("a", None);
        tree.update(&ctx(0), &mut log);
        tree.trigger_event("c", None);
        tree.update(&ctx(1), &mut log);
        assert_eq!(tree.selected_child(root), Some(0));
        assert_eq!(tree.status(ev_c), Some(Status::Ready));
    }

    #[test]
    fn scatter_delays_second_evaluation() {
        let mut second_evals = Vec::new();
        for agent in 0..20 {
            let mut b = TreeBuilder::<Log>::new(AgentRng::new(99, AgentId(agent)));
            let gate = b.condition("gate", |s: &mut Log, ctx| {
                s.ticks.push(ctx.tick.0);
                false
            });
            let root = b.priority("pri", [gate], Some(Duration::from_secs(1)), true).unwrap();
            let mut tree = b.build(root).unwrap();
            let mut log = Log::default();
            for t in 0..=200 {
                // 10 ms ticks.
                let ctx = TickContext::new(Tick(t), Duration::from_millis(10), AgentId(agent));
                tree.update(&ctx, &mut log);
            }
            assert_eq!(log.ticks[0], 0);
            let second = log.ticks[1];
            assert!((50..=150).contains(&second), "second evaluation at tick {second}");
            second_evals.push(second);
        }
        second_evals.dedup();
        assert!(second_evals.len() > 1);
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod events {
    use std::sync::Arc;

    use bt_core::EventSource;

    use super::*;
    use crate::{Status, TreeSignal};

    #[derive(Default)]
    struct Recorder {
        listened: Vec<(AgentId, String)>,
        removed:  Vec<(AgentId, String)>,
    }

    impl EventSource for Recorder {
        fn listen_for_event(&mut self, agent: AgentId, event: &str) {
            self.listened.push((agent, event.to_string()));
        }

        fn remove_event_callback(&mut self, agent: AgentId, event: &str) {
            self.removed.push((agent, event.to_string()));
        }
    }

    fn event_tree(child_wait: Duration) -> (BehaviorTree<Log>, NodeId) {
        let mut b = builder();
        let w = b.wait("w", child_wait);
        let ev = b.event("ev", "hit", 0, [w]).unwrap();
        (b.build(ev).unwrap(), ev)
    }

    #[test]
    fn untriggered_event_stays_ready() {
        let (mut tree, _) = event_tree(Duration::from_secs(1));
        assert_eq!(tree.update(&ctx(0), &mut Log::default()), Status::Ready);
        assert_eq!(tree.sleep_time(Duration::ZERO), None);
    }

    #[test]
    fn raise_event_returns_signals_without_applying_them() {
        let (mut tree, ev) = event_tree(Duration::from_secs(1));
        let signals = tree.raise_event("hit", None);
        assert_eq!(signals, vec![TreeSignal::InvalidateAncestors(ev), TreeSignal::ForceUpdate]);
        assert!(!tree.is_force_update());

        assert!(tree.raise_event("miss", None).is_empty());
    }

    #[test]
    fn trigger_runs_child_until_it_completes() {
        let (mut tree, _) = event_tree(Duration::from_secs(1));
        let mut log = Log::default();

        assert_eq!(tree.trigger_event("hit", None), 1);
        assert!(tree.is_force_update());
        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        // The trigger flag is cleared, but the running Event keeps going.
        assert_eq!(tree.update(&ctx(5), &mut log), Status::Running);
        assert_eq!(tree.update(&ctx(10), &mut log), Status::Success);
        // A new trigger is needed to run again.
        assert_eq!(tree.update(&ctx(11), &mut log), Status::Ready);
    }

    #[test]
    fn retrigger_while_running_restarts_child() {
        let (mut tree, _) = event_tree(Duration::from_secs(2));
        let mut log = Log::default();

        tree.trigger_event("hit", None);
        tree.update(&ctx(0), &mut log);
        tree.trigger_event("hit", None);
        tree.update(&ctx(10), &mut log);
        assert_eq!(tree.sleep_time(ctx(10).now), Some(Duration::from_secs(2)));
    }

    #[test]
    fn payload_is_kept() {
        let (mut tree, ev) = event_tree(Duration::from_secs(1));
        assert!(tree.event_data(ev).is_none());
        tree.trigger_event("hit", Some(Arc::new(42u32)));
        let data = tree.event_data(ev).unwrap();
        assert_eq!(data.downcast_ref::<u32>(), Some(&42));
    }

    #[test]
    fn unknown_event_is_ignored() {
        let (mut tree, _) = event_tree(Duration::from_secs(1));
        assert_eq!(tree.trigger_event("other", None), 0);
        assert!(!tree.is_force_update());
    }

    #[test]
    fn subscribe_and_stop_are_paired() {
        let mut b = builder();
        let x = b.action("x", |_, _| {});
        let ev1 = b.event("ev1", "hit", 0, [x]).unwrap();
        let y = b.condition_wait("y", |_, _| false);
        let ev2 = b.event("ev2", "hit", 1, [y]).unwrap();
        let z = b.action("z", |_, _| {});
        let ev3 = b.event("ev3", "heal", 0, [z]).unwrap();
        let root = b.selector("root", [ev1, ev2, ev3]).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut source = Recorder::default();
        let agent = AgentId(5);

        tree.subscribe(agent, &mut source);
        tree.subscribe(agent, &mut source);
        assert_eq!(
            source.listened,
            vec![(agent, "hit".to_string()), (agent, "heal".to_string())]
        );

        tree.trigger_event("hit", None);
        tree.update(&ctx(0), &mut Log::default());
        let before = tree.display(ctx(0).now).to_string();

        tree.stop(&mut source);
        tree.stop(&mut source);
        assert_eq!(source.removed.len(), 2);
        assert!(!tree.is_subscribed());
        assert_eq!(tree.display(ctx(0).now).to_string(), before);
    }
}

// ── Latch ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod latch {
    use super::*;
    use crate::{Cooldown, Status};

    #[test]
    fn reopens_only_after_cooldown() {
        let mut b = builder();
        let a = b.action("a", |s: &mut Log, _| s.counter += 1);
        let root = b.latch("latch", Cooldown::Fixed(Duration::from_secs(1)), a).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Success);
        assert_eq!(tree.update(&ctx(5), &mut log), Status::Failed);
        assert_eq!(tree.update(&ctx(9), &mut log), Status::Failed);
        assert_eq!(tree.update(&ctx(10), &mut log), Status::Success);
        assert_eq!(log.counter, 2);
    }

    #[test]
    fn open_latch_forwards_to_running_child() {
        let mut b = builder();
        let w = b.wait("w", Duration::from_secs(3));
        let root = b.latch("latch", Cooldown::Fixed(Duration::from_secs(1)), w).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        assert_eq!(tree.update(&ctx(0), &mut log), Status::Running);
        assert_eq!(tree.update(&ctx(20), &mut log), Status::Running);
        assert_eq!(tree.update(&ctx(30), &mut log), Status::Success);
    }

    #[test]
    fn scattered_cooldown_stays_in_range() {
        let mut rng = AgentRng::new(1, AgentId(2));
        let mut cooldown = Cooldown::Scattered { base: Duration::from_secs(2), lo: 0.5, hi: 1.5 };
        for _ in 0..200 {
            let d = cooldown.next(&mut rng);
            assert!(d >= Duration::from_secs(1) && d < Duration::from_secs(3), "{d:?}");
        }
    }

    #[test]
    fn computed_cooldown_is_drawn_per_opening() {
        let mut b = builder();
        let a = b.action("a", |s: &mut Log, ctx| s.ticks.push(ctx.tick.0));
        let mut next = 0u64;
        let cooldown = Cooldown::Computed(Box::new(move |_: &mut AgentRng| {
            next += 1;
            Duration::from_secs(next)
        }));
        let root = b.latch("latch", cooldown, a).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        run(&mut tree, &mut log, 0..=40);
        // Cooldowns of 1 s then 2 s then 3 s.
        assert_eq!(log.ticks, vec![0, 10, 30]);
    }
}

// ── Reset, force, abort ───────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use proptest::prelude::*;

    use super::*;
    use crate::Status;

    fn busy_tree() -> BehaviorTree<Log> {
        let mut b = builder();
        let a = b.action("a", |s: &mut Log, _| s.counter += 1);
        let w = b.wait("w", Duration::from_secs(1));
        let inner = b.loop_node("inner", [w], None).unwrap();
        let c = b.condition_wait("c", |s: &mut Log, _| s.flag);
        let par = b.parallel("par", [inner, c]).unwrap();
        let root = b.sequence("root", [a, par]).unwrap();
        b.build(root).unwrap()
    }

    proptest! {
        #[test]
        fn reset_is_idempotent(ticks in 0u64..30) {
            let mut tree = busy_tree();
            let mut log = Log::default();
            for t in 0..ticks {
                tree.update(&ctx(t), &mut log);
            }
            let counter = log.counter;

            tree.reset();
            let once = tree.display(ctx(ticks).now).to_string();
            tree.reset();
            let twice = tree.display(ctx(ticks).now).to_string();

            prop_assert_eq!(once, twice);
            prop_assert_eq!(log.counter, counter);
            prop_assert!(tree.iter().all(|(_, n)| n.status() == Status::Ready));
        }
    }

    #[test]
    fn force_update_overrides_sleep_until_next_update() {
        let mut b = builder();
        let root = b.wait("w", Duration::from_secs(5));
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        tree.update(&ctx(0), &mut log);
        tree.force_update();
        assert_eq!(tree.sleep_time(Duration::ZERO), Some(Duration::ZERO));
        tree.update(&ctx(1), &mut log);
        assert_eq!(tree.sleep_time(ctx(1).now), Some(Duration::from_millis(4900)));
    }

    #[test]
    fn abort_cycle_fails_root_and_resets() {
        let mut tree = busy_tree();
        let mut log = Log::default();
        tree.update(&ctx(0), &mut log);
        assert_eq!(tree.root_status(), Status::Running);

        tree.abort_cycle();
        assert_eq!(tree.last_result(), Status::Failed);
        assert!(tree.iter().all(|(_, n)| n.status() == Status::Ready));
    }

    #[test]
    fn abort_cycle_after_panic_mid_visit_resets_every_node() {
        let mut b = builder();
        let w = b.wait("w", Duration::from_secs(5));
        let boom = b.action("boom", |s: &mut Log, _| {
            if !s.flag {
                s.flag = true;
                panic!("boom");
            }
        });
        let inner = b.parallel("inner", [w, boom]).unwrap();
        let root = b.parallel("root", [inner]).unwrap();
        let mut tree = b.build(root).unwrap();
        let mut log = Log::default();

        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| tree.update(&ctx(0), &mut log)));
        assert!(caught.is_err());

        // The Wait latched before the panic, under parents still Ready.
        tree.abort_cycle();
        assert_eq!(tree.last_result(), Status::Failed);
        assert!(tree.iter().all(|(_, n)| n.status() == Status::Ready));
        assert_eq!(tree.sleep_time(ctx(0).now), None);

        // The next cycle latches a fresh wake time.
        assert_eq!(tree.update(&ctx(10), &mut log), Status::Running);
        assert_eq!(tree.sleep_time(ctx(10).now), Some(Duration::from_secs(5)));
    }
}

// ── Dump ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod dump {
    use super::*;

    #[test]
    fn renders_indented_lines() {
        let mut b = builder();
        let hungry = b.condition("hungry", |_, _| false);
        let idle = b.wait("idle", Duration::from_secs(2));
        let root = b.selector("root", [hungry, idle]).unwrap();
        let mut tree = b.build(root).unwrap();
        tree.update(&ctx(0), &mut Log::default());

        let expected = "root - RUNNING <RUNNING> (1)>2.00\n   \
                        >hungry - READY <FAILED> ()>0.00\n   \
                        >idle - RUNNING <RUNNING> (2.00)>2.00\n";
        assert_eq!(tree.display(Duration::ZERO).to_string(), expected);
    }

    #[test]
    fn priority_debug_string() {
        let mut b = builder();
        let idle = b.condition_wait("idle", |_, _| false);
        let root = b.priority("pri", [idle], None, false).unwrap();
        let mut tree = b.build(root).unwrap();
        tree.update(&ctx(0), &mut Log::default());

        let dump = tree.display(Duration::from_millis(250)).to_string();
        assert!(dump.starts_with("pri - RUNNING <RUNNING> (execute 0, eval in 0.75)>0.00"), "{dump}");
    }
}
