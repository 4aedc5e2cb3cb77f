//! Date Propagator: earliest feasible start/due dates over the DAG.

use super::graph::TaskGraph;
use crate::error::{ScheduleError, ScheduleResult};
use crate::types::Task;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// How recalculation treats tasks already marked done that carry dates from an
/// earlier run.
///
/// `Preserve` (the default) keeps a completed task's historical dates; its
/// stored due date still feeds its successors. `Recompute` moves every task,
/// done or not. Strict recomputation is an explicit opt-in, never a silent
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletedDatePolicy {
    #[default]
    Preserve,
    Recompute,
}

/// Calendar days a duration occupies: fractional work days round up to the
/// next whole day (2.5 days of work still blocks successors for 3 days).
pub fn duration_days(duration: f64) -> u64 {
    duration.ceil() as u64
}

/// Walk the task set in topological order, assigning each task its earliest
/// feasible dates.
///
/// A task with no predecessors starts at `baseline`; otherwise it starts at
/// the latest due date among its predecessors, all of which are already dated
/// thanks to the topological order. Due date is start plus the rounded
/// duration.
///
/// Fails with [`ScheduleError::DateOverflow`] if a due date would leave the
/// calendar range chrono supports; stored durations are capped at write time,
/// so that only happens on corrupted data.
pub fn propagate(
    tasks: &mut [Task],
    graph: &TaskGraph,
    order: &[usize],
    baseline: NaiveDate,
    policy: CompletedDatePolicy,
) -> ScheduleResult<()> {
    // Due date per node, filled strictly in topological order.
    let mut due = vec![baseline; graph.len()];

    for &node in order {
        let pos = graph.task_pos(node);
        let task = &tasks[pos];

        if policy == CompletedDatePolicy::Preserve
            && task.done
            && let Some(kept_due) = task.due_date
            && task.start_date.is_some()
        {
            due[node] = kept_due;
            continue;
        }

        let start = graph
            .preds_of(node)
            .iter()
            .map(|&p| due[p])
            .max()
            .unwrap_or(baseline);
        let end = start
            .checked_add_days(Days::new(duration_days(task.duration)))
            .ok_or(ScheduleError::DateOverflow { task_id: task.id })?;

        let task = &mut tasks[pos];
        task.start_date = Some(start);
        task.due_date = Some(end);
        due[node] = end;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::testutil::{d, done_task, task};
    use crate::schedule::topo::topological_order;

    fn run(tasks: &mut [Task], baseline: NaiveDate, policy: CompletedDatePolicy) {
        let graph = TaskGraph::build(tasks).unwrap();
        let order = topological_order(&graph).unwrap();
        propagate(tasks, &graph, &order, baseline, policy).unwrap();
    }

    #[test]
    fn rounding_is_explicit_ceil() {
        assert_eq!(duration_days(1.0), 1);
        assert_eq!(duration_days(2.5), 3);
        assert_eq!(duration_days(0.25), 1);
        assert_eq!(duration_days(7.0), 7);
    }

    #[test]
    fn chain_accumulates_durations() {
        // Scenario: A(2d) -> B(3d) from a day-0 baseline.
        let mut tasks = vec![task(1, 2.0, &[]), task(2, 3.0, &[1])];
        let day0 = d(2026, 3, 2);
        run(&mut tasks, day0, CompletedDatePolicy::Preserve);

        assert_eq!(tasks[0].start_date, Some(day0));
        assert_eq!(tasks[0].due_date, Some(d(2026, 3, 4)));
        assert_eq!(tasks[1].start_date, Some(d(2026, 3, 4)));
        assert_eq!(tasks[1].due_date, Some(d(2026, 3, 7)));
    }

    #[test]
    fn start_is_max_over_predecessors() {
        // Diamond: the long branch (3d) dictates the join's start.
        let mut tasks = vec![
            task(1, 1.0, &[]),
            task(2, 3.0, &[1]),
            task(3, 1.0, &[1]),
            task(4, 1.0, &[2, 3]),
        ];
        run(&mut tasks, d(2026, 1, 5), CompletedDatePolicy::Preserve);

        assert_eq!(tasks[3].start_date, Some(d(2026, 1, 9)));
        assert_eq!(tasks[3].due_date, Some(d(2026, 1, 10)));
    }

    #[test]
    fn fractional_duration_rounds_up_in_propagation() {
        let mut tasks = vec![task(1, 0.5, &[]), task(2, 1.0, &[1])];
        let day0 = d(2026, 6, 1);
        run(&mut tasks, day0, CompletedDatePolicy::Preserve);

        assert_eq!(tasks[0].due_date, Some(d(2026, 6, 2)));
        assert_eq!(tasks[1].start_date, Some(d(2026, 6, 2)));
    }

    #[test]
    fn preserve_keeps_completed_dates_and_feeds_successors() {
        let mut done = done_task(1, 2.0, &[]);
        done.start_date = Some(d(2026, 2, 1));
        done.due_date = Some(d(2026, 2, 10)); // historical overrun
        let mut tasks = vec![done, task(2, 1.0, &[1])];

        run(&mut tasks, d(2026, 3, 1), CompletedDatePolicy::Preserve);

        assert_eq!(tasks[0].start_date, Some(d(2026, 2, 1)));
        assert_eq!(tasks[0].due_date, Some(d(2026, 2, 10)));
        // Successor starts from the preserved due date, not the baseline.
        assert_eq!(tasks[1].start_date, Some(d(2026, 2, 10)));
    }

    #[test]
    fn recompute_policy_moves_completed_tasks() {
        let mut done = done_task(1, 2.0, &[]);
        done.start_date = Some(d(2026, 2, 1));
        done.due_date = Some(d(2026, 2, 10));
        let mut tasks = vec![done];

        run(&mut tasks, d(2026, 3, 1), CompletedDatePolicy::Recompute);

        assert_eq!(tasks[0].start_date, Some(d(2026, 3, 1)));
        assert_eq!(tasks[0].due_date, Some(d(2026, 3, 3)));
    }

    #[test]
    fn absurd_duration_is_an_error_not_a_panic() {
        let mut tasks = vec![task(1, 1e18, &[])];
        let graph = TaskGraph::build(&tasks).unwrap();
        let order = topological_order(&graph).unwrap();

        let err = propagate(
            &mut tasks,
            &graph,
            &order,
            d(2026, 1, 1),
            CompletedDatePolicy::Preserve,
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::DateOverflow { task_id: 1 }));
    }

    #[test]
    fn done_task_without_dates_is_scheduled_normally() {
        // First-ever recalculation: nothing to preserve yet.
        let mut tasks = vec![done_task(1, 1.0, &[])];
        run(&mut tasks, d(2026, 4, 1), CompletedDatePolicy::Preserve);

        assert_eq!(tasks[0].start_date, Some(d(2026, 4, 1)));
        assert_eq!(tasks[0].due_date, Some(d(2026, 4, 2)));
    }
}
