//! Status Deriver: task status from completion state and computed dates.
//!
//! Runs after date propagation so the TODO/IN_PROGRESS split can use the
//! computed start date. Statuses are derived in topological order, so a
//! predecessor's status is always settled before its successors read it.

use super::graph::TaskGraph;
use crate::types::{Task, TaskStatus};
use chrono::NaiveDate;

/// Derive one task's status.
///
/// Pure function of the task's own `done` flag, its predecessors' completion,
/// its start date, and the reference date:
/// - done                      => COMPLETED
/// - any predecessor not done  => BLOCKED
/// - start <= today            => IN_PROGRESS
/// - otherwise (or no start)   => TODO
pub fn derive_status(
    done: bool,
    all_predecessors_completed: bool,
    start_date: Option<NaiveDate>,
    today: NaiveDate,
) -> TaskStatus {
    if done {
        TaskStatus::Completed
    } else if !all_predecessors_completed {
        TaskStatus::Blocked
    } else {
        match start_date {
            Some(start) if start <= today => TaskStatus::InProgress,
            _ => TaskStatus::Todo,
        }
    }
}

/// Assign every task its derived status, walking the topological order.
/// Only each task's own status is written; predecessor data is never mutated.
pub fn derive_all(tasks: &mut [Task], graph: &TaskGraph, order: &[usize], today: NaiveDate) {
    for &node in order {
        let all_completed = graph
            .preds_of(node)
            .iter()
            .all(|&p| tasks[graph.task_pos(p)].status == Some(TaskStatus::Completed));

        let pos = graph.task_pos(node);
        let task = &mut tasks[pos];
        task.status = Some(derive_status(
            task.done,
            all_completed,
            task.start_date,
            today,
        ));
    }
}
