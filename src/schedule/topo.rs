//! Cycle detection and topological ordering.
//!
//! Depth-first traversal with three-color marking: white (unvisited), gray
//! (on the current path), black (done). Meeting a gray node is a back-edge,
//! i.e. a cycle. Runs in O(V+E).

use super::graph::TaskGraph;
use crate::error::{ScheduleError, ScheduleResult};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Produce a topological order of the graph, as node indices.
///
/// The order is deterministic for a given task set, breaking ties between
/// unordered tasks by ascending task id (required for reproducible output).
/// Fails with [`ScheduleError::CyclicDependency`] naming a task on the cycle.
pub fn topological_order(graph: &TaskGraph) -> ScheduleResult<Vec<usize>> {
    let n = graph.len();
    let mut marks = vec![Mark::White; n];
    let mut postorder = Vec::with_capacity(n);
    // Explicit stack instead of recursion: dependency chains can be long.
    let mut stack: Vec<(usize, usize)> = Vec::new();

    // Roots and successors are taken highest-id-first; reversing the
    // postorder at the end then yields ascending ids wherever the edges
    // leave a choice.
    for root in (0..n).rev() {
        if marks[root] != Mark::White {
            continue;
        }
        marks[root] = Mark::Gray;
        stack.push((root, 0));

        while let Some(&mut (node, ref mut next)) = stack.last_mut() {
            let succs = graph.succs_of(node);
            if *next < succs.len() {
                let succ = succs[succs.len() - 1 - *next];
                *next += 1;
                match marks[succ] {
                    Mark::White => {
                        marks[succ] = Mark::Gray;
                        stack.push((succ, 0));
                    }
                    Mark::Gray => {
                        return Err(ScheduleError::CyclicDependency {
                            task_id: graph.task_id(succ),
                        });
                    }
                    Mark::Black => {}
                }
            } else {
                marks[node] = Mark::Black;
                postorder.push(node);
                stack.pop();
            }
        }
    }

    // Reverse postorder over successor edges puts every predecessor before
    // its successors.
    postorder.reverse();
    Ok(postorder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::testutil::task;

    fn order_of_ids(tasks: &[crate::types::Task]) -> ScheduleResult<Vec<i64>> {
        let graph = TaskGraph::build(tasks)?;
        let order = topological_order(&graph)?;
        Ok(order.into_iter().map(|n| graph.task_id(n)).collect())
    }

    #[test]
    fn chain_orders_predecessors_first() {
        let tasks = vec![task(3, 1.0, &[2]), task(2, 1.0, &[1]), task(1, 1.0, &[])];
        assert_eq!(order_of_ids(&tasks).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn diamond_respects_all_edges() {
        let tasks = vec![
            task(1, 1.0, &[]),
            task(2, 1.0, &[1]),
            task(3, 1.0, &[1]),
            task(4, 1.0, &[2, 3]),
        ];
        let ids = order_of_ids(&tasks).unwrap();
        let pos = |id: i64| ids.iter().position(|&x| x == id).unwrap();
        assert!(pos(1) < pos(2));
        assert!(pos(1) < pos(3));
        assert!(pos(2) < pos(4));
        assert!(pos(3) < pos(4));
    }

    #[test]
    fn independent_tasks_come_out_ascending() {
        let tasks = vec![task(5, 1.0, &[]), task(3, 1.0, &[]), task(9, 1.0, &[])];
        assert_eq!(order_of_ids(&tasks).unwrap(), vec![3, 5, 9]);
    }

    #[test]
    fn two_task_cycle_is_detected() {
        let tasks = vec![task(1, 1.0, &[2]), task(2, 1.0, &[1])];
        match order_of_ids(&tasks) {
            Err(ScheduleError::CyclicDependency { task_id }) => {
                assert!(task_id == 1 || task_id == 2);
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn cycle_behind_a_valid_prefix_is_detected() {
        // 1 -> 2, then 3 <-> 4
        let tasks = vec![
            task(1, 1.0, &[]),
            task(2, 1.0, &[1]),
            task(3, 1.0, &[4]),
            task(4, 1.0, &[3]),
        ];
        assert!(matches!(
            order_of_ids(&tasks),
            Err(ScheduleError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn order_is_deterministic_across_runs() {
        let tasks = vec![
            task(4, 1.0, &[1]),
            task(2, 1.0, &[]),
            task(1, 1.0, &[]),
            task(3, 1.0, &[2, 1]),
        ];
        let first = order_of_ids(&tasks).unwrap();
        for _ in 0..10 {
            assert_eq!(order_of_ids(&tasks).unwrap(), first);
        }
    }

    #[test]
    fn empty_graph_yields_empty_order() {
        assert_eq!(order_of_ids(&[]).unwrap(), Vec::<i64>::new());
    }
}
