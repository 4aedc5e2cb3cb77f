//! Graph Builder: a project's flat task list plus predecessor references,
//! as an in-memory directed graph.
//!
//! Nodes are an arena indexed by position; task ids map to node indices
//! through a side table, so the graph never holds object references and can
//! be built and tested independently of the entity store.

use crate::error::{ScheduleError, ScheduleResult};
use crate::types::{Task, TaskId};
use std::collections::HashMap;

/// Directed dependency graph over one project's tasks.
///
/// Edges run predecessor → successor. Node indices are ordered by ascending
/// task id, which makes every traversal that iterates nodes or adjacency
/// lists in index order deterministic.
#[derive(Debug)]
pub struct TaskGraph {
    /// Task ids, ascending. Node `n` is the task `ids[n]`.
    ids: Vec<TaskId>,
    /// Node index → position of the task in the input slice.
    positions: Vec<usize>,
    /// Incoming edges: predecessors of each node, ascending.
    preds: Vec<Vec<usize>>,
    /// Outgoing edges: successors of each node, ascending.
    succs: Vec<Vec<usize>>,
}

impl TaskGraph {
    /// Build the graph for a project's task set.
    ///
    /// Side-effect free. Fails with [`ScheduleError::UnknownPredecessor`] if a
    /// predecessor reference points outside the task set; a self-reference is
    /// reported as a cycle.
    pub fn build(tasks: &[Task]) -> ScheduleResult<Self> {
        let mut order: Vec<usize> = (0..tasks.len()).collect();
        order.sort_by_key(|&i| tasks[i].id);

        let ids: Vec<TaskId> = order.iter().map(|&i| tasks[i].id).collect();
        let positions = order;
        let index: HashMap<TaskId, usize> =
            ids.iter().enumerate().map(|(n, &id)| (id, n)).collect();

        let mut preds = vec![Vec::new(); ids.len()];
        let mut succs = vec![Vec::new(); ids.len()];

        for (node, &pos) in positions.iter().enumerate() {
            let task = &tasks[pos];
            for &pred_id in &task.predecessor_ids {
                if pred_id == task.id {
                    return Err(ScheduleError::CyclicDependency { task_id: task.id });
                }
                let pred_node =
                    *index
                        .get(&pred_id)
                        .ok_or(ScheduleError::UnknownPredecessor {
                            task_id: task.id,
                            predecessor_id: pred_id,
                        })?;
                preds[node].push(pred_node);
                succs[pred_node].push(node);
            }
        }

        for list in preds.iter_mut().chain(succs.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }

        Ok(Self {
            ids,
            positions,
            preds,
            succs,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Task id of a node.
    pub fn task_id(&self, node: usize) -> TaskId {
        self.ids[node]
    }

    /// Position of a node's task in the slice the graph was built from.
    pub fn task_pos(&self, node: usize) -> usize {
        self.positions[node]
    }

    pub fn preds_of(&self, node: usize) -> &[usize] {
        &self.preds[node]
    }

    pub fn succs_of(&self, node: usize) -> &[usize] {
        &self.succs[node]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::testutil::task;

    #[test]
    fn builds_diamond_graph() {
        // 1 -> {2, 3} -> 4
        let tasks = vec![
            task(1, 1.0, &[]),
            task(2, 1.0, &[1]),
            task(3, 1.0, &[1]),
            task(4, 1.0, &[2, 3]),
        ];
        let graph = TaskGraph::build(&tasks).unwrap();

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.preds_of(3), &[1, 2]);
        assert_eq!(graph.succs_of(0), &[1, 2]);
        assert_eq!(graph.task_id(0), 1);
    }

    #[test]
    fn nodes_sorted_by_id_regardless_of_input_order() {
        let tasks = vec![task(30, 1.0, &[]), task(10, 1.0, &[]), task(20, 1.0, &[10])];
        let graph = TaskGraph::build(&tasks).unwrap();

        assert_eq!(graph.task_id(0), 10);
        assert_eq!(graph.task_id(1), 20);
        assert_eq!(graph.task_id(2), 30);
        // Node 0 (task 10) is input position 1.
        assert_eq!(graph.task_pos(0), 1);
    }

    #[test]
    fn unknown_predecessor_is_rejected() {
        let tasks = vec![task(1, 1.0, &[]), task(2, 1.0, &[99])];
        match TaskGraph::build(&tasks) {
            Err(ScheduleError::UnknownPredecessor {
                task_id,
                predecessor_id,
            }) => {
                assert_eq!(task_id, 2);
                assert_eq!(predecessor_id, 99);
            }
            other => panic!("expected UnknownPredecessor, got {other:?}"),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let tasks = vec![task(1, 1.0, &[1])];
        match TaskGraph::build(&tasks) {
            Err(ScheduleError::CyclicDependency { task_id }) => assert_eq!(task_id, 1),
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_edges_are_collapsed() {
        let tasks = vec![task(1, 1.0, &[]), task(2, 1.0, &[1, 1])];
        let graph = TaskGraph::build(&tasks).unwrap();
        assert_eq!(graph.preds_of(1), &[0]);
        assert_eq!(graph.succs_of(0), &[1]);
    }
}
