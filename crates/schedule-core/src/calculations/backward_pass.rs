use super::{constraint_offset, is_scheduled_relation};
use crate::calendar::DayCounter;
use crate::error::GraphError;
use crate::graph::TaskGraph;
use crate::task::{ConstraintKind, TaskId};
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;

pub struct BackwardPass<'a> {
    graph: &'a TaskGraph,
    counter: &'a dyn DayCounter,
    origin: NaiveDate,
}

impl<'a> BackwardPass<'a> {
    pub fn new(graph: &'a TaskGraph, counter: &'a dyn DayCounter, origin: NaiveDate) -> Self {
        Self {
            graph,
            counter,
            origin,
        }
    }

    /// `(late_start, late_finish)` offsets for every non-summary task, walking
    /// `order` in reverse. No task may finish later than `project_finish`.
    pub fn execute(
        &self,
        order: &[TaskId],
        durations: &HashMap<TaskId, i64>,
        project_finish: i64,
    ) -> Result<HashMap<TaskId, (i64, i64)>, GraphError> {
        let mut late: HashMap<TaskId, (i64, i64)> = HashMap::new();

        for &task_id in order.iter().rev() {
            let task = self
                .graph
                .task(task_id)
                .ok_or(GraphError::UnknownTask(task_id))?;
            if task.is_summary {
                continue;
            }
            let duration = durations.get(&task_id).copied().unwrap_or(0);

            let mut finish = project_finish;
            for relation in self.graph.successors(task_id) {
                if !is_scheduled_relation(self.graph, &relation) {
                    continue;
                }
                let Some(&(succ_ls, succ_lf)) = late.get(&relation.successor_id) else {
                    continue;
                };
                let candidate = relation.relation_type.latest_predecessor_finish(
                    succ_ls,
                    succ_lf,
                    relation.lag_days,
                    duration,
                );
                finish = finish.min(candidate);
            }

            if let Some(limit) = constraint_offset(task, self.counter, self.origin) {
                match task.constraint.kind {
                    ConstraintKind::MustFinishOn | ConstraintKind::FinishNoLaterThan => {
                        finish = finish.min(limit)
                    }
                    ConstraintKind::MustStartOn | ConstraintKind::StartNoLaterThan => {
                        finish = finish.min(limit + duration)
                    }
                    ConstraintKind::None
                    | ConstraintKind::StartNoEarlierThan
                    | ConstraintKind::FinishNoEarlierThan
                    | ConstraintKind::AsSoonAsPossible
                    | ConstraintKind::AsLateAsPossible => {}
                }
            }

            late.insert(task_id, (finish - duration, finish));
        }

        debug!(
            "backward pass scheduled {} tasks against project finish offset {}",
            late.len(),
            project_finish
        );
        Ok(late)
    }
}
