use super::{constraint_offset, is_scheduled_relation};
use crate::calendar::DayCounter;
use crate::error::{GraphError, ScheduleError};
use crate::graph::TaskGraph;
use crate::task::{ConstraintKind, ConstraintViolation, TaskId};
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ForwardResult {
    /// `(early_start, early_finish)` offsets for every non-summary task.
    pub early: HashMap<TaskId, (i64, i64)>,
    pub violations: Vec<ConstraintViolation>,
}

impl ForwardResult {
    /// Latest early finish, or 0 for an empty network.
    pub fn latest_finish(&self) -> i64 {
        self.early.values().map(|(_, ef)| *ef).max().unwrap_or(0)
    }
}

pub struct ForwardPass<'a> {
    graph: &'a TaskGraph,
    counter: &'a dyn DayCounter,
    origin: NaiveDate,
}

impl<'a> ForwardPass<'a> {
    pub fn new(graph: &'a TaskGraph, counter: &'a dyn DayCounter, origin: NaiveDate) -> Self {
        Self {
            graph,
            counter,
            origin,
        }
    }

    pub fn execute(
        &self,
        order: &[TaskId],
        durations: &HashMap<TaskId, i64>,
    ) -> Result<ForwardResult, ScheduleError> {
        let mut result = ForwardResult::default();

        for &task_id in order {
            let task = self
                .graph
                .task(task_id)
                .ok_or(GraphError::UnknownTask(task_id))?;
            if task.is_summary {
                continue;
            }
            let duration = durations.get(&task_id).copied().unwrap_or(0);

            let mut start = 0i64;
            for relation in self.graph.predecessors(task_id) {
                if !is_scheduled_relation(self.graph, &relation) {
                    continue;
                }
                let Some(&(pred_es, pred_ef)) = result.early.get(&relation.predecessor_id) else {
                    continue;
                };
                let candidate = relation.relation_type.earliest_successor_start(
                    pred_es,
                    pred_ef,
                    relation.lag_days,
                    duration,
                );
                start = start.max(candidate);
            }

            if let Some(limit) = constraint_offset(task, self.counter, self.origin) {
                let kind = task.constraint.kind;
                let mut conflict = None;
                match kind {
                    ConstraintKind::MustStartOn => {
                        if start > limit {
                            conflict = Some(start);
                        } else {
                            start = limit;
                        }
                    }
                    ConstraintKind::StartNoEarlierThan => start = start.max(limit),
                    ConstraintKind::FinishNoEarlierThan => start = start.max(limit - duration),
                    ConstraintKind::StartNoLaterThan => {
                        if start > limit {
                            conflict = Some(start);
                        }
                    }
                    ConstraintKind::MustFinishOn | ConstraintKind::FinishNoLaterThan => {
                        let finish = start + duration;
                        if finish > limit {
                            conflict = Some(finish);
                        }
                    }
                    ConstraintKind::None
                    | ConstraintKind::AsSoonAsPossible
                    | ConstraintKind::AsLateAsPossible => {}
                }
                if let Some(computed) = conflict {
                    let violation = self.violation(task_id, kind, limit, computed)?;
                    result.violations.push(violation);
                }
            }

            result.early.insert(task_id, (start, start + duration));
        }

        debug!(
            "forward pass scheduled {} tasks, latest early finish at offset {}",
            result.early.len(),
            result.latest_finish()
        );
        Ok(result)
    }

    fn violation(
        &self,
        task_id: TaskId,
        constraint: ConstraintKind,
        limit: i64,
        computed: i64,
    ) -> Result<ConstraintViolation, ScheduleError> {
        let date_at = |offset| {
            self.counter
                .date_at(self.origin, offset)
                .ok_or_else(|| ScheduleError::date_out_of_range(task_id, offset))
        };
        Ok(ConstraintViolation {
            task_id,
            constraint,
            constraint_date: date_at(limit)?,
            computed_date: date_at(computed)?,
        })
    }
}
