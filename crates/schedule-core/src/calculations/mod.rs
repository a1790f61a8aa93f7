pub mod backward_pass;
pub mod forward_pass;
pub mod rollup;

use crate::calendar::DayCounter;
use crate::graph::TaskGraph;
use crate::relation::Relation;
use crate::task::{Task, TaskId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use backward_pass::BackwardPass;
pub use forward_pass::{ForwardPass, ForwardResult};
pub use rollup::{Rollup, SummaryRollup};

/// CPM dates of one task as counted-day offsets from the project start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskTiming {
    pub early_start: i64,
    pub early_finish: i64,
    pub late_start: i64,
    pub late_finish: i64,
}

impl TaskTiming {
    pub fn total_float(&self) -> i64 {
        self.late_start - self.early_start
    }

    pub fn span(&self) -> i64 {
        self.early_finish - self.early_start
    }
}

/// Duration the passes use for a task.
///
/// Milestones and summaries take no time. Planned dates win over the stored
/// duration when both are present.
pub fn effective_duration(task: &Task, counter: &dyn DayCounter) -> i64 {
    if task.is_milestone || task.is_summary {
        return 0;
    }
    match (task.planned_start, task.planned_finish) {
        (Some(start), Some(finish)) => counter.days_between(start, finish).max(0),
        _ => task.duration_days,
    }
}

pub fn effective_durations(graph: &TaskGraph, counter: &dyn DayCounter) -> HashMap<TaskId, i64> {
    graph
        .tasks()
        .iter()
        .map(|task| (task.id, effective_duration(task, counter)))
        .collect()
}

/// Relations touching a summary task stay in the graph but never drive dates.
pub fn is_scheduled_relation(graph: &TaskGraph, relation: &Relation) -> bool {
    let is_summary = |id| graph.task(id).is_some_and(|task| task.is_summary);
    !is_summary(relation.predecessor_id) && !is_summary(relation.successor_id)
}

pub(crate) fn constraint_offset(
    task: &Task,
    counter: &dyn DayCounter,
    origin: NaiveDate,
) -> Option<i64> {
    task.constraint
        .date
        .map(|date| counter.offset_of(origin, date))
}
