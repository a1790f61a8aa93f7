use crate::task::TaskId;
use thiserror::Error;

fn format_cycle(cycle: &[TaskId]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Structural problems with the task network. Any of these aborts a recompute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("task {0} is not part of the schedule")]
    UnknownTask(TaskId),
    #[error("task {0} already exists")]
    DuplicateTask(TaskId),
    #[error("precedence cycle detected: {}", format_cycle(.cycle))]
    Cycle { cycle: Vec<TaskId> },
    #[error("task {task_id} cannot be placed under {parent_id}: it would become its own ancestor")]
    HierarchyCycle { task_id: TaskId, parent_id: TaskId },
    #[error(
        "relation {predecessor_id} -> {successor_id} links a task to its own ancestor or descendant"
    )]
    HierarchyConflict {
        predecessor_id: TaskId,
        successor_id: TaskId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("invalid task {task_id}: {reason}")]
    InvalidTask { task_id: TaskId, reason: String },
    #[error("invalid project metadata: {0}")]
    InvalidMetadata(String),
}

impl ScheduleError {
    pub(crate) fn invalid_task(task_id: TaskId, reason: impl Into<String>) -> Self {
        ScheduleError::InvalidTask {
            task_id,
            reason: reason.into(),
        }
    }

    pub(crate) fn date_out_of_range(task_id: TaskId, offset: i64) -> Self {
        Self::invalid_task(
            task_id,
            format!("scheduled offset {offset} falls outside the supported date range"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_lists_the_offending_sequence() {
        let err = GraphError::Cycle {
            cycle: vec![3, 1, 2, 3],
        };
        assert_eq!(err.to_string(), "precedence cycle detected: 3 -> 1 -> 2 -> 3");
    }
}
