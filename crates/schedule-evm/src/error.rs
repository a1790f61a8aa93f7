use crate::cost_item::CostItemId;
use crate::linker::LinkError;
use site_schedule::{CalendarError, GraphError, ScheduleError, TaskId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("cost item {0} does not exist")]
    UnknownCostItem(CostItemId),
    #[error("cost item {0} already exists")]
    DuplicateCostItem(CostItemId),
    #[error("invalid cost item {id}: {reason}")]
    InvalidCostItem { id: CostItemId, reason: String },
}

impl From<GraphError> for EngineError {
    fn from(err: GraphError) -> Self {
        EngineError::Schedule(ScheduleError::Graph(err))
    }
}

impl EngineError {
    pub fn unknown_task(task_id: TaskId) -> Self {
        GraphError::UnknownTask(task_id).into()
    }

    /// Errors caused by the request itself rather than by stored state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EngineError::Link(LinkError::AlreadyLinked { .. })
                | EngineError::DuplicateCostItem(_)
                | EngineError::Schedule(ScheduleError::Graph(
                    GraphError::Cycle { .. }
                        | GraphError::DuplicateTask(_)
                        | GraphError::HierarchyCycle { .. }
                        | GraphError::HierarchyConflict { .. }
                ))
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownCostItem(_)
                | EngineError::Link(LinkError::UnknownTask(_) | LinkError::UnknownCostItem(_))
                | EngineError::Schedule(ScheduleError::Graph(GraphError::UnknownTask(_)))
        )
    }
}
