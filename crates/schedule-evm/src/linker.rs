use crate::cost_item::{CostItem, CostItemId};
use log::debug;
use serde::{Deserialize, Serialize};
use site_schedule::{Task, TaskId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("task {0} does not exist")]
    UnknownTask(TaskId),
    #[error("cost item {0} does not exist")]
    UnknownCostItem(CostItemId),
    #[error("cost item {cost_item_id} is already linked to task {linked_task_id}")]
    AlreadyLinked {
        cost_item_id: CostItemId,
        linked_task_id: TaskId,
        requested_task_id: TaskId,
    },
}

/// What happens to a cost item's implied window when it is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Leave whatever window the item carries.
    #[default]
    Keep,
    /// Overwrite the window with the linked task's early dates.
    FollowTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    Linked,
    Unchanged,
}

/// Binds cost items to tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialLinker {
    policy: WindowPolicy,
}

impl FinancialLinker {
    pub fn new(policy: WindowPolicy) -> Self {
        Self { policy }
    }

    pub fn link(
        &self,
        items: &mut [CostItem],
        tasks: &[Task],
        cost_item_id: CostItemId,
        task_id: TaskId,
    ) -> Result<LinkChange, LinkError> {
        let task = tasks
            .iter()
            .find(|task| task.id == task_id)
            .ok_or(LinkError::UnknownTask(task_id))?;
        let item = items
            .iter_mut()
            .find(|item| item.id == cost_item_id)
            .ok_or(LinkError::UnknownCostItem(cost_item_id))?;

        match item.linked_task_id {
            Some(current) if current == task_id => return Ok(LinkChange::Unchanged),
            Some(current) => {
                return Err(LinkError::AlreadyLinked {
                    cost_item_id,
                    linked_task_id: current,
                    requested_task_id: task_id,
                });
            }
            None => {}
        }

        item.linked_task_id = Some(task_id);
        self.follow(item, task);
        debug!("linked cost item {cost_item_id} to task {task_id}");
        Ok(LinkChange::Linked)
    }

    /// Clear the link of a cost item, returning the task it pointed at.
    pub fn unlink(
        &self,
        items: &mut [CostItem],
        cost_item_id: CostItemId,
    ) -> Result<Option<TaskId>, LinkError> {
        let item = items
            .iter_mut()
            .find(|item| item.id == cost_item_id)
            .ok_or(LinkError::UnknownCostItem(cost_item_id))?;
        Ok(item.linked_task_id.take())
    }

    /// Every link must point at an existing task.
    pub fn validate_links(&self, items: &[CostItem], tasks: &[Task]) -> Result<(), LinkError> {
        for item in items {
            if let Some(task_id) = item.linked_task_id {
                if !tasks.iter().any(|task| task.id == task_id) {
                    return Err(LinkError::UnknownTask(task_id));
                }
            }
        }
        Ok(())
    }

    /// Re-derive implied windows from scheduled tasks.
    pub fn apply_window_policy(&self, items: &mut [CostItem], tasks: &[Task]) {
        if self.policy == WindowPolicy::Keep {
            return;
        }
        for item in items.iter_mut() {
            let Some(task_id) = item.linked_task_id else {
                continue;
            };
            if let Some(task) = tasks.iter().find(|task| task.id == task_id) {
                self.follow(item, task);
            }
        }
    }

    fn follow(&self, item: &mut CostItem, task: &Task) {
        if self.policy != WindowPolicy::FollowTask {
            return;
        }
        if let (Some(start), Some(finish)) = (task.early_start, task.early_finish) {
            item.window_start = Some(start);
            item.window_finish = Some(finish);
        }
    }
}
