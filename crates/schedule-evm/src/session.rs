use crate::cost_item::{CostItem, CostItemId};
use crate::engine::recompute;
use crate::error::EngineError;
use crate::linker::{FinancialLinker, LinkChange, WindowPolicy};
use crate::snapshot::{ProjectSnapshot, RecomputeOutput};
use log::info;
use site_schedule::{GraphError, Relation, ScheduleMetadata, Task, TaskId, WorkCalendarConfig};

/// A mutable project for interactive surfaces.
///
/// Every mutation is applied to a copy of the input snapshot and only kept
/// when the recompute that follows succeeds, so a rejected edit leaves both
/// the inputs and the last output untouched.
#[derive(Debug, Clone)]
pub struct ProjectSession {
    snapshot: ProjectSnapshot,
    output: RecomputeOutput,
}

impl ProjectSession {
    pub fn new(snapshot: ProjectSnapshot) -> Result<Self, EngineError> {
        let output = recompute(&snapshot)?;
        Ok(Self { snapshot, output })
    }

    /// Caller-supplied inputs; derived fields may be stale here.
    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }

    pub fn output(&self) -> &RecomputeOutput {
        &self.output
    }

    pub fn into_snapshot(self) -> ProjectSnapshot {
        self.snapshot
    }

    pub fn next_task_id(&self) -> TaskId {
        self.snapshot.tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1
    }

    pub fn next_cost_item_id(&self) -> CostItemId {
        self.snapshot
            .cost_items
            .iter()
            .map(|item| item.id)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn apply<T, F>(&mut self, change: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut ProjectSnapshot) -> Result<T, EngineError>,
    {
        let mut candidate = self.snapshot.clone();
        let value = change(&mut candidate)?;
        let output = recompute(&candidate)?;
        self.snapshot = candidate;
        self.output = output;
        Ok(value)
    }

    pub fn refresh(&mut self) -> Result<&RecomputeOutput, EngineError> {
        self.output = recompute(&self.snapshot)?;
        Ok(&self.output)
    }

    pub fn replace_snapshot(&mut self, snapshot: ProjectSnapshot) -> Result<(), EngineError> {
        let output = recompute(&snapshot)?;
        info!(
            "loaded project '{}' with {} tasks and {} cost items",
            snapshot.metadata.project_name,
            snapshot.tasks.len(),
            snapshot.cost_items.len()
        );
        self.snapshot = snapshot;
        self.output = output;
        Ok(())
    }

    pub fn set_metadata(&mut self, metadata: ScheduleMetadata) -> Result<(), EngineError> {
        self.apply(|snapshot| {
            snapshot.metadata = metadata;
            Ok(())
        })
    }

    pub fn set_calendar(
        &mut self,
        calendar: Option<WorkCalendarConfig>,
    ) -> Result<(), EngineError> {
        self.apply(|snapshot| {
            snapshot.calendar = calendar;
            Ok(())
        })
    }

    pub fn set_window_policy(&mut self, policy: WindowPolicy) -> Result<(), EngineError> {
        self.apply(|snapshot| {
            snapshot.settings.window_policy = policy;
            Ok(())
        })
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), EngineError> {
        let task_id = task.id;
        self.apply(|snapshot| {
            if snapshot.task(task.id).is_some() {
                return Err(GraphError::DuplicateTask(task.id).into());
            }
            snapshot.tasks.push(task);
            Ok(())
        })?;
        info!("added task {task_id}");
        Ok(())
    }

    /// Replace the stored record of a task. Relations and links are kept.
    pub fn update_task(&mut self, task: Task) -> Result<(), EngineError> {
        self.apply(|snapshot| {
            let slot = snapshot
                .task_mut(task.id)
                .ok_or_else(|| EngineError::unknown_task(task.id))?;
            *slot = task;
            Ok(())
        })
    }

    /// Remove a task with its relations. Linked cost items become unlinked
    /// and children move up to the removed task's parent.
    pub fn delete_task(&mut self, task_id: TaskId) -> Result<Task, EngineError> {
        let removed = self.apply(|snapshot| {
            let pos = snapshot
                .tasks
                .iter()
                .position(|task| task.id == task_id)
                .ok_or_else(|| EngineError::unknown_task(task_id))?;
            let removed = snapshot.tasks.remove(pos);
            snapshot
                .relations
                .retain(|rel| rel.predecessor_id != task_id && rel.successor_id != task_id);
            for item in snapshot.cost_items.iter_mut() {
                if item.linked_task_id == Some(task_id) {
                    item.linked_task_id = None;
                }
            }
            for task in snapshot.tasks.iter_mut() {
                if task.parent_id == Some(task_id) {
                    task.parent_id = removed.parent_id;
                }
            }
            Ok(removed)
        })?;
        info!("deleted task {task_id}");
        Ok(removed)
    }

    /// Add a precedence relation or replace the type and lag of an existing pair.
    pub fn add_relation(&mut self, relation: Relation) -> Result<(), EngineError> {
        self.apply(|snapshot| {
            snapshot.upsert_relation(relation);
            Ok(())
        })?;
        info!("added relation {}", relation.notation());
        Ok(())
    }

    pub fn remove_relation(
        &mut self,
        predecessor_id: TaskId,
        successor_id: TaskId,
    ) -> Result<Option<Relation>, EngineError> {
        self.apply(|snapshot| {
            for task_id in [predecessor_id, successor_id] {
                if snapshot.task(task_id).is_none() {
                    return Err(EngineError::unknown_task(task_id));
                }
            }
            Ok(snapshot.remove_relation(predecessor_id, successor_id))
        })
    }

    pub fn set_parent(
        &mut self,
        task_id: TaskId,
        parent_id: Option<TaskId>,
    ) -> Result<(), EngineError> {
        self.apply(|snapshot| {
            if let Some(parent_id) = parent_id {
                if snapshot.task(parent_id).is_none() {
                    return Err(EngineError::unknown_task(parent_id));
                }
            }
            let task = snapshot
                .task_mut(task_id)
                .ok_or_else(|| EngineError::unknown_task(task_id))?;
            task.parent_id = parent_id;
            Ok(())
        })
    }

    pub fn add_cost_item(&mut self, item: CostItem) -> Result<(), EngineError> {
        let item_id = item.id;
        self.apply(|snapshot| {
            if snapshot.cost_item(item.id).is_some() {
                return Err(EngineError::DuplicateCostItem(item.id));
            }
            snapshot.cost_items.push(item);
            Ok(())
        })?;
        info!("added cost item {item_id}");
        Ok(())
    }

    /// Replace a cost item's figures. The link is only changed through
    /// [`ProjectSession::link`] and [`ProjectSession::unlink`].
    pub fn update_cost_item(&mut self, mut item: CostItem) -> Result<(), EngineError> {
        self.apply(|snapshot| {
            let slot = snapshot
                .cost_item_mut(item.id)
                .ok_or(EngineError::UnknownCostItem(item.id))?;
            item.linked_task_id = slot.linked_task_id;
            *slot = item;
            Ok(())
        })
    }

    pub fn delete_cost_item(&mut self, cost_item_id: CostItemId) -> Result<CostItem, EngineError> {
        self.apply(|snapshot| {
            let pos = snapshot
                .cost_items
                .iter()
                .position(|item| item.id == cost_item_id)
                .ok_or(EngineError::UnknownCostItem(cost_item_id))?;
            Ok(snapshot.cost_items.remove(pos))
        })
    }

    pub fn link(
        &mut self,
        cost_item_id: CostItemId,
        task_id: TaskId,
    ) -> Result<LinkChange, EngineError> {
        let scheduled = self.output.snapshot.tasks.clone();
        let change = self.apply(|snapshot| {
            let linker = FinancialLinker::new(snapshot.settings.window_policy);
            Ok(linker.link(&mut snapshot.cost_items, &scheduled, cost_item_id, task_id)?)
        })?;
        if change == LinkChange::Linked {
            info!("linked cost item {cost_item_id} to task {task_id}");
        }
        Ok(change)
    }

    pub fn unlink(&mut self, cost_item_id: CostItemId) -> Result<Option<TaskId>, EngineError> {
        let previous = self.apply(|snapshot| {
            let linker = FinancialLinker::new(snapshot.settings.window_policy);
            Ok(linker.unlink(&mut snapshot.cost_items, cost_item_id)?)
        })?;
        if let Some(task_id) = previous {
            info!("unlinked cost item {cost_item_id} from task {task_id}");
        }
        Ok(previous)
    }
}

impl Default for ProjectSession {
    fn default() -> Self {
        let snapshot = ProjectSnapshot::default();
        let output = RecomputeOutput::empty(&snapshot);
        Self { snapshot, output }
    }
}
