use crate::cost_item::{CostItem, CostItemId};
use crate::evm::EvmMetrics;
use crate::linker::WindowPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use site_schedule::{
    CriticalPath, RefreshSummary, Relation, ScheduleMetadata, ScheduleWarning, Task, TaskId,
    WorkCalendarConfig,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub window_policy: WindowPolicy,
}

/// Everything the engine needs for one project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub metadata: ScheduleMetadata,
    /// Working-day calendar; calendar days when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<WorkCalendarConfig>,
    #[serde(default)]
    pub settings: EngineSettings,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub cost_items: Vec<CostItem>,
}

impl ProjectSnapshot {
    pub fn new(metadata: ScheduleMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }

    pub fn cost_item(&self, cost_item_id: CostItemId) -> Option<&CostItem> {
        self.cost_items.iter().find(|item| item.id == cost_item_id)
    }

    pub fn cost_item_mut(&mut self, cost_item_id: CostItemId) -> Option<&mut CostItem> {
        self.cost_items.iter_mut().find(|item| item.id == cost_item_id)
    }

    /// Insert a relation, replacing any existing edge for the same pair.
    pub fn upsert_relation(&mut self, relation: Relation) {
        match self.relations.iter_mut().find(|existing| {
            existing.predecessor_id == relation.predecessor_id
                && existing.successor_id == relation.successor_id
        }) {
            Some(existing) => *existing = relation,
            None => self.relations.push(relation),
        }
    }

    pub fn remove_relation(
        &mut self,
        predecessor_id: TaskId,
        successor_id: TaskId,
    ) -> Option<Relation> {
        let pos = self.relations.iter().position(|rel| {
            rel.predecessor_id == predecessor_id && rel.successor_id == successor_id
        })?;
        Some(self.relations.remove(pos))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecomputeOutput {
    /// The input snapshot with every derived field filled in.
    pub snapshot: ProjectSnapshot,
    /// Serialized as the plain id sequence.
    pub critical_path: CriticalPath,
    pub project_finish: NaiveDate,
    pub project_metrics: EvmMetrics,
    /// Metrics of the cost items linked to each task and its descendants.
    pub task_metrics: BTreeMap<TaskId, EvmMetrics>,
    pub warnings: Vec<ScheduleWarning>,
}

impl RecomputeOutput {
    /// Output of a project with no tasks or cost items.
    pub fn empty(snapshot: &ProjectSnapshot) -> Self {
        Self {
            snapshot: snapshot.clone(),
            critical_path: CriticalPath::default(),
            project_finish: snapshot
                .metadata
                .project_end_date
                .unwrap_or(snapshot.metadata.project_start_date),
            project_metrics: EvmMetrics::default(),
            task_metrics: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.snapshot.task(task_id)
    }

    pub fn cost_item(&self, cost_item_id: CostItemId) -> Option<&CostItem> {
        self.snapshot.cost_item(cost_item_id)
    }

    pub fn is_on_critical_path(&self, task_id: TaskId) -> bool {
        self.critical_path.is_on_critical_path(task_id)
    }

    pub fn summary(&self) -> RefreshSummary {
        let leaves = || self.snapshot.tasks.iter().filter(|task| !task.is_summary);
        RefreshSummary {
            task_count: self.snapshot.tasks.len(),
            critical_count: leaves().filter(|task| task.is_critical == Some(true)).count(),
            critical_path: self.critical_path.sequence().to_vec(),
            project_finish: self.project_finish,
            at_risk_count: leaves().filter(|task| task.is_at_risk == Some(true)).count(),
            warning_count: self.warnings.len(),
        }
    }
}
