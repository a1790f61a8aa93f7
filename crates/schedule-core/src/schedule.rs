use crate::calculations::{
    BackwardPass, ForwardPass, Rollup, TaskTiming, effective_durations, is_scheduled_relation,
};
use crate::calendar::{CalendarDays, DayCounter};
use crate::critical_path::CriticalPath;
use crate::error::ScheduleError;
use crate::graph::TaskGraph;
use crate::metadata::ScheduleMetadata;
use crate::relation::Relation;
use crate::task::{ConstraintKind, ConstraintViolation, Task, TaskId};
use crate::task_validation;
use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Non-fatal findings of a refresh. The schedule is still complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleWarning {
    InvalidConstraint(ConstraintViolation),
    SummaryRelationIgnored {
        predecessor_id: TaskId,
        successor_id: TaskId,
    },
    EmptySummary {
        task_id: TaskId,
    },
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleWarning::InvalidConstraint(violation) => write!(f, "{violation}"),
            ScheduleWarning::SummaryRelationIgnored {
                predecessor_id,
                successor_id,
            } => write!(
                f,
                "relation {predecessor_id} -> {successor_id} touches a summary task and was ignored"
            ),
            ScheduleWarning::EmptySummary { task_id } => {
                write!(f, "summary task {task_id} has no children")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub task_count: usize,
    pub critical_count: usize,
    pub critical_path: Vec<TaskId>,
    pub project_finish: NaiveDate,
    pub at_risk_count: usize,
    pub warning_count: usize,
}

impl RefreshSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("critical={}", self.critical_count));
        parts.push(format!("finish={}", self.project_finish));
        if self.at_risk_count > 0 {
            parts.push(format!("at_risk={}", self.at_risk_count));
        }
        if self.warning_count > 0 {
            parts.push(format!("warnings={}", self.warning_count));
        }
        if !self.critical_path.is_empty() {
            let chain = self
                .critical_path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("->");
            parts.push(format!("crit_path={}", chain));
        }
        parts.join(", ")
    }
}

/// Everything a refresh derives. Input records are never modified; `tasks`
/// holds copies with the derived fields filled in.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub tasks: Vec<Task>,
    pub timings: BTreeMap<TaskId, TaskTiming>,
    pub critical_path: CriticalPath,
    pub project_finish: NaiveDate,
    pub project_finish_offset: i64,
    pub warnings: Vec<ScheduleWarning>,
}

impl ScheduleOutcome {
    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn critical_path(&self) -> &[TaskId] {
        self.critical_path.sequence()
    }

    pub fn is_on_critical_path(&self, task_id: TaskId) -> bool {
        self.critical_path.is_on_critical_path(task_id)
    }

    pub fn summary(&self) -> RefreshSummary {
        RefreshSummary {
            task_count: self.tasks.len(),
            critical_count: self
                .tasks
                .iter()
                .filter(|task| !task.is_summary && task.is_critical == Some(true))
                .count(),
            critical_path: self.critical_path().to_vec(),
            project_finish: self.project_finish,
            at_risk_count: self
                .tasks
                .iter()
                .filter(|task| !task.is_summary && task.is_at_risk == Some(true))
                .count(),
            warning_count: self.warnings.len(),
        }
    }
}

#[derive(Default)]
struct SummaryFlags {
    critical: HashSet<TaskId>,
    financially_critical: HashSet<TaskId>,
    at_risk: HashSet<TaskId>,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    metadata: ScheduleMetadata,
    counter: Arc<dyn DayCounter>,
    graph: TaskGraph,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(ScheduleMetadata::default())
    }
}

impl Schedule {
    pub fn new(metadata: ScheduleMetadata) -> Self {
        Self::with_day_counter(metadata, Arc::new(CalendarDays))
    }

    pub fn with_day_counter(metadata: ScheduleMetadata, counter: Arc<dyn DayCounter>) -> Self {
        Self {
            metadata,
            counter,
            graph: TaskGraph::new(),
        }
    }

    pub fn from_parts(
        metadata: ScheduleMetadata,
        counter: Arc<dyn DayCounter>,
        tasks: Vec<Task>,
        relations: &[Relation],
    ) -> Result<Self, ScheduleError> {
        metadata.validate()?;
        task_validation::validate_task_collection(&tasks)?;
        for relation in relations {
            task_validation::validate_relation(relation)?;
        }
        let graph = TaskGraph::from_parts(tasks, relations)?;
        Ok(Self {
            metadata,
            counter,
            graph,
        })
    }

    pub fn metadata(&self) -> &ScheduleMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: ScheduleMetadata) -> Result<(), ScheduleError> {
        metadata.validate()?;
        self.metadata = metadata;
        Ok(())
    }

    pub fn day_counter(&self) -> &dyn DayCounter {
        self.counter.as_ref()
    }

    pub fn set_day_counter(&mut self, counter: Arc<dyn DayCounter>) {
        self.counter = counter;
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn tasks(&self) -> &[Task] {
        self.graph.tasks()
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.graph.task(task_id)
    }

    pub fn relations(&self) -> Vec<Relation> {
        self.graph.relations()
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), ScheduleError> {
        task_validation::validate_task(&task)?;
        self.graph.add_task(task)?;
        Ok(())
    }

    pub fn update_task(&mut self, task: Task) -> Result<Task, ScheduleError> {
        task_validation::validate_task(&task)?;
        Ok(self.graph.replace_task(task)?)
    }

    pub fn add_relation(&mut self, relation: Relation) -> Result<(), ScheduleError> {
        task_validation::validate_relation(&relation)?;
        self.graph.add_relation(relation)?;
        Ok(())
    }

    pub fn remove_relation(
        &mut self,
        predecessor_id: TaskId,
        successor_id: TaskId,
    ) -> Result<Option<Relation>, ScheduleError> {
        Ok(self.graph.remove_edge(predecessor_id, successor_id)?)
    }

    pub fn set_parent(
        &mut self,
        task_id: TaskId,
        parent_id: Option<TaskId>,
    ) -> Result<(), ScheduleError> {
        self.graph.set_parent(task_id, parent_id)?;
        Ok(())
    }

    /// Run both CPM passes, roll up summaries and resolve the critical path.
    pub fn refresh(&self) -> Result<ScheduleOutcome, ScheduleError> {
        self.metadata.validate()?;
        self.graph.validate_hierarchy()?;
        task_validation::validate_task_collection(self.graph.tasks())?;

        let origin = self.metadata.project_start_date;
        let counter = self.counter.as_ref();
        let order = self.graph.topological_order()?;
        let durations = effective_durations(&self.graph, counter);

        let mut warnings = Vec::new();
        let mut linked: HashSet<TaskId> = HashSet::new();
        let mut has_predecessor: HashSet<TaskId> = HashSet::new();
        for relation in self.graph.relations() {
            task_validation::validate_relation(&relation)?;
            if is_scheduled_relation(&self.graph, &relation) {
                linked.insert(relation.predecessor_id);
                linked.insert(relation.successor_id);
                has_predecessor.insert(relation.successor_id);
            } else {
                warn!(
                    "ignoring relation {} -> {}: summary tasks are not scheduled",
                    relation.predecessor_id, relation.successor_id
                );
                warnings.push(ScheduleWarning::SummaryRelationIgnored {
                    predecessor_id: relation.predecessor_id,
                    successor_id: relation.successor_id,
                });
            }
        }

        let forward = ForwardPass::new(&self.graph, counter, origin).execute(&order, &durations)?;
        let project_finish = match self.metadata.project_end_date {
            Some(end) => counter.offset_of(origin, end),
            None => forward.latest_finish(),
        };
        let late = BackwardPass::new(&self.graph, counter, origin).execute(
            &order,
            &durations,
            project_finish,
        )?;

        let mut timings: HashMap<TaskId, TaskTiming> = forward
            .early
            .iter()
            .filter_map(|(task_id, &(early_start, early_finish))| {
                let &(late_start, late_finish) = late.get(task_id)?;
                Some((
                    *task_id,
                    TaskTiming {
                        early_start,
                        early_finish,
                        late_start,
                        late_finish,
                    },
                ))
            })
            .collect();

        let critical: HashSet<TaskId> = timings
            .iter()
            .filter(|(task_id, timing)| timing.total_float() <= 0 && linked.contains(task_id))
            .map(|(task_id, _)| *task_id)
            .collect();
        let critical_path =
            CriticalPath::resolve(&self.graph, &order, &timings, &durations, &critical);

        let mut violations: HashMap<TaskId, Vec<ConstraintViolation>> = HashMap::new();
        for violation in forward.violations {
            warn!("constraint conflict: {violation}");
            warnings.push(ScheduleWarning::InvalidConstraint(violation.clone()));
            violations.entry(violation.task_id).or_default().push(violation);
        }

        let as_of = self
            .metadata
            .as_of_date
            .map(|date| counter.offset_of(origin, date));
        let mut tasks: Vec<Task> = self.graph.tasks().to_vec();
        let mut summary_flags = SummaryFlags::default();

        for task in tasks.iter_mut().filter(|task| !task.is_summary) {
            task.clear_derived();
            let Some(timing) = timings.get(&task.id).copied() else {
                continue;
            };
            let float = timing.total_float();
            task.warnings = violations.remove(&task.id).unwrap_or_default();

            let is_critical = critical.contains(&task.id);
            let is_financially_critical = float == 0 && has_predecessor.contains(&task.id);
            let past_late_finish = as_of.is_some_and(|as_of| {
                as_of > timing.late_finish
                    && task.percent_complete < 100.0
                    && !task.status.is_closed()
            });
            let is_at_risk = past_late_finish || !task.warnings.is_empty();

            let ancestors = self.graph.ancestors_of(task.id);
            if is_critical {
                summary_flags.critical.extend(&ancestors);
            }
            if is_financially_critical {
                summary_flags.financially_critical.extend(&ancestors);
            }
            if is_at_risk {
                summary_flags.at_risk.extend(&ancestors);
            }

            let (scheduled_start, scheduled_finish) =
                if task.constraint.kind == ConstraintKind::AsLateAsPossible {
                    (timing.late_start, timing.late_finish)
                } else {
                    (timing.early_start, timing.early_finish)
                };
            self.apply_dates(task, &timing, scheduled_start, scheduled_finish)?;
            task.total_float = Some(float);
            task.is_critical = Some(is_critical);
            task.is_financially_critical = Some(is_financially_critical);
            task.is_at_risk = Some(is_at_risk);
        }

        let rollups = Rollup::new(&self.graph).execute(&timings);
        for task in tasks.iter_mut().filter(|task| task.is_summary) {
            task.clear_derived();
            let Some(rollup) = rollups.get(&task.id) else {
                continue;
            };
            if rollup.is_empty {
                warnings.push(ScheduleWarning::EmptySummary { task_id: task.id });
            }
            let timing = rollup.timing;
            timings.insert(task.id, timing);
            self.apply_dates(task, &timing, timing.early_start, timing.early_finish)?;
            task.percent_complete = rollup.percent_complete;
            task.total_float = Some(timing.total_float());
            task.is_critical = Some(summary_flags.critical.contains(&task.id));
            task.is_financially_critical =
                Some(summary_flags.financially_critical.contains(&task.id));
            task.is_at_risk = Some(summary_flags.at_risk.contains(&task.id));
        }

        debug!(
            "refreshed {} tasks: {} critical, finish offset {}, {} warnings",
            tasks.len(),
            critical.len(),
            project_finish,
            warnings.len()
        );

        let project_finish_date = counter.date_at(origin, project_finish).ok_or_else(|| {
            ScheduleError::InvalidMetadata(format!(
                "project finish offset {project_finish} falls outside the supported date range"
            ))
        })?;

        Ok(ScheduleOutcome {
            tasks,
            timings: timings.into_iter().collect(),
            critical_path,
            project_finish: project_finish_date,
            project_finish_offset: project_finish,
            warnings,
        })
    }

    fn apply_dates(
        &self,
        task: &mut Task,
        timing: &TaskTiming,
        scheduled_start: i64,
        scheduled_finish: i64,
    ) -> Result<(), ScheduleError> {
        let origin = self.metadata.project_start_date;
        let task_id = task.id;
        let at = |offset| {
            self.counter
                .date_at(origin, offset)
                .map(Some)
                .ok_or_else(|| ScheduleError::date_out_of_range(task_id, offset))
        };
        task.early_start = at(timing.early_start)?;
        task.early_finish = at(timing.early_finish)?;
        task.late_start = at(timing.late_start)?;
        task.late_finish = at(timing.late_finish)?;
        task.scheduled_start = at(scheduled_start)?;
        task.scheduled_finish = at(scheduled_finish)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelationType;

    #[test]
    fn empty_schedule_finishes_on_project_start() {
        let schedule = Schedule::default();
        let outcome = schedule.refresh().unwrap();
        assert!(outcome.tasks.is_empty());
        assert_eq!(outcome.project_finish, schedule.metadata().project_start_date);
        assert!(outcome.critical_path().is_empty());
    }

    #[test]
    fn refresh_does_not_touch_stored_tasks() {
        let mut schedule = Schedule::default();
        schedule.add_task(Task::new(1, "Excavate", 3)).unwrap();
        schedule.add_task(Task::new(2, "Footings", 2)).unwrap();
        schedule
            .add_relation(Relation::new(1, 2, RelationType::FinishToStart, 0))
            .unwrap();
        let outcome = schedule.refresh().unwrap();
        assert_eq!(outcome.task(2).unwrap().total_float, Some(0));
        assert_eq!(schedule.task(2).unwrap().total_float, None);
    }

    #[test]
    fn summary_line_lists_the_chain() {
        let summary = RefreshSummary {
            task_count: 3,
            critical_count: 2,
            critical_path: vec![1, 3],
            project_finish: NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
            at_risk_count: 0,
            warning_count: 1,
        };
        assert_eq!(
            summary.to_cli_summary(),
            "tasks=3, critical=2, finish=2025-01-12, warnings=1, crit_path=1->3"
        );
    }
}
