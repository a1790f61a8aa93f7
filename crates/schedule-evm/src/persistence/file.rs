use super::{PersistenceError, PersistenceResult};
use crate::cost_item::CostItem;
use crate::snapshot::{EngineSettings, ProjectSnapshot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use site_schedule::relation::{format_predecessor_list, parse_predecessor_list};
use site_schedule::{
    ConstraintKind, Relation, ScheduleConstraint, ScheduleMetadata, Task, TaskPriority,
    TaskStatus, WorkCalendarConfig,
};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

const METADATA_ROW: &str = "__metadata__";

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    snapshot: &ProjectSnapshot,
    path: P,
) -> PersistenceResult<()> {
    super::validate_snapshot(snapshot)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<ProjectSnapshot> {
    let file = File::open(path)?;
    let snapshot: ProjectSnapshot = serde_json::from_reader(file)?;
    super::validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

/// One CSV row per task. The leading metadata row carries everything that is
/// not a task as JSON.
#[derive(Default, Serialize, Deserialize)]
struct TaskCsvRecord {
    id: i32,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    wbs_code: String,
    #[serde(default)]
    parent_id: String,
    #[serde(default)]
    is_milestone: String,
    #[serde(default)]
    is_summary: String,
    #[serde(default)]
    duration_days: i64,
    #[serde(default)]
    predecessors: String,
    #[serde(default)]
    planned_start: String,
    #[serde(default)]
    planned_finish: String,
    #[serde(default)]
    actual_start: String,
    #[serde(default)]
    actual_finish: String,
    #[serde(default)]
    percent_complete: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    priority: String,
    #[serde(default)]
    constraint: String,
    #[serde(default)]
    constraint_date: String,
    // Derived columns are written for spreadsheet readers and ignored on load.
    #[serde(default)]
    early_start: String,
    #[serde(default)]
    early_finish: String,
    #[serde(default)]
    late_start: String,
    #[serde(default)]
    late_finish: String,
    #[serde(default)]
    total_float: String,
    #[serde(default)]
    is_critical: String,
    #[serde(default)]
    metadata_json: String,
    #[serde(default)]
    calendar_json: String,
    #[serde(default)]
    settings_json: String,
    #[serde(default)]
    cost_items_json: String,
}

impl TaskCsvRecord {
    fn from_task(task: &Task, relations: &[Relation]) -> Self {
        let incoming: Vec<Relation> = relations
            .iter()
            .filter(|rel| rel.successor_id == task.id)
            .copied()
            .collect();
        TaskCsvRecord {
            id: task.id,
            name: task.name.clone(),
            description: task.description.clone().unwrap_or_default(),
            wbs_code: task.wbs_code.clone().unwrap_or_default(),
            parent_id: format_option(task.parent_id),
            is_milestone: task.is_milestone.to_string(),
            is_summary: task.is_summary.to_string(),
            duration_days: task.duration_days,
            predecessors: format_predecessor_list(&incoming),
            planned_start: format_date(task.planned_start),
            planned_finish: format_date(task.planned_finish),
            actual_start: format_date(task.actual_start),
            actual_finish: format_date(task.actual_finish),
            percent_complete: task.percent_complete.to_string(),
            status: task.status.as_str().to_string(),
            priority: task.priority.as_str().to_string(),
            constraint: task.constraint.kind.as_str().to_string(),
            constraint_date: format_date(task.constraint.date),
            early_start: format_date(task.early_start),
            early_finish: format_date(task.early_finish),
            late_start: format_date(task.late_start),
            late_finish: format_date(task.late_finish),
            total_float: format_option(task.total_float),
            is_critical: format_option(task.is_critical),
            ..TaskCsvRecord::default()
        }
    }

    fn metadata_row(snapshot: &ProjectSnapshot) -> PersistenceResult<Self> {
        let calendar_json = match &snapshot.calendar {
            Some(config) => serde_json::to_string(config)?,
            None => String::new(),
        };
        Ok(TaskCsvRecord {
            name: METADATA_ROW.to_string(),
            metadata_json: serde_json::to_string(&snapshot.metadata)?,
            calendar_json,
            settings_json: serde_json::to_string(&snapshot.settings)?,
            cost_items_json: serde_json::to_string(&snapshot.cost_items)?,
            ..TaskCsvRecord::default()
        })
    }

    fn is_metadata_row(&self) -> bool {
        !self.metadata_json.trim().is_empty()
    }

    fn into_task(self) -> PersistenceResult<(Task, Vec<Relation>)> {
        if self.is_metadata_row() {
            return Err(PersistenceError::InvalidData(
                "metadata row cannot be converted to task".into(),
            ));
        }
        let relations = parse_predecessor_list(self.id, &self.predecessors)
            .map_err(PersistenceError::InvalidData)?;

        let mut task = Task::new(self.id, self.name, self.duration_days);
        task.description = parse_string_option(self.description);
        task.wbs_code = parse_string_option(self.wbs_code);
        task.parent_id = parse_option::<i32>(&self.parent_id)?;
        task.is_milestone = parse_option::<bool>(&self.is_milestone)?.unwrap_or(false);
        task.is_summary = parse_option::<bool>(&self.is_summary)?.unwrap_or(false);
        task.planned_start = parse_date(&self.planned_start)?;
        task.planned_finish = parse_date(&self.planned_finish)?;
        task.actual_start = parse_date(&self.actual_start)?;
        task.actual_finish = parse_date(&self.actual_finish)?;
        task.percent_complete = parse_option::<f64>(&self.percent_complete)?.unwrap_or(0.0);
        task.status = parse_enum::<TaskStatus>(&self.status)?.unwrap_or_default();
        task.priority = parse_enum::<TaskPriority>(&self.priority)?.unwrap_or_default();
        task.constraint = ScheduleConstraint::new(
            parse_enum::<ConstraintKind>(&self.constraint)?.unwrap_or_default(),
            parse_date(&self.constraint_date)?,
        );
        Ok((task, relations))
    }
}

pub fn save_snapshot_to_csv<P: AsRef<Path>>(
    snapshot: &ProjectSnapshot,
    path: P,
) -> PersistenceResult<()> {
    super::validate_snapshot(snapshot)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(TaskCsvRecord::metadata_row(snapshot)?)?;
    for task in &snapshot.tasks {
        writer.serialize(TaskCsvRecord::from_task(task, &snapshot.relations))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_snapshot_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<ProjectSnapshot> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut snapshot: Option<ProjectSnapshot> = None;
    let mut tasks = Vec::new();
    let mut relations = Vec::new();

    for record in reader.deserialize::<TaskCsvRecord>() {
        let record = record?;
        if record.is_metadata_row() {
            if snapshot.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple metadata rows".into(),
                ));
            }
            snapshot = Some(snapshot_from_metadata_row(&record)?);
            continue;
        }
        let (task, incoming) = record.into_task()?;
        tasks.push(task);
        relations.extend(incoming);
    }

    let mut snapshot = snapshot.unwrap_or_default();
    snapshot.tasks = tasks;
    snapshot.relations = relations;
    super::validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

fn snapshot_from_metadata_row(record: &TaskCsvRecord) -> PersistenceResult<ProjectSnapshot> {
    let metadata: ScheduleMetadata = parse_json("metadata", &record.metadata_json)?
        .unwrap_or_default();
    let calendar: Option<WorkCalendarConfig> = parse_json("calendar", &record.calendar_json)?;
    let settings: EngineSettings =
        parse_json("settings", &record.settings_json)?.unwrap_or_default();
    let cost_items: Vec<CostItem> =
        parse_json("cost items", &record.cost_items_json)?.unwrap_or_default();
    Ok(ProjectSnapshot {
        metadata,
        calendar,
        settings,
        cost_items,
        ..ProjectSnapshot::default()
    })
}

fn parse_json<T: for<'de> Deserialize<'de>>(what: &str, input: &str) -> PersistenceResult<Option<T>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(input)
        .map(Some)
        .map_err(|err| PersistenceError::InvalidData(format!("invalid {what} json: {err}")))
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn format_option<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_option<T>(input: &str) -> PersistenceResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid value '{input}': {e}")))
}

fn parse_enum<T: FromStr<Err = String>>(input: &str) -> PersistenceResult<Option<T>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    T::from_str(input)
        .map(Some)
        .map_err(PersistenceError::InvalidData)
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
