use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TaskId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
    Late,
    Paused,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Late => "late",
            TaskStatus::Paused => "paused",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Work on the task can no longer slip the project.
    pub fn is_closed(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "not_started" => Ok(TaskStatus::NotStarted),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "late" => Ok(TaskStatus::Late),
            "paused" => Ok(TaskStatus::Paused),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("unknown task status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "critical" => Ok(TaskPriority::Critical),
            other => Err(format!("unknown task priority '{other}'")),
        }
    }
}

/// Date constraint placed on a task in addition to its precedence relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    #[default]
    None,
    MustStartOn,
    MustFinishOn,
    StartNoEarlierThan,
    StartNoLaterThan,
    FinishNoEarlierThan,
    FinishNoLaterThan,
    AsSoonAsPossible,
    AsLateAsPossible,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 9] = [
        ConstraintKind::None,
        ConstraintKind::MustStartOn,
        ConstraintKind::MustFinishOn,
        ConstraintKind::StartNoEarlierThan,
        ConstraintKind::StartNoLaterThan,
        ConstraintKind::FinishNoEarlierThan,
        ConstraintKind::FinishNoLaterThan,
        ConstraintKind::AsSoonAsPossible,
        ConstraintKind::AsLateAsPossible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::None => "none",
            ConstraintKind::MustStartOn => "must_start_on",
            ConstraintKind::MustFinishOn => "must_finish_on",
            ConstraintKind::StartNoEarlierThan => "start_no_earlier_than",
            ConstraintKind::StartNoLaterThan => "start_no_later_than",
            ConstraintKind::FinishNoEarlierThan => "finish_no_earlier_than",
            ConstraintKind::FinishNoLaterThan => "finish_no_later_than",
            ConstraintKind::AsSoonAsPossible => "as_soon_as_possible",
            ConstraintKind::AsLateAsPossible => "as_late_as_possible",
        }
    }

    pub fn requires_date(&self) -> bool {
        match self {
            ConstraintKind::MustStartOn
            | ConstraintKind::MustFinishOn
            | ConstraintKind::StartNoEarlierThan
            | ConstraintKind::StartNoLaterThan
            | ConstraintKind::FinishNoEarlierThan
            | ConstraintKind::FinishNoLaterThan => true,
            ConstraintKind::None
            | ConstraintKind::AsSoonAsPossible
            | ConstraintKind::AsLateAsPossible => false,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstraintKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim().to_ascii_lowercase();
        let short = match key.as_str() {
            "asap" => Some(ConstraintKind::AsSoonAsPossible),
            "alap" => Some(ConstraintKind::AsLateAsPossible),
            "mso" => Some(ConstraintKind::MustStartOn),
            "mfo" => Some(ConstraintKind::MustFinishOn),
            "snet" => Some(ConstraintKind::StartNoEarlierThan),
            "snlt" => Some(ConstraintKind::StartNoLaterThan),
            "fnet" => Some(ConstraintKind::FinishNoEarlierThan),
            "fnlt" => Some(ConstraintKind::FinishNoLaterThan),
            _ => None,
        };
        if let Some(kind) = short {
            return Ok(kind);
        }
        ConstraintKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == key)
            .ok_or_else(|| format!("unknown constraint '{key}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleConstraint {
    #[serde(default)]
    pub kind: ConstraintKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl ScheduleConstraint {
    pub fn new(kind: ConstraintKind, date: Option<NaiveDate>) -> Self {
        Self { kind, date }
    }
}

/// A hard constraint that the precedence network makes impossible to honour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub task_id: TaskId,
    pub constraint: ConstraintKind,
    pub constraint_date: NaiveDate,
    pub computed_date: NaiveDate,
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edge = match self.constraint {
            ConstraintKind::MustFinishOn | ConstraintKind::FinishNoLaterThan => "finish",
            _ => "start",
        };
        write!(
            f,
            "task {} {} {} conflicts with computed early {} {}",
            self.task_id, self.constraint, self.constraint_date, edge, self.computed_date
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wbs_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
    #[serde(default)]
    pub is_milestone: bool,
    #[serde(default)]
    pub is_summary: bool,
    #[serde(default)]
    pub duration_days: i64,
    #[serde(default)]
    pub planned_start: Option<NaiveDate>,
    #[serde(default)]
    pub planned_finish: Option<NaiveDate>,
    #[serde(default)]
    pub actual_start: Option<NaiveDate>,
    #[serde(default)]
    pub actual_finish: Option<NaiveDate>,
    #[serde(default)]
    pub percent_complete: f64,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub constraint: ScheduleConstraint,

    // Derived by the scheduler; any values supplied by callers are overwritten.
    #[serde(default)]
    pub early_start: Option<NaiveDate>,
    #[serde(default)]
    pub early_finish: Option<NaiveDate>,
    #[serde(default)]
    pub late_start: Option<NaiveDate>,
    #[serde(default)]
    pub late_finish: Option<NaiveDate>,
    #[serde(default)]
    pub scheduled_start: Option<NaiveDate>,
    #[serde(default)]
    pub scheduled_finish: Option<NaiveDate>,
    #[serde(default)]
    pub total_float: Option<i64>,
    #[serde(default)]
    pub is_critical: Option<bool>,
    #[serde(default)]
    pub is_financially_critical: Option<bool>,
    #[serde(default)]
    pub is_at_risk: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ConstraintViolation>,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            wbs_code: None,
            parent_id: None,
            is_milestone: false,
            is_summary: false,
            duration_days,
            planned_start: None,
            planned_finish: None,
            actual_start: None,
            actual_finish: None,
            percent_complete: 0.0,
            status: TaskStatus::NotStarted,
            priority: TaskPriority::Medium,
            constraint: ScheduleConstraint::default(),
            early_start: None,
            early_finish: None,
            late_start: None,
            late_finish: None,
            scheduled_start: None,
            scheduled_finish: None,
            total_float: None,
            is_critical: None,
            is_financially_critical: None,
            is_at_risk: None,
            warnings: Vec::new(),
        }
    }

    pub fn milestone(id: TaskId, name: impl Into<String>) -> Self {
        let mut task = Self::new(id, name, 0);
        task.is_milestone = true;
        task
    }

    pub fn summary(id: TaskId, name: impl Into<String>) -> Self {
        let mut task = Self::new(id, name, 0);
        task.is_summary = true;
        task
    }

    pub fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_wbs(mut self, wbs_code: impl Into<String>) -> Self {
        self.wbs_code = Some(wbs_code.into());
        self
    }

    pub fn with_constraint(mut self, kind: ConstraintKind, date: Option<NaiveDate>) -> Self {
        self.constraint = ScheduleConstraint::new(kind, date);
        self
    }

    pub fn with_percent_complete(mut self, percent: f64) -> Self {
        self.percent_complete = percent;
        self
    }

    pub fn with_planned_dates(mut self, start: NaiveDate, finish: NaiveDate) -> Self {
        self.planned_start = Some(start);
        self.planned_finish = Some(finish);
        self
    }

    /// Drop every scheduler-owned field so a stale snapshot cannot leak into a recompute.
    pub fn clear_derived(&mut self) {
        self.early_start = None;
        self.early_finish = None;
        self.late_start = None;
        self.late_finish = None;
        self.scheduled_start = None;
        self.scheduled_finish = None;
        self.total_float = None;
        self.is_critical = None;
        self.is_financially_critical = None;
        self.is_at_risk = None;
        self.warnings.clear();
    }
}
