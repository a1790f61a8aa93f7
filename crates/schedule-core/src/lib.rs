pub mod calculations;
pub mod calendar;
pub mod critical_path;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod relation;
pub mod schedule;
pub mod task;
pub mod task_validation;

pub use calculations::TaskTiming;
pub use calendar::{
    CalendarDays, CalendarError, DayCounter, WorkCalendar, WorkCalendarConfig, day_counter_for,
};
pub use critical_path::{CriticalPath, WbsKey};
pub use error::{GraphError, ScheduleError};
pub use graph::TaskGraph;
pub use metadata::ScheduleMetadata;
pub use relation::{Relation, RelationType};
pub use schedule::{RefreshSummary, Schedule, ScheduleOutcome, ScheduleWarning};
pub use task::{
    ConstraintKind, ConstraintViolation, ScheduleConstraint, Task, TaskId, TaskPriority,
    TaskStatus,
};
