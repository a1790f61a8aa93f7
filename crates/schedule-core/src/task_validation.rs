use crate::error::ScheduleError;
use crate::relation::Relation;
use crate::task::Task;
use std::collections::HashSet;

/// Longest duration, planned span or lag a single record may carry (100 years).
pub const MAX_SPAN_DAYS: i64 = 36_525;

pub fn validate_task(task: &Task) -> Result<(), ScheduleError> {
    if task.duration_days < 0 {
        return Err(ScheduleError::invalid_task(
            task.id,
            format!("negative duration {}", task.duration_days),
        ));
    }
    if task.duration_days > MAX_SPAN_DAYS {
        return Err(ScheduleError::invalid_task(
            task.id,
            format!(
                "duration {} exceeds the {MAX_SPAN_DAYS} day limit",
                task.duration_days
            ),
        ));
    }

    let pct = task.percent_complete;
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ScheduleError::invalid_task(
            task.id,
            format!("percent_complete {pct} must be between 0 and 100"),
        ));
    }

    if task.is_milestone && task.is_summary {
        return Err(ScheduleError::invalid_task(
            task.id,
            "a task cannot be both a milestone and a summary",
        ));
    }

    if task.is_milestone && task.duration_days != 0 {
        return Err(ScheduleError::invalid_task(
            task.id,
            format!("milestone has non-zero duration {}", task.duration_days),
        ));
    }

    if let (Some(start), Some(finish)) = (task.planned_start, task.planned_finish) {
        if finish < start {
            return Err(ScheduleError::invalid_task(
                task.id,
                format!("planned finish {finish} precedes planned start {start}"),
            ));
        }
        if (finish - start).num_days() > MAX_SPAN_DAYS {
            return Err(ScheduleError::invalid_task(
                task.id,
                format!("planned span {start}..{finish} exceeds the {MAX_SPAN_DAYS} day limit"),
            ));
        }
    }

    if task.constraint.kind.requires_date() && task.constraint.date.is_none() {
        return Err(ScheduleError::invalid_task(
            task.id,
            format!("constraint {} requires a date", task.constraint.kind),
        ));
    }

    if task.parent_id == Some(task.id) {
        return Err(ScheduleError::invalid_task(task.id, "task cannot be its own parent"));
    }

    Ok(())
}

/// Lags are reported against the successor, the task they shift.
pub fn validate_relation(relation: &Relation) -> Result<(), ScheduleError> {
    if relation.lag_days.unsigned_abs() > MAX_SPAN_DAYS.unsigned_abs() {
        return Err(ScheduleError::invalid_task(
            relation.successor_id,
            format!(
                "lag {} on relation {} -> {} exceeds the {MAX_SPAN_DAYS} day limit",
                relation.lag_days, relation.predecessor_id, relation.successor_id
            ),
        ));
    }
    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), ScheduleError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(ScheduleError::invalid_task(task.id, "duplicate task id"));
        }
        validate_task(task)?;
    }
    Ok(())
}
