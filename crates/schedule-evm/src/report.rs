//! Tabular views of a recompute for reporting collaborators.

use crate::cost_item::CostItem;
use crate::evm::{EvmMetrics, round_money};
use crate::snapshot::RecomputeOutput;
use chrono::{Datelike, Duration, NaiveDate};
use polars::prelude::*;
use site_schedule::TaskId;
use std::collections::BTreeMap;

const DATE_COLUMNS: [&str; 6] = [
    "early_start",
    "early_finish",
    "late_start",
    "late_finish",
    "scheduled_start",
    "scheduled_finish",
];

// days since 1970-01-01, the physical representation of a polars Date
fn date_to_i32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - 719_163
}

fn days(dates: impl Iterator<Item = Option<NaiveDate>>) -> Vec<Option<i32>> {
    dates.map(|date| date.map(date_to_i32)).collect()
}

/// One row per task with its scheduled dates, flags and rolled-up metrics.
pub fn task_table(output: &RecomputeOutput) -> PolarsResult<DataFrame> {
    let tasks = &output.snapshot.tasks;
    let metric = |task_id: TaskId, pick: fn(&EvmMetrics) -> f64| {
        output.task_metrics.get(&task_id).map(pick)
    };

    let df = df!(
        "id" => tasks.iter().map(|t| t.id).collect::<Vec<_>>(),
        "name" => tasks.iter().map(|t| t.name.clone()).collect::<Vec<_>>(),
        "wbs_code" => tasks.iter().map(|t| t.wbs_code.clone()).collect::<Vec<_>>(),
        "parent_id" => tasks.iter().map(|t| t.parent_id).collect::<Vec<_>>(),
        "duration_days" => tasks.iter().map(|t| t.duration_days).collect::<Vec<_>>(),
        "early_start" => days(tasks.iter().map(|t| t.early_start)),
        "early_finish" => days(tasks.iter().map(|t| t.early_finish)),
        "late_start" => days(tasks.iter().map(|t| t.late_start)),
        "late_finish" => days(tasks.iter().map(|t| t.late_finish)),
        "scheduled_start" => days(tasks.iter().map(|t| t.scheduled_start)),
        "scheduled_finish" => days(tasks.iter().map(|t| t.scheduled_finish)),
        "total_float" => tasks.iter().map(|t| t.total_float).collect::<Vec<_>>(),
        "is_critical" => tasks.iter().map(|t| t.is_critical).collect::<Vec<_>>(),
        "is_financially_critical" => tasks.iter().map(|t| t.is_financially_critical).collect::<Vec<_>>(),
        "is_at_risk" => tasks.iter().map(|t| t.is_at_risk).collect::<Vec<_>>(),
        "percent_complete" => tasks.iter().map(|t| t.percent_complete).collect::<Vec<_>>(),
        "bcws" => tasks.iter().map(|t| metric(t.id, |m| m.bcws)).collect::<Vec<_>>(),
        "bcwp" => tasks.iter().map(|t| metric(t.id, |m| m.bcwp)).collect::<Vec<_>>(),
        "acwp" => tasks.iter().map(|t| metric(t.id, |m| m.acwp)).collect::<Vec<_>>(),
        "cpi" => tasks.iter().map(|t| metric(t.id, |m| m.cpi)).collect::<Vec<_>>(),
        "spi" => tasks.iter().map(|t| metric(t.id, |m| m.spi)).collect::<Vec<_>>()
    )?;

    df.lazy()
        .with_columns(
            DATE_COLUMNS
                .iter()
                .map(|name| col(*name).cast(DataType::Date))
                .collect::<Vec<_>>(),
        )
        .sort(["id"], SortMultipleOptions::default())
        .collect()
}

#[derive(Default, Clone, Copy)]
struct Bucket {
    planned: f64,
    earned: f64,
    actual: f64,
}

/// Dates a cost item is spread over: its own window, else its task's early dates.
fn spread_window(output: &RecomputeOutput, item: &CostItem) -> Option<(NaiveDate, NaiveDate)> {
    if let (Some(start), Some(finish)) = (item.window_start, item.window_finish) {
        return Some((start, finish));
    }
    let task = output.task(item.linked_task_id?)?;
    Some((task.early_start?, task.early_finish?))
}

/// Planned, earned and actual cost per calendar month.
///
/// Each cost item is spread evenly over the days of its window, finish
/// exclusive. A window that starts and finishes on the same day puts the
/// whole amount on that day. Items with no window and no scheduled task are
/// left out.
pub fn cash_flow_buckets(output: &RecomputeOutput) -> PolarsResult<DataFrame> {
    let mut buckets: BTreeMap<(i32, u32), Bucket> = BTreeMap::new();

    for item in &output.snapshot.cost_items {
        let Some((start, finish)) = spread_window(output, item) else {
            continue;
        };
        let day_count = (finish - start).num_days().max(1);
        let per_day = Bucket {
            planned: item.planned_cost / day_count as f64,
            earned: item.earned() / day_count as f64,
            actual: item.actual_cost / day_count as f64,
        };
        for offset in 0..day_count {
            let day = start + Duration::days(offset);
            let bucket = buckets.entry((day.year(), day.month())).or_default();
            bucket.planned += per_day.planned;
            bucket.earned += per_day.earned;
            bucket.actual += per_day.actual;
        }
    }

    let mut months = Vec::with_capacity(buckets.len());
    let (mut planned, mut earned, mut actual) = (Vec::new(), Vec::new(), Vec::new());
    let (mut cum_planned, mut cum_earned, mut cum_actual) = (Vec::new(), Vec::new(), Vec::new());
    let mut running = Bucket::default();
    for ((year, month), bucket) in buckets {
        running.planned += bucket.planned;
        running.earned += bucket.earned;
        running.actual += bucket.actual;
        months.push(format!("{year:04}-{month:02}"));
        planned.push(round_money(bucket.planned));
        earned.push(round_money(bucket.earned));
        actual.push(round_money(bucket.actual));
        cum_planned.push(round_money(running.planned));
        cum_earned.push(round_money(running.earned));
        cum_actual.push(round_money(running.actual));
    }

    df!(
        "month" => months,
        "planned" => planned,
        "earned" => earned,
        "actual" => actual,
        "cumulative_planned" => cum_planned,
        "cumulative_earned" => cum_earned,
        "cumulative_actual" => cum_actual
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recompute;
    use crate::snapshot::ProjectSnapshot;
    use site_schedule::{ScheduleMetadata, Task};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn cash_flow_splits_across_month_boundary() {
        let mut snapshot = ProjectSnapshot::new(ScheduleMetadata::starting(d(2025, 1, 1)));
        // ten days, two of them in January
        snapshot.cost_items.push(
            CostItem::new(1, "Pour", 1000.0)
                .with_actual_cost(500.0)
                .with_percent_complete(50.0)
                .with_window(d(2025, 1, 30), d(2025, 2, 9)),
        );
        let output = recompute(&snapshot).unwrap();
        let df = cash_flow_buckets(&output).unwrap();

        assert_eq!(df.height(), 2);
        let planned = df.column("planned").unwrap().f64().unwrap();
        assert_eq!(planned.get(0), Some(200.0));
        assert_eq!(planned.get(1), Some(800.0));
        let earned = df.column("cumulative_earned").unwrap().f64().unwrap();
        assert_eq!(earned.get(1), Some(500.0));
    }

    #[test]
    fn unwindowed_items_follow_their_task() {
        let mut snapshot = ProjectSnapshot::new(ScheduleMetadata::starting(d(2025, 3, 1)));
        snapshot.tasks.push(Task::new(1, "Frame", 4));
        snapshot
            .cost_items
            .push(CostItem::new(1, "Lumber", 400.0).linked_to(1));
        snapshot.cost_items.push(CostItem::new(2, "Loose", 50.0));
        let output = recompute(&snapshot).unwrap();
        let df = cash_flow_buckets(&output).unwrap();

        assert_eq!(df.height(), 1);
        let month = df.column("month").unwrap().str().unwrap();
        assert_eq!(month.get(0), Some("2025-03"));
        let planned = df.column("planned").unwrap().f64().unwrap();
        assert_eq!(planned.get(0), Some(400.0));
    }

    #[test]
    fn task_table_has_date_columns() {
        let mut snapshot = ProjectSnapshot::new(ScheduleMetadata::starting(d(2025, 1, 1)));
        snapshot.tasks.push(Task::new(2, "Second", 2));
        snapshot.tasks.push(Task::new(1, "First", 3));
        let output = recompute(&snapshot).unwrap();
        let df = task_table(&output).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.column("early_start").unwrap().dtype(), &DataType::Date);
        let ids = df.column("id").unwrap().i32().unwrap();
        assert_eq!(ids.get(0), Some(1));
        assert_eq!(df.column("bcws").unwrap().null_count(), 2);
    }
}
