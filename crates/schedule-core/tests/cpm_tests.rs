use chrono::{Duration, NaiveDate, Weekday};
use site_schedule::{
    CalendarDays, ConstraintKind, Relation, RelationType, Schedule, ScheduleError,
    ScheduleMetadata, ScheduleOutcome, ScheduleWarning, Task, TaskStatus, WorkCalendar,
};
use std::sync::Arc;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn origin() -> NaiveDate {
    d(2025, 1, 1)
}

fn day(offset: i64) -> Option<NaiveDate> {
    Some(origin() + Duration::days(offset))
}

fn metadata(project_end: Option<i64>) -> ScheduleMetadata {
    ScheduleMetadata {
        project_name: "Warehouse".into(),
        project_start_date: origin(),
        project_end_date: project_end.map(|offset| origin() + Duration::days(offset)),
        ..ScheduleMetadata::default()
    }
}

fn scenario_a() -> Schedule {
    let mut schedule = Schedule::new(metadata(Some(11)));
    schedule.add_task(Task::new(1, "Site prep", 5)).unwrap();
    schedule.add_task(Task::new(2, "Foundations", 3)).unwrap();
    schedule.add_task(Task::new(3, "Cure", 1)).unwrap();
    schedule
        .add_relation(Relation::new(1, 2, RelationType::FinishToStart, 0))
        .unwrap();
    schedule
        .add_relation(Relation::new(2, 3, RelationType::FinishToStart, 2))
        .unwrap();
    schedule
}

fn task(outcome: &ScheduleOutcome, id: i32) -> &Task {
    outcome.task(id).unwrap()
}

#[test]
fn finish_to_start_chain_is_fully_critical() {
    let outcome = scenario_a().refresh().unwrap();

    assert_eq!(task(&outcome, 1).early_finish, day(5));
    assert_eq!(task(&outcome, 2).early_start, day(5));
    assert_eq!(task(&outcome, 2).early_finish, day(8));
    assert_eq!(task(&outcome, 3).early_start, day(10));
    assert_eq!(task(&outcome, 3).early_finish, day(11));

    for id in 1..=3 {
        assert_eq!(task(&outcome, id).total_float, Some(0), "task {id}");
        assert_eq!(task(&outcome, id).is_critical, Some(true), "task {id}");
    }
    assert_eq!(outcome.critical_path(), &[1, 2, 3]);
    assert_eq!(outcome.project_finish, d(2025, 1, 12));
}

#[test]
fn slack_branch_carries_float_and_is_not_critical() {
    let mut schedule = scenario_a();
    schedule.add_task(Task::new(4, "Fencing", 2)).unwrap();
    schedule
        .add_relation(Relation::finish_to_start(1, 4))
        .unwrap();
    let outcome = schedule.refresh().unwrap();

    let fencing = task(&outcome, 4);
    assert_eq!(fencing.early_finish, day(7));
    assert_eq!(fencing.late_finish, day(11));
    assert_eq!(fencing.total_float, Some(4));
    assert_eq!(fencing.is_critical, Some(false));
    assert!(!outcome.is_on_critical_path(4));
    assert_eq!(outcome.critical_path(), &[1, 2, 3]);
}

#[test]
fn start_to_start_and_finish_to_finish_offsets() {
    let mut schedule = Schedule::new(metadata(None));
    schedule.add_task(Task::new(1, "Formwork", 4)).unwrap();
    schedule.add_task(Task::new(2, "Rebar", 2)).unwrap();
    schedule.add_task(Task::new(3, "Pour", 5)).unwrap();
    schedule
        .add_relation(Relation::new(1, 2, RelationType::StartToStart, 1))
        .unwrap();
    schedule
        .add_relation(Relation::new(2, 3, RelationType::FinishToFinish, 0))
        .unwrap();
    let outcome = schedule.refresh().unwrap();

    assert_eq!(task(&outcome, 2).early_start, day(1));
    assert_eq!(task(&outcome, 2).early_finish, day(3));
    assert_eq!(task(&outcome, 3).early_start, day(0));
    assert_eq!(task(&outcome, 3).early_finish, day(5));
}

#[test]
fn start_to_finish_back_derives_the_start() {
    let mut schedule = Schedule::new(metadata(None));
    schedule.add_task(Task::new(1, "Night shift", 2)).unwrap();
    schedule.add_task(Task::new(2, "Day shift", 3)).unwrap();
    schedule
        .add_relation(Relation::new(1, 2, RelationType::StartToFinish, 6))
        .unwrap();
    let outcome = schedule.refresh().unwrap();
    assert_eq!(task(&outcome, 2).early_start, day(3));
    assert_eq!(task(&outcome, 2).early_finish, day(6));
}

#[test]
fn forward_and_backward_passes_agree() {
    let mut schedule = scenario_a();
    schedule.add_task(Task::new(4, "Fencing", 2)).unwrap();
    schedule.add_task(Task::milestone(5, "Handover")).unwrap();
    schedule.add_relation(Relation::finish_to_start(1, 4)).unwrap();
    schedule.add_relation(Relation::finish_to_start(3, 5)).unwrap();
    schedule.add_relation(Relation::finish_to_start(4, 5)).unwrap();
    let outcome = schedule.refresh().unwrap();

    for timing in outcome.timings.values() {
        assert!(timing.early_finish >= timing.early_start);
        assert!(timing.early_start <= timing.late_start);
        assert!(timing.early_finish <= timing.late_finish);
        assert!(timing.total_float() >= 0);
    }
    assert_eq!(task(&outcome, 5).early_start, task(&outcome, 5).early_finish);
}

#[test]
fn lead_pulls_successor_earlier() {
    let mut schedule = Schedule::new(metadata(None));
    schedule.add_task(Task::new(1, "Drywall", 6)).unwrap();
    schedule.add_task(Task::new(2, "Paint", 4)).unwrap();
    schedule
        .add_relation(Relation::new(1, 2, RelationType::FinishToStart, -2))
        .unwrap();
    let outcome = schedule.refresh().unwrap();
    assert_eq!(task(&outcome, 2).early_start, day(4));
}

#[test]
fn start_no_earlier_than_pushes_the_start() {
    let mut schedule = Schedule::new(metadata(None));
    schedule
        .add_task(
            Task::new(1, "Crane hire", 2)
                .with_constraint(ConstraintKind::StartNoEarlierThan, day(3)),
        )
        .unwrap();
    let outcome = schedule.refresh().unwrap();
    assert_eq!(task(&outcome, 1).early_start, day(3));
    assert!(outcome.warnings.is_empty());
}

#[test]
fn impossible_must_start_on_is_reported_not_fatal() {
    let mut schedule = Schedule::new(metadata(None));
    schedule.add_task(Task::new(1, "Excavation", 5)).unwrap();
    schedule
        .add_task(
            Task::new(2, "Inspection", 1).with_constraint(ConstraintKind::MustStartOn, day(2)),
        )
        .unwrap();
    schedule.add_relation(Relation::finish_to_start(1, 2)).unwrap();
    let outcome = schedule.refresh().unwrap();

    let inspection = task(&outcome, 2);
    assert_eq!(inspection.early_start, day(5));
    assert_eq!(inspection.warnings.len(), 1);
    assert_eq!(inspection.warnings[0].computed_date, d(2025, 1, 6));
    assert_eq!(inspection.is_at_risk, Some(true));
    assert!(matches!(
        outcome.warnings.as_slice(),
        [ScheduleWarning::InvalidConstraint(_)]
    ));
}

#[test]
fn finish_no_later_than_limits_the_late_finish() {
    let mut schedule = Schedule::new(metadata(None));
    schedule
        .add_task(
            Task::new(1, "Permits", 3).with_constraint(ConstraintKind::FinishNoLaterThan, day(5)),
        )
        .unwrap();
    schedule.add_task(Task::new(2, "Long lead steel", 10)).unwrap();
    let outcome = schedule.refresh().unwrap();

    assert_eq!(task(&outcome, 1).late_finish, day(5));
    assert_eq!(task(&outcome, 1).total_float, Some(2));
    assert_eq!(task(&outcome, 2).total_float, Some(0));
    // not linked to anything, so zero float alone does not make it critical
    assert_eq!(task(&outcome, 2).is_critical, Some(false));
}

#[test]
fn as_late_as_possible_schedules_on_late_dates() {
    let mut schedule = Schedule::new(metadata(None));
    schedule.add_task(Task::new(1, "Structure", 8)).unwrap();
    schedule
        .add_task(Task::new(2, "Signage", 2).with_constraint(ConstraintKind::AsLateAsPossible, None))
        .unwrap();
    let outcome = schedule.refresh().unwrap();

    let signage = task(&outcome, 2);
    assert_eq!(signage.early_start, day(0));
    assert_eq!(signage.total_float, Some(6));
    assert_eq!(signage.scheduled_start, day(6));
    assert_eq!(signage.scheduled_finish, day(8));
    assert_eq!(task(&outcome, 1).scheduled_start, day(0));
}

#[test]
fn summary_rolls_up_children_and_ignores_its_relations() {
    let mut schedule = Schedule::new(metadata(None));
    schedule.add_task(Task::summary(10, "Shell").with_wbs("1")).unwrap();
    schedule
        .add_task(
            Task::new(11, "Walls", 4)
                .with_parent(10)
                .with_percent_complete(100.0),
        )
        .unwrap();
    schedule
        .add_task(Task::new(12, "Roof", 6).with_parent(10))
        .unwrap();
    schedule.add_task(Task::new(20, "Fit-out", 5)).unwrap();
    schedule.add_relation(Relation::finish_to_start(11, 12)).unwrap();
    schedule.add_relation(Relation::finish_to_start(10, 20)).unwrap();
    let outcome = schedule.refresh().unwrap();

    let shell = task(&outcome, 10);
    assert_eq!(shell.early_start, day(0));
    assert_eq!(shell.early_finish, day(10));
    assert_eq!(shell.percent_complete, 40.0);
    assert_eq!(shell.is_critical, Some(true));
    // relation from the summary does not drive the fit-out
    assert_eq!(task(&outcome, 20).early_start, day(0));
    assert!(outcome.warnings.contains(&ScheduleWarning::SummaryRelationIgnored {
        predecessor_id: 10,
        successor_id: 20,
    }));
}

#[test]
fn empty_summary_produces_a_warning() {
    let mut schedule = Schedule::new(metadata(None));
    schedule.add_task(Task::summary(1, "Future phase")).unwrap();
    let outcome = schedule.refresh().unwrap();
    assert_eq!(
        outcome.warnings,
        vec![ScheduleWarning::EmptySummary { task_id: 1 }]
    );
}

#[test]
fn planned_dates_drive_duration() {
    let mut schedule = Schedule::new(metadata(None));
    schedule
        .add_task(Task::new(1, "Survey", 1).with_planned_dates(d(2025, 1, 1), d(2025, 1, 8)))
        .unwrap();
    let outcome = schedule.refresh().unwrap();
    assert_eq!(task(&outcome, 1).early_finish, day(7));
}

#[test]
fn work_calendar_skips_weekends() {
    let calendar = WorkCalendar::custom(
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
        Vec::<NaiveDate>::new(),
    )
    .unwrap();
    let metadata = ScheduleMetadata::starting(d(2025, 1, 6));
    let mut schedule = Schedule::with_day_counter(metadata, Arc::new(calendar));
    schedule.add_task(Task::new(1, "Framing", 5)).unwrap();
    schedule.add_task(Task::new(2, "Sheathing", 2)).unwrap();
    schedule.add_relation(Relation::finish_to_start(1, 2)).unwrap();
    let outcome = schedule.refresh().unwrap();

    assert_eq!(task(&outcome, 1).early_finish, Some(d(2025, 1, 13)));
    assert_eq!(task(&outcome, 2).early_start, Some(d(2025, 1, 13)));
    assert_eq!(task(&outcome, 2).early_finish, Some(d(2025, 1, 15)));
}

#[test]
fn overdue_open_work_is_at_risk() {
    let mut schedule = scenario_a();
    let mut meta = schedule.metadata().clone();
    meta.as_of_date = day(9);
    schedule.set_metadata(meta).unwrap();
    let mut done = schedule.task(1).unwrap().clone();
    done.status = TaskStatus::Done;
    done.percent_complete = 100.0;
    schedule.update_task(done).unwrap();
    let outcome = schedule.refresh().unwrap();

    assert_eq!(task(&outcome, 1).is_at_risk, Some(false));
    // task 2 late finish is day 8 and it is still open
    assert_eq!(task(&outcome, 2).is_at_risk, Some(true));
    assert_eq!(task(&outcome, 3).is_at_risk, Some(false));
}

#[test]
fn financially_critical_needs_a_predecessor() {
    let outcome = scenario_a().refresh().unwrap();
    assert_eq!(task(&outcome, 1).is_financially_critical, Some(false));
    assert_eq!(task(&outcome, 2).is_financially_critical, Some(true));
    assert_eq!(task(&outcome, 3).is_financially_critical, Some(true));
}

#[test]
fn invalid_task_is_rejected_before_scheduling() {
    let mut schedule = Schedule::new(metadata(None));
    let err = schedule.add_task(Task::new(1, "Bad", -1)).unwrap_err();
    assert!(err.to_string().contains("negative duration"));
}

#[test]
fn summary_late_finish_follows_children_early_finish() {
    let mut schedule = Schedule::new(metadata(Some(7)));
    schedule.add_task(Task::summary(10, "Landscaping")).unwrap();
    schedule
        .add_task(Task::new(11, "Seed lawn", 1).with_parent(10))
        .unwrap();
    let outcome = schedule.refresh().unwrap();

    assert_eq!(task(&outcome, 11).total_float, Some(6));
    assert_eq!(task(&outcome, 11).late_finish, day(7));
    let summary = task(&outcome, 10);
    assert_eq!(summary.early_finish, day(1));
    assert_eq!(summary.late_start, day(0));
    assert_eq!(summary.late_finish, day(1));
    assert_eq!(summary.total_float, Some(0));
}

#[test]
fn oversized_duration_is_rejected_instead_of_overflowing() {
    let mut schedule = Schedule::new(metadata(None));
    let err = schedule
        .add_task(Task::new(1, "Huge", 200_000_000))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidTask { task_id: 1, .. }));

    let err = Schedule::from_parts(
        metadata(None),
        Arc::new(CalendarDays),
        vec![Task::new(1, "Huge", 200_000_000)],
        &[],
    )
    .unwrap_err();
    assert!(err.to_string().contains("exceeds the 36525 day limit"));
}

#[test]
fn oversized_lag_is_rejected_instead_of_overflowing() {
    let mut schedule = Schedule::new(metadata(None));
    schedule.add_task(Task::new(1, "Pour", 1)).unwrap();
    schedule.add_task(Task::new(2, "Strip forms", 1)).unwrap();
    let err = schedule
        .add_relation(Relation::new(1, 2, RelationType::FinishToStart, i64::MAX))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidTask { task_id: 2, .. }));
    assert!(schedule.relations().is_empty());

    let err = Schedule::from_parts(
        metadata(None),
        Arc::new(CalendarDays),
        vec![Task::new(1, "Pour", 1), Task::new(2, "Strip forms", 1)],
        &[Relation::new(1, 2, RelationType::StartToStart, -150_000_000)],
    )
    .unwrap_err();
    assert!(err.to_string().contains("lag -150000000"));
}

#[test]
fn dates_past_the_calendar_range_are_an_error() {
    let start = NaiveDate::MAX - Duration::days(10);
    let mut schedule = Schedule::new(ScheduleMetadata::starting(start));
    schedule.add_task(Task::new(1, "Last job", 5)).unwrap();
    schedule.add_task(Task::new(2, "After the end of time", 30)).unwrap();
    schedule.add_relation(Relation::finish_to_start(1, 2)).unwrap();

    let err = schedule.refresh().unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidTask { task_id: 2, .. }));
    assert!(err.to_string().contains("outside the supported date range"));
}
