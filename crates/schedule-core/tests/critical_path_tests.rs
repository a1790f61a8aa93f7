use site_schedule::{Relation, Schedule, ScheduleMetadata, Task};

fn schedule_with(tasks: Vec<Task>, relations: &[(i32, i32)]) -> Schedule {
    let mut schedule = Schedule::new(ScheduleMetadata::default());
    for task in tasks {
        schedule.add_task(task).unwrap();
    }
    for &(pred, succ) in relations {
        schedule.add_relation(Relation::finish_to_start(pred, succ)).unwrap();
    }
    schedule
}

#[test]
fn equal_chains_break_ties_on_wbs_order() {
    let schedule = schedule_with(
        vec![
            Task::new(1, "Start", 2).with_wbs("1.1"),
            Task::new(2, "East wing", 3).with_wbs("1.10"),
            Task::new(3, "West wing", 3).with_wbs("1.2"),
        ],
        &[(1, 2), (1, 3)],
    );
    let outcome = schedule.refresh().unwrap();
    assert_eq!(outcome.critical_path(), &[1, 3]);
    assert!(outcome.is_on_critical_path(1));
    assert!(!outcome.is_on_critical_path(2));
}

#[test]
fn path_follows_only_driving_relations() {
    // 3 waits on both 1 and 2; only 2 drives its start
    let schedule = schedule_with(
        vec![
            Task::new(1, "Short", 1),
            Task::new(2, "Long", 4),
            Task::new(3, "Join", 2),
        ],
        &[(1, 3), (2, 3)],
    );
    let outcome = schedule.refresh().unwrap();
    assert_eq!(outcome.critical_path(), &[2, 3]);
    assert_eq!(outcome.task(1).unwrap().total_float, Some(3));
}

#[test]
fn slack_in_the_project_end_empties_the_path() {
    let mut metadata = ScheduleMetadata::default();
    metadata.project_end_date = chrono::NaiveDate::from_ymd_opt(2025, 3, 1);
    let mut schedule = Schedule::new(metadata);
    schedule.add_task(Task::new(1, "A", 2)).unwrap();
    schedule.add_task(Task::new(2, "B", 2)).unwrap();
    schedule.add_relation(Relation::finish_to_start(1, 2)).unwrap();
    let outcome = schedule.refresh().unwrap();
    assert!(outcome.critical_path().is_empty());
    assert_eq!(outcome.task(2).unwrap().is_critical, Some(false));
}

#[test]
fn path_is_ordered_by_early_start() {
    let schedule = schedule_with(
        vec![
            Task::new(7, "Close out", 1),
            Task::new(3, "Mobilise", 2),
            Task::new(5, "Build", 5),
        ],
        &[(3, 5), (5, 7)],
    );
    let outcome = schedule.refresh().unwrap();
    assert_eq!(outcome.critical_path(), &[3, 5, 7]);
    assert_eq!(outcome.summary().critical_path, vec![3, 5, 7]);
}
