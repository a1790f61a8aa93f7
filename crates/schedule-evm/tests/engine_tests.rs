use chrono::{Duration, NaiveDate};
use site_evm::{
    CostItem, EngineError, LinkError, ProjectSnapshot, WindowPolicy, recompute, recompute_batch,
};
use site_schedule::{GraphError, Relation, RelationType, ScheduleMetadata, Task};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn origin() -> NaiveDate {
    d(2025, 1, 1)
}

fn chain_snapshot() -> ProjectSnapshot {
    let mut snapshot = ProjectSnapshot::new(ScheduleMetadata {
        project_name: "Clinic".into(),
        ..ScheduleMetadata::starting(origin())
    });
    snapshot.tasks = vec![
        Task::summary(10, "Shell"),
        Task::new(1, "Excavate", 5).with_parent(10),
        Task::new(2, "Footings", 3).with_parent(10),
        Task::new(3, "Slab", 1),
    ];
    snapshot.relations = vec![
        Relation::finish_to_start(1, 2),
        Relation::new(2, 3, RelationType::FinishToStart, 2),
    ];
    snapshot
}

#[test]
fn scenario_c_metrics_through_the_pipeline() {
    let mut snapshot = chain_snapshot();
    snapshot.cost_items.push(
        CostItem::new(1, "Concrete", 10_000.0)
            .with_actual_cost(5_000.0)
            .with_percent_complete(40.0)
            .linked_to(2),
    );
    let output = recompute(&snapshot).unwrap();

    let m = output.project_metrics;
    assert_eq!(m.bcwp, 4000.0);
    assert_eq!(m.cpi, 0.8);
    assert_eq!(m.cv, -1000.0);
    assert_eq!(m.spi, 0.4);
    assert_eq!(m.sv, -6000.0);
    assert_eq!(m.eac, 12500.0);
    assert_eq!(m.etc, 7500.0);
    assert_eq!(m.vac, -2500.0);

    let item = output.cost_item(1).unwrap();
    assert_eq!(item.earned_value, Some(4000.0));
    assert_eq!(item.metrics, Some(m));
}

#[test]
fn task_metrics_roll_up_to_summaries() {
    let mut snapshot = chain_snapshot();
    snapshot.cost_items = vec![
        CostItem::new(1, "Dig", 1000.0)
            .with_actual_cost(500.0)
            .with_percent_complete(50.0)
            .linked_to(1),
        CostItem::new(2, "Forms", 3000.0)
            .with_actual_cost(1000.0)
            .with_percent_complete(10.0)
            .linked_to(2),
        CostItem::new(3, "Loose", 200.0),
    ];
    let output = recompute(&snapshot).unwrap();

    let shell = output.task_metrics[&10];
    assert_eq!(shell.bcws, 4000.0);
    assert_eq!(shell.bcwp, 800.0);
    assert_eq!(shell.acwp, 1500.0);
    // ratios come from the summed totals, never an average of item ratios
    assert_eq!(shell.cpi, 0.5333);
    assert!(!output.task_metrics.contains_key(&3));
    assert_eq!(output.project_metrics.bcws, 4200.0);
}

#[test]
fn recompute_is_idempotent_on_its_own_output() {
    let mut snapshot = chain_snapshot();
    snapshot
        .cost_items
        .push(CostItem::new(1, "Rebar", 750.0).with_percent_complete(20.0).linked_to(2));
    let first = recompute(&snapshot).unwrap();
    let second = recompute(&first.snapshot).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.critical_path.sequence(), &[1, 2, 3]);
    assert!(first.is_on_critical_path(2));
    assert!(!first.is_on_critical_path(10));
    // the input is not modified
    assert_eq!(snapshot.tasks[1].early_start, None);
}

#[test]
fn follow_task_windows_track_the_schedule() {
    let mut snapshot = chain_snapshot();
    snapshot.settings.window_policy = WindowPolicy::FollowTask;
    snapshot.cost_items.push(
        CostItem::new(1, "Pump truck", 900.0)
            .with_window(d(2024, 12, 1), d(2024, 12, 2))
            .linked_to(3),
    );
    let output = recompute(&snapshot).unwrap();

    let item = output.cost_item(1).unwrap();
    assert_eq!(item.window_start, Some(origin() + Duration::days(10)));
    assert_eq!(item.window_finish, Some(origin() + Duration::days(11)));
}

#[test]
fn keep_policy_leaves_windows_alone() {
    let mut snapshot = chain_snapshot();
    snapshot.cost_items.push(
        CostItem::new(1, "Pump truck", 900.0)
            .with_window(d(2024, 12, 1), d(2024, 12, 2))
            .linked_to(3),
    );
    let output = recompute(&snapshot).unwrap();
    assert_eq!(output.cost_item(1).unwrap().window_start, Some(d(2024, 12, 1)));
}

#[test]
fn structural_errors_abort_the_recompute() {
    let mut cyclic = chain_snapshot();
    cyclic.relations.push(Relation::finish_to_start(3, 1));
    match recompute(&cyclic) {
        Err(EngineError::Schedule(site_schedule::ScheduleError::Graph(GraphError::Cycle {
            cycle,
        }))) => {
            assert_eq!(cycle.first(), cycle.last());
            assert!(cycle.contains(&2));
        }
        other => panic!("expected cycle error, got {other:?}"),
    }

    let mut dangling = chain_snapshot();
    dangling.cost_items.push(CostItem::new(1, "Ghost", 10.0).linked_to(99));
    assert_eq!(
        recompute(&dangling),
        Err(EngineError::Link(LinkError::UnknownTask(99)))
    );

    let mut negative = chain_snapshot();
    negative.cost_items.push(CostItem::new(1, "Refund", -10.0));
    assert!(matches!(
        recompute(&negative),
        Err(EngineError::InvalidCostItem { id: 1, .. })
    ));
}

#[test]
fn batch_keeps_input_order_and_isolates_failures() {
    let good = chain_snapshot();
    let mut bad = chain_snapshot();
    bad.relations.push(Relation::finish_to_start(99, 1));
    let mut other = chain_snapshot();
    other.tasks.push(Task::new(4, "Landscaping", 20));

    let results = recompute_batch(&[good.clone(), bad, other]);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), &recompute(&good).unwrap());
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().snapshot.tasks.len(), 5);
}

#[test]
fn oversized_values_fail_the_recompute_without_panicking() {
    let mut snapshot = chain_snapshot();
    snapshot.tasks[3].duration_days = 200_000_000;
    assert!(matches!(
        recompute(&snapshot),
        Err(EngineError::Schedule(site_schedule::ScheduleError::InvalidTask { task_id: 3, .. }))
    ));

    let mut snapshot = chain_snapshot();
    snapshot.relations[1].lag_days = i64::MAX;
    assert!(matches!(
        recompute(&snapshot),
        Err(EngineError::Schedule(site_schedule::ScheduleError::InvalidTask { task_id: 3, .. }))
    ));
}
