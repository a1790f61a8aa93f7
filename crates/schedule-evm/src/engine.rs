use crate::cost_item::CostItem;
use crate::error::EngineError;
use crate::evm::{EvmMetrics, EvmTotals, aggregate};
use crate::linker::FinancialLinker;
use crate::snapshot::{ProjectSnapshot, RecomputeOutput};
use log::info;
use rayon::prelude::*;
use site_schedule::{Schedule, TaskGraph, TaskId, day_counter_for};
use std::collections::{BTreeMap, HashSet};

fn validate_cost_items(items: &[CostItem]) -> Result<(), EngineError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id) {
            return Err(EngineError::DuplicateCostItem(item.id));
        }
        item.validate()?;
    }
    Ok(())
}

/// Schedule the project and derive every earned-value figure.
///
/// Pure: the input snapshot is left untouched and the same input always gives
/// the same output. Feeding an output snapshot back in reproduces it.
pub fn recompute(snapshot: &ProjectSnapshot) -> Result<RecomputeOutput, EngineError> {
    validate_cost_items(&snapshot.cost_items)?;
    let linker = FinancialLinker::new(snapshot.settings.window_policy);
    linker.validate_links(&snapshot.cost_items, &snapshot.tasks)?;

    let counter = day_counter_for(snapshot.calendar.as_ref())?;
    let schedule = Schedule::from_parts(
        snapshot.metadata.clone(),
        counter,
        snapshot.tasks.clone(),
        &snapshot.relations,
    )?;
    let outcome = schedule.refresh()?;

    let mut cost_items = snapshot.cost_items.clone();
    for item in cost_items.iter_mut() {
        item.clear_derived();
    }
    linker.apply_window_policy(&mut cost_items, &outcome.tasks);
    for item in cost_items.iter_mut() {
        item.apply_metrics();
    }

    let task_metrics = task_metrics(schedule.graph(), &cost_items);
    let project_metrics = aggregate(cost_items.iter().map(CostItem::totals));

    let output = RecomputeOutput {
        snapshot: ProjectSnapshot {
            metadata: snapshot.metadata.clone(),
            calendar: snapshot.calendar.clone(),
            settings: snapshot.settings,
            tasks: outcome.tasks.clone(),
            relations: schedule.relations(),
            cost_items,
        },
        critical_path: outcome.critical_path.clone(),
        project_finish: outcome.project_finish,
        project_metrics,
        task_metrics,
        warnings: outcome.warnings,
    };

    info!(
        "recomputed '{}': {}, cpi={}, spi={}",
        output.snapshot.metadata.project_name,
        output.summary().to_cli_summary(),
        output.project_metrics.cpi,
        output.project_metrics.spi
    );
    Ok(output)
}

/// Recompute independent projects on the rayon pool. Results keep input order.
pub fn recompute_batch(
    snapshots: &[ProjectSnapshot],
) -> Vec<Result<RecomputeOutput, EngineError>> {
    snapshots.par_iter().map(recompute).collect()
}

// Each linked item counts toward its task and every ancestor summary.
fn task_metrics(graph: &TaskGraph, items: &[CostItem]) -> BTreeMap<TaskId, EvmMetrics> {
    let mut totals: BTreeMap<TaskId, EvmTotals> = BTreeMap::new();
    for item in items {
        let Some(task_id) = item.linked_task_id else {
            continue;
        };
        let item_totals = item.totals();
        *totals.entry(task_id).or_default() += item_totals;
        for ancestor in graph.ancestors_of(task_id) {
            *totals.entry(ancestor).or_default() += item_totals;
        }
    }
    totals
        .into_iter()
        .map(|(task_id, totals)| (task_id, totals.metrics()))
        .collect()
}
