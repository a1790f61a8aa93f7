use super::TaskTiming;
use crate::graph::TaskGraph;
use crate::task::TaskId;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRollup {
    pub timing: TaskTiming,
    pub percent_complete: f64,
    /// No children to roll up; timing is left at the project start.
    pub is_empty: bool,
}

/// Derives summary dates and progress from their children, deepest summaries first.
pub struct Rollup<'a> {
    graph: &'a TaskGraph,
}

impl<'a> Rollup<'a> {
    pub fn new(graph: &'a TaskGraph) -> Self {
        Self { graph }
    }

    pub fn execute(&self, leaves: &HashMap<TaskId, TaskTiming>) -> BTreeMap<TaskId, SummaryRollup> {
        let mut summaries: Vec<(usize, TaskId)> = self
            .graph
            .tasks()
            .iter()
            .filter(|task| task.is_summary)
            .map(|task| (self.graph.depth_of(task.id), task.id))
            .collect();
        summaries.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut rolled: BTreeMap<TaskId, SummaryRollup> = BTreeMap::new();
        for (_, summary_id) in summaries {
            let children: Vec<(TaskTiming, f64)> = self
                .graph
                .children_of(summary_id)
                .into_iter()
                .filter_map(|child_id| {
                    if let Some(summary) = rolled.get(&child_id) {
                        return Some((summary.timing, summary.percent_complete));
                    }
                    let timing = leaves.get(&child_id)?;
                    let percent = self.graph.task(child_id)?.percent_complete;
                    Some((*timing, percent))
                })
                .collect();

            let rollup = if children.is_empty() {
                SummaryRollup {
                    timing: TaskTiming::default(),
                    percent_complete: self
                        .graph
                        .task(summary_id)
                        .map_or(0.0, |task| task.percent_complete),
                    is_empty: true,
                }
            } else {
                Self::combine(&children)
            };
            rolled.insert(summary_id, rollup);
        }
        rolled
    }

    fn combine(children: &[(TaskTiming, f64)]) -> SummaryRollup {
        // A summary's late window mirrors its early window; it carries no float of its own.
        let early_start = children.iter().map(|(t, _)| t.early_start).min().unwrap_or(0);
        let early_finish = children.iter().map(|(t, _)| t.early_finish).max().unwrap_or(0);
        let timing = TaskTiming {
            early_start,
            early_finish,
            late_start: early_start,
            late_finish: early_finish,
        };

        let total_weight: i64 = children.iter().map(|(t, _)| t.span().max(0)).sum();
        let percent_complete = if total_weight > 0 {
            children
                .iter()
                .map(|(t, pct)| t.span().max(0) as f64 * pct)
                .sum::<f64>()
                / total_weight as f64
        } else {
            children.iter().map(|(_, pct)| pct).sum::<f64>() / children.len() as f64
        };

        SummaryRollup {
            timing,
            percent_complete,
            is_empty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn timing(es: i64, ef: i64) -> TaskTiming {
        TaskTiming {
            early_start: es,
            early_finish: ef,
            late_start: es,
            late_finish: ef,
        }
    }

    #[test]
    fn nested_summaries_roll_up_bottom_up() {
        let mut graph = TaskGraph::new();
        graph.add_task(Task::summary(1, "Building")).unwrap();
        graph.add_task(Task::summary(2, "Structure").with_parent(1)).unwrap();
        graph
            .add_task(Task::new(3, "Columns", 4).with_parent(2).with_percent_complete(100.0))
            .unwrap();
        graph
            .add_task(Task::new(4, "Slab", 6).with_parent(2).with_percent_complete(50.0))
            .unwrap();
        graph.add_task(Task::new(5, "Roof", 2).with_parent(1)).unwrap();

        let leaves = HashMap::from([(3, timing(0, 4)), (4, timing(4, 10)), (5, timing(10, 12))]);
        let rolled = Rollup::new(&graph).execute(&leaves);

        assert_eq!(rolled[&2].timing, timing(0, 10));
        assert!((rolled[&2].percent_complete - 70.0).abs() < 1e-9);
        assert_eq!(rolled[&1].timing, timing(0, 12));
        // (10 * 70 + 2 * 0) / 12
        assert!((rolled[&1].percent_complete - 700.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn late_dates_ignore_child_float() {
        let mut graph = TaskGraph::new();
        graph.add_task(Task::summary(1, "Landscaping")).unwrap();
        graph.add_task(Task::new(2, "Seed lawn", 1).with_parent(1)).unwrap();
        let floating = TaskTiming {
            early_start: 0,
            early_finish: 1,
            late_start: 6,
            late_finish: 7,
        };
        let rolled = Rollup::new(&graph).execute(&HashMap::from([(2, floating)]));
        assert_eq!(rolled[&1].timing, timing(0, 1));
        assert_eq!(rolled[&1].timing.total_float(), 0);
    }

    #[test]
    fn zero_duration_children_use_plain_average() {
        let mut graph = TaskGraph::new();
        graph.add_task(Task::summary(1, "Gates")).unwrap();
        graph
            .add_task(Task::milestone(2, "Permit").with_parent(1).with_percent_complete(100.0))
            .unwrap();
        graph.add_task(Task::milestone(3, "Handover").with_parent(1)).unwrap();
        let leaves = HashMap::from([(2, timing(0, 0)), (3, timing(5, 5))]);
        let rolled = Rollup::new(&graph).execute(&leaves);
        assert_eq!(rolled[&1].percent_complete, 50.0);
    }

    #[test]
    fn empty_summary_is_flagged() {
        let mut graph = TaskGraph::new();
        graph.add_task(Task::summary(1, "Placeholder")).unwrap();
        let rolled = Rollup::new(&graph).execute(&HashMap::new());
        assert!(rolled[&1].is_empty);
    }
}
