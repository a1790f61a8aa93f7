use crate::calculations::{TaskTiming, is_scheduled_relation};
use crate::graph::TaskGraph;
use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum WbsSegment {
    Number(u64),
    Text(String),
}

/// Sort key for dotted WBS codes: `1.2` < `1.10` < `1.a`, missing codes last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WbsKey(Option<Vec<WbsSegment>>);

impl WbsKey {
    pub fn parse(code: Option<&str>) -> Self {
        let segments = code.filter(|c| !c.trim().is_empty()).map(|code| {
            code.trim()
                .split('.')
                .map(|part| match part.parse::<u64>() {
                    Ok(number) => WbsSegment::Number(number),
                    Err(_) => WbsSegment::Text(part.to_string()),
                })
                .collect()
        });
        Self(segments)
    }
}

impl Ord for WbsKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for WbsKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The single chain of critical tasks linked by driving relations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TaskId>", into = "Vec<TaskId>")]
pub struct CriticalPath {
    sequence: Vec<TaskId>,
    flagged: HashSet<TaskId>,
}

impl From<Vec<TaskId>> for CriticalPath {
    fn from(sequence: Vec<TaskId>) -> Self {
        Self::from_sequence(sequence)
    }
}

impl From<CriticalPath> for Vec<TaskId> {
    fn from(path: CriticalPath) -> Self {
        path.sequence
    }
}

impl CriticalPath {
    pub fn from_sequence(sequence: Vec<TaskId>) -> Self {
        let flagged = sequence.iter().copied().collect();
        Self { sequence, flagged }
    }

    /// Resolve the critical path over `critical` tasks.
    ///
    /// A relation is driving when its computed constraint equals the
    /// successor's early start. Among competing chains the one ending at the
    /// latest early finish wins, then the lowest WBS sequence.
    pub fn resolve(
        graph: &TaskGraph,
        order: &[TaskId],
        timings: &HashMap<TaskId, TaskTiming>,
        durations: &HashMap<TaskId, i64>,
        critical: &HashSet<TaskId>,
    ) -> Self {
        let keys: HashMap<TaskId, WbsKey> = graph
            .tasks()
            .iter()
            .map(|task| (task.id, WbsKey::parse(task.wbs_code.as_deref())))
            .collect();
        let compare = |a: &[TaskId], b: &[TaskId]| {
            a.iter()
                .map(|id| (keys.get(id), id))
                .cmp(b.iter().map(|id| (keys.get(id), id)))
        };

        let is_driving = |pred: TaskId, succ: TaskId| -> bool {
            let Some(relation) = graph.relation(pred, succ) else {
                return false;
            };
            if !is_scheduled_relation(graph, &relation) {
                return false;
            }
            let (Some(p), Some(s)) = (timings.get(&pred), timings.get(&succ)) else {
                return false;
            };
            let duration = durations.get(&succ).copied().unwrap_or(0);
            relation.relation_type.earliest_successor_start(
                p.early_start,
                p.early_finish,
                relation.lag_days,
                duration,
            ) == s.early_start
        };

        let mut best: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        let mut has_driving_successor: HashSet<TaskId> = HashSet::new();
        for &task_id in order {
            if !critical.contains(&task_id) || !timings.contains_key(&task_id) {
                continue;
            }
            let mut chosen: Option<Vec<TaskId>> = None;
            for relation in graph.predecessors(task_id) {
                let pred = relation.predecessor_id;
                if !critical.contains(&pred) || !is_driving(pred, task_id) {
                    continue;
                }
                has_driving_successor.insert(pred);
                let Some(path) = best.get(&pred) else {
                    continue;
                };
                let replace = chosen
                    .as_ref()
                    .is_none_or(|current| compare(path, current) == Ordering::Less);
                if replace {
                    chosen = Some(path.clone());
                }
            }
            let mut path = chosen.unwrap_or_default();
            path.push(task_id);
            best.insert(task_id, path);
        }

        let finish_of = |id: &TaskId| timings.get(id).map_or(i64::MIN, |t| t.early_finish);
        let winner = best
            .iter()
            .filter(|(id, _)| !has_driving_successor.contains(id))
            .max_by(|(a_id, a_path), (b_id, b_path)| {
                finish_of(a_id)
                    .cmp(&finish_of(b_id))
                    .then_with(|| compare(b_path, a_path))
            })
            .map(|(_, path)| path.clone())
            .unwrap_or_default();

        let mut sequence = winner;
        sequence.sort_by_key(|id| timings.get(id).map_or(0, |t| t.early_start));
        Self::from_sequence(sequence)
    }

    pub fn sequence(&self) -> &[TaskId] {
        &self.sequence
    }

    pub fn is_on_critical_path(&self, task_id: TaskId) -> bool {
        self.flagged.contains(&task_id)
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wbs_keys_order_numerically_with_missing_codes_last() {
        let mut codes = vec![
            WbsKey::parse(None),
            WbsKey::parse(Some("1.10")),
            WbsKey::parse(Some("1.a")),
            WbsKey::parse(Some("1.2")),
        ];
        codes.sort();
        assert_eq!(
            codes,
            vec![
                WbsKey::parse(Some("1.2")),
                WbsKey::parse(Some("1.10")),
                WbsKey::parse(Some("1.a")),
                WbsKey::parse(None),
            ]
        );
    }

    #[test]
    fn flag_lookup_matches_sequence() {
        let path = CriticalPath::from_sequence(vec![4, 2, 9]);
        assert!(path.is_on_critical_path(2));
        assert!(!path.is_on_critical_path(3));
        assert_eq!(path.len(), 3);
    }
}
