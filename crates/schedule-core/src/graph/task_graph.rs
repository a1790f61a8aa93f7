use crate::error::GraphError;
use crate::relation::{Relation, RelationType};
use crate::task::{Task, TaskId};
use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};

/// Tasks plus their precedence network.
///
/// Node indices line up with the task arena: the task stored at position `i`
/// is node `NodeIndex::new(i)`. Tasks are never removed from a graph; deleting
/// a task means building a new graph without it.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    graph: DiGraph<TaskId, Relation>,
    tasks: Vec<Task>,
    index: HashMap<TaskId, NodeIndex>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from loose records, checking every relation and the hierarchy.
    pub fn from_parts(tasks: Vec<Task>, relations: &[Relation]) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for task in tasks {
            graph.add_task(task)?;
        }
        graph.validate_hierarchy()?;
        for relation in relations {
            graph.add_relation(*relation)?;
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.index.contains_key(&task_id)
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.index
            .get(&task_id)
            .map(|node| &self.tasks[node.index()])
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    fn node(&self, task_id: TaskId) -> Result<NodeIndex, GraphError> {
        self.index
            .get(&task_id)
            .copied()
            .ok_or(GraphError::UnknownTask(task_id))
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), GraphError> {
        if self.index.contains_key(&task.id) {
            return Err(GraphError::DuplicateTask(task.id));
        }
        let node = self.graph.add_node(task.id);
        debug_assert_eq!(node.index(), self.tasks.len());
        self.index.insert(task.id, node);
        self.tasks.push(task);
        Ok(())
    }

    /// Replace the stored record of an existing task. Relations are untouched.
    ///
    /// A new parent goes through the same checks as [`TaskGraph::set_parent`];
    /// a rejected replacement leaves the stored record in place.
    pub fn replace_task(&mut self, task: Task) -> Result<Task, GraphError> {
        let node = self.node(task.id)?;
        if let Some(parent_id) = task.parent_id {
            self.check_parent(task.id, parent_id)?;
        }
        let reparented = self.tasks[node.index()].parent_id != task.parent_id;
        let previous = std::mem::replace(&mut self.tasks[node.index()], task);
        if reparented {
            if let Err(err) = self.check_relations_against_hierarchy() {
                self.tasks[node.index()] = previous;
                return Err(err);
            }
        }
        Ok(previous)
    }

    /// Insert a precedence edge, or replace the type and lag of an existing one.
    ///
    /// A rejected edge leaves the graph untouched.
    pub fn add_edge(
        &mut self,
        predecessor_id: TaskId,
        successor_id: TaskId,
        relation_type: RelationType,
        lag_days: i64,
    ) -> Result<(), GraphError> {
        let pred = self.node(predecessor_id)?;
        let succ = self.node(successor_id)?;
        let relation = Relation::new(predecessor_id, successor_id, relation_type, lag_days);

        if pred == succ {
            return Err(GraphError::Cycle {
                cycle: vec![predecessor_id, predecessor_id],
            });
        }
        if self.is_ancestor(predecessor_id, successor_id)
            || self.is_ancestor(successor_id, predecessor_id)
        {
            return Err(GraphError::HierarchyConflict {
                predecessor_id,
                successor_id,
            });
        }
        if let Some(edge) = self.graph.find_edge(pred, succ) {
            self.graph[edge] = relation;
            return Ok(());
        }
        if let Some(path) = self.path_between(succ, pred) {
            let mut cycle = Vec::with_capacity(path.len() + 1);
            cycle.push(predecessor_id);
            cycle.extend(path.into_iter().map(|node| self.graph[node]));
            return Err(GraphError::Cycle { cycle });
        }

        self.graph.add_edge(pred, succ, relation);
        Ok(())
    }

    pub fn add_relation(&mut self, relation: Relation) -> Result<(), GraphError> {
        self.add_edge(
            relation.predecessor_id,
            relation.successor_id,
            relation.relation_type,
            relation.lag_days,
        )
    }

    /// Remove the edge between two tasks, returning it if it existed.
    pub fn remove_edge(
        &mut self,
        predecessor_id: TaskId,
        successor_id: TaskId,
    ) -> Result<Option<Relation>, GraphError> {
        let pred = self.node(predecessor_id)?;
        let succ = self.node(successor_id)?;
        Ok(self
            .graph
            .find_edge(pred, succ)
            .and_then(|edge| self.graph.remove_edge(edge)))
    }

    /// Every relation, ordered by predecessor then successor.
    pub fn relations(&self) -> Vec<Relation> {
        let mut relations: Vec<Relation> = self.graph.edge_weights().copied().collect();
        relations.sort_by_key(|rel| (rel.predecessor_id, rel.successor_id));
        relations
    }

    pub fn relation(&self, predecessor_id: TaskId, successor_id: TaskId) -> Option<Relation> {
        let pred = self.index.get(&predecessor_id)?;
        let succ = self.index.get(&successor_id)?;
        self.graph
            .find_edge(*pred, *succ)
            .map(|edge| self.graph[edge])
    }

    pub fn predecessors(&self, task_id: TaskId) -> Vec<Relation> {
        self.relations_directed(task_id, Direction::Incoming)
    }

    pub fn successors(&self, task_id: TaskId) -> Vec<Relation> {
        self.relations_directed(task_id, Direction::Outgoing)
    }

    fn relations_directed(&self, task_id: TaskId, direction: Direction) -> Vec<Relation> {
        let Some(node) = self.index.get(&task_id) else {
            return Vec::new();
        };
        let mut relations: Vec<Relation> = self
            .graph
            .edges_directed(*node, direction)
            .map(|edge| *edge.weight())
            .collect();
        relations.sort_by_key(|rel| (rel.predecessor_id, rel.successor_id));
        relations
    }

    pub fn has_predecessors(&self, task_id: TaskId) -> bool {
        self.index.get(&task_id).is_some_and(|node| {
            self.graph
                .neighbors_directed(*node, Direction::Incoming)
                .next()
                .is_some()
        })
    }

    pub fn has_relations(&self, task_id: TaskId) -> bool {
        self.index.get(&task_id).is_some_and(|node| {
            self.graph
                .neighbors_undirected(*node)
                .next()
                .is_some()
        })
    }

    /// Task ids with every predecessor ahead of its successors.
    pub fn topological_order(&self) -> Result<Vec<TaskId>, GraphError> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order.into_iter().map(|node| self.graph[node]).collect()),
            Err(cycle) => Err(GraphError::Cycle {
                cycle: self.describe_cycle(cycle.node_id()),
            }),
        }
    }

    fn describe_cycle(&self, start: NodeIndex) -> Vec<TaskId> {
        let component = tarjan_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.contains(&start))
            .unwrap_or_else(|| vec![start]);
        let members: HashSet<NodeIndex> = component.into_iter().collect();

        let next = self
            .graph
            .neighbors_directed(start, Direction::Outgoing)
            .find(|node| members.contains(node));
        let mut cycle = vec![self.graph[start]];
        if let Some(path) = next.and_then(|next| self.path_between(next, start)) {
            cycle.extend(path.into_iter().map(|node| self.graph[node]));
        }
        cycle
    }

    // Breadth-first search over precedence edges; the path includes both ends.
    fn path_between(&self, from: NodeIndex, to: NodeIndex) -> Option<Vec<NodeIndex>> {
        let mut came_from: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        let mut seen = HashSet::from([from]);

        while let Some(node) = queue.pop_front() {
            if node == to {
                let mut path = vec![to];
                let mut current = to;
                while let Some(prev) = came_from.get(&current) {
                    path.push(*prev);
                    current = *prev;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if seen.insert(next) {
                    came_from.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    pub fn children_of(&self, task_id: TaskId) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|task| task.parent_id == Some(task_id))
            .map(|task| task.id)
            .collect()
    }

    /// Parent chain of a task, nearest first. Stops at a missing parent.
    pub fn ancestors_of(&self, task_id: TaskId) -> Vec<TaskId> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::from([task_id]);
        let mut current = self.task(task_id).and_then(|task| task.parent_id);
        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                break;
            }
            ancestors.push(parent_id);
            current = self.task(parent_id).and_then(|task| task.parent_id);
        }
        ancestors
    }

    pub fn is_ancestor(&self, candidate: TaskId, task_id: TaskId) -> bool {
        self.ancestors_of(task_id).contains(&candidate)
    }

    fn check_parent(&self, task_id: TaskId, parent_id: TaskId) -> Result<(), GraphError> {
        if !self.contains(parent_id) {
            return Err(GraphError::UnknownTask(parent_id));
        }
        if parent_id == task_id || self.is_ancestor(task_id, parent_id) {
            return Err(GraphError::HierarchyCycle { task_id, parent_id });
        }
        Ok(())
    }

    /// Move a task under a new parent, or to the top level with `None`.
    pub fn set_parent(
        &mut self,
        task_id: TaskId,
        parent_id: Option<TaskId>,
    ) -> Result<(), GraphError> {
        let node = self.node(task_id)?;
        if let Some(parent_id) = parent_id {
            self.check_parent(task_id, parent_id)?;
        }

        let previous = std::mem::replace(&mut self.tasks[node.index()].parent_id, parent_id);
        if let Err(err) = self.check_relations_against_hierarchy() {
            self.tasks[node.index()].parent_id = previous;
            return Err(err);
        }
        Ok(())
    }

    fn check_relations_against_hierarchy(&self) -> Result<(), GraphError> {
        match self.relations().into_iter().find(|rel| {
            self.is_ancestor(rel.predecessor_id, rel.successor_id)
                || self.is_ancestor(rel.successor_id, rel.predecessor_id)
        }) {
            Some(relation) => Err(GraphError::HierarchyConflict {
                predecessor_id: relation.predecessor_id,
                successor_id: relation.successor_id,
            }),
            None => Ok(()),
        }
    }

    /// Every parent reference must name a known task and the parent links must not loop.
    pub fn validate_hierarchy(&self) -> Result<(), GraphError> {
        for task in &self.tasks {
            let Some(parent_id) = task.parent_id else {
                continue;
            };
            if !self.contains(parent_id) {
                return Err(GraphError::UnknownTask(parent_id));
            }
            if self.parent_chain_loops(task.id) {
                return Err(GraphError::HierarchyCycle {
                    task_id: task.id,
                    parent_id,
                });
            }
        }
        Ok(())
    }

    fn parent_chain_loops(&self, task_id: TaskId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.task(task_id).and_then(|task| task.parent_id);
        while let Some(parent_id) = current {
            if parent_id == task_id {
                return true;
            }
            if !seen.insert(parent_id) {
                return false;
            }
            current = self.task(parent_id).and_then(|task| task.parent_id);
        }
        false
    }

    /// Depth of a task in the hierarchy; top-level tasks are at depth 0.
    pub fn depth_of(&self, task_id: TaskId) -> usize {
        self.ancestors_of(task_id).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> TaskGraph {
        let mut graph = TaskGraph::new();
        for id in 1..=3 {
            graph.add_task(Task::new(id, format!("T{id}"), 1)).unwrap();
        }
        graph.add_edge(1, 2, RelationType::FinishToStart, 0).unwrap();
        graph.add_edge(2, 3, RelationType::FinishToStart, 0).unwrap();
        graph
    }

    #[test]
    fn arena_positions_match_node_indices() {
        let graph = chain();
        for (pos, task) in graph.tasks().iter().enumerate() {
            assert_eq!(graph.index[&task.id].index(), pos);
        }
    }

    #[test]
    fn readding_a_pair_replaces_type_and_lag() {
        let mut graph = chain();
        graph.add_edge(1, 2, RelationType::StartToStart, 2).unwrap();
        assert_eq!(graph.relations().len(), 2);
        assert_eq!(
            graph.relation(1, 2),
            Some(Relation::new(1, 2, RelationType::StartToStart, 2))
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = chain();
        assert_eq!(
            graph.add_edge(2, 2, RelationType::FinishToStart, 0),
            Err(GraphError::Cycle { cycle: vec![2, 2] })
        );
    }

    #[test]
    fn ancestors_stop_on_a_parent_loop() {
        let mut graph = TaskGraph::new();
        graph.add_task(Task::summary(1, "A").with_parent(2)).unwrap();
        graph.add_task(Task::summary(2, "B").with_parent(1)).unwrap();
        assert_eq!(graph.ancestors_of(1), vec![2]);
        assert!(matches!(
            graph.validate_hierarchy(),
            Err(GraphError::HierarchyCycle { .. })
        ));
    }
}
