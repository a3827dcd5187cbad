//! Task dependency graph management using petgraph.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{Error, Result};
use crate::task::Task;

/// Directed acyclic graph of tasks and their prerequisites.
///
/// Construction fails if a prerequisite names an undeclared task or if the
/// prerequisites form a cycle, so no task body can run against an invalid graph.
#[derive(Debug)]
pub struct TaskGraph<C> {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    tasks: Vec<Task<C>>,
}

impl<C> TaskGraph<C> {
    /// Creates a task graph from a list of tasks.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for duplicate names, unknown
    /// prerequisites, or circular dependencies.
    pub fn new(tasks: Vec<Task<C>>) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for task in &tasks {
            if node_map.contains_key(task.name()) {
                return Err(Error::DuplicateTask(task.name().to_string()));
            }
            let node = graph.add_node(task.name().to_string());
            node_map.insert(task.name().to_string(), node);
        }

        let available = tasks
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ");

        for task in &tasks {
            let from_node = node_map[task.name()];

            for dep_name in task.prerequisites() {
                if dep_name == task.name() {
                    return Err(Error::CircularDependency(dep_name.clone()));
                }
                let to_node =
                    node_map
                        .get(dep_name)
                        .ok_or_else(|| Error::MissingPrerequisite {
                            name: dep_name.clone(),
                            required_by: task.name().to_string(),
                            available: available.clone(),
                        })?;

                graph.add_edge(from_node, *to_node, ());
            }
        }

        toposort(&graph, None).map_err(|cycle| {
            Error::CircularDependency(graph[cycle.node_id()].clone())
        })?;

        Ok(Self {
            graph,
            node_map,
            tasks,
        })
    }

    /// Retrieves a task by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Task<C>> {
        self.node_map
            .get(name)
            .map(|idx| &self.tasks[idx.index()])
    }

    /// Returns every task in declaration order.
    pub fn tasks(&self) -> &[Task<C>] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn available(&self) -> String {
        self.tasks
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn require(&self, name: &str) -> Result<&Task<C>> {
        self.get(name).ok_or_else(|| Error::TaskNotFound {
            name: name.to_string(),
            available: self.available(),
        })
    }

    /// Returns direct prerequisites of a task, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is not found in the graph.
    pub fn prerequisites(&self, name: &str) -> Result<&[String]> {
        Ok(self.require(name)?.prerequisites())
    }

    /// Returns direct dependents of a task (tasks that list it as a prerequisite).
    ///
    /// # Errors
    ///
    /// Returns an error if the task is not found in the graph.
    pub fn dependents(&self, name: &str) -> Result<Vec<String>> {
        self.require(name)?;
        let node = self.node_map[name];

        let mut dependents: Vec<String> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|idx| self.graph[idx].clone())
            .collect();
        dependents.sort();
        dependents.dedup();
        Ok(dependents)
    }

    /// Returns the order in which `root` and its transitive prerequisites run.
    ///
    /// Prerequisites are visited depth-first in declaration order and every
    /// task appears once, however many paths reach it. `root` is always last.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] if `root` is not declared.
    pub fn execution_order(&self, root: &str) -> Result<Vec<String>> {
        self.require(root)?;

        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();

        fn visit<C>(
            graph: &TaskGraph<C>,
            name: &str,
            order: &mut Vec<String>,
            visited: &mut HashSet<String>,
            visiting: &mut HashSet<String>,
        ) -> Result<()> {
            if visited.contains(name) {
                return Ok(());
            }
            if !visiting.insert(name.to_string()) {
                return Err(Error::CircularDependency(name.to_string()));
            }

            let task = graph.require(name)?;
            for dep in task.prerequisites() {
                visit(graph, dep, order, visited, visiting)?;
            }

            visiting.remove(name);
            visited.insert(name.to_string());
            order.push(name.to_string());
            Ok(())
        }

        visit(self, root, &mut order, &mut visited, &mut visiting)?;
        Ok(order)
    }
}
