use std::collections::{HashMap, HashSet};

use crate::error::ExecutorError;

use super::types::TaskMap;

/// Task dependency graph (DAG)
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    /// Dependency edges: task_id -> list of dependencies
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task_id -> list of tasks that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Insertion order (for stable sorting)
    insertion_order: Vec<String>,
}

impl TaskGraph {
    /// Construct task graph from `(task_id, dependencies)` pairs
    ///
    /// Repeated dependencies of the same task collapse into one edge.
    pub fn from_dependencies<'a, I>(tasks: I) -> Result<Self, ExecutorError>
    where
        I: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut insertion_order = Vec::new();

        for (task_id, dependencies) in tasks {
            if edges.contains_key(task_id) {
                return Err(ExecutorError::DuplicateTaskId(task_id.to_string()));
            }

            let mut unique: Vec<String> = Vec::with_capacity(dependencies.len());
            for dep in dependencies {
                if !unique.contains(dep) {
                    unique.push(dep.clone());
                }
            }

            for dep in &unique {
                reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(task_id.to_string());
            }

            edges.insert(task_id.to_string(), unique);
            insertion_order.push(task_id.to_string());
        }

        Ok(Self {
            edges,
            reverse_edges,
            insertion_order,
        })
    }

    /// Construct task graph from a scheduler task map
    pub fn from_task_map<T, E>(tasks: &TaskMap<T, E>) -> Result<Self, ExecutorError> {
        Self::from_dependencies(
            tasks
                .iter()
                .map(|(id, spec)| (id.as_str(), spec.dependencies.as_slice())),
        )
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }

    /// Task ids in insertion order
    pub fn task_ids(&self) -> &[String] {
        &self.insertion_order
    }

    pub fn dependencies(&self, task_id: &str) -> &[String] {
        self.edges.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents(&self, task_id: &str) -> &[String] {
        self.reverse_edges
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tasks without dependencies, in insertion order
    pub fn roots(&self) -> Vec<String> {
        self.insertion_order
            .iter()
            .filter(|id| self.dependencies(id).is_empty())
            .cloned()
            .collect()
    }

    /// Validate dependency relationships
    pub fn validate(&self) -> Result<(), ExecutorError> {
        // Check all dependencies exist, reporting in insertion order
        for task_id in &self.insertion_order {
            for dep in self.dependencies(task_id) {
                if !self.edges.contains_key(dep) {
                    return Err(ExecutorError::DependencyNotFound {
                        task_id: task_id.clone(),
                        missing_dep: dep.clone(),
                    });
                }
            }
        }

        // Detect circular dependencies
        if let Some(cycle) = self.detect_cycle() {
            return Err(ExecutorError::CircularDependency(cycle));
        }

        Ok(())
    }

    /// Execution stages, each only depending on earlier ones; tasks keep
    /// their input order within a stage.
    pub fn topological_sort(&self) -> Result<Vec<Vec<String>>, ExecutorError> {
        // edges[A] = [B, C] means A depends on B and C
        // In execution graph: B -> A, C -> A
        // So A's in-degree = 2
        let mut in_degree: HashMap<&str, usize> = self
            .edges
            .iter()
            .map(|(task_id, deps)| (task_id.as_str(), deps.len()))
            .collect();

        let mut stages: Vec<Vec<String>> = Vec::new();
        let mut current_stage = self.roots();
        let mut processed = 0;

        while !current_stage.is_empty() {
            processed += current_stage.len();

            let mut next_stage = Vec::new();
            for task_id in &current_stage {
                for dependent in self.dependents(task_id) {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            next_stage.push(dependent.clone());
                        }
                    }
                }
            }

            // Preserve input order
            next_stage.sort_by_key(|id| self.position(id));

            stages.push(std::mem::replace(&mut current_stage, next_stage));
        }

        // Verify all nodes processed (no cycles)
        if processed != self.len() {
            return Err(ExecutorError::CircularDependency(
                "Unable to complete topological sort (cycle detected)".to_string(),
            ));
        }

        Ok(stages)
    }

    fn position(&self, task_id: &str) -> usize {
        self.insertion_order
            .iter()
            .position(|k| k == task_id)
            .unwrap_or(usize::MAX)
    }

    /// First cycle found, as `a -> b -> a`
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task_id in &self.insertion_order {
            if !visited.contains(task_id) && self.dfs_cycle(task_id, &mut visited, &mut stack) {
                return Some(format_cycle_path(&stack));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        for dep in self.dependencies(node) {
            // Dependency already on the current path
            if let Some(pos) = stack.iter().position(|x| x == dep) {
                stack.push(dep.clone());
                *stack = stack[pos..].to_vec();
                return true;
            }

            if !visited.contains(dep) && self.dfs_cycle(dep, visited, stack) {
                return true;
            }
        }

        stack.pop();
        false
    }
}

fn format_cycle_path(stack: &[String]) -> String {
    stack.join(" -> ")
}
