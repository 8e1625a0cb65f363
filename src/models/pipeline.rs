//! Pipeline model.
//!
//! A pipeline is a directed acyclic graph of processing steps. Each
//! dependency edge is either *synchronous* (the dependent step starts only
//! after the prerequisite has finished) or *asynchronous* (the prerequisite
//! streams outputs and the dependent step may start as soon as the first
//! output is available). A step is *scalable* when at least one incoming
//! dependency is asynchronous and flagged as such.
//!
//! Steps and dependencies live in an arena owned by [`Pipeline`]; all
//! cross-references are stable [`StepId`] indices, so cloning derived
//! structures never deep-copies the graph.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable index of a step inside its [`Pipeline`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepId(usize);

impl StepId {
    /// Arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A processing step, identified by a unique name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique step name.
    pub name: String,
}

/// Flavor of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyKind {
    /// The dependent step starts at or after the prerequisite's end.
    Synchronous,
    /// The prerequisite streams outputs; the dependent step may overlap it.
    Asynchronous,
}

/// A dependency edge between two steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// The step that waits.
    pub dependent: StepId,
    /// The step it waits on.
    pub prerequisite: StepId,
    /// Synchronous or asynchronous flavor.
    pub kind: DependencyKind,
    /// Whether the dependent step may be replicated over this edge.
    pub scalable: bool,
}

/// Error raised when mutating the dependency graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Adding the edge would close a cycle.
    #[error("dependency '{dependent}' -> '{prerequisite}' would create a cycle")]
    CyclicDependency {
        dependent: String,
        prerequisite: String,
    },
}

/// A directed acyclic pipeline of processing steps.
///
/// Read-only once handed to the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipeline {
    steps: Vec<Step>,
    dependencies: Vec<Dependency>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a step, returning its ID. Adding a name twice returns the
    /// existing ID.
    pub fn add_step(&mut self, name: impl Into<String>) -> StepId {
        let name = name.into();
        if let Some(id) = self.step_id(&name) {
            return id;
        }
        self.steps.push(Step { name });
        StepId(self.steps.len() - 1)
    }

    /// Adds a dependency edge. An existing edge between the same pair is
    /// replaced. Fails if the edge would close a cycle.
    pub fn add_dependency(
        &mut self,
        kind: DependencyKind,
        dependent: StepId,
        prerequisite: StepId,
        scalable: bool,
    ) -> Result<(), PipelineError> {
        if self.reaches(dependent, prerequisite) || dependent == prerequisite {
            return Err(PipelineError::CyclicDependency {
                dependent: self.steps[dependent.0].name.clone(),
                prerequisite: self.steps[prerequisite.0].name.clone(),
            });
        }
        self.dependencies
            .retain(|d| !(d.dependent == dependent && d.prerequisite == prerequisite));
        self.dependencies.push(Dependency {
            dependent,
            prerequisite,
            kind,
            scalable,
        });
        Ok(())
    }

    /// Whether `to` is reachable from `from` along dependency edges
    /// (prerequisite direction).
    fn reaches(&self, from: StepId, to: StepId) -> bool {
        let mut stack = vec![from];
        let mut seen = vec![false; self.steps.len()];
        while let Some(step) = stack.pop() {
            if step == to {
                return true;
            }
            if std::mem::replace(&mut seen[step.0], true) {
                continue;
            }
            for dep in self.dependencies.iter().filter(|d| d.dependent == step) {
                stack.push(dep.prerequisite);
            }
        }
        false
    }

    /// The step behind an ID.
    #[inline]
    pub fn step(&self, id: StepId) -> &Step {
        &self.steps[id.0]
    }

    /// Step name shorthand.
    #[inline]
    pub fn step_name(&self, id: StepId) -> &str {
        &self.steps[id.0].name
    }

    /// Looks up a step by name.
    pub fn step_id(&self, name: &str) -> Option<StepId> {
        self.steps.iter().position(|s| s.name == name).map(StepId)
    }

    /// All step IDs in insertion order.
    pub fn step_ids(&self) -> impl Iterator<Item = StepId> + '_ {
        (0..self.steps.len()).map(StepId)
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the pipeline has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All dependency edges.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Incoming dependency edges of a step.
    pub fn prerequisites_of(&self, step: StepId) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(move |d| d.dependent == step)
    }

    /// The asynchronous prerequisite of a step, if any. Pipelines feed a
    /// consumer from a single producer, so the first match is taken.
    pub fn asynchronous_parent_of(&self, step: StepId) -> Option<StepId> {
        self.prerequisites_of(step)
            .find(|d| d.kind == DependencyKind::Asynchronous)
            .map(|d| d.prerequisite)
    }

    /// Whether a step may be replicated: at least one incoming dependency
    /// is asynchronous and marked scalable.
    pub fn is_scalable(&self, step: StepId) -> bool {
        self.prerequisites_of(step)
            .any(|d| d.kind == DependencyKind::Asynchronous && d.scalable)
    }

    /// Splits the pipeline into topological levels (Kahn layering).
    ///
    /// Level 0 holds every step without prerequisites; level i+1 holds the
    /// steps whose prerequisites all sit in levels ≤ i. Steps within a
    /// level are ordered by name so enumeration downstream is
    /// deterministic.
    pub fn levels(&self) -> Vec<Vec<StepId>> {
        let mut assigned: Vec<Option<usize>> = vec![None; self.steps.len()];
        let mut levels: Vec<Vec<StepId>> = Vec::new();
        let mut placed = 0;

        while placed < self.steps.len() {
            let current = levels.len();
            let mut level: Vec<StepId> = Vec::new();
            for id in self.step_ids() {
                if assigned[id.0].is_some() {
                    continue;
                }
                let ready = self
                    .prerequisites_of(id)
                    .all(|d| assigned[d.prerequisite.0].is_some_and(|l| l < current));
                if ready {
                    level.push(id);
                }
            }
            if level.is_empty() {
                // Unreachable on a DAG; guards against a hand-built cycle.
                break;
            }
            for &id in &level {
                assigned[id.0] = Some(current);
                placed += 1;
            }
            level.sort_by(|&a, &b| self.steps[a.0].name.cmp(&self.steps[b.0].name));
            levels.push(level);
        }

        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> (Pipeline, StepId, StepId, StepId, StepId) {
        // src -> left, src -> right, left -> sink, right -> sink
        let mut p = Pipeline::new();
        let src = p.add_step("source");
        let left = p.add_step("left");
        let right = p.add_step("right");
        let sink = p.add_step("sink");
        p.add_dependency(DependencyKind::Synchronous, left, src, false)
            .unwrap();
        p.add_dependency(DependencyKind::Synchronous, right, src, false)
            .unwrap();
        p.add_dependency(DependencyKind::Synchronous, sink, left, false)
            .unwrap();
        p.add_dependency(DependencyKind::Synchronous, sink, right, false)
            .unwrap();
        (p, src, left, right, sink)
    }

    #[test]
    fn test_add_step_dedupes_by_name() {
        let mut p = Pipeline::new();
        let a = p.add_step("prepare");
        let b = p.add_step("prepare");
        assert_eq!(a, b);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_levels_diamond() {
        let (p, src, left, right, sink) = diamond();
        let levels = p.levels();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], vec![src]);
        assert_eq!(levels[1], vec![left, right]); // name order
        assert_eq!(levels[2], vec![sink]);
    }

    #[test]
    fn test_levels_async_consumer_follows_producer() {
        let mut p = Pipeline::new();
        let producer = p.add_step("produce");
        let consumer = p.add_step("consume");
        p.add_dependency(DependencyKind::Asynchronous, consumer, producer, true)
            .unwrap();

        let levels = p.levels();
        assert_eq!(levels, vec![vec![producer], vec![consumer]]);
    }

    #[test]
    fn test_scalable_requires_async_and_flag() {
        let mut p = Pipeline::new();
        let a = p.add_step("a");
        let b = p.add_step("b");
        let c = p.add_step("c");
        p.add_dependency(DependencyKind::Asynchronous, b, a, true)
            .unwrap();
        p.add_dependency(DependencyKind::Synchronous, c, a, true)
            .unwrap();

        assert!(p.is_scalable(b));
        assert!(!p.is_scalable(c)); // synchronous edge never scales
        assert!(!p.is_scalable(a));
        assert_eq!(p.asynchronous_parent_of(b), Some(a));
        assert_eq!(p.asynchronous_parent_of(c), None);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut p = Pipeline::new();
        let a = p.add_step("a");
        let b = p.add_step("b");
        p.add_dependency(DependencyKind::Synchronous, b, a, false)
            .unwrap();
        let err = p
            .add_dependency(DependencyKind::Synchronous, a, b, false)
            .unwrap_err();
        assert!(matches!(err, PipelineError::CyclicDependency { .. }));
        // Self-edges are cycles too.
        assert!(p
            .add_dependency(DependencyKind::Synchronous, a, a, false)
            .is_err());
    }

    #[test]
    fn test_replacing_dependency_keeps_single_edge() {
        let mut p = Pipeline::new();
        let a = p.add_step("a");
        let b = p.add_step("b");
        p.add_dependency(DependencyKind::Synchronous, b, a, false)
            .unwrap();
        p.add_dependency(DependencyKind::Asynchronous, b, a, true)
            .unwrap();

        let deps: Vec<_> = p.prerequisites_of(b).collect();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].kind, DependencyKind::Asynchronous);
        assert!(p.is_scalable(b));
    }

    #[test]
    fn test_empty_pipeline_has_no_levels() {
        let p = Pipeline::new();
        assert!(p.is_empty());
        assert!(p.levels().is_empty());
    }
}
