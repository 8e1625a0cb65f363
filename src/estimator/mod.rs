//! Prediction layer of the scheduler.
//!
//! Turns dry-run measurements into the deterministic per-placement
//! predictions the candidate search consumes:
//!
//! - **`hardware`**: CPU/memory reservations per (step, resource)
//! - **`timeline`**: execution timelines per (step, consumer resource,
//!   producer resource), in producer and consumer variants
//!
//! [`EstimationCache`] memoizes every derivable prediction once, before
//! the search starts; it is read-only afterwards and shared by all search
//! workers. Pairs without dry-run coverage are simply absent, and the
//! search treats them as unavailable placements.

mod hardware;
mod timeline;

pub use hardware::{HardwareEstimator, StepHardwareRequirement};
pub use timeline::{EstimationKind, StepTimelineEstimation, TimelineEstimator};

use std::collections::HashMap;

use tracing::info;

use crate::models::{DryRunData, NetworkGraph, Pipeline, ResourceId, StepId};

/// Tunable safety factors applied on top of observed dry-run usage.
///
/// The exact widening of observed usage into reservations is deployment
/// policy, so both factors are exposed rather than fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    /// Multiplier on the estimated CPU reservation.
    pub cpu_headroom: f64,
    /// Multiplier on the estimated memory reservation.
    pub memory_headroom: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            cpu_headroom: 1.0,
            memory_headroom: 1.0,
        }
    }
}

/// All estimations the search may need, computed once up front.
#[derive(Debug, Clone, Default)]
pub struct EstimationCache {
    timelines: HashMap<(StepId, ResourceId, ResourceId), StepTimelineEstimation>,
    hardware: HashMap<(StepId, ResourceId), StepHardwareRequirement>,
}

impl EstimationCache {
    /// Builds the cache for every (step, consumer resource, producer
    /// resource) triple that the dry runs cover. Uncovered pairs are
    /// skipped, not errors: their absence marks the placement as
    /// unavailable.
    pub fn build(
        pipeline: &Pipeline,
        graph: &NetworkGraph,
        dry_runs: &DryRunData,
        input_volume_mb: f64,
        config: EstimatorConfig,
    ) -> Self {
        let timeline_estimator = TimelineEstimator::new(pipeline, graph, dry_runs);
        let hardware_estimator = HardwareEstimator::new(pipeline, graph, dry_runs, config);

        let mut cache = Self::default();
        for step in pipeline.step_ids() {
            for resource in graph.resource_ids() {
                if let Ok(req) = hardware_estimator.estimate(step, resource) {
                    cache.hardware.insert((step, resource), req);
                }
                for producer in graph.resource_ids() {
                    if let Ok(est) =
                        timeline_estimator.estimate(step, resource, producer, input_volume_mb)
                    {
                        cache.timelines.insert((step, resource, producer), est);
                    }
                }
            }
        }

        info!(
            timelines = cache.timelines.len(),
            hardware = cache.hardware.len(),
            "estimation cache built"
        );
        cache
    }

    /// Timeline estimation for a (step, consumer, producer) triple.
    pub fn timeline(
        &self,
        step: StepId,
        resource: ResourceId,
        producer_resource: ResourceId,
    ) -> Option<&StepTimelineEstimation> {
        self.timelines.get(&(step, resource, producer_resource))
    }

    /// Hardware requirement for a (step, resource) pair.
    pub fn hardware(
        &self,
        step: StepId,
        resource: ResourceId,
    ) -> Option<&StepHardwareRequirement> {
        self.hardware.get(&(step, resource))
    }

    /// Whether a step can be placed somewhere: both a timeline estimation
    /// and a hardware requirement exist for at least one resource.
    pub fn placeable(&self, step: StepId, graph: &NetworkGraph) -> bool {
        graph.resource_ids().any(|r| {
            self.hardware(step, r).is_some() && self.timeline(step, r, r).is_some()
        })
    }
}
