//! Hardware-requirement estimation.
//!
//! Derives the CPU and memory reservation a step needs on a resource from
//! its dry-run performance samples. CPU follows the midpoint of the mean
//! and peak observed usage; memory follows the observed peak. Both are
//! widened by the configurable headroom factors of
//! [`EstimatorConfig`](super::EstimatorConfig).

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EstimatorConfig;
use crate::error::ScheduleError;
use crate::models::{DryRunData, NetworkGraph, Pipeline, ResourceId, StepId};

/// The reservation a step needs on a specific resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepHardwareRequirement {
    /// Step the requirement is for.
    pub step: StepId,
    /// Resource the requirement is for.
    pub resource: ResourceId,
    /// Required CPU reservation in cores.
    pub cpu_cores: f64,
    /// Required memory reservation in bytes.
    pub memory_bytes: f64,
}

/// Estimates hardware requirements from dry-run performance samples.
pub struct HardwareEstimator<'a> {
    pipeline: &'a Pipeline,
    graph: &'a NetworkGraph,
    dry_runs: &'a DryRunData,
    config: EstimatorConfig,
}

impl<'a> HardwareEstimator<'a> {
    /// Creates an estimator over the given read-only inputs.
    pub fn new(
        pipeline: &'a Pipeline,
        graph: &'a NetworkGraph,
        dry_runs: &'a DryRunData,
        config: EstimatorConfig,
    ) -> Self {
        Self {
            pipeline,
            graph,
            dry_runs,
            config,
        }
    }

    /// Estimates the reservation for a (step, resource) pair.
    ///
    /// CPU: mean over samples of (avg + peak)/2 percent, converted to
    /// cores, times `cpu_headroom`. Memory: peak over samples of
    /// `max_mem_mb`, times `memory_headroom`.
    ///
    /// Fails with [`ScheduleError::InsufficientSamples`] when the pair has
    /// no performance sample.
    pub fn estimate(
        &self,
        step: StepId,
        resource: ResourceId,
    ) -> Result<StepHardwareRequirement, ScheduleError> {
        let samples: Vec<_> = self.dry_runs.performance_for(step, resource).collect();
        if samples.is_empty() {
            return Err(ScheduleError::InsufficientSamples {
                step: self.pipeline.step_name(step).to_string(),
                resource: self.graph.resource_name(resource).to_string(),
            });
        }

        let cpu_pct_sum: f64 = samples
            .iter()
            .map(|s| (s.avg_cpu_pct + s.max_cpu_pct) / 2.0)
            .sum();
        let cpu_cores = cpu_pct_sum / samples.len() as f64 / 100.0 * self.config.cpu_headroom;

        let peak_mem_mb = samples
            .iter()
            .map(|s| s.max_mem_mb)
            .fold(0.0_f64, f64::max);
        let memory_bytes = peak_mem_mb * 1e6 * self.config.memory_headroom;

        debug!(
            step = self.pipeline.step_name(step),
            resource = self.graph.resource_name(resource),
            cpu_cores,
            memory_bytes,
            "estimated hardware requirement"
        );

        Ok(StepHardwareRequirement {
            step,
            resource,
            cpu_cores,
            memory_bytes,
        })
    }
}
