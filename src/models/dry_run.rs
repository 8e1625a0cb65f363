//! Dry-run measurement model.
//!
//! A dry run executes a single pipeline step on a single resource with a
//! small probe volume and records what the estimator needs: throughput
//! (inputs/outputs and their sizes), processing and transmission times,
//! CPU and memory footprints, and container provisioning times. The
//! scheduler never touches live infrastructure; all predictions are
//! derived from these samples.
//!
//! Read-only after load.

use serde::{Deserialize, Serialize};

use super::{ResourceId, StepId};

/// One throughput measurement of a step on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepMetricsSample {
    /// Identifier of the dry run this sample belongs to.
    pub dry_run_id: String,
    /// Capture time, seconds since the epoch.
    pub timestamp: i64,
    /// Measured step.
    pub step: StepId,
    /// Resource the step ran on.
    pub resource: ResourceId,
    /// Inputs consumed during the run.
    pub num_inputs: u64,
    /// Total size of consumed inputs in bytes.
    pub input_bytes: f64,
    /// Outputs produced during the run.
    pub num_outputs: u64,
    /// Total size of produced outputs in bytes.
    pub output_bytes: f64,
    /// Wall time spent processing, in milliseconds.
    pub step_processing_ms: f64,
    /// Wall time spent receiving input data, in milliseconds.
    pub data_transmission_ms: f64,
}

/// One hardware-footprint measurement of a step on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepPerformanceSample {
    /// Identifier of the dry run this sample belongs to.
    pub dry_run_id: String,
    /// Capture time, seconds since the epoch.
    pub timestamp: i64,
    /// Measured step.
    pub step: StepId,
    /// Resource the step ran on.
    pub resource: ResourceId,
    /// Peak CPU usage, percent of one core.
    pub max_cpu_pct: f64,
    /// Mean CPU usage, percent of one core.
    pub avg_cpu_pct: f64,
    /// Peak memory usage in megabytes.
    pub max_mem_mb: f64,
}

/// Provisioning measurements of a step's container on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSample {
    /// Measured step.
    pub step: StepId,
    /// Resource the image was deployed to.
    pub resource: ResourceId,
    /// Mean image download time in seconds.
    pub avg_download_seconds: f64,
    /// Mean time from image ready to first running instance, in seconds.
    pub avg_instance_start_seconds: f64,
}

/// All dry-run tables, indexed by (step, resource) on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DryRunData {
    /// Throughput samples (`step_metrics` table).
    pub step_metrics: Vec<StepMetricsSample>,
    /// Hardware-footprint samples (`step_performance_metrics` table).
    pub performance: Vec<StepPerformanceSample>,
    /// Provisioning samples (`deployment_metrics` table).
    pub deployments: Vec<DeploymentSample>,
}

impl DryRunData {
    /// Creates an empty sample set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Throughput samples for a (step, resource) pair.
    pub fn metrics_for(
        &self,
        step: StepId,
        resource: ResourceId,
    ) -> impl Iterator<Item = &StepMetricsSample> {
        self.step_metrics
            .iter()
            .filter(move |s| s.step == step && s.resource == resource)
    }

    /// Hardware-footprint samples for a (step, resource) pair.
    pub fn performance_for(
        &self,
        step: StepId,
        resource: ResourceId,
    ) -> impl Iterator<Item = &StepPerformanceSample> {
        self.performance
            .iter()
            .filter(move |s| s.step == step && s.resource == resource)
    }

    /// Provisioning samples for a (step, resource) pair.
    pub fn deployments_for(
        &self,
        step: StepId,
        resource: ResourceId,
    ) -> impl Iterator<Item = &DeploymentSample> {
        self.deployments
            .iter()
            .filter(move |s| s.step == step && s.resource == resource)
    }

    /// Whether any throughput sample covers the pair.
    pub fn covers(&self, step: StepId, resource: ResourceId) -> bool {
        self.metrics_for(step, resource).next().is_some()
    }
}
