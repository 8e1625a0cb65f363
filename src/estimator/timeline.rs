//! Timeline estimation.
//!
//! Predicts how long one placement of a step will take on a resource,
//! given where its upstream data lives. An estimation decomposes into
//! provisioning (container pull + instance start), data transmission from
//! the producer resource, and processing, and comes in two flavors:
//!
//! - **Producer** — the step has no asynchronous parent. Its work is a
//!   closed-form function of the pipeline input volume: it emits a known
//!   number of outputs at a constant per-output rate.
//! - **Consumer** — the step drains an asynchronous parent. Its work is
//!   parameterized by the number of inputs this instance will actually
//!   process, which is exactly what shrinks when the step is replicated.
//!
//! All predictions are deterministic linear extrapolations of the dry-run
//! throughput ratios.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::models::{DryRunData, NetworkGraph, Pipeline, ResourceId, StepId};

/// Variant-specific timing of an estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EstimationKind {
    /// Step without an asynchronous parent; emits `outputs` results at a
    /// constant rate.
    Producer {
        /// Seconds to produce one output.
        avg_output_seconds: f64,
        /// Outputs emitted at the operating input volume.
        outputs: u64,
    },
    /// Step draining an asynchronous parent; processes `inputs` messages.
    Consumer {
        /// Seconds to process one input.
        avg_input_seconds: f64,
        /// Inputs this instance will process.
        inputs: u64,
        /// Outputs this instance will emit.
        outputs: u64,
    },
}

/// Predicted execution timeline of one step placement.
///
/// Parameterized by (step, consumer resource, producer resource): the
/// transmission component depends on where the upstream data lives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepTimelineEstimation {
    /// Estimated step.
    pub step: StepId,
    /// Resource the step would run on.
    pub resource: ResourceId,
    /// Resource its input data comes from (equals `resource` for steps
    /// without upstream data movement).
    pub producer_resource: ResourceId,
    /// Container pull + instance start time in seconds.
    pub provisioning_seconds: f64,
    /// Total input transmission time in seconds.
    pub transfer_seconds: f64,
    /// Bytes moved from the producer resource.
    pub transmitted_bytes: f64,
    /// Producer or consumer timing.
    pub kind: EstimationKind,
}

impl StepTimelineEstimation {
    /// Container pull + instance start time in seconds.
    #[inline]
    pub fn provisioning_and_deployment_time(&self) -> f64 {
        self.provisioning_seconds
    }

    /// Total input transmission time in seconds.
    #[inline]
    pub fn data_transmission_time(&self) -> f64 {
        self.transfer_seconds
    }

    /// Total processing time in seconds.
    pub fn step_processing_time(&self) -> f64 {
        match self.kind {
            EstimationKind::Producer {
                avg_output_seconds,
                outputs,
            } => avg_output_seconds * outputs as f64,
            EstimationKind::Consumer {
                avg_input_seconds,
                inputs,
                ..
            } => avg_input_seconds * inputs as f64,
        }
    }

    /// Total event duration: provisioning + transmission + processing.
    pub fn total_time(&self) -> f64 {
        self.provisioning_and_deployment_time()
            + self.data_transmission_time()
            + self.step_processing_time()
    }

    /// Position, relative to the event start, at which the k-th output
    /// becomes available. Consumers report their full duration; only
    /// producers emit results before finishing.
    pub fn time_to_output(&self, k: u32) -> f64 {
        match self.kind {
            EstimationKind::Producer {
                avg_output_seconds, ..
            } => {
                self.provisioning_and_deployment_time()
                    + self.data_transmission_time()
                    + avg_output_seconds * k as f64
            }
            EstimationKind::Consumer { .. } => self.total_time(),
        }
    }

    /// Inputs this instance covers. Producers consume their input volume
    /// as a single batch.
    pub fn number_of_transmitted_inputs(&self) -> u64 {
        match self.kind {
            EstimationKind::Producer { .. } => 1,
            EstimationKind::Consumer { inputs, .. } => inputs,
        }
    }

    /// Outputs this instance emits.
    pub fn number_of_produced_outputs(&self) -> u64 {
        match self.kind {
            EstimationKind::Producer { outputs, .. } => outputs,
            EstimationKind::Consumer { outputs, .. } => outputs,
        }
    }

    /// Re-derives a consumer estimation for a reduced input share, keeping
    /// the per-input and deployment components intact. Transmission scales
    /// with the share. `None` for producers, which do not scale.
    pub fn with_input_share(&self, share: u64) -> Option<Self> {
        match self.kind {
            EstimationKind::Producer { .. } => None,
            EstimationKind::Consumer {
                avg_input_seconds,
                inputs,
                ..
            } => {
                let ratio = share as f64 / inputs.max(1) as f64;
                Some(Self {
                    transfer_seconds: self.transfer_seconds * ratio,
                    transmitted_bytes: self.transmitted_bytes * ratio,
                    kind: EstimationKind::Consumer {
                        avg_input_seconds,
                        inputs: share,
                        outputs: share,
                    },
                    ..*self
                })
            }
        }
    }
}

/// Sample-averaged throughput ratios of a (step, resource) pair.
struct ThroughputProfile {
    per_input_bytes: f64,
    per_input_seconds: f64,
    per_output_seconds: f64,
    outputs_per_input: f64,
}

/// Estimates step timelines from dry-run samples, aware of where the
/// upstream data lives (the scheduling context).
pub struct TimelineEstimator<'a> {
    pipeline: &'a Pipeline,
    graph: &'a NetworkGraph,
    dry_runs: &'a DryRunData,
}

impl<'a> TimelineEstimator<'a> {
    /// Creates an estimator over the given read-only inputs.
    pub fn new(pipeline: &'a Pipeline, graph: &'a NetworkGraph, dry_runs: &'a DryRunData) -> Self {
        Self {
            pipeline,
            graph,
            dry_runs,
        }
    }

    /// Estimates the timeline of `step` on `resource` with its input data
    /// on `producer_resource`, at `input_volume_mb` megabytes of pipeline
    /// input.
    ///
    /// Fails with [`ScheduleError::InsufficientSamples`] when the pair has
    /// no throughput sample, or when the two resources are distinct but
    /// share no network edge.
    pub fn estimate(
        &self,
        step: StepId,
        resource: ResourceId,
        producer_resource: ResourceId,
        input_volume_mb: f64,
    ) -> Result<StepTimelineEstimation, ScheduleError> {
        let profile = self.throughput_profile(step, resource)?;

        let volume_bytes = input_volume_mb * 1e6;
        let expected_inputs = ((volume_bytes / profile.per_input_bytes).ceil() as u64).max(1);
        let expected_outputs =
            ((expected_inputs as f64 * profile.outputs_per_input).ceil() as u64).max(1);

        let transmitted_bytes = profile.per_input_bytes * expected_inputs as f64;
        let transfer_seconds = self
            .graph
            .transfer_seconds(producer_resource, resource, transmitted_bytes)
            .ok_or_else(|| ScheduleError::InsufficientSamples {
                step: self.pipeline.step_name(step).to_string(),
                resource: self.graph.resource_name(resource).to_string(),
            })?;

        let kind = if self.pipeline.asynchronous_parent_of(step).is_some() {
            EstimationKind::Consumer {
                avg_input_seconds: profile.per_input_seconds,
                inputs: expected_inputs,
                outputs: expected_outputs,
            }
        } else {
            EstimationKind::Producer {
                avg_output_seconds: profile.per_output_seconds,
                outputs: expected_outputs,
            }
        };

        Ok(StepTimelineEstimation {
            step,
            resource,
            producer_resource,
            provisioning_seconds: self.provisioning_seconds(step, resource),
            transfer_seconds,
            transmitted_bytes,
            kind,
        })
    }

    /// Mean provisioning + deployment time; 0 when no deployment sample
    /// was recorded (pre-pulled images).
    fn provisioning_seconds(&self, step: StepId, resource: ResourceId) -> f64 {
        let samples: Vec<_> = self.dry_runs.deployments_for(step, resource).collect();
        if samples.is_empty() {
            return 0.0;
        }
        samples
            .iter()
            .map(|s| s.avg_download_seconds + s.avg_instance_start_seconds)
            .sum::<f64>()
            / samples.len() as f64
    }

    fn throughput_profile(
        &self,
        step: StepId,
        resource: ResourceId,
    ) -> Result<ThroughputProfile, ScheduleError> {
        let samples: Vec<_> = self.dry_runs.metrics_for(step, resource).collect();
        if samples.is_empty() {
            return Err(ScheduleError::InsufficientSamples {
                step: self.pipeline.step_name(step).to_string(),
                resource: self.graph.resource_name(resource).to_string(),
            });
        }

        let n = samples.len() as f64;
        let mut per_input_bytes = 0.0;
        let mut per_input_seconds = 0.0;
        let mut per_output_seconds = 0.0;
        let mut outputs_per_input = 0.0;
        for s in &samples {
            let inputs = s.num_inputs.max(1) as f64;
            let outputs = s.num_outputs.max(1) as f64;
            per_input_bytes += s.input_bytes / inputs;
            per_input_seconds += s.step_processing_ms / 1e3 / inputs;
            per_output_seconds += s.step_processing_ms / 1e3 / outputs;
            outputs_per_input += outputs / inputs;
        }

        Ok(ThroughputProfile {
            per_input_bytes: (per_input_bytes / n).max(1.0),
            per_input_seconds: per_input_seconds / n,
            per_output_seconds: per_output_seconds / n,
            outputs_per_input: outputs_per_input / n,
        })
    }
}
