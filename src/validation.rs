//! Input validation for scheduling problems.
//!
//! Checks the loaded pipeline, resource graph, dry-run samples, and user
//! constraints for values the engine cannot plan with. Referential
//! integrity (unknown step or resource names) is already enforced at the
//! CSV boundary; what remains here are value-range checks:
//! - non-positive resource capacities
//! - non-positive network bandwidth
//! - dry-run samples without any processed input or output
//! - non-positive deadline, budget, or input volume
//!
//! All issues are collected, not just the first one.

use crate::models::{DryRunData, NetworkGraph, Pipeline};
use crate::scheduler::SchedulerConfig;

/// Validation result: all detected issues, or nothing.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A resource declares zero or negative CPU or memory.
    NonPositiveCapacity,
    /// A network edge declares zero or negative bandwidth.
    NonPositiveBandwidth,
    /// A dry-run sample processed no inputs and produced no outputs.
    EmptySample,
    /// A measured time or usage value is negative.
    NegativeMeasurement,
    /// Deadline, budget, or input volume is not positive.
    NonPositiveConstraint,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the loaded engine inputs.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_inputs(
    pipeline: &Pipeline,
    graph: &NetworkGraph,
    dry_runs: &DryRunData,
) -> ValidationResult {
    let mut errors = Vec::new();

    for id in graph.resource_ids() {
        let resource = graph.resource(id);
        if resource.cpu_cores <= 0.0 || resource.memory_bytes <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveCapacity,
                format!("Resource '{}' has no usable capacity", resource.name),
            ));
        }
        for other in graph.resource_ids() {
            if let Some(edge) = graph.edge(id, other) {
                if edge.bandwidth_bytes_per_sec <= 0.0 {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::NonPositiveBandwidth,
                        format!(
                            "Edge '{}' -> '{}' has no usable bandwidth",
                            resource.name,
                            graph.resource_name(other)
                        ),
                    ));
                }
            }
        }
    }

    for sample in &dry_runs.step_metrics {
        let step = pipeline.step_name(sample.step);
        let resource = graph.resource_name(sample.resource);
        if sample.num_inputs == 0 && sample.num_outputs == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptySample,
                format!("Dry run of '{step}' on '{resource}' moved no data"),
            ));
        }
        if sample.step_processing_ms < 0.0 || sample.data_transmission_ms < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeMeasurement,
                format!("Dry run of '{step}' on '{resource}' has a negative time"),
            ));
        }
    }

    for sample in &dry_runs.performance {
        if sample.avg_cpu_pct < 0.0 || sample.max_cpu_pct < 0.0 || sample.max_mem_mb < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeMeasurement,
                format!(
                    "Performance sample of '{}' on '{}' has a negative usage",
                    pipeline.step_name(sample.step),
                    graph.resource_name(sample.resource)
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the user constraints of a search configuration.
pub fn validate_config(config: &SchedulerConfig) -> ValidationResult {
    let mut errors = Vec::new();
    for (value, name) in [
        (config.deadline_seconds, "deadline"),
        (config.budget_usd, "budget"),
        (config.input_volume_mb, "input volume"),
    ] {
        if !(value > 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveConstraint,
                format!("The {name} must be positive"),
            ));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NetworkEdge, Resource, StepMetricsSample};

    fn sample_inputs() -> (Pipeline, NetworkGraph, DryRunData) {
        let mut pipeline = Pipeline::new();
        let step = pipeline.add_step("slice");
        let mut graph = NetworkGraph::new();
        let fog = graph.add_resource(Resource::new("fog-1", 4.0, 8e9, 0.0));
        let cloud = graph.add_resource(Resource::new("cloud-1", 8.0, 32e9, 0.02));
        graph.add_edge(
            fog,
            cloud,
            NetworkEdge {
                bandwidth_bytes_per_sec: 100e6,
                latency_seconds: 0.01,
                cost_per_gb: 0.09,
            },
        );

        let mut dry_runs = DryRunData::new();
        dry_runs.step_metrics.push(StepMetricsSample {
            dry_run_id: "dr-1".into(),
            timestamp: 1_700_000_000,
            step,
            resource: fog,
            num_inputs: 10,
            input_bytes: 100e6,
            num_outputs: 10,
            output_bytes: 100e6,
            step_processing_ms: 10_000.0,
            data_transmission_ms: 100.0,
        });
        (pipeline, graph, dry_runs)
    }

    #[test]
    fn test_valid_inputs() {
        let (pipeline, graph, dry_runs) = sample_inputs();
        assert!(validate_inputs(&pipeline, &graph, &dry_runs).is_ok());
    }

    #[test]
    fn test_non_positive_capacity() {
        let (pipeline, mut graph, dry_runs) = sample_inputs();
        graph.add_resource(Resource::new("broken", 0.0, 8e9, 0.0));

        let errors = validate_inputs(&pipeline, &graph, &dry_runs).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NonPositiveCapacity));
    }

    #[test]
    fn test_non_positive_bandwidth() {
        let (pipeline, mut graph, dry_runs) = sample_inputs();
        let fog = graph.resource_id("fog-1").unwrap();
        let cloud = graph.resource_id("cloud-1").unwrap();
        graph.add_edge(
            cloud,
            fog,
            NetworkEdge {
                bandwidth_bytes_per_sec: 0.0,
                latency_seconds: 0.01,
                cost_per_gb: 0.0,
            },
        );

        let errors = validate_inputs(&pipeline, &graph, &dry_runs).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NonPositiveBandwidth));
    }

    #[test]
    fn test_empty_sample() {
        let (pipeline, graph, mut dry_runs) = sample_inputs();
        dry_runs.step_metrics[0].num_inputs = 0;
        dry_runs.step_metrics[0].num_outputs = 0;

        let errors = validate_inputs(&pipeline, &graph, &dry_runs).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::EmptySample));
    }

    #[test]
    fn test_negative_measurement() {
        let (pipeline, graph, mut dry_runs) = sample_inputs();
        dry_runs.step_metrics[0].step_processing_ms = -1.0;

        let errors = validate_inputs(&pipeline, &graph, &dry_runs).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NegativeMeasurement));
    }

    #[test]
    fn test_non_positive_constraints() {
        let config = SchedulerConfig::new(0.0, -5.0, 100.0);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::NonPositiveConstraint));

        let config = SchedulerConfig::new(100.0, 10.0, 50.0);
        assert!(validate_config(&config).is_ok());
    }
}
