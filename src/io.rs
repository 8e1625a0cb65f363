//! CSV ingestion and timeline serialization.
//!
//! The engine itself only sees arena-indexed models; this module is the
//! boundary where names in CSV files are resolved against the pipeline
//! and resource arenas. Every reader takes an `origin` label so failures
//! point at the offending file.
//!
//! Formats:
//!
//! | file | columns |
//! |------|---------|
//! | pipeline | `step, prerequisite, kind, scalable` (blank prerequisite declares a root step) |
//! | resources | `name, cpu_cores, memory_bytes, cost_per_second` |
//! | network | `source, target, bandwidth_bytes_per_sec, latency_ms, cost_per_gb` |
//! | step metrics | `dry_run_id, timestamp, step, resource, num_inputs, input_bytes, num_outputs, output_bytes, step_processing_ms, data_transmission_ms` |
//! | performance metrics | `dry_run_id, timestamp, step, resource, max_cpu_pct, avg_cpu_pct, max_mem_mb` |
//! | deployment metrics | `step, resource, avg_download_seconds, avg_instance_start_seconds` |
//! | timeline (output) | `step, start_position_seconds, end_position_seconds, resource, cpu_reservation, memory_reservation` |

use std::io::{Read, Write};

use serde::Deserialize;

use crate::error::InputError;
use crate::models::{
    DependencyKind, DeploymentSample, DryRunData, NetworkEdge, NetworkGraph, Pipeline, Resource,
    ResourceId, StepId, StepMetricsSample, StepPerformanceSample,
};
use crate::timeline::{Timeline, TimelineRow};

fn csv_error(origin: &str, source: csv::Error) -> InputError {
    InputError::Csv {
        path: origin.to_string(),
        source,
    }
}

fn resolve_step(pipeline: &Pipeline, origin: &str, name: &str) -> Result<StepId, InputError> {
    pipeline.step_id(name).ok_or_else(|| InputError::UnknownStep {
        path: origin.to_string(),
        name: name.to_string(),
    })
}

fn resolve_resource(
    graph: &NetworkGraph,
    origin: &str,
    name: &str,
) -> Result<ResourceId, InputError> {
    graph
        .resource_id(name)
        .ok_or_else(|| InputError::UnknownResource {
            path: origin.to_string(),
            name: name.to_string(),
        })
}

#[derive(Debug, Deserialize)]
struct PipelineRecord {
    step: String,
    #[serde(default)]
    prerequisite: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    scalable: String,
}

/// Loads the pipeline descriptor. Rows with a blank prerequisite declare
/// a root step; all other rows declare a dependency edge.
pub fn load_pipeline<R: Read>(reader: R, origin: &str) -> Result<Pipeline, InputError> {
    let mut pipeline = Pipeline::new();
    let mut csv_reader = csv::Reader::from_reader(reader);
    for record in csv_reader.deserialize() {
        let record: PipelineRecord = record.map_err(|e| csv_error(origin, e))?;
        let step = pipeline.add_step(record.step.trim());
        if record.prerequisite.trim().is_empty() {
            continue;
        }
        let prerequisite = pipeline.add_step(record.prerequisite.trim());

        let kind = match record.kind.trim() {
            "sync" | "synchronous" => DependencyKind::Synchronous,
            "async" | "asynchronous" => DependencyKind::Asynchronous,
            other => {
                return Err(InputError::InvalidField {
                    path: origin.to_string(),
                    field: "kind".to_string(),
                    value: other.to_string(),
                })
            }
        };
        let scalable = match record.scalable.trim() {
            "" | "false" | "0" => false,
            "true" | "1" => true,
            other => {
                return Err(InputError::InvalidField {
                    path: origin.to_string(),
                    field: "scalable".to_string(),
                    value: other.to_string(),
                })
            }
        };

        pipeline
            .add_dependency(kind, step, prerequisite, scalable)
            .map_err(|e| InputError::InvalidField {
                path: origin.to_string(),
                field: "prerequisite".to_string(),
                value: e.to_string(),
            })?;
    }
    Ok(pipeline)
}

#[derive(Debug, Deserialize)]
struct ResourceRecord {
    name: String,
    cpu_cores: f64,
    memory_bytes: f64,
    cost_per_second: f64,
}

/// Loads the resource catalog into a fresh network graph (edges come
/// separately from the network file).
pub fn load_resources<R: Read>(reader: R, origin: &str) -> Result<NetworkGraph, InputError> {
    let mut graph = NetworkGraph::new();
    let mut csv_reader = csv::Reader::from_reader(reader);
    for record in csv_reader.deserialize() {
        let record: ResourceRecord = record.map_err(|e| csv_error(origin, e))?;
        graph.add_resource(Resource::new(
            record.name.trim(),
            record.cpu_cores,
            record.memory_bytes,
            record.cost_per_second,
        ));
    }
    Ok(graph)
}

#[derive(Debug, Deserialize)]
struct NetworkRecord {
    source: String,
    target: String,
    bandwidth_bytes_per_sec: f64,
    latency_ms: f64,
    #[serde(default)]
    cost_per_gb: f64,
}

/// Loads the pairwise network table onto an existing resource graph.
pub fn load_network<R: Read>(
    reader: R,
    origin: &str,
    graph: &mut NetworkGraph,
) -> Result<(), InputError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    for record in csv_reader.deserialize() {
        let record: NetworkRecord = record.map_err(|e| csv_error(origin, e))?;
        let source = resolve_resource(graph, origin, record.source.trim())?;
        let target = resolve_resource(graph, origin, record.target.trim())?;
        graph.add_edge(
            source,
            target,
            NetworkEdge {
                bandwidth_bytes_per_sec: record.bandwidth_bytes_per_sec,
                latency_seconds: record.latency_ms / 1e3,
                cost_per_gb: record.cost_per_gb,
            },
        );
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct StepMetricsRecord {
    dry_run_id: String,
    timestamp: i64,
    step: String,
    resource: String,
    num_inputs: u64,
    input_bytes: f64,
    num_outputs: u64,
    output_bytes: f64,
    step_processing_ms: f64,
    data_transmission_ms: f64,
}

/// Loads the `step_metrics` dry-run table.
pub fn load_step_metrics<R: Read>(
    reader: R,
    origin: &str,
    pipeline: &Pipeline,
    graph: &NetworkGraph,
    data: &mut DryRunData,
) -> Result<(), InputError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    for record in csv_reader.deserialize() {
        let record: StepMetricsRecord = record.map_err(|e| csv_error(origin, e))?;
        data.step_metrics.push(StepMetricsSample {
            step: resolve_step(pipeline, origin, &record.step)?,
            resource: resolve_resource(graph, origin, &record.resource)?,
            dry_run_id: record.dry_run_id,
            timestamp: record.timestamp,
            num_inputs: record.num_inputs,
            input_bytes: record.input_bytes,
            num_outputs: record.num_outputs,
            output_bytes: record.output_bytes,
            step_processing_ms: record.step_processing_ms,
            data_transmission_ms: record.data_transmission_ms,
        });
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct PerformanceRecord {
    dry_run_id: String,
    timestamp: i64,
    step: String,
    resource: String,
    max_cpu_pct: f64,
    avg_cpu_pct: f64,
    max_mem_mb: f64,
}

/// Loads the `step_performance_metrics` dry-run table.
pub fn load_performance_metrics<R: Read>(
    reader: R,
    origin: &str,
    pipeline: &Pipeline,
    graph: &NetworkGraph,
    data: &mut DryRunData,
) -> Result<(), InputError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    for record in csv_reader.deserialize() {
        let record: PerformanceRecord = record.map_err(|e| csv_error(origin, e))?;
        data.performance.push(StepPerformanceSample {
            step: resolve_step(pipeline, origin, &record.step)?,
            resource: resolve_resource(graph, origin, &record.resource)?,
            dry_run_id: record.dry_run_id,
            timestamp: record.timestamp,
            max_cpu_pct: record.max_cpu_pct,
            avg_cpu_pct: record.avg_cpu_pct,
            max_mem_mb: record.max_mem_mb,
        });
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct DeploymentRecord {
    step: String,
    resource: String,
    avg_download_seconds: f64,
    avg_instance_start_seconds: f64,
}

/// Loads the `deployment_metrics` dry-run table.
pub fn load_deployment_metrics<R: Read>(
    reader: R,
    origin: &str,
    pipeline: &Pipeline,
    graph: &NetworkGraph,
    data: &mut DryRunData,
) -> Result<(), InputError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    for record in csv_reader.deserialize() {
        let record: DeploymentRecord = record.map_err(|e| csv_error(origin, e))?;
        data.deployments.push(DeploymentSample {
            step: resolve_step(pipeline, origin, &record.step)?,
            resource: resolve_resource(graph, origin, &record.resource)?,
            avg_download_seconds: record.avg_download_seconds,
            avg_instance_start_seconds: record.avg_instance_start_seconds,
        });
    }
    Ok(())
}

/// Serializes a timeline: one row per event, ordered by start position,
/// ties by resource then step.
pub fn write_timeline<W: Write>(
    writer: W,
    origin: &str,
    timeline: &Timeline,
    pipeline: &Pipeline,
    graph: &NetworkGraph,
) -> Result<(), InputError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in timeline.to_rows(pipeline, graph) {
        csv_writer.serialize(row).map_err(|e| csv_error(origin, e))?;
    }
    csv_writer.flush().map_err(|e| InputError::Io {
        path: origin.to_string(),
        source: e,
    })?;
    Ok(())
}

/// Reads a serialized timeline back into its row view.
pub fn read_timeline_rows<R: Read>(reader: R, origin: &str) -> Result<Vec<TimelineRow>, InputError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        rows.push(record.map_err(|e| csv_error(origin, e))?);
    }
    Ok(rows)
}
