//! Context-aware timeline scheduling for data pipelines on the compute
//! continuum.
//!
//! Plans the placement of a pipeline of containerized processing steps
//! across fog and cloud resources. Predictions come from prior dry runs;
//! the search enumerates step orderings, resource assignments, and
//! replication factors level by level through the pipeline DAG and keeps
//! the timelines minimizing `total_time / deadline + total_cost /
//! budget` under capacity, dependency, deadline, and budget constraints.
//!
//! # Modules
//!
//! - **`models`**: immutable inputs — `Pipeline`, `NetworkGraph`,
//!   `Resource`, `DryRunData`
//! - **`estimator`**: dry-run driven predictions — hardware requirements
//!   and producer/consumer step timelines, memoized in an
//!   `EstimationCache`
//! - **`timeline`**: the solution container — `SchedulingEvent` packing
//!   with capacity enforcement, costs, CSV rows
//! - **`scheduler`**: the candidate-schedule search driver
//! - **`validation`**: value-range checks on loaded inputs
//! - **`io`**: CSV ingestion and timeline serialization
//!
//! # Example
//!
//! ```
//! use cats::models::{DryRunData, NetworkGraph, Pipeline, Resource};
//! use cats::models::{StepMetricsSample, StepPerformanceSample};
//! use cats::scheduler::{SchedulerConfig, TimelineScheduler};
//!
//! let mut pipeline = Pipeline::new();
//! let slice = pipeline.add_step("slice");
//!
//! let mut graph = NetworkGraph::new();
//! let fog = graph.add_resource(Resource::new("fog-1", 4.0, 8e9, 0.01));
//!
//! let mut dry_runs = DryRunData::new();
//! dry_runs.step_metrics.push(StepMetricsSample {
//!     dry_run_id: "dr-1".into(),
//!     timestamp: 1_700_000_000,
//!     step: slice,
//!     resource: fog,
//!     num_inputs: 1,
//!     input_bytes: 100e6,
//!     num_outputs: 1,
//!     output_bytes: 100e6,
//!     step_processing_ms: 10_000.0,
//!     data_transmission_ms: 0.0,
//! });
//! dry_runs.performance.push(StepPerformanceSample {
//!     dry_run_id: "dr-1".into(),
//!     timestamp: 1_700_000_000,
//!     step: slice,
//!     resource: fog,
//!     max_cpu_pct: 100.0,
//!     avg_cpu_pct: 80.0,
//!     max_mem_mb: 512.0,
//! });
//!
//! let config = SchedulerConfig::new(60.0, 5.0, 100.0).with_workers(2);
//! let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);
//! let timelines = scheduler.schedule().unwrap();
//! assert_eq!(timelines.len(), 1);
//! ```

pub mod error;
pub mod estimator;
pub mod io;
pub mod models;
pub mod scheduler;
pub mod timeline;
pub mod validation;

pub use error::{InfeasibleReason, InputError, ScheduleError};
pub use scheduler::{SchedulerConfig, TimelineScheduler, TimelineSummary};
pub use timeline::{ResourceReservation, SchedulingEvent, Timeline, TimelineRow};
