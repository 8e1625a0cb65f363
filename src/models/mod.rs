//! Scheduling domain models.
//!
//! The immutable inputs of the planner: the pipeline DAG, the network
//! graph of computing resources, and the dry-run measurements that seed
//! the estimator. All cross-references are arena IDs ([`StepId`],
//! [`ResourceId`]) so derived structures clone cheaply and the object
//! graph stays cycle-free.

mod dry_run;
mod pipeline;
mod resource;

pub use dry_run::{DeploymentSample, DryRunData, StepMetricsSample, StepPerformanceSample};
pub use pipeline::{Dependency, DependencyKind, Pipeline, PipelineError, Step, StepId};
pub use resource::{NetworkEdge, NetworkGraph, Resource, ResourceId};
