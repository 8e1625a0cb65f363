//! Candidate-schedule search.
//!
//! [`TimelineScheduler`] is the planning driver. It memoizes every
//! derivable estimation up front, splits the pipeline into topological
//! levels, and explores each level with an exhaustive enumeration of step
//! orderings, resource assignments, and replication factors, pruned by
//! the combined time/cost score. The surviving minimum-score timelines of
//! one level seed the next.
//!
//! # Algorithm
//!
//! Per level: every carried timeline × permutation of the ready steps ×
//! |resources|^|ready| assignment is evaluated speculatively on a worker
//! pool; scalable steps additionally explore K-fold replication with the
//! incoming work partitioned across replicas. `score = total_time /
//! deadline + total_cost / budget`; either fraction above 1 prunes.
//!
//! # Reference
//!
//! Topcuoglu et al. (2002), "Performance-Effective and Low-Complexity
//! Task Scheduling for Heterogeneous Computing": the level/EFT framing
//! this search generalizes from single placements to priced replication.

mod candidate;
mod pool;

use std::time::{Duration, Instant};

use tracing::info;

use crate::error::{InfeasibleReason, ScheduleError};
use crate::estimator::{EstimationCache, EstimatorConfig};
use crate::models::{DryRunData, NetworkGraph, Pipeline, ResourceId, StepId};
use crate::timeline::Timeline;
use candidate::CandidateSearch;

/// Search parameters: the user constraints plus engine tuning.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Latest acceptable completion time in seconds; also the time
    /// normalizer of the score.
    pub deadline_seconds: f64,
    /// Spending cap in USD; also the cost normalizer of the score.
    pub budget_usd: f64,
    /// Pipeline input volume in megabytes.
    pub input_volume_mb: f64,
    /// Cap on replicas per scalable step. `None` leaves only the
    /// usefulness bound; `Some(1)` disables replication.
    pub max_scalability: Option<u32>,
    /// Operator-supplied (step, resource) pins. A pinned step is never
    /// placed elsewhere and never replicated.
    pub forced_deployments: Vec<(StepId, ResourceId)>,
    /// Worker threads evaluating placement tuples.
    pub workers: usize,
    /// Wall-clock budget for the whole search. When it runs out, queued
    /// work drains and the best set found so far is kept.
    pub search_timeout: Option<Duration>,
    /// Safety factors of the hardware estimator.
    pub estimator: EstimatorConfig,
}

impl SchedulerConfig {
    /// Creates a config with the three mandatory user constraints.
    pub fn new(deadline_seconds: f64, budget_usd: f64, input_volume_mb: f64) -> Self {
        Self {
            deadline_seconds,
            budget_usd,
            input_volume_mb,
            max_scalability: None,
            forced_deployments: Vec::new(),
            workers: num_cpus::get(),
            search_timeout: None,
            estimator: EstimatorConfig::default(),
        }
    }

    /// Caps the replicas per scalable step.
    pub fn with_max_scalability(mut self, max: u32) -> Self {
        self.max_scalability = Some(max);
        self
    }

    /// Pins a step to a resource.
    pub fn with_forced_deployment(mut self, step: StepId, resource: ResourceId) -> Self {
        self.forced_deployments.push((step, resource));
        self
    }

    /// Sets the worker thread count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Bounds the search wall-clock time.
    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = Some(timeout);
        self
    }

    /// Sets the estimator safety factors.
    pub fn with_estimator(mut self, estimator: EstimatorConfig) -> Self {
        self.estimator = estimator;
        self
    }
}

/// Score-relevant aggregates of one produced timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineSummary {
    /// Maximum end position in seconds.
    pub total_time: f64,
    /// Σ event duration × resource cost.
    pub resource_cost: f64,
    /// Σ data-transfer cost between producer and consumer resources.
    pub transmission_cost: f64,
    /// time_fraction + cost_fraction.
    pub score: f64,
}

impl std::fmt::Display for TimelineSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total_time={:.3}s resource_cost={:.4} transmission_cost={:.4} score={:.6}",
            self.total_time, self.resource_cost, self.transmission_cost, self.score
        )
    }
}

/// The context-aware timeline scheduler.
///
/// Owns the estimation cache derived from the dry runs; borrows the
/// immutable pipeline and network graph.
pub struct TimelineScheduler<'a> {
    pipeline: &'a Pipeline,
    graph: &'a NetworkGraph,
    config: SchedulerConfig,
    cache: EstimationCache,
}

impl<'a> TimelineScheduler<'a> {
    /// Builds the scheduler, memoizing every estimation the search may
    /// need. Dry-run data is only read here.
    pub fn new(
        pipeline: &'a Pipeline,
        graph: &'a NetworkGraph,
        dry_runs: &DryRunData,
        config: SchedulerConfig,
    ) -> Self {
        let cache = EstimationCache::build(
            pipeline,
            graph,
            dry_runs,
            config.input_volume_mb,
            config.estimator,
        );
        Self {
            pipeline,
            graph,
            config,
            cache,
        }
    }

    /// Plans the pipeline, returning every timeline tying for the minimum
    /// score, canonically ordered.
    ///
    /// An empty pipeline yields one empty timeline. A step without any
    /// estimable placement fails fast with
    /// [`InfeasibleReason::InsufficientSamples`].
    pub fn schedule(&self) -> Result<Vec<Timeline>, ScheduleError> {
        if self.pipeline.is_empty() {
            return Ok(vec![Timeline::new()]);
        }
        self.check_coverage()?;

        let deadline = self.config.search_timeout.map(|t| Instant::now() + t);
        let search =
            CandidateSearch::new(self.pipeline, self.graph, &self.cache, &self.config, deadline);

        let mut carried = vec![Timeline::new()];
        for (index, level) in self.pipeline.levels().iter().enumerate() {
            info!(level = index, steps = level.len(), "exploring level");
            carried = search.explore_level(level, carried)?;
        }

        info!(
            timelines = carried.len(),
            score = self.score(&carried[0]),
            "search complete"
        );
        Ok(carried)
    }

    /// Combined score of a timeline under this configuration.
    pub fn score(&self, timeline: &Timeline) -> f64 {
        self.summarize(timeline).score
    }

    /// Score-relevant aggregates of a timeline.
    pub fn summarize(&self, timeline: &Timeline) -> TimelineSummary {
        let total_time = timeline.total_time();
        let resource_cost = timeline.resource_cost(self.graph);
        let transmission_cost = timeline.data_transmission_cost(self.graph);
        TimelineSummary {
            total_time,
            resource_cost,
            transmission_cost,
            score: total_time / self.config.deadline_seconds
                + (resource_cost + transmission_cost) / self.config.budget_usd,
        }
    }

    /// Every step must have at least one estimable placement: the forced
    /// resource when pinned, any resource otherwise.
    fn check_coverage(&self) -> Result<(), ScheduleError> {
        for step in self.pipeline.step_ids() {
            let forced = self
                .config
                .forced_deployments
                .iter()
                .find(|(s, _)| *s == step)
                .map(|&(_, r)| r);
            let covered = match forced {
                Some(resource) => {
                    self.cache.hardware(step, resource).is_some()
                        && self.cache.timeline(step, resource, resource).is_some()
                }
                None => self.cache.placeable(step, self.graph),
            };
            if !covered {
                return Err(ScheduleError::Infeasible {
                    reason: InfeasibleReason::InsufficientSamples,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DependencyKind, NetworkEdge, Resource, StepMetricsSample, StepPerformanceSample,
    };
    use crate::timeline::SchedulingEvent;

    fn metrics(
        step: StepId,
        resource: ResourceId,
        num_inputs: u64,
        input_bytes: f64,
        num_outputs: u64,
        output_bytes: f64,
        processing_ms: f64,
    ) -> StepMetricsSample {
        StepMetricsSample {
            dry_run_id: "dr-1".into(),
            timestamp: 1_700_000_000,
            step,
            resource,
            num_inputs,
            input_bytes,
            num_outputs,
            output_bytes,
            step_processing_ms: processing_ms,
            data_transmission_ms: 0.0,
        }
    }

    fn perf(step: StepId, resource: ResourceId, cores: f64, mem_mb: f64) -> StepPerformanceSample {
        StepPerformanceSample {
            dry_run_id: "dr-1".into(),
            timestamp: 1_700_000_000,
            step,
            resource,
            max_cpu_pct: cores * 100.0,
            avg_cpu_pct: cores * 100.0,
            max_mem_mb: mem_mb,
        }
    }

    fn connect_all(graph: &mut NetworkGraph, bandwidth: f64, latency: f64, cost_per_gb: f64) {
        let ids: Vec<ResourceId> = graph.resource_ids().collect();
        for &a in &ids {
            for &b in &ids {
                if a != b {
                    graph.add_edge(
                        a,
                        b,
                        NetworkEdge {
                            bandwidth_bytes_per_sec: bandwidth,
                            latency_seconds: latency,
                            cost_per_gb,
                        },
                    );
                }
            }
        }
    }

    /// Scenario: one producer step, a fast and a cheap resource.
    /// 1000 MB process in 100 s on r-fast, 300 s on r-cheap.
    fn single_step_fixture() -> (Pipeline, NetworkGraph, DryRunData) {
        let mut pipeline = Pipeline::new();
        let s1 = pipeline.add_step("s1");

        let mut graph = NetworkGraph::new();
        let fast = graph.add_resource(Resource::new("r-fast", 4.0, 8e9, 0.02));
        let cheap = graph.add_resource(Resource::new("r-cheap", 4.0, 8e9, 0.005));
        connect_all(&mut graph, 1e9, 0.01, 0.0);

        let mut dry_runs = DryRunData::new();
        dry_runs
            .step_metrics
            .push(metrics(s1, fast, 1, 1000e6, 1, 1000e6, 100_000.0));
        dry_runs
            .step_metrics
            .push(metrics(s1, cheap, 1, 1000e6, 1, 1000e6, 300_000.0));
        dry_runs.performance.push(perf(s1, fast, 1.0, 1000.0));
        dry_runs.performance.push(perf(s1, cheap, 1.0, 1000.0));
        (pipeline, graph, dry_runs)
    }

    /// Scenario: producer + synchronous consumer on two symmetric
    /// resources connected at 100 MB/s.
    fn sync_pair_fixture() -> (Pipeline, NetworkGraph, DryRunData) {
        let mut pipeline = Pipeline::new();
        let producer = pipeline.add_step("produce");
        let consumer = pipeline.add_step("store");
        pipeline
            .add_dependency(DependencyKind::Synchronous, consumer, producer, false)
            .unwrap();

        let mut graph = NetworkGraph::new();
        let r1 = graph.add_resource(Resource::new("r1", 4.0, 8e9, 0.01));
        let r2 = graph.add_resource(Resource::new("r2", 4.0, 8e9, 0.01));
        connect_all(&mut graph, 100e6, 0.01, 0.09);

        let mut dry_runs = DryRunData::new();
        for resource in [r1, r2] {
            dry_runs
                .step_metrics
                .push(metrics(producer, resource, 1, 500e6, 10, 500e6, 50_000.0));
            dry_runs
                .step_metrics
                .push(metrics(consumer, resource, 10, 500e6, 1, 100e6, 100_000.0));
            dry_runs.performance.push(perf(producer, resource, 1.0, 500.0));
            dry_runs.performance.push(perf(consumer, resource, 1.0, 500.0));
        }
        (pipeline, graph, dry_runs)
    }

    /// Scenario: fog producer streaming to a scalable cloud consumer.
    /// 10 outputs of 50 MB at 5 s each; 20 s per input on either cloud
    /// node.
    fn scaling_fixture() -> (Pipeline, NetworkGraph, DryRunData) {
        let mut pipeline = Pipeline::new();
        let producer = pipeline.add_step("produce");
        let consumer = pipeline.add_step("consume");
        pipeline
            .add_dependency(DependencyKind::Asynchronous, consumer, producer, true)
            .unwrap();

        let mut graph = NetworkGraph::new();
        let fog = graph.add_resource(Resource::new("fog", 8.0, 16e9, 0.0));
        let cloud1 = graph.add_resource(Resource::new("cloud-1", 8.0, 16e9, 0.02));
        let cloud2 = graph.add_resource(Resource::new("cloud-2", 8.0, 16e9, 0.02));
        connect_all(&mut graph, 100e6, 0.01, 0.09);

        let mut dry_runs = DryRunData::new();
        dry_runs
            .step_metrics
            .push(metrics(producer, fog, 1, 500e6, 10, 500e6, 50_000.0));
        dry_runs.performance.push(perf(producer, fog, 1.0, 500.0));
        for cloud in [cloud1, cloud2] {
            dry_runs
                .step_metrics
                .push(metrics(consumer, cloud, 10, 500e6, 10, 100e6, 200_000.0));
            dry_runs.performance.push(perf(consumer, cloud, 1.0, 500.0));
        }
        (pipeline, graph, dry_runs)
    }

    /// Capacity and ordering invariants every produced timeline must hold.
    fn verify_invariants(timeline: &Timeline, pipeline: &Pipeline, graph: &NetworkGraph) {
        // Concurrent reservations fit capacity at every event start.
        for probe in timeline.events() {
            let resource = graph.resource(probe.resource);
            let (mut cpu, mut mem) = (0.0, 0.0);
            for other in timeline.events() {
                if other.resource == probe.resource && other.active_at(probe.start) {
                    cpu += other.reservation.cpu_cores;
                    mem += other.reservation.memory_bytes;
                }
            }
            assert!(cpu <= resource.cpu_cores + 1e-9);
            assert!(mem <= resource.memory_bytes + 1e-9);
        }
        // Synchronous dependents start at or after their prerequisites end.
        for dep in pipeline.dependencies() {
            if dep.kind != DependencyKind::Synchronous {
                continue;
            }
            let prerequisite_end = timeline.step_end_position(dep.prerequisite);
            for event in timeline.events_of_step(dep.dependent) {
                assert!(event.start >= prerequisite_end - 1e-9);
            }
        }
    }

    #[test]
    fn test_single_producer_picks_fast_resource() {
        let (pipeline, graph, dry_runs) = single_step_fixture();
        let config = SchedulerConfig::new(200.0, 10.0, 1000.0).with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);

        let timelines = scheduler.schedule().unwrap();
        assert_eq!(timelines.len(), 1);
        let timeline = &timelines[0];
        assert_eq!(timeline.len(), 1);

        let event = &timeline.events()[0];
        assert_eq!(graph.resource_name(event.resource), "r-fast");
        assert_eq!(event.start, 0.0);
        assert!((event.end() - 100.0).abs() < 1e-9);

        let summary = scheduler.summarize(timeline);
        assert!((summary.total_time - 100.0).abs() < 1e-9);
        assert!((summary.resource_cost - 2.0).abs() < 1e-9);
        assert!((summary.score - 0.7).abs() < 1e-9);
        verify_invariants(timeline, &pipeline, &graph);
    }

    #[test]
    fn test_sync_pair_collocates_to_avoid_transfer() {
        let (pipeline, graph, dry_runs) = sync_pair_fixture();
        let config = SchedulerConfig::new(1000.0, 50.0, 500.0).with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);

        let timelines = scheduler.schedule().unwrap();
        // The two symmetric same-resource placements tie.
        assert_eq!(timelines.len(), 2);
        for timeline in &timelines {
            assert_eq!(timeline.len(), 2);
            let producer = pipeline.step_id("produce").unwrap();
            let consumer = pipeline.step_id("store").unwrap();
            assert_eq!(
                timeline.scheduled_resource_of_step(producer),
                timeline.scheduled_resource_of_step(consumer)
            );
            assert_eq!(timeline.data_transmission_cost(&graph), 0.0);
            verify_invariants(timeline, &pipeline, &graph);
        }
    }

    #[test]
    fn test_scalable_consumer_replicates() {
        let (pipeline, graph, dry_runs) = scaling_fixture();
        let config = SchedulerConfig::new(300.0, 20.0, 500.0)
            .with_max_scalability(5)
            .with_workers(4);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);

        let timelines = scheduler.schedule().unwrap();
        assert!(!timelines.is_empty());
        let consumer = pipeline.step_id("consume").unwrap();
        for timeline in &timelines {
            // ⌈(5 s × 10 outputs) / 20 s⌉ = 3 replicas win on time.
            assert_eq!(timeline.events_of_step(consumer).count(), 3);
            // The input partition covers all expected inputs exactly.
            assert_eq!(timeline.inputs_covered_of_step(consumer), 10);
            assert!((timeline.total_time() - 87.004).abs() < 1e-6);
            verify_invariants(timeline, &pipeline, &graph);
        }
    }

    #[test]
    fn test_budget_bound_infeasibility() {
        let (pipeline, graph, dry_runs) = scaling_fixture();
        let config = SchedulerConfig::new(300.0, 0.01, 500.0)
            .with_max_scalability(5)
            .with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);

        let err = scheduler.schedule().unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Infeasible {
                reason: InfeasibleReason::BudgetExceeded
            }
        ));
    }

    #[test]
    fn test_forced_deployment_pins_and_may_miss_deadline() {
        let (pipeline, graph, dry_runs) = single_step_fixture();
        let s1 = pipeline.step_id("s1").unwrap();
        let cheap = graph.resource_id("r-cheap").unwrap();

        // The pinned placement misses the 200 s deadline.
        let config = SchedulerConfig::new(200.0, 10.0, 1000.0)
            .with_forced_deployment(s1, cheap)
            .with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);
        let err = scheduler.schedule().unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Infeasible {
                reason: InfeasibleReason::DeadlineExceeded
            }
        ));

        // A looser deadline accepts the pin.
        let config = SchedulerConfig::new(400.0, 10.0, 1000.0)
            .with_forced_deployment(s1, cheap)
            .with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);
        let timelines = scheduler.schedule().unwrap();
        assert_eq!(timelines.len(), 1);
        let event = &timelines[0].events()[0];
        assert_eq!(graph.resource_name(event.resource), "r-cheap");
        assert!((event.end() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_determinism_across_runs() {
        let (pipeline, graph, dry_runs) = scaling_fixture();
        let mut reference: Option<Vec<Vec<crate::timeline::TimelineRow>>> = None;
        for _ in 0..5 {
            let config = SchedulerConfig::new(300.0, 20.0, 500.0)
                .with_max_scalability(5)
                .with_workers(4);
            let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);
            let rows: Vec<_> = scheduler
                .schedule()
                .unwrap()
                .iter()
                .map(|t| t.to_rows(&pipeline, &graph))
                .collect();
            match &reference {
                None => reference = Some(rows),
                Some(expected) => assert_eq!(&rows, expected),
            }
        }
    }

    #[test]
    fn test_max_scalability_one_disables_replication() {
        let (pipeline, graph, dry_runs) = scaling_fixture();
        let config = SchedulerConfig::new(300.0, 20.0, 500.0)
            .with_max_scalability(1)
            .with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);

        let timelines = scheduler.schedule().unwrap();
        let consumer = pipeline.step_id("consume").unwrap();
        for timeline in &timelines {
            assert_eq!(timeline.events_of_step(consumer).count(), 1);
        }
    }

    #[test]
    fn test_infinite_deadline_prefers_cheapest() {
        let (pipeline, graph, dry_runs) = single_step_fixture();
        let config = SchedulerConfig::new(f64::INFINITY, 10.0, 1000.0).with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);

        let timelines = scheduler.schedule().unwrap();
        assert_eq!(timelines.len(), 1);
        let event = &timelines[0].events()[0];
        assert_eq!(graph.resource_name(event.resource), "r-cheap");
    }

    #[test]
    fn test_infinite_budget_prefers_fastest() {
        let (pipeline, graph, dry_runs) = single_step_fixture();
        let config = SchedulerConfig::new(400.0, f64::INFINITY, 1000.0).with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);

        let timelines = scheduler.schedule().unwrap();
        assert_eq!(timelines.len(), 1);
        let event = &timelines[0].events()[0];
        assert_eq!(graph.resource_name(event.resource), "r-fast");
    }

    #[test]
    fn test_empty_pipeline_yields_empty_timeline() {
        let pipeline = Pipeline::new();
        let graph = NetworkGraph::new();
        let dry_runs = DryRunData::new();
        let config = SchedulerConfig::new(100.0, 10.0, 100.0).with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);

        let timelines = scheduler.schedule().unwrap();
        assert_eq!(timelines.len(), 1);
        assert!(timelines[0].is_empty());
        assert_eq!(timelines[0].total_time(), 0.0);
        assert_eq!(timelines[0].resource_cost(&graph), 0.0);
    }

    #[test]
    fn test_unmeasured_step_is_infeasible() {
        let mut pipeline = Pipeline::new();
        pipeline.add_step("s1");
        let mut graph = NetworkGraph::new();
        graph.add_resource(Resource::new("r1", 4.0, 8e9, 0.01));
        let dry_runs = DryRunData::new();
        let config = SchedulerConfig::new(100.0, 10.0, 100.0).with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);

        let err = scheduler.schedule().unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Infeasible {
                reason: InfeasibleReason::InsufficientSamples
            }
        ));
    }

    #[test]
    fn test_rerun_with_forced_output_reproduces_timeline() {
        let (pipeline, graph, dry_runs) = single_step_fixture();
        let config = SchedulerConfig::new(200.0, 10.0, 1000.0).with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);
        let timelines = scheduler.schedule().unwrap();
        let chosen = &timelines[0];
        let chosen_score = scheduler.score(chosen);

        // Pin every (step, resource) of the produced timeline and re-run.
        let mut config = SchedulerConfig::new(200.0, 10.0, 1000.0).with_workers(2);
        for event in chosen.events() {
            config = config.with_forced_deployment(event.step, event.resource);
        }
        let rerun = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);
        let reproduced = rerun.schedule().unwrap();
        assert!(reproduced.iter().any(|t| t == chosen));
        assert!((rerun.score(&reproduced[0]) - chosen_score).abs() < 1e-12);
    }

    #[test]
    fn test_extending_timeline_never_shrinks_time_or_cost() {
        let (pipeline, graph, dry_runs) = sync_pair_fixture();
        let config = SchedulerConfig::new(1000.0, 50.0, 500.0).with_workers(2);
        let scheduler = TimelineScheduler::new(&pipeline, &graph, &dry_runs, config);

        let timelines = scheduler.schedule().unwrap();
        let full = &timelines[0];

        // Rebuild the timeline event by event; both aggregates only grow.
        let mut partial = Timeline::new();
        let (mut last_time, mut last_cost) = (0.0, 0.0);
        for event in full.events() {
            partial
                .add_event(
                    SchedulingEvent::new(
                        event.start,
                        event.estimation,
                        event.reservation,
                    ),
                    &pipeline,
                    &graph,
                )
                .unwrap();
            assert!(partial.total_time() >= last_time);
            assert!(partial.resource_cost(&graph) >= last_cost);
            last_time = partial.total_time();
            last_cost = partial.resource_cost(&graph);
        }
    }
}
