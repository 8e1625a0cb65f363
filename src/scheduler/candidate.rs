//! Per-level candidate-schedule search.
//!
//! For one topological level, the search enumerates every carried
//! timeline × permutation of the ready steps × resource assignment
//! (Cartesian product, forced deployments pinning their slot), plus a
//! replication variant for every scalable step and useful replica count.
//! Each tuple speculatively extends a deep copy of the timeline, one step
//! at a time, and is scored as `time_fraction + cost_fraction`; a
//! fraction above 1 prunes hard, a score above the running best abandons
//! the tuple early. Survivors are merged serially into the minimum-score
//! set, deduplicated and canonically ordered so runs are reproducible
//! regardless of worker timing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Instant;

use tracing::debug;

use super::pool::run_tasks;
use super::SchedulerConfig;
use crate::error::{InfeasibleReason, ScheduleError};
use crate::estimator::{EstimationCache, EstimationKind};
use crate::models::{NetworkGraph, Pipeline, ResourceId, StepId};
use crate::timeline::{ResourceReservation, SchedulingEvent, Timeline};

/// Monotone minimum score shared across workers. Scores are non-negative,
/// so the bit pattern of an `f64` preserves numeric order and a plain
/// integer `fetch_min` suffices.
struct SharedBest(AtomicU64);

impl SharedBest {
    fn new() -> Self {
        Self(AtomicU64::new(f64::INFINITY.to_bits()))
    }

    fn get(&self) -> f64 {
        f64::from_bits(self.0.load(AtomicOrdering::Relaxed))
    }

    fn update(&self, score: f64) {
        self.0.fetch_min(score.to_bits(), AtomicOrdering::Relaxed);
    }
}

/// Replication request attached to a placement tuple.
#[derive(Debug, Clone, Copy)]
struct ScaledPlacement {
    /// The step being replicated.
    step: StepId,
    /// Expected inputs of the unscaled step, partitioned across replicas.
    total_inputs: u64,
}

/// One (timeline snapshot, permutation, assignment, scaling) tuple.
struct PlacementJob {
    timeline: Timeline,
    steps: Vec<StepId>,
    resources: Vec<ResourceId>,
    scaled: Option<ScaledPlacement>,
}

/// Result of evaluating one tuple.
enum JobOutcome {
    /// The tuple produced a complete level timeline.
    Placed(Timeline),
    /// The tuple violated a hard bound.
    Pruned(InfeasibleReason),
    /// The tuple scored above the running best and was dropped silently.
    Abandoned,
    /// Internal failure; aborts the search.
    Failed(ScheduleError),
}

/// Level-by-level search driver state shared by all workers.
pub(crate) struct CandidateSearch<'a> {
    pipeline: &'a Pipeline,
    graph: &'a NetworkGraph,
    cache: &'a EstimationCache,
    config: &'a SchedulerConfig,
    forced: HashMap<StepId, ResourceId>,
    deadline: Option<Instant>,
}

impl<'a> CandidateSearch<'a> {
    pub(crate) fn new(
        pipeline: &'a Pipeline,
        graph: &'a NetworkGraph,
        cache: &'a EstimationCache,
        config: &'a SchedulerConfig,
        deadline: Option<Instant>,
    ) -> Self {
        let forced = config.forced_deployments.iter().copied().collect();
        Self {
            pipeline,
            graph,
            cache,
            config,
            forced,
            deadline,
        }
    }

    /// Fraction of the deadline a timeline consumes.
    pub(crate) fn time_fraction(&self, timeline: &Timeline) -> f64 {
        timeline.total_time() / self.config.deadline_seconds
    }

    /// Fraction of the budget a timeline consumes.
    pub(crate) fn cost_fraction(&self, timeline: &Timeline) -> f64 {
        (timeline.resource_cost(self.graph) + timeline.data_transmission_cost(self.graph))
            / self.config.budget_usd
    }

    /// Combined score; lower is better.
    pub(crate) fn score(&self, timeline: &Timeline) -> f64 {
        self.time_fraction(timeline) + self.cost_fraction(timeline)
    }

    /// Schedules one level on top of every carried timeline, returning the
    /// minimum-score set for the level.
    pub(crate) fn explore_level(
        &self,
        level: &[StepId],
        carried: Vec<Timeline>,
    ) -> Result<Vec<Timeline>, ScheduleError> {
        let mut carried = carried;
        let mut remaining: Vec<StepId> = level.to_vec();

        while !remaining.is_empty() {
            let ready = ready_steps(self.pipeline, &remaining);
            if ready.is_empty() {
                break;
            }

            let jobs = self.generate_jobs(&carried, &ready);
            debug!(
                ready = ready.len(),
                carried = carried.len(),
                jobs = jobs.len(),
                "exploring ready set"
            );

            let best_so_far = SharedBest::new();
            let outcomes = run_tasks(
                self.config.workers,
                jobs.into_iter(),
                |job| self.evaluate(job, &best_so_far),
                self.deadline,
            );

            let mut tallies = [0usize; 3];
            let mut best: Vec<Timeline> = Vec::new();
            let mut best_score = f64::INFINITY;
            for outcome in outcomes {
                match outcome {
                    JobOutcome::Placed(timeline) => {
                        let score = self.score(&timeline);
                        if score < best_score {
                            best_score = score;
                            best = vec![timeline];
                        } else if score == best_score {
                            best.push(timeline);
                        }
                    }
                    JobOutcome::Pruned(reason) => tallies[reason_index(reason)] += 1,
                    JobOutcome::Abandoned => {}
                    JobOutcome::Failed(err) => return Err(err),
                }
            }

            if best.is_empty() {
                return Err(ScheduleError::Infeasible {
                    reason: dominant_reason(&tallies),
                });
            }

            best.sort_by(|a, b| a.canonical_cmp(b));
            best.dedup();
            debug!(survivors = best.len(), best_score, "ready set merged");

            remaining.retain(|s| !ready.contains(s));
            carried = best;
        }

        Ok(carried)
    }

    /// Enumerates every placement tuple for one ready set.
    fn generate_jobs(&self, carried: &[Timeline], ready: &[StepId]) -> Vec<PlacementJob> {
        let eligible: Vec<ResourceId> = self.graph.resource_ids().collect();
        let mut jobs = Vec::new();

        for timeline in carried {
            for perm in permutations(ready) {
                for assignment in assignments(&eligible, perm.len()) {
                    let mut resources = assignment;
                    for (i, step) in perm.iter().enumerate() {
                        if let Some(&forced) = self.forced.get(step) {
                            resources[i] = forced;
                        }
                    }

                    jobs.push(PlacementJob {
                        timeline: timeline.clone(),
                        steps: perm.clone(),
                        resources: resources.clone(),
                        scaled: None,
                    });

                    for (i, &step) in perm.iter().enumerate() {
                        if !self.pipeline.is_scalable(step) || self.forced.contains_key(&step) {
                            continue;
                        }
                        let Some((k_max, total_inputs)) =
                            self.scaling_bounds(timeline, step, resources[i])
                        else {
                            continue;
                        };
                        for k in 2..=k_max {
                            for extra in assignments(&eligible, (k - 1) as usize) {
                                let mut steps = perm.clone();
                                let mut scaled_resources = resources.clone();
                                steps.extend(std::iter::repeat(step).take((k - 1) as usize));
                                scaled_resources.extend(extra);
                                jobs.push(PlacementJob {
                                    timeline: timeline.clone(),
                                    steps,
                                    resources: scaled_resources,
                                    scaled: Some(ScaledPlacement { step, total_inputs }),
                                });
                            }
                        }
                    }
                }
            }
        }

        jobs
    }

    /// The maximum useful replica count of a consumer on `resource`, and
    /// its expected input count: ⌈producer total production time /
    /// consumer per-input time⌉, capped by the producer's output count and
    /// the configured maximum. `None` when the step cannot scale here.
    fn scaling_bounds(
        &self,
        timeline: &Timeline,
        step: StepId,
        resource: ResourceId,
    ) -> Option<(u32, u64)> {
        let producer = self.pipeline.asynchronous_parent_of(step)?;
        let producer_event = timeline.latest_finishing_event_of_step(producer)?;
        let EstimationKind::Producer {
            avg_output_seconds,
            outputs,
        } = producer_event.estimation.kind
        else {
            return None;
        };

        let est = self.cache.timeline(step, resource, producer_event.resource)?;
        let EstimationKind::Consumer {
            avg_input_seconds,
            inputs,
            ..
        } = est.kind
        else {
            return None;
        };

        let mut k = if avg_input_seconds > 0.0 {
            ((avg_output_seconds * outputs as f64) / avg_input_seconds).ceil() as u64
        } else {
            outputs
        };
        k = k.min(outputs);
        if let Some(cap) = self.config.max_scalability {
            k = k.min(cap as u64);
        }
        Some((k as u32, inputs))
    }

    /// Resource of the latest-finishing already-scheduled prerequisite;
    /// `own` when the step has none (its data is local).
    fn upstream_resource(&self, timeline: &Timeline, step: StepId, own: ResourceId) -> ResourceId {
        self.pipeline
            .prerequisites_of(step)
            .filter_map(|d| timeline.latest_finishing_event_of_step(d.prerequisite))
            .max_by(|a, b| a.end().total_cmp(&b.end()))
            .map(|e| e.resource)
            .unwrap_or(own)
    }

    /// Speculatively extends the job's timeline by its steps in order.
    fn evaluate(&self, job: PlacementJob, best_so_far: &SharedBest) -> JobOutcome {
        let PlacementJob {
            mut timeline,
            steps,
            resources,
            scaled,
        } = job;

        let mut remaining_inputs = scaled.map_or(0, |s| s.total_inputs);
        let mut remaining_instances = scaled.map_or(0, |s| {
            steps.iter().filter(|&&x| x == s.step).count() as u64
        });
        let mut baseline_score: Option<f64> = None;
        let mut score = 0.0;

        for (&step, &resource) in steps.iter().zip(&resources) {
            let Some(hw) = self.cache.hardware(step, resource) else {
                return JobOutcome::Pruned(InfeasibleReason::InsufficientSamples);
            };
            let reservation = ResourceReservation {
                cpu_cores: hw.cpu_cores,
                memory_bytes: hw.memory_bytes,
            };
            let capacity = self.graph.resource(resource);
            if reservation.cpu_cores > capacity.cpu_cores
                || reservation.memory_bytes > capacity.memory_bytes
            {
                // The step can never fit this resource; the pair is as
                // unavailable as an unmeasured one.
                return JobOutcome::Pruned(InfeasibleReason::InsufficientSamples);
            }

            let upstream = self.upstream_resource(&timeline, step, resource);
            let Some(cached) = self.cache.timeline(step, resource, upstream) else {
                return JobOutcome::Pruned(InfeasibleReason::InsufficientSamples);
            };
            let cached = *cached;
            let mut est = cached;

            let is_scaled_step = scaled.is_some_and(|s| s.step == step);
            let mut scale_level = 1u32;
            if is_scaled_step {
                scale_level = timeline.events_of_step(step).count() as u32 + 1;
                let share = if remaining_instances <= 1 {
                    remaining_inputs
                } else {
                    remaining_inputs.div_ceil(remaining_instances)
                };
                match est.with_input_share(share) {
                    Some(shared) => est = shared,
                    None => return JobOutcome::Pruned(InfeasibleReason::InsufficientSamples),
                }
                remaining_inputs -= share;
                remaining_instances -= 1;
            }

            // Deployment is paid once per (step, resource); later
            // instances reuse the pulled image and warm runtime.
            if timeline
                .events_of_step(step)
                .any(|e| e.resource == resource)
            {
                est.provisioning_seconds = 0.0;
            }

            // Provisioning may overlap the wait for the asynchronous
            // parent's next output; synchronous parents bound the start
            // itself.
            let sync_floor = timeline.synchronous_parent_position(self.pipeline, step);
            let async_floor = (timeline.asynchronous_parent_position(
                self.pipeline,
                step,
                scale_level,
            ) - est.provisioning_seconds)
                .max(0.0);
            let floor = sync_floor.max(async_floor);

            let start = timeline.earliest_available_position_after(
                self.graph,
                resource,
                &reservation,
                est.total_time(),
                floor,
            );
            if !start.is_finite() {
                return JobOutcome::Pruned(InfeasibleReason::InsufficientSamples);
            }

            let event = SchedulingEvent::new(start, est, reservation);
            if let Err(err) = timeline.add_event(event.clone(), self.pipeline, self.graph) {
                return JobOutcome::Failed(err);
            }

            let time_fraction = self.time_fraction(&timeline);
            if time_fraction > 1.0 {
                return JobOutcome::Pruned(InfeasibleReason::DeadlineExceeded);
            }
            let cost_fraction = self.cost_fraction(&timeline);
            if cost_fraction > 1.0 {
                return JobOutcome::Pruned(InfeasibleReason::BudgetExceeded);
            }
            score = time_fraction + cost_fraction;
            if score > best_so_far.get() {
                return JobOutcome::Abandoned;
            }

            if is_scaled_step {
                if baseline_score.is_none() {
                    // Score the single-instance alternative by briefly
                    // swapping the replica for the unscaled estimation.
                    let baseline_event = SchedulingEvent::new(start, cached, reservation);
                    timeline.replace_event(&event, baseline_event.clone());
                    baseline_score = Some(self.score(&timeline));
                    timeline.replace_event(&baseline_event, event.clone());
                }
                if score > baseline_score.unwrap_or(f64::INFINITY) {
                    // Scaling does not pay off against the single
                    // instance; drop the variant.
                    return JobOutcome::Abandoned;
                }
            }
        }

        best_so_far.update(score);
        JobOutcome::Placed(timeline)
    }
}

fn reason_index(reason: InfeasibleReason) -> usize {
    match reason {
        InfeasibleReason::DeadlineExceeded => 0,
        InfeasibleReason::BudgetExceeded => 1,
        InfeasibleReason::InsufficientSamples => 2,
    }
}

/// The most frequent prune reason; ties favor the more actionable kind
/// (sample gap over budget over deadline).
fn dominant_reason(tallies: &[usize; 3]) -> InfeasibleReason {
    let reasons = [
        InfeasibleReason::DeadlineExceeded,
        InfeasibleReason::BudgetExceeded,
        InfeasibleReason::InsufficientSamples,
    ];
    let mut dominant = InfeasibleReason::DeadlineExceeded;
    let mut count = 0usize;
    for reason in reasons {
        let tally = tallies[reason_index(reason)];
        if tally >= count && tally > 0 {
            dominant = reason;
            count = tally;
        }
    }
    dominant
}

/// Steps of `remaining` whose prerequisites all lie outside `remaining`.
fn ready_steps(pipeline: &Pipeline, remaining: &[StepId]) -> Vec<StepId> {
    remaining
        .iter()
        .copied()
        .filter(|&step| {
            pipeline
                .prerequisites_of(step)
                .all(|d| !remaining.contains(&d.prerequisite))
        })
        .collect()
}

/// All orderings of `items`, in a deterministic order.
fn permutations(items: &[StepId]) -> Vec<Vec<StepId>> {
    if items.is_empty() {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for (i, &head) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

/// The n-fold Cartesian product of `eligible` with itself, in a
/// deterministic order.
fn assignments(eligible: &[ResourceId], n: usize) -> Vec<Vec<ResourceId>> {
    let mut out = vec![Vec::new()];
    for _ in 0..n {
        out = out
            .into_iter()
            .flat_map(|prefix| {
                eligible.iter().map(move |&r| {
                    let mut extended = prefix.clone();
                    extended.push(r);
                    extended
                })
            })
            .collect();
    }
    out
}
