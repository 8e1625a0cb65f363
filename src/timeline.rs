//! Timeline of scheduling events.
//!
//! A [`Timeline`] is the solution representation of the planner: an
//! ordered collection of [`SchedulingEvent`]s, each pinning one step
//! instance to one resource for a contiguous interval with a CPU and
//! memory reservation. The container enforces that concurrent
//! reservations never exceed a resource's capacity and answers the
//! packing query the search relies on: the earliest position after a
//! floor where a reservation still fits.
//!
//! Resource loads are piecewise constant, so every capacity check only
//! inspects event boundaries.
//!
//! Invariants upheld after every mutation:
//! - concurrent reservations on one resource fit within its capacity
//! - events stay sorted by (start, step, resource)
//! - an event's duration subsumes provisioning, transmission, and
//!   processing (it is derived from its estimation)

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::estimator::StepTimelineEstimation;
use crate::models::{DependencyKind, NetworkGraph, Pipeline, ResourceId, StepId};

/// Capacity comparison slack for accumulated floating-point error.
const CAPACITY_EPSILON: f64 = 1e-9;

/// A CPU + memory reservation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceReservation {
    /// Reserved CPU in cores.
    pub cpu_cores: f64,
    /// Reserved memory in bytes.
    pub memory_bytes: f64,
}

/// One step instance pinned to one resource for a contiguous interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingEvent {
    /// Scheduled step.
    pub step: StepId,
    /// Resource the instance runs on.
    pub resource: ResourceId,
    /// Start position in seconds.
    pub start: f64,
    /// The prediction this event realizes; its total time is the event
    /// duration.
    pub estimation: StepTimelineEstimation,
    /// Held resource reservation.
    pub reservation: ResourceReservation,
}

impl SchedulingEvent {
    /// Creates an event at a position.
    pub fn new(
        start: f64,
        estimation: StepTimelineEstimation,
        reservation: ResourceReservation,
    ) -> Self {
        Self {
            step: estimation.step,
            resource: estimation.resource,
            start,
            estimation,
            reservation,
        }
    }

    /// Event duration in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.estimation.total_time()
    }

    /// End position in seconds.
    #[inline]
    pub fn end(&self) -> f64 {
        self.start + self.duration()
    }

    /// Whether the event holds its reservation at `position`.
    #[inline]
    pub fn active_at(&self, position: f64) -> bool {
        self.start <= position && position < self.end()
    }

    /// Whether the event overlaps the half-open window `[start, end)`.
    #[inline]
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && self.end() > start
    }
}

/// One row of the timeline's CSV serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    /// Step name.
    pub step: String,
    /// Event start in seconds.
    pub start_position_seconds: f64,
    /// Event end in seconds.
    pub end_position_seconds: f64,
    /// Resource name.
    pub resource: String,
    /// Reserved CPU in cores.
    pub cpu_reservation: f64,
    /// Reserved memory in bytes.
    pub memory_reservation: f64,
}

/// An ordered collection of scheduling events with capacity enforcement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    events: Vec<SchedulingEvent>,
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in (start, step, resource) order.
    pub fn events(&self) -> &[SchedulingEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the timeline holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events of one step.
    pub fn events_of_step(&self, step: StepId) -> impl Iterator<Item = &SchedulingEvent> {
        self.events.iter().filter(move |e| e.step == step)
    }

    /// Events on one resource.
    pub fn events_of_resource(&self, resource: ResourceId) -> impl Iterator<Item = &SchedulingEvent> {
        self.events.iter().filter(move |e| e.resource == resource)
    }

    /// Inserts an event after validating that its reservation fits the
    /// resource capacity over its whole span.
    ///
    /// Callers are expected to have pre-queried a conflict-free position
    /// via [`earliest_available_position_after`](Self::earliest_available_position_after);
    /// a rejection therefore indicates an internal bug. Synchronous
    /// dependency ordering is asserted in debug builds; the caller owns
    /// the synchronization floor.
    pub fn add_event(
        &mut self,
        event: SchedulingEvent,
        pipeline: &Pipeline,
        graph: &NetworkGraph,
    ) -> Result<(), ScheduleError> {
        debug_assert!(
            event.start + CAPACITY_EPSILON
                >= pipeline
                    .prerequisites_of(event.step)
                    .filter(|d| d.kind == DependencyKind::Synchronous)
                    .map(|d| self.step_end_position(d.prerequisite))
                    .fold(0.0, f64::max),
            "event starts before a synchronous prerequisite ends"
        );

        if !self.fits(graph, event.resource, &event.reservation, event.start, event.end()) {
            return Err(ScheduleError::ReservationConflict {
                step: pipeline.step_name(event.step).to_string(),
                resource: graph.resource_name(event.resource).to_string(),
                position: event.start,
            });
        }

        self.events.push(event);
        self.sort_events();
        Ok(())
    }

    /// Removes an event. Returns whether it was present.
    pub fn remove_event(&mut self, event: &SchedulingEvent) -> bool {
        match self.events.iter().position(|e| e == event) {
            Some(idx) => {
                self.events.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Replaces `old` with `new`, re-sorting. Returns whether `old` was
    /// present. Used to revert a speculative scaled placement.
    pub fn replace_event(&mut self, old: &SchedulingEvent, new: SchedulingEvent) -> bool {
        match self.events.iter().position(|e| e == old) {
            Some(idx) => {
                self.events[idx] = new;
                self.sort_events();
                true
            }
            None => false,
        }
    }

    fn sort_events(&mut self) {
        self.events.sort_by(|a, b| {
            a.start
                .total_cmp(&b.start)
                .then_with(|| a.step.cmp(&b.step))
                .then_with(|| a.resource.cmp(&b.resource))
        });
    }

    /// CPU and memory load on a resource at a position.
    fn load_at(&self, resource: ResourceId, position: f64) -> (f64, f64) {
        self.events_of_resource(resource)
            .filter(|e| e.active_at(position))
            .fold((0.0, 0.0), |(cpu, mem), e| {
                (cpu + e.reservation.cpu_cores, mem + e.reservation.memory_bytes)
            })
    }

    /// Whether `reservation` fits on `resource` over `[start, end)` next
    /// to the already-placed events. Loads are piecewise constant, so
    /// only the window start and event starts inside the window are
    /// checked.
    fn fits(
        &self,
        graph: &NetworkGraph,
        resource: ResourceId,
        reservation: &ResourceReservation,
        start: f64,
        end: f64,
    ) -> bool {
        let capacity = graph.resource(resource);
        let mut points = vec![start];
        for e in self.events_of_resource(resource) {
            if e.start > start && e.start < end {
                points.push(e.start);
            }
        }
        points.into_iter().all(|p| {
            let (cpu, mem) = self.load_at(resource, p);
            cpu + reservation.cpu_cores <= capacity.cpu_cores + CAPACITY_EPSILON
                && mem + reservation.memory_bytes <= capacity.memory_bytes + CAPACITY_EPSILON
        })
    }

    /// The smallest position ≥ `after` where `reservation` can run on
    /// `resource` for `duration` seconds without exceeding capacity.
    ///
    /// Walks the event boundaries of the resource in time order; the end
    /// of the last event is always free, so a position always exists
    /// (provided the reservation fits an idle resource; a reservation
    /// larger than the capacity itself yields infinity).
    pub fn earliest_available_position_after(
        &self,
        graph: &NetworkGraph,
        resource: ResourceId,
        reservation: &ResourceReservation,
        duration: f64,
        after: f64,
    ) -> f64 {
        let capacity = graph.resource(resource);
        if reservation.cpu_cores > capacity.cpu_cores + CAPACITY_EPSILON
            || reservation.memory_bytes > capacity.memory_bytes + CAPACITY_EPSILON
        {
            return f64::INFINITY;
        }

        let mut candidates = vec![after];
        for e in self.events_of_resource(resource) {
            if e.start > after {
                candidates.push(e.start);
            }
            if e.end() > after {
                candidates.push(e.end());
            }
        }
        candidates.sort_by(f64::total_cmp);
        candidates.dedup();

        for p in candidates {
            if self.fits(graph, resource, reservation, p, p + duration) {
                return p;
            }
        }
        // Unreachable: the latest end is always conflict-free.
        after
    }

    /// Latest end position among the events of a step; 0 when the step is
    /// unscheduled.
    pub fn step_end_position(&self, step: StepId) -> f64 {
        self.events_of_step(step)
            .map(|e| e.end())
            .fold(0.0, f64::max)
    }

    /// The event of a step that finishes last.
    pub fn latest_finishing_event_of_step(&self, step: StepId) -> Option<&SchedulingEvent> {
        self.events_of_step(step)
            .max_by(|a, b| a.end().total_cmp(&b.end()))
    }

    /// Resource of the step's latest-finishing event.
    pub fn scheduled_resource_of_step(&self, step: StepId) -> Option<ResourceId> {
        self.latest_finishing_event_of_step(step).map(|e| e.resource)
    }

    /// Position at or after which synchronous prerequisites of `step` are
    /// done. 0 when the step has none scheduled.
    pub fn synchronous_parent_position(&self, pipeline: &Pipeline, step: StepId) -> f64 {
        pipeline
            .prerequisites_of(step)
            .filter(|d| d.kind == DependencyKind::Synchronous)
            .map(|d| self.step_end_position(d.prerequisite))
            .fold(0.0, f64::max)
    }

    /// Position at which the asynchronous prerequisite of `step` has made
    /// its `scale_level`-th output available. Producers emit while
    /// running, so replica k of a scaled consumer may start as soon as
    /// output k exists. 0 when the step has no scheduled asynchronous
    /// prerequisite.
    pub fn asynchronous_parent_position(
        &self,
        pipeline: &Pipeline,
        step: StepId,
        scale_level: u32,
    ) -> f64 {
        let Some(parent) = pipeline.asynchronous_parent_of(step) else {
            return 0.0;
        };
        self.events_of_step(parent)
            .map(|e| e.start + e.estimation.time_to_output(scale_level))
            .fold(0.0, f64::max)
    }

    /// The synchronization position of a step about to be scheduled: the
    /// latest of its synchronous prerequisites' ends and its asynchronous
    /// prerequisite's `scale_level`-th output.
    pub fn step_synchronization_position(
        &self,
        pipeline: &Pipeline,
        step: StepId,
        scale_level: u32,
    ) -> f64 {
        self.synchronous_parent_position(pipeline, step)
            .max(self.asynchronous_parent_position(pipeline, step, scale_level))
    }

    /// Maximum end position across all events; 0 when empty.
    pub fn total_time(&self) -> f64 {
        self.events.iter().map(|e| e.end()).fold(0.0, f64::max)
    }

    /// Σ event duration × resource cost per second.
    pub fn resource_cost(&self, graph: &NetworkGraph) -> f64 {
        self.events
            .iter()
            .map(|e| e.duration() * graph.resource(e.resource).cost_per_second)
            .sum()
    }

    /// Σ transfer cost of each event's input data from its producer
    /// resource.
    pub fn data_transmission_cost(&self, graph: &NetworkGraph) -> f64 {
        self.events
            .iter()
            .map(|e| {
                graph.transfer_cost(
                    e.estimation.producer_resource,
                    e.resource,
                    e.estimation.transmitted_bytes,
                )
            })
            .sum()
    }

    /// Σ inputs covered across the events of a step. Equals the step's
    /// expected inputs when a scaled step's share partition is correct.
    pub fn inputs_covered_of_step(&self, step: StepId) -> u64 {
        self.events_of_step(step)
            .map(|e| e.estimation.number_of_transmitted_inputs())
            .sum()
    }

    /// Deterministic total order on timelines: lexicographic over the
    /// sorted event list by (start, resource, step, duration). Used to
    /// break score ties reproducibly.
    pub fn canonical_cmp(&self, other: &Timeline) -> Ordering {
        for (a, b) in self.events.iter().zip(other.events.iter()) {
            let ord = a
                .start
                .total_cmp(&b.start)
                .then_with(|| a.resource.cmp(&b.resource))
                .then_with(|| a.step.cmp(&b.step))
                .then_with(|| a.duration().total_cmp(&b.duration()));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.events.len().cmp(&other.events.len())
    }

    /// The CSV row view: one row per event, ordered by start position,
    /// ties by resource name then step name.
    pub fn to_rows(&self, pipeline: &Pipeline, graph: &NetworkGraph) -> Vec<TimelineRow> {
        let mut rows: Vec<TimelineRow> = self
            .events
            .iter()
            .map(|e| TimelineRow {
                step: pipeline.step_name(e.step).to_string(),
                start_position_seconds: e.start,
                end_position_seconds: e.end(),
                resource: graph.resource_name(e.resource).to_string(),
                cpu_reservation: e.reservation.cpu_cores,
                memory_reservation: e.reservation.memory_bytes,
            })
            .collect();
        rows.sort_by(|a, b| {
            a.start_position_seconds
                .total_cmp(&b.start_position_seconds)
                .then_with(|| a.resource.cmp(&b.resource))
                .then_with(|| a.step.cmp(&b.step))
        });
        rows
    }
}
