//! Computing resource and network model.
//!
//! Resources are the hosts of the compute continuum: fog nodes next to the
//! data and on-demand cloud instances. Each carries CPU and memory
//! capacity plus a running cost; pairs of resources are connected by
//! directed network edges with bandwidth, latency, and a per-gigabyte
//! transfer price. Transfers within one resource take no time and cost
//! nothing.
//!
//! Resources live in an arena owned by [`NetworkGraph`]; cross-references
//! are stable [`ResourceId`] indices.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable index of a resource inside its [`NetworkGraph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(usize);

impl ResourceId {
    /// Arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A compute host that steps can be placed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource name.
    pub name: String,
    /// CPU capacity in cores (fractions allowed).
    pub cpu_cores: f64,
    /// Memory capacity in bytes.
    pub memory_bytes: f64,
    /// Running cost in USD per second of reserved time.
    pub cost_per_second: f64,
}

impl Resource {
    /// Creates a resource.
    pub fn new(
        name: impl Into<String>,
        cpu_cores: f64,
        memory_bytes: f64,
        cost_per_second: f64,
    ) -> Self {
        Self {
            name: name.into(),
            cpu_cores,
            memory_bytes,
            cost_per_second,
        }
    }
}

/// Transfer characteristics of a directed resource pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetworkEdge {
    /// Sustained throughput in bytes per second.
    pub bandwidth_bytes_per_sec: f64,
    /// One-way latency in seconds.
    pub latency_seconds: f64,
    /// Price of moving one gigabyte across this edge in USD.
    pub cost_per_gb: f64,
}

/// The resource arena and its pairwise network edges.
///
/// Read-only once handed to the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkGraph {
    resources: Vec<Resource>,
    edges: HashMap<(usize, usize), NetworkEdge>,
}

impl NetworkGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource, returning its ID. Adding a name twice returns the
    /// existing ID.
    pub fn add_resource(&mut self, resource: Resource) -> ResourceId {
        if let Some(id) = self.resource_id(&resource.name) {
            return id;
        }
        self.resources.push(resource);
        ResourceId(self.resources.len() - 1)
    }

    /// Declares the directed edge `from -> to`.
    pub fn add_edge(&mut self, from: ResourceId, to: ResourceId, edge: NetworkEdge) {
        self.edges.insert((from.0, to.0), edge);
    }

    /// The resource behind an ID.
    #[inline]
    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    /// Resource name shorthand.
    #[inline]
    pub fn resource_name(&self, id: ResourceId) -> &str {
        &self.resources[id.0].name
    }

    /// Looks up a resource by name.
    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resources
            .iter()
            .position(|r| r.name == name)
            .map(ResourceId)
    }

    /// All resource IDs in insertion order.
    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        (0..self.resources.len()).map(ResourceId)
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the graph has no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// The directed edge `from -> to`. `None` for an intra-resource pair or
    /// when the pair was never declared.
    pub fn edge(&self, from: ResourceId, to: ResourceId) -> Option<&NetworkEdge> {
        if from == to {
            return None;
        }
        self.edges.get(&(from.0, to.0))
    }

    /// Seconds needed to move `bytes` across `from -> to`: volume over
    /// bandwidth plus latency. Zero within one resource; `None` when the
    /// pair has no declared edge.
    pub fn transfer_seconds(&self, from: ResourceId, to: ResourceId, bytes: f64) -> Option<f64> {
        if from == to {
            return Some(0.0);
        }
        self.edge(from, to)
            .map(|e| bytes / e.bandwidth_bytes_per_sec + e.latency_seconds)
    }

    /// USD cost of moving `bytes` across `from -> to`. Zero within one
    /// resource or when the pair has no declared edge.
    pub fn transfer_cost(&self, from: ResourceId, to: ResourceId, bytes: f64) -> f64 {
        match self.edge(from, to) {
            Some(e) => e.cost_per_gb * bytes / 1e9,
            None => 0.0,
        }
    }
}
