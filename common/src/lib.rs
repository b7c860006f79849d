//! KROUTE Common Types
//!
//! Route model shared by the record store, the synchronizer and the HTTP API.
//! A route is an external hostname plus an ordered list of path-prefix to
//! backend Service mappings.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Record store identifier for a route (assigned on creation)
pub type RouteId = i64;

/// One path rule: requests under `path` go to `service:port`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutePath {
    /// Path prefix (e.g., "/api")
    pub path: String,

    /// Backend Service name in the route's namespace
    pub service: String,

    /// Backend Service port
    pub port: u16,
}

impl RoutePath {
    pub fn new(path: impl Into<String>, service: impl Into<String>, port: u16) -> Self {
        Self {
            path: path.into(),
            service: service.into(),
            port,
        }
    }
}

/// Route definition without a record identifier
///
/// `paths` keeps insertion order. The proxy evaluates prefixes in that order,
/// so entries are never sorted or deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteSpec {
    /// External hostname (e.g., "a.example.com")
    pub host: String,

    /// Kubernetes namespace of the generated Ingress
    pub namespace: String,

    /// Ingress name, unique within the namespace
    pub name: String,

    /// Ordered path rules
    #[cfg_attr(feature = "serde", serde(default))]
    pub paths: Vec<RoutePath>,
}

impl RouteSpec {
    /// Cluster-side key for this route
    pub fn key(&self) -> ResourceKey<'_> {
        ResourceKey {
            namespace: &self.namespace,
            name: &self.name,
        }
    }
}

/// Persisted route: a spec plus the identifier the record store assigned
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    pub id: RouteId,

    #[cfg_attr(feature = "serde", serde(flatten))]
    pub spec: RouteSpec,
}

impl Route {
    pub fn new(id: RouteId, spec: RouteSpec) -> Self {
        Self { id, spec }
    }

    pub fn key(&self) -> ResourceKey<'_> {
        self.spec.key()
    }
}

/// (namespace, name) pair addressing the Ingress of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKey<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
}

impl fmt::Display for ResourceKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
