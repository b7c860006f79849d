//! KROUTE Control Plane Library
//!
//! Route registry that mirrors every route into a Kubernetes Ingress.
//! Exposes the synchronizer, its collaborators and the HTTP API for the
//! binary and tests.

pub mod api;
pub mod apis;
pub mod config;
pub mod error;
pub mod store;
pub mod sync;

pub use error::{Result, RouteError};
pub use sync::{AddOutcome, RouteSynchronizer};
