//! Route record store
//!
//! The system of record for route definitions, independent of the cluster.
//! - memory: process-local table
//! - file: the same table persisted as a JSON file

pub mod file;
pub mod memory;

use crate::error::Result;
use async_trait::async_trait;
use common::{Route, RouteId, RouteSpec};

pub use file::FileRouteStore;
pub use memory::MemoryRouteStore;

/// CRUD access to persisted routes
///
/// Unknown identifiers are reported as `RouteError::NotFound`.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Persist a new route and return its identifier
    async fn create(&self, spec: &RouteSpec) -> Result<RouteId>;

    async fn delete(&self, id: RouteId) -> Result<()>;

    /// Replace every field of the route with `route.id`
    async fn update(&self, route: &Route) -> Result<()>;

    async fn find_by_id(&self, id: RouteId) -> Result<Route>;

    /// All routes, ordered by identifier
    async fn find_all(&self) -> Result<Vec<Route>>;
}
