//! In-memory route store

use super::RouteStore;
use crate::error::{Result, RouteError};
use async_trait::async_trait;
use common::{Route, RouteId, RouteSpec};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Route table shared by the memory and file stores
#[derive(Debug, Clone)]
pub(crate) struct RouteTable {
    next_id: RouteId,
    routes: BTreeMap<RouteId, Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            routes: BTreeMap::new(),
        }
    }
}

pub(crate) fn not_found(id: RouteId) -> RouteError {
    RouteError::NotFound(format!("route {}", id))
}

fn ids_exhausted() -> RouteError {
    RouteError::Store("route id space exhausted".to_string())
}

impl RouteTable {
    /// Rebuild a table from loaded routes
    ///
    /// Ids continue after both `next_id` and the largest loaded id, so a
    /// deleted id is never handed out again.
    pub(crate) fn from_routes(next_id: RouteId, routes: Vec<Route>) -> Result<Self> {
        let routes: BTreeMap<RouteId, Route> = routes.into_iter().map(|r| (r.id, r)).collect();
        let after_max = match routes.keys().next_back() {
            Some(max) => max.checked_add(1).ok_or_else(ids_exhausted)?,
            None => 1,
        };
        Ok(Self {
            next_id: next_id.max(after_max),
            routes,
        })
    }

    pub(crate) fn next_id(&self) -> RouteId {
        self.next_id
    }

    pub(crate) fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub(crate) fn insert(&mut self, spec: &RouteSpec) -> Result<RouteId> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or_else(ids_exhausted)?;
        self.routes.insert(id, Route::new(id, spec.clone()));
        Ok(id)
    }

    pub(crate) fn replace(&mut self, route: &Route) -> Result<()> {
        let slot = self.routes.get_mut(&route.id).ok_or_else(|| not_found(route.id))?;
        *slot = route.clone();
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: RouteId) -> Result<()> {
        self.routes.remove(&id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    pub(crate) fn get(&self, id: RouteId) -> Result<Route> {
        self.routes.get(&id).cloned().ok_or_else(|| not_found(id))
    }
}

/// Process-local [`RouteStore`]; contents are lost on restart
#[derive(Default)]
pub struct MemoryRouteStore {
    table: RwLock<RouteTable>,
}

impl MemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RouteStore for MemoryRouteStore {
    async fn create(&self, spec: &RouteSpec) -> Result<RouteId> {
        self.table.write().await.insert(spec)
    }

    async fn delete(&self, id: RouteId) -> Result<()> {
        self.table.write().await.remove(id)
    }

    async fn update(&self, route: &Route) -> Result<()> {
        self.table.write().await.replace(route)
    }

    async fn find_by_id(&self, id: RouteId) -> Result<Route> {
        self.table.read().await.get(id)
    }

    async fn find_all(&self) -> Result<Vec<Route>> {
        Ok(self.table.read().await.routes().cloned().collect())
    }
}
