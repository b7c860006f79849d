//! Route synchronizer
//!
//! Keeps the record store and the cluster's Ingress resources in agreement
//! for every mutating route operation, and serves reads from the record store.
//!
//! Mutations always touch the cluster first and the record store second.
//! Nothing is retried and nothing is compensated: if the second write fails
//! the first one stays, and the caller sees the error.

use crate::apis::ingress::client::IngressClient;
use crate::apis::ingress::ingress::translate_route;
use crate::apis::metrics::record_route_sync;
use crate::error::{Result, RouteError};
use crate::store::RouteStore;
use common::{Route, RouteId, RouteSpec};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Result of [`RouteSynchronizer::add_route`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Ingress created and route persisted under this id
    Created(RouteId),

    /// An Ingress with this namespace/name already existed; nothing was written
    AlreadyExists,
}

impl AddOutcome {
    pub fn id(&self) -> Option<RouteId> {
        match self {
            AddOutcome::Created(id) => Some(*id),
            AddOutcome::AlreadyExists => None,
        }
    }
}

/// Route synchronizer
///
/// Holds one shared cluster client and one record store; no per-call state.
#[derive(Clone)]
pub struct RouteSynchronizer {
    ingresses: Arc<dyn IngressClient>,
    store: Arc<dyn RouteStore>,
    ingress_class: String,
}

impl RouteSynchronizer {
    pub fn new(
        ingresses: Arc<dyn IngressClient>,
        store: Arc<dyn RouteStore>,
        ingress_class: impl Into<String>,
    ) -> Self {
        Self {
            ingresses,
            store,
            ingress_class: ingress_class.into(),
        }
    }

    pub fn ingress_class(&self) -> &str {
        &self.ingress_class
    }

    /// Create the Ingress for a route, then persist the route
    ///
    /// An existing Ingress at the route's namespace/name is left alone and
    /// reported as [`AddOutcome::AlreadyExists`].
    pub async fn add_route(&self, spec: &RouteSpec) -> Result<AddOutcome> {
        let start = Instant::now();
        let result = self.add_route_inner(spec).await;

        let label = match &result {
            Ok(AddOutcome::Created(_)) => "created",
            Ok(AddOutcome::AlreadyExists) => "exists",
            Err(e) => e.kind(),
        };
        record_route_sync("add", start.elapsed().as_secs_f64(), label);
        result
    }

    async fn add_route_inner(&self, spec: &RouteSpec) -> Result<AddOutcome> {
        let key = spec.key();
        let ingress = translate_route(spec, &self.ingress_class);

        if self.ingresses.get(key.namespace, key.name).await?.is_some() {
            warn!("Ingress {} already exists, skipping add", key);
            return Ok(AddOutcome::AlreadyExists);
        }

        self.ingresses.create(key.namespace, &ingress).await?;
        info!(
            "Created Ingress {} (host: {}, {} path(s))",
            key,
            spec.host,
            spec.paths.len()
        );

        let id = self.store.create(spec).await.map_err(|e| {
            warn!(
                "Ingress {} created but route record was not persisted: {}",
                key, e
            );
            e
        })?;
        info!("Route {} persisted with id {}", key, id);

        Ok(AddOutcome::Created(id))
    }

    /// Update the Ingress of an existing route, then the record
    ///
    /// Host and paths may change; namespace and name may not.
    pub async fn update_route(&self, route: &Route) -> Result<()> {
        let start = Instant::now();
        let result = self.update_route_inner(route).await;
        record_route_sync(
            "update",
            start.elapsed().as_secs_f64(),
            result_label(&result),
        );
        result
    }

    async fn update_route_inner(&self, route: &Route) -> Result<()> {
        let stored = self.store.find_by_id(route.id).await?;

        // The Ingress is addressed by namespace/name, so they are fixed for
        // the lifetime of the record
        let key = route.key();
        if stored.key() != key {
            warn!(
                "Route {} update would move {} to {}, rejecting",
                route.id,
                stored.key(),
                key
            );
            return Err(RouteError::InvalidRoute(format!(
                "namespace/name cannot change (route {} is {})",
                route.id,
                stored.key()
            )));
        }

        let mut ingress = translate_route(&route.spec, &self.ingress_class);

        let Some(existing) = self.ingresses.get(key.namespace, key.name).await? else {
            warn!(
                "Ingress {} not found, refusing to update route {}",
                key, route.id
            );
            return Err(RouteError::NotFound(format!("Ingress {}", key)));
        };

        // Optimistic write: a concurrent change between probe and update
        // fails with a conflict instead of being overwritten
        ingress.metadata.resource_version = existing.metadata.resource_version;

        self.ingresses.update(key.namespace, &ingress).await?;
        info!("Updated Ingress {} for route {}", key, route.id);

        self.store.update(route).await.map_err(|e| {
            warn!(
                "Ingress {} updated but route {} record was not: {}",
                key, route.id, e
            );
            e
        })?;

        Ok(())
    }

    /// Delete the Ingress of a route, then the record
    ///
    /// When the Ingress is already gone the record is kept and `NotFound` is
    /// returned; the mismatch needs an operator.
    pub async fn delete_route(&self, id: RouteId) -> Result<()> {
        let start = Instant::now();
        let result = self.delete_route_inner(id).await;
        record_route_sync(
            "delete",
            start.elapsed().as_secs_f64(),
            result_label(&result),
        );
        result
    }

    async fn delete_route_inner(&self, id: RouteId) -> Result<()> {
        let route = self.store.find_by_id(id).await?;
        let key = route.key();

        if self.ingresses.get(key.namespace, key.name).await?.is_none() {
            warn!(
                "Ingress {} not found, keeping route {} record for reconciliation",
                key, id
            );
            return Err(RouteError::NotFound(format!("Ingress {}", key)));
        }

        self.ingresses.delete(key.namespace, key.name).await?;
        info!("Deleted Ingress {} for route {}", key, id);

        self.store.delete(id).await.map_err(|e| {
            warn!(
                "Ingress {} deleted but route {} record was not: {}",
                key, id, e
            );
            e
        })?;

        Ok(())
    }

    pub async fn find_route_by_id(&self, id: RouteId) -> Result<Route> {
        self.store.find_by_id(id).await
    }

    pub async fn find_all_routes(&self) -> Result<Vec<Route>> {
        self.store.find_all().await
    }
}

fn result_label(result: &Result<()>) -> &'static str {
    match result {
        Ok(()) => "success",
        Err(e) => e.kind(),
    }
}
