//! Test doubles for the cluster client and the record store

#![allow(dead_code)]

use async_trait::async_trait;
use common::{Route, RouteId, RoutePath, RouteSpec};
use k8s_openapi::api::networking::v1::Ingress;
use kroute::apis::ingress::client::IngressClient;
use kroute::store::{MemoryRouteStore, RouteStore};
use kroute::{Result, RouteError};
use kube::error::ErrorResponse;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-process stand-in for the Kubernetes Ingress API
///
/// Stamps a resourceVersion on every write and rejects updates whose
/// resourceVersion does not match, like the API server does.
#[derive(Default)]
pub struct FakeIngressClient {
    ingresses: Mutex<BTreeMap<(String, String), Ingress>>,
    version: AtomicUsize,
    pub gets: AtomicUsize,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_writes: AtomicBool,
    /// Simulate another writer touching the Ingress right after each `get`
    pub bump_after_get: AtomicBool,
    pub delay: Mutex<Option<Duration>>,
}

fn api_error(code: u16, reason: &str, message: String) -> RouteError {
    RouteError::Kubernetes(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: reason.to_string(),
        code,
    }))
}

impl FakeIngressClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an Ingress directly, as if created out-of-band
    pub fn seed(&self, mut ingress: Ingress) {
        ingress.metadata.resource_version = Some(self.next_version());
        let key = (ingress.namespace().unwrap_or_default(), ingress.name_any());
        self.ingresses.lock().unwrap().insert(key, ingress);
    }

    /// Remove an Ingress behind the synchronizer's back
    pub fn remove(&self, namespace: &str, name: &str) {
        self.ingresses
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()));
    }

    pub fn stored(&self, namespace: &str, name: &str) -> Option<Ingress> {
        self.ingresses
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.ingresses.lock().unwrap().len()
    }

    pub fn mutations(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
            + self.updates.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst) + self.mutations()
    }

    fn next_version(&self) -> String {
        (self.version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    async fn maybe_delay(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(api_error(500, "InternalError", "injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IngressClient for FakeIngressClient {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Ingress>> {
        self.maybe_delay().await;
        self.gets.fetch_add(1, Ordering::SeqCst);
        let found = self.stored(namespace, name);

        if self.bump_after_get.load(Ordering::SeqCst) {
            let key = (namespace.to_string(), name.to_string());
            if let Some(current) = self.ingresses.lock().unwrap().get_mut(&key) {
                current.metadata.resource_version = Some(self.next_version());
            }
        }

        Ok(found)
    }

    async fn create(&self, namespace: &str, ingress: &Ingress) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        let key = (namespace.to_string(), ingress.name_any());
        let mut ingresses = self.ingresses.lock().unwrap();
        if ingresses.contains_key(&key) {
            return Err(RouteError::AlreadyExists(format!(
                "Ingress {}/{}",
                key.0, key.1
            )));
        }

        let mut created = ingress.clone();
        created.metadata.resource_version = Some(self.next_version());
        ingresses.insert(key, created);
        Ok(())
    }

    async fn update(&self, namespace: &str, ingress: &Ingress) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        let key = (namespace.to_string(), ingress.name_any());
        let mut ingresses = self.ingresses.lock().unwrap();
        let Some(current) = ingresses.get(&key) else {
            return Err(RouteError::NotFound(format!("Ingress {}/{}", key.0, key.1)));
        };

        if let Some(expected) = &ingress.metadata.resource_version {
            if current.metadata.resource_version.as_ref() != Some(expected) {
                return Err(api_error(
                    409,
                    "Conflict",
                    "the object has been modified".to_string(),
                ));
            }
        }

        let mut updated = ingress.clone();
        updated.metadata.resource_version = Some(self.next_version());
        ingresses.insert(key, updated);
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        self.ingresses
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| RouteError::NotFound(format!("Ingress {}/{}", namespace, name)))
    }
}

/// Memory store whose writes can be made to fail
#[derive(Default)]
pub struct FlakyRouteStore {
    inner: MemoryRouteStore,
    pub fail_writes: AtomicBool,
}

impl FlakyRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RouteError::Store("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RouteStore for FlakyRouteStore {
    async fn create(&self, spec: &RouteSpec) -> Result<RouteId> {
        self.check_writable()?;
        self.inner.create(spec).await
    }

    async fn delete(&self, id: RouteId) -> Result<()> {
        self.check_writable()?;
        self.inner.delete(id).await
    }

    async fn update(&self, route: &Route) -> Result<()> {
        self.check_writable()?;
        self.inner.update(route).await
    }

    async fn find_by_id(&self, id: RouteId) -> Result<Route> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<Route>> {
        self.inner.find_all().await
    }
}

/// The example route: a.example.com, default/svc-a, "/" -> svc-a-backend:80
pub fn example_spec() -> RouteSpec {
    RouteSpec {
        host: "a.example.com".to_string(),
        namespace: "default".to_string(),
        name: "svc-a".to_string(),
        paths: vec![RoutePath::new("/", "svc-a-backend", 80)],
    }
}
