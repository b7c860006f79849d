//! Ingress client
//!
//! Thin wrapper over the Kubernetes API for Ingress resources, addressed by
//! (namespace, name). The synchronizer only sees the [`IngressClient`] trait.

use crate::error::{Result, RouteError};
use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, DeleteParams, PostParams};
use kube::{Client, ResourceExt};
use tracing::debug;

/// Field manager recorded on writes
const FIELD_MANAGER: &str = "kroute";

/// Cluster-side operations on Ingress resources
#[async_trait]
pub trait IngressClient: Send + Sync {
    /// Fetch an Ingress; `None` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Ingress>>;

    async fn create(&self, namespace: &str, ingress: &Ingress) -> Result<()>;

    /// Replace an existing Ingress (name taken from its metadata)
    async fn update(&self, namespace: &str, ingress: &Ingress) -> Result<()>;

    async fn delete(&self, namespace: &str, name: &str) -> Result<()>;
}

/// [`IngressClient`] backed by a shared `kube::Client`
#[derive(Clone)]
pub struct KubeIngressClient {
    client: Client,
}

impl KubeIngressClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Ingress> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn post_params() -> PostParams {
    PostParams {
        dry_run: false,
        field_manager: Some(FIELD_MANAGER.to_string()),
    }
}

/// Map API errors with a well-formed status code onto route errors
fn map_api_error(err: kube::Error, namespace: &str, name: &str) -> RouteError {
    if let kube::Error::Api(response) = &err {
        match (response.code, response.reason.as_str()) {
            (404, _) => return RouteError::NotFound(format!("Ingress {}/{}", namespace, name)),
            (409, "AlreadyExists") => {
                return RouteError::AlreadyExists(format!("Ingress {}/{}", namespace, name))
            }
            _ => {}
        }
    }
    RouteError::Kubernetes(err)
}

#[async_trait]
impl IngressClient for KubeIngressClient {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Ingress>> {
        let ingress = self
            .api(namespace)
            .get_opt(name)
            .await
            .map_err(|e| map_api_error(e, namespace, name))?;

        debug!(
            "Ingress {}/{} probe: exists={}",
            namespace,
            name,
            ingress.is_some()
        );
        Ok(ingress)
    }

    async fn create(&self, namespace: &str, ingress: &Ingress) -> Result<()> {
        let name = ingress.name_any();
        self.api(namespace)
            .create(&post_params(), ingress)
            .await
            .map_err(|e| map_api_error(e, namespace, &name))?;
        Ok(())
    }

    async fn update(&self, namespace: &str, ingress: &Ingress) -> Result<()> {
        let name = ingress.name_any();
        self.api(namespace)
            .replace(&name, &post_params(), ingress)
            .await
            .map_err(|e| map_api_error(e, namespace, &name))?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.api(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| map_api_error(e, namespace, name))?;
        Ok(())
    }
}
