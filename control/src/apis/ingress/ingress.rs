//! Ingress translation
//!
//! Turns a route definition into the Ingress that ingress-nginx (or the
//! configured class) serves.

use common::{RoutePath, RouteSpec};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Label marking Ingresses owned by this service
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "kroute";

/// Annotation describing where the Ingress came from
pub const GENERATED_BY_ANNOTATION: &str = "kroute.io/generated-by";
pub const GENERATED_BY_VALUE: &str = "kroute route service";

/// Ingress pathType for every generated path
pub const PATH_TYPE_PREFIX: &str = "Prefix";

/// Build the Ingress for a route
///
/// One rule for the route's host with one Prefix path per route path, in
/// input order. No default backend and no TLS.
pub fn translate_route(spec: &RouteSpec, ingress_class: &str) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some(spec.name.clone()),
            namespace: Some(spec.namespace.clone()),
            labels: Some(managed_labels()),
            annotations: Some(managed_annotations()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            ingress_class_name: Some(ingress_class.to_string()),
            default_backend: None,
            tls: None,
            rules: Some(vec![IngressRule {
                host: Some(spec.host.clone()),
                http: Some(HTTPIngressRuleValue {
                    paths: spec.paths.iter().map(translate_path).collect(),
                }),
            }]),
        }),
        status: None,
    }
}

fn translate_path(path: &RoutePath) -> HTTPIngressPath {
    HTTPIngressPath {
        path: Some(path.path.clone()),
        path_type: PATH_TYPE_PREFIX.to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: path.service.clone(),
                port: Some(ServiceBackendPort {
                    number: Some(i32::from(path.port)),
                    name: None,
                }),
            }),
            resource: None,
        },
    }
}

fn managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string())])
}

fn managed_annotations() -> BTreeMap<String, String> {
    BTreeMap::from([(
        GENERATED_BY_ANNOTATION.to_string(),
        GENERATED_BY_VALUE.to_string(),
    )])
}
