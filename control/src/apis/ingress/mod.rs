//! Ingress support (networking.k8s.io/v1)
//!
//! - ingress: translate route definitions into Ingress resources
//! - client: read and write Ingress resources on the cluster

pub mod client;
#[allow(clippy::module_inception)]
pub mod ingress;
