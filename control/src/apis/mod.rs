//! Kubernetes API integrations
//!
//! Ingress translation and the cluster client, plus the sync metrics.

pub mod ingress;
pub mod metrics;
