use thiserror::Error;

/// Route service errors
#[derive(Error, Debug)]
pub enum RouteError {
    /// Record or Ingress absent when the operation needs it
    #[error("{0} not found")]
    NotFound(String),

    /// Ingress creation lost a race with another writer
    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Kubernetes error: {0}")]
    Kubernetes(#[from] kube::Error),

    /// Record store failure that is not an IO or serialization error
    /// (id space exhausted, or any failure of an external store backend)
    #[error("Record store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RouteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RouteError::NotFound(_))
    }

    /// Metric label for this error
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::NotFound(_) => "not_found",
            RouteError::AlreadyExists(_) => "already_exists",
            RouteError::InvalidRoute(_) | RouteError::PayloadTooLarge(_) => "invalid",
            RouteError::Kubernetes(_) => "kubernetes_error",
            RouteError::Store(_) | RouteError::Serialization(_) | RouteError::Io(_) => {
                "store_error"
            }
            RouteError::Timeout(_) => "timeout",
            RouteError::Config(_) => "config_error",
        }
    }
}

pub type Result<T, E = RouteError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = RouteError::NotFound("route 12".to_string());
        assert_eq!(err.to_string(), "route 12 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(RouteError::Timeout(30).kind(), "timeout");
        assert_eq!(RouteError::Store("disk full".into()).kind(), "store_error");
        assert_eq!(
            RouteError::AlreadyExists("default/svc-a".into()).kind(),
            "already_exists"
        );
        assert!(!RouteError::InvalidRoute("bad".into()).is_not_found());
    }
}
