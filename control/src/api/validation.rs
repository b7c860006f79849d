//! Route validation
//!
//! Rejects definitions the API server would refuse anyway, before any
//! cluster or store call is made.

use common::{RoutePath, RouteSpec};

/// Maximum length of a DNS-1123 label
const MAX_LABEL_LEN: usize = 63;

/// Maximum length of a DNS-1123 subdomain
const MAX_HOSTNAME_LEN: usize = 253;

/// Validate a full route definition
pub fn validate_route_spec(spec: &RouteSpec) -> Result<(), String> {
    validate_label("namespace", &spec.namespace)?;
    validate_label("name", &spec.name)?;
    validate_hostname(&spec.host)?;

    for (idx, path) in spec.paths.iter().enumerate() {
        validate_route_path(path).map_err(|e| format!("paths[{}]: {}", idx, e))?;
    }

    Ok(())
}

fn validate_route_path(path: &RoutePath) -> Result<(), String> {
    validate_path(&path.path)?;
    validate_label("service", &path.service)?;

    if path.port == 0 {
        return Err("Service port must be between 1 and 65535".to_string());
    }

    Ok(())
}

/// Validate a DNS-1123 label (namespaces, Ingress and Service names)
///
/// Rules:
/// - 1 to 63 characters
/// - Lowercase alphanumeric characters and hyphens only
/// - Must not start or end with hyphen
pub fn validate_label(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} cannot be empty", field));
    }

    if value.len() > MAX_LABEL_LEN {
        return Err(format!(
            "{} '{}' exceeds {} characters",
            field, value, MAX_LABEL_LEN
        ));
    }

    if value.starts_with('-') || value.ends_with('-') {
        return Err(format!(
            "{} '{}' cannot start or end with '-'",
            field, value
        ));
    }

    if let Some(c) = value
        .chars()
        .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
    {
        return Err(format!(
            "{} '{}' contains invalid character '{}' (must be lowercase alphanumeric or hyphen)",
            field, value, c
        ));
    }

    Ok(())
}

/// Validate an Ingress path prefix
///
/// Rules:
/// - Must start with "/"
/// - Must not have double slashes
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Path cannot be empty".to_string());
    }

    if !path.starts_with('/') {
        return Err(format!("Path '{}' must start with '/'", path));
    }

    if path.contains("//") {
        return Err(format!("Path '{}' cannot contain double slashes", path));
    }

    Ok(())
}

/// Validate hostname according to DNS-1123 subdomain spec
///
/// Rules:
/// - Lowercase alphanumeric characters, hyphens, and dots only
/// - Must not start or end with hyphen
/// - Must not have empty labels
/// - Can start with wildcard "*."
/// - Max length 253 characters
pub fn validate_hostname(hostname: &str) -> Result<(), String> {
    if hostname.is_empty() {
        return Err("Hostname cannot be empty".to_string());
    }

    if hostname.len() > MAX_HOSTNAME_LEN {
        return Err(format!(
            "Hostname '{}' exceeds {} characters",
            hostname, MAX_HOSTNAME_LEN
        ));
    }

    let hostname_to_check = hostname.strip_prefix("*.").unwrap_or(hostname);

    if hostname_to_check.is_empty() {
        return Err("Hostname cannot be just '*.'".to_string());
    }

    for label in hostname_to_check.split('.') {
        if label.is_empty() {
            return Err(format!("Hostname '{}' has an empty label", hostname));
        }
        validate_label("Hostname label", label)?;
    }

    Ok(())
}
