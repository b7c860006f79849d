//! HTTP Request Handler
//!
//! Maps the JSON route API onto the synchronizer:
//!
//! - `POST   /api/v1/routes`      add a route
//! - `GET    /api/v1/routes`      list routes
//! - `GET    /api/v1/routes/{id}` fetch one route
//! - `PUT    /api/v1/routes/{id}` update a route
//! - `DELETE /api/v1/routes/{id}` delete a route
//! - `GET    /metrics`            Prometheus metrics
//! - `GET    /healthz`            liveness

use crate::api::validation::validate_route_spec;
use crate::apis::metrics::gather_controller_metrics;
use crate::error::RouteError;
use crate::sync::{AddOutcome, RouteSynchronizer};
use common::{Route, RouteId, RouteSpec};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared handler state
pub struct ApiState {
    sync: RouteSynchronizer,
    request_timeout: Duration,
}

impl ApiState {
    pub fn new(sync: RouteSynchronizer, request_timeout: Duration) -> Self {
        Self {
            sync,
            request_timeout,
        }
    }

    /// Run a synchronizer call under the request deadline
    ///
    /// On expiry the in-flight cluster or store call is dropped.
    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, RouteError>
    where
        F: Future<Output = Result<T, RouteError>>,
    {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RouteError::Timeout(self.request_timeout.as_secs())),
        }
    }
}

/// Handle one API request
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<ApiState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let result = match (method.as_str(), segments.as_slice()) {
        ("GET", ["healthz"]) => Ok(text_response(StatusCode::OK, "ok")),
        ("GET", ["metrics"]) => serve_metrics(),
        ("GET", ["api", "v1", "routes"]) => list_routes(&state).await,
        ("POST", ["api", "v1", "routes"]) => add_route(req, &state).await,
        ("GET", ["api", "v1", "routes", id]) => get_route(id, &state).await,
        ("PUT", ["api", "v1", "routes", id]) => update_route(id, req, &state).await,
        ("DELETE", ["api", "v1", "routes", id]) => delete_route(id, &state).await,
        (_, ["api", "v1", "routes"]) | (_, ["api", "v1", "routes", _]) => Ok(json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &json!({ "error": format!("Method {} not allowed on {}", method, path) }),
        )),
        _ => Ok(json_response(
            StatusCode::NOT_FOUND,
            &json!({ "error": format!("No handler for {}", path) }),
        )),
    };

    let response = result.unwrap_or_else(|e| error_response(&e));
    if response.status().is_server_error() {
        error!("{} {} -> {}", method, path, response.status());
    } else {
        debug!("{} {} -> {}", method, path, response.status());
    }
    Ok(response)
}

async fn add_route<B>(req: Request<B>, state: &ApiState) -> Result<Response<Full<Bytes>>, RouteError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let spec = read_route_spec(req).await?;
    info!("AddRoute request: {} (host: {})", spec.key(), spec.host);

    match state.with_deadline(state.sync.add_route(&spec)).await? {
        AddOutcome::Created(id) => Ok(json_response(
            StatusCode::CREATED,
            &json!({ "id": id, "message": format!("Route added with id {}", id) }),
        )),
        AddOutcome::AlreadyExists => Ok(json_response(
            StatusCode::OK,
            &json!({
                "id": null,
                "message": format!("Ingress {} already exists, route not added", spec.key()),
            }),
        )),
    }
}

async fn update_route<B>(
    id: &str,
    req: Request<B>,
    state: &ApiState,
) -> Result<Response<Full<Bytes>>, RouteError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let id = parse_route_id(id)?;
    let spec = read_route_spec(req).await?;
    info!("UpdateRoute request: {} ({})", id, spec.key());

    let route = Route::new(id, spec);
    state.with_deadline(state.sync.update_route(&route)).await?;

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": format!("Route {} updated", id) }),
    ))
}

async fn delete_route(id: &str, state: &ApiState) -> Result<Response<Full<Bytes>>, RouteError> {
    let id = parse_route_id(id)?;
    info!("DeleteRoute request: {}", id);

    state.with_deadline(state.sync.delete_route(id)).await?;

    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": id, "message": format!("Route {} deleted", id) }),
    ))
}

async fn get_route(id: &str, state: &ApiState) -> Result<Response<Full<Bytes>>, RouteError> {
    let id = parse_route_id(id)?;
    let route = state.with_deadline(state.sync.find_route_by_id(id)).await?;
    Ok(json_response(StatusCode::OK, &route))
}

async fn list_routes(state: &ApiState) -> Result<Response<Full<Bytes>>, RouteError> {
    let routes = state.with_deadline(state.sync.find_all_routes()).await?;
    Ok(json_response(StatusCode::OK, &routes))
}

fn serve_metrics() -> Result<Response<Full<Bytes>>, RouteError> {
    match gather_controller_metrics() {
        Ok(text) => {
            let mut response = text_response(StatusCode::OK, text);
            response.headers_mut().insert(
                hyper::header::CONTENT_TYPE,
                hyper::header::HeaderValue::from_static(prometheus::TEXT_FORMAT),
            );
            Ok(response)
        }
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            Ok(json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "error": e }),
            ))
        }
    }
}

fn parse_route_id(raw: &str) -> Result<RouteId, RouteError> {
    raw.parse::<RouteId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| RouteError::InvalidRoute(format!("Invalid route id '{}'", raw)))
}

async fn read_route_spec<B>(req: Request<B>) -> Result<RouteSpec, RouteError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                RouteError::PayloadTooLarge(MAX_BODY_BYTES)
            } else {
                RouteError::InvalidRoute(format!("Failed to read request body: {}", e))
            }
        })?
        .to_bytes();

    let spec: RouteSpec = serde_json::from_slice(&body)
        .map_err(|e| RouteError::InvalidRoute(format!("Malformed route JSON: {}", e)))?;

    validate_route_spec(&spec).map_err(|e| {
        warn!("Rejected route {}: {}", spec.key(), e);
        RouteError::InvalidRoute(e)
    })?;

    Ok(spec)
}

/// HTTP status for a route error
pub fn status_for(err: &RouteError) -> StatusCode {
    match err {
        RouteError::NotFound(_) => StatusCode::NOT_FOUND,
        RouteError::InvalidRoute(_) => StatusCode::BAD_REQUEST,
        RouteError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        RouteError::AlreadyExists(_) => StatusCode::CONFLICT,
        RouteError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        RouteError::Kubernetes(_)
        | RouteError::Store(_)
        | RouteError::Serialization(_)
        | RouteError::Config(_)
        | RouteError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &RouteError) -> Response<Full<Bytes>> {
    let status = status_for(err);
    if status.is_server_error() {
        error!("Route request failed: {}", err);
    } else {
        warn!("Route request rejected: {}", err);
    }
    json_response(status, &json!({ "error": err.to_string() }))
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(Full::new(Bytes::from(bytes)));
            *response.status_mut() = status;
            response.headers_mut().insert(
                hyper::header::CONTENT_TYPE,
                hyper::header::HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(e) => {
            error!("Failed to encode response: {}", e);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "response encoding failed")
        }
    }
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_id() {
        assert_eq!(parse_route_id("12").unwrap(), 12);
        assert!(parse_route_id("0").is_err());
        assert!(parse_route_id("-3").is_err());
        assert!(parse_route_id("abc").is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&RouteError::NotFound("route 1".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&RouteError::InvalidRoute("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&RouteError::AlreadyExists("default/a".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&RouteError::PayloadTooLarge(MAX_BODY_BYTES)),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(status_for(&RouteError::Timeout(30)), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(&RouteError::Store("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_json_response_headers() {
        let response = json_response(StatusCode::CREATED, &json!({"id": 1}));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(hyper::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
