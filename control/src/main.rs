use anyhow::Result;
use kroute::api::{shutdown_signal, ApiServer, ApiState};
use kroute::apis::ingress::client::KubeIngressClient;
use kroute::config::ServiceConfig;
use kroute::store::{FileRouteStore, MemoryRouteStore, RouteStore};
use kroute::RouteSynchronizer;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// KROUTE - route registry mirrored into Kubernetes Ingress
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (needed for Kubernetes TLS client)
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok(); // Ignore error if already installed

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;
    info!("🦀 KROUTE route service");
    info!("   IngressClass: {}", config.ingress_class);
    info!(
        "   Request timeout: {}s",
        config.timeouts.request_timeout_secs
    );

    let client = kube::Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;
    let ingresses = Arc::new(KubeIngressClient::new(client));

    let store: Arc<dyn RouteStore> = match &config.store_path {
        Some(path) => {
            info!("   Record store: {}", path.display());
            Arc::new(FileRouteStore::open(path).await?)
        }
        None => {
            warn!("KROUTE_STORE_PATH not set, routes are kept in memory only");
            Arc::new(MemoryRouteStore::new())
        }
    };

    let sync = RouteSynchronizer::new(ingresses, store, config.ingress_class.clone());
    let state = Arc::new(ApiState::new(sync, config.timeouts.request_timeout()));

    let server = ApiServer::bind(&config.bind_addr, state).await?;
    info!("Press Ctrl-C to exit.");

    server.serve(shutdown_signal(signal::ctrl_c())).await?;

    Ok(())
}
