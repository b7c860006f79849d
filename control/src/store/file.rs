//! File-backed route store
//!
//! Keeps the route table in memory and rewrites a JSON file on every
//! mutation. The file is written to a temporary sibling and renamed into
//! place, so a crash mid-write leaves the previous contents intact.

use super::memory::RouteTable;
use super::RouteStore;
use crate::error::{Result, RouteError};
use async_trait::async_trait;
use common::{Route, RouteId, RouteSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    next_id: RouteId,
    routes: Vec<Route>,
}

/// [`RouteStore`] persisted to a JSON file
pub struct FileRouteStore {
    path: PathBuf,
    table: RwLock<RouteTable>,
}

impl FileRouteStore {
    /// Open the store at `path`, loading existing routes
    ///
    /// A missing file starts an empty store; the file is created on the
    /// first write.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let table = match fs::read_to_string(&path).await {
            Ok(content) => {
                let file: StoreFile = serde_json::from_str(&content)?;
                info!(
                    "Loaded {} route(s) from {}",
                    file.routes.len(),
                    path.display()
                );
                RouteTable::from_routes(file.next_id, file.routes)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Route store {} not found, starting empty", path.display());
                RouteTable::default()
            }
            Err(e) => return Err(RouteError::Io(e)),
        };

        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, table: &RouteTable) -> Result<()> {
        let file = StoreFile {
            next_id: table.next_id(),
            routes: table.routes().cloned().collect(),
        };
        let content = serde_json::to_vec_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &content).await?;
        fs::rename(&tmp_path, &self.path).await?;

        debug!(
            "Persisted {} route(s) to {}",
            file.routes.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Apply `op` to a copy of the table, persist it, then publish it
    ///
    /// The write lock is held across the file write so concurrent mutations
    /// are serialized and the file never lags the table.
    async fn mutate<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut RouteTable) -> Result<T>,
    {
        let mut table = self.table.write().await;
        let mut next = table.clone();
        let value = op(&mut next)?;
        self.persist(&next).await?;
        *table = next;
        Ok(value)
    }
}

#[async_trait]
impl RouteStore for FileRouteStore {
    async fn create(&self, spec: &RouteSpec) -> Result<RouteId> {
        self.mutate(|table| table.insert(spec)).await
    }

    async fn delete(&self, id: RouteId) -> Result<()> {
        self.mutate(|table| table.remove(id)).await
    }

    async fn update(&self, route: &Route) -> Result<()> {
        self.mutate(|table| table.replace(route)).await
    }

    async fn find_by_id(&self, id: RouteId) -> Result<Route> {
        self.table.read().await.get(id)
    }

    async fn find_all(&self) -> Result<Vec<Route>> {
        Ok(self.table.read().await.routes().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::RoutePath;

    fn temp_store_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("kroute-store-{}", uuid::Uuid::new_v4()))
            .join("routes.json")
    }

    fn spec(name: &str) -> RouteSpec {
        RouteSpec {
            host: format!("{}.example.com", name),
            namespace: "default".to_string(),
            name: name.to_string(),
            paths: vec![
                RoutePath::new("/api", "api", 8080),
                RoutePath::new("/", "web", 80),
            ],
        }
    }

    async fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let path = temp_store_path();
        let store = FileRouteStore::open(&path).await.unwrap();

        assert!(store.find_all().await.unwrap().is_empty());
        assert!(!path.exists(), "Nothing is written before the first mutation");
    }

    #[tokio::test]
    async fn test_routes_survive_reopen() {
        let path = temp_store_path();

        let store = FileRouteStore::open(&path).await.unwrap();
        let a = store.create(&spec("a")).await.unwrap();
        let b = store.create(&spec("b")).await.unwrap();
        store.delete(a).await.unwrap();
        drop(store);

        let reopened = FileRouteStore::open(&path).await.unwrap();
        let routes = reopened.find_all().await.unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].id, b);
        assert_eq!(routes[0].spec, spec("b"));

        // Deleted id is not handed out again after reopening
        let c = reopened.create(&spec("c")).await.unwrap();
        assert!(c > b);

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_update_persisted() {
        let path = temp_store_path();

        let store = FileRouteStore::open(&path).await.unwrap();
        let id = store.create(&spec("a")).await.unwrap();
        let mut route = store.find_by_id(id).await.unwrap();
        route.spec.paths.reverse();
        store.update(&route).await.unwrap();
        drop(store);

        let reopened = FileRouteStore::open(&path).await.unwrap();
        let loaded = reopened.find_by_id(id).await.unwrap();
        assert_eq!(loaded.spec.paths[0].path, "/");
        assert_eq!(loaded.spec.paths[1].path, "/api");

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_file_untouched() {
        let path = temp_store_path();

        let store = FileRouteStore::open(&path).await.unwrap();
        store.create(&spec("a")).await.unwrap();
        let before = fs::read_to_string(&path).await.unwrap();

        assert!(store.delete(99).await.unwrap_err().is_not_found());
        let after = fs::read_to_string(&path).await.unwrap();
        assert_eq!(before, after);

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let path = temp_store_path();
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, b"not json").await.unwrap();

        let result = FileRouteStore::open(&path).await;
        assert!(matches!(result, Err(RouteError::Serialization(_))));

        cleanup(&path).await;
    }

    #[tokio::test]
    async fn test_exhausted_id_space_is_store_error() {
        let path = temp_store_path();
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        let content = serde_json::to_vec(&StoreFile {
            next_id: 1,
            routes: vec![Route::new(RouteId::MAX, spec("a"))],
        })
        .unwrap();
        fs::write(&path, content).await.unwrap();

        let result = FileRouteStore::open(&path).await;
        assert!(matches!(result, Err(RouteError::Store(_))));

        cleanup(&path).await;
    }
}
