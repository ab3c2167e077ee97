use std::{
    collections::HashMap,
    error, fmt, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use model::Route;
use tokio::sync::RwLock;

use crate::config::DEFAULT_ROUTE_SLOT;

#[derive(Debug, Clone)]
pub enum StoreError {
    /// Nothing was saved yet. Expected on first run.
    NotFound,
    Serialization(Arc<serde_json::Error>),
    Deserialization(Arc<serde_json::Error>),
    Io(Arc<io::Error>),
}

impl error::Error for StoreError {}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "no saved route"),
            StoreError::Serialization(e) => write!(f, "could not serialize route: {}", e),
            StoreError::Deserialization(e) => {
                write!(f, "could not deserialize route: {}", e)
            }
            StoreError::Io(e) => write!(f, "storage io error: {}", e),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound,
            _ => StoreError::Io(Arc::new(e)),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable slot holding the whole route. Every save replaces the previous
/// contents.
#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn save(&self, route: &Route) -> StoreResult<()>;
    async fn load(&self) -> StoreResult<Route>;
}

pub fn encode(route: &Route) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(route).map_err(|why| StoreError::Serialization(Arc::new(why)))
}

pub fn decode(data: &[u8]) -> StoreResult<Route> {
    serde_json::from_slice(data).map_err(|why| StoreError::Deserialization(Arc::new(why)))
}

/// Keeps serialized routes in memory, keyed by slot name. Clones share the
/// same slots.
#[derive(Clone)]
pub struct MemoryStore {
    slot: String,
    slots: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new<S: Into<String>>(slot: S) -> Self {
        Self {
            slot: slot.into(),
            slots: Arc::default(),
        }
    }

    /// Another slot backed by the same memory.
    pub fn slot<S: Into<String>>(&self, slot: S) -> Self {
        Self {
            slot: slot.into(),
            slots: self.slots.clone(),
        }
    }

    /// Raw contents of the slot, e.g. to plant corrupted data in tests.
    pub async fn raw(&self) -> Option<Vec<u8>> {
        self.slots.read().await.get(&self.slot).cloned()
    }

    pub async fn put_raw(&self, data: Vec<u8>) {
        self.slots.write().await.insert(self.slot.clone(), data);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_ROUTE_SLOT)
    }
}

#[async_trait]
impl RouteStore for MemoryStore {
    async fn save(&self, route: &Route) -> StoreResult<()> {
        let data = encode(route)?;
        self.put_raw(data).await;
        Ok(())
    }

    async fn load(&self) -> StoreResult<Route> {
        let data = self.raw().await.ok_or(StoreError::NotFound)?;
        decode(&data)
    }
}

/// One JSON file per slot, `<directory>/<slot>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    directory: PathBuf,
    slot: String,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>, S: Into<String>>(directory: P, slot: S) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            slot: slot.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(format!("{}.json", self.slot))
    }
}

#[async_trait]
impl RouteStore for JsonFileStore {
    async fn save(&self, route: &Route) -> StoreResult<()> {
        let data = encode(route)?;
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|why| StoreError::Io(Arc::new(why)))?;
        // write next to the target and rename, so a crash never leaves a
        // half written route behind
        let path = self.path();
        let temporary = path.with_extension("json.tmp");
        tokio::fs::write(&temporary, data)
            .await
            .map_err(|why| StoreError::Io(Arc::new(why)))?;
        tokio::fs::rename(&temporary, &path)
            .await
            .map_err(|why| StoreError::Io(Arc::new(why)))?;
        Ok(())
    }

    async fn load(&self) -> StoreResult<Route> {
        let data = tokio::fs::read(self.path()).await?;
        decode(&data)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};
    use model::{ExampleData, GeoPoint, SavedLocation};
    use utility::id::Id;

    use super::*;

    /// Null subtitles, nanosecond timestamps, awkward floats and the same
    /// coordinate recorded twice.
    fn tricky_route() -> Route {
        let t0 = DateTime::from_timestamp(1_742_205_600, 987_654_321).unwrap();
        let home = GeoPoint::new(41.008_238_123_456_79, 28.978_359_000_000_001);
        Route::from(vec![
            SavedLocation::new(Id::default(), home, "Starting point", t0),
            SavedLocation::new(
                Id::default(),
                GeoPoint::new(-33.868_820_1, 151.209_295_7),
                "10:01:40",
                t0 + Duration::nanoseconds(100_000_000_001),
            )
            .with_subtitle("George St, Sydney"),
            SavedLocation::new(
                Id::default(),
                home,
                "10:05:00",
                t0 + Duration::seconds(300),
            ),
            SavedLocation::new(
                Id::default(),
                GeoPoint::new(0.1 + 0.2, -0.000_001),
                "10:06:00",
                t0 + Duration::seconds(360),
            )
            .with_subtitle(""),
        ])
    }

    #[tokio::test]
    async fn memory_store_round_trip_is_exact() {
        let store = MemoryStore::default();
        let route = tricky_route();
        store.save(&route).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, route);
        for (a, b) in loaded.iter().zip(route.iter()) {
            assert_eq!(a.position.latitude.to_bits(), b.position.latitude.to_bits());
            assert_eq!(
                a.position.longitude.to_bits(),
                b.position.longitude.to_bits()
            );
        }
    }

    #[tokio::test]
    async fn empty_slot_is_not_found() {
        let store = MemoryStore::default();
        assert!(matches!(store.load().await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn save_overwrites_wholesale() {
        let store = MemoryStore::default();
        store.save(&tricky_route()).await.unwrap();
        store.save(&Route::example_data()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Route::example_data());
        store.save(&Route::new()).await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn slots_are_independent() {
        let store = MemoryStore::default();
        let other = store.slot("other");
        store.save(&Route::example_data()).await.unwrap();
        assert!(matches!(other.load().await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn corrupted_data_is_a_deserialization_error() {
        let store = MemoryStore::default();
        store.put_raw(b"[{\"latitude\": \"north\"}]".to_vec()).await;
        assert!(matches!(
            store.load().await,
            Err(StoreError::Deserialization(_))
        ));
    }

    #[tokio::test]
    async fn persisted_format_is_a_plain_array() {
        let store = MemoryStore::default();
        store.save(&Route::example_data()).await.unwrap();
        let raw = store.raw().await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        let first = &json.as_array().unwrap()[0];
        let mut keys = first
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        keys.sort();
        assert_eq!(
            keys,
            vec!["latitude", "longitude", "subtitle", "timestamp", "title"]
        );
    }

    #[tokio::test]
    async fn file_store_round_trip_is_exact() {
        let directory = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(directory.path().join("nested"), "savedRoute");
        assert!(matches!(store.load().await, Err(StoreError::NotFound)));

        let route = tricky_route();
        store.save(&route).await.unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load().await.unwrap(), route);

        // a fresh store on the same file sees the same data
        let reopened = JsonFileStore::new(directory.path().join("nested"), "savedRoute");
        assert_eq!(reopened.load().await.unwrap(), route);
    }

    #[tokio::test]
    async fn file_store_reports_corruption() {
        let directory = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(directory.path(), "savedRoute");
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(
            store.load().await,
            Err(StoreError::Deserialization(_))
        ));
    }
}
