//! services/api/src/adapters/store.rs
//!
//! File-backed implementation of the `StorageService` port. Each collection
//! is one JSON document under the data directory, named after its storage
//! key. Absent or malformed files read back as the empty collection so a
//! damaged data directory degrades to a fresh one instead of taking the
//! service down.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

use estate_crm_core::domain::{
    AiProvider, Campaign, IntegrationConfig, Mandate, Opportunity, Property, Prospect,
};
use estate_crm_core::ports::{keys, ChangeObserver, PortError, PortResult, StorageService};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StorageService` on top of per-collection JSON
/// files. Writes are atomic (write to a temp file, then rename) and observers
/// are notified synchronously, in registration order, after each write.
pub struct JsonFileStore {
    dir: PathBuf,
    // Serializes writers so concurrent saves to the same key cannot interleave.
    write_lock: tokio::sync::Mutex<()>,
    observers: Mutex<Vec<Arc<dyn ChangeObserver>>>,
}

impl JsonFileStore {
    /// Creates the store, ensuring the data directory exists.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: tokio::sync::Mutex::new(()),
            observers: Mutex::new(Vec::new()),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn load_collection<T: DeserializeOwned>(&self, key: &str) -> PortResult<Vec<T>> {
        match read_json(&self.path_for(key)).await? {
            Some(value) => match serde_json::from_value(value) {
                Ok(items) => Ok(items),
                Err(e) => {
                    error!(key, error = %e, "Malformed collection file, falling back to empty");
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    async fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> PortResult<()> {
        let value = serde_json::to_value(items)
            .map_err(|e| PortError::Unexpected(format!("Failed to serialize {key}: {e}")))?;
        self.write_value(key, &value).await
    }

    async fn write_value(&self, key: &str, value: &Value) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| PortError::Unexpected(format!("Failed to serialize {key}: {e}")))?;
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write {key}: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to commit {key}: {e}")))?;
        drop(_guard);

        self.notify(key);
        Ok(())
    }

    fn notify(&self, key: &str) {
        let observers = match self.observers.lock() {
            Ok(observers) => observers,
            Err(poisoned) => {
                warn!("Observer list lock poisoned, continuing with inner value");
                poisoned.into_inner()
            }
        };
        for observer in observers.iter() {
            observer.on_change(key);
        }
    }
}

async fn read_json(path: &Path) -> PortResult<Option<Value>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(PortError::Unexpected(format!(
                "Failed to read {}: {e}",
                path.display()
            )))
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Unparseable JSON file");
            Ok(None)
        }
    }
}

//=========================================================================================
// `StorageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StorageService for JsonFileStore {
    async fn load_properties(&self) -> PortResult<Vec<Property>> {
        self.load_collection(keys::PROPERTIES).await
    }

    async fn save_properties(&self, items: &[Property]) -> PortResult<()> {
        self.save_collection(keys::PROPERTIES, items).await
    }

    async fn load_prospects(&self) -> PortResult<Vec<Prospect>> {
        self.load_collection(keys::PROSPECTS).await
    }

    async fn save_prospects(&self, items: &[Prospect]) -> PortResult<()> {
        self.save_collection(keys::PROSPECTS, items).await
    }

    async fn load_mandates(&self) -> PortResult<Vec<Mandate>> {
        self.load_collection(keys::MANDATES).await
    }

    async fn save_mandates(&self, items: &[Mandate]) -> PortResult<()> {
        self.save_collection(keys::MANDATES, items).await
    }

    async fn load_opportunities(&self) -> PortResult<Vec<Opportunity>> {
        self.load_collection(keys::OPPORTUNITIES).await
    }

    async fn save_opportunities(&self, items: &[Opportunity]) -> PortResult<()> {
        self.save_collection(keys::OPPORTUNITIES, items).await
    }

    async fn load_campaigns(&self) -> PortResult<Vec<Campaign>> {
        self.load_collection(keys::CAMPAIGNS).await
    }

    async fn save_campaigns(&self, items: &[Campaign]) -> PortResult<()> {
        self.save_collection(keys::CAMPAIGNS, items).await
    }

    async fn load_ai_providers(&self) -> PortResult<Vec<AiProvider>> {
        self.load_collection(keys::AI_PROVIDERS).await
    }

    async fn save_ai_providers(&self, items: &[AiProvider]) -> PortResult<()> {
        self.save_collection(keys::AI_PROVIDERS, items).await
    }

    async fn load_integrations(&self) -> PortResult<Vec<IntegrationConfig>> {
        self.load_collection(keys::INTEGRATIONS).await
    }

    async fn save_integrations(&self, items: &[IntegrationConfig]) -> PortResult<()> {
        self.save_collection(keys::INTEGRATIONS, items).await
    }

    async fn load_blob(&self, key: &str) -> PortResult<Option<Value>> {
        read_json(&self.path_for(key)).await
    }

    async fn save_blob(&self, key: &str, value: &Value) -> PortResult<()> {
        self.write_value(key, value).await
    }

    fn register_observer(&self, observer: Arc<dyn ChangeObserver>) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(observer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_crm_core::domain::{PropertyStatus, PropertyType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn sample_property() -> Property {
        Property {
            id: Uuid::new_v4(),
            title: "Villa Moderne".to_string(),
            kind: PropertyType::Villa,
            price: 850_000,
            currency: "EUR".to_string(),
            location: "La Marsa, Tunis".to_string(),
            bedrooms: 4,
            bathrooms: 3,
            area: 280,
            status: PropertyStatus::ForSale,
            image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        assert!(store.load_properties().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_collection_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();

        let properties = vec![sample_property()];
        store.save_properties(&properties).await.unwrap();

        let loaded = store.load_properties().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, properties[0].id);
        assert_eq!(loaded[0].price, 850_000);
    }

    #[tokio::test]
    async fn malformed_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("crm-properties.json"), b"{not json").unwrap();

        assert!(store.load_properties().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_shape_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        std::fs::write(
            dir.path().join("crm-properties.json"),
            br#"{"unexpected": "shape"}"#,
        )
        .unwrap();

        assert!(store.load_properties().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn observers_fire_in_registration_order() {
        struct Recorder {
            tag: usize,
            log: Arc<Mutex<Vec<usize>>>,
            count: AtomicUsize,
        }
        impl ChangeObserver for Recorder {
            fn on_change(&self, key: &str) {
                assert_eq!(key, keys::PROPERTIES);
                self.count.fetch_add(1, Ordering::SeqCst);
                self.log.lock().unwrap().push(self.tag);
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..3 {
            store.register_observer(Arc::new(Recorder {
                tag,
                log: log.clone(),
                count: AtomicUsize::new(0),
            }));
        }

        store.save_properties(&[sample_property()]).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn blobs_round_trip_and_default_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();

        assert!(store.load_blob("crm-map-provider").await.unwrap().is_none());
        let value = serde_json::json!({"provider": "osm"});
        store.save_blob("crm-map-provider", &value).await.unwrap();
        assert_eq!(store.load_blob("crm-map-provider").await.unwrap(), Some(value));
    }
}
