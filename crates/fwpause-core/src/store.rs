//! Config store backends
//!
//! Both backends persist the same [`ConfigSnapshot`] document and overwrite
//! unconditionally. In dry-run mode neither touches its backing storage.

use crate::error::StoreError;
use crate::settings::{FirewallTarget, Settings, StorageSettings};
use crate::snapshot::ConfigSnapshot;
use async_trait::async_trait;
use fwpause_cloud::BlobApi;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Human-readable location, for logs and messages
    fn location(&self) -> String;

    async fn save(&self, snapshot: &ConfigSnapshot) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] when nothing was saved yet
    async fn load(&self) -> Result<ConfigSnapshot, StoreError>;
}

/// Snapshot kept in a JSON file on the local disk
pub struct LocalFileStore {
    path: PathBuf,
    target: FirewallTarget,
    dry_run: bool,
}

impl LocalFileStore {
    pub fn new(path: impl Into<PathBuf>, target: FirewallTarget) -> Self {
        Self {
            path: path.into(),
            target,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            location: self.location(),
            source,
        }
    }
}

#[async_trait]
impl ConfigStore for LocalFileStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn save(&self, snapshot: &ConfigSnapshot) -> Result<(), StoreError> {
        if self.dry_run {
            tracing::info!("[DRY RUN] would save configuration to {}", self.location());
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let content = snapshot.to_json().map_err(|source| StoreError::Json {
            location: self.location(),
            source,
        })?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::info!("Configuration saved to {}", self.location());
        Ok(())
    }

    async fn load(&self) -> Result<ConfigSnapshot, StoreError> {
        if self.dry_run {
            tracing::info!("[DRY RUN] would load configuration from {}", self.location());
            return Ok(ConfigSnapshot::placeholder(&self.target));
        }

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    location: self.location(),
                });
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let snapshot = ConfigSnapshot::from_json(&content).map_err(|source| StoreError::Json {
            location: self.location(),
            source,
        })?;
        tracing::debug!("Loaded configuration from {}", self.location());
        Ok(snapshot)
    }
}

/// Snapshot kept as a blob, keyed by `{resourceGroup}/{firewallName}/config.json`
pub struct BlobStore<B> {
    client: B,
    container: String,
    blob: String,
    target: FirewallTarget,
    dry_run: bool,
}

impl<B: BlobApi> BlobStore<B> {
    pub fn new(
        client: B,
        container: impl Into<String>,
        blob: impl Into<String>,
        target: FirewallTarget,
    ) -> Self {
        Self {
            client,
            container: container.into(),
            blob: blob.into(),
            target,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn client(&self) -> &B {
        &self.client
    }

    async fn ensure_container(&self) -> Result<(), StoreError> {
        if self.client.container_exists(&self.container).await? {
            return Ok(());
        }
        tracing::info!(
            "Creating container '{}' in storage account '{}'",
            self.container,
            self.client.account()
        );
        self.client.create_container(&self.container).await?;
        Ok(())
    }
}

#[async_trait]
impl<B: BlobApi> ConfigStore for BlobStore<B> {
    fn location(&self) -> String {
        format!(
            "https://{}.blob.core.windows.net/{}/{}",
            self.client.account(),
            self.container,
            self.blob
        )
    }

    async fn save(&self, snapshot: &ConfigSnapshot) -> Result<(), StoreError> {
        if self.dry_run {
            tracing::info!("[DRY RUN] would upload configuration to {}", self.location());
            return Ok(());
        }

        self.ensure_container().await?;
        let content = snapshot.to_json().map_err(|source| StoreError::Json {
            location: self.location(),
            source,
        })?;
        self.client
            .put_blob(&self.container, &self.blob, &content)
            .await?;

        tracing::info!("Configuration uploaded to {}", self.location());
        Ok(())
    }

    async fn load(&self) -> Result<ConfigSnapshot, StoreError> {
        if self.dry_run {
            tracing::info!(
                "[DRY RUN] would download configuration from {}",
                self.location()
            );
            return Ok(ConfigSnapshot::placeholder(&self.target));
        }

        let content = self
            .client
            .get_blob(&self.container, &self.blob)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                location: self.location(),
            })?;

        ConfigSnapshot::from_json(&content).map_err(|source| StoreError::Json {
            location: self.location(),
            source,
        })
    }
}

/// Build the store selected by the settings
pub fn from_settings<B, F>(settings: &Settings, blob_client: F) -> Box<dyn ConfigStore>
where
    B: BlobApi + 'static,
    F: FnOnce(&str) -> B,
{
    match &settings.storage {
        StorageSettings::Local { path } => Box::new(
            LocalFileStore::new(path.clone(), settings.firewall.clone()).dry_run(settings.dry_run),
        ),
        StorageSettings::Blob {
            account,
            container,
            blob,
        } => Box::new(
            BlobStore::new(
                blob_client(account),
                container.clone(),
                blob.clone(),
                settings.firewall.clone(),
            )
            .dry_run(settings.dry_run),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::FirewallObservation;
    use fwpause_cloud::testing::{BlobCall, FakeBlobStore, firewall_document};
    use tempfile::tempdir;

    fn target() -> FirewallTarget {
        FirewallTarget {
            resource_group: "rg1".to_string(),
            name: "fw1".to_string(),
        }
    }

    fn snapshot() -> ConfigSnapshot {
        let doc = firewall_document(&[("ipcfg1", Some("10.1.2.4"), "/x/publicIPAddresses/pip1")]);
        let observation = FirewallObservation::from_resource(&doc).unwrap();
        ConfigSnapshot::capture(&target(), &observation).unwrap()
    }

    #[tokio::test]
    async fn test_local_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("firewall-config.json");
        let store = LocalFileStore::new(&path, target());

        let saved = snapshot();
        store.save(&saved).await.unwrap();
        assert!(path.exists());
        assert_eq!(store.load().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_local_save_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("firewall-config.json");
        std::fs::write(&path, "stale").unwrap();

        let store = LocalFileStore::new(&path, target());
        store.save(&snapshot()).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.primary().unwrap().name, "ipcfg1");
    }

    #[tokio::test]
    async fn test_local_load_missing() {
        let dir = tempdir().unwrap();
        let store = LocalFileStore::new(dir.path().join("missing.json"), target());
        assert!(matches!(
            store.load().await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_local_load_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("firewall-config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = LocalFileStore::new(&path, target());
        assert!(matches!(store.load().await, Err(StoreError::Json { .. })));
    }

    #[tokio::test]
    async fn test_local_dry_run_touches_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("firewall-config.json");
        let store = LocalFileStore::new(&path, target()).dry_run(true);

        store.save(&snapshot()).await.unwrap();
        assert!(!path.exists());

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.ip_configurations.len(), 1);
        assert_eq!(loaded.firewall_name, "fw1");
    }

    #[tokio::test]
    async fn test_blob_creates_container_lazily() {
        let store = BlobStore::new(
            FakeBlobStore::new("stfwconfig"),
            "firewall-configs",
            "rg1/fw1/config.json",
            target(),
        );

        store.save(&snapshot()).await.unwrap();
        let client = store.client();
        assert!(client.has_container("firewall-configs"));
        assert!(client.blob("firewall-configs", "rg1/fw1/config.json").is_some());
        assert_eq!(
            client.calls()[..2],
            [
                BlobCall::ContainerExists("firewall-configs".to_string()),
                BlobCall::CreateContainer("firewall-configs".to_string()),
            ]
        );

        store.save(&snapshot()).await.unwrap();
        let creates = client
            .calls()
            .iter()
            .filter(|c| matches!(c, BlobCall::CreateContainer(_)))
            .count();
        assert_eq!(creates, 1);

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.primary().unwrap().public_ip_name(), Some("pip1"));
    }

    #[tokio::test]
    async fn test_blob_load_missing() {
        let store = BlobStore::new(
            FakeBlobStore::new("stfwconfig"),
            "firewall-configs",
            "rg1/fw1/config.json",
            target(),
        );
        match store.load().await {
            Err(StoreError::NotFound { location }) => {
                assert_eq!(
                    location,
                    "https://stfwconfig.blob.core.windows.net/firewall-configs/rg1/fw1/config.json"
                );
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blob_dry_run_makes_no_calls() {
        let store = BlobStore::new(
            FakeBlobStore::new("stfwconfig"),
            "firewall-configs",
            "rg1/fw1/config.json",
            target(),
        )
        .dry_run(true);

        store.save(&snapshot()).await.unwrap();
        store.load().await.unwrap();
        assert!(store.client().calls().is_empty());
    }
}
