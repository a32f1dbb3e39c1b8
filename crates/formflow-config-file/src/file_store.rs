//! File-based FormConfigStore implementation

use async_trait::async_trait;
use futures::stream;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use formflow_core::{
    Error, FormConfigStore, Result,
    config_store::{ConfigChange, ConfigChangeStream},
    form::FormCatalog,
};

/// Parse catalog file contents; `toml` selects TOML, anything else YAML
pub fn parse_catalog(contents: &str, extension: Option<&str>) -> Result<FormCatalog> {
    if extension == Some("toml") {
        toml::from_str(contents).map_err(|e| {
            error!("Failed to parse TOML form catalog: {}", e);
            Error::Config(format!("Invalid TOML: {}", e))
        })
    } else {
        serde_yaml::from_str(contents).map_err(|e| {
            error!("Failed to parse YAML form catalog: {}", e);
            Error::Config(format!("Invalid YAML: {}", e))
        })
    }
}

fn expand_tilde(path: PathBuf) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?
            .join(rest)),
        Err(_) => Ok(path),
    }
}

/// Form catalog stored in a single file on disk
///
/// Watches the file for changes using the `notify` crate.
#[derive(Debug)]
pub struct FileFormConfigStore {
    catalog_path: PathBuf,
    /// Incremented for every change notification
    version: Arc<AtomicU32>,
}

impl FileFormConfigStore {
    /// Create a store for the catalog file at `catalog_path`
    ///
    /// # Errors
    /// - `Error::ConfigNotFound` if the file doesn't exist
    /// - `Error::Config` if the home directory can't be determined for a `~` path
    pub async fn new(catalog_path: impl Into<PathBuf>) -> Result<Self> {
        let catalog_path = expand_tilde(catalog_path.into())?;

        if !catalog_path.exists() {
            return Err(Error::ConfigNotFound);
        }

        info!("Initialized FileFormConfigStore for {:?}", catalog_path);

        Ok(Self {
            catalog_path,
            version: Arc::new(AtomicU32::new(0)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.catalog_path
    }

    fn read_catalog_file(&self) -> Result<FormCatalog> {
        let contents = std::fs::read_to_string(&self.catalog_path).map_err(|e| {
            error!("Failed to read form catalog: {}", e);
            Error::Io(e)
        })?;

        let extension = self.catalog_path.extension().and_then(|s| s.to_str());
        let catalog = parse_catalog(&contents, extension)?;

        debug!(forms = catalog.len(), "Successfully read form catalog");
        Ok(catalog)
    }
}

#[async_trait]
impl FormConfigStore for FileFormConfigStore {
    async fn load_catalog(&self) -> Result<FormCatalog> {
        self.read_catalog_file()
    }

    async fn watch_changes(&self) -> Result<ConfigChangeStream<'_>> {
        let (tx, rx) = mpsc::channel(100);

        let catalog_path = self.catalog_path.clone();
        let version = self.version.clone();

        tokio::task::spawn_blocking(move || {
            let (notify_tx, notify_rx) = std::sync::mpsc::channel();

            // std::result::Result to avoid the crate alias
            let mut watcher = match RecommendedWatcher::new(
                move |res: std::result::Result<Event, notify::Error>| {
                    if let Err(e) = notify_tx.send(res) {
                        error!("Failed to send file watch event: {}", e);
                    }
                },
                notify::Config::default(),
            ) {
                Ok(w) => w,
                Err(e) => {
                    error!("Failed to create file watcher: {}", e);
                    return;
                }
            };

            if let Err(e) = watcher.watch(&catalog_path, RecursiveMode::NonRecursive) {
                error!("Failed to watch form catalog: {}", e);
                return;
            }

            info!("Watching form catalog for changes: {:?}", catalog_path);

            while let Ok(event_result) = notify_rx.recv() {
                match event_result {
                    Ok(event) => {
                        if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                            let change = ConfigChange {
                                timestamp: chrono::Utc::now(),
                                version: version.fetch_add(1, Ordering::SeqCst) + 1,
                            };

                            if tx.blocking_send(Ok(change)).is_err() {
                                debug!("Catalog change stream closed, stopping watcher");
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("File watch error: {}", e);
                        if tx
                            .blocking_send(Err(Error::Internal(format!("File watch error: {}", e))))
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        Ok(Box::pin(stream))
    }
}
