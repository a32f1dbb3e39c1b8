//! Form catalog hot reload

use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use formflow_core::{FormConfigStore, Result, form::FormCatalog};

use crate::app::AppState;

/// Load, validate and swap in the catalog; the current one stays on failure
pub async fn reload_catalog(state: &AppState, store: &dyn FormConfigStore) -> Result<usize> {
    let result: Result<FormCatalog> = async {
        let catalog = store.load_catalog().await?;
        store.validate_catalog(&catalog).await?;
        Ok(catalog)
    }
    .await;

    state.metrics().record_catalog_reload(result.is_ok());

    let catalog = result?;
    let forms = catalog.len();
    state.replace_catalog(catalog).await;
    Ok(forms)
}

/// Reload the catalog every time the store reports a change
pub fn spawn_catalog_watcher(state: AppState, store: Arc<dyn FormConfigStore>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut changes = match store.watch_changes().await {
            Ok(changes) => changes,
            Err(e) => {
                error!("Failed to watch form catalog: {}", e);
                return;
            }
        };

        while let Some(change) = changes.next().await {
            match change {
                Ok(change) => match reload_catalog(&state, store.as_ref()).await {
                    Ok(forms) => info!(version = change.version, forms, "Reloaded form catalog"),
                    Err(e) => warn!("Keeping previous form catalog, reload failed: {}", e),
                },
                Err(e) => warn!("Form catalog watch error: {}", e),
            }
        }

        info!("Form catalog watcher stopped");
    })
}
