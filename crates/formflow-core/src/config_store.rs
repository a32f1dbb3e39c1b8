//! Form catalog store trait
//!
//! The `FormConfigStore` trait abstracts over where form definitions come
//! from. The server loads the catalog once at startup and, when watching is
//! enabled, reloads it whenever the store reports a change.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::Result;
use crate::form::FormCatalog;

/// Type alias for catalog change streams
pub type ConfigChangeStream<'a> = BoxStream<'a, Result<ConfigChange>>;

/// Catalog change notification
#[derive(Debug, Clone)]
pub struct ConfigChange {
    /// Timestamp of the change
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Monotonic reload counter, starting at 1 for the first change
    pub version: u32,
}

/// Form catalog store trait
///
/// Implementations:
/// - `FileFormConfigStore`: YAML/TOML file on disk
///
/// # Example
/// ```no_run
/// # use formflow_core::config_store::FormConfigStore;
/// # async fn example(store: &dyn FormConfigStore) -> formflow_core::Result<()> {
/// let catalog = store.load_catalog().await?;
/// store.validate_catalog(&catalog).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait FormConfigStore: Send + Sync {
    /// Load the full form catalog
    ///
    /// # Errors
    /// - `Error::ConfigNotFound` if the source doesn't exist
    /// - `Error::Config` if it can't be parsed
    async fn load_catalog(&self) -> Result<FormCatalog>;

    /// Validate a catalog before it is swapped in
    ///
    /// # Errors
    /// - `Error::ConfigValidation` if validation fails
    async fn validate_catalog(&self, catalog: &FormCatalog) -> Result<()> {
        catalog.validate()
    }

    /// Watch for catalog changes
    ///
    /// The stream emits once per detected modification of the source.
    async fn watch_changes(&self) -> Result<ConfigChangeStream<'_>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::form::config::tests::test_catalog;
    use futures::StreamExt;

    struct StaticStore {
        catalog: FormCatalog,
    }

    #[async_trait]
    impl FormConfigStore for StaticStore {
        async fn load_catalog(&self) -> Result<FormCatalog> {
            Ok(self.catalog.clone())
        }

        async fn watch_changes(&self) -> Result<ConfigChangeStream<'_>> {
            Ok(futures::stream::empty().boxed())
        }
    }

    #[tokio::test]
    async fn test_default_validation_uses_catalog_rules() {
        let store = StaticStore {
            catalog: test_catalog(),
        };
        let catalog = store.load_catalog().await.unwrap();
        assert!(store.validate_catalog(&catalog).await.is_ok());

        let broken = FormCatalog::new().with_form(
            "empty",
            crate::form::FormConfig {
                hidden: false,
                disabled: false,
                debug: false,
                meta: Vec::new(),
                steps: Vec::new(),
                checkout: None,
                finished: None,
            },
        );
        assert!(matches!(
            store.validate_catalog(&broken).await,
            Err(Error::ConfigValidation(_))
        ));
    }

    #[tokio::test]
    async fn test_static_store_never_changes() {
        let store = StaticStore {
            catalog: FormCatalog::new(),
        };
        let mut changes = store.watch_changes().await.unwrap();
        assert!(changes.next().await.is_none());
    }
}
