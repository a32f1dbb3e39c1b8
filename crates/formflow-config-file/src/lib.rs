//! File-based form catalog store
//!
//! This crate implements the `FormConfigStore` trait on top of a single YAML
//! or TOML file with a top-level `forms:` map.
//!
//! # Features
//! - YAML (default) and TOML (`.toml` extension) formats
//! - `~` expansion of the configured path
//! - Real-time file watching with `notify`
//!
//! # Example
//! ```no_run
//! # use formflow_config_file::FileFormConfigStore;
//! # use formflow_core::FormConfigStore;
//! # async fn example() -> formflow_core::Result<()> {
//! let store = FileFormConfigStore::new("config/forms.yaml").await?;
//! let catalog = store.load_catalog().await?;
//! # Ok(())
//! # }
//! ```

mod file_store;

pub use file_store::{FileFormConfigStore, parse_catalog};
