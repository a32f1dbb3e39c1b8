use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Postgres,
    Memory,
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Sqlite
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "Invalid session store '{}'. Use 'sqlite', 'postgres' or 'memory'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub forms: FormsConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_false")]
    pub log_sql_queries: bool,

    /// Emit JSON log lines instead of human-readable ones
    #[serde(default = "default_false")]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsConfig {
    /// Form catalog file (YAML, or TOML with a `.toml` extension)
    #[serde(default = "default_forms_path")]
    pub path: String,

    /// Reload the catalog when the file changes
    #[serde(default = "default_false")]
    pub watch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub store: StoreBackend,

    #[serde(default)]
    pub sqlite: SqliteStoreConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresStoreConfig>,

    /// Lifetime of a new session record; unset means records never expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,

    /// HMAC key for the session cookie; a random key is generated when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    #[serde(default)]
    pub cookie: CookieConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    #[serde(default = "default_sqlite_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresStoreConfig {
    pub connection_string: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_acquire_timeout_seconds")]
    pub acquire_timeout_seconds: u64,

    #[serde(default = "default_idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,

    #[serde(default = "default_max_lifetime_seconds")]
    pub max_lifetime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,

    #[serde(default = "default_false")]
    pub secure: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_seconds: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            forms: FormsConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_sql_queries: false,
            json: false,
        }
    }
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            path: default_forms_path(),
            watch: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::default(),
            sqlite: SqliteStoreConfig::default(),
            postgres: None,
            ttl_seconds: None,
            secret: None,
            cookie: CookieConfig::default(),
        }
    }
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            secure: false,
            max_age_seconds: None,
        }
    }
}

impl SessionConfig {
    /// Session lifetime as a duration; values too large for a timestamp are an error
    pub fn ttl(&self) -> anyhow::Result<Option<chrono::Duration>> {
        let Some(seconds) = self.ttl_seconds else {
            return Ok(None);
        };
        let ttl = i64::try_from(seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| anyhow::anyhow!("session.ttl_seconds {} is out of range", seconds))?;
        Ok(Some(ttl))
    }
}

impl PostgresStoreConfig {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_seconds: default_acquire_timeout_seconds(),
            idle_timeout_seconds: default_idle_timeout_seconds(),
            max_lifetime_seconds: default_max_lifetime_seconds(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(
        path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        // Server settings
        if let Ok(val) = std::env::var("FORMFLOW_HOST") {
            self.host = val;
        }

        if let Ok(val) = std::env::var("FORMFLOW_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring invalid FORMFLOW_PORT '{}'", val),
            }
        }

        // Logging settings
        if let Ok(val) = std::env::var("FORMFLOW_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Some(enabled) = env_bool("FORMFLOW_LOG_SQL_QUERIES") {
            self.logging.log_sql_queries = enabled;
        }

        if let Some(enabled) = env_bool("FORMFLOW_LOG_JSON") {
            self.logging.json = enabled;
        }

        // Form catalog settings
        if let Ok(val) = std::env::var("FORMFLOW_FORMS_PATH") {
            self.forms.path = val;
        }

        if let Some(enabled) = env_bool("FORMFLOW_FORMS_WATCH") {
            self.forms.watch = enabled;
        }

        // Session settings
        if let Ok(val) = std::env::var("FORMFLOW_SESSION_STORE") {
            match val.parse::<StoreBackend>() {
                Ok(store) => self.session.store = store,
                Err(e) => warn!("{}", e),
            }
        }

        if let Ok(val) = std::env::var("FORMFLOW_SQLITE_PATH") {
            self.session.sqlite.path = val;
        }

        if let Ok(val) = std::env::var("FORMFLOW_POSTGRES_URL") {
            match &mut self.session.postgres {
                Some(postgres) => postgres.connection_string = val,
                None => self.session.postgres = Some(PostgresStoreConfig::new(val)),
            }
        }

        if let Ok(val) = std::env::var("FORMFLOW_SESSION_TTL_SECONDS") {
            match val.parse::<u64>() {
                Ok(ttl) => self.session.ttl_seconds = Some(ttl),
                Err(_) => warn!("Ignoring invalid FORMFLOW_SESSION_TTL_SECONDS '{}'", val),
            }
        }

        if let Ok(val) = std::env::var("FORMFLOW_SESSION_SECRET") {
            self.session.secret = Some(val);
        }

        if let Ok(val) = std::env::var("FORMFLOW_COOKIE_NAME") {
            self.session.cookie.name = val;
        }

        if let Some(enabled) = env_bool("FORMFLOW_COOKIE_SECURE") {
            self.session.cookie.secure = enabled;
        }
    }
}

/// Read a boolean override, warning when the value is not `true` or `false`
fn env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    match val.parse::<bool>() {
        Ok(enabled) => Some(enabled),
        Err(_) => {
            warn!("Ignoring invalid {} '{}'", name, val);
            None
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_forms_path() -> String {
    "config/forms.yaml".to_string()
}

fn default_sqlite_path() -> String {
    "~/.formflow/sessions.db".to_string()
}

fn default_cookie_name() -> String {
    "__form_session".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout_seconds() -> u64 {
    5
}

fn default_idle_timeout_seconds() -> u64 {
    600
}

fn default_max_lifetime_seconds() -> u64 {
    1800
}

fn default_false() -> bool {
    false
}
