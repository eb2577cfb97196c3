//! Per-tenant connection settings.
//!
//! Each tenant's connection is described by a small TOML file,
//! `<location>/<tenant>.toml`:
//!
//! ```toml
//! url = "sqlite://data/company-x.db"
//! username = "app"
//! password = "secret"
//! driver = "sqlite"
//! ```
//!
//! [`TenantSettingsLoader`] reads one file per registered tenant.
//! [`ConnectionSettings::validate`] turns the raw, possibly incomplete
//! settings into a [`ConnectionConfig`] that the router can open a pool for.
//!
//! Passwords never reach `Debug` output or logs, including passwords embedded
//! in the connection URL; see [`redact_url`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::tenant::{TenantId, TenantRegistry};

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// SQLite through r2d2 + rusqlite.
    Sqlite,
    /// PostgreSQL through deadpool-postgres.
    Postgres,
}

impl Driver {
    /// Resolves a configured driver name.
    ///
    /// Accepts `sqlite` and `postgres` plus the aliases `postgresql`,
    /// `org.postgresql.Driver` and `org.sqlite.JDBC`. Matching ignores ASCII
    /// case. A driver that was not compiled in is rejected here so startup
    /// fails before any pool is opened.
    pub fn resolve(name: &str, tenant_id: &TenantId) -> Result<Self, ConfigError> {
        let driver = match name.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" | "org.sqlite.jdbc" => Driver::Sqlite,
            "postgres" | "postgresql" | "org.postgresql.driver" => Driver::Postgres,
            _ => {
                return Err(ConfigError::UnknownDriver {
                    tenant_id: tenant_id.clone(),
                    driver: name.to_string(),
                });
            }
        };

        if !driver.is_enabled() {
            return Err(ConfigError::DriverNotEnabled {
                tenant_id: tenant_id.clone(),
                driver: driver.name(),
                feature: driver.feature(),
            });
        }

        Ok(driver)
    }

    /// Canonical driver name.
    pub fn name(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite",
            Driver::Postgres => "postgres",
        }
    }

    /// Cargo feature that compiles this driver in.
    pub fn feature(&self) -> &'static str {
        self.name()
    }

    /// Whether this binary was built with the driver.
    pub fn is_enabled(&self) -> bool {
        match self {
            Driver::Sqlite => cfg!(feature = "sqlite"),
            Driver::Postgres => cfg!(feature = "postgres"),
        }
    }

    fn check_url(&self, url: &str) -> Result<(), String> {
        match self {
            Driver::Sqlite => SqliteTarget::parse(url).map(|_| ()),
            Driver::Postgres => check_postgres_url(url),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a SQLite URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteTarget {
    /// A private in-memory database (`sqlite::memory:`).
    Memory,
    /// A database file (`sqlite://<path>` or `sqlite:<path>`).
    File(PathBuf),
}

impl SqliteTarget {
    /// Parses a SQLite connection URL.
    pub fn parse(url: &str) -> Result<Self, String> {
        let rest = url
            .strip_prefix("sqlite:")
            .ok_or_else(|| format!("expected a sqlite: url, got '{}'", url))?;

        if rest == ":memory:" || rest == "//:memory:" {
            return Ok(SqliteTarget::Memory);
        }

        let path = rest.strip_prefix("//").unwrap_or(rest);
        if path.trim().is_empty() {
            return Err("sqlite url has no database path".to_string());
        }
        Ok(SqliteTarget::File(PathBuf::from(path)))
    }
}

#[cfg(feature = "postgres")]
fn check_postgres_url(url: &str) -> Result<(), String> {
    url.parse::<tokio_postgres::Config>()
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[cfg(not(feature = "postgres"))]
fn check_postgres_url(url: &str) -> Result<(), String> {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Ok(())
    } else {
        Err(format!("expected a postgres:// url, got '{}'", redact_url(url)))
    }
}

const REDACTED: &str = "[redacted]";

/// Masks credentials embedded in a connection URL.
///
/// Covers the `user:pass@` userinfo of URL-style strings and any
/// `password=` parameter, whether in a query string or in the key-value
/// form accepted by PostgreSQL.
pub fn redact_url(url: &str) -> Cow<'_, str> {
    let mut redacted = Cow::Borrowed(url);

    if let Some(scheme_end) = url.find("://") {
        let authority_start = scheme_end + 3;
        let rest = &url[authority_start..];
        let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        if let Some(at) = rest[..authority_len].rfind('@') {
            redacted = Cow::Owned(format!(
                "{}{}{}",
                &url[..authority_start],
                REDACTED,
                &rest[at..]
            ));
        }
    }

    if redacted.contains("password=") {
        redacted = Cow::Owned(redact_password_params(&redacted));
    }
    redacted
}

fn redact_password_params(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut rest = url;

    while let Some(pos) = rest.find("password=") {
        let value_start = pos + "password=".len();
        out.push_str(&rest[..value_start]);
        out.push_str(REDACTED);

        let value = &rest[value_start..];
        let value_len = match value.chars().next() {
            Some(quote @ ('\'' | '"')) => value[1..]
                .find(quote)
                .map_or(value.len(), |end| end + 2),
            _ => value
                .find(|c: char| c == '&' || c.is_whitespace())
                .unwrap_or(value.len()),
        };
        rest = &value[value_len..];
    }

    out.push_str(rest);
    out
}

/// Raw connection settings for one tenant, as read from configuration.
///
/// Every field is optional here so that a missing property can be reported
/// by name. The password, and any credentials inside the URL, are redacted
/// from `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionSettings {
    /// Connection URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Database user.
    #[serde(default)]
    pub username: Option<String>,

    /// Database password.
    #[serde(default)]
    pub password: Option<String>,

    /// Driver name; see [`Driver::resolve`].
    #[serde(default)]
    pub driver: Option<String>,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("url", &self.url.as_deref().map(redact_url))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("driver", &self.driver)
            .finish()
    }
}

impl ConnectionSettings {
    /// Creates fully populated settings.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        driver: impl Into<String>,
    ) -> Self {
        Self {
            url: Some(url.into()),
            username: Some(username.into()),
            password: Some(password.into()),
            driver: Some(driver.into()),
        }
    }

    /// Parses settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Fills in `driver` when the settings do not name one.
    pub fn with_default_driver(mut self, driver: Option<&str>) -> Self {
        if self.driver.as_deref().is_none_or(|d| d.trim().is_empty()) {
            self.driver = driver.map(str::to_string);
        }
        self
    }

    /// Checks that every required property is present and usable.
    ///
    /// Properties are checked in the order `url`, `username`, `password`,
    /// `driver`; the first absent one is reported.
    pub fn validate(&self, tenant_id: &TenantId) -> Result<ConnectionConfig, ConfigError> {
        let url = required(&self.url, tenant_id, "url")?;
        let username = required(&self.username, tenant_id, "username")?;
        let password = required(&self.password, tenant_id, "password")?;
        let driver_name = required(&self.driver, tenant_id, "driver")?;

        if url.trim().is_empty() {
            return Err(ConfigError::MissingProperty {
                tenant_id: tenant_id.clone(),
                property: "url",
            });
        }

        let driver = Driver::resolve(driver_name, tenant_id)?;
        driver
            .check_url(url)
            .map_err(|message| ConfigError::InvalidUrl {
                tenant_id: tenant_id.clone(),
                message,
            })?;

        Ok(ConnectionConfig {
            tenant_id: tenant_id.clone(),
            driver,
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

fn required<'a>(
    value: &'a Option<String>,
    tenant_id: &TenantId,
    property: &'static str,
) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .ok_or_else(|| ConfigError::MissingProperty {
            tenant_id: tenant_id.clone(),
            property,
        })
}

/// Validated connection settings for one tenant.
#[derive(Clone)]
pub struct ConnectionConfig {
    tenant_id: TenantId,
    driver: Driver,
    url: String,
    username: String,
    password: String,
}

impl ConnectionConfig {
    /// The tenant these settings belong to.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// The resolved driver.
    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// The connection URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The database user.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The database password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("tenant_id", &self.tenant_id)
            .field("driver", &self.driver)
            .field("url", &redact_url(&self.url))
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Loads `<location>/<tenant>.toml` for every registered tenant.
#[derive(Debug, Clone)]
pub struct TenantSettingsLoader {
    location: PathBuf,
    default_driver: Option<String>,
}

impl TenantSettingsLoader {
    /// Creates a loader reading from `location`.
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            default_driver: None,
        }
    }

    /// Driver used when a tenant file does not name one.
    pub fn with_default_driver(mut self, driver: Option<String>) -> Self {
        self.default_driver = driver.filter(|d| !d.trim().is_empty());
        self
    }

    /// Directory the tenant files are read from.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Path of the settings file for `tenant_id`.
    pub fn path_for(&self, tenant_id: &TenantId) -> PathBuf {
        self.location.join(format!("{}.toml", tenant_id))
    }

    /// Reads and validates the settings of every tenant in `registry`.
    ///
    /// Stops at the first tenant whose file is unreadable, malformed or
    /// incomplete. No tenant is ever skipped.
    pub fn load(
        &self,
        registry: &TenantRegistry,
    ) -> Result<BTreeMap<TenantId, ConnectionSettings>, ConfigError> {
        let mut loaded = BTreeMap::new();

        for tenant_id in registry.iter() {
            let settings = self.load_one(tenant_id)?;
            let config = settings.validate(tenant_id)?;

            info!(
                tenant = %tenant_id,
                driver = %config.driver(),
                settings = ?settings,
                "Tenant settings loaded"
            );
            loaded.insert(tenant_id.clone(), settings);
        }

        Ok(loaded)
    }

    fn load_one(&self, tenant_id: &TenantId) -> Result<ConnectionSettings, ConfigError> {
        let path = self.path_for(tenant_id);
        debug!(tenant = %tenant_id, path = %path.display(), "Reading tenant settings");

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::UnreadableSource {
            tenant_id: tenant_id.clone(),
            path: path.clone(),
            source,
        })?;

        let settings =
            ConnectionSettings::from_toml(&content).map_err(|e| ConfigError::MalformedSource {
                tenant_id: tenant_id.clone(),
                path: path.clone(),
                message: e.message().to_string(),
            })?;

        Ok(settings.with_default_driver(self.default_driver.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id)
    }

    #[test]
    fn test_driver_aliases() {
        let t = tenant("company-x");
        assert_eq!(Driver::resolve("sqlite", &t).unwrap(), Driver::Sqlite);
        assert_eq!(Driver::resolve("org.sqlite.JDBC", &t).unwrap(), Driver::Sqlite);
        assert_eq!(Driver::resolve(" SQLite ", &t).unwrap(), Driver::Sqlite);
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_postgres_aliases() {
        let t = tenant("company-x");
        for name in ["postgres", "postgresql", "org.postgresql.Driver"] {
            assert_eq!(Driver::resolve(name, &t).unwrap(), Driver::Postgres);
        }
    }

    #[cfg(not(feature = "postgres"))]
    #[test]
    fn test_postgres_requires_feature() {
        let err = Driver::resolve("postgresql", &tenant("company-x")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DriverNotEnabled {
                driver: "postgres",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_driver() {
        let err = Driver::resolve("oracle", &tenant("company-x")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown driver 'oracle' for tenant 'company-x'"
        );
    }

    #[test]
    fn test_sqlite_target_parse() {
        assert_eq!(SqliteTarget::parse("sqlite::memory:").unwrap(), SqliteTarget::Memory);
        assert_eq!(
            SqliteTarget::parse("sqlite://data/x.db").unwrap(),
            SqliteTarget::File(PathBuf::from("data/x.db"))
        );
        assert_eq!(
            SqliteTarget::parse("sqlite:///var/lib/x.db").unwrap(),
            SqliteTarget::File(PathBuf::from("/var/lib/x.db"))
        );
        assert_eq!(
            SqliteTarget::parse("sqlite:x.db").unwrap(),
            SqliteTarget::File(PathBuf::from("x.db"))
        );
        assert!(SqliteTarget::parse("sqlite://").is_err());
        assert!(SqliteTarget::parse("postgres://localhost/db").is_err());
    }

    #[test]
    fn test_validate_reports_first_missing_property() {
        let t = tenant("tenant-b");

        let settings = ConnectionSettings {
            username: Some("app".into()),
            password: Some("secret".into()),
            driver: Some("sqlite".into()),
            ..Default::default()
        };
        assert_eq!(
            settings.validate(&t).unwrap_err().to_string(),
            "property 'url' is required for tenant 'tenant-b'"
        );

        let settings = ConnectionSettings {
            url: Some("sqlite::memory:".into()),
            username: Some("app".into()),
            driver: Some("sqlite".into()),
            ..Default::default()
        };
        assert_eq!(
            settings.validate(&t).unwrap_err().to_string(),
            "property 'password' is required for tenant 'tenant-b'"
        );

        let settings = ConnectionSettings {
            url: Some("sqlite::memory:".into()),
            username: Some("app".into()),
            password: Some("secret".into()),
            driver: None,
        };
        assert_eq!(
            settings.validate(&t).unwrap_err().to_string(),
            "property 'driver' is required for tenant 'tenant-b'"
        );
    }

    #[test]
    fn test_validate_rejects_mismatched_url() {
        let settings = ConnectionSettings::new("mysql://host/db", "app", "secret", "sqlite");
        let err = settings.validate(&tenant("company-x")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_validate_success() {
        let settings = ConnectionSettings::new("sqlite::memory:", "app", "secret", "sqlite");
        let config = settings.validate(&tenant("company-x")).unwrap();
        assert_eq!(config.tenant_id().as_str(), "company-x");
        assert_eq!(config.driver(), Driver::Sqlite);
        assert_eq!(config.url(), "sqlite::memory:");
        assert_eq!(config.username(), "app");
        assert_eq!(config.password(), "secret");
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = ConnectionSettings::new("sqlite::memory:", "app", "hunter2", "sqlite");
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[redacted]"));

        let config = settings.validate(&tenant("company-x")).unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_debug_redacts_url_credentials() {
        let settings =
            ConnectionSettings::new("postgres://app:hunter2@db:5432/x", "app", "hunter2", "postgres");
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"), "{}", rendered);
        assert!(rendered.contains("postgres://[redacted]@db:5432/x"));

        let config = ConnectionConfig {
            tenant_id: tenant("company-x"),
            driver: Driver::Sqlite,
            url: "postgres://app:hunter2@db:5432/x".to_string(),
            username: "app".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(redact_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(redact_url("sqlite://data/x.db"), "sqlite://data/x.db");
        assert_eq!(
            redact_url("postgresql://app:p@ss@db/x"),
            "postgresql://[redacted]@db/x"
        );
        assert_eq!(
            redact_url("postgres://db/x?user=app&password=hunter2&sslmode=disable"),
            "postgres://db/x?user=app&password=[redacted]&sslmode=disable"
        );
        assert_eq!(
            redact_url("host=db user=app password='hunter 2' dbname=x"),
            "host=db user=app password=[redacted] dbname=x"
        );
        assert_eq!(redact_url("postgres://db/x#a@b"), "postgres://db/x#a@b");
    }

    #[test]
    fn test_default_driver_fallback() {
        let settings = ConnectionSettings {
            url: Some("sqlite::memory:".into()),
            username: Some("app".into()),
            password: Some("secret".into()),
            driver: None,
        }
        .with_default_driver(Some("sqlite"));
        assert_eq!(settings.driver.as_deref(), Some("sqlite"));

        let explicit = ConnectionSettings::new("sqlite::memory:", "app", "secret", "org.sqlite.JDBC")
            .with_default_driver(Some("postgres"));
        assert_eq!(explicit.driver.as_deref(), Some("org.sqlite.JDBC"));
    }

    #[test]
    fn test_loader_reads_every_tenant() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("company-x.toml"),
            "url = \"sqlite::memory:\"\nusername = \"x\"\npassword = \"px\"\ndriver = \"sqlite\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("company-y.toml"),
            "url = \"sqlite::memory:\"\nusername = \"y\"\npassword = \"py\"\n",
        )
        .unwrap();

        let registry = TenantRegistry::new(["company-x", "company-y"]).unwrap();
        let loader = TenantSettingsLoader::new(dir.path())
            .with_default_driver(Some("sqlite".to_string()));
        let loaded = loader.load(&registry).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[&tenant("company-x")].username.as_deref(), Some("x"));
        assert_eq!(loaded[&tenant("company-y")].driver.as_deref(), Some("sqlite"));
    }

    #[test]
    fn test_loader_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("tenant-a.toml"),
            "url = \"sqlite::memory:\"\nusername = \"a\"\npassword = \"a\"\ndriver = \"sqlite\"\n",
        )
        .unwrap();

        let registry = TenantRegistry::new(["tenant-a", "tenant-b"]).unwrap();
        let err = TenantSettingsLoader::new(dir.path()).load(&registry).unwrap_err();
        match err {
            ConfigError::UnreadableSource { tenant_id, path, .. } => {
                assert_eq!(tenant_id.as_str(), "tenant-b");
                assert!(path.ends_with("tenant-b.toml"));
            }
            other => panic!("expected unreadable source, got {:?}", other),
        }
    }

    #[test]
    fn test_loader_fails_on_missing_property() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("tenant-b.toml"),
            "username = \"b\"\npassword = \"b\"\ndriver = \"sqlite\"\n",
        )
        .unwrap();

        let registry = TenantRegistry::new(["tenant-b"]).unwrap();
        let err = TenantSettingsLoader::new(dir.path()).load(&registry).unwrap_err();
        assert_eq!(
            err.to_string(),
            "property 'url' is required for tenant 'tenant-b'"
        );
    }

    #[test]
    fn test_loader_fails_on_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tenant-a.toml"), "url = [unterminated").unwrap();

        let registry = TenantRegistry::new(["tenant-a"]).unwrap();
        let err = TenantSettingsLoader::new(dir.path()).load(&registry).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedSource { .. }));
    }
}
