//! Server configuration.
//!
//! Every option can be given on the command line or through an environment
//! variable.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `REST_SERVER_PORT` | 8080 | Server port |
//! | `REST_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `REST_LOG_LEVEL` | info | Log level |
//! | `REST_MAX_BODY_SIZE` | 1048576 | Max request body (bytes) |
//! | `REST_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `REST_ENABLE_CORS` | true | Enable CORS |
//! | `REST_CORS_ORIGINS` | * | Allowed origins |
//! | `REST_CORS_METHODS` | GET,POST,OPTIONS | Allowed methods |
//! | `REST_CORS_HEADERS` | Content-Type,Accept,X-Tenant-Id | Allowed headers |
//! | `REST_TENANTS` | (none) | Comma separated tenant identifiers |
//! | `REST_TENANTS_LOCATION` | tenants | Directory holding `<tenant>.toml` files |
//! | `REST_DATASOURCE_DRIVER` | (none) | Driver for tenant files that name none |
//! | `REST_MAX_CONNECTIONS` | 10 | Pool size per tenant |
//! | `REST_SHUTDOWN_TIMEOUT` | 10 | Graceful shutdown drain (seconds) |
//!
//! # Example
//!
//! ```rust
//! use tenantry_rest::ServerConfig;
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     tenants: vec!["company-x".to_string(), "company-y".to_string()],
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;

use clap::Parser;

/// Server configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "tenantry")]
#[command(about = "Multi-tenant product service with per-tenant databases")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "REST_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "REST_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "REST_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "REST_MAX_BODY_SIZE", default_value = "1048576")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "REST_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "REST_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "REST_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(long, env = "REST_CORS_METHODS", default_value = "GET,POST,OPTIONS")]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "REST_CORS_HEADERS",
        default_value = "Content-Type,Accept,X-Tenant-Id"
    )]
    pub cors_headers: String,

    /// Tenant identifiers served by this instance.
    #[arg(long, env = "REST_TENANTS", value_delimiter = ',')]
    pub tenants: Vec<String>,

    /// Directory containing one `<tenant>.toml` connection file per tenant.
    #[arg(long, env = "REST_TENANTS_LOCATION", default_value = "tenants")]
    pub tenants_location: PathBuf,

    /// Driver used when a tenant file does not name one.
    #[arg(long, env = "REST_DATASOURCE_DRIVER")]
    pub datasource_driver: Option<String>,

    /// Maximum pooled connections per tenant.
    #[arg(long, env = "REST_MAX_CONNECTIONS", default_value = "10")]
    pub max_connections: u32,

    /// Seconds to wait for in-flight requests on shutdown.
    #[arg(long, env = "REST_SHUTDOWN_TIMEOUT", default_value = "10")]
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,OPTIONS".to_string(),
            cors_headers: "Content-Type,Accept,X-Tenant-Id".to_string(),
            tenants: Vec::new(),
            tenants_location: PathBuf::from("tenants"),
            datasource_driver: None,
            max_connections: 10,
            shutdown_timeout: 10,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tenant identifiers with surrounding whitespace removed.
    pub fn tenant_names(&self) -> Vec<String> {
        self.tenants.iter().map(|t| t.trim().to_string()).collect()
    }

    /// Validates the configuration and returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.max_connections == 0 {
            errors.push("Max connections cannot be 0".to_string());
        }

        if self.tenants.is_empty() {
            errors.push("At least one tenant must be configured (REST_TENANTS)".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing(tenants: &[&str]) -> Self {
        Self {
            port: 0,
            log_level: "debug".to_string(),
            request_timeout: 5,
            enable_cors: false,
            tenants: tenants.iter().map(|t| t.to_string()).collect(),
            max_connections: 4,
            shutdown_timeout: 1,
            ..Default::default()
        }
    }
}
