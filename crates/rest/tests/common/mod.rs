//! Shared helpers for REST integration tests.
//!
//! Each test server gets its own temporary directory holding one
//! `<tenant>.toml` file and one SQLite database per tenant.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use serde_json::{Value, json};
use tempfile::TempDir;

use tenantry_rest::{AppState, ServerConfig, create_app};

pub const X_TENANT_ID: HeaderName = HeaderName::from_static("x-tenant-id");

/// A running test server and the directory backing its databases.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub dir: TempDir,
}

/// Writes a SQLite connection file for `tenant` into `dir`.
pub fn write_sqlite_tenant(dir: &Path, tenant: &str) {
    let db = dir.join("db").join(format!("{}.db", tenant));
    let body = format!(
        "url = \"sqlite://{}\"\nusername = \"{}\"\npassword = \"secret\"\ndriver = \"sqlite\"\n",
        db.display(),
        tenant
    );
    fs::write(dir.join(format!("{}.toml", tenant)), body).unwrap();
}

/// Starts a server for `tenants`, each with a fresh database.
pub async fn spawn_app(tenants: &[&str]) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    for tenant in tenants {
        write_sqlite_tenant(dir.path(), tenant);
    }

    let mut config = ServerConfig::for_testing(tenants);
    config.tenants_location = dir.path().to_path_buf();

    let state = AppState::initialize(config)
        .await
        .expect("Failed to initialize tenant databases");
    let server = TestServer::new(create_app(state.clone())).expect("Failed to create test server");

    TestApp { server, state, dir }
}

impl TestApp {
    /// Creates a product for `tenant` and returns its id from `Location`.
    pub async fn create_product(&self, tenant: &str, name: &str) -> i64 {
        let response = self.post_product(tenant, json!({ "name": name })).await;
        response.assert_status(StatusCode::CREATED);

        let location = response.header("location");
        let location = location.to_str().unwrap();
        location
            .strip_prefix("/products/")
            .and_then(|id| id.parse().ok())
            .unwrap_or_else(|| panic!("unexpected Location header: {}", location))
    }

    /// Posts a raw JSON body to `/products` for `tenant`.
    pub async fn post_product(&self, tenant: &str, body: Value) -> TestResponse {
        self.server
            .post("/products")
            .add_header(X_TENANT_ID, HeaderValue::from_str(tenant).unwrap())
            .json(&body)
            .await
    }

    /// Lists the products of `tenant` as `(id, name)` pairs.
    pub async fn list_products(&self, tenant: &str) -> Vec<(i64, String)> {
        let response = self
            .server
            .get("/products")
            .add_header(X_TENANT_ID, HeaderValue::from_str(tenant).unwrap())
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        body["products"]
            .as_array()
            .expect("products must be an array")
            .iter()
            .map(|p| {
                (
                    p["id"].as_i64().unwrap(),
                    p["name"].as_str().unwrap().to_string(),
                )
            })
            .collect()
    }
}
