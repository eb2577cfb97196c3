//! Product handlers.
//!
//! Every handler here runs behind the tenant gate and reads or writes only the
//! database of the tenant bound to the request.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tenantry_persistence::product::Product;
use tracing::{debug, info};
use validator::{Validate, ValidationError};

use crate::error::{RestError, RestResult};
use crate::extractors::{CurrentTenant, ValidatedJson};
use crate::state::AppState;

/// Body of `POST /products`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductRequest {
    /// Product name, 1 to 15 characters and not blank.
    #[validate(
        length(min = 1, max = 15, message = "must be between 1 and 15 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Body of `GET /products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductList {
    /// Products of the current tenant, ordered by id.
    pub products: Vec<Product>,
}

/// Creates a product in the current tenant's database.
///
/// # HTTP Request
///
/// `POST /products` with `{"name": "..."}`
///
/// # Response
///
/// - `201 Created` - empty body, `Location: /products/{id}`
/// - `400 Bad Request` - malformed or invalid body
pub async fn create_product_handler(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    ValidatedJson(request): ValidatedJson<ProductRequest>,
) -> RestResult<Response> {
    info!(tenant = %tenant, name = %request.name, "Creating new product");

    let product = state.products().save(&request.name).await?;

    info!(tenant = %tenant, id = product.id, "New product created");

    let location = format!("/products/{}", product.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
}

/// Lists every product of the current tenant.
///
/// `GET /products`
pub async fn list_products_handler(
    State(state): State<AppState>,
    tenant: CurrentTenant,
) -> RestResult<Json<ProductList>> {
    info!(tenant = %tenant, "Finding all existing products");

    let products = state.products().find_all().await?;

    debug!(tenant = %tenant, count = products.len(), "Products found");
    Ok(Json(ProductList { products }))
}

/// Reads one product of the current tenant.
///
/// `GET /products/{id}`; `404 Not Found` when the id does not exist in this
/// tenant's database, even if another tenant has it.
pub async fn get_product_handler(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(id): Path<String>,
) -> RestResult<Json<Product>> {
    let id: i64 = id.parse().map_err(|_| RestError::BadRequest {
        message: format!("Invalid product id: {}", id),
    })?;

    debug!(tenant = %tenant, id, "Finding product");

    state
        .products()
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| RestError::NotFound {
            message: format!("Product {} not found", id),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> ProductRequest {
        ProductRequest {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_accepts_valid_names() {
        assert!(request("A4 Paper").validate().is_ok());
        assert!(request("x").validate().is_ok());
        assert!(request("fifteen chars!!").validate().is_ok());
    }

    #[test]
    fn test_rejects_blank_name() {
        assert!(request("").validate().is_err());
        assert!(request("   ").validate().is_err());
    }

    #[test]
    fn test_rejects_long_name() {
        assert_eq!("sixteen chars!!!".chars().count(), 16);
        assert!(request("sixteen chars!!!").validate().is_err());
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(request("ÄÖÜäöüßÄÖÜäöüßÄ").validate().is_ok());
    }

    #[test]
    fn test_product_list_shape() {
        let list = ProductList {
            products: vec![Product {
                id: 1,
                name: "A4 Paper".to_string(),
            }],
        };
        assert_eq!(
            serde_json::to_value(list).unwrap(),
            serde_json::json!({"products": [{"id": 1, "name": "A4 Paper"}]})
        );
    }
}
