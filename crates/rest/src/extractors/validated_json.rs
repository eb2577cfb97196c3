//! JSON body extractor with declarative validation.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::RestError;

/// Deserializes a JSON body and runs its [`Validate`] rules.
///
/// # Example
///
/// ```rust,ignore
/// use tenantry_rest::extractors::ValidatedJson;
///
/// async fn handler(ValidatedJson(request): ValidatedJson<ProductRequest>) {
///     println!("{}", request.name);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    /// Consumes the extractor and returns the validated value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Rejection for [`ValidatedJson`].
#[derive(Debug)]
pub enum ValidatedJsonRejection {
    /// The body is not JSON or does not match the expected shape.
    InvalidJson(String),
    /// The body parsed but broke one or more rules.
    Invalid(Vec<String>),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let error = match self {
            ValidatedJsonRejection::InvalidJson(message) => RestError::BadRequest {
                message: format!("Invalid JSON: {}", message),
            },
            ValidatedJsonRejection::Invalid(errors) => RestError::Validation { errors },
        };
        error.into_response()
    }
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ValidatedJsonRejection::InvalidJson(e.body_text()))?;

        value
            .validate()
            .map_err(|errors| ValidatedJsonRejection::Invalid(flatten_errors(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

/// Flattens validation errors into `field: message` lines, sorted by field.
fn flatten_errors(errors: &ValidationErrors) -> Vec<String> {
    let mut out = Vec::new();
    for (field, kind) in errors.errors() {
        if let ValidationErrorsKind::Field(field_errors) = kind {
            for e in field_errors {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                out.push(format!("{field}: {message}"));
            }
        }
    }
    out.sort();
    out
}
