//! Axum extractors.
//!
//! - [`CurrentTenant`] - the tenant bound by the gate
//! - [`ValidatedJson`] - JSON body with validation rules applied

mod tenant;
mod validated_json;

pub use tenant::CurrentTenant;
pub use validated_json::{ValidatedJson, ValidatedJsonRejection};
