//! Problem detail responses.
//!
//! Error bodies follow the `application/problem+json` shape: `type`, `title`,
//! `status`, `detail` and optional extension properties nested under
//! `properties`. A property added with [`ProblemDetail::with_mirrored_property`]
//! is also written at the top level, so clients reading either form find it.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Content type of problem detail bodies.
pub const PROBLEM_JSON: &str = "application/problem+json";

const RESERVED_MEMBERS: &[&str] = &["type", "title", "status", "detail", "instance", "properties"];

/// A problem detail body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemDetail {
    /// Problem type URI; `about:blank` when the title says it all.
    #[serde(rename = "type")]
    pub problem_type: String,

    /// Short summary, stable for a given problem type.
    pub title: String,

    /// HTTP status code.
    pub status: u16,

    /// Occurrence specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Extension properties.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    #[serde(flatten)]
    extensions: Map<String, Value>,
}

impl ProblemDetail {
    /// Creates a problem for `status`, titled with the status reason phrase.
    pub fn for_status(status: StatusCode) -> Self {
        Self {
            problem_type: "about:blank".to_string(),
            title: status.canonical_reason().unwrap_or("Unknown").to_string(),
            status: status.as_u16(),
            detail: None,
            properties: Map::new(),
            extensions: Map::new(),
        }
    }

    /// Replaces the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the detail message.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Adds an extension property under `properties`.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Adds an extension property under `properties` and at the top level.
    ///
    /// A name that collides with a standard member is only nested.
    pub fn with_mirrored_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let name = name.into();
        let value = value.into();
        if !RESERVED_MEMBERS.contains(&name.as_str()) {
            self.extensions.insert(name.clone(), value.clone());
        }
        self.properties.insert(name, value);
        self
    }

    /// The HTTP status as a [`StatusCode`].
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ProblemDetail {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_JSON),
        );
        response
    }
}
