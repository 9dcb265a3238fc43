use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::AppError, resources::Resource};

/// ApiResponse
///
/// The uniform envelope returned by every endpoint:
/// `{ "success": bool, "message": string, "data": any|null, "errors": any|null }`.
///
/// Resources may contribute additional top-level keys (e.g. pagination `meta`)
/// through `Resource::with`, which are flattened next to the four fixed keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
    pub errors: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiResponse {
    /// A successful response carrying a presented resource. The resource's `with()`
    /// entries are merged into the top level of the envelope.
    pub fn resource<R: Resource>(
        status: StatusCode,
        message: impl Into<String>,
        resource: R,
    ) -> Result<Self, AppError> {
        let extra = resource.with();
        let data = serde_json::to_value(&resource)
            .map_err(|e| AppError::Internal(format!("failed to serialize resource: {}", e)))?;

        Ok(Self {
            status,
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            extra,
        })
    }

    /// A successful response without a payload (e.g. delete, logout).
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            success: true,
            message: message.into(),
            data: None,
            errors: None,
            extra: Map::new(),
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>, errors: Option<Value>) -> Self {
        Self {
            status,
            success: false,
            message: message.into(),
            data: None,
            errors,
            extra: Map::new(),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
