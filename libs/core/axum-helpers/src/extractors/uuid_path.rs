//! UUID path parameter extractor.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

/// Extractor for a single UUID path parameter.
///
/// A malformed segment yields a JSON 400 instead of axum's plain-text
/// rejection.
///
/// # Example
/// ```ignore
/// use axum::{routing::get, Router};
/// use axum_helpers::extractors::UuidPath;
///
/// async fn get_user(UuidPath(id): UuidPath) -> String {
///     format!("User ID: {}", id)
/// }
///
/// let app = Router::new().route("/users/{id}", get(get_user));
/// ```
pub struct UuidPath(pub Uuid);

impl<S> FromRequestParts<S> for UuidPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        Uuid::parse_str(&raw).map(UuidPath).map_err(|_| {
            let body = json!({
                "error": {
                    "type": "bad_request",
                    "message": format!("Invalid UUID: {}", raw),
                }
            });
            (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
        })
    }
}
