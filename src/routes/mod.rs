//! HTTP routes for Cadence
//!
//! Handlers build `Response<BoxBody>` directly; shared JSON/CORS helpers
//! and the bearer-token authentication step live here.

pub mod auth_routes;
pub mod habit_routes;
pub mod health;

pub use auth_routes::handle_auth_request;
pub use habit_routes::handle_habit_request;
pub use health::health_check;

use bson::{doc, oid::ObjectId};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::extract_token_from_header;
use crate::db::{UserDoc, USER_COLLECTION};
use crate::server::AppState;
use crate::types::CadenceError;

pub(crate) type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Error payload returned on every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Generic success payload for operations with no entity to return
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

// =============================================================================
// Response Helpers
// =============================================================================

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// Render a typed error with its mapped status and public message
pub(crate) fn error_response(err: &CadenceError) -> Response<BoxBody> {
    json_response(
        err.status_code(),
        &ErrorResponse {
            error: err.public_message(),
            code: None,
        },
    )
}

pub(crate) fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub(crate) fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub(crate) fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

pub(crate) async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, CadenceError> {
    let body = req
        .collect()
        .await
        .map_err(|e| CadenceError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 10240 {
        return Err(CadenceError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| CadenceError::Http(format!("Invalid JSON body: {}", e)))
}

pub(crate) fn get_auth_header(req: &Request<hyper::body::Incoming>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

// =============================================================================
// Bearer Authentication
// =============================================================================

/// Caller identity resolved from a bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
}

/// Resolve the caller from the Authorization header.
///
/// The token must verify and its subject must still be an existing
/// account; a token for a deleted user stops working immediately.
pub(crate) async fn authenticate(
    req: &Request<hyper::body::Incoming>,
    state: &AppState,
) -> Result<AuthUser, CadenceError> {
    let token = extract_token_from_header(get_auth_header(req))
        .ok_or_else(|| CadenceError::Unauthorized("Not authorized, no token".into()))?;

    let result = state.jwt.verify_token(token);
    let claims = match result.claims {
        Some(claims) if result.valid => claims,
        _ => return Err(CadenceError::Unauthorized("Not authorized, token failed".into())),
    };

    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| CadenceError::Unauthorized("Not authorized, token failed".into()))?;

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let user = users
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or_else(|| CadenceError::Unauthorized("Not authorized, token failed".into()))?;

    Ok(AuthUser {
        id: user_id,
        name: user.name,
        email: user.email,
    })
}
