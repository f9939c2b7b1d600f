//! HTTP routes for authentication
//!
//! - POST /auth/register - Create an account, returns identity + JWT
//! - POST /auth/login    - Verify credentials, returns identity + JWT
//! - GET  /auth/me       - Current user info from token

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, TokenInput};
use crate::db::{UserDoc, USER_COLLECTION};
use crate::routes::{
    authenticate, cors_preflight, error_response, json_response, parse_json_body, BoxBody,
    ErrorResponse,
};
use crate::server::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub token: String,
    pub expires_at: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /auth/register
///
/// Flow:
/// 1. Validate required fields
/// 2. Check the email is not already registered
/// 3. Hash password with argon2
/// 4. Store the account
/// 5. Generate and return JWT token
async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    if body.name.is_empty() || body.email.is_empty() || body.password.is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Missing required fields: name, email, password".into(),
                code: None,
            },
        );
    }

    if body.password.len() < 8 {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Password must be at least 8 characters".into(),
                code: Some("WEAK_PASSWORD".into()),
            },
        );
    }

    let collection = match state.mongo.collection::<UserDoc>(USER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    // Check if the email is taken
    match collection.find_one(doc! { "email": &body.email }).await {
        Ok(Some(_)) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &ErrorResponse {
                    error: "User already exists".into(),
                    code: Some("USER_EXISTS".into()),
                },
            )
        }
        Ok(None) => {}
        Err(e) => return error_response(&e),
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => return error_response(&e),
    };

    let user = UserDoc::new(body.name.clone(), body.email.clone(), password_hash);

    let user_id = match collection.insert_one(user).await {
        Ok(id) => id,
        // The unique email index closes the concurrent-register race
        Err(e) if e.is_duplicate_key() => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &ErrorResponse {
                    error: "User already exists".into(),
                    code: Some("USER_EXISTS".into()),
                },
            )
        }
        Err(e) => return error_response(&e),
    };

    info!("Registered new user: {}", body.email);

    generate_auth_response(
        &state,
        &user_id.to_hex(),
        &body.name,
        &body.email,
        StatusCode::CREATED,
    )
}

/// POST /auth/login
///
/// Flow:
/// 1. Look up the account by email
/// 2. Verify the password against the argon2 hash
/// 3. Generate and return JWT token
async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    if body.email.is_empty() || body.password.is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Missing required fields: email, password".into(),
                code: None,
            },
        );
    }

    let collection = match state.mongo.collection::<UserDoc>(USER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    let user = match collection.find_one(doc! { "email": &body.email }).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!("Login failed - user not found: {}", body.email);
            // Same message as a wrong password, to prevent enumeration
            return json_response(
                StatusCode::UNAUTHORIZED,
                &ErrorResponse {
                    error: "Invalid email or password".into(),
                    code: Some("INVALID_CREDENTIALS".into()),
                },
            );
        }
        Err(e) => return error_response(&e),
    };

    let password_valid = match verify_password(&body.password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            warn!("Password verification error: {}", e);
            return error_response(&e);
        }
    };

    if !password_valid {
        warn!("Login failed - invalid password: {}", body.email);
        return json_response(
            StatusCode::UNAUTHORIZED,
            &ErrorResponse {
                error: "Invalid email or password".into(),
                code: Some("INVALID_CREDENTIALS".into()),
            },
        );
    }

    info!("Login successful: {}", body.email);

    let user_id = user._id.map(|id| id.to_hex()).unwrap_or_default();
    generate_auth_response(&state, &user_id, &user.name, &user.email, StatusCode::OK)
}

/// GET /auth/me
async fn handle_me(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let user = match authenticate(&req, &state).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    json_response(
        StatusCode::OK,
        &MeResponse {
            id: user.id.to_hex(),
            name: user.name,
            email: user.email,
        },
    )
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Generate a successful auth response with JWT token
fn generate_auth_response(
    state: &AppState,
    user_id: &str,
    name: &str,
    email: &str,
    status: StatusCode,
) -> Response<BoxBody> {
    let input = TokenInput {
        user_id: user_id.to_string(),
        email: email.to_string(),
    };

    match state.jwt.generate_token(input) {
        Ok(token) => {
            let claims = state.jwt.verify_token(&token);
            let expires_at = claims.claims.map(|c| c.exp).unwrap_or(0);

            json_response(
                status,
                &AuthResponse {
                    id: user_id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    token,
                    expires_at,
                },
            )
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// Main Router
// =============================================================================

/// Handle auth-related HTTP requests.
///
/// Returns Some(response) if request was handled, None if not an auth route.
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !path.starts_with("/auth") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/auth/register") => handle_register(req, state).await,
        (&Method::POST, "/auth/login") => handle_login(req, state).await,
        (&Method::GET, "/auth/me") => handle_me(req, state).await,

        // Method not allowed
        (_, "/auth/register") | (_, "/auth/login") | (_, "/auth/me") => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse {
                error: "Method not allowed".into(),
                code: None,
            },
        ),

        // Auth endpoint not found
        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                error: "Auth endpoint not found".into(),
                code: None,
            },
        ),
    };

    Some(response)
}
