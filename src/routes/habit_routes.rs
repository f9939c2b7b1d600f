//! HTTP routes for habits
//!
//! - POST   /habits              - Create a habit
//! - GET    /habits?page=&tag=   - Paginated, optionally tag-filtered list
//! - GET    /habits/{id}         - Fetch one habit
//! - PUT    /habits/{id}         - Partial update
//! - DELETE /habits/{id}         - Delete (tracking logs remain)
//! - POST   /habits/{id}/track   - Record today's completion
//! - GET    /habits/{id}/history - Last 7 days of logs, newest first
//!
//! All routes require a bearer token; a habit owned by another user reads
//! as 401.

use bson::oid::ObjectId;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{HabitDoc, TrackingLogDoc};
use crate::habits::{HabitPatch, NewHabit, TrackOutcome};
use crate::routes::{
    authenticate, cors_preflight, error_response, json_response, parse_json_body, BoxBody,
    ErrorResponse, SuccessResponse,
};
use crate::server::AppState;
use crate::types::CadenceError;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reminder_time: Option<String>,
}

/// Omitted fields stay unchanged; present fields overwrite, even when
/// empty (an empty tags array clears the tags).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabitRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub tags: Option<Vec<String>>,
    pub reminder_time: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frequency: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    pub streak: i32,
    pub longest_streak: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<&HabitDoc> for HabitResponse {
    fn from(habit: &HabitDoc) -> Self {
        Self {
            id: habit._id.map(|id| id.to_hex()).unwrap_or_default(),
            title: habit.title.clone(),
            description: habit.description.clone(),
            frequency: habit.frequency.to_string(),
            tags: habit.tags.clone(),
            reminder_time: habit.reminder_time.clone(),
            streak: habit.streak,
            longest_streak: habit.longest_streak,
            created_at: habit
                .metadata
                .created_at
                .map(|at| at.to_chrono().to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResponse {
    pub id: String,
    pub habit_id: String,
    pub date: String,
    pub completed: bool,
}

impl From<&TrackingLogDoc> for LogResponse {
    fn from(log: &TrackingLogDoc) -> Self {
        Self {
            id: log._id.map(|id| id.to_hex()).unwrap_or_default(),
            habit_id: log.habit.to_hex(),
            date: log.date.to_chrono().to_rfc3339(),
            completed: log.completed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub log: LogResponse,
    pub streak: i32,
    pub longest_streak: i32,
}

impl From<&TrackOutcome> for TrackResponse {
    fn from(outcome: &TrackOutcome) -> Self {
        Self {
            log: LogResponse::from(&outcome.log),
            streak: outcome.streak,
            longest_streak: outcome.longest_streak,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListHabitsResponse {
    pub habits: Vec<HabitResponse>,
    pub page: u64,
    pub pages: u64,
}

// =============================================================================
// Route Handlers
// =============================================================================

async fn handle_create(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let user = match authenticate(&req, &state).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    let body: CreateHabitRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let input = NewHabit {
        title: body.title,
        description: body.description,
        frequency: body.frequency.unwrap_or_default(),
        tags: body.tags,
        reminder_time: body.reminder_time,
    };

    match state.lifecycle.create(user.id, input).await {
        Ok(habit) => json_response(StatusCode::CREATED, &HabitResponse::from(&habit)),
        Err(e) => error_response(&e),
    }
}

async fn handle_list(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let user = match authenticate(&req, &state).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    let (page, tag) = parse_list_query(req.uri().query());

    match state.lifecycle.list(user.id, page, tag.as_deref()).await {
        Ok(listing) => json_response(
            StatusCode::OK,
            &ListHabitsResponse {
                habits: listing.habits.iter().map(HabitResponse::from).collect(),
                page: listing.page,
                pages: listing.pages,
            },
        ),
        Err(e) => error_response(&e),
    }
}

async fn handle_get(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    habit_id: ObjectId,
) -> Response<BoxBody> {
    let user = match authenticate(&req, &state).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    match state.lifecycle.get(user.id, habit_id).await {
        Ok(habit) => json_response(StatusCode::OK, &HabitResponse::from(&habit)),
        Err(e) => error_response(&e),
    }
}

async fn handle_update(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    habit_id: ObjectId,
) -> Response<BoxBody> {
    let user = match authenticate(&req, &state).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    let body: UpdateHabitRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let patch = HabitPatch {
        title: body.title,
        description: body.description,
        frequency: body.frequency,
        tags: body.tags,
        reminder_time: body.reminder_time,
    };

    match state.lifecycle.update(user.id, habit_id, patch).await {
        Ok(habit) => json_response(StatusCode::OK, &HabitResponse::from(&habit)),
        Err(e) => error_response(&e),
    }
}

async fn handle_delete(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    habit_id: ObjectId,
) -> Response<BoxBody> {
    let user = match authenticate(&req, &state).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    match state.lifecycle.delete(user.id, habit_id).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &SuccessResponse {
                success: true,
                message: "Habit removed".into(),
            },
        ),
        Err(e) => error_response(&e),
    }
}

async fn handle_track(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    habit_id: ObjectId,
) -> Response<BoxBody> {
    let user = match authenticate(&req, &state).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    match state.tracking.track(habit_id, user.id).await {
        Ok(outcome) => json_response(StatusCode::CREATED, &TrackResponse::from(&outcome)),
        Err(e) => error_response(&e),
    }
}

async fn handle_history(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    habit_id: ObjectId,
) -> Response<BoxBody> {
    let user = match authenticate(&req, &state).await {
        Ok(u) => u,
        Err(e) => return error_response(&e),
    };

    match state.tracking.history(habit_id, user.id).await {
        Ok(logs) => {
            let logs: Vec<LogResponse> = logs.iter().map(LogResponse::from).collect();
            json_response(StatusCode::OK, &logs)
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse `?page=&tag=` query parameters. A missing or malformed page
/// reads as page 1.
fn parse_list_query(query: Option<&str>) -> (u64, Option<String>) {
    let mut page: u64 = 1;
    let mut tag: Option<String> = None;

    if let Some(query) = query {
        for pair in query.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                match key {
                    "page" => page = value.parse().unwrap_or(1),
                    "tag" if !value.is_empty() => {
                        tag = Some(
                            urlencoding::decode(value)
                                .map(|decoded| decoded.into_owned())
                                .unwrap_or_else(|_| value.to_string()),
                        );
                    }
                    _ => {}
                }
            }
        }
    }

    (page, tag)
}

/// Parse a path segment as a habit id. An unparseable id can match no
/// habit, so it reads as not found.
fn parse_habit_id(raw: &str) -> Result<ObjectId, CadenceError> {
    ObjectId::parse_str(raw).map_err(|_| CadenceError::NotFound("Habit not found".into()))
}

// =============================================================================
// Main Router
// =============================================================================

/// Handle habit-related HTTP requests.
///
/// Returns Some(response) if request was handled, None if not a habit route.
pub async fn handle_habit_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if path != "/habits" && !path.starts_with("/habits/") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let segments: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let response = match (&method, &segments[1..]) {
        (&Method::POST, []) => handle_create(req, state).await,
        (&Method::GET, []) => handle_list(req, state).await,

        (&Method::GET, [id]) => match parse_habit_id(id) {
            Ok(id) => handle_get(req, state, id).await,
            Err(e) => error_response(&e),
        },
        (&Method::PUT, [id]) => match parse_habit_id(id) {
            Ok(id) => handle_update(req, state, id).await,
            Err(e) => error_response(&e),
        },
        (&Method::DELETE, [id]) => match parse_habit_id(id) {
            Ok(id) => handle_delete(req, state, id).await,
            Err(e) => error_response(&e),
        },

        (&Method::POST, [id, "track"]) => match parse_habit_id(id) {
            Ok(id) => handle_track(req, state, id).await,
            Err(e) => error_response(&e),
        },
        (&Method::GET, [id, "history"]) => match parse_habit_id(id) {
            Ok(id) => handle_history(req, state, id).await,
            Err(e) => error_response(&e),
        },

        // Method not allowed on known shapes
        (_, []) | (_, [_]) | (_, [_, "track"]) | (_, [_, "history"]) => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse {
                error: "Method not allowed".into(),
                code: None,
            },
        ),

        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                error: "Habit endpoint not found".into(),
                code: None,
            },
        ),
    };

    Some(response)
}
