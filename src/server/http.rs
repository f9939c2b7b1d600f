//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each connection is
//! served on its own task; handlers share state through `Arc<AppState>`.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::clock::{Clock, SystemClock};
use crate::config::Args;
use crate::db::MongoClient;
use crate::habits::{
    HabitLifecycle, HabitStore, MongoHabitStore, MongoTrackingLogStore, TrackingEngine,
    TrackingLogStore,
};
use crate::rate_limit::RateLimiter;
use crate::routes::{self, cors_preflight, error_response, json_response, BoxBody, ErrorResponse};
use crate::types::{CadenceError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: MongoClient,
    pub jwt: JwtValidator,
    pub lifecycle: HabitLifecycle,
    pub tracking: TrackingEngine,
    pub limiter: RateLimiter,
}

impl AppState {
    /// Connect to MongoDB and wire up the stores, engine, and limiter
    pub async fn init(args: Args) -> Result<Self> {
        let mongo = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let habits: Arc<dyn HabitStore> = Arc::new(MongoHabitStore::new(&mongo).await?);
        let logs: Arc<dyn TrackingLogStore> = Arc::new(MongoTrackingLogStore::new(&mongo).await?);

        let lifecycle = HabitLifecycle::new(Arc::clone(&habits));
        let tracking = TrackingEngine::new(habits, logs, Arc::clone(&clock));

        let jwt = if args.dev_mode && args.jwt_secret.is_none() {
            warn!("Dev mode: using built-in JWT secret");
            JwtValidator::new_dev()
        } else {
            let secret = args.jwt_secret.clone().ok_or_else(|| {
                CadenceError::Config("JWT_SECRET is required in production mode".into())
            })?;
            JwtValidator::new(secret, args.jwt_expiry_seconds)?
        };

        let limiter = RateLimiter::new(args.rate_limit_max, args.rate_limit_window_secs, clock);

        Ok(Self {
            args,
            mongo,
            jwt,
            lifecycle,
            tracking,
            limiter,
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Cadence listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    // Rate limit before any core operation runs
    if !state.limiter.allow(&addr.ip().to_string()) {
        warn!("Rate limit exceeded for {}", addr.ip());
        return Ok(error_response(&CadenceError::RateLimited));
    }

    // Auth routes (/auth/*) - these consume the request
    if path.starts_with("/auth") {
        if let Some(response) = routes::handle_auth_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    // Habit routes (/habits, /habits/*)
    if path == "/habits" || path.starts_with("/habits/") {
        if let Some(response) = routes::handle_habit_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    let response = match (method, path.as_str()) {
        // Health check endpoints
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state)).await
        }

        // CORS preflight
        (Method::OPTIONS, _) => cors_preflight(),

        // Not found
        _ => not_found_response(&path),
    };

    Ok(response)
}

/// Unknown-route response
fn not_found_response(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: format!("Route not found: {}", path),
            code: None,
        },
    )
}
