//! Configuration for Cadence
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Cadence - habit tracking REST API
#[derive(Parser, Debug, Clone)]
#[command(name = "cadence")]
#[command(about = "Habit tracking REST API with streaks and history")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "cadence")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds (30 days)
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "2592000")]
    pub jwt_expiry_seconds: u64,

    /// Maximum requests per client within the rate limit window
    #[arg(long, env = "RATE_LIMIT_MAX", default_value = "100")]
    pub rate_limit_max: usize,

    /// Rate limit window in seconds (rolling)
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value = "3600")]
    pub rate_limit_window_secs: i64,

    /// Enable development mode (allows a default JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.rate_limit_max == 0 {
            return Err("RATE_LIMIT_MAX must be greater than zero".to_string());
        }

        if self.rate_limit_window_secs <= 0 {
            return Err("RATE_LIMIT_WINDOW_SECS must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["cadence", "--jwt-secret", "a-secret-that-is-long-enough-for-hs256"])
    }

    #[test]
    fn test_defaults() {
        let args = base_args();
        assert_eq!(args.mongodb_db, "cadence");
        assert_eq!(args.rate_limit_max, 100);
        assert_eq!(args.rate_limit_window_secs, 3600);
        assert_eq!(args.jwt_expiry_seconds, 2592000);
        assert!(!args.dev_mode);
    }

    #[test]
    fn test_validate_requires_jwt_secret_in_production() {
        let args = Args::parse_from(["cadence"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["cadence", "--dev-mode"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_rate_limit() {
        let args = Args::parse_from([
            "cadence",
            "--jwt-secret",
            "a-secret-that-is-long-enough-for-hs256",
            "--rate-limit-max",
            "0",
        ]);
        assert!(args.validate().is_err());
    }
}
