//! # Structured Logging Module
//!
//! Environment-aware `tracing` setup plus helpers that emit structured
//! operation records for the registry lifecycle.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// `RUST_LOG` wins when set; otherwise the level follows the environment
/// (`AMBIENT_ENV`, then `APP_ENV`). `AMBIENT_LOG_FORMAT=json` switches to
/// JSON lines. An already-installed global subscriber is left in place.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var("AMBIENT_LOG_FORMAT").is_ok_and(|format| format == "json");

        let console = (!json).then(|| {
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_level(true)
        });
        let json_lines = json.then(|| {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_names(true)
                .with_current_span(true)
        });

        if tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(json_lines)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
            return;
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

fn get_environment() -> String {
    std::env::var("AMBIENT_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log a registry lifecycle operation (`register` / `unregister`).
pub fn log_registry_operation(operation: &str, address: &str, status: &str, details: Option<&str>) {
    tracing::info!(
        operation = %operation,
        address = %address,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "REGISTRY_OPERATION"
    );
}

/// Log an error with its component and operation.
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
