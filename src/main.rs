//! Payroll Scope Backend
//!
//! Backend-for-frontend for the payroll run wizard: resolves the employee
//! scope of a run, aggregates department and cadre choices from the upstream
//! HR API, and drives the paged employee picker.

mod api;
mod auth;
mod config;
mod employees;
mod errors;
mod lenient;
mod models;
mod options;
mod picker;
mod scope;
mod upstream;
mod wizard;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use picker::{Clock, MonotonicClock};
use upstream::{HrDirectory, HttpDirectory};
use wizard::WizardStore;

const WIZARD_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn HrDirectory>,
    pub wizards: Arc<WizardStore>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Payroll Scope Backend");
    tracing::info!("Upstream HR API: {}", config.upstream_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (PAYROLL_API_PSK). Authentication is disabled!");
    }

    let directory = HttpDirectory::new(&config)?;
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let wizards = Arc::new(WizardStore::new(clock.clone(), config.wizard_ttl_ms()));

    // Periodically drop wizards abandoned without a cancel
    let sweeper = wizards.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(WIZARD_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweeper.sweep_expired().await;
        }
    });

    let state = AppState {
        directory: Arc::new(directory),
        wizards,
        clock,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Options
        .route("/options/departments", get(api::list_department_options))
        .route("/options/cadres", get(api::list_cadre_options))
        // Employees
        .route("/employees", get(api::list_employees))
        // Wizards
        .route("/wizards", post(api::create_wizard))
        .route(
            "/wizards/{id}",
            get(api::get_wizard).delete(api::cancel_wizard),
        )
        .route("/wizards/{id}/details", put(api::set_details))
        .route("/wizards/{id}/step", put(api::set_step))
        .route("/wizards/{id}/options", get(api::wizard_options))
        .route("/wizards/{id}/mode", put(api::set_mode))
        .route("/wizards/{id}/selection", put(api::set_selection))
        .route("/wizards/{id}/selection/toggle", post(api::toggle_selection))
        // Picker
        .route("/wizards/{id}/picker", get(api::get_picker))
        .route("/wizards/{id}/picker/search", put(api::set_picker_search))
        .route("/wizards/{id}/picker/page", put(api::set_picker_page))
        .route("/wizards/{id}/picker/retry", post(api::retry_picker))
        // Submission
        .route("/wizards/{id}/submit", post(api::submit_payroll))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
