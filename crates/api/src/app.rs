use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::GeoIndex;
use persistence::repositories::{
    MatchRepository, ParticipationRepository, PgLocationProvider, PgUserDirectory,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware};
use crate::routes::{health, matches, participations};
use crate::services::{MatchService, ParticipationService, RetryPolicy};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub match_service: MatchService,
    pub participation_service: ParticipationService,
}

pub fn create_app(
    config: Config,
    pool: PgPool,
    geo_index: Arc<dyn GeoIndex + Send + Sync>,
) -> Router {
    let config = Arc::new(config);
    let retry = RetryPolicy::new(&config.retry);

    let match_repository = MatchRepository::new(pool.clone());
    let participation_repository = ParticipationRepository::new(pool.clone());
    let match_service = MatchService::new(
        pool.clone(),
        match_repository.clone(),
        Arc::new(PgUserDirectory::new(pool.clone())),
        Arc::new(PgLocationProvider::new(pool.clone())),
        geo_index,
        retry,
    );
    let participation_service = ParticipationService::new(
        pool.clone(),
        match_repository,
        participation_repository,
        retry,
    );

    let state = AppState {
        pool,
        config: config.clone(),
        match_service,
        participation_service,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Versioned API routes; caller identity comes from the X-User-Id
    // header where a handler requires it.
    let api_routes = Router::new()
        .route("/api/v1/matches", post(matches::create_match))
        .route("/api/v1/matches/nearby", get(matches::nearby_matches))
        .route("/api/v1/matches/hosted", get(matches::hosted_matches))
        .route(
            "/api/v1/matches/:match_id",
            get(matches::get_match).patch(matches::update_match),
        )
        .route("/api/v1/matches/:match_id/cancel", post(matches::cancel_match))
        .route(
            "/api/v1/matches/:match_id/reactivate",
            post(matches::reactivate_match),
        )
        .route(
            "/api/v1/matches/:match_id/participations",
            post(participations::join_match)
                .get(participations::list_participations)
                .delete(participations::cancel_participation),
        )
        .route(
            "/api/v1/participations/:participation_id/approve",
            post(participations::approve_participation),
        )
        .route(
            "/api/v1/participations/:participation_id/reject",
            post(participations::reject_participation),
        );

    // Public routes (no caller identity required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
