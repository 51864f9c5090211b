use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{
    ArtworkStore, CardService, Clock, DeliveryScheduler, NotificationSender, RetentionSweeper,
    TemplateService, ViewRecorder,
};
use domain::store::{CardStore, TemplateStore};
use shared::jwt::{JwtError, TokenVerifier};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin, require_user, trace_id,
};
use crate::routes::{admin, ecards, health, templates};
use crate::services::LocalArtworkStore;

/// Multipart overhead allowed on top of the artwork size limit.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Storage, delivery and time providers shared by the HTTP layer and the jobs.
#[derive(Clone)]
pub struct Collaborators {
    pub cards: Arc<dyn CardStore>,
    pub templates: Arc<dyn TemplateStore>,
    pub artwork: Arc<dyn ArtworkStore>,
    pub premade_art: Arc<LocalArtworkStore>,
    pub notifier: Arc<dyn NotificationSender>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    pub fn retention_sweeper(&self) -> RetentionSweeper {
        RetentionSweeper::new(
            self.cards.clone(),
            self.artwork.clone(),
            self.clock.clone(),
        )
    }

    pub fn delivery_scheduler(&self) -> DeliveryScheduler {
        DeliveryScheduler::new(
            self.cards.clone(),
            self.notifier.clone(),
            self.clock.clone(),
        )
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn CardStore>,
    pub cards: CardService,
    pub views: ViewRecorder,
    pub templates: TemplateService,
    pub premade_art: Arc<LocalArtworkStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(config: Config, collaborators: &Collaborators) -> Result<Self, JwtError> {
        let verifier = build_verifier(&config)?;
        let cards = CardService::new(
            collaborators.cards.clone(),
            collaborators.artwork.clone(),
            collaborators.notifier.clone(),
            collaborators.clock.clone(),
            config.storage.max_upload_bytes,
        );

        Ok(Self {
            store: collaborators.cards.clone(),
            cards,
            views: ViewRecorder::new(collaborators.cards.clone(), collaborators.clock.clone()),
            templates: TemplateService::new(collaborators.templates.clone()),
            premade_art: collaborators.premade_art.clone(),
            verifier: Arc::new(verifier),
            config: Arc::new(config),
        })
    }
}

fn build_verifier(config: &Config) -> Result<TokenVerifier, JwtError> {
    let auth = &config.auth;
    let mut verifier =
        TokenVerifier::from_config(&auth.algorithm, &auth.key)?.with_leeway(auth.leeway_secs);
    if !auth.issuer.is_empty() {
        verifier = verifier.with_issuer(auth.issuer.clone());
    }
    if !auth.audience.is_empty() {
        verifier = verifier.with_audience(auth.audience.clone());
    }
    Ok(verifier)
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
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

    // Any valid bearer token
    let user_routes = Router::new()
        .route("/api/ecards", post(ecards::create_card))
        .route("/api/ecards/my-cards", get(ecards::my_cards))
        .route("/api/ecards/premade-art", get(ecards::premade_art))
        .route("/api/ecards/:id", get(ecards::get_card))
        .route("/api/ecards/:id/resend", post(ecards::resend_card))
        .route("/api/templates", get(templates::list_templates))
        .route("/api/templates/:id", get(templates::get_template))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    // Bearer token with the admin role
    let admin_routes = Router::new()
        .route("/api/admin/ecards", get(admin::list_cards))
        .route(
            "/api/admin/ecards/:id",
            axum::routing::delete(admin::delete_card),
        )
        .route("/api/admin/ecards/:id/resend", post(admin::resend_card))
        .route("/api/admin/viewaudits", get(admin::list_view_audits))
        .route(
            "/api/admin/templates",
            get(admin::list_templates).post(admin::create_template),
        )
        .route(
            "/api/admin/templates/:id",
            put(admin::update_template).delete(admin::delete_template),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/ecards/config", get(ecards::get_config))
        .route("/api/ecards/:id/view", get(ecards::view_card))
        .route("/api/ecards/:id/art", get(ecards::card_art))
        .route("/api/templates/:id/image", get(templates::template_image));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(
            config.storage.max_upload_bytes + FORM_OVERHEAD_BYTES,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
