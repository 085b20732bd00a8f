use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use domain::services::{
    CheckInStore, DoorPassService, EventStore, InMemoryStore, InviteLedger, InviteQrStore,
    InviteTokenStore, RegistrationStore, RoleAssignmentService, UserRoleStore,
};
use persistence::repositories::{
    CheckInRepository, EventRepository, InviteQrCodeRepository, InviteTokenRepository,
    RegistrationRepository, UserRoleRepository,
};
use shared::jwt::{JwtError, SessionKeys};
use shared::pass_token::{PassCodecError, PassTokenCodec};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{checkins, health, invite_qr, invites, me, passes};

/// Failure to assemble application state from configuration.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("door pass codec: {0}")]
    PassCodec(#[from] PassCodecError),

    #[error("session keys: {0}")]
    SessionKeys(#[from] JwtError),
}

/// Storage backends behind the domain services.
#[derive(Clone)]
pub struct Stores {
    pub invite_tokens: Arc<dyn InviteTokenStore>,
    pub invite_qr_codes: Arc<dyn InviteQrStore>,
    pub events: Arc<dyn EventStore>,
    pub registrations: Arc<dyn RegistrationStore>,
    pub user_roles: Arc<dyn UserRoleStore>,
    pub check_ins: Arc<dyn CheckInStore>,
}

impl Stores {
    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            invite_tokens: Arc::new(InviteTokenRepository::new(pool.clone())),
            invite_qr_codes: Arc::new(InviteQrCodeRepository::new(pool.clone())),
            events: Arc::new(EventRepository::new(pool.clone())),
            registrations: Arc::new(RegistrationRepository::new(pool.clone())),
            user_roles: Arc::new(UserRoleRepository::new(pool.clone())),
            check_ins: Arc::new(CheckInRepository::new(pool.clone())),
        }
    }

    /// Every port backed by the same in-memory store.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            invite_tokens: store.clone(),
            invite_qr_codes: store.clone(),
            events: store.clone(),
            registrations: store.clone(),
            user_roles: store.clone(),
            check_ins: store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Present when running against PostgreSQL; used by readiness checks.
    pub pool: Option<PgPool>,
    pub invites: InviteLedger,
    pub roles: RoleAssignmentService,
    pub door_pass: DoorPassService,
    pub session_keys: Arc<SessionKeys>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(config: Config, stores: Stores, pool: Option<PgPool>) -> Result<Self, StartupError> {
        let codec = Arc::new(PassTokenCodec::new(
            &config.door_pass.signing_secret,
            config.door_pass.ttl(),
        )?);
        let session_keys = Arc::new(SessionKeys::new(
            &config.auth.jwt_secret,
            &config.auth.audience,
            config.auth.leeway_secs,
        )?);

        // Rate limiting is disabled when rate_limit_per_minute is 0
        let rate_limiter = (config.security.rate_limit_per_minute > 0).then(|| {
            Arc::new(RateLimiterState::new(
                config.security.rate_limit_per_minute,
            ))
        });

        Ok(Self {
            invites: InviteLedger::new(
                stores.invite_tokens.clone(),
                stores.invite_qr_codes.clone(),
                stores.events.clone(),
            ),
            roles: RoleAssignmentService::new(stores.user_roles.clone()),
            door_pass: DoorPassService::new(
                stores.registrations.clone(),
                stores.check_ins.clone(),
                stores.user_roles.clone(),
                codec,
            ),
            config: Arc::new(config),
            pool,
            session_keys,
            rate_limiter,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
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

    // Endpoints that accept a bearer-like token in the path are limited per
    // client so tokens cannot be enumerated.
    let token_routes = Router::new()
        .route("/api/v1/invites/:token", get(invites::preview_invite))
        .route("/api/v1/invites/:token/redeem", post(invites::redeem_invite))
        .route("/api/v1/invite-qr/:code", get(invite_qr::redeem_invite_qr))
        .route(
            "/api/v1/events/:event_id/checkins",
            post(checkins::check_in),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Session-authenticated routes (the UserAuth extractor rejects with 401)
    let session_routes = Router::new()
        .route("/api/v1/invites", post(invites::create_invite))
        .route(
            "/api/v1/events/:event_id/invite-qr",
            post(invite_qr::create_invite_qr),
        )
        .route(
            "/api/v1/registrations/:registration_id/pass",
            get(passes::get_pass),
        )
        .route(
            "/api/v1/events/:event_id/checkins/:registration_id",
            delete(checkins::reset_check_in),
        )
        .route("/api/v1/me/destination", get(me::get_destination));

    let public_routes = Router::new()
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(token_routes)
        .merge(session_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
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
