/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
///
/// # Example
///
/// ```no_run
/// use vitrine_api::{app::AppState, config::Config};
/// use vitrine_shared::redis::{RedisClient, RedisConfig};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let redis = RedisClient::new(RedisConfig::from_env()?).await?;
/// let state = AppState::new(pool, redis, config);
/// let app = vitrine_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use vitrine_shared::auth::{jwt, middleware::AuthContext};
use vitrine_shared::redis::{EventPublisher, EventSubscriber, RedisClient};

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; everything inside is
/// cheap to clone (pools and Arcs).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Publishes store events to Redis Streams
    pub events: EventPublisher,

    /// Reads event streams for the SSE endpoint
    pub subscriber: EventSubscriber,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, redis: RedisClient, config: Config) -> Self {
        Self {
            db,
            events: EventPublisher::new(redis.clone()),
            subscriber: EventSubscriber::new(redis),
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /api/
///     ├── /auth/                    # register, login, refresh (public)
///     ├── /products/                # browse (public), mutate (admin)
///     ├── /categories/              # browse (public), mutate (admin)
///     ├── /cart                     # own cart (authenticated)
///     ├── /orders/                  # checkout + own orders (authenticated)
///     ├── /reviews/                 # write own reviews (authenticated)
///     ├── /wishlist/                # own wishlist (authenticated)
///     ├── /users/me                 # own profile (authenticated)
///     ├── /payment/                 # initiate + callback
///     ├── /events                   # SSE feed (authenticated)
///     └── /admin/                   # dashboard, orders, users, settings (admin)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Product catalog: browsing is public, mutation is admin-only
    let product_admin_routes = Router::new()
        .route("/", post(routes::products::create_product))
        .route("/:id", put(routes::products::update_product))
        .route("/:id", delete(routes::products::delete_product))
        .route("/:id/stock", put(routes::products::update_stock))
        .layer(axum::middleware::from_fn(admin_layer))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let product_routes = Router::new()
        .route("/", get(routes::products::list_products))
        .route("/:id", get(routes::products::get_product))
        .route("/slug/:slug", get(routes::products::get_product_by_slug))
        .route("/:id/reviews", get(routes::reviews::list_product_reviews))
        .merge(product_admin_routes);

    let category_admin_routes = Router::new()
        .route("/", post(routes::categories::create_category))
        .route("/:id", put(routes::categories::update_category))
        .route("/:id", delete(routes::categories::delete_category))
        .layer(axum::middleware::from_fn(admin_layer))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let category_routes = Router::new()
        .route("/", get(routes::categories::list_categories))
        .route("/:slug", get(routes::categories::get_category))
        .merge(category_admin_routes);

    // Cart (authenticated)
    let cart_routes = Router::new()
        .route("/", get(routes::cart::get_cart))
        .route("/", put(routes::cart::replace_cart))
        .route("/", delete(routes::cart::clear_cart))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Orders (authenticated; admin-only status updates live under /admin)
    let order_routes = Router::new()
        .route("/", post(routes::orders::create_order))
        .route("/", get(routes::orders::list_my_orders))
        .route("/:id", get(routes::orders::get_order))
        .route("/:id/cancel", post(routes::orders::cancel_order))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Reviews (authenticated writes)
    let review_routes = Router::new()
        .route("/", post(routes::reviews::create_review))
        .route("/:id", put(routes::reviews::update_review))
        .route("/:id", delete(routes::reviews::delete_review))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Wishlist (authenticated)
    let wishlist_routes = Router::new()
        .route("/", get(routes::wishlist::get_wishlist))
        .route("/:product_id", post(routes::wishlist::add_to_wishlist))
        .route(
            "/:product_id",
            delete(routes::wishlist::remove_from_wishlist),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Own profile (authenticated)
    let user_routes = Router::new()
        .route("/me", get(routes::users::get_me))
        .route("/me", put(routes::users::update_me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Payment: initiation is authenticated, the gateway callback is signed
    // instead of authenticated
    let payment_routes = Router::new()
        .route(
            "/initiate",
            post(routes::payment::initiate_payment).layer(
                axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer),
            ),
        )
        .route("/callback/success", post(routes::payment::payment_callback))
        .route("/callback/failure", post(routes::payment::payment_callback));

    // SSE event feed (authenticated)
    let event_routes = Router::new()
        .route("/", get(routes::events::stream_events))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Admin dashboard and management
    let admin_routes = Router::new()
        .route("/dashboard", get(routes::admin::dashboard))
        .route("/orders", get(routes::admin::list_orders))
        .route("/orders/:id/status", put(routes::admin::update_order_status))
        .route("/users", get(routes::admin::list_users))
        .route("/users/:id", get(routes::admin::get_user))
        .route("/users/:id", delete(routes::admin::delete_user))
        .route("/settings", get(routes::admin::get_settings))
        .route("/settings", put(routes::admin::update_settings))
        .layer(axum::middleware::from_fn(admin_layer))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/products", product_routes)
        .nest("/categories", category_routes)
        .nest("/cart", cart_routes)
        .nest("/orders", order_routes)
        .nest("/reviews", review_routes)
        .nest("/wishlist", wishlist_routes)
        .nest("/users", user_routes)
        .nest("/payment", payment_routes)
        .nest("/events", event_routes)
        .nest("/admin", admin_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the Bearer token from the Authorization header,
/// then injects an AuthContext into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| crate::error::ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let auth_context = AuthContext::from_jwt(claims.sub, claims.role);

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Admin gate, applied after `jwt_auth_layer`
///
/// Rejects requests whose token does not carry the admin role.
async fn admin_layer(req: Request, next: Next) -> Result<Response, crate::error::ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| crate::error::ApiError::Unauthorized("Not authenticated".to_string()))?;

    auth.require_admin()?;

    Ok(next.run(req).await)
}
