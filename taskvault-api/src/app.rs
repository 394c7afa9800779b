/// Application state and router builder
///
/// The authentication gate is wired in front of every protected route as a
/// middleware layer; handlers behind it receive the resolved
/// [`Authenticated`] context from request extensions and never see an
/// unauthenticated request.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskvault_api::{app::{build_router, AppState}, config::Config};
/// use taskvault_shared::store::postgres::{connect, PgStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = connect(&config.database.url, config.database.max_connections).await?;
/// let store = Arc::new(PgStore::new(pool));
/// let state = AppState::new(store.clone(), store, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use taskvault_shared::accounts::Accounts;
use taskvault_shared::auth::gate::AuthGate;
use taskvault_shared::auth::token::SessionManager;
use taskvault_shared::store::{TaskStore, UserStore};

use crate::{config::Config, error::ApiError, routes};

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; everything inside is
/// either `Arc`ed or a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// User persistence
    pub users: Arc<dyn UserStore>,

    /// Task persistence
    pub tasks: Arc<dyn TaskStore>,

    /// Credential store and account lifecycle
    pub accounts: Accounts,

    /// Session token manager
    pub sessions: SessionManager,

    /// Authentication gate
    pub gate: AuthGate,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates application state over a pair of store handles
    ///
    /// The signing key flows from the config into the session manager and
    /// the gate here, once; no component reads it globally.
    pub fn new(users: Arc<dyn UserStore>, tasks: Arc<dyn TaskStore>, config: Config) -> Self {
        let accounts = Accounts::new(users.clone(), tasks.clone());
        let sessions = SessionManager::new(users.clone(), config.jwt.secret.clone());
        let gate = AuthGate::new(users.clone(), config.jwt.secret.clone());

        Self {
            users,
            tasks,
            accounts,
            sessions,
            gate,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router
///
/// # Routes
///
/// ```text
/// /
/// ├── GET  /health                  # liveness (public)
/// ├── POST /users                   # registration (public)
/// ├── POST /users/login             # credential check (public)
/// ├── GET  /users/:id/avatar        # avatar fetch (public)
/// ├── POST /users/logout            # revoke presented token
/// ├── POST /users/logoutAll         # revoke all tokens
/// ├── GET|PATCH|DELETE /users/me    # profile
/// ├── POST|DELETE /users/me/avatar  # avatar upload / clear
/// ├── POST|GET /tasks               # create / list (ownership-scoped)
/// └── GET|PATCH|DELETE /tasks/:id   # single task (ownership-scoped)
/// ```
///
/// Everything below the public block sits behind the authentication layer.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::register))
        .route("/users/login", post(routes::users::login))
        .route("/users/:id/avatar", get(routes::users::get_avatar));

    let protected_routes = Router::new()
        .route("/users/logout", post(routes::users::logout))
        .route("/users/logoutAll", post(routes::users::logout_all))
        .route(
            "/users/me",
            get(routes::users::me)
                .patch(routes::users::update_me)
                .delete(routes::users::delete_me),
        )
        .route(
            "/users/me/avatar",
            post(routes::users::upload_avatar).delete(routes::users::delete_avatar),
        )
        .route(
            "/tasks",
            post(routes::tasks::create).get(routes::tasks::list),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_one)
                .patch(routes::tasks::update)
                .delete(routes::tasks::remove),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Authentication middleware layer
///
/// Runs the gate against the `Authorization` header and injects the
/// resolved context into request extensions. Rejections short-circuit
/// before any handler logic runs.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth = state.gate.authenticate(authorization).await?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
