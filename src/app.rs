use axum::{
    routing::{delete, get, post, put},
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
};
use tower_http::{
    services::ServeDir,
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tower_sessions::cookie::SameSite;
use crate::{handlers, middleware, state::AppState};

pub const SESSION_COOKIE: &str = "session";

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Session store setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.session.secure)
        .with_same_site(SameSite::Lax)
        .with_name(SESSION_COOKIE);

    Router::new()
        // Session routes
        .route("/api/login", post(handlers::handle_login))
        .route("/api/logout", post(handlers::handle_logout))
        .route("/api/me", get(handlers::current_session))

        // User routes
        .route("/api/users", get(handlers::list_users).post(handlers::handle_register))
        .route("/api/users/:username", get(handlers::get_user).put(handlers::update_user))
        .route("/api/users/:username/roles", post(handlers::promote_user))
        .route(
            "/api/users/:username/requested-roles/:role",
            delete(handlers::deny_role_request),
        )
        .route("/api/users/:username/liked-posts", get(handlers::liked_posts))
        .route("/api/users/:username/likes", post(handlers::toggle_user_like))

        // Recipe routes
        .route("/api/recipes", get(handlers::list_recipes).post(handlers::create_recipe))
        .route(
            "/api/recipes/:id",
            get(handlers::get_recipe)
                .put(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
        .route("/api/recipes/by-name/:name", get(handlers::get_recipe_by_name))
        .route("/api/recipes/:id/published", put(handlers::set_published))
        .route("/api/recipes/:id/translation", put(handlers::translate_recipe))
        .route("/api/recipes/:id/comment", post(handlers::add_comment))
        .route(
            "/api/recipes/:id/like",
            post(handlers::like_recipe).put(handlers::unlike_recipe),
        )

        // Browser app
        .fallback_service(ServeDir::new(&config.server.static_dir))

        .layer(from_fn(middleware::require_auth))
        .layer(session_layer)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
