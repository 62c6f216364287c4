use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::session::require_session;
use crate::{AppState, auth, chat, feed};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login));

    let protected_routes = Router::new()
        .route("/", get(feed::index))
        .route("/logout", post(auth::logout))
        .route("/post", post(feed::submit_post))
        .route("/comment/{post_id}", post(feed::submit_comment))
        .route("/edit_comment/{comment_id}", post(feed::submit_comment_edit))
        .route("/delete_comment/{comment_id}", post(feed::submit_comment_delete))
        .route("/chat", get(chat::chat_page).post(chat::submit_message))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
