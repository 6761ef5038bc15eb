use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/members", get(handlers::members_page).post(handlers::create_member))
        .route("/members/new", get(handlers::new_member_page))
        .route("/members/reload", post(handlers::reload_members))
        .route("/members/:id", post(handlers::update_member))
        .route("/members/:id/edit", get(handlers::edit_member_page))
        .route("/members/:id/toggle", post(handlers::toggle_member))
        .route(
            "/members/:id/delete",
            get(handlers::confirm_delete_page).post(handlers::delete_member),
        )
        .route("/stats", get(handlers::stats_page))
        .route("/calendar", get(handlers::calendar_page))
        .route("/calendar/events", post(handlers::create_event))
        .route("/calendar/events/:id", post(handlers::update_event))
        .route("/calendar/events/:id/delete", post(handlers::delete_event))
        .route("/api/members", get(handlers::api_members))
        .route("/api/stats", get(handlers::api_stats))
        .with_state(state)
}
