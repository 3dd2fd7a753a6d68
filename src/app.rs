use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/week/:week", get(handlers::week_page))
        .route("/legacy-import", post(handlers::legacy_import))
        .route("/reset", post(handlers::reset_form))
        .route("/coach", get(handlers::coach_page))
        .route("/api/state", get(handlers::get_state))
        .route("/api/weeks/:week/days/:day", patch(handlers::patch_day))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/sync", get(handlers::get_sync))
        .route("/api/export", get(handlers::export))
        .route("/api/import", post(handlers::import))
        .route("/api/reset", post(handlers::reset))
        .route("/api/coach/clients", get(handlers::coach_clients))
        .route("/api/coach/clients/:id", get(handlers::coach_client_state))
        .with_state(state)
}
