// API module - HTTP endpoints

use askama::Template;
use axum::{routing::get, Router};

pub mod equipments;
pub mod health;
pub mod issues;
pub mod state;
pub mod students;

pub use state::AppState;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

async fn index() -> IndexTemplate {
    IndexTemplate
}

/// Builds the application routes over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health::health_check))
        .merge(students::router())
        .merge(equipments::router())
        .merge(issues::router())
        .with_state(state)
}
