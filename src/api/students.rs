use askama::Template;
use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::error::{ApiResult, Result};
use crate::models::{NewStudent, Student};
use crate::services::inventory;

#[derive(Template)]
#[template(path = "students.html")]
struct StudentsTemplate {
    students: Vec<Student>,
}

/// Student list with the registration form
async fn students_page(State(state): State<AppState>) -> Result<StudentsTemplate> {
    let students = inventory::list_students(state.store.as_ref()).await?;

    Ok(StudentsTemplate { students })
}

async fn create_student(
    State(state): State<AppState>,
    Form(form): Form<NewStudent>,
) -> Result<Redirect> {
    inventory::register_student(state.store.as_ref(), form).await?;

    Ok(Redirect::to("/students"))
}

async fn delete_student(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Redirect> {
    inventory::remove_student(state.store.as_ref(), id).await?;

    Ok(Redirect::to("/students"))
}

async fn list_students_json(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Student>>> {
    let students = inventory::list_students(state.store.as_ref()).await?;

    Ok(Json(students))
}

pub fn router() -> Router<AppState> {
    Router::new()
        // HTML routes
        .route("/students", get(students_page).post(create_student))
        .route("/students/:id/delete", post(delete_student))
        // JSON API routes
        .route("/api/students", get(list_students_json))
}
