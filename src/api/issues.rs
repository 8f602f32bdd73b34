use askama::Template;
use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::error::{ApiResult, Result};
use crate::models::{issue::display_time, Equipment, Issue, IssueDetails, OverdueIssue, Student};
use crate::services::{inventory, loans};

// Templates
#[derive(Template)]
#[template(path = "issues/list.html")]
struct IssueListTemplate {
    rows: Vec<IssueRow>,
}

struct IssueRow {
    details: IssueDetails,
    overdue: bool,
    issued_at: String,
    due_at: String,
    returned_at: String,
}

impl IssueRow {
    fn new(details: IssueDetails, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let issue = &details.issue;

        Self {
            overdue: issue.is_overdue(now),
            issued_at: display_time(issue.issued_at, offset),
            due_at: display_time(issue.due_at, offset),
            returned_at: issue
                .returned_at
                .map(|at| display_time(at, offset))
                .unwrap_or_else(|| "-".to_string()),
            details,
        }
    }
}

#[derive(Template)]
#[template(path = "issues/new.html")]
struct NewIssueTemplate {
    students: Vec<Student>,
    equipments: Vec<Equipment>,
    loan_period: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueForm {
    pub student_id: Uuid,
    pub equipment_id: Uuid,
}

/// Issue list, newest first
async fn list_issues_page(State(state): State<AppState>) -> Result<IssueListTemplate> {
    let now = Utc::now();
    let rows = loans::list_issues(state.store.as_ref())
        .await?
        .into_iter()
        .map(|details| IssueRow::new(details, now, state.display_offset))
        .collect();

    Ok(IssueListTemplate { rows })
}

async fn list_issues_json(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<IssueDetails>>> {
    let issues = loans::list_issues(state.store.as_ref()).await?;

    Ok(Json(issues))
}

async fn get_issue_json(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Issue>> {
    let issue = loans::find_issue(state.store.as_ref(), id).await?;

    Ok(Json(issue))
}

/// Loans that the next sweep would remind
async fn list_pending_reminders_json(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<OverdueIssue>>> {
    let overdue = loans::list_overdue(state.store.as_ref(), Utc::now()).await?;

    Ok(Json(overdue))
}

async fn new_issue_page(State(state): State<AppState>) -> Result<NewIssueTemplate> {
    let students = inventory::list_students(state.store.as_ref()).await?;
    let equipments = inventory::list_equipments(state.store.as_ref()).await?;

    Ok(NewIssueTemplate {
        students,
        equipments,
        loan_period: state.policy.describe(),
    })
}

async fn create_issue(
    State(state): State<AppState>,
    Form(form): Form<IssueForm>,
) -> Result<Redirect> {
    loans::issue(
        state.store.as_ref(),
        &state.policy,
        form.student_id,
        form.equipment_id,
        Utc::now(),
    )
    .await?;

    Ok(Redirect::to("/issues"))
}

async fn return_issue(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Redirect> {
    loans::return_item(state.store.as_ref(), id, Utc::now()).await?;

    Ok(Redirect::to("/issues"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        // HTML routes
        .route("/issues", get(list_issues_page).post(create_issue))
        .route("/issues/new", get(new_issue_page))
        .route("/issues/:id/return", post(return_issue))
        // JSON API routes
        .route("/api/issues", get(list_issues_json))
        .route("/api/issues/overdue", get(list_pending_reminders_json))
        .route("/api/issues/:id", get(get_issue_json))
}
