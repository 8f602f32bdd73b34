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
use crate::models::{Equipment, NewEquipment};
use crate::services::inventory;

#[derive(Template)]
#[template(path = "equipments.html")]
struct EquipmentsTemplate {
    equipments: Vec<Equipment>,
}

async fn equipments_page(State(state): State<AppState>) -> Result<EquipmentsTemplate> {
    let equipments = inventory::list_equipments(state.store.as_ref()).await?;

    Ok(EquipmentsTemplate { equipments })
}

async fn create_equipment(
    State(state): State<AppState>,
    Form(form): Form<NewEquipment>,
) -> Result<Redirect> {
    inventory::register_equipment(state.store.as_ref(), form).await?;

    Ok(Redirect::to("/equipments"))
}

async fn delete_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect> {
    inventory::remove_equipment(state.store.as_ref(), id).await?;

    Ok(Redirect::to("/equipments"))
}

async fn list_equipments_json(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Equipment>>> {
    let equipments = inventory::list_equipments(state.store.as_ref()).await?;

    Ok(Json(equipments))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/equipments", get(equipments_page).post(create_equipment))
        .route("/equipments/:id/delete", post(delete_equipment))
        .route("/api/equipments", get(list_equipments_json))
}
