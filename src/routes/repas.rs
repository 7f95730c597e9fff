use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::repas::{Repas, RepasInput, RepasQuery},
    services::repas::RepasService,
    AppState,
};

/// GET /repas?saison=&type=&dimanche_midi=
pub async fn list_repas(
    State(state): State<AppState>,
    Query(query): Query<RepasQuery>,
) -> Result<Json<Vec<Repas>>, AppError> {
    let repas = RepasService::list(&state.db, &query).await?;
    Ok(Json(repas))
}

/// GET /repas/{id}
pub async fn get_repas(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Repas>, AppError> {
    let repas = RepasService::get(&state.db, id).await?;
    Ok(Json(repas))
}

/// POST /repas — passe par le store pour tenir le miroir mémoire à jour.
pub async fn create_repas(
    State(state): State<AppState>,
    Json(body): Json<RepasInput>,
) -> Result<Json<Repas>, AppError> {
    let created = state.meals.add(&state.db, &body).await?;
    Ok(Json(created))
}

/// PUT /repas/{id}
pub async fn update_repas(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<RepasInput>,
) -> Result<Json<Repas>, AppError> {
    let updated = state.meals.update(&state.db, id, &body).await?;
    Ok(Json(updated))
}

/// DELETE /repas/{id}
pub async fn delete_repas(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.meals.delete(&state.db, id).await?;
    Ok(Json(json!({ "id": deleted })))
}
