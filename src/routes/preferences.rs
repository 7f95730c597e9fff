use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::AppError,
    models::preferences::Preferences,
    services::export::ExportService,
    services::preferences::ListField,
    AppState,
};

/// GET /preferences
pub async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.preferences.get())
}

/// PUT /preferences — fusion superficielle d'un objet partiel.
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> Result<Json<Preferences>, AppError> {
    let updated = state.preferences.update(&patch)?;
    Ok(Json(updated))
}

/// POST /preferences/reset
pub async fn reset_preferences(
    State(state): State<AppState>,
) -> Result<Json<Preferences>, AppError> {
    let defaults = state.preferences.reset()?;
    Ok(Json(defaults))
}

/// GET /preferences/export — artefact JSON téléchargeable.
pub async fn export_preferences(
    State(state): State<AppState>,
) -> Result<(HeaderMap, String), AppError> {
    let (filename, body) = ExportService::preferences_json(&state.preferences.get())?;
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .map_err(|e| AppError::Query(e.to_string()))?,
    );
    Ok((headers, body))
}

/// POST /preferences/import — mêmes règles de fusion que la mise à jour;
/// un fichier invalide est rejeté en bloc.
pub async fn import_preferences(
    State(state): State<AppState>,
    Json(imported): Json<Value>,
) -> Result<Json<Preferences>, AppError> {
    let updated = state.preferences.update(&imported)?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct ListItemRequest {
    pub value: String,
}

/// POST /preferences/lists/{list} — ajoute une valeur (sans doublon).
pub async fn add_list_item(
    State(state): State<AppState>,
    Path(list): Path<String>,
    Json(body): Json<ListItemRequest>,
) -> Result<Json<Preferences>, AppError> {
    let field = ListField::from_name(&list)
        .ok_or_else(|| AppError::NotFound(format!("liste de préférences '{list}'")))?;
    Ok(Json(state.preferences.add_to_list(field, &body.value)?))
}

/// DELETE /preferences/lists/{list}/{value}
pub async fn remove_list_item(
    State(state): State<AppState>,
    Path((list, value)): Path<(String, String)>,
) -> Result<Json<Preferences>, AppError> {
    let field = ListField::from_name(&list)
        .ok_or_else(|| AppError::NotFound(format!("liste de préférences '{list}'")))?;
    Ok(Json(state.preferences.remove_from_list(field, &value)?))
}
