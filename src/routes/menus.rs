use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::menu::{GenerateMenuRequest, Menu, MenuSettings},
    services::export::{ExportService, WeekTable},
    services::menu::MenuService,
    AppState,
};

/// POST /menus/generate — `{}` suffit; les champs absents retombent sur les
/// défauts dérivés des préférences.
pub async fn generate_menu(
    State(state): State<AppState>,
    Json(request): Json<GenerateMenuRequest>,
) -> Result<Json<Menu>, AppError> {
    let meals = state.meals.fetch(&state.db, false).await?;

    let settings = MenuSettings::from_preferences(&state.preferences.get()).merged_with(&request);

    let menu = MenuService::generate(&meals, &settings);
    Ok(Json(state.menus.record(menu)))
}

/// GET /menus — les menus retenus, du plus récent au plus ancien.
pub async fn list_menus(State(state): State<AppState>) -> Json<Vec<Menu>> {
    Json(state.menus.list())
}

/// GET /menus/current
pub async fn current_menu(State(state): State<AppState>) -> Json<Option<Menu>> {
    Json(state.menus.current())
}

/// DELETE /menus/current — désélectionne sans rien supprimer.
pub async fn clear_current_menu(State(state): State<AppState>) -> Json<Value> {
    state.menus.clear_current();
    Json(json!({ "current": Value::Null }))
}

/// GET /menus/{id}
pub async fn get_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Menu>, AppError> {
    state
        .menus
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("menu {id}")))
}

/// POST /menus/{id}/load — fait d'un menu retenu le menu courant.
pub async fn load_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if state.menus.load(&id) {
        Ok(Json(json!({ "current": id })))
    } else {
        Err(AppError::NotFound(format!("menu {id}")))
    }
}

/// DELETE /menus/{id}
pub async fn delete_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if state.menus.delete(&id) {
        Ok(Json(json!({ "deleted": id })))
    } else {
        Err(AppError::NotFound(format!("menu {id}")))
    }
}

/// GET /menus/{id}/export — artefact JSON réimportable.
pub async fn export_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(HeaderMap, String), AppError> {
    let menu = state
        .menus
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("menu {id}")))?;
    let (filename, body) = ExportService::menu_json(&menu)?;
    Ok((attachment_headers(&filename, "application/json")?, body))
}

/// GET /menus/{id}/shopping-list.csv
pub async fn shopping_list_csv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(HeaderMap, String), AppError> {
    let menu = state
        .menus
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("menu {id}")))?;
    let body = ExportService::shopping_list_csv(&menu)?;
    Ok((
        attachment_headers(&format!("liste-courses-{id}.csv"), "text/csv")?,
        body,
    ))
}

/// GET /menus/{id}/week-table — le modèle du tableau imprimable.
pub async fn week_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<WeekTable>>, AppError> {
    let menu = state
        .menus
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("menu {id}")))?;
    Ok(Json(ExportService::week_tables(&menu)))
}

#[derive(Debug, Deserialize)]
pub struct ToggleShoppingItemRequest {
    pub index: usize,
    /// Absent = bascule.
    pub checked: Option<bool>,
}

/// POST /menus/{id}/shopping-list/toggle — seule mutation permise d'un menu.
pub async fn toggle_shopping_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ToggleShoppingItemRequest>,
) -> Result<Json<Menu>, AppError> {
    let menu = state.menus.set_checked(&id, body.index, body.checked)?;
    Ok(Json(menu))
}

fn attachment_headers(filename: &str, content_type: &str) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type).map_err(|e| AppError::Query(e.to_string()))?,
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .map_err(|e| AppError::Query(e.to_string()))?,
    );
    Ok(headers)
}
