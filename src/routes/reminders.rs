use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{error::AppError, models::reminder::CreateReminderRequest, AppState};

/// POST /reminders — un rappel ponctuel. Refusé si la date est passée.
pub async fn create_reminder(
    State(state): State<AppState>,
    Json(body): Json<CreateReminderRequest>,
) -> Result<Json<Value>, AppError> {
    let id = state.reminders.schedule(body.when, &body.title, &body.body)?;
    Ok(Json(json!({ "id": id })))
}

#[derive(Debug, Deserialize)]
pub struct MealPreparationRequest {
    /// Date et heure du repas.
    pub meal_date: DateTime<Utc>,
    pub meal_name: String,
    /// Heures d'avance du rappel (défaut: 3).
    pub hours_in_advance: Option<i64>,
}

/// POST /reminders/meal-preparation
pub async fn create_meal_preparation_reminder(
    State(state): State<AppState>,
    Json(body): Json<MealPreparationRequest>,
) -> Result<Json<Value>, AppError> {
    let id = state.reminders.schedule_meal_preparation(
        body.meal_date,
        &body.meal_name,
        body.hours_in_advance.unwrap_or(3),
    )?;
    Ok(Json(json!({ "id": id })))
}

/// POST /reminders/weekly — programme le rappel de planification selon les
/// jours et l'heure des préférences.
pub async fn create_weekly_reminders(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let prefs = state.preferences.get();
    if !prefs.enable_reminders {
        return Err(AppError::Validation(
            "les rappels sont désactivés dans les préférences".into(),
        ));
    }

    let mut ids = Vec::new();
    for day in &prefs.reminder_days {
        ids.push(
            state
                .reminders
                .schedule_weekly_menu_reminder(*day, &prefs.reminder_time)?,
        );
    }
    Ok(Json(json!({ "ids": ids })))
}

/// GET /reminders — les rappels différés persistés et le nombre de timers armés.
pub async fn list_reminders(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "pending": state.reminders.pending(),
        "armed": state.reminders.armed_count(),
    }))
}

/// DELETE /reminders/{id}
pub async fn cancel_reminder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if state.reminders.cancel(id) {
        Ok(Json(json!({ "cancelled": id })))
    } else {
        Err(AppError::NotFound(format!("rappel {id}")))
    }
}
