use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::repas::Repas,
    services::meals::SearchFilters,
    AppState,
};

/// Query params de GET /meals/filtered. Les listes d'ingrédients arrivent en
/// valeurs séparées par des virgules.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub text: Option<String>,
    pub saison: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub max_prep_time: Option<i32>,
    pub difficulte: Option<String>,
    pub max_calories: Option<i32>,
    pub include: Option<String>,
    pub exclude: Option<String>,
}

fn split_terms(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

impl FilterQuery {
    fn into_filters(self) -> SearchFilters {
        SearchFilters {
            text: self.text,
            saison: self.saison,
            type_: self.type_,
            max_prep_time: self.max_prep_time,
            difficulte: self.difficulte,
            max_calories: self.max_calories,
            included_ingredients: split_terms(self.include),
            excluded_ingredients: split_terms(self.exclude),
        }
    }
}

/// GET /meals — la collection en mémoire et ses métadonnées de fraîcheur.
pub async fn get_meals(State(state): State<AppState>) -> Json<Value> {
    // Rafraîchit en passant si la fenêtre de 5 minutes est écoulée; un échec
    // réseau laisse simplement la collection en l'état.
    let _ = state.meals.fetch(&state.db, false).await;
    let (meals, meta) = state.meals.snapshot();
    Json(json!({
        "meals": meals,
        "meta": meta,
        "by_season": state.meals.by_season(),
        "by_type": state.meals.by_type(),
    }))
}

/// POST /meals/refresh — force un aller-retour réseau.
pub async fn refresh_meals(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let meals = state.meals.fetch(&state.db, true).await?;
    let (_, meta) = state.meals.snapshot();
    Ok(Json(json!({ "meals": meals, "meta": meta })))
}

/// GET /meals/filtered — applique et mémorise les critères de recherche.
pub async fn filtered_meals(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Json<Vec<Repas>> {
    let _ = state.meals.fetch(&state.db, false).await;
    state.meals.set_filters(query.into_filters());
    Json(state.meals.filtered())
}

/// GET /meals/random — tirage uniforme sur la collection non filtrée.
pub async fn random_meal(State(state): State<AppState>) -> Json<Option<Repas>> {
    let _ = state.meals.fetch(&state.db, false).await;
    Json(state.meals.random())
}
