use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::Result;
use crate::models::repas::{Repas, RepasInput, RepasQuery};
use crate::services::cache::CacheStore;
use crate::services::repas::RepasService;

/// Clef du snapshot persisté de la collection.
const MEALS_CACHE_KEY: &str = "meals";

/// En deçà de cette fenêtre, `fetch` rend la collection en mémoire sans I/O.
const FRESH_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Critères de recherche conjonctifs; un champ vide est sans effet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub text: Option<String>,
    pub saison: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub max_prep_time: Option<i32>,
    pub difficulte: Option<String>,
    pub max_calories: Option<i32>,
    pub included_ingredients: Vec<String>,
    pub excluded_ingredients: Vec<String>,
}

fn nonempty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl SearchFilters {
    pub fn matches(&self, repas: &Repas) -> bool {
        if let Some(text) = nonempty(&self.text) {
            let text = text.to_lowercase();
            let in_nom = repas.nom.to_lowercase().contains(&text);
            let in_ingredients = repas
                .ingredients
                .iter()
                .any(|i| i.to_lowercase().contains(&text));
            if !in_nom && !in_ingredients {
                return false;
            }
        }
        if let Some(saison) = nonempty(&self.saison) {
            if repas.saison != saison {
                return false;
            }
        }
        if let Some(type_) = nonempty(&self.type_) {
            if repas.type_ != type_ {
                return false;
            }
        }
        // Contrairement au générateur, un temps ou des calories inconnus
        // échouent les plafonds de recherche.
        if let Some(max) = self.max_prep_time {
            if !repas.temps_preparation.map(|t| t <= max).unwrap_or(false) {
                return false;
            }
        }
        if let Some(difficulte) = nonempty(&self.difficulte) {
            if repas.difficulte.as_deref() != Some(difficulte) {
                return false;
            }
        }
        if let Some(max) = self.max_calories {
            if !repas.calories.map(|c| c <= max).unwrap_or(false) {
                return false;
            }
        }
        for term in &self.included_ingredients {
            let term = term.to_lowercase();
            if !repas
                .ingredients
                .iter()
                .any(|i| i.to_lowercase().contains(&term))
            {
                return false;
            }
        }
        for term in &self.excluded_ingredients {
            let term = term.to_lowercase();
            if repas
                .ingredients
                .iter()
                .any(|i| i.to_lowercase().contains(&term))
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Default)]
struct MealsState {
    meals: Vec<Repas>,
    /// Milliseconds since epoch of the last successful fetch (or of the
    /// snapshot the store degraded to).
    last_fetch: Option<i64>,
    loading: bool,
    last_error: Option<String>,
    filters: SearchFilters,
}

/// Métadonnées exposées avec la collection.
#[derive(Debug, Clone, Serialize)]
pub struct MealsMeta {
    pub total: usize,
    pub last_fetch: Option<i64>,
    pub loading: bool,
    pub last_error: Option<String>,
}

/// In-memory recipe collection with staleness tracking, filtered views and a
/// degraded mode backed by the persisted cache snapshot.
pub struct MealsStore {
    cache: CacheStore,
    state: RwLock<MealsState>,
}

impl MealsStore {
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache,
            state: RwLock::new(MealsState::default()),
        }
    }

    /// Warm start: reload the persisted snapshot before any network round
    /// trip. The caller is expected to trigger a background `fetch` next.
    pub fn initialize(&self) {
        if let Some((meals, timestamp)) = self.cache.get_with_timestamp::<Vec<Repas>>(MEALS_CACHE_KEY)
        {
            let mut state = self.lock_write();
            state.meals = meals;
            state.last_fetch = Some(timestamp);
        }
    }

    /// Returns the in-memory collection while it is fresh (< 5 min), otherwise
    /// refetches. On a transport failure, falls back to a snapshot younger
    /// than 24 h; only when that fails too does the error surface, leaving the
    /// collection unchanged.
    pub async fn fetch(&self, pool: &PgPool, force_refresh: bool) -> Result<Vec<Repas>> {
        {
            let state = self.lock_read();
            if !force_refresh {
                if let Some(last) = state.last_fetch {
                    if Utc::now().timestamp_millis() - last < FRESH_WINDOW_MS {
                        return Ok(state.meals.clone());
                    }
                }
            }
        }

        {
            let mut state = self.lock_write();
            state.loading = true;
            state.last_error = None;
        }

        match RepasService::list(pool, &RepasQuery::default()).await {
            Ok(meals) => {
                let mut state = self.lock_write();
                state.meals = meals.clone();
                state.last_fetch = Some(Utc::now().timestamp_millis());
                state.loading = false;
                drop(state);
                self.cache.set(MEALS_CACHE_KEY, &meals);
                Ok(meals)
            }
            Err(e) => {
                tracing::warn!("Chargement des repas impossible: {}", e);
                let fallback = self.cache.get_with_timestamp::<Vec<Repas>>(MEALS_CACHE_KEY);
                let mut state = self.lock_write();
                state.loading = false;
                state.last_error = Some(e.to_string());
                match fallback {
                    Some((meals, timestamp)) => {
                        state.meals = meals.clone();
                        state.last_fetch = Some(timestamp);
                        Ok(meals)
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Store lookup first, network only on a miss.
    pub async fn get_by_id(&self, pool: &PgPool, id: i32) -> Result<Repas> {
        if let Some(found) = self
            .lock_read()
            .meals
            .iter()
            .find(|m| m.id == id)
            .cloned()
        {
            return Ok(found);
        }
        RepasService::get(pool, id).await
    }

    pub async fn add(&self, pool: &PgPool, input: &RepasInput) -> Result<Repas> {
        let created = RepasService::create(pool, input).await?;
        self.lock_write().meals.push(created.clone());
        Ok(created)
    }

    pub async fn update(&self, pool: &PgPool, id: i32, input: &RepasInput) -> Result<Repas> {
        let updated = RepasService::update(pool, id, input).await?;
        let mut state = self.lock_write();
        if let Some(slot) = state.meals.iter_mut().find(|m| m.id == id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    pub async fn delete(&self, pool: &PgPool, id: i32) -> Result<i32> {
        let deleted = RepasService::delete(pool, id).await?;
        self.lock_write().meals.retain(|m| m.id != id);
        Ok(deleted)
    }

    /// Des critères vides remettent la recherche à zéro.
    pub fn set_filters(&self, filters: SearchFilters) {
        self.lock_write().filters = filters;
    }

    pub fn filtered(&self) -> Vec<Repas> {
        let state = self.lock_read();
        state
            .meals
            .iter()
            .filter(|m| state.filters.matches(m))
            .cloned()
            .collect()
    }

    /// Uniform pick over the full, unfiltered collection.
    pub fn random(&self) -> Option<Repas> {
        let state = self.lock_read();
        state.meals.choose(&mut rand::thread_rng()).cloned()
    }

    pub fn snapshot(&self) -> (Vec<Repas>, MealsMeta) {
        let state = self.lock_read();
        let meta = MealsMeta {
            total: state.meals.len(),
            last_fetch: state.last_fetch,
            loading: state.loading,
            last_error: state.last_error.clone(),
        };
        (state.meals.clone(), meta)
    }

    pub fn by_season(&self) -> BTreeMap<String, u32> {
        let state = self.lock_read();
        let mut grouped = BTreeMap::new();
        for meal in &state.meals {
            *grouped.entry(meal.saison.clone()).or_insert(0) += 1;
        }
        grouped
    }

    pub fn by_type(&self) -> BTreeMap<String, u32> {
        let state = self.lock_read();
        let mut grouped = BTreeMap::new();
        for meal in &state.meals {
            *grouped.entry(meal.type_.clone()).or_insert(0) += 1;
        }
        grouped
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, MealsState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, MealsState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repas(id: i32, nom: &str, ingredients: Vec<&str>) -> Repas {
        Repas {
            id,
            nom: nom.into(),
            type_: "midi".into(),
            saison: "automne".into(),
            moment_journee: None,
            description: None,
            temps_preparation: Some(30),
            temps_cuisson: None,
            temps_repos: None,
            temps_total: None,
            difficulte: Some("facile".into()),
            cout: None,
            calories: Some(400),
            ingredients: ingredients.into_iter().map(String::from).collect(),
            instructions: vec![],
            notes: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn collection() -> Vec<Repas> {
        vec![
            repas(1, "Poulet rôti", vec!["1 poulet", "2 carottes"]),
            repas(2, "Gratin dauphinois", vec!["1 kg pommes de terre", "50 cl crème"]),
            repas(3, "Salade verte", vec!["1 salade", "vinaigrette"]),
        ]
    }

    fn filtre_sur(collection: &[Repas], filters: &SearchFilters) -> Vec<i32> {
        collection
            .iter()
            .filter(|m| filters.matches(m))
            .map(|m| m.id)
            .collect()
    }

    #[test]
    fn recherche_texte_insensible_a_la_casse() {
        let filters = SearchFilters {
            text: Some("poulet".into()),
            ..SearchFilters::default()
        };
        assert_eq!(filtre_sur(&collection(), &filters), vec![1]);
    }

    #[test]
    fn recherche_texte_dans_les_ingredients() {
        let filters = SearchFilters {
            text: Some("CRÈME".into()),
            ..SearchFilters::default()
        };
        assert_eq!(filtre_sur(&collection(), &filters), vec![2]);
    }

    #[test]
    fn un_filtre_vide_est_sans_effet() {
        let filters = SearchFilters {
            text: Some("  ".into()),
            saison: Some(String::new()),
            ..SearchFilters::default()
        };
        assert_eq!(filtre_sur(&collection(), &filters).len(), 3);
    }

    #[test]
    fn plafond_de_preparation_exclut_les_temps_inconnus() {
        let mut meals = collection();
        meals[2].temps_preparation = None;
        let filters = SearchFilters {
            max_prep_time: Some(45),
            ..SearchFilters::default()
        };
        assert_eq!(filtre_sur(&meals, &filters), vec![1, 2]);
    }

    #[test]
    fn ingredients_inclus_tous_requis() {
        let filters = SearchFilters {
            included_ingredients: vec!["poulet".into(), "carotte".into()],
            ..SearchFilters::default()
        };
        assert_eq!(filtre_sur(&collection(), &filters), vec![1]);
    }

    #[test]
    fn ingredients_exclus_aucun_tolere() {
        let filters = SearchFilters {
            excluded_ingredients: vec!["crème".into()],
            ..SearchFilters::default()
        };
        assert_eq!(filtre_sur(&collection(), &filters), vec![1, 3]);
    }

    #[test]
    fn les_filtres_sont_conjonctifs() {
        let filters = SearchFilters {
            text: Some("a".into()),
            max_calories: Some(500),
            excluded_ingredients: vec!["poulet".into()],
            ..SearchFilters::default()
        };
        assert_eq!(filtre_sur(&collection(), &filters), vec![2, 3]);
    }
}
