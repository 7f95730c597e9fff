use std::collections::HashSet;
use std::sync::RwLock;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{AppError, Result};
use crate::models::menu::{
    MealAssignment, Menu, MenuSettings, MenuStats, UnfilledSlot,
};
use crate::models::repas::Repas;
use crate::services::shopping_list::ShoppingListService;
use crate::services::storage::Storage;

const MENUS_KEY: &str = "generated_menus";
const MAX_MENUS: usize = 10;

pub struct MenuService;

impl MenuService {
    /// Assigns recipes to the slots of `duration_weeks * 7` days. A slot with
    /// no matching candidate is recorded as unfilled and skipped; an empty
    /// candidate pool therefore yields an empty menu, never an error.
    pub fn generate(meals: &[Repas], settings: &MenuSettings) -> Menu {
        let mut rng = rand::thread_rng();
        Self::generate_with_rng(meals, settings, &mut rng)
    }

    pub fn generate_with_rng<R: Rng>(
        meals: &[Repas],
        settings: &MenuSettings,
        rng: &mut R,
    ) -> Menu {
        let mut assignments: Vec<MealAssignment> = Vec::new();
        let mut unfilled: Vec<UnfilledSlot> = Vec::new();
        let mut used: HashSet<i32> = HashSet::new();

        let days = settings.duration_weeks * 7;
        for day in 0..days {
            if settings.include_lunch {
                Self::fill_slot(
                    meals, settings, "midi", day, &mut used, rng, &mut assignments, &mut unfilled,
                );
            }
            if settings.include_dinner {
                Self::fill_slot(
                    meals, settings, "soir", day, &mut used, rng, &mut assignments, &mut unfilled,
                );
            }
            if settings.include_sunday_lunch && day % 7 == 6 {
                Self::fill_slot(
                    meals,
                    settings,
                    "dimanche_midi",
                    day,
                    &mut used,
                    rng,
                    &mut assignments,
                    &mut unfilled,
                );
            }
        }

        let now = Utc::now();
        let shopping_list = ShoppingListService::aggregate(&assignments);
        let stats = Self::stats(&assignments);

        Menu {
            id: now.timestamp_millis().to_string(),
            created_at: now.to_rfc3339(),
            settings: settings.clone(),
            meals: assignments,
            shopping_list,
            stats,
            unfilled_slots: unfilled,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_slot<R: Rng>(
        meals: &[Repas],
        settings: &MenuSettings,
        meal_time: &str,
        day: u32,
        used: &mut HashSet<i32>,
        rng: &mut R,
        assignments: &mut Vec<MealAssignment>,
        unfilled: &mut Vec<UnfilledSlot>,
    ) {
        match Self::pick(meals, settings, meal_time, used, rng) {
            Some(repas) => {
                used.insert(repas.id);
                assignments.push(MealAssignment {
                    repas,
                    day,
                    meal_time: meal_time.to_string(),
                });
            }
            None => unfilled.push(UnfilledSlot {
                day,
                meal_time: meal_time.to_string(),
            }),
        }
    }

    /// Uniform pick among the candidates matching the slot's filters and not
    /// yet used in this run.
    fn pick<R: Rng>(
        meals: &[Repas],
        settings: &MenuSettings,
        meal_time: &str,
        used: &HashSet<i32>,
        rng: &mut R,
    ) -> Option<Repas> {
        let candidates: Vec<&Repas> = meals
            .iter()
            .filter(|m| Self::matches_slot(m, settings, meal_time, used))
            .collect();
        candidates.choose(rng).map(|r| (*r).clone())
    }

    fn matches_slot(
        repas: &Repas,
        settings: &MenuSettings,
        meal_time: &str,
        used: &HashSet<i32>,
    ) -> bool {
        if repas.type_ != meal_time {
            return false;
        }
        if used.contains(&repas.id) {
            return false;
        }
        if let Some(season) = &settings.season {
            if &repas.saison != season {
                return false;
            }
        }
        // Un temps de préparation inconnu n'élimine pas le candidat.
        if let Some(max) = settings.max_prep_time {
            if repas.temps_preparation.map(|t| t > max).unwrap_or(false) {
                return false;
            }
        }
        if let Some(difficulty) = &settings.difficulty {
            if repas.difficulte.as_deref() != Some(difficulty.as_str()) {
                return false;
            }
        }
        for term in &settings.dietary_restrictions {
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

    pub fn stats(meals: &[MealAssignment]) -> MenuStats {
        let mut stats = MenuStats::default();
        for assignment in meals {
            let repas = &assignment.repas;
            stats.total_meals += 1;
            stats.total_prep_time += i64::from(repas.temps_preparation.unwrap_or(0));
            stats.total_calories += i64::from(repas.calories.unwrap_or(0));
            *stats.seasons.entry(repas.saison.clone()).or_insert(0) += 1;
            *stats.types.entry(repas.type_.clone()).or_insert(0) += 1;
            if let Some(difficulte) = &repas.difficulte {
                *stats.difficulties.entry(difficulte.clone()).or_insert(0) += 1;
            }
        }
        if stats.total_meals > 0 {
            let n = f64::from(stats.total_meals);
            stats.average_prep_time = (stats.total_prep_time as f64 / n).round() as i64;
            stats.average_calories = (stats.total_calories as f64 / n).round() as i64;
        }
        stats
    }
}

#[derive(Default)]
struct MenuState {
    menus: Vec<Menu>,
    current: Option<String>,
}

/// Ring buffer of the last generated menus (newest first, capped at 10),
/// mirrored to persistent storage.
pub struct MenuStore {
    storage: Storage,
    state: RwLock<MenuState>,
}

impl MenuStore {
    pub fn new(storage: Storage) -> Self {
        let menus: Vec<Menu> = storage.read(MENUS_KEY).unwrap_or_default();
        Self {
            storage,
            state: RwLock::new(MenuState {
                current: menus.first().map(|m| m.id.clone()),
                menus,
            }),
        }
    }

    pub fn record(&self, menu: Menu) -> Menu {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.current = Some(menu.id.clone());
        state.menus.insert(0, menu.clone());
        state.menus.truncate(MAX_MENUS);
        self.persist(&state.menus);
        menu
    }

    pub fn list(&self) -> Vec<Menu> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .menus
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<Menu> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .menus
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub fn current(&self) -> Option<Menu> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let id = state.current.as_ref()?;
        state.menus.iter().find(|m| &m.id == id).cloned()
    }

    /// Make a previously generated menu the current one.
    pub fn load(&self, id: &str) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.menus.iter().any(|m| m.id == id) {
            state.current = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn delete(&self, id: &str) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let before = state.menus.len();
        state.menus.retain(|m| m.id != id);
        if state.current.as_deref() == Some(id) {
            state.current = None;
        }
        let deleted = state.menus.len() < before;
        if deleted {
            self.persist(&state.menus);
        }
        deleted
    }

    pub fn clear_current(&self) {
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .current = None;
    }

    /// The only mutation a generated menu accepts: its shopping-list check
    /// marks. `checked = None` toggles.
    pub fn set_checked(&self, id: &str, index: usize, checked: Option<bool>) -> Result<Menu> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let menu = state
            .menus
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::NotFound(format!("menu {id}")))?;
        let entry = menu
            .shopping_list
            .get_mut(index)
            .ok_or_else(|| AppError::NotFound(format!("entrée {index} de la liste de courses")))?;
        entry.checked = checked.unwrap_or(!entry.checked);
        let updated = menu.clone();
        self.persist(&state.menus);
        Ok(updated)
    }

    fn persist(&self, menus: &[Menu]) {
        if let Err(e) = self.storage.write(MENUS_KEY, &menus) {
            tracing::warn!("Sauvegarde des menus impossible: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn repas(id: i32, type_: &str) -> Repas {
        Repas {
            id,
            nom: format!("Repas {id}"),
            type_: type_.into(),
            saison: "automne".into(),
            moment_journee: None,
            description: None,
            temps_preparation: Some(30),
            temps_cuisson: None,
            temps_repos: None,
            temps_total: None,
            difficulte: Some("facile".into()),
            cout: None,
            calories: Some(500),
            ingredients: vec!["1 l lait".into(), format!("{id} g farine")],
            instructions: vec![],
            notes: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn pool_midi_soir(n_par_type: i32) -> Vec<Repas> {
        let mut meals = Vec::new();
        for i in 0..n_par_type {
            meals.push(repas(i, "midi"));
            meals.push(repas(100 + i, "soir"));
        }
        meals
    }

    #[test]
    fn une_semaine_complete_sans_repetition() {
        // 7 repas de midi + 7 du soir : exactement de quoi remplir la semaine
        let meals = pool_midi_soir(7);
        let settings = MenuSettings::default();

        let menu = MenuService::generate(&meals, &settings);

        assert_eq!(menu.meals.len(), 14);
        let ids: HashSet<i32> = menu.meals.iter().map(|a| a.repas.id).collect();
        assert_eq!(ids.len(), 14, "aucun repas ne doit se répéter dans la génération");
        assert!(menu.unfilled_slots.is_empty());
    }

    #[test]
    fn un_pool_vide_donne_un_menu_vide_pas_une_erreur() {
        let menu = MenuService::generate(&[], &MenuSettings::default());
        assert!(menu.meals.is_empty());
        assert!(menu.shopping_list.is_empty());
        // Chaque créneau demandé est signalé comme non pourvu
        assert_eq!(menu.unfilled_slots.len(), 14);
    }

    #[test]
    fn dimanche_midi_seulement_le_septieme_jour() {
        let mut meals = pool_midi_soir(7);
        meals.push(repas(500, "dimanche_midi"));
        let settings = MenuSettings {
            include_sunday_lunch: true,
            ..MenuSettings::default()
        };

        let menu = MenuService::generate(&meals, &settings);

        let dimanches: Vec<_> = menu
            .meals
            .iter()
            .filter(|a| a.meal_time == "dimanche_midi")
            .collect();
        assert_eq!(dimanches.len(), 1);
        assert_eq!(dimanches[0].day, 6);
    }

    #[test]
    fn un_creneau_sans_candidat_est_saute_et_signale() {
        // Que des repas de midi : tous les créneaux du soir restent vides
        let meals: Vec<Repas> = (0..7).map(|i| repas(i, "midi")).collect();
        let menu = MenuService::generate(&meals, &MenuSettings::default());

        assert_eq!(menu.meals.len(), 7);
        assert_eq!(menu.unfilled_slots.len(), 7);
        assert!(menu.unfilled_slots.iter().all(|s| s.meal_time == "soir"));
    }

    #[test]
    fn un_temps_de_preparation_inconnu_passe_le_filtre() {
        let mut sans_temps = repas(1, "midi");
        sans_temps.temps_preparation = None;
        let settings = MenuSettings {
            include_dinner: false,
            max_prep_time: Some(10),
            ..MenuSettings::default()
        };

        let menu = MenuService::generate(&[sans_temps], &settings);
        assert_eq!(menu.meals.len(), 1);
    }

    #[test]
    fn les_restrictions_alimentaires_excluent_par_ingredient() {
        let avec_lait = repas(1, "midi");
        let mut sans_lait = repas(2, "midi");
        sans_lait.ingredients = vec!["200 g riz".into()];
        let settings = MenuSettings {
            duration_weeks: 1,
            include_dinner: false,
            dietary_restrictions: vec!["lait".into()],
            ..MenuSettings::default()
        };

        let menu = MenuService::generate(&[avec_lait, sans_lait], &settings);
        assert!(menu.meals.iter().all(|a| a.repas.id == 2));
    }

    #[test]
    fn statistiques_sommes_et_moyennes() {
        let meals = pool_midi_soir(2);
        let settings = MenuSettings::default();
        let menu = MenuService::generate(&meals, &settings);

        // 4 repas disponibles pour 14 créneaux : 4 assignés
        assert_eq!(menu.stats.total_meals, 4);
        assert_eq!(menu.stats.total_prep_time, 120);
        assert_eq!(menu.stats.total_calories, 2000);
        assert_eq!(menu.stats.average_prep_time, 30);
        assert_eq!(menu.stats.average_calories, 500);
        assert_eq!(menu.stats.types.get("midi"), Some(&2));
        assert_eq!(menu.stats.types.get("soir"), Some(&2));
    }

    use crate::models::menu::ShoppingListEntry;

    fn menu_avec_id(id: &str) -> Menu {
        Menu {
            id: id.into(),
            created_at: Utc::now().to_rfc3339(),
            settings: MenuSettings::default(),
            meals: vec![],
            shopping_list: vec![ShoppingListEntry {
                name: "lait".into(),
                quantity: 1.0,
                unit: "l".into(),
                category: "produits_laitiers".into(),
                checked: false,
            }],
            stats: MenuStats::default(),
            unfilled_slots: vec![],
        }
    }

    #[test]
    fn le_tampon_de_menus_est_borne_a_dix() {
        let dir = tempfile::tempdir().unwrap();
        let store = MenuStore::new(Storage::new(dir.path()).unwrap());

        for i in 0..12 {
            store.record(menu_avec_id(&i.to_string()));
        }

        let menus = store.list();
        assert_eq!(menus.len(), 10);
        // Les plus récents d'abord, les plus anciens évincés
        assert_eq!(menus[0].id, "11");
        assert!(store.get("0").is_none());
        assert!(store.get("1").is_none());
    }

    #[test]
    fn les_menus_survivent_a_un_redemarrage() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = MenuStore::new(Storage::new(dir.path()).unwrap());
            store.record(menu_avec_id("42"));
        }
        let store = MenuStore::new(Storage::new(dir.path()).unwrap());
        assert!(store.get("42").is_some());
        assert_eq!(store.current().unwrap().id, "42");
    }

    #[test]
    fn cocher_une_entree_de_la_liste_de_courses() {
        let dir = tempfile::tempdir().unwrap();
        let store = MenuStore::new(Storage::new(dir.path()).unwrap());
        store.record(menu_avec_id("7"));

        let menu = store.set_checked("7", 0, None).unwrap();
        assert!(menu.shopping_list[0].checked);
        let menu = store.set_checked("7", 0, None).unwrap();
        assert!(!menu.shopping_list[0].checked);

        assert!(store.set_checked("7", 99, Some(true)).is_err());
        assert!(store.set_checked("absent", 0, Some(true)).is_err());
    }

    #[test]
    fn supprimer_un_menu() {
        let dir = tempfile::tempdir().unwrap();
        let store = MenuStore::new(Storage::new(dir.path()).unwrap());
        store.record(menu_avec_id("a"));
        store.record(menu_avec_id("b"));

        assert!(store.delete("b"));
        assert!(store.current().is_none(), "le menu courant supprimé est désélectionné");
        assert!(!store.delete("b"));
        assert_eq!(store.list().len(), 1);
    }
}
