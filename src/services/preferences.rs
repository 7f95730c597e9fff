use std::sync::RwLock;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::preferences::Preferences;
use crate::services::storage::Storage;

const PREFERENCES_KEY: &str = "user_preferences";

/// Flat user configuration with persistence. A partial record on disk (or in
/// an update) merges over the defaults.
pub struct PreferencesStore {
    storage: Storage,
    state: RwLock<Preferences>,
}

impl PreferencesStore {
    pub fn new(storage: Storage) -> Self {
        let prefs = storage.read(PREFERENCES_KEY).unwrap_or_default();
        Self {
            storage,
            state: RwLock::new(prefs),
        }
    }

    pub fn get(&self) -> Preferences {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Shallow merge of a partial JSON object over the current record.
    /// Unknown keys are rejected rather than silently kept.
    pub fn update(&self, patch: &Value) -> Result<Preferences> {
        let object = patch
            .as_object()
            .ok_or_else(|| AppError::Validation("un objet JSON est attendu".into()))?;

        let current = self.get();
        let mut merged = serde_json::to_value(&current)
            .map_err(|e| AppError::Query(e.to_string()))?;
        let merged_map = merged
            .as_object_mut()
            .ok_or_else(|| AppError::Query("représentation des préférences invalide".into()))?;
        for (key, value) in object {
            if !merged_map.contains_key(key) {
                return Err(AppError::Validation(format!("préférence inconnue: '{key}'")));
            }
            merged_map.insert(key.clone(), value.clone());
        }

        let updated: Preferences = serde_json::from_value(merged)
            .map_err(|e| AppError::Validation(format!("préférences invalides: {e}")))?;
        self.replace(updated.clone())?;
        Ok(updated)
    }

    pub fn reset(&self) -> Result<Preferences> {
        let defaults = Preferences::default();
        self.replace(defaults.clone())?;
        Ok(defaults)
    }

    pub fn add_to_list(&self, list: ListField, value: &str) -> Result<Preferences> {
        self.mutate_list(list, |items| {
            if !items.iter().any(|v| v == value) {
                items.push(value.to_string());
            }
        })
    }

    pub fn remove_from_list(&self, list: ListField, value: &str) -> Result<Preferences> {
        self.mutate_list(list, |items| items.retain(|v| v != value))
    }

    fn mutate_list(
        &self,
        list: ListField,
        apply: impl FnOnce(&mut Vec<String>),
    ) -> Result<Preferences> {
        let mut prefs = self.get();
        apply(list.pick_mut(&mut prefs));
        self.replace(prefs.clone())?;
        Ok(prefs)
    }

    fn replace(&self, prefs: Preferences) -> Result<()> {
        self.storage.write(PREFERENCES_KEY, &prefs)?;
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = prefs;
        Ok(())
    }
}

/// Les quatre listes libres des préférences.
#[derive(Debug, Clone, Copy)]
pub enum ListField {
    DietaryRestrictions,
    Allergies,
    FavoriteIngredients,
    DislikedIngredients,
}

impl ListField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dietary_restrictions" => Some(Self::DietaryRestrictions),
            "allergies" => Some(Self::Allergies),
            "favorite_ingredients" => Some(Self::FavoriteIngredients),
            "disliked_ingredients" => Some(Self::DislikedIngredients),
            _ => None,
        }
    }

    fn pick_mut(self, prefs: &mut Preferences) -> &mut Vec<String> {
        match self {
            Self::DietaryRestrictions => &mut prefs.dietary_restrictions,
            Self::Allergies => &mut prefs.allergies,
            Self::FavoriteIngredients => &mut prefs.favorite_ingredients,
            Self::DislikedIngredients => &mut prefs.disliked_ingredients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(dir: &std::path::Path) -> PreferencesStore {
        PreferencesStore::new(Storage::new(dir).unwrap())
    }

    #[test]
    fn un_enregistrement_partiel_fusionne_sur_les_defauts() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());

        let updated = s
            .update(&json!({ "default_season": "hiver", "enable_reminders": true }))
            .unwrap();

        assert_eq!(updated.default_season, "hiver");
        assert!(updated.enable_reminders);
        // Le reste garde ses défauts
        assert_eq!(updated.reminder_time, "18:00");
        assert_eq!(updated.reminder_days, vec![5]);
    }

    #[test]
    fn une_clef_inconnue_est_rejetee() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        assert!(matches!(
            s.update(&json!({ "couleur": "bleu" })),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn un_type_invalide_est_rejete() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        assert!(s.update(&json!({ "reminder_days": "vendredi" })).is_err());
    }

    #[test]
    fn les_preferences_survivent_a_un_redemarrage() {
        let dir = tempfile::tempdir().unwrap();
        store(dir.path())
            .update(&json!({ "theme": "dark" }))
            .unwrap();

        assert_eq!(store(dir.path()).get().theme, "dark");
    }

    #[test]
    fn ajout_et_retrait_dans_les_listes_sans_doublon() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());

        s.add_to_list(ListField::Allergies, "arachide").unwrap();
        s.add_to_list(ListField::Allergies, "arachide").unwrap();
        assert_eq!(s.get().allergies, vec!["arachide"]);

        s.remove_from_list(ListField::Allergies, "arachide").unwrap();
        assert!(s.get().allergies.is_empty());
    }

    #[test]
    fn reset_revient_aux_defauts() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        s.update(&json!({ "theme": "dark" })).unwrap();

        let prefs = s.reset().unwrap();
        assert_eq!(prefs, Preferences::default());
    }
}
