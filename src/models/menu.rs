use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::preferences::Preferences;
use crate::models::repas::Repas;

/// Parameters of one generation run. Snapshotted into the menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuSettings {
    pub duration_weeks: u32,
    pub season: Option<String>,
    pub include_lunch: bool,
    pub include_dinner: bool,
    pub include_sunday_lunch: bool,
    pub max_prep_time: Option<i32>,
    pub difficulty: Option<String>,
    pub dietary_restrictions: Vec<String>,
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self {
            duration_weeks: 1,
            season: Some("automne".into()),
            include_lunch: true,
            include_dinner: true,
            include_sunday_lunch: false,
            max_prep_time: None,
            difficulty: None,
            dietary_restrictions: Vec::new(),
        }
    }
}

/// Body for POST /menus/generate. Every field is optional: unset fields fall
/// back to the preference-derived defaults.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GenerateMenuRequest {
    pub duration_weeks: Option<u32>,
    pub season: Option<String>,
    pub include_lunch: Option<bool>,
    pub include_dinner: Option<bool>,
    pub include_sunday_lunch: Option<bool>,
    pub max_prep_time: Option<i32>,
    pub difficulty: Option<String>,
    pub dietary_restrictions: Option<Vec<String>>,
}

impl MenuSettings {
    /// Defaults seeded from the user preferences: season and the dietary
    /// exclusions (restrictions + allergies) carry over into generation.
    pub fn from_preferences(prefs: &Preferences) -> Self {
        let mut restrictions = prefs.dietary_restrictions.clone();
        restrictions.extend(prefs.allergies.iter().cloned());
        Self {
            season: Some(prefs.default_season.clone()),
            dietary_restrictions: restrictions,
            ..Self::default()
        }
    }

    pub fn merged_with(mut self, req: &GenerateMenuRequest) -> Self {
        if let Some(d) = req.duration_weeks {
            self.duration_weeks = d;
        }
        if req.season.is_some() {
            self.season = req.season.clone();
        }
        if let Some(v) = req.include_lunch {
            self.include_lunch = v;
        }
        if let Some(v) = req.include_dinner {
            self.include_dinner = v;
        }
        if let Some(v) = req.include_sunday_lunch {
            self.include_sunday_lunch = v;
        }
        if req.max_prep_time.is_some() {
            self.max_prep_time = req.max_prep_time;
        }
        if req.difficulty.is_some() {
            self.difficulty = req.difficulty.clone();
        }
        if let Some(r) = &req.dietary_restrictions {
            self.dietary_restrictions = r.clone();
        }
        self
    }
}

/// One recipe assigned to one slot of the generated menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealAssignment {
    #[serde(flatten)]
    pub repas: Repas,
    pub day: u32,
    pub meal_time: String,
}

/// A slot the generator could not fill. Reported, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfilledSlot {
    pub day: u32,
    pub meal_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListEntry {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuStats {
    pub total_meals: u32,
    pub total_prep_time: i64,
    pub total_calories: i64,
    pub average_prep_time: i64,
    pub average_calories: i64,
    pub seasons: BTreeMap<String, u32>,
    pub types: BTreeMap<String, u32>,
    pub difficulties: BTreeMap<String, u32>,
}

/// A generated menu. Immutable once generated, except the `checked` flags of
/// its shopping list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    /// Generation timestamp in milliseconds, stringified.
    pub id: String,
    pub created_at: String,
    pub settings: MenuSettings,
    pub meals: Vec<MealAssignment>,
    pub shopping_list: Vec<ShoppingListEntry>,
    pub stats: MenuStats,
    pub unfilled_slots: Vec<UnfilledSlot>,
}
