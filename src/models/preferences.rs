use serde::{Deserialize, Serialize};

/// Flat user configuration, owned entirely by the client side of the
/// application. Never written to PostgreSQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub enable_reminders: bool,
    /// HH:MM local time.
    pub reminder_time: String,
    /// Days of week, 0 = dimanche .. 6 = samedi.
    pub reminder_days: Vec<u8>,
    pub enable_notifications: bool,
    pub default_season: String,
    pub default_meal_type: String,
    pub language: String,
    /// "system", "light" ou "dark".
    pub theme: String,
    pub show_nutrition_info: bool,
    pub show_prep_time: bool,
    pub show_difficulty: bool,
    pub show_cost: bool,
    pub auto_generate_shopping_list: bool,
    pub email_notifications: bool,
    pub weekly_menu_reminder: bool,
    pub seasonal_recommendations: bool,
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub favorite_ingredients: Vec<String>,
    pub disliked_ingredients: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            enable_reminders: false,
            reminder_time: "18:00".into(),
            reminder_days: vec![5], // vendredi
            enable_notifications: false,
            default_season: "automne".into(),
            default_meal_type: "midi".into(),
            language: "fr".into(),
            theme: "system".into(),
            show_nutrition_info: true,
            show_prep_time: true,
            show_difficulty: true,
            show_cost: true,
            auto_generate_shopping_list: true,
            email_notifications: false,
            weekly_menu_reminder: true,
            seasonal_recommendations: true,
            dietary_restrictions: Vec::new(),
            allergies: Vec::new(),
            favorite_ingredients: Vec::new(),
            disliked_ingredients: Vec::new(),
        }
    }
}
