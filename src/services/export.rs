use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::menu::Menu;
use crate::models::preferences::Preferences;
use crate::services::shopping_list::ShoppingListService;

const JOURS: &[&str] = &[
    "Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi", "Dimanche",
];

/// Une ligne du tableau hebdomadaire imprimable.
#[derive(Debug, Clone, Serialize)]
pub struct WeekTableRow {
    pub jour: String,
    pub midi: String,
    pub soir: String,
}

/// 7 lignes (jours) × 2 colonnes (midi/soir). Le rendu PDF proprement dit est
/// délégué au client; ce modèle en est la source.
#[derive(Debug, Clone, Serialize)]
pub struct WeekTable {
    pub week: u32,
    pub title: String,
    pub rows: Vec<WeekTableRow>,
}

pub struct ExportService;

impl ExportService {
    /// One table per generated week. A slot without assignment shows "-";
    /// the Sunday-lunch slot lands in the midi column of Dimanche.
    pub fn week_tables(menu: &Menu) -> Vec<WeekTable> {
        let weeks = menu.settings.duration_weeks.max(1);
        (0..weeks)
            .map(|week| {
                let rows = (0..7u32)
                    .map(|weekday| {
                        let day = week * 7 + weekday;
                        WeekTableRow {
                            jour: JOURS[weekday as usize].to_string(),
                            midi: Self::slot_label(menu, day, &["midi", "dimanche_midi"]),
                            soir: Self::slot_label(menu, day, &["soir"]),
                        }
                    })
                    .collect();
                WeekTable {
                    week: week + 1,
                    title: if weeks == 1 {
                        "Menu hebdomadaire".to_string()
                    } else {
                        format!("Menu hebdomadaire — semaine {}", week + 1)
                    },
                    rows,
                }
            })
            .collect()
    }

    fn slot_label(menu: &Menu, day: u32, meal_times: &[&str]) -> String {
        menu.meals
            .iter()
            .find(|a| a.day == day && meal_times.contains(&a.meal_time.as_str()))
            .map(|a| a.repas.nom.clone())
            .unwrap_or_else(|| "-".to_string())
    }

    /// Liste de courses en CSV, regroupée par catégorie.
    pub fn shopping_list_csv(menu: &Menu) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["categorie", "nom", "quantite", "unite"])
            .map_err(|e| AppError::Query(e.to_string()))?;

        for (category, entries) in ShoppingListService::grouped(&menu.shopping_list) {
            for entry in entries {
                writer
                    .write_record([
                        category.as_str(),
                        entry.name.as_str(),
                        &entry.quantity.to_string(),
                        entry.unit.as_str(),
                    ])
                    .map_err(|e| AppError::Query(e.to_string()))?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Query(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| AppError::Query(e.to_string()))
    }

    /// Artefact JSON d'un menu, réimportable.
    pub fn menu_json(menu: &Menu) -> Result<(String, String)> {
        let body = serde_json::to_string_pretty(menu).map_err(|e| AppError::Query(e.to_string()))?;
        Ok((format!("menu-{}.json", menu.id), body))
    }

    /// Artefact JSON des préférences.
    pub fn preferences_json(prefs: &Preferences) -> Result<(String, String)> {
        let body =
            serde_json::to_string_pretty(prefs).map_err(|e| AppError::Query(e.to_string()))?;
        Ok(("preferences-repas.json".to_string(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::menu::{MealAssignment, MenuSettings, MenuStats, ShoppingListEntry};
    use crate::models::repas::Repas;
    use chrono::Utc;

    fn repas(id: i32, nom: &str, type_: &str) -> Repas {
        Repas {
            id,
            nom: nom.into(),
            type_: type_.into(),
            saison: "automne".into(),
            moment_journee: None,
            description: None,
            temps_preparation: None,
            temps_cuisson: None,
            temps_repos: None,
            temps_total: None,
            difficulte: None,
            cout: None,
            calories: None,
            ingredients: vec![],
            instructions: vec![],
            notes: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn menu() -> Menu {
        Menu {
            id: "1".into(),
            created_at: Utc::now().to_rfc3339(),
            settings: MenuSettings::default(),
            meals: vec![
                MealAssignment {
                    repas: repas(1, "Quiche", "midi"),
                    day: 0,
                    meal_time: "midi".into(),
                },
                MealAssignment {
                    repas: repas(2, "Soupe", "soir"),
                    day: 0,
                    meal_time: "soir".into(),
                },
                MealAssignment {
                    repas: repas(3, "Rôti", "dimanche_midi"),
                    day: 6,
                    meal_time: "dimanche_midi".into(),
                },
            ],
            shopping_list: vec![
                ShoppingListEntry {
                    name: "farine".into(),
                    quantity: 300.0,
                    unit: "g".into(),
                    category: "épicerie".into(),
                    checked: false,
                },
                ShoppingListEntry {
                    name: "lait".into(),
                    quantity: 1.0,
                    unit: "l".into(),
                    category: "produits_laitiers".into(),
                    checked: false,
                },
            ],
            stats: MenuStats::default(),
            unfilled_slots: vec![],
        }
    }

    #[test]
    fn le_tableau_a_sept_lignes_et_des_tirets_pour_les_trous() {
        let tables = ExportService::week_tables(&menu());
        assert_eq!(tables.len(), 1);
        let rows = &tables[0].rows;
        assert_eq!(rows.len(), 7);

        assert_eq!(rows[0].jour, "Lundi");
        assert_eq!(rows[0].midi, "Quiche");
        assert_eq!(rows[0].soir, "Soupe");
        // Créneau vide
        assert_eq!(rows[1].midi, "-");
        // Le dimanche midi spécial atterrit colonne midi du dimanche
        assert_eq!(rows[6].jour, "Dimanche");
        assert_eq!(rows[6].midi, "Rôti");
    }

    #[test]
    fn le_csv_liste_les_entrees_groupees_par_categorie() {
        let csv = ExportService::shopping_list_csv(&menu()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "categorie,nom,quantite,unite");
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().any(|l| l.starts_with("épicerie,farine,300,g")));
    }

    #[test]
    fn l_artefact_json_porte_le_nom_du_menu() {
        let (name, body) = ExportService::menu_json(&menu()).unwrap();
        assert_eq!(name, "menu-1.json");
        assert!(body.contains("\"Quiche\""));
    }
}
