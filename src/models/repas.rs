use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Vocabulaire fermé des créneaux de repas.
pub const TYPES_REPAS: &[&str] = &["midi", "soir", "dimanche_midi"];

/// Vocabulaire fermé des saisons.
pub const SAISONS: &[&str] = &["printemps", "ete", "automne", "hiver", "toute_saison"];

/// Un repas du catalogue. Les tableaux ne sont jamais NULL une fois chargés :
/// la colonne porte un défaut `{}` et le décodage produit un Vec vide.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Repas {
    pub id: i32,
    pub nom: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub type_: String,
    pub saison: String,
    pub moment_journee: Option<String>,
    pub description: Option<String>,
    pub temps_preparation: Option<i32>,
    pub temps_cuisson: Option<i32>,
    pub temps_repos: Option<i32>,
    pub temps_total: Option<i32>,
    pub difficulte: Option<String>,
    pub cout: Option<String>,
    pub calories: Option<i32>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for POST /repas and PUT /repas/{id}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepasInput {
    pub nom: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub saison: String,
    #[serde(default)]
    pub moment_journee: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub temps_preparation: Option<i32>,
    #[serde(default)]
    pub temps_cuisson: Option<i32>,
    #[serde(default)]
    pub temps_repos: Option<i32>,
    #[serde(default)]
    pub temps_total: Option<i32>,
    #[serde(default)]
    pub difficulte: Option<String>,
    #[serde(default)]
    pub cout: Option<String>,
    #[serde(default)]
    pub calories: Option<i32>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl RepasInput {
    /// Rejects a write before it reaches storage when the required fields are
    /// missing or outside the closed vocabularies.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.nom.trim().is_empty() {
            return Err(AppError::Validation("le champ 'nom' est requis".into()));
        }
        if !TYPES_REPAS.contains(&self.type_.as_str()) {
            return Err(AppError::Validation(format!(
                "type de repas inconnu: '{}'",
                self.type_
            )));
        }
        if !SAISONS.contains(&self.saison.as_str()) {
            return Err(AppError::Validation(format!(
                "saison inconnue: '{}'",
                self.saison
            )));
        }
        if let Some(moment) = &self.moment_journee {
            if moment != "midi" && moment != "soir" {
                return Err(AppError::Validation(format!(
                    "moment de la journée inconnu: '{}'",
                    moment
                )));
            }
        }
        Ok(())
    }
}

/// Query params for GET /repas.
#[derive(Debug, Default, Deserialize)]
pub struct RepasQuery {
    pub saison: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    /// Shorthand: `dimanche_midi=true` selects the Sunday-lunch slot.
    pub dimanche_midi: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RepasInput {
        RepasInput {
            nom: "Poulet rôti".into(),
            type_: "midi".into(),
            saison: "automne".into(),
            moment_journee: None,
            description: None,
            temps_preparation: Some(20),
            temps_cuisson: Some(60),
            temps_repos: None,
            temps_total: Some(80),
            difficulte: Some("facile".into()),
            cout: Some("€€".into()),
            calories: Some(450),
            ingredients: vec!["1 poulet".into()],
            instructions: vec!["Enfourner.".into()],
            notes: None,
            image_url: None,
        }
    }

    #[test]
    fn accepte_un_repas_complet() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn rejette_un_nom_vide() {
        let mut bad = input();
        bad.nom = "  ".into();
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejette_un_type_hors_vocabulaire() {
        let mut bad = input();
        bad.type_ = "brunch".into();
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejette_un_moment_journee_invalide() {
        let mut bad = input();
        bad.moment_journee = Some("nuit".into());
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn les_tableaux_absents_deviennent_vides_jamais_nuls() {
        let parsed: RepasInput = serde_json::from_str(
            r#"{ "nom": "Omelette", "type": "soir", "saison": "toute_saison" }"#,
        )
        .unwrap();

        assert!(parsed.ingredients.is_empty());
        assert!(parsed.instructions.is_empty());
        assert!(parsed.validate().is_ok());
    }
}
