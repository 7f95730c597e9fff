use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::repas::{RepasInput, SAISONS};
use crate::services::repas::RepasService;

/// Une ligne du fichier d'import en vrac:
/// `saison,type,nom,description,dimanche_midi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedRepas {
    pub saison: String,
    pub type_: String,
    pub nom: String,
    pub description: Option<String>,
    pub dimanche_midi: bool,
}

impl ImportedRepas {
    /// `dimanche_midi = oui` bascule le repas sur le créneau spécial.
    pub fn effective_type(&self) -> &str {
        if self.dimanche_midi {
            "dimanche_midi"
        } else {
            &self.type_
        }
    }

    pub fn into_input(self) -> RepasInput {
        RepasInput {
            nom: self.nom.clone(),
            type_: self.effective_type().to_string(),
            moment_journee: Some(self.type_.clone()),
            saison: self.saison,
            description: self.description,
            temps_preparation: None,
            temps_cuisson: None,
            temps_repos: None,
            temps_total: None,
            difficulte: None,
            cout: None,
            calories: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            notes: None,
            image_url: None,
        }
    }
}

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub corrected: usize,
    pub skipped: usize,
}

pub struct ImportService;

impl ImportService {
    fn field(record: &csv::StringRecord, index: usize) -> String {
        record.get(index).unwrap_or("").trim().to_string()
    }

    fn valid_type(type_: &str) -> bool {
        type_ == "midi" || type_ == "soir"
    }

    fn valid_saison(saison: &str) -> bool {
        SAISONS.contains(&saison)
    }

    /// Reads a positional record, re-mapping the known swapped shape
    /// (nom/description in the leading columns) before giving up.
    /// Returns the row plus whether a correction was applied.
    pub fn parse_record(record: &csv::StringRecord) -> Result<(ImportedRepas, bool)> {
        let saison = Self::field(record, 0).to_lowercase();
        let type_ = Self::field(record, 1).to_lowercase();
        let nom = Self::field(record, 2);
        let description = Self::field(record, 3);
        let dimanche_midi = Self::field(record, 4) == "oui";

        if !nom.is_empty() && Self::valid_type(&type_) && Self::valid_saison(&saison) {
            return Ok((
                ImportedRepas {
                    saison,
                    type_,
                    nom,
                    description: (!description.is_empty()).then_some(description),
                    dimanche_midi,
                },
                false,
            ));
        }

        // Forme inversée connue: nom,description,type,saison,dimanche_midi
        let nom = Self::field(record, 0);
        let description = Self::field(record, 1);
        let type_ = Self::field(record, 2).to_lowercase();
        let saison = Self::field(record, 3).to_lowercase();
        if !nom.is_empty() && Self::valid_type(&type_) && Self::valid_saison(&saison) {
            return Ok((
                ImportedRepas {
                    saison,
                    type_,
                    nom,
                    description: (!description.is_empty()).then_some(description),
                    dimanche_midi,
                },
                true,
            ));
        }

        Err(AppError::Parse(format!(
            "ligne incomplète et non corrigeable: {:?}",
            record
        )))
    }

    /// Imports every row of the reader; malformed rows are skipped with a
    /// warning, never aborting the run.
    pub async fn import<R: std::io::Read>(pool: &PgPool, reader: R) -> Result<ImportSummary> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut summary = ImportSummary::default();
        for record in csv_reader.records() {
            let record = record.map_err(|e| AppError::Parse(e.to_string()))?;
            match Self::parse_record(&record) {
                Ok((row, corrected)) => {
                    if corrected {
                        tracing::info!("Ligne corrigée et importée: {}", row.nom);
                        summary.corrected += 1;
                    }
                    RepasService::create(pool, &row.into_input()).await?;
                    summary.inserted += 1;
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    summary.skipped += 1;
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn une_ligne_bien_formee_passe_telle_quelle() {
        let (row, corrected) = ImportService::parse_record(&record(&[
            "hiver",
            "soir",
            "Soupe à l'oignon",
            "Gratinée au four",
            "non",
        ]))
        .unwrap();

        assert!(!corrected);
        assert_eq!(row.saison, "hiver");
        assert_eq!(row.type_, "soir");
        assert_eq!(row.nom, "Soupe à l'oignon");
        assert_eq!(row.description.as_deref(), Some("Gratinée au four"));
        assert_eq!(row.effective_type(), "soir");
    }

    #[test]
    fn oui_bascule_sur_le_creneau_dimanche_midi() {
        let (row, _) = ImportService::parse_record(&record(&[
            "automne",
            "midi",
            "Poule au pot",
            "",
            "oui",
        ]))
        .unwrap();

        assert!(row.dimanche_midi);
        assert_eq!(row.effective_type(), "dimanche_midi");
        let input = row.into_input();
        assert_eq!(input.type_, "dimanche_midi");
        assert_eq!(input.moment_journee.as_deref(), Some("midi"));
    }

    #[test]
    fn la_forme_inversee_est_remappee() {
        let (row, corrected) = ImportService::parse_record(&record(&[
            "Blanquette de veau",
            "Plat mijoté",
            "midi",
            "hiver",
            "non",
        ]))
        .unwrap();

        assert!(corrected);
        assert_eq!(row.nom, "Blanquette de veau");
        assert_eq!(row.description.as_deref(), Some("Plat mijoté"));
        assert_eq!(row.type_, "midi");
        assert_eq!(row.saison, "hiver");
    }

    #[test]
    fn une_ligne_irrecuperable_est_refusee() {
        let result = ImportService::parse_record(&record(&["", "", "", "", ""]));
        assert!(matches!(result, Err(AppError::Parse(_))));

        let result = ImportService::parse_record(&record(&["xx", "yy", "zz", "", "non"]));
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn la_casse_et_les_espaces_sont_normalises() {
        let (row, _) = ImportService::parse_record(&record(&[
            "  HIVER ",
            " Midi",
            "  Raclette ",
            "",
            "",
        ]))
        .unwrap();

        assert_eq!(row.saison, "hiver");
        assert_eq!(row.type_, "midi");
        assert_eq!(row.nom, "Raclette");
        assert_eq!(row.description, None);
    }
}
