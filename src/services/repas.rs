use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::repas::{Repas, RepasInput, RepasQuery};

pub struct RepasService;

impl RepasService {
    /// Fetch the catalogue, optionally narrowed by saison/type, ordered by nom.
    pub async fn list(pool: &PgPool, query: &RepasQuery) -> Result<Vec<Repas>> {
        let mut qb = sqlx::QueryBuilder::new("SELECT * FROM repas WHERE 1=1");
        if let Some(saison) = &query.saison {
            qb.push(" AND saison = ").push_bind(saison);
        }
        if let Some(type_) = &query.type_ {
            qb.push(" AND type = ").push_bind(type_);
        }
        match query.dimanche_midi {
            Some(true) => {
                qb.push(" AND type = 'dimanche_midi'");
            }
            Some(false) => {
                qb.push(" AND type <> 'dimanche_midi'");
            }
            None => {}
        }
        qb.push(" ORDER BY nom");

        let repas = qb.build_query_as::<Repas>().fetch_all(pool).await?;
        Ok(repas)
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Repas> {
        sqlx::query_as::<_, Repas>("SELECT * FROM repas WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("repas {id}")))
    }

    pub async fn create(pool: &PgPool, input: &RepasInput) -> Result<Repas> {
        input.validate()?;
        let repas = sqlx::query_as::<_, Repas>(
            "INSERT INTO repas (
                 nom, type, saison, moment_journee, description,
                 temps_preparation, temps_cuisson, temps_repos, temps_total,
                 difficulte, cout, calories, ingredients, instructions,
                 notes, image_url
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *",
        )
        .bind(&input.nom)
        .bind(&input.type_)
        .bind(&input.saison)
        .bind(&input.moment_journee)
        .bind(&input.description)
        .bind(input.temps_preparation)
        .bind(input.temps_cuisson)
        .bind(input.temps_repos)
        .bind(input.temps_total)
        .bind(&input.difficulte)
        .bind(&input.cout)
        .bind(input.calories)
        .bind(&input.ingredients)
        .bind(&input.instructions)
        .bind(&input.notes)
        .bind(&input.image_url)
        .fetch_one(pool)
        .await?;
        Ok(repas)
    }

    pub async fn update(pool: &PgPool, id: i32, input: &RepasInput) -> Result<Repas> {
        input.validate()?;
        sqlx::query_as::<_, Repas>(
            "UPDATE repas SET
                 nom = $1, type = $2, saison = $3, moment_journee = $4,
                 description = $5, temps_preparation = $6, temps_cuisson = $7,
                 temps_repos = $8, temps_total = $9, difficulte = $10,
                 cout = $11, calories = $12, ingredients = $13,
                 instructions = $14, notes = $15, image_url = $16,
                 updated_at = NOW()
             WHERE id = $17
             RETURNING *",
        )
        .bind(&input.nom)
        .bind(&input.type_)
        .bind(&input.saison)
        .bind(&input.moment_journee)
        .bind(&input.description)
        .bind(input.temps_preparation)
        .bind(input.temps_cuisson)
        .bind(input.temps_repos)
        .bind(input.temps_total)
        .bind(&input.difficulte)
        .bind(&input.cout)
        .bind(input.calories)
        .bind(&input.ingredients)
        .bind(&input.instructions)
        .bind(&input.notes)
        .bind(&input.image_url)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("repas {id}")))
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<i32> {
        let deleted: Option<i32> = sqlx::query_scalar("DELETE FROM repas WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        deleted.ok_or_else(|| AppError::NotFound(format!("repas {id}")))
    }
}
