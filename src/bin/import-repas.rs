/// Bulk-import des repas depuis un fichier CSV
/// (en-tête: saison,type,nom,description,dimanche_midi)
///
/// Usage: import-repas --file chemin/vers/repas.csv [--clean]
///   --clean : vide la table repas avant l'import

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use repas_api::services::import::ImportService;

#[derive(Parser)]
#[command(name = "import-repas", about = "Importe un fichier CSV de repas dans la base")]
struct Args {
    /// Chemin du fichier CSV à importer
    #[arg(long)]
    file: std::path::PathBuf,

    /// Vider la table repas avant l'import
    #[arg(long)]
    clean: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    if args.clean {
        tracing::info!("Nettoyage de la table repas...");
        sqlx::query("DELETE FROM repas").execute(&pool).await?;
    }

    let file = std::fs::File::open(&args.file)?;
    tracing::info!("Import de {}...", args.file.display());

    let summary = ImportService::import(&pool, file).await?;
    tracing::info!(
        "{} repas insérés ({} lignes corrigées, {} ignorées)",
        summary.inserted,
        summary.corrected,
        summary.skipped
    );

    Ok(())
}
