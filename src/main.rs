use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repas_api::config::Config;
use repas_api::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let state = AppState::build(pool, config.clone())?;

    if state.notifications.is_configured() {
        info!("Notification webhook configured");
    } else {
        info!("Notification webhook not configured — reminders will be logged only");
    }

    // Rappels persistés: les échéances passées partent tout de suite, celles
    // des prochaines 24 h reçoivent un timer.
    state.reminders.check_stored();

    // Chargement des repas en arrière-plan; le snapshot persisté couvre
    // l'intervalle si la base est injoignable.
    {
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = state.meals.fetch(&state.db, false).await {
                tracing::warn!("Chargement initial des repas impossible: {}", e);
            }
        });
    }

    // CORS: the configured base URL, plus localhost for development.
    let cors_origin = {
        let base = config.app_base_url.clone();
        AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let o = match origin.to_str() {
                Ok(s) => s,
                Err(_) => return false,
            };
            o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") || o == base
        })
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        // Catalogue
        .route("/repas", get(routes::repas::list_repas).post(routes::repas::create_repas))
        .route("/repas/{id}", get(routes::repas::get_repas).put(routes::repas::update_repas).delete(routes::repas::delete_repas))
        // Collection en mémoire
        .route("/meals", get(routes::meals::get_meals))
        .route("/meals/refresh", post(routes::meals::refresh_meals))
        .route("/meals/filtered", get(routes::meals::filtered_meals))
        .route("/meals/random", get(routes::meals::random_meal))
        // Menus générés
        .route("/menus/generate", post(routes::menus::generate_menu))
        .route("/menus", get(routes::menus::list_menus))
        .route("/menus/current", get(routes::menus::current_menu).delete(routes::menus::clear_current_menu))
        .route("/menus/{id}", get(routes::menus::get_menu).delete(routes::menus::delete_menu))
        .route("/menus/{id}/load", post(routes::menus::load_menu))
        .route("/menus/{id}/export", get(routes::menus::export_menu))
        .route("/menus/{id}/shopping-list.csv", get(routes::menus::shopping_list_csv))
        .route("/menus/{id}/week-table", get(routes::menus::week_table))
        .route("/menus/{id}/shopping-list/toggle", post(routes::menus::toggle_shopping_item))
        // Préférences
        .route("/preferences", get(routes::preferences::get_preferences).put(routes::preferences::update_preferences))
        .route("/preferences/reset", post(routes::preferences::reset_preferences))
        .route("/preferences/export", get(routes::preferences::export_preferences))
        .route("/preferences/import", post(routes::preferences::import_preferences))
        .route("/preferences/lists/{list}", post(routes::preferences::add_list_item))
        .route("/preferences/lists/{list}/{value}", delete(routes::preferences::remove_list_item))
        // Rappels
        .route("/reminders", get(routes::reminders::list_reminders).post(routes::reminders::create_reminder))
        .route("/reminders/meal-preparation", post(routes::reminders::create_meal_preparation_reminder))
        .route("/reminders/weekly", post(routes::reminders::create_weekly_reminders))
        .route("/reminders/{id}", delete(routes::reminders::cancel_reminder))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("repas API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
