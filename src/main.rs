use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use dotenv::dotenv;
use game_scout::config::ScoutConfig;
use game_scout::handlers::{self, AppState};
use game_scout::{db, Engine, SqliteRecommendationStore};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        return Cors::permissive();
    }
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ScoutConfig::from_env();
    info!(?config, "starting game-scout");

    let store = SqliteRecommendationStore::open(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    let state = web::Data::new(AppState::new(config.clone(), Arc::new(store)));

    // Requests are only served once the first model is in place
    let snapshot = db::open_catalog(&config).context("loading catalog snapshot")?;
    let engine = Engine::build(snapshot).context("fitting similarity model")?;
    state.engine.install(engine);

    if let Some(period) = config.refit_period() {
        let refit_state = state.clone();
        actix_web::rt::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if let Err(e) = handlers::refit(refit_state.clone()).await {
                    error!("Error refitting model: {}", e);
                }
            }
        });
    }

    let origins = config.cors_origins.clone();
    info!("listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&origins))
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(config.bind_addr())?
    .run()
    .await?;

    Ok(())
}
