//! HTTP endpoints.

use crate::config::ScoutConfig;
use crate::db;
use crate::engine::{regenerate_for_user, Engine, EngineHandle};
use crate::errors::ScoutError;
use crate::store::RecommendationStore;
use actix_web::{error::BlockingError, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;

/// State shared by every worker.
pub struct AppState {
    pub config: ScoutConfig,
    pub engine: EngineHandle,
    pub store: Arc<dyn RecommendationStore>,
}

impl AppState {
    pub fn new(config: ScoutConfig, store: Arc<dyn RecommendationStore>) -> Self {
        Self {
            config,
            engine: EngineHandle::new(),
            store,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub user_id: String,
    #[serde(default)]
    pub owned_ids: HashSet<u64>,
    /// Ids in the response; the configured page size if absent.
    pub count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub user_id: String,
    pub recommendations: Vec<u64>,
    pub total: usize,
    pub unmatched_owned: usize,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse {
    pub user_id: String,
    pub offset: usize,
    pub recommendations: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefitResponse {
    pub catalog_size: usize,
    pub vocabulary_size: usize,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ready: bool,
    pub catalog_size: Option<usize>,
    pub built_at: Option<DateTime<Utc>>,
}

fn pool_error(e: BlockingError) -> ScoutError {
    ScoutError::Worker(e.to_string())
}

/// Load the catalog, fit, and install the result. The previous engine stays
/// live if any step fails.
pub async fn refit(state: web::Data<AppState>) -> Result<Arc<Engine>, ScoutError> {
    let worker_state = state.clone();
    let built = web::block(move || {
        let snapshot = db::open_catalog(&worker_state.config)?;
        Engine::build(snapshot)
    })
    .await
    .map_err(pool_error)?;

    match built {
        Ok(engine) => Ok(state.engine.install(engine)),
        Err(e) => {
            error!("refit failed, keeping previous engine: {}", e);
            Err(e)
        }
    }
}

async fn create_recommendations(
    state: web::Data<AppState>,
    body: web::Json<RecommendRequest>,
) -> Result<HttpResponse, ScoutError> {
    let engine = state.engine.current()?;
    let RecommendRequest {
        user_id,
        owned_ids,
        count,
    } = body.into_inner();
    let page_size = count.unwrap_or(state.config.page_size);
    let list_len = state.config.list_len;

    let store = Arc::clone(&state.store);
    let worker_user = user_id.clone();
    let regenerated = web::block(move || {
        regenerate_for_user(
            &engine,
            store.as_ref(),
            &worker_user,
            &owned_ids,
            list_len,
            page_size,
        )
    })
    .await
    .map_err(pool_error)??;

    Ok(HttpResponse::Ok().json(RecommendResponse {
        user_id,
        recommendations: regenerated.page,
        total: regenerated.total,
        unmatched_owned: regenerated.unmatched_owned,
    }))
}

async fn get_recommendations(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ScoutError> {
    let user_id = path.into_inner();
    let limit = query.limit.unwrap_or(state.config.page_size);
    let offset = query.offset;

    let store = Arc::clone(&state.store);
    let worker_user = user_id.clone();
    let recommendations = web::block(move || store.get(&worker_user, limit, offset))
        .await
        .map_err(pool_error)??;

    Ok(HttpResponse::Ok().json(PageResponse {
        user_id,
        offset,
        recommendations,
    }))
}

async fn refit_engine(state: web::Data<AppState>) -> Result<HttpResponse, ScoutError> {
    let engine = refit(state).await?;
    Ok(HttpResponse::Ok().json(RefitResponse {
        catalog_size: engine.snapshot().len(),
        vocabulary_size: engine.model().vocabulary_size(),
        built_at: engine.built_at(),
    }))
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let engine = state.engine.current().ok();
    HttpResponse::Ok().json(HealthResponse {
        status: (if engine.is_some() { "ok" } else { "warming_up" }).to_string(),
        ready: engine.is_some(),
        catalog_size: engine.as_ref().map(|e| e.snapshot().len()),
        built_at: engine.as_ref().map(|e| e.built_at()),
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/recommendations", web::post().to(create_recommendations))
        .route("/recommendations/{user_id}", web::get().to(get_recommendations))
        .route("/admin/refit", web::post().to(refit_engine))
        .route("/health", web::get().to(health));
}
