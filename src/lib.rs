//! Content-based game recommendations.
//!
//! A catalog snapshot is turned into TF-IDF vectors and a dense cosine
//! similarity matrix once; recommendation requests sum similarity over the
//! games a user owns, rank what they have not played, and persist the ranked
//! list for paging.

pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod features;
pub mod handlers;
pub mod recommend;
pub mod similarity;
pub mod store;
pub mod text;

pub use catalog::{CatalogEntry, CatalogSnapshot};
pub use engine::{Engine, EngineHandle};
pub use errors::{Result, ScoutError};
pub use recommend::{rank_as_of, recommend, recommend_as_of, Ranking, Window};
pub use similarity::SimilarityModel;
pub use store::{MemoryRecommendationStore, RecommendationStore, SqliteRecommendationStore};
