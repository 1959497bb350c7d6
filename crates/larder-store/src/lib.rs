//! Larder Store - recipe storage backends
//!
//! This crate provides the [`RecipeStore`] trait and two implementations:
//! - PostgreSQL (via sqlx)
//! - In-memory (no persistence, used when no database is configured)

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryRecipeStore;
pub use postgres::PgRecipeStore;

use async_trait::async_trait;
use larder_core::{NewRecipe, Recipe, RecipePage, RecipeUpdate, SearchQuery};

/// Durable storage and lookup of recipe records.
///
/// Every call is a single atomic interaction with the backend; nothing is
/// held across calls.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Store a new record with a generated id and timestamps.
    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe, StoreError>;

    /// Look up a record; `None` if no record has this id.
    async fn fetch(&self, recipe_id: &str) -> Result<Option<Recipe>, StoreError>;

    /// Apply a partial update and refresh `updated_at`; `None` if not found.
    async fn mutate(
        &self,
        recipe_id: &str,
        update: RecipeUpdate,
    ) -> Result<Option<Recipe>, StoreError>;

    /// Hard-delete a record; `false` if not found.
    async fn remove(&self, recipe_id: &str) -> Result<bool, StoreError>;

    /// Run a search, returning one page plus the total match count.
    async fn query(&self, query: &SearchQuery) -> Result<RecipePage, StoreError>;
}
