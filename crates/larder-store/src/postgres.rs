//! PostgreSQL recipe store.
//!
//! Each operation borrows one pooled connection for its statement (or short
//! transaction) and hands it back on every exit path.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use larder_core::query::{RECIPE_COLUMNS, RECIPE_TABLE};
use larder_core::{NewRecipe, Recipe, RecipePage, RecipeUpdate, SearchQuery};

use crate::{RecipeStore, StoreError};

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS recipes (
        recipe_id    TEXT PRIMARY KEY,
        name         TEXT NOT NULL,
        ingredients  TEXT NOT NULL,
        instructions TEXT NOT NULL,
        prep_time    TEXT,
        cook_time    TEXT,
        servings     TEXT,
        image_url    TEXT,
        created_at   TIMESTAMPTZ NOT NULL,
        updated_at   TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS recipes_name_idx ON recipes (name)",
    "CREATE INDEX IF NOT EXISTS recipes_created_at_idx ON recipes (created_at)",
];

/// Recipe store backed by a PostgreSQL `recipes` table.
#[derive(Clone)]
pub struct PgRecipeStore {
    pool: PgPool,
}

fn recipe_from_row(row: &PgRow) -> Result<Recipe, sqlx::Error> {
    Ok(Recipe {
        recipe_id: row.try_get("recipe_id")?,
        name: row.try_get("name")?,
        ingredients: row.try_get("ingredients")?,
        instructions: row.try_get("instructions")?,
        prep_time: row.try_get("prep_time")?,
        cook_time: row.try_get("cook_time")?,
        servings: row.try_get("servings")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl PgRecipeStore {
    /// Connect a pool of at most `max_connections` to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
        info!("Connected to database");
        Ok(Self { pool })
    }

    /// Create the recipes table and its indexes if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Recipe schema ready");
        Ok(())
    }
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe, StoreError> {
        let recipe = Recipe::new(recipe);
        sqlx::query(&format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            RECIPE_TABLE, RECIPE_COLUMNS
        ))
        .bind(&recipe.recipe_id)
        .bind(&recipe.name)
        .bind(&recipe.ingredients)
        .bind(&recipe.instructions)
        .bind(&recipe.prep_time)
        .bind(&recipe.cook_time)
        .bind(&recipe.servings)
        .bind(&recipe.image_url)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(recipe)
    }

    async fn fetch(&self, recipe_id: &str) -> Result<Option<Recipe>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE recipe_id = $1",
            RECIPE_COLUMNS, RECIPE_TABLE
        ))
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(recipe_from_row).transpose()?)
    }

    async fn mutate(
        &self,
        recipe_id: &str,
        update: RecipeUpdate,
    ) -> Result<Option<Recipe>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE recipe_id = $1 FOR UPDATE",
            RECIPE_COLUMNS, RECIPE_TABLE
        ))
        .bind(recipe_id)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping `tx` without commit rolls back and releases the row lock.
        let Some(row) = row else {
            return Ok(None);
        };
        let mut recipe = recipe_from_row(&row)?;
        recipe.apply(update);

        sqlx::query(&format!(
            "UPDATE {} SET name = $2, ingredients = $3, instructions = $4, prep_time = $5, \
             cook_time = $6, servings = $7, image_url = $8, updated_at = $9 \
             WHERE recipe_id = $1",
            RECIPE_TABLE
        ))
        .bind(&recipe.recipe_id)
        .bind(&recipe.name)
        .bind(&recipe.ingredients)
        .bind(&recipe.instructions)
        .bind(&recipe.prep_time)
        .bind(&recipe.cook_time)
        .bind(&recipe.servings)
        .bind(&recipe.image_url)
        .bind(recipe.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(recipe))
    }

    async fn remove(&self, recipe_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE recipe_id = $1", RECIPE_TABLE))
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, query: &SearchQuery) -> Result<RecipePage, StoreError> {
        let pattern = query.search_pattern();
        let count_sql = query.count_sql();
        let page_sql = query.page_sql();
        debug!("Search count query: {}", count_sql);
        debug!("Search page query: {}", page_sql);

        // Count and page read the same snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut count = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(pattern) = &pattern {
            count = count.bind(pattern);
        }
        let (total,) = count.fetch_one(&mut *tx).await?;

        let mut page = sqlx::query(&page_sql);
        if let Some(pattern) = &pattern {
            page = page.bind(pattern);
        }
        let rows = page
            .bind(query.limit() as i64)
            .bind(query.offset() as i64)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let recipes = rows
            .iter()
            .map(recipe_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RecipePage {
            total: total.max(0) as u64,
            page: query.page,
            page_size: query.page_size,
            recipes,
        })
    }
}

/// These tests need a live PostgreSQL reachable through `DATABASE_URL`.
/// Run them with `cargo test -p larder-store -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::SearchRequest;

    async fn store() -> PgRecipeStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PgRecipeStore::connect(&url, 2).await.unwrap();
        store.init_schema().await.unwrap();
        store
    }

    fn new_recipe(name: &str, ingredients: &str) -> NewRecipe {
        NewRecipe {
            name: name.to_string(),
            ingredients: ingredients.to_string(),
            instructions: "Step 1: Do something".to_string(),
            prep_time: Some("10".to_string()),
            cook_time: None,
            servings: None,
            image_url: None,
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_crud_roundtrip() {
        let store = store().await;
        let created = store.insert(new_recipe("Pg Roundtrip", "eggs")).await.unwrap();

        let fetched = store.fetch(&created.recipe_id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let update = RecipeUpdate {
            cook_time: Some(Some("15".to_string())),
            prep_time: Some(None),
            ..Default::default()
        };
        let updated = store
            .mutate(&created.recipe_id, update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.cook_time.as_deref(), Some("15"));
        assert_eq!(updated.prep_time, None);
        assert_eq!(updated.name, created.name);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(store.fetch(&created.recipe_id).await.unwrap(), Some(updated));

        assert!(store.remove(&created.recipe_id).await.unwrap());
        assert!(store.fetch(&created.recipe_id).await.unwrap().is_none());
        assert!(!store.remove(&created.recipe_id).await.unwrap());
    }

    #[tokio::test]
    #[ignore]
    async fn test_search_matches_literal_wildcards() {
        let store = store().await;
        let marker = unique_marker();
        let hit = store
            .insert(new_recipe(&format!("{} 100% rye", marker), "flour"))
            .await
            .unwrap();
        let miss = store
            .insert(new_recipe(&format!("{} 1000 rye", marker), "flour"))
            .await
            .unwrap();

        let query = SearchRequest {
            search: Some(format!("{} 100%", marker)),
            sort_by: Some("name".to_string()),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        let page = store.query(&query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.recipes[0].recipe_id, hit.recipe_id);

        store.remove(&hit.recipe_id).await.unwrap();
        store.remove(&miss.recipe_id).await.unwrap();
    }

    fn unique_marker() -> String {
        Recipe::new(new_recipe("m", "m")).recipe_id
    }
}
