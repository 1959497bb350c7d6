//! In-memory recipe store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use larder_core::{NewRecipe, Recipe, RecipePage, RecipeUpdate, SearchQuery};

use crate::{RecipeStore, StoreError};

/// Recipe store backed by a map in process memory. Contents are lost on exit.
#[derive(Default)]
pub struct MemoryRecipeStore {
    recipes: RwLock<BTreeMap<String, Recipe>>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe, StoreError> {
        let recipe = Recipe::new(recipe);
        self.recipes
            .write()
            .await
            .insert(recipe.recipe_id.clone(), recipe.clone());
        Ok(recipe)
    }

    async fn fetch(&self, recipe_id: &str) -> Result<Option<Recipe>, StoreError> {
        Ok(self.recipes.read().await.get(recipe_id).cloned())
    }

    async fn mutate(
        &self,
        recipe_id: &str,
        update: RecipeUpdate,
    ) -> Result<Option<Recipe>, StoreError> {
        let mut recipes = self.recipes.write().await;
        Ok(recipes.get_mut(recipe_id).map(|recipe| {
            recipe.apply(update);
            recipe.clone()
        }))
    }

    async fn remove(&self, recipe_id: &str) -> Result<bool, StoreError> {
        Ok(self.recipes.write().await.remove(recipe_id).is_some())
    }

    async fn query(&self, query: &SearchQuery) -> Result<RecipePage, StoreError> {
        let recipes = self.recipes.read().await;
        Ok(query.evaluate(recipes.values()))
    }
}
