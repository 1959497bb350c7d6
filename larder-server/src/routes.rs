//! Recipe API handlers and router.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use larder_core::{
    validate_new_recipe, validate_recipe_update, NewRecipe, Recipe, RecipePage, RecipeUpdate,
    SearchRequest,
};
use larder_store::RecipeStore;

use crate::error::{ApiError, ApiResult, FieldError};

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<dyn RecipeStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self { store }
    }
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct DeleteResponse {
    message: String,
}

fn rejected(message: String, fallback_field: &str) -> ApiError {
    ApiError::Validation(vec![FieldError::from_rejection(message, fallback_field)])
}

/// Build the full router: `/health` at the root, recipe routes under `api_prefix`.
pub fn build_router(state: SharedState, api_prefix: &str) -> Router {
    let api = Router::new()
        .route("/recipe", get(search_recipes).post(create_recipe))
        .route("/recipe/search", post(search_recipes_body))
        .route(
            "/recipe/:recipe_id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        );

    let router = Router::new().route("/health", get(health_check));
    let router = if api_prefix.is_empty() {
        router.merge(api)
    } else {
        router.nest(api_prefix, api)
    };

    router
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

// POST /recipe
async fn create_recipe(
    State(state): State<SharedState>,
    payload: Result<Json<NewRecipe>, JsonRejection>,
) -> ApiResult<Json<Recipe>> {
    let Json(new) = payload.map_err(|e| rejected(e.body_text(), "body"))?;
    validate_new_recipe(&new)?;

    let recipe = state.store.insert(new).await?;
    info!("Created recipe {}", recipe.recipe_id);
    Ok(Json(recipe))
}

// GET /recipe/:recipe_id
async fn get_recipe(
    State(state): State<SharedState>,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<Recipe>> {
    state
        .store
        .fetch(&recipe_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// PUT /recipe/:recipe_id
async fn update_recipe(
    State(state): State<SharedState>,
    Path(recipe_id): Path<String>,
    payload: Result<Json<RecipeUpdate>, JsonRejection>,
) -> ApiResult<Json<Recipe>> {
    let Json(update) = payload.map_err(|e| rejected(e.body_text(), "body"))?;
    validate_recipe_update(&update)?;

    let recipe = state
        .store
        .mutate(&recipe_id, update)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!("Updated recipe {}", recipe.recipe_id);
    Ok(Json(recipe))
}

// DELETE /recipe/:recipe_id
async fn delete_recipe(
    State(state): State<SharedState>,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.store.remove(&recipe_id).await? {
        return Err(ApiError::NotFound);
    }
    info!("Deleted recipe {}", recipe_id);
    Ok(Json(DeleteResponse {
        message: "Recipe deleted successfully".to_string(),
    }))
}

// GET /recipe?page=&page_size=&search=&sort_by=&sort_order=
async fn search_recipes(
    State(state): State<SharedState>,
    params: Result<Query<SearchRequest>, QueryRejection>,
) -> ApiResult<Json<RecipePage>> {
    let Query(request) = params.map_err(|e| rejected(e.body_text(), "query"))?;
    run_search(&state, request).await
}

// POST /recipe/search
async fn search_recipes_body(
    State(state): State<SharedState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<RecipePage>> {
    let Json(request) = payload.map_err(|e| rejected(e.body_text(), "body"))?;
    run_search(&state, request).await
}

async fn run_search(state: &AppState, request: SearchRequest) -> ApiResult<Json<RecipePage>> {
    let query = request.into_query()?;
    let page = state.store.query(&query).await?;
    Ok(Json(page))
}
