//! Larder Core - recipe model, validation and search
//!
//! This crate holds everything about recipe records that does not touch
//! I/O: the record and request shapes, input validation, and the search
//! query builder shared by every storage backend.

pub mod query;
pub mod schema;
pub mod validation;

pub use query::{QueryError, SearchQuery, SearchRequest, SortField, SortOrder, MAX_PAGE_SIZE};
pub use schema::{NewRecipe, Recipe, RecipePage, RecipeUpdate};
pub use validation::{validate_new_recipe, validate_recipe_update, ValidationError};
