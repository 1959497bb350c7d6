//! Input validation for create and update requests

use crate::schema::{NewRecipe, RecipeUpdate};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("{0} cannot be null")]
    NullField(&'static str),
}

impl ValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyField(field) | ValidationError::NullField(field) => field,
        }
    }
}

/// Validate a create request: required fields must be non-empty.
pub fn validate_new_recipe(recipe: &NewRecipe) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("name", &recipe.name),
        ("ingredients", &recipe.ingredients),
        ("instructions", &recipe.instructions),
    ] {
        if value.is_empty() {
            errors.push(ValidationError::EmptyField(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate an update request.
///
/// Required fields may be omitted but, when present, must be non-null and
/// non-empty. Optional fields accept anything, including `null` and `""`.
pub fn validate_recipe_update(update: &RecipeUpdate) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("name", &update.name),
        ("ingredients", &update.ingredients),
        ("instructions", &update.instructions),
    ] {
        match value {
            None => {}
            Some(None) => errors.push(ValidationError::NullField(field)),
            Some(Some(v)) if v.is_empty() => {
                errors.push(ValidationError::EmptyField(field))
            }
            Some(Some(_)) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
