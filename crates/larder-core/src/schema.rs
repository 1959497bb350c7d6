//! Recipe record and the request/response shapes built around it

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A stored recipe record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Server-generated identifier, immutable.
    pub recipe_id: String,
    pub name: String,
    pub ingredients: String,
    pub instructions: String,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub servings: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a create request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: String,
    pub instructions: String,
    #[serde(default)]
    pub prep_time: Option<String>,
    #[serde(default)]
    pub cook_time: Option<String>,
    #[serde(default)]
    pub servings: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body of an update request.
///
/// Every field carries a presence marker: `None` means the field was omitted
/// and stays untouched, `Some(None)` means an explicit `null`, `Some(Some(v))`
/// replaces the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeUpdate {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub ingredients: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub instructions: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub prep_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub cook_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub servings: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<String>>,
}

/// Only called for keys that appear in the payload, so wrapping in `Some`
/// marks the field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePage {
    /// Number of records matching the filter, across all pages.
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub recipes: Vec<Recipe>,
}

/// Current time at the precision the database keeps (microseconds).
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Next `updated_at` for a record last touched at `previous`.
///
/// Always strictly later than `previous`, even when the clock has not moved
/// past it at microsecond precision.
pub fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_micros();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

impl Recipe {
    /// Build a fresh record with a generated id and matching timestamps.
    pub fn new(new: NewRecipe) -> Self {
        let now = now_micros();
        Self {
            recipe_id: Uuid::new_v4().to_string(),
            name: new.name,
            ingredients: new.ingredients,
            instructions: new.instructions,
            prep_time: new.prep_time,
            cook_time: new.cook_time,
            servings: new.servings,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the fields present in `update` and refresh `updated_at`.
    ///
    /// An explicit `null` on a required field is ignored here; callers reject
    /// it through [`crate::validate_recipe_update`] first.
    pub fn apply(&mut self, update: RecipeUpdate) {
        if let Some(Some(name)) = update.name {
            self.name = name;
        }
        if let Some(Some(ingredients)) = update.ingredients {
            self.ingredients = ingredients;
        }
        if let Some(Some(instructions)) = update.instructions {
            self.instructions = instructions;
        }
        if let Some(prep_time) = update.prep_time {
            self.prep_time = prep_time;
        }
        if let Some(cook_time) = update.cook_time {
            self.cook_time = cook_time;
        }
        if let Some(servings) = update.servings {
            self.servings = servings;
        }
        if let Some(image_url) = update.image_url {
            self.image_url = image_url;
        }
        self.updated_at = next_updated_at(self.updated_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewRecipe {
        NewRecipe {
            name: "Test Recipe".to_string(),
            ingredients: "ingredient 1, ingredient 2".to_string(),
            instructions: "Step 1: Do something".to_string(),
            prep_time: Some("10".to_string()),
            cook_time: Some("20".to_string()),
            servings: Some("4".to_string()),
            image_url: Some("http://example.com/image.jpg".to_string()),
        }
    }

    #[test]
    fn test_new_recipe_generates_id_and_timestamps() {
        let recipe = Recipe::new(sample());
        assert!(!recipe.recipe_id.is_empty());
        assert!(Uuid::parse_str(&recipe.recipe_id).is_ok());
        assert_eq!(recipe.created_at, recipe.updated_at);
        assert_eq!(recipe.name, "Test Recipe");
        assert_eq!(recipe.servings.as_deref(), Some("4"));
    }

    #[test]
    fn test_new_recipe_ids_are_unique() {
        let a = Recipe::new(sample());
        let b = Recipe::new(sample());
        assert_ne!(a.recipe_id, b.recipe_id);
    }

    #[test]
    fn test_new_recipe_optional_fields_default_to_none() {
        let json = r#"{"name":"Toast","ingredients":"bread","instructions":"toast it"}"#;
        let new: NewRecipe = serde_json::from_str(json).unwrap();
        assert!(new.prep_time.is_none());
        assert!(new.image_url.is_none());
    }

    #[test]
    fn test_new_recipe_missing_required_field_fails() {
        let json = r#"{"name":"Toast","ingredients":"bread"}"#;
        let err = serde_json::from_str::<NewRecipe>(json).unwrap_err();
        assert!(err.to_string().contains("instructions"));
    }

    #[test]
    fn test_update_distinguishes_omitted_null_and_value() {
        let json = r#"{"name":"Renamed","prep_time":null,"servings":""}"#;
        let update: RecipeUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.name, Some(Some("Renamed".to_string())));
        assert_eq!(update.prep_time, Some(None));
        assert_eq!(update.servings, Some(Some(String::new())));
        assert_eq!(update.ingredients, None);
        assert_eq!(update.cook_time, None);
    }

    #[test]
    fn test_apply_changes_only_present_fields() {
        let mut recipe = Recipe::new(sample());
        let before = recipe.clone();

        let update: RecipeUpdate =
            serde_json::from_str(r#"{"name":"Updated Recipe Name","prep_time":null}"#).unwrap();
        recipe.apply(update);

        assert_eq!(recipe.name, "Updated Recipe Name");
        assert_eq!(recipe.prep_time, None);
        assert_eq!(recipe.ingredients, before.ingredients);
        assert_eq!(recipe.instructions, before.instructions);
        assert_eq!(recipe.cook_time, before.cook_time);
        assert_eq!(recipe.servings, before.servings);
        assert_eq!(recipe.image_url, before.image_url);
        assert_eq!(recipe.recipe_id, before.recipe_id);
        assert_eq!(recipe.created_at, before.created_at);
        assert!(recipe.updated_at > before.updated_at);
    }

    #[test]
    fn test_apply_explicit_empty_string_is_stored() {
        let mut recipe = Recipe::new(sample());
        let update: RecipeUpdate = serde_json::from_str(r#"{"image_url":""}"#).unwrap();
        recipe.apply(update);
        assert_eq!(recipe.image_url.as_deref(), Some(""));
    }

    #[test]
    fn test_next_updated_at_is_strictly_later() {
        let future = now_micros() + Duration::seconds(60);
        assert_eq!(next_updated_at(future), future + Duration::microseconds(1));

        let past = now_micros() - Duration::seconds(60);
        assert!(next_updated_at(past) > past);
    }

    #[test]
    fn test_recipe_serializes_nulls_and_rfc3339() {
        let recipe = Recipe::new(NewRecipe {
            prep_time: None,
            ..sample()
        });
        let value = serde_json::to_value(&recipe).unwrap();
        assert!(value["prep_time"].is_null());
        let created = value["created_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created).is_ok());
    }
}
