use serde::Deserialize;
use std::collections::BTreeSet;
use super::recipe::{Dietary, Ingredient, Language};
use super::user::Role;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub requested_roles: BTreeSet<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserForm {
    pub username: String,
    pub password: Option<String>,
    pub requested_roles: Option<BTreeSet<Role>>,
}

#[derive(Debug, Deserialize)]
pub struct PromoteForm {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeForm {
    pub recipe_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct PublishForm {
    pub published: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    #[serde(default)]
    pub pending: bool,
}

/// Content of a recipe as submitted by a chef. Identity, author, likes,
/// comments and publication state are never taken from the client.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecipeForm {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "nameFR", default)]
    pub name_fr: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(rename = "ingredientsFR", default)]
    pub ingredients_fr: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(rename = "stepsFR", default)]
    pub steps_fr: Vec<String>,
    #[serde(default)]
    pub timers: Vec<u32>,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default)]
    pub dietary: Dietary,
}

impl RecipeForm {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() && self.name_fr.trim().is_empty() {
            return Err(AppError::Validation("Recipe name is required".into()));
        }
        if self
            .ingredients
            .iter()
            .chain(self.ingredients_fr.iter())
            .any(|i| i.name.trim().is_empty())
        {
            return Err(AppError::Validation("Ingredient names must not be empty".into()));
        }
        if !self.timers.is_empty() && self.timers.len() != self.steps.len() {
            return Err(AppError::Validation(format!(
                "Expected {} timers, one per step, got {}",
                self.steps.len(),
                self.timers.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct TranslationForm {
    pub language: Language,
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecipeScope {
    #[default]
    Published,
    Mine,
    Pending,
    Untranslated,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RecipeSort {
    Newest,
    Oldest,
    NameAsc,
    NameDesc,
}

/// Query string of `GET /api/recipes`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RecipeQuery {
    #[serde(default)]
    pub scope: RecipeScope,
    pub search: Option<String>,
    // Comma separated: gluten-free, vegan, translated
    pub filter: Option<String>,
    pub name: Option<String>,
    pub sort: Option<RecipeSort>,
    #[serde(default)]
    pub lang: Language,
}

impl RecipeQuery {
    pub fn filters(&self) -> impl Iterator<Item = &str> {
        self.filter
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RecipeForm {
        RecipeForm {
            name: "Soup".into(),
            ingredients: vec![Ingredient {
                quantity: "1".into(),
                name: "onion".into(),
                kind: "veg".into(),
            }],
            steps: vec!["Chop".into(), "Boil".into()],
            ..RecipeForm::default()
        }
    }

    #[test]
    fn test_validate_accepts_minimal_recipe() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_a_name() {
        let mut recipe = form();
        recipe.name = "   ".into();
        assert!(matches!(recipe.validate(), Err(AppError::Validation(_))));

        recipe.name_fr = "Soupe".into();
        assert!(recipe.validate().is_ok());
    }

    #[test]
    fn test_validate_timer_count() {
        let mut recipe = form();
        recipe.timers = vec![5];
        let err = recipe.validate().unwrap_err();
        assert!(err.to_string().contains("one per step"));

        recipe.timers = vec![5, 10];
        assert!(recipe.validate().is_ok());
    }

    #[test]
    fn test_client_identity_fields_are_ignored() {
        let json = r#"{
            "name": "Soup",
            "author": "mallory",
            "published": true,
            "likes": 99,
            "ingredients": [{"quantity": "1", "name": "onion", "type": "veg"}],
            "steps": ["Chop"]
        }"#;
        let recipe: RecipeForm = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.name, "Soup");
        assert_eq!(recipe.ingredients[0].kind, "veg");
        assert!(recipe.id.is_none());
    }

    #[test]
    fn test_query_filters() {
        let query = RecipeQuery {
            filter: Some("vegan, translated,,".into()),
            ..RecipeQuery::default()
        };
        assert_eq!(query.filters().collect::<Vec<_>>(), vec!["vegan", "translated"]);
        assert_eq!(query.scope, RecipeScope::Published);
    }
}
