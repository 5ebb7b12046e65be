use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use crate::errors::{AppError, AppResult, StoreResult};
use crate::models::{
    Comment, Language, Recipe, RecipeForm, RecipeQuery, RecipeScope, RecipeSort,
    TranslationForm, User,
};
use super::json_store::{commit_pair, JsonStore};
use super::user_repository::UserRepository;

const MAX_COMMENT_LEN: usize = 2000;

#[derive(Clone)]
pub struct RecipeRepository {
    store: Arc<JsonStore<Recipe>>,
}

impl RecipeRepository {
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Ok(Self {
            store: Arc::new(JsonStore::open(path).await?),
        })
    }

    pub(crate) fn store(&self) -> &JsonStore<Recipe> {
        &self.store
    }

    pub async fn find_by_id(&self, id: &str) -> Option<Recipe> {
        self.store
            .read(|recipes| recipes.iter().find(|r| r.id == id).cloned())
            .await
    }

    /// Case-insensitive lookup on the English or French name, skipping
    /// recipes the viewer may not see.
    pub async fn find_by_name(&self, name: &str, viewer: Option<&User>) -> Option<Recipe> {
        self.store
            .read(|recipes| {
                recipes
                    .iter()
                    .find(|r| r.has_name(name) && r.is_visible_to(viewer))
                    .cloned()
            })
            .await
    }

    /// Looks up a recipe the viewer is allowed to see. Hidden recipes
    /// are reported as missing.
    pub async fn get_visible(&self, id: &str, viewer: Option<&User>) -> AppResult<Recipe> {
        self.find_by_id(id)
            .await
            .filter(|r| r.is_visible_to(viewer))
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, author: &str, form: RecipeForm) -> AppResult<Recipe> {
        form.validate()?;

        let recipe = Recipe {
            id: uuid::Uuid::new_v4().to_string(),
            name: form.name.trim().to_string(),
            name_fr: form.name_fr.trim().to_string(),
            author: author.to_string(),
            ingredients: form.ingredients,
            ingredients_fr: form.ingredients_fr,
            steps: form.steps,
            steps_fr: form.steps_fr,
            timers: form.timers,
            image_url: form.image_url.trim().to_string(),
            dietary: form.dietary,
            published: false,
            likes: 0,
            comments: Vec::new(),
            created_at: Utc::now(),
        };

        let saved = recipe.clone();
        self.store
            .mutate(move |recipes| {
                recipes.push(saved);
                Ok::<_, AppError>(())
            })
            .await?;

        tracing::info!("Created recipe {} ({}) by {}", recipe.id, recipe.name, author);
        Ok(recipe)
    }

    /// Replaces the content of a recipe. Identity, author, publication
    /// state, likes and comments are kept.
    pub async fn replace(&self, id: &str, editor: &User, form: RecipeForm) -> AppResult<Recipe> {
        if form.id.as_deref().is_some_and(|body_id| body_id != id) {
            return Err(AppError::Validation("Recipe id in URL and body must match".into()));
        }
        form.validate()?;

        let recipe = self
            .store
            .mutate(|recipes| {
                let recipe = find_mut(recipes, id)?;
                if !recipe.is_editable_by(editor) {
                    return Err(AppError::Forbidden(format!(
                        "{} may not edit recipe {}",
                        editor.username, id
                    )));
                }
                recipe.name = form.name.trim().to_string();
                recipe.name_fr = form.name_fr.trim().to_string();
                recipe.ingredients = form.ingredients;
                recipe.ingredients_fr = form.ingredients_fr;
                recipe.steps = form.steps;
                recipe.steps_fr = form.steps_fr;
                recipe.timers = form.timers;
                recipe.image_url = form.image_url.trim().to_string();
                recipe.dietary = form.dietary;
                Ok(recipe.clone())
            })
            .await?;

        tracing::info!("Recipe {} updated by {}", id, editor.username);
        Ok(recipe)
    }

    pub async fn set_published(&self, id: &str, published: bool) -> AppResult<Recipe> {
        let recipe = self
            .store
            .mutate(|recipes| {
                let recipe = find_mut(recipes, id)?;
                recipe.published = published;
                Ok::<_, AppError>(recipe.clone())
            })
            .await?;

        tracing::info!("Recipe {} published={}", id, published);
        Ok(recipe)
    }

    /// Stores the translated side of a recipe.
    pub async fn translate(&self, id: &str, form: TranslationForm) -> AppResult<Recipe> {
        if form.name.trim().is_empty() {
            return Err(AppError::Validation("Translated name is required".into()));
        }
        if form.ingredients.iter().any(|i| i.name.trim().is_empty()) {
            return Err(AppError::Validation("Ingredient names must not be empty".into()));
        }

        self.store
            .mutate(|recipes| {
                let recipe = find_mut(recipes, id)?;
                let name = form.name.trim().to_string();
                match form.language {
                    Language::Fr => {
                        recipe.name_fr = name;
                        recipe.ingredients_fr = form.ingredients;
                        recipe.steps_fr = form.steps;
                    }
                    Language::En => {
                        if !recipe.timers.is_empty() && recipe.timers.len() != form.steps.len() {
                            return Err(AppError::Validation(format!(
                                "Expected {} steps to match the recipe timers, got {}",
                                recipe.timers.len(),
                                form.steps.len()
                            )));
                        }
                        recipe.name = name;
                        recipe.ingredients = form.ingredients;
                        recipe.steps = form.steps;
                    }
                }
                Ok(recipe.clone())
            })
            .await
    }

    /// Appends a comment from `viewer` to a recipe they can see.
    pub async fn add_comment(&self, id: &str, viewer: &User, text: &str) -> AppResult<Recipe> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Comment is required".into()));
        }
        if text.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::Validation(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_LEN
            )));
        }

        let comment = Comment {
            name: viewer.username.clone(),
            text: text.to_string(),
        };

        self.store
            .mutate(|recipes| {
                let recipe = find_mut(recipes, id)?;
                if !recipe.is_visible_to(Some(viewer)) {
                    return Err(not_found(id));
                }
                recipe.comments.push(comment);
                Ok(recipe.clone())
            })
            .await
    }

    /// Removes a recipe and every reference to it in `likedPosts`.
    pub async fn delete(&self, users: &UserRepository, id: &str, editor: &User) -> AppResult<()> {
        // Lock order: users, then recipes
        let mut user_tx = users.store().begin().await;
        let mut recipe_tx = self.store.begin().await;

        let index = recipe_tx
            .items()
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;
        if !recipe_tx.items()[index].is_editable_by(editor) {
            return Err(AppError::Forbidden(format!(
                "{} may not delete recipe {}",
                editor.username, id
            )));
        }
        recipe_tx.items_mut().remove(index);

        for user in user_tx.items_mut().iter_mut() {
            user.liked_posts.retain(|liked| liked != id);
        }

        commit_pair(user_tx, recipe_tx).await?;
        tracing::info!("Recipe {} deleted by {}", id, editor.username);
        Ok(())
    }

    /// Runs a listing query. `viewer` is the session user, if any.
    pub async fn list(&self, query: &RecipeQuery, viewer: Option<&User>) -> AppResult<Vec<Recipe>> {
        match query.scope {
            RecipeScope::Published => {}
            RecipeScope::Mine => {
                viewer.ok_or_else(|| AppError::Auth("Not authenticated".into()))?;
            }
            RecipeScope::Pending => {
                require(viewer, User::is_admin, "Only admins can review pending recipes")?;
            }
            RecipeScope::Untranslated => {
                require(
                    viewer,
                    |u| u.is_translator() || u.is_admin(),
                    "Only translators can list recipes to translate",
                )?;
            }
        }

        let in_scope = |r: &Recipe| match query.scope {
            RecipeScope::Published => r.published,
            RecipeScope::Mine => viewer.is_some_and(|u| r.is_authored_by(&u.username)),
            RecipeScope::Pending => !r.published,
            RecipeScope::Untranslated => r.needs_translation(),
        };

        let mut flags = Vec::new();
        for filter in query.filters() {
            let flag: fn(&Recipe) -> bool = match filter {
                "gluten-free" => |r: &Recipe| r.dietary.gluten_free,
                "vegan" => |r: &Recipe| r.dietary.vegan,
                "translated" => |r: &Recipe| r.is_translated(),
                other => {
                    return Err(AppError::Validation(format!("Unknown filter {}", other)));
                }
            };
            flags.push(flag);
        }

        let mut selected: Vec<Recipe> = self
            .store
            .read(|recipes| {
                recipes
                    .iter()
                    .filter(|&r| in_scope(r))
                    .filter(|&r| query.search.as_deref().map_or(true, |s| r.matches_search(s)))
                    .filter(|&r| query.name.as_deref().map_or(true, |n| r.has_name(n)))
                    .filter(|&r| flags.iter().all(|flag| flag(r)))
                    .cloned()
                    .collect()
            })
            .await;

        if let Some(sort) = query.sort {
            sort_recipes(&mut selected, sort, query.lang);
        }
        Ok(selected)
    }
}

pub fn sort_recipes(recipes: &mut [Recipe], sort: RecipeSort, lang: Language) {
    match sort {
        RecipeSort::Newest => recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        RecipeSort::Oldest => recipes.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        RecipeSort::NameAsc => recipes.sort_by_cached_key(|r| r.display_name(lang).to_lowercase()),
        RecipeSort::NameDesc => {
            recipes.sort_by_cached_key(|r| r.display_name(lang).to_lowercase());
            recipes.reverse();
        }
    }
}

fn require(viewer: Option<&User>, allowed: impl Fn(&User) -> bool, message: &str) -> AppResult<()> {
    match viewer {
        None => Err(AppError::Auth("Not authenticated".into())),
        Some(user) if allowed(user) => Ok(()),
        Some(_) => Err(AppError::Forbidden(message.to_string())),
    }
}

fn find_mut<'a>(recipes: &'a mut [Recipe], id: &str) -> AppResult<&'a mut Recipe> {
    recipes
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| not_found(id))
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Recipe {} not found", id))
}
