use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use tower_sessions::Session;
use crate::errors::{AppError, AppResult};
use crate::middleware::{current_user, optional_user, require_admin};
use crate::models::{
    CommentForm, PublishForm, Recipe, RecipeForm, RecipeQuery, RecipeScope, TranslationForm,
};
use crate::services::{change_like, LikeChange, LikeOutcome};
use crate::state::AppState;

#[derive(Serialize)]
pub struct RecipeListItem {
    #[serde(flatten)]
    recipe: Recipe,
    // Only filled for the admin review listing
    #[serde(rename = "missingFields", skip_serializing_if = "Option::is_none")]
    missing_fields: Option<Vec<&'static str>>,
}

pub async fn list_recipes(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RecipeQuery>,
) -> AppResult<Json<Vec<RecipeListItem>>> {
    let viewer = optional_user(&session, &state.users).await?;
    let recipes = state.recipes.list(&query, viewer.as_ref()).await?;

    tracing::debug!("Listing {} recipes for scope {:?}", recipes.len(), query.scope);

    let with_missing = query.scope == RecipeScope::Pending;
    let items = recipes
        .into_iter()
        .map(|recipe| RecipeListItem {
            missing_fields: with_missing.then(|| recipe.missing_fields()),
            recipe,
        })
        .collect();
    Ok(Json(items))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<Recipe>> {
    let viewer = optional_user(&session, &state.users).await?;
    let recipe = state.recipes.get_visible(&id, viewer.as_ref()).await?;
    Ok(Json(recipe))
}

pub async fn get_recipe_by_name(
    State(state): State<AppState>,
    session: Session,
    Path(name): Path<String>,
) -> AppResult<Json<Recipe>> {
    let viewer = optional_user(&session, &state.users).await?;
    state
        .recipes
        .find_by_name(&name, viewer.as_ref())
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Recipe named {} not found", name)))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RecipeForm>,
) -> AppResult<(StatusCode, Json<Recipe>)> {
    let chef = current_user(&session, &state.users).await?;
    if !(chef.is_chef() || chef.is_admin()) {
        return Err(AppError::Forbidden("Chef role required to submit recipes".into()));
    }

    let recipe = state.recipes.create(&chef.username, form).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(form): Json<RecipeForm>,
) -> AppResult<Json<Recipe>> {
    let editor = current_user(&session, &state.users).await?;
    let recipe = state.recipes.replace(&id, &editor, form).await?;
    Ok(Json(recipe))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let editor = current_user(&session, &state.users).await?;
    state.recipes.delete(&state.users, &id, &editor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_published(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(form): Json<PublishForm>,
) -> AppResult<Json<Recipe>> {
    let admin = current_user(&session, &state.users).await?;
    require_admin(&admin)?;

    let recipe = state.recipes.set_published(&id, form.published).await?;
    Ok(Json(recipe))
}

pub async fn translate_recipe(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(form): Json<TranslationForm>,
) -> AppResult<Json<Recipe>> {
    let translator = current_user(&session, &state.users).await?;
    if !(translator.is_translator() || translator.is_admin()) {
        return Err(AppError::Forbidden("Traducteur role required to translate".into()));
    }

    let recipe = state.recipes.translate(&id, form).await?;
    tracing::info!("Recipe {} translated by {}", id, translator.username);
    Ok(Json(recipe))
}

pub async fn add_comment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(form): Json<CommentForm>,
) -> AppResult<Json<Recipe>> {
    let user = current_user(&session, &state.users).await?;
    let recipe = state.recipes.add_comment(&id, &user, &form.text).await?;
    Ok(Json(recipe))
}

pub async fn like_recipe(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<LikeOutcome>> {
    update_like(state, session, id, LikeChange::Like).await
}

pub async fn unlike_recipe(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<LikeOutcome>> {
    update_like(state, session, id, LikeChange::Unlike).await
}

async fn update_like(
    state: AppState,
    session: Session,
    id: String,
    change: LikeChange,
) -> AppResult<Json<LikeOutcome>> {
    let user = current_user(&session, &state.users).await?;
    let outcome = change_like(&state.users, &state.recipes, &user.username, &id, change).await?;
    Ok(Json(outcome))
}
