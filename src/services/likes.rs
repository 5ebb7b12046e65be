use serde::Serialize;
use super::json_store::commit_pair;
use super::{RecipeRepository, UserRepository};
use crate::errors::{AppError, AppResult};
use crate::models::Recipe;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub liked: bool,
    pub liked_posts: Vec<String>,
    pub recipe: Recipe,
}

// What the caller wants the like state to become
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeChange {
    Toggle,
    Like,
    Unlike,
}

/// Flips the like of `username` on `recipe_id`.
pub async fn toggle_like(
    users: &UserRepository,
    recipes: &RecipeRepository,
    username: &str,
    recipe_id: &str,
) -> AppResult<LikeOutcome> {
    change_like(users, recipes, username, recipe_id, LikeChange::Toggle).await
}

/// Updates `likedPosts` and the recipe counter in one two-file commit.
/// Liking twice, or unliking something not liked, changes nothing.
pub async fn change_like(
    users: &UserRepository,
    recipes: &RecipeRepository,
    username: &str,
    recipe_id: &str,
    change: LikeChange,
) -> AppResult<LikeOutcome> {
    // Lock order: users, then recipes
    let mut user_tx = users.store().begin().await;
    let mut recipe_tx = recipes.store().begin().await;

    let user_index = user_tx
        .items()
        .iter()
        .position(|u| u.username == username)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;
    let user = &user_tx.items()[user_index];

    let not_found = || AppError::NotFound(format!("Recipe {} not found", recipe_id));
    let recipe_index = recipe_tx
        .items()
        .iter()
        .position(|r| r.id == recipe_id)
        .ok_or_else(not_found)?;

    let was_liked = user.has_liked(recipe_id);
    let liked = match change {
        LikeChange::Toggle => !was_liked,
        LikeChange::Like => true,
        LikeChange::Unlike => false,
    };

    // Unliking stays possible after a recipe is unpublished
    if liked && !was_liked && !recipe_tx.items()[recipe_index].is_visible_to(Some(user)) {
        return Err(not_found());
    }

    if liked == was_liked {
        tracing::debug!("{} like on {} already {}", username, recipe_id, liked);
        return Ok(LikeOutcome {
            liked,
            liked_posts: user.liked_posts.clone(),
            recipe: recipe_tx.items()[recipe_index].clone(),
        });
    }

    let user = &mut user_tx.items_mut()[user_index];
    let recipe = &mut recipe_tx.items_mut()[recipe_index];
    if liked {
        user.liked_posts.push(recipe_id.to_string());
        recipe.likes = recipe.likes.saturating_add(1);
    } else {
        user.liked_posts.retain(|id| id != recipe_id);
        recipe.likes = recipe.likes.saturating_sub(1);
    }

    let outcome = LikeOutcome {
        liked,
        liked_posts: user.liked_posts.clone(),
        recipe: recipe.clone(),
    };

    commit_pair(user_tx, recipe_tx).await?;
    tracing::info!(
        "{} {} recipe {} (now {} likes)",
        username,
        if liked { "liked" } else { "unliked" },
        recipe_id,
        outcome.recipe.likes
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, RecipeForm};
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    async fn setup(dir: &TempDir) -> (UserRepository, RecipeRepository, String) {
        let users = UserRepository::open(dir.path().join("users.json")).await.unwrap();
        let recipes = RecipeRepository::open(dir.path().join("recipes.json")).await.unwrap();
        users.create("alice", "hash".into(), BTreeSet::new()).await.unwrap();
        users.create("bob", "hash".into(), BTreeSet::new()).await.unwrap();

        let form = RecipeForm {
            name: "Soup".into(),
            ingredients: vec![Ingredient {
                quantity: "1".into(),
                name: "onion".into(),
                kind: "veg".into(),
            }],
            steps: vec!["Chop".into()],
            ..RecipeForm::default()
        };
        let soup = recipes.create("alice", form).await.unwrap();
        recipes.set_published(&soup.id, true).await.unwrap();
        (users, recipes, soup.id)
    }

    #[tokio::test]
    async fn test_toggle_twice_round_trips() {
        let dir = TempDir::new().unwrap();
        let (users, recipes, id) = setup(&dir).await;

        let first = toggle_like(&users, &recipes, "bob", &id).await.unwrap();
        assert!(first.liked);
        assert_eq!(first.recipe.likes, 1);
        assert_eq!(first.liked_posts, vec![id.clone()]);

        let second = toggle_like(&users, &recipes, "bob", &id).await.unwrap();
        assert!(!second.liked);
        assert_eq!(second.recipe.likes, 0);
        assert!(second.liked_posts.is_empty());

        // Both files agree after a reload
        let users = UserRepository::open(dir.path().join("users.json")).await.unwrap();
        let recipes = RecipeRepository::open(dir.path().join("recipes.json")).await.unwrap();
        assert!(users.get("bob").await.unwrap().liked_posts.is_empty());
        assert_eq!(recipes.find_by_id(&id).await.unwrap().likes, 0);
    }

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (users, recipes, id) = setup(&dir).await;

        change_like(&users, &recipes, "bob", &id, LikeChange::Like).await.unwrap();
        let again = change_like(&users, &recipes, "bob", &id, LikeChange::Like).await.unwrap();
        assert_eq!(again.recipe.likes, 1);
        assert_eq!(again.liked_posts.len(), 1);

        let unliked = change_like(&users, &recipes, "alice", &id, LikeChange::Unlike).await.unwrap();
        assert!(!unliked.liked);
        assert_eq!(unliked.recipe.likes, 1);
    }

    #[tokio::test]
    async fn test_unlike_after_unpublish() {
        let dir = TempDir::new().unwrap();
        let (users, recipes, id) = setup(&dir).await;
        change_like(&users, &recipes, "bob", &id, LikeChange::Like).await.unwrap();
        recipes.set_published(&id, false).await.unwrap();

        // Hidden recipes cannot gain likes
        assert!(matches!(
            change_like(&users, &recipes, "bob", &id, LikeChange::Like).await,
            Ok(ref outcome) if outcome.recipe.likes == 1
        ));
        users.create("carol", "hash".into(), BTreeSet::new()).await.unwrap();
        assert!(matches!(
            toggle_like(&users, &recipes, "carol", &id).await,
            Err(AppError::NotFound(_))
        ));

        let unliked = change_like(&users, &recipes, "bob", &id, LikeChange::Unlike).await.unwrap();
        assert!(!unliked.liked);
        assert_eq!(unliked.recipe.likes, 0);
        assert!(unliked.liked_posts.is_empty());
        assert!(users.get("bob").await.unwrap().liked_posts.is_empty());
        assert_eq!(recipes.find_by_id(&id).await.unwrap().likes, 0);
    }

    #[tokio::test]
    async fn test_unknown_user_or_recipe() {
        let dir = TempDir::new().unwrap();
        let (users, recipes, id) = setup(&dir).await;

        assert!(matches!(
            toggle_like(&users, &recipes, "ghost", &id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            toggle_like(&users, &recipes, "bob", "missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_clears_liked_posts() {
        let dir = TempDir::new().unwrap();
        let (users, recipes, id) = setup(&dir).await;
        toggle_like(&users, &recipes, "bob", &id).await.unwrap();

        let alice = users.get("alice").await.unwrap();
        let bob = users.get("bob").await.unwrap();
        assert!(matches!(
            recipes.delete(&users, &id, &bob).await,
            Err(AppError::Forbidden(_))
        ));

        recipes.delete(&users, &id, &alice).await.unwrap();
        assert!(recipes.find_by_id(&id).await.is_none());
        assert!(users.get("bob").await.unwrap().liked_posts.is_empty());
    }
}
