pub mod json_store;
pub mod likes;
pub mod password;
mod recipe_repository;
mod user_repository;

pub use json_store::JsonStore;
pub use likes::{change_like, toggle_like, LikeChange, LikeOutcome};
pub use recipe_repository::{sort_recipes, RecipeRepository};
pub use user_repository::UserRepository;
