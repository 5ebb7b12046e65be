mod auth;
mod users;
mod recipes;

pub use auth::{handle_login, handle_logout, current_session};
pub use users::{
    handle_register, list_users, get_user, update_user, promote_user, deny_role_request,
    liked_posts, toggle_user_like,
};
pub use recipes::{
    list_recipes, get_recipe, get_recipe_by_name, create_recipe, update_recipe, delete_recipe,
    set_published, translate_recipe, add_comment, like_recipe, unlike_recipe,
};
