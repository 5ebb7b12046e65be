mod user;
mod recipe;
mod forms;

pub use user::{PublicUser, Role, User};
pub use recipe::{Comment, Dietary, Ingredient, Language, Recipe};
pub use forms::{
    CommentForm, LikeForm, LoginForm, PromoteForm, PublishForm, RecipeForm, RecipeQuery,
    RecipeScope, RecipeSort, RegisterForm, TranslationForm, UpdateUserForm, UserListQuery,
};
