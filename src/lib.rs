pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use app::build_router;
pub use config::Config;
pub use state::AppState;
