//! Account registration, login and profile lookup over a key-value
//! credential store.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod users;

pub use app::build_app;
pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;
