pub mod state;
pub mod backend;
pub mod models;
pub mod error;
pub mod api;
pub mod auth;
pub mod kpm;
pub mod resolver;
pub mod points;
pub mod server;
// re-export items if you prefer a flat structure:
pub use backend::BackendClient;
pub use error::Result as AppResult;
