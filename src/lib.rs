pub mod error;
#[cfg(feature = "embed-frontend")]
pub mod frontend;
pub mod models;
pub mod openapi;
pub mod quiz;
pub mod repo;
pub mod routes;
pub mod seed;
pub mod settings;

#[cfg(not(any(feature = "inmem-store", feature = "postgres-store")))]
compile_error!("enable at least one of the `inmem-store` / `postgres-store` features");

// Re-export commonly used items for tests / external users
pub use routes::{config, AppState};
pub use settings::Settings;
