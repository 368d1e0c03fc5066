pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader, API_URL_ENV};
pub use schema::SketchseekConfig;
