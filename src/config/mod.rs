pub mod loader;
pub mod schema;

pub use loader::{default_path, load, load_from_path, ConfigError};
pub use schema::{AcmeSettings, Settings, TempSettings, ValidationError, ValidationIssue};
