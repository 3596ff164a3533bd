pub mod app_config;
pub mod catalog;
pub mod config;
pub mod products;

pub use app_config::{AppConfig, Environment};
pub use catalog::{CatalogStore, StoreError, StoredProduct};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use products::{CanonicalProduct, Gender, ProductError};
