pub mod reflect;
pub mod run;
pub mod tools;

use reagent_config::{AppConfig, ConfigError};

/// Load configuration from a file when given, otherwise from defaults
/// plus environment variables.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(p) => AppConfig::load(p),
        None => AppConfig::from_env(),
    }
}
