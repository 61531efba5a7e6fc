use config::{Config, ConfigError, Environment, File};
use field_core::DiscoveryConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocaleConfig {
    /// Language resolved for translatable writes when the caller passes none.
    pub default_lang_id: i32,
    /// Shop scope used when the caller passes none.
    pub default_shop_id: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
    pub locale: LocaleConfig,
    pub discovery: DiscoveryConfig,
}

impl EngineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("locale.default_lang_id", 1)?
            .set_default("locale.default_shop_id", 1)?
            .set_default("discovery.theme_dir", "./theme/field_types")?
            .set_default("discovery.uploads_dir", "./uploads/field_types")?
            .set_default("discovery.enable_wasi", true)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., KOHLRABI__DATABASE__URL)
            .add_source(Environment::with_prefix("KOHLRABI").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
