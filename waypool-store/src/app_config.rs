use serde::Deserialize;
use std::env;
use waypool_core::maps::TravelInfo;
use waypool_core::matching::MatcherConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub matching: MatcherConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Memory
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
}

/// Engine tunables, including the fallback travel info substituted when the
/// directions collaborator is unavailable. Fallbacks are explicit
/// configuration, never hidden module state.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_cutoff_hours")]
    pub search_cutoff_hours: i64,
    #[serde(default = "default_commit_attempts")]
    pub commit_retry_attempts: u32,
    #[serde(default = "default_fallback_duration")]
    pub fallback_duration_minutes: u32,
    #[serde(default = "default_fallback_distance")]
    pub fallback_distance_km: f64,
    #[serde(default = "default_fallback_summary")]
    pub fallback_route_summary: String,
}

fn default_cutoff_hours() -> i64 {
    12
}

fn default_commit_attempts() -> u32 {
    3
}

fn default_fallback_duration() -> u32 {
    180
}

fn default_fallback_distance() -> f64 {
    200.0
}

fn default_fallback_summary() -> String {
    "Default Route".to_string()
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            search_cutoff_hours: default_cutoff_hours(),
            commit_retry_attempts: default_commit_attempts(),
            fallback_duration_minutes: default_fallback_duration(),
            fallback_distance_km: default_fallback_distance(),
            fallback_route_summary: default_fallback_summary(),
        }
    }
}

impl BusinessRules {
    pub fn fallback_travel_info(&self) -> TravelInfo {
        TravelInfo::new(
            self.fallback_duration_minutes,
            self.fallback_distance_km,
            "",
            self.fallback_route_summary.clone(),
        )
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of WAYPOOL)
            // Eg.. `WAYPOOL__SERVER__PORT=9000` would set the server port
            .add_source(config::Environment::with_prefix("WAYPOOL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
