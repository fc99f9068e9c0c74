use figment::providers::Env;
use figment::Figment;
use serde::Deserialize;

/// Process configuration, sourced entirely from environment variables:
/// `PBM_MONGODB_URI` (required), `PORT`, `PBM_LOG_LEVEL`, `PBM_LOG_FORMAT`.
#[derive(Deserialize, Debug)]
pub struct Config {
    /// Connection string of the MongoDB deployment holding the PBM
    /// status collections.
    pub mongodb_uri: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn default_port() -> u16 {
    9090
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

fn figment() -> Figment {
    Figment::new()
        .merge(Env::prefixed("PBM_"))
        .merge(Env::raw().only(&["PORT"]))
}

/// Load config from the environment. A missing `PBM_MONGODB_URI` fails
/// fast here, before any server startup.
pub fn load_config() -> Config {
    match figment().extract::<Config>() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}
