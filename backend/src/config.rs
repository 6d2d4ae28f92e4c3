use dotenvy::dotenv;
use std::env;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub db_host:          String,
    pub db_port:          u16,
    pub db_name:          String,
    pub db_user:          String,
    pub db_password:      String,

    // Backend
    pub backend_host:     String,
    pub backend_port:     u16,

    // Identity provider
    pub auth_url:         String,
    pub auth_api_key:     String,

    // Session cookies
    pub cookie_secure:    bool,

    // Route guard: pass protected requests through when the profile lookup
    // itself errors (the page re-checks the profile on its own).
    pub guard_fail_open:  bool,

    // App
    pub app_env:          String,
    pub app_base_url:     String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        fn require(key: &str) -> Result<String, ConfigError> {
            env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
        }

        fn parse_port(key: &str) -> Result<u16, ConfigError> {
            let raw = require(key)?;
            raw.parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue(key.to_string(), raw))
        }

        fn parse_flag(key: &str, default: bool) -> Result<bool, ConfigError> {
            match env::var(key) {
                Err(_) => Ok(default),
                Ok(raw) => match raw.to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "on"  => Ok(true),
                    "0" | "false" | "no" | "off" => Ok(false),
                    _ => Err(ConfigError::InvalidValue(key.to_string(), raw)),
                },
            }
        }

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let is_dev  = is_development_env(&app_env);

        Ok(Self {
            db_host:      require("DB_HOST").unwrap_or_else(|_| "db".into()),
            db_port:      parse_port("DB_PORT").unwrap_or(3306),
            db_name:      require("DB_NAME")?,
            db_user:      require("DB_USER")?,
            db_password:  require("DB_PASSWORD")?,

            backend_host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            backend_port: parse_port("BACKEND_PORT").unwrap_or(8080),

            auth_url:     require("AUTH_URL")?.trim_end_matches('/').to_string(),
            auth_api_key: require("AUTH_API_KEY")?,

            cookie_secure:   parse_flag("COOKIE_SECURE", !is_dev)?,
            guard_fail_open: parse_flag("GUARD_FAIL_OPEN", true)?,

            app_env,
            app_base_url: env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost".into()),
        })
    }

    pub fn is_development(&self) -> bool {
        is_development_env(&self.app_env)
    }
}

fn is_development_env(app_env: &str) -> bool {
    app_env.eq_ignore_ascii_case("development")
}
