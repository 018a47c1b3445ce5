/*
 * Responsibility
 * - 環境変数の読み込み (PORT, project id, emulator hosts, credentials など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Which document store backs `/joinTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND")),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,

    pub project_id: String,
    pub region: String,
    pub store_backend: StoreBackend,

    // Emulators (host:port). When set, the matching client talks to the emulator.
    pub firestore_emulator_host: Option<String>,
    pub auth_emulator_host: Option<String>,

    // Store credentials
    pub static_access_token: Option<String>,
    pub credentials_file: Option<PathBuf>,

    pub id_token_leeway_seconds: u64,
    pub public_keys_fallback_ttl_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (env in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = parse_or("PORT", non_empty("PORT"), 8080)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(&non_empty("APP_ENV").unwrap_or_default());

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout = Duration::from_secs(parse_or(
            "REQUEST_TIMEOUT_SECONDS",
            non_empty("REQUEST_TIMEOUT_SECONDS"),
            60,
        )?);

        let project_id = non_empty("GOOGLE_CLOUD_PROJECT")
            .or_else(|| non_empty("GCLOUD_PROJECT"))
            .or_else(|| non_empty("FIREBASE_PROJECT_ID"))
            .ok_or(ConfigError::Missing("GOOGLE_CLOUD_PROJECT"))?;

        let region = non_empty("FUNCTION_REGION").unwrap_or_else(|| "europe-west2".to_string());

        let store_backend = match non_empty("STORE_BACKEND") {
            Some(v) => v.parse()?,
            None => StoreBackend::Firestore,
        };

        let firestore_emulator_host = non_empty("FIRESTORE_EMULATOR_HOST");
        let auth_emulator_host = non_empty("FIREBASE_AUTH_EMULATOR_HOST");

        let static_access_token = non_empty("GOOGLE_OAUTH_ACCESS_TOKEN");
        let credentials_file = non_empty("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from);

        let id_token_leeway_seconds = parse_or(
            "ID_TOKEN_LEEWAY_SECONDS",
            non_empty("ID_TOKEN_LEEWAY_SECONDS"),
            0,
        )?;
        let public_keys_fallback_ttl_seconds = parse_or(
            "PUBLIC_KEYS_FALLBACK_TTL_SECONDS",
            non_empty("PUBLIC_KEYS_FALLBACK_TTL_SECONDS"),
            3600, // 1 hour
        )?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout,
            project_id,
            region,
            store_backend,
            firestore_emulator_host,
            auth_emulator_host,
            static_access_token,
            credentials_file,
            id_token_leeway_seconds,
            public_keys_fallback_ttl_seconds,
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
