use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_UPLOAD_MAX_BYTES: usize = 20 * 1024 * 1024;

/// Default batch chunk size, measured in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 8000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration shared by the HTTP service and the batch CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key sent to the model provider.
    pub anthropic_api_key: String,
    /// Root URL of the model provider (no trailing path).
    pub anthropic_base_url: String,
    /// Model identifier used for every question.
    pub anthropic_model: String,
    /// Upper bound on generated tokens per answer.
    pub anthropic_max_tokens: u32,
    /// Local port the HTTP service listens on.
    pub server_port: u16,
    /// Directory served for unmatched paths.
    pub public_dir: PathBuf,
    /// Scratch directory for uploaded files awaiting extraction.
    pub upload_dir: PathBuf,
    /// Request body limit applied to uploads.
    pub upload_max_bytes: usize,
    /// Batch chunk size in characters.
    pub chunk_size: usize,
    /// Number of chunk queries the batch flow keeps in flight.
    pub batch_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            anthropic_api_key: load_env("ANTHROPIC_API_KEY")?,
            anthropic_base_url: load_env_optional("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            anthropic_model: load_env_optional("ANTHROPIC_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            anthropic_max_tokens: parse_optional("ANTHROPIC_MAX_TOKENS")?
                .unwrap_or(DEFAULT_MAX_TOKENS),
            server_port: parse_optional("SERVER_PORT")?.unwrap_or(DEFAULT_SERVER_PORT),
            public_dir: load_env_optional("PUBLIC_DIR")
                .map_or_else(|| PathBuf::from("public"), PathBuf::from),
            upload_dir: load_env_optional("UPLOAD_DIR")
                .map_or_else(|| PathBuf::from("uploads"), PathBuf::from),
            upload_max_bytes: parse_optional("UPLOAD_MAX_BYTES")?
                .unwrap_or(DEFAULT_UPLOAD_MAX_BYTES),
            chunk_size: parse_positive("CHUNK_SIZE")?.unwrap_or(DEFAULT_CHUNK_SIZE),
            batch_concurrency: parse_positive("BATCH_CONCURRENCY")?.unwrap_or(1),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_positive(key: &str) -> Result<Option<usize>, ConfigError> {
    match parse_optional::<usize>(key)? {
        Some(0) => Err(ConfigError::InvalidValue(key.to_string())),
        other => Ok(other),
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if [`init_config`] has not succeeded.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment (and `.env`) and cache it for the process lifetime.
///
/// Call after logging is set up so the loaded values are recorded. Once a configuration is
/// cached, later calls keep the first one.
pub fn init_config() -> Result<(), ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        base_url = %config.anthropic_base_url,
        model = %config.anthropic_model,
        server_port = config.server_port,
        chunk_size = config.chunk_size,
        batch_concurrency = config.batch_concurrency,
        "Loaded configuration"
    );
    let _ = CONFIG.set(config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment mutation is process-wide; serialize the tests touching it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: &[&str] = &[
        "ANTHROPIC_API_KEY",
        "ANTHROPIC_BASE_URL",
        "ANTHROPIC_MODEL",
        "ANTHROPIC_MAX_TOKENS",
        "SERVER_PORT",
        "PUBLIC_DIR",
        "UPLOAD_DIR",
        "UPLOAD_MAX_BYTES",
        "CHUNK_SIZE",
        "BATCH_CONCURRENCY",
    ];

    fn reset_env(vars: &[(&str, &str)]) {
        // SAFETY: guarded by ENV_LOCK; no other thread reads these keys concurrently.
        unsafe {
            for key in KEYS {
                env::remove_var(key);
            }
            for (key, value) in vars {
                env::set_var(key, value);
            }
        }
    }

    #[test]
    fn from_env_applies_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset_env(&[("ANTHROPIC_API_KEY", "sk-test")]);

        let config = Config::from_env().expect("config");
        assert_eq!(config.anthropic_api_key, "sk-test");
        assert_eq!(config.anthropic_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.anthropic_model, DEFAULT_MODEL);
        assert_eq!(config.anthropic_max_tokens, 500);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.batch_concurrency, 1);
    }

    #[test]
    fn from_env_requires_api_key() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset_env(&[("ANTHROPIC_API_KEY", "   ")]);

        let error = Config::from_env().unwrap_err();
        assert!(matches!(error, ConfigError::MissingVariable(key) if key == "ANTHROPIC_API_KEY"));
    }

    #[test]
    fn from_env_rejects_zero_chunk_size() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset_env(&[("ANTHROPIC_API_KEY", "sk-test"), ("CHUNK_SIZE", "0")]);

        let error = Config::from_env().unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "CHUNK_SIZE"));
    }

    #[test]
    fn from_env_parses_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset_env(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("SERVER_PORT", "8080"),
            ("CHUNK_SIZE", "1200"),
            ("BATCH_CONCURRENCY", "4"),
            ("ANTHROPIC_MODEL", "claude-test"),
        ]);

        let config = Config::from_env().expect("config");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.chunk_size, 1200);
        assert_eq!(config.batch_concurrency, 4);
        assert_eq!(config.anthropic_model, "claude-test");
    }

    #[test]
    fn from_env_rejects_unparseable_port() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset_env(&[("ANTHROPIC_API_KEY", "sk-test"), ("SERVER_PORT", "http")]);

        let error = Config::from_env().unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "SERVER_PORT"));
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("logs").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn init_config_caches_and_logs_loaded_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset_env(&[("ANTHROPIC_API_KEY", "sk-cached"), ("CHUNK_SIZE", "640")]);

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || init_config().expect("init"));

        let config = get_config();
        assert_eq!(config.anthropic_api_key, "sk-cached");
        assert_eq!(config.chunk_size, 640);

        let output = String::from_utf8(logs.0.lock().expect("logs").clone()).expect("utf8");
        assert!(output.contains("Loaded configuration"), "{output}");
        assert!(output.contains("chunk_size=640"), "{output}");
    }
}
