//! Configuration management for the weblands engine.
//!
//! A single [`Config`] record is built at startup and passed down the call
//! graph; nothing reads the environment after construction. Every knob has
//! a default and can be overridden through a `WEBLANDS_`-prefixed
//! environment variable.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "WEBLANDS_";

/// Environment loading errors.
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Domain-identity rewrite rule: when a host ends with `suffix`, the regex
/// is run against the full URL and its first capture replaces the domain.
#[derive(Debug, Clone)]
pub struct Heuristic {
    pub suffix: String,
    pub pattern: Regex,
}

/// Optional LLM relevance-gate settings.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout: Duration,
    pub max_calls_per_run: usize,
    pub readable_max_chars: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: None,
            timeout: Duration::from_secs(15),
            max_calls_per_run: 500,
            readable_max_chars: 12_000,
        }
    }
}

/// Bounds consumed by the external media analyzer.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub min_width: u32,
    pub min_height: u32,
    pub max_file_size: u64,
    pub download_timeout: Duration,
    pub max_retries: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            min_width: 200,
            min_height: 200,
            max_file_size: 10 * 1024 * 1024,
            download_timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base path for the database file and archived HTML snapshots.
    pub data_location: PathBuf,
    /// Hard cap on concurrent requests and batch size.
    pub parallel_connections: usize,
    pub user_agent: String,
    /// Default timeout for network requests without a per-stage override.
    pub default_timeout: Duration,
    /// Total timeout for the direct page fetch.
    pub fetch_timeout: Duration,
    /// Timeout for the archival availability lookup.
    pub archive_lookup_timeout: Duration,
    /// Timeout for fetching an archival snapshot body.
    pub archive_fetch_timeout: Duration,
    /// Timeout for the domain metadata pass.
    pub domain_timeout: Duration,
    /// Whether fetched HTML is persisted under `data_location`.
    pub archive: bool,
    /// Enables the optional headless-browser media pass after approval.
    pub dynamic_media_extraction: bool,
    /// Command invoked by the subprocess readability extractor.
    pub readable_command: String,
    pub heuristics: Vec<Heuristic>,
    pub media: MediaConfig,
    pub gate: GateConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_location: PathBuf::from("./data"),
            parallel_connections: 10,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/91.0.4472.114 Safari/537.36"
                .to_string(),
            default_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(15),
            archive_lookup_timeout: Duration::from_secs(10),
            archive_fetch_timeout: Duration::from_secs(10),
            domain_timeout: Duration::from_secs(5),
            archive: false,
            dynamic_media_extraction: false,
            readable_command: "mercury-parser".to_string(),
            heuristics: default_heuristics(),
            media: MediaConfig::default(),
            gate: GateConfig::default(),
        }
    }
}

impl Config {
    /// Build the configuration from defaults plus `WEBLANDS_*` overrides.
    pub fn from_env() -> Result<Self, EnvError> {
        let mut config = Config::default();

        if let Some(value) = env_var("DATA_LOCATION") {
            config.data_location = PathBuf::from(value);
        }
        if let Some(value) = env_var("PARALLEL_CONNECTIONS") {
            config.parallel_connections = parse_var("PARALLEL_CONNECTIONS", &value)?;
        }
        if let Some(value) = env_var("USER_AGENT") {
            config.user_agent = value;
        }
        if let Some(value) = env_var("DEFAULT_TIMEOUT") {
            config.default_timeout = Duration::from_secs(parse_var("DEFAULT_TIMEOUT", &value)?);
        }
        if let Some(value) = env_var("ARCHIVE") {
            config.archive = parse_bool(&value);
        }
        if let Some(value) = env_var("DYNAMIC_MEDIA_EXTRACTION") {
            config.dynamic_media_extraction = parse_bool(&value);
        }
        if let Some(value) = env_var("READABLE_COMMAND") {
            config.readable_command = value;
        }

        if let Some(value) = env_var("GATE_ENABLED") {
            config.gate.enabled = parse_bool(&value);
        }
        config.gate.api_key = env_var("GATE_API_KEY").or(config.gate.api_key);
        config.gate.model = env_var("GATE_MODEL").or(config.gate.model);
        if let Some(value) = env_var("GATE_TIMEOUT") {
            config.gate.timeout = Duration::from_secs(parse_var("GATE_TIMEOUT", &value)?);
        }
        if let Some(value) = env_var("GATE_MAX_CALLS_PER_RUN") {
            config.gate.max_calls_per_run = parse_var("GATE_MAX_CALLS_PER_RUN", &value)?;
        }
        if let Some(value) = env_var("GATE_READABLE_MAX_CHARS") {
            config.gate.readable_max_chars = parse_var("GATE_READABLE_MAX_CHARS", &value)?;
        }

        if let Some(value) = env_var("MEDIA_MIN_WIDTH") {
            config.media.min_width = parse_var("MEDIA_MIN_WIDTH", &value)?;
        }
        if let Some(value) = env_var("MEDIA_MIN_HEIGHT") {
            config.media.min_height = parse_var("MEDIA_MIN_HEIGHT", &value)?;
        }
        if let Some(value) = env_var("MEDIA_MAX_FILE_SIZE") {
            config.media.max_file_size = parse_var("MEDIA_MAX_FILE_SIZE", &value)?;
        }
        if let Some(value) = env_var("MEDIA_DOWNLOAD_TIMEOUT") {
            config.media.download_timeout =
                Duration::from_secs(parse_var("MEDIA_DOWNLOAD_TIMEOUT", &value)?);
        }
        if let Some(value) = env_var("MEDIA_MAX_RETRIES") {
            config.media.max_retries = parse_var("MEDIA_MAX_RETRIES", &value)?;
        }

        Ok(config)
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_location.join("weblands.db")
    }

    /// Directory for a land's archived HTML snapshots.
    pub fn land_dir(&self, land_id: i64) -> PathBuf {
        self.data_location.join("lands").join(land_id.to_string())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}")).ok()
}

fn parse_var<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, EnvError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| EnvError::InvalidValue {
        var: format!("{ENV_PREFIX}{var}"),
        reason: err.to_string(),
    })
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Default platform heuristics keeping distinct accounts on the same
/// platform as distinct domains.
pub fn default_heuristics() -> Vec<Heuristic> {
    let table: BTreeMap<&str, &str> = BTreeMap::from([
        (
            "facebook.com",
            r"([a-z0-9\-_]+\.facebook\.com/[a-zA-Z0-9\.\-_]+)/?\??",
        ),
        (
            "twitter.com",
            r"([a-z0-9\-_]*\.?twitter\.com/[a-zA-Z0-9\.\-_]+)",
        ),
        (
            "linkedin.com",
            r"([a-z0-9\-_]+\.linkedin\.com/[a-zA-Z0-9\.\-_]+)/?\??",
        ),
        (
            "slideshare.net",
            r"([a-z0-9\-_]+\.slideshare\.com/[a-zA-Z0-9\.\-_]+)/?\??",
        ),
        (
            "instagram.com",
            r"([a-z0-9\-_]+\.instagram\.com/[a-zA-Z0-9\.\-_]+)/?\??",
        ),
        (
            "youtube.com",
            r"([a-z0-9\-_]+\.youtube\.com/[a-zA-Z0-9\.\-_]+)/?\??",
        ),
        (
            "vimeo.com",
            r"([a-z0-9\-_]+\.vimeo\.com/[a-zA-Z0-9\.\-_]+)/?\??",
        ),
        (
            "dailymotion.com",
            r"([a-z0-9\-_]+\.dailymotion\.com/[a-zA-Z0-9\.\-_]+)/?\??",
        ),
        (
            "pinterest.com",
            r"([a-z0-9\-_]+\.pinterest\.com/[a-zA-Z0-9\.\-_]+)/?\??",
        ),
        (
            "pinterest.fr",
            r"([a-z0-9\-_]+\.pinterest\.fr/[a-zA-Z0-9\.\-_]+)/?\??",
        ),
    ]);

    table
        .into_iter()
        .filter_map(|(suffix, pattern)| {
            Regex::new(pattern).ok().map(|pattern| Heuristic {
                suffix: suffix.to_string(),
                pattern,
            })
        })
        .collect()
}
