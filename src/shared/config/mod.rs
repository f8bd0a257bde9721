use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::shared::utils::mask_secret;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Everything the service needs at startup. Built once in `main` and passed
/// down explicitly.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub poll: PollConfig,
    pub ingest: IngestConfig,
    pub session: SessionConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub jobs_path: String,
    pub api_key: String,
    pub api_key_header: String,
    pub models: Value,
    pub job_id_pointer: String,
    pub status_pointer: String,
    pub done_statuses: Vec<String>,
    pub failed_statuses: Vec<String>,
    pub predictions_pointer: String,
    pub emotions_pointer: String,
    pub http_timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("jobs_path", &self.jobs_path)
            .field("api_key", &mask_secret(&self.api_key))
            .field("api_key_header", &self.api_key_header)
            .field("models", &self.models)
            .field("job_id_pointer", &self.job_id_pointer)
            .field("status_pointer", &self.status_pointer)
            .field("done_statuses", &self.done_statuses)
            .field("failed_statuses", &self.failed_statuses)
            .field("predictions_pointer", &self.predictions_pointer)
            .field("emotions_pointer", &self.emotions_pointer)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl ProviderConfig {
    pub fn jobs_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.jobs_path.trim_start_matches('/')
        )
    }

    pub fn is_done_status(&self, status: &str) -> bool {
        contains_ignore_case(&self.done_statuses, status)
    }

    pub fn is_failed_status(&self, status: &str) -> bool {
        contains_ignore_case(&self.failed_statuses, status)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    pub backoff_multiplier: f64,
    pub max_interval: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestMode {
    Url,
    Inline,
}

#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub mode: IngestMode,
    pub public_base_url: Option<String>,
    pub upload_dir: PathBuf,
    /// Cap applied to WAV uploads before handoff. `None` keeps full length.
    pub max_duration: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// `None` means unbounded.
    pub capacity: Option<usize>,
}

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:5500";
const DEFAULT_EMOTIONS_POINTER: &str = "/models/prosody/grouped_predictions/0/predictions/0/emotions";

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// Fails when the provider credential is missing or a setting that the
    /// runner depends on (poll budget, backoff, JSON pointers, model payload)
    /// is malformed. Loosely typed numeric settings fall back to their
    /// defaults with a warning.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reads keys through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup: &lookup };

        let api_key = env
            .non_empty("PROVIDER_API_KEY")
            .or_else(|| env.non_empty("HUME_API_KEY"))
            .ok_or(ConfigError::Missing("PROVIDER_API_KEY"))?;

        let models = match env.non_empty("PROVIDER_MODELS") {
            Some(raw) => serde_json::from_str::<Value>(&raw).map_err(|e| ConfigError::Invalid {
                key: "PROVIDER_MODELS",
                reason: e.to_string(),
            })?,
            None => serde_json::json!({ "prosody": {} }),
        };
        if !models.is_object() {
            return Err(ConfigError::Invalid {
                key: "PROVIDER_MODELS",
                reason: "must be a JSON object".to_string(),
            });
        }

        let provider = ProviderConfig {
            base_url: env
                .non_empty("PROVIDER_BASE_URL")
                .unwrap_or_else(|| "https://api.hume.ai".to_string()),
            jobs_path: env
                .non_empty("PROVIDER_JOBS_PATH")
                .unwrap_or_else(|| "/v0/batch/jobs".to_string()),
            api_key,
            api_key_header: env
                .non_empty("PROVIDER_API_KEY_HEADER")
                .unwrap_or_else(|| "X-Hume-Api-Key".to_string()),
            models,
            job_id_pointer: env.pointer("PROVIDER_JOB_ID_POINTER", "/job_id")?,
            status_pointer: env.pointer("PROVIDER_STATUS_POINTER", "/status")?,
            done_statuses: env.list("PROVIDER_DONE_STATUSES", "done,completed"),
            failed_statuses: env.list("PROVIDER_FAILED_STATUSES", "failed"),
            predictions_pointer: env.pointer("PROVIDER_PREDICTIONS_POINTER", "/predictions")?,
            emotions_pointer: env.pointer("PROVIDER_EMOTIONS_POINTER", DEFAULT_EMOTIONS_POINTER)?,
            http_timeout: Duration::from_millis(env.u64_or("PROVIDER_HTTP_TIMEOUT_MS", 10_000)),
        };

        let poll = PollConfig {
            interval: env.seconds("POLL_INTERVAL_SEC", 3.0)?,
            max_attempts: env.max_attempts()?,
            backoff_multiplier: env.backoff_multiplier()?,
            max_interval: env.seconds("POLL_MAX_INTERVAL_SEC", 30.0)?,
        };

        let public_base_url = env
            .non_empty("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string());
        let mode = match env.non_empty("INGEST_MODE").as_deref() {
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "url" => IngestMode::Url,
                "inline" => IngestMode::Inline,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "INGEST_MODE",
                        reason: format!("expected url or inline, got {other}"),
                    })
                }
            },
            None if public_base_url.is_some() => IngestMode::Url,
            None => IngestMode::Inline,
        };
        if mode == IngestMode::Url && public_base_url.is_none() {
            return Err(ConfigError::Invalid {
                key: "INGEST_MODE",
                reason: "url mode requires PUBLIC_BASE_URL".to_string(),
            });
        }
        let max_duration_sec = env.u64_or("INGEST_MAX_DURATION_SEC", 5);
        let ingest = IngestConfig {
            mode,
            public_base_url,
            upload_dir: PathBuf::from(
                env.non_empty("UPLOAD_DIR")
                    .unwrap_or_else(|| "static/uploads".to_string()),
            ),
            max_duration: (max_duration_sec > 0).then(|| Duration::from_secs(max_duration_sec)),
        };

        let server = ServerConfig {
            bind_addr: env
                .non_empty("HTTP_BIND_ADDR")
                .unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            cors_allowed_origins: env.list("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS),
            max_upload_bytes: env.u64_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024) as usize,
        };

        let capacity = env.u64_or("SESSION_CAPACITY", 10_000);
        let session = SessionConfig {
            capacity: (capacity > 0).then_some(capacity as usize),
        };

        Ok(Self {
            server,
            provider,
            poll,
            ingest,
            session,
        })
    }
}

struct Env<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Env<'_> {
    fn non_empty(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn u64_or(&self, key: &str, default_value: u64) -> u64 {
        match self.non_empty(key) {
            Some(value) => match value.parse::<u64>() {
                Ok(v) => v,
                Err(_) => {
                    log::warn!(
                        "[config] invalid {}={}, fallback to {}",
                        key,
                        value,
                        default_value
                    );
                    default_value
                }
            },
            None => default_value,
        }
    }

    fn list(&self, key: &str, default_value: &str) -> Vec<String> {
        let raw = self
            .non_empty(key)
            .unwrap_or_else(|| default_value.to_string());
        raw.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }

    fn pointer(&self, key: &'static str, default_value: &str) -> Result<String, ConfigError> {
        let value = self
            .non_empty(key)
            .unwrap_or_else(|| default_value.to_string());
        if !value.starts_with('/') {
            return Err(ConfigError::Invalid {
                key,
                reason: format!("JSON pointer must start with '/', got {value}"),
            });
        }
        Ok(value)
    }

    fn seconds(&self, key: &'static str, default_sec: f64) -> Result<Duration, ConfigError> {
        let Some(raw) = self.non_empty(key) else {
            return Ok(Duration::from_secs_f64(default_sec));
        };
        let sec = raw.parse::<f64>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })?;
        Duration::try_from_secs_f64(sec).map_err(|_| ConfigError::Invalid {
            key,
            reason: format!("must be a non-negative number of seconds, got {raw}"),
        })
    }

    fn max_attempts(&self) -> Result<u32, ConfigError> {
        const KEY: &str = "POLL_MAX_ATTEMPTS";
        let Some(raw) = self.non_empty(KEY) else {
            return Ok(40);
        };
        match raw.parse::<u32>() {
            Ok(v) if v >= 1 => Ok(v),
            _ => Err(ConfigError::Invalid {
                key: KEY,
                reason: format!("must be an integer >= 1, got {raw}"),
            }),
        }
    }

    fn backoff_multiplier(&self) -> Result<f64, ConfigError> {
        const KEY: &str = "POLL_BACKOFF_MULTIPLIER";
        let Some(raw) = self.non_empty(KEY) else {
            return Ok(1.0);
        };
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 1.0 => Ok(v),
            _ => Err(ConfigError::Invalid {
                key: KEY,
                reason: format!("must be a number >= 1.0, got {raw}"),
            }),
        }
    }
}

fn contains_ignore_case(values: &[String], needle: &str) -> bool {
    let needle = needle.trim();
    values.iter().any(|v| v.eq_ignore_ascii_case(needle))
}

/// Where log lines go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Appends to this file, creating parent directories as needed.
    File(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logger settings. Read separately from [`Config`] so logging is up before
/// the rest of the configuration is validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub target: LogTarget,
    pub format: LogFormat,
    /// `env_logger` filter directives, e.g. `info,voice_emotion_backend=debug`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: LogTarget::Stdout,
            format: LogFormat::Text,
            filter: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `LOG_MODE=stdout|file` (file when only `LOG_DIR` is set),
    /// `LOG_DIR` (default `logs`), `LOG_FILE_NAME` (default `app.log`),
    /// `LOG_FORMAT=text|json`, `RUST_LOG` (default `info`).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup: &lookup };
        let defaults = Self::default();

        let format = match env.non_empty("LOG_FORMAT").map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let dir = env.non_empty("LOG_DIR");
        let to_file = match env.non_empty("LOG_MODE").map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "file" => true,
            Some(v) if v == "stdout" => false,
            _ => dir.is_some(),
        };
        let target = if to_file {
            let file_name = env
                .non_empty("LOG_FILE_NAME")
                .unwrap_or_else(|| "app.log".to_string());
            LogTarget::File(PathBuf::from(dir.unwrap_or_else(|| "logs".to_string())).join(file_name))
        } else {
            LogTarget::Stdout
        };

        Self {
            target,
            format,
            filter: env.non_empty("RUST_LOG").unwrap_or(defaults.filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn missing_credential_fails_fast() {
        assert_eq!(
            load(&[]).unwrap_err(),
            ConfigError::Missing("PROVIDER_API_KEY")
        );
        assert_eq!(
            load(&[("PROVIDER_API_KEY", "   ")]).unwrap_err(),
            ConfigError::Missing("PROVIDER_API_KEY")
        );
    }

    #[test]
    fn legacy_hume_key_is_accepted() {
        let cfg = load(&[("HUME_API_KEY", "legacy")]).unwrap();
        assert_eq!(cfg.provider.api_key, "legacy");
    }

    #[test]
    fn defaults_match_hume_batch_api() {
        let cfg = load(&[("PROVIDER_API_KEY", "k")]).unwrap();
        assert_eq!(cfg.provider.jobs_url(), "https://api.hume.ai/v0/batch/jobs");
        assert_eq!(cfg.provider.api_key_header, "X-Hume-Api-Key");
        assert_eq!(cfg.provider.models, serde_json::json!({"prosody": {}}));
        assert_eq!(cfg.poll.interval, Duration::from_secs(3));
        assert_eq!(cfg.poll.max_attempts, 40);
        assert_eq!(cfg.poll.backoff_multiplier, 1.0);
        assert_eq!(cfg.ingest.mode, IngestMode::Inline);
        assert_eq!(cfg.ingest.max_duration, Some(Duration::from_secs(5)));
        assert_eq!(cfg.session.capacity, Some(10_000));
        assert_eq!(cfg.server.cors_allowed_origins.len(), 2);
        assert!(cfg.provider.is_done_status("COMPLETED"));
        assert!(cfg.provider.is_failed_status(" Failed "));
        assert!(!cfg.provider.is_done_status("pending"));
    }

    #[test]
    fn public_base_url_selects_url_mode() {
        let cfg = load(&[
            ("PROVIDER_API_KEY", "k"),
            ("PUBLIC_BASE_URL", "https://example.org/"),
        ])
        .unwrap();
        assert_eq!(cfg.ingest.mode, IngestMode::Url);
        assert_eq!(
            cfg.ingest.public_base_url.as_deref(),
            Some("https://example.org")
        );
    }

    #[test]
    fn url_mode_without_base_url_is_rejected() {
        let err = load(&[("PROVIDER_API_KEY", "k"), ("INGEST_MODE", "url")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "INGEST_MODE", .. }));
    }

    #[test]
    fn poll_settings_are_validated() {
        for (key, value) in [
            ("POLL_MAX_ATTEMPTS", "0"),
            ("POLL_MAX_ATTEMPTS", "abc"),
            ("POLL_BACKOFF_MULTIPLIER", "0.5"),
            ("POLL_INTERVAL_SEC", "-1"),
            ("PROVIDER_MODELS", "[1,2]"),
            ("PROVIDER_MODELS", "{not json"),
            ("PROVIDER_STATUS_POINTER", "status"),
        ] {
            let err = load(&[("PROVIDER_API_KEY", "k"), (key, value)]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::Invalid { key: k, .. } if *k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }

    #[test]
    fn out_of_range_intervals_are_config_errors() {
        for (key, value) in [
            ("POLL_INTERVAL_SEC", "1e30"),
            ("POLL_INTERVAL_SEC", "NaN"),
            ("POLL_MAX_INTERVAL_SEC", "inf"),
            ("POLL_MAX_INTERVAL_SEC", "1e300"),
        ] {
            let err = load(&[("PROVIDER_API_KEY", "k"), (key, value)]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::Invalid { key: k, .. } if *k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }

    #[test]
    fn loose_numbers_fall_back_to_defaults() {
        let cfg = load(&[
            ("PROVIDER_API_KEY", "k"),
            ("SESSION_CAPACITY", "lots"),
            ("INGEST_MAX_DURATION_SEC", "0"),
            ("POLL_INTERVAL_SEC", "0.25"),
        ])
        .unwrap();
        assert_eq!(cfg.session.capacity, Some(10_000));
        assert_eq!(cfg.ingest.max_duration, None);
        assert_eq!(cfg.poll.interval, Duration::from_millis(250));
    }

    fn load_logging(pairs: &[(&str, &str)]) -> LoggingConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LoggingConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn logging_defaults_to_text_on_stdout() {
        assert_eq!(load_logging(&[]), LoggingConfig::default());
        let cfg = load_logging(&[("LOG_FORMAT", "JSON"), ("RUST_LOG", "debug")]);
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.target, LogTarget::Stdout);
        assert_eq!(cfg.filter, "debug");
    }

    #[test]
    fn log_dir_implies_file_target() {
        let cfg = load_logging(&[("LOG_DIR", "/var/log/ser")]);
        assert_eq!(cfg.target, LogTarget::File(PathBuf::from("/var/log/ser/app.log")));

        let cfg = load_logging(&[("LOG_MODE", "file"), ("LOG_FILE_NAME", "api.log")]);
        assert_eq!(cfg.target, LogTarget::File(PathBuf::from("logs/api.log")));

        let cfg = load_logging(&[("LOG_MODE", "stdout"), ("LOG_DIR", "/tmp/x")]);
        assert_eq!(cfg.target, LogTarget::Stdout);
    }

    #[test]
    fn debug_output_masks_api_key() {
        let cfg = load(&[("PROVIDER_API_KEY", "super-secret")]).unwrap();
        let rendered = format!("{:?}", cfg.provider);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted len=12>"));
    }
}
