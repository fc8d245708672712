//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub host: String,
    pub port: u16,
    /// Base URL of the external question/content generator. Empty disables the
    /// HTTP generator and every window is built from the template bank.
    pub question_service_url: String,
    pub functional_weight: f64,
    pub quality_weight: f64,
    pub late_penalty: f64,
    pub sweep_interval_secs: u64,
    pub window_generation_interval_secs: u64,
    pub window_duration_minutes: i64,
    pub window_weekday: String,
    pub window_hour: u32,
    pub upcoming_windows: usize,
    pub mcq_per_window: usize,
    pub coding_per_window: usize,
    pub build_timeout_secs: u64,
    pub max_output_bytes: usize,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every field has a default, so a bare environment yields a usable
    /// single-host configuration.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "codejudge".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parse_env("PORT", 3000),
            question_service_url: env::var("QUESTION_SERVICE_URL").unwrap_or_default(),
            functional_weight: parse_env("FUNCTIONAL_WEIGHT", 0.7),
            quality_weight: parse_env("QUALITY_WEIGHT", 0.3),
            late_penalty: parse_env("LATE_PENALTY", 0.9),
            sweep_interval_secs: parse_env("SWEEP_INTERVAL_SECS", 600),
            window_generation_interval_secs: parse_env("WINDOW_GENERATION_INTERVAL_SECS", 3600),
            window_duration_minutes: parse_env("WINDOW_DURATION_MINUTES", 60),
            window_weekday: env::var("WINDOW_WEEKDAY").unwrap_or_else(|_| "friday".into()),
            window_hour: parse_env("WINDOW_HOUR", 17),
            upcoming_windows: parse_env("UPCOMING_WINDOWS", 2),
            mcq_per_window: parse_env("MCQ_PER_WINDOW", 3),
            coding_per_window: parse_env("CODING_PER_WINDOW", 2),
            build_timeout_secs: parse_env("BUILD_TIMEOUT_SECS", 20),
            max_output_bytes: parse_env("MAX_OUTPUT_BYTES", 64 * 1024),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_project_name(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.project_name = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_host(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.host = value.into());
    }

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_question_service_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.question_service_url = value.into());
    }

    pub fn set_functional_weight(value: f64) {
        AppConfig::set_field(|cfg| cfg.functional_weight = value);
    }

    pub fn set_quality_weight(value: f64) {
        AppConfig::set_field(|cfg| cfg.quality_weight = value);
    }

    pub fn set_late_penalty(value: f64) {
        AppConfig::set_field(|cfg| cfg.late_penalty = value);
    }

    pub fn set_sweep_interval_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.sweep_interval_secs = value);
    }

    pub fn set_window_generation_interval_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.window_generation_interval_secs = value);
    }

    pub fn set_window_duration_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.window_duration_minutes = value);
    }

    pub fn set_window_weekday(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.window_weekday = value.into());
    }

    pub fn set_window_hour(value: u32) {
        AppConfig::set_field(|cfg| cfg.window_hour = value);
    }

    pub fn set_upcoming_windows(value: usize) {
        AppConfig::set_field(|cfg| cfg.upcoming_windows = value);
    }

    pub fn set_mcq_per_window(value: usize) {
        AppConfig::set_field(|cfg| cfg.mcq_per_window = value);
    }

    pub fn set_coding_per_window(value: usize) {
        AppConfig::set_field(|cfg| cfg.coding_per_window = value);
    }

    pub fn set_build_timeout_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.build_timeout_secs = value);
    }

    pub fn set_max_output_bytes(value: usize) {
        AppConfig::set_field(|cfg| cfg.max_output_bytes = value);
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// --- Free accessor functions, for call sites that only need one value. ---

pub fn env_name() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn question_service_url() -> String {
    AppConfig::global().question_service_url.clone()
}

pub fn functional_weight() -> f64 {
    AppConfig::global().functional_weight
}

pub fn quality_weight() -> f64 {
    AppConfig::global().quality_weight
}

pub fn late_penalty() -> f64 {
    AppConfig::global().late_penalty
}

pub fn sweep_interval_secs() -> u64 {
    AppConfig::global().sweep_interval_secs
}

pub fn window_generation_interval_secs() -> u64 {
    AppConfig::global().window_generation_interval_secs
}

pub fn window_duration_minutes() -> i64 {
    AppConfig::global().window_duration_minutes
}

pub fn window_weekday() -> String {
    AppConfig::global().window_weekday.clone()
}

pub fn window_hour() -> u32 {
    AppConfig::global().window_hour
}

pub fn upcoming_windows() -> usize {
    AppConfig::global().upcoming_windows
}

pub fn mcq_per_window() -> usize {
    AppConfig::global().mcq_per_window
}

pub fn coding_per_window() -> usize {
    AppConfig::global().coding_per_window
}

pub fn build_timeout_secs() -> u64 {
    AppConfig::global().build_timeout_secs
}

pub fn max_output_bytes() -> usize {
    AppConfig::global().max_output_bytes
}
