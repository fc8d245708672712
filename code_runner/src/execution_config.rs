use serde::Deserialize;
use std::time::Duration;

/// Limits applied to every sandbox invocation, independent of the
/// per-language run timeout from the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Wall-clock bound for the compile step of compiled languages.
    pub build_timeout_secs: u64,
    /// Captured stdout/stderr are truncated to this many bytes.
    pub max_output_bytes: usize,
}

impl ExecutionConfig {
    pub fn from_config() -> Self {
        Self {
            build_timeout_secs: util::config::build_timeout_secs(),
            max_output_bytes: util::config::max_output_bytes(),
        }
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            build_timeout_secs: 20,
            max_output_bytes: 64 * 1024,
        }
    }
}
