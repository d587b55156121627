//! Pipeline configuration loaded from the environment.
//!
//! All knobs have code defaults so a bare process runs without any env setup;
//! `from_env` loads `.env` first and overrides field by field.

use std::env;

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Tunables for the verdict pipeline and its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum review retries before the audit router force-proceeds.
    pub max_review_count: u32,
    /// Passages requested per retrieval query.
    pub retrieval_k: usize,
    /// Minimum relevance score for retrieved passages.
    pub relevance_threshold: f32,
    /// History length above which finalize prunes and summarises the thread.
    pub history_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_review_count: 2,
            retrieval_k: 5,
            relevance_threshold: 0.1,
            history_limit: 6,
        }
    }
}

impl PipelineConfig {
    /// Loads config from the environment (`LEXWEAVE_*` variables), falling
    /// back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();
        Self {
            max_review_count: env_parse("LEXWEAVE_MAX_REVIEW_COUNT", defaults.max_review_count),
            retrieval_k: env_parse("LEXWEAVE_RETRIEVAL_K", defaults.retrieval_k),
            relevance_threshold: env_parse(
                "LEXWEAVE_RELEVANCE_THRESHOLD",
                defaults.relevance_threshold,
            ),
            history_limit: env_parse("LEXWEAVE_HISTORY_LIMIT", defaults.history_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: defaults match the documented pipeline knobs.
    #[test]
    fn pipeline_config_defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_review_count, 2);
        assert_eq!(c.retrieval_k, 5);
        assert!((c.relevance_threshold - 0.1).abs() < f32::EPSILON);
        assert_eq!(c.history_limit, 6);
    }

    /// **Scenario**: an unparseable env value falls back to the default.
    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("LEXWEAVE_TEST_GARBAGE", "not-a-number");
        let v: u32 = env_parse("LEXWEAVE_TEST_GARBAGE", 7);
        assert_eq!(v, 7);
        std::env::remove_var("LEXWEAVE_TEST_GARBAGE");
    }
}
