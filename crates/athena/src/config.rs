use std::env;

use serde::{Deserialize, Serialize};

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_WORKGROUP: &str = "primary";

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Default query-result location, dated so repeated runs land in a fresh
/// bucket name the operator can create on demand.
pub fn default_output_location() -> String {
    format!(
        "s3://athena-results-{}/",
        chrono::Utc::now().format("%Y%m%d")
    )
}

/// Connection settings for the asynchronous query engine.
///
/// Reads from environment variables; `LOGLENS_REGION` wins over
/// `AWS_REGION`. Credentials always come from the ambient chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// AWS region the clients are constructed for.
    pub region: String,
    /// S3 path query results are written to.
    pub output_location: String,
    /// Athena workgroup to run under.
    pub workgroup: String,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let region = env_opt("LOGLENS_REGION")
            .or_else(|| env_opt("AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self {
            region,
            output_location: env_opt("LOGLENS_OUTPUT_LOCATION")
                .unwrap_or_else(default_output_location),
            workgroup: env_opt("LOGLENS_WORKGROUP")
                .unwrap_or_else(|| DEFAULT_WORKGROUP.to_string()),
        }
    }

    pub fn new(region: impl Into<String>, output_location: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            output_location: output_location.into(),
            workgroup: DEFAULT_WORKGROUP.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env-based tests must run serially to avoid interfering with each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for k in [
            "LOGLENS_REGION",
            "LOGLENS_OUTPUT_LOCATION",
            "LOGLENS_WORKGROUP",
            "AWS_REGION",
        ] {
            env::remove_var(k);
        }
    }

    #[test]
    fn defaults_when_no_env_vars() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        let cfg = EngineConfig::from_env();
        assert_eq!(cfg.region, "us-east-1");
        assert_eq!(cfg.workgroup, "primary");
        assert!(cfg.output_location.starts_with("s3://athena-results-"));
        assert!(cfg.output_location.ends_with('/'));
    }

    #[test]
    fn region_falls_back_to_aws_region() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("AWS_REGION", "eu-west-1");
        let cfg = EngineConfig::from_env();
        assert_eq!(cfg.region, "eu-west-1");

        clear_env();
    }

    #[test]
    fn loglens_region_takes_precedence() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("AWS_REGION", "eu-west-1");
        env::set_var("LOGLENS_REGION", "ap-northeast-2");
        env::set_var("LOGLENS_OUTPUT_LOCATION", "s3://my-results/");

        let cfg = EngineConfig::from_env();
        assert_eq!(cfg.region, "ap-northeast-2");
        assert_eq!(cfg.output_location, "s3://my-results/");

        clear_env();
    }

    #[test]
    fn default_output_location_is_dated() {
        let loc = default_output_location();
        let date = chrono::Utc::now().format("%Y%m%d").to_string();
        assert_eq!(loc, format!("s3://athena-results-{date}/"));
    }
}
