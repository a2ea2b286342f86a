//! Configuration for the test-run reporter.
//!
//! Options are read once at startup, either from the command line or from
//! the environment, and frozen into a [`RunConfiguration`]. Reporting is
//! active only when both the pushgateway URL and the metric prefix are set.

mod labels;

pub use labels::LabelSet;

use crate::domain::errors::ConfigurationError;
use clap::Args;
use std::time::Duration;
use url::Url;

/// Job name used when none is configured
pub const DEFAULT_JOB_NAME: &str = "testrun";
/// Upper bound on the single push request, in seconds
pub const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 10;

/// Reporter options. Host harnesses can `#[command(flatten)]` these into
/// their own CLI.
#[derive(Debug, Clone, Args)]
pub struct ReporterArgs {
    /// Push Gateway URL to send metrics to
    #[arg(long = "prometheus-pushgateway-url", env = "PROMETHEUS_PUSHGATEWAY_URL")]
    pub pushgateway_url: Option<String>,

    /// Prefix for all prometheus metrics
    #[arg(long = "prometheus-metric-prefix", env = "PROMETHEUS_METRIC_PREFIX")]
    pub metric_prefix: Option<String>,

    /// Extra labels to attach to reported metrics (repeatable)
    #[arg(long = "prometheus-extra-label", value_name = "KEY=VALUE")]
    pub extra_labels: Vec<String>,

    /// Value for the "job" key in exported metrics
    #[arg(
        long = "prometheus-job-name",
        env = "PROMETHEUS_JOB_NAME",
        default_value = DEFAULT_JOB_NAME
    )]
    pub job_name: String,

    /// Timeout for the push request
    #[arg(
        long = "prometheus-push-timeout",
        env = "PROMETHEUS_PUSH_TIMEOUT",
        value_name = "SECONDS",
        default_value_t = DEFAULT_PUSH_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub push_timeout_secs: u64,
}

impl Default for ReporterArgs {
    fn default() -> Self {
        Self {
            pushgateway_url: None,
            metric_prefix: None,
            extra_labels: Vec::new(),
            job_name: DEFAULT_JOB_NAME.to_string(),
            push_timeout_secs: DEFAULT_PUSH_TIMEOUT_SECS,
        }
    }
}

/// Immutable settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    pub metric_prefix: String,
    pub endpoint_url: Url,
    pub job_name: String,
    pub extra_labels: LabelSet,
    pub push_timeout: Duration,
}

impl RunConfiguration {
    /// Create a configuration with validation
    pub fn new(
        metric_prefix: impl Into<String>,
        endpoint_url: &str,
        job_name: impl Into<String>,
        extra_labels: LabelSet,
    ) -> Result<Self, ConfigurationError> {
        let job_name = job_name.into();
        validate_job_name(&job_name)?;

        Ok(Self {
            metric_prefix: metric_prefix.into(),
            endpoint_url: normalize_endpoint(endpoint_url)?,
            job_name,
            extra_labels,
            push_timeout: Duration::from_secs(DEFAULT_PUSH_TIMEOUT_SECS),
        })
    }

    pub fn with_push_timeout(mut self, push_timeout: Duration) -> Self {
        self.push_timeout = push_timeout;
        self
    }

    /// Build from parsed options. Returns `Ok(None)` when reporting is
    /// disabled because the URL or the prefix is missing.
    pub fn from_args(args: &ReporterArgs) -> Result<Option<Self>, ConfigurationError> {
        let url = args.pushgateway_url.as_deref().unwrap_or_default();
        let prefix = args.metric_prefix.as_deref().unwrap_or_default();

        if url.is_empty() || prefix.is_empty() {
            return Ok(None);
        }

        let labels = LabelSet::parse(&args.extra_labels)?;
        let config = Self::new(prefix, url, args.job_name.clone(), labels)?
            .with_push_timeout(Duration::from_secs(args.push_timeout_secs));

        Ok(Some(config))
    }
}

/// Prepend `http://` when no scheme is given and require an http(s) base URL
fn normalize_endpoint(raw: &str) -> Result<Url, ConfigurationError> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let url = Url::parse(&with_scheme).map_err(|e| ConfigurationError::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigurationError::InvalidEndpoint {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.cannot_be_a_base() {
        return Err(ConfigurationError::InvalidEndpoint {
            url: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }

    Ok(url)
}

fn validate_job_name(job: &str) -> Result<(), ConfigurationError> {
    if job.is_empty() {
        return Err(ConfigurationError::InvalidJobName {
            job: job.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if job.contains('/') {
        return Err(ConfigurationError::InvalidJobName {
            job: job.to_string(),
            reason: "must not contain '/'".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_args() -> ReporterArgs {
        ReporterArgs {
            pushgateway_url: Some("localhost:9091".to_string()),
            metric_prefix: Some("ci_".to_string()),
            ..ReporterArgs::default()
        }
    }

    #[test]
    fn test_inactive_without_url() {
        let args = ReporterArgs {
            metric_prefix: Some("ci_".to_string()),
            ..ReporterArgs::default()
        };
        assert_eq!(RunConfiguration::from_args(&args).unwrap(), None);
    }

    #[test]
    fn test_inactive_with_empty_prefix() {
        let args = ReporterArgs {
            metric_prefix: Some(String::new()),
            ..active_args()
        };
        assert_eq!(RunConfiguration::from_args(&args).unwrap(), None);
    }

    #[test]
    fn test_inactive_skips_label_parsing() {
        let args = ReporterArgs {
            extra_labels: vec!["bad".to_string()],
            ..ReporterArgs::default()
        };
        assert_eq!(RunConfiguration::from_args(&args).unwrap(), None);
    }

    #[test]
    fn test_active_configuration_defaults() {
        let config = RunConfiguration::from_args(&active_args())
            .unwrap()
            .expect("reporting should be active");

        assert_eq!(config.metric_prefix, "ci_");
        assert_eq!(config.endpoint_url.as_str(), "http://localhost:9091/");
        assert_eq!(config.job_name, DEFAULT_JOB_NAME);
        assert!(config.extra_labels.is_empty());
        assert_eq!(config.push_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_active_configuration_parses_labels() {
        let args = ReporterArgs {
            extra_labels: vec!["env=prod".to_string(), "region=us".to_string()],
            job_name: "nightly".to_string(),
            push_timeout_secs: 3,
            ..active_args()
        };
        let config = RunConfiguration::from_args(&args).unwrap().unwrap();

        assert_eq!(config.extra_labels.get("env"), Some("prod"));
        assert_eq!(config.job_name, "nightly");
        assert_eq!(config.push_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_malformed_label_fails_activation() {
        let args = ReporterArgs {
            extra_labels: vec!["bad".to_string()],
            ..active_args()
        };
        assert!(matches!(
            RunConfiguration::from_args(&args),
            Err(ConfigurationError::MalformedLabel { .. })
        ));
    }

    #[test]
    fn test_https_endpoint_is_kept() {
        let config = RunConfiguration::new(
            "ci_",
            "https://push.example.com/base",
            "job",
            LabelSet::default(),
        )
        .unwrap();
        assert_eq!(config.endpoint_url.scheme(), "https");
        assert_eq!(config.endpoint_url.path(), "/base");
    }

    #[test]
    fn test_unsupported_scheme_is_rejected() {
        let result = RunConfiguration::new("ci_", "ftp://example.com", "job", LabelSet::default());
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_job_name_with_slash_is_rejected() {
        let result = RunConfiguration::new("ci_", "localhost:9091", "a/b", LabelSet::default());
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidJobName { .. })
        ));
    }

    #[test]
    fn test_empty_job_name_is_rejected() {
        let result = RunConfiguration::new("ci_", "localhost:9091", "", LabelSet::default());
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidJobName { .. })
        ));
    }
}
