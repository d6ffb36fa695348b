use anyhow::{Context, Result};
use glob::Pattern;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::{
    http::{HttpClient, Probe},
    lint::LintPolicy,
    runtime::Runtime,
};

/// Request timeout for reachability probes.
const PROBE_TIMEOUT_SECS: u64 = 30;

/// Options collected from the command line and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub strict: bool,
    pub online: bool,
    pub pattern: String,
    pub placeholder_hosts: Vec<String>,
}

pub struct Config<P: Probe> {
    pub policy: LintPolicy,
    pub pattern: Pattern,
    /// Present only for `--online` runs.
    pub probe: Option<P>,
}

impl<P: Probe> Config<P> {
    /// An offline configuration; nothing is ever probed.
    pub fn offline(policy: LintPolicy, pattern: Pattern) -> Self {
        Self {
            policy,
            pattern,
            probe: None,
        }
    }
}

impl Config<HttpClient> {
    pub fn new<R: Runtime>(runtime: &R, options: ConfigOptions) -> Result<Self> {
        let pattern = Pattern::new(&options.pattern)
            .with_context(|| format!("Invalid file pattern '{}'", options.pattern))?;

        let policy = LintPolicy::default()
            .strict(options.strict)
            .with_placeholder_hosts(&options.placeholder_hosts);
        debug!(
            "Lint policy: strict={} placeholder hosts={:?}",
            policy.strict, policy.placeholder_hosts
        );

        let probe = if options.online {
            let token = runtime
                .env_var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty());
            if let Some(token) = &token {
                debug!("Using GITHUB_TOKEN for github.com probes: {}", mask(token));
            }

            let client = Client::builder()
                .user_agent(concat!("caskcheck/", env!("CASKCHECK_VERSION")))
                .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
                .build()?;
            Some(HttpClient::new(client).with_github_token(token))
        } else {
            None
        };

        Ok(Self {
            policy,
            pattern,
            probe,
        })
    }
}

/// Keep only enough of a secret to recognise it in logs.
fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn options() -> ConfigOptions {
        ConfigOptions {
            pattern: "*.rb".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_offline_does_not_read_token() {
        // MockRuntime would panic on an unexpected env_var call
        let runtime = MockRuntime::new();
        let config = Config::new(&runtime, options()).unwrap();

        assert!(config.probe.is_none());
        assert!(!config.policy.strict);
        assert!(config.pattern.matches("cola.rb"));
    }

    #[test]
    fn test_config_strict_and_extra_hosts() {
        let runtime = MockRuntime::new();
        let config = Config::new(
            &runtime,
            ConfigOptions {
                strict: true,
                placeholder_hosts: vec!["staging.acme.dev".to_string()],
                ..options()
            },
        )
        .unwrap();

        assert!(config.policy.strict);
        assert!(
            config
                .policy
                .placeholder_hosts
                .contains(&"staging.acme.dev".to_string())
        );
    }

    #[test]
    fn test_config_online_reads_github_token() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq("GITHUB_TOKEN"))
            .times(1)
            .returning(|_| Ok("ghp_1234567890abcdef".to_string()));

        let config = Config::new(
            &runtime,
            ConfigOptions {
                online: true,
                ..options()
            },
        )
        .unwrap();
        assert!(config.probe.is_some());
    }

    #[test]
    fn test_config_invalid_pattern() {
        let runtime = MockRuntime::new();
        let err = Config::new(
            &runtime,
            ConfigOptions {
                pattern: "[".to_string(),
                ..options()
            },
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("Invalid file pattern '['"));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("ghp_1234567890abcdef"), "ghp_*********cdef");
        assert_eq!(mask("short"), "*****");
    }
}
