// ⚙️ Configuration - environment first, then command-line flags
//
// Unset variables fall back to logged defaults; set-but-invalid values are
// errors.

use anyhow::{anyhow, bail, Context, Result};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::modal::DEFAULT_RELOAD_DELAY;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILE: &str = "garrison-gate.log";

#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub base_url: String,
    /// None sends untimed requests
    pub request_timeout: Option<Duration>,
    /// Delay before the fallback full reload
    pub reload_delay: Duration,
    /// Refresh only the affected list after a mutation; false reloads everything
    pub partial_refresh: bool,
    pub log_file: PathBuf,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            reload_delay: DEFAULT_RELOAD_DELAY,
            partial_refresh: true,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// What the binary was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Interactive dashboard (default)
    Dashboard,
    /// One-shot summary of who is checked in
    Status,
    Help,
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {} value {:?}: {}", key, raw, e))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("Invalid {} value {:?}: expected true or false", key, raw),
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl GateConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source (the process environment in
    /// production, a map in tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = GateConfig::default();

        if let Some(url) = lookup("GATE_BASE_URL") {
            config.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup("GATE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = timeout_from_secs(parse("GATE_REQUEST_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("GATE_RELOAD_DELAY_MS") {
            config.reload_delay = Duration::from_millis(parse("GATE_RELOAD_DELAY_MS", &raw)?);
        }
        if let Some(raw) = lookup("GATE_PARTIAL_REFRESH") {
            config.partial_refresh = parse_bool("GATE_PARTIAL_REFRESH", &raw)?;
        }
        if let Some(raw) = lookup("GATE_LOG_FILE") {
            config.log_file = PathBuf::from(raw.trim());
        }

        config.check()?;
        Ok(config)
    }

    /// Apply command-line arguments (without the program name)
    pub fn apply_args(&mut self, args: &[String]) -> Result<Command> {
        let mut command = Command::Dashboard;
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "status" => command = Command::Status,
                "-h" | "--help" | "help" => command = Command::Help,
                "--base-url" => {
                    self.base_url = iter.next().context("--base-url needs a value")?.clone();
                }
                "--timeout" => {
                    let raw = iter.next().context("--timeout needs a value")?;
                    self.request_timeout = timeout_from_secs(parse("--timeout", raw)?);
                }
                "--log-file" => {
                    self.log_file = PathBuf::from(iter.next().context("--log-file needs a value")?);
                }
                "--full-reload" => self.partial_refresh = false,
                other => bail!("Unknown argument: {}", other),
            }
        }

        self.check()?;
        Ok(command)
    }

    /// Effective settings, one per line, with defaults marked
    pub fn summary(&self) -> Vec<String> {
        let defaults = GateConfig::default();
        let mark = |is_default: bool| if is_default { " (default)" } else { "" };
        let timeout = match self.request_timeout {
            Some(t) => format!("{}s", t.as_secs()),
            None => "none".to_string(),
        };

        vec![
            format!("base_url = {}{}", self.base_url, mark(self.base_url == defaults.base_url)),
            format!(
                "request_timeout = {}{}",
                timeout,
                mark(self.request_timeout == defaults.request_timeout)
            ),
            format!(
                "reload_delay = {}ms{}",
                self.reload_delay.as_millis(),
                mark(self.reload_delay == defaults.reload_delay)
            ),
            format!(
                "partial_refresh = {}{}",
                self.partial_refresh,
                mark(self.partial_refresh == defaults.partial_refresh)
            ),
            format!(
                "log_file = {}{}",
                self.log_file.display(),
                mark(self.log_file == defaults.log_file)
            ),
        ]
    }

    /// Call once a subscriber is installed
    pub fn log_summary(&self) {
        for line in self.summary() {
            info!("config: {}", line);
        }
    }

    fn check(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("Base URL must start with http:// or https://, got {:?}", self.base_url);
        }
        Ok(())
    }
}

pub const USAGE: &str = "\
Usage: garrison-gate [status] [options]

Commands:
  (none)              open the gate dashboard
  status              print checked-in guests and master entries, then exit

Options:
  --base-url URL      backend address (GATE_BASE_URL)
  --timeout SECS      request timeout, 0 for none (GATE_REQUEST_TIMEOUT_SECS)
  --log-file PATH     where the dashboard writes its log (GATE_LOG_FILE)
  --full-reload       reload every list after a change (GATE_PARTIAL_REFRESH=false)
";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = GateConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, GateConfig::default());
        assert_eq!(config.reload_delay, Duration::from_millis(1500));
    }

    #[test]
    fn test_env_overrides() {
        let config = GateConfig::from_lookup(lookup(&[
            ("GATE_BASE_URL", "https://gate.local"),
            ("GATE_REQUEST_TIMEOUT_SECS", "0"),
            ("GATE_RELOAD_DELAY_MS", "1000"),
            ("GATE_PARTIAL_REFRESH", "false"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://gate.local");
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.reload_delay, Duration::from_millis(1000));
        assert!(!config.partial_refresh);
    }

    #[test]
    fn test_invalid_env_is_error() {
        assert!(GateConfig::from_lookup(lookup(&[("GATE_RELOAD_DELAY_MS", "soon")])).is_err());
        assert!(GateConfig::from_lookup(lookup(&[("GATE_PARTIAL_REFRESH", "maybe")])).is_err());
        assert!(GateConfig::from_lookup(lookup(&[("GATE_BASE_URL", "gate.local")])).is_err());
    }

    #[test]
    fn test_args_override_env() {
        let mut config = GateConfig::default();
        let command = config
            .apply_args(&args(&["status", "--base-url", "http://10.0.0.2:8080", "--timeout", "5"]))
            .unwrap();

        assert_eq!(command, Command::Status);
        assert_eq!(config.base_url, "http://10.0.0.2:8080");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_unknown_arg_rejected() {
        let mut config = GateConfig::default();
        assert!(config.apply_args(&args(&["--verbose"])).is_err());
        assert!(config.apply_args(&args(&["--base-url"])).is_err());
    }

    #[test]
    fn test_summary_marks_defaults() {
        let config = GateConfig::from_lookup(lookup(&[
            ("GATE_BASE_URL", "https://gate.local"),
            ("GATE_REQUEST_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        let summary = config.summary();

        assert_eq!(summary.len(), 5);
        assert_eq!(summary[0], "base_url = https://gate.local");
        assert_eq!(summary[1], "request_timeout = none");
        assert_eq!(summary[2], "reload_delay = 1500ms (default)");
        assert_eq!(summary[3], "partial_refresh = true (default)");
        assert_eq!(summary[4], "log_file = garrison-gate.log (default)");
    }

    #[test]
    fn test_full_reload_flag() {
        let mut config = GateConfig::default();
        assert_eq!(config.apply_args(&args(&["--full-reload"])).unwrap(), Command::Dashboard);
        assert!(!config.partial_refresh);
    }
}
