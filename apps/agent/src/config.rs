use std::{env, fmt, fs, path};

use areweup::ClientDefaults;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Agent settings, read from `config.toml` and then the environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: Source,
    pub defaults: ClientDefaults,
}

/// Where the check document lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    pub checks_path: path::PathBuf,
}

impl Default for Source {
    fn default() -> Self {
        Self { checks_path: path::PathBuf::from("checks.json") }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/areweup/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, AgentError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(AgentError::ConfigPathUnavailable);
    };

    Ok(path.join("areweup/config.toml"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_1 = |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
            writeln!(f, "    {label}: {value}")
        };

        writeln!(f, "Current Agent Configuration:")?;
        writeln!(f, "  Source")?;
        write_1(f, "Checks Path", &self.source.checks_path.display())?;
        writeln!(f, "  Defaults")?;
        write_1(f, "Customer Id", &self.defaults.customer_id)?;
        write_1(f, "Send Metrics", &self.defaults.send_metric)?;
        write_1(f, "Ignore TLS Errors", &self.defaults.ignore_tls_errors)?;
        write_1(f, "Timeout (ms)", &self.defaults.timeout_millis)?;
        write_1(f, "Alert Topic", &self.defaults.alert_topic)?;
        write_1(f, "Alert Subject", &self.defaults.alert_subject)?;

        Ok(())
    }
}

impl Settings {
    /// Read settings from file
    ///
    /// Creates a default config in ~/.config/areweup/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, AgentError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| AgentError::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str(raw_string.as_str())
                .map_err(|source| AgentError::ParseFailed { path: config_path, source })
        } else {
            let settings = Self::default();
            settings.write_config(&config_path)?;
            Ok(settings)
        }
    }

    /// Serialize and write settings to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), AgentError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| AgentError::WriteFailed { path: parent.to_path_buf(), source })?;
        }

        fs::write(path, config_str).map_err(|source| AgentError::WriteFailed { path: path.to_path_buf(), source })
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// Booleans that are not `true`/`false` and non-positive timeouts are
    /// ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(topic) = lookup("SNSTopic") {
            self.defaults.alert_topic = topic;
        }
        if let Some(customer_id) = lookup("CustomerId") {
            self.defaults.customer_id = customer_id;
        }
        if let Some(subject) = lookup("Subject") {
            self.defaults.alert_subject = subject;
        }
        if let Some(ignore) = lookup("IgnoreSslCertificateErrors").as_deref().and_then(parse_bool) {
            self.defaults.ignore_tls_errors = ignore;
        }
        if let Some(send) = lookup("SendToCW").as_deref().and_then(parse_bool) {
            self.defaults.send_metric = send;
        }
        if let Some(timeout) = lookup("DefaultTimeout").and_then(|value| value.trim().parse::<u64>().ok()) {
            if timeout > 0 {
                self.defaults.timeout_millis = timeout;
            }
        }
        if let Some(checks_path) = lookup("AREWEUP_CHECKS_PATH") {
            self.source.checks_path = path::PathBuf::from(checks_path);
        }
    }

    /// Check the settings can run an invocation
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.defaults.alert_topic.trim().is_empty() {
            return Err(AgentError::MissingAlertTopic);
        }
        if self.defaults.send_metric && self.defaults.customer_id.trim().is_empty() {
            return Err(AgentError::MissingCustomerId);
        }
        Ok(())
    }
}
