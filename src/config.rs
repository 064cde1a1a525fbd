//! Runtime configuration: fixed feed settings plus the SMTP environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

pub const FEED_URL: &str = "https://data.calgary.ca/download/jhgn-ynqj/alerts.pb";

pub const ROUTE_IDS: [&str; 2] = ["201", "202"];

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const JSON_FILE: &str = "current_alerts.json";
pub const HTML_FILE: &str = "current_alerts.html";

const DEFAULT_SMTP_PORT: u16 = 465;

/// Which sink runs after the JSON file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Render `current_alerts.html` and echo it.
    #[default]
    Html,
    /// Send a notification email when no alerts matched.
    Email,
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "email" => Ok(Self::Email),
            other => Err(ConfigError::InvalidValue {
                key: "ALERTS_OUTPUT_MODE",
                message: format!("expected `html` or `email`, got `{other}`"),
            }),
        }
    }
}

/// SMTP settings, read from `SMTP_*` and `MAIL_*` environment variables.
#[derive(Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

impl SmtpConfig {
    /// Build from an arbitrary variable lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnvVar(key))
        };

        let server = required("SMTP_SERVER")?;
        let port = match lookup("SMTP_PORT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "SMTP_PORT",
                    message: e.to_string(),
                })?,
            None => DEFAULT_SMTP_PORT,
        };
        let username = required("SMTP_USER")?;
        let password = required("SMTP_PASS")?;
        let from = required("MAIL_FROM")?;
        let to: Vec<String> = required("MAIL_TO")?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if to.is_empty() {
            return Err(ConfigError::MissingEnvVar("MAIL_TO"));
        }

        Ok(Self {
            server,
            port,
            username,
            password,
            from,
            to,
        })
    }

    /// Port 465 means implicit TLS; anything else negotiates STARTTLS.
    pub fn implicit_tls(&self) -> bool {
        self.port == 465
    }
}

#[derive(Debug, Clone)]
pub struct AlertsConfig {
    pub feed_url: String,
    pub route_ids: Vec<String>,
    pub output_dir: PathBuf,
    pub mode: OutputMode,
    /// Why SMTP is unusable when it is; email mode then skips sending.
    pub smtp: Result<SmtpConfig, ConfigError>,
}

impl AlertsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("ALERTS_OUTPUT_MODE") {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => OutputMode::default(),
        };

        let smtp = SmtpConfig::from_lookup(&lookup);
        if let Err(e) = &smtp {
            tracing::debug!("SMTP not configured: {e}");
        }

        Ok(Self {
            feed_url: FEED_URL.to_string(),
            route_ids: ROUTE_IDS.iter().map(|r| r.to_string()).collect(),
            output_dir: PathBuf::from("."),
            mode,
            smtp,
        })
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(JSON_FILE)
    }

    pub fn html_path(&self) -> PathBuf {
        self.output_dir.join(HTML_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_smtp_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("SMTP_SERVER", "smtp.example.com".to_string()),
            ("SMTP_USER", "bot@example.com".to_string()),
            ("SMTP_PASS", "hunter2".to_string()),
            ("MAIL_FROM", "bot@example.com".to_string()),
            ("MAIL_TO", "ops@example.com, oncall@example.com".to_string()),
        ])
    }

    fn lookup<'a>(env: &'a HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| env.get(key).cloned()
    }

    #[test]
    fn smtp_config_defaults_port_and_splits_recipients() {
        let env = full_smtp_env();
        let smtp = SmtpConfig::from_lookup(lookup(&env)).unwrap();
        assert_eq!(smtp.port, 465);
        assert!(smtp.implicit_tls());
        assert_eq!(smtp.to, vec!["ops@example.com", "oncall@example.com"]);
    }

    #[test]
    fn smtp_config_other_port_uses_starttls() {
        let mut env = full_smtp_env();
        env.insert("SMTP_PORT", "587".to_string());
        let smtp = SmtpConfig::from_lookup(lookup(&env)).unwrap();
        assert_eq!(smtp.port, 587);
        assert!(!smtp.implicit_tls());
    }

    #[test]
    fn smtp_config_reports_missing_variable() {
        for key in ["SMTP_SERVER", "SMTP_USER", "SMTP_PASS", "MAIL_FROM", "MAIL_TO"] {
            let mut env = full_smtp_env();
            env.remove(key);
            let err = SmtpConfig::from_lookup(lookup(&env)).unwrap_err();
            assert_eq!(err, ConfigError::MissingEnvVar(key));
        }
    }

    #[test]
    fn smtp_config_rejects_bad_port() {
        let mut env = full_smtp_env();
        env.insert("SMTP_PORT", "smtp".to_string());
        let err = SmtpConfig::from_lookup(lookup(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "SMTP_PORT", .. }));
    }

    #[test]
    fn debug_output_hides_password() {
        let env = full_smtp_env();
        let smtp = SmtpConfig::from_lookup(lookup(&env)).unwrap();
        let printed = format!("{smtp:?}");
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn alerts_config_defaults() {
        let env = HashMap::new();
        let config = AlertsConfig::from_lookup(lookup(&env)).unwrap();
        assert_eq!(config.feed_url, FEED_URL);
        assert_eq!(config.route_ids, vec!["201", "202"]);
        assert_eq!(config.mode, OutputMode::Html);
        assert_eq!(
            config.smtp.as_ref().unwrap_err(),
            &ConfigError::MissingEnvVar("SMTP_SERVER")
        );
        assert_eq!(config.json_path(), PathBuf::from("./current_alerts.json"));
    }

    #[test]
    fn alerts_config_reads_mode() {
        let mut env = full_smtp_env();
        env.insert("ALERTS_OUTPUT_MODE", "Email".to_string());
        let config = AlertsConfig::from_lookup(lookup(&env)).unwrap();
        assert_eq!(config.mode, OutputMode::Email);
        assert!(config.smtp.is_ok());

        env.insert("ALERTS_OUTPUT_MODE", "pager".to_string());
        assert!(AlertsConfig::from_lookup(lookup(&env)).is_err());
    }
}
