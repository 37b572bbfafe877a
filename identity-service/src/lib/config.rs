use std::env;

use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Minimum accepted length of the token signing secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Upper bound for every configured lifetime (one year).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SMTP_SENDER: &str = "Identity Service <no-reply@localhost>";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub verification: VerificationConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Accepted for verification only, while clients still hold tokens signed with it
    pub previous_secret: Option<String>,
    pub access_expiration_minutes: i64,
    pub refresh_expiration_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("previous_secret", &self.previous_secret.as_ref().map(|_| "***"))
            .field("access_expiration_minutes", &self.access_expiration_minutes)
            .field("refresh_expiration_minutes", &self.refresh_expiration_minutes)
            .finish()
    }
}

impl JwtConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_expiration_minutes)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::minutes(self.refresh_expiration_minutes)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerificationConfig {
    pub expiration_minutes: i64,
}

impl VerificationConfig {
    pub fn ttl(&self) -> Duration {
        Duration::minutes(self.expiration_minutes)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub app_url: String,
    pub queue_capacity: usize,
    /// Without it activation mail is only logged
    pub smtp: Option<SmtpConfig>,
}

#[derive(Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_smtp_sender")]
    pub sender: String,
    /// TLS from the first byte (usually port 465) instead of STARTTLS
    #[serde(default)]
    pub implicit_tls: bool,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("sender", &self.sender)
            .field("implicit_tls", &self.implicit_tls)
            .finish()
    }
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_smtp_sender() -> String {
    DEFAULT_SMTP_SENDER.to_string()
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, DATABASE__URL, MAIL__SMTP__HOST, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// # Errors
    /// * `ConfigError` - A source failed to parse, a key is missing, or a
    ///   value is out of range (see [`Config::validate`])
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }
        if let Some(previous) = &self.jwt.previous_secret {
            if previous.len() < MIN_SECRET_LENGTH {
                return Err(ConfigError::Message(format!(
                    "jwt.previous_secret must be at least {} bytes",
                    MIN_SECRET_LENGTH
                )));
            }
        }

        let durations = [
            ("jwt.access_expiration_minutes", self.jwt.access_expiration_minutes),
            ("jwt.refresh_expiration_minutes", self.jwt.refresh_expiration_minutes),
            ("verification.expiration_minutes", self.verification.expiration_minutes),
        ];
        for (key, minutes) in durations {
            if minutes <= 0 {
                return Err(ConfigError::Message(format!("{} must be positive", key)));
            }
            if minutes > MAX_TTL_MINUTES {
                return Err(ConfigError::Message(format!(
                    "{} must be at most {}",
                    key, MAX_TTL_MINUTES
                )));
            }
        }

        if self.mail.queue_capacity == 0 {
            return Err(ConfigError::Message(
                "mail.queue_capacity must be positive".to_string(),
            ));
        }
        if let Some(smtp) = &self.mail.smtp {
            if smtp.host.trim().is_empty() {
                return Err(ConfigError::Message(
                    "mail.smtp.host must not be empty".to_string(),
                ));
            }
            if smtp.username.is_some() != smtp.password.is_some() {
                return Err(ConfigError::Message(
                    "mail.smtp.username and mail.smtp.password must be set together".to_string(),
                ));
            }
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            database: DatabaseConfig {
                url: "postgres://localhost/identity".to_string(),
                max_connections: 5,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                http_port: 8080,
            },
            jwt: JwtConfig {
                secret: "s".repeat(MIN_SECRET_LENGTH),
                previous_secret: None,
                access_expiration_minutes: 15,
                refresh_expiration_minutes: 60,
            },
            verification: VerificationConfig {
                expiration_minutes: 30,
            },
            mail: MailConfig {
                app_url: "http://localhost:8080".to_string(),
                queue_capacity: 16,
                smtp: None,
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let mut config = valid_config();
        config.jwt.secret = "too-short".to_string();
        assert!(config.validate().is_err());

        config.jwt.secret = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_previous_secret_is_rejected() {
        let mut config = valid_config();
        config.jwt.previous_secret = Some("old".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_ttl_is_rejected() {
        let mut config = valid_config();
        config.jwt.refresh_expiration_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.verification.expiration_minutes = -5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_ttl_is_rejected() {
        let mut config = valid_config();
        config.jwt.access_expiration_minutes = MAX_TTL_MINUTES;
        assert!(config.validate().is_ok());

        config.jwt.access_expiration_minutes = MAX_TTL_MINUTES + 1;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.verification.expiration_minutes = i64::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_smtp_credentials_come_in_pairs() {
        let mut config = valid_config();
        config.mail.smtp = Some(SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: default_smtp_port(),
            username: Some("mailer".to_string()),
            password: None,
            sender: default_smtp_sender(),
            implicit_tls: false,
        });
        assert!(config.validate().is_err());

        if let Some(smtp) = config.mail.smtp.as_mut() {
            smtp.password = Some("hunter22".to_string());
        }
        assert!(config.validate().is_ok());
        assert!(!format!("{:?}", config.mail).contains("hunter22"));
    }

    #[test]
    fn test_load_reads_nested_env_overrides() {
        let secret = "env-sourced-secret-0123456789abcdef";
        env::set_var("JWT__SECRET", secret);
        env::set_var("MAIL__SMTP__HOST", "smtp.example.com");

        let loaded = Config::load();

        env::remove_var("JWT__SECRET");
        env::remove_var("MAIL__SMTP__HOST");

        let config = loaded.expect("Failed to load config from env");
        assert_eq!(config.jwt.secret, secret);
        let smtp = config.mail.smtp.expect("SMTP section missing");
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 587);
        assert_eq!(config.jwt.access_expiration_minutes, 15);
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let output = format!("{:?}", valid_config().jwt);
        assert!(!output.contains(&"s".repeat(MIN_SECRET_LENGTH)));
    }
}
